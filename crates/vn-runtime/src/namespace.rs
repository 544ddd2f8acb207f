use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use vn_core::{VnError, VnValue};

pub const DEFAULT_STORE: &str = "store";

/// One named variable store, plus the bookkeeping `default` needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub values: BTreeMap<String, VnValue>,
    pub ever_been_changed: BTreeSet<String>,
    pub defaults_set: BTreeSet<String>,
}

/// All variable stores of a session. Cloned wholesale for speculative
/// evaluation and for rollback checkpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stores {
    stores: BTreeMap<String, Store>,
    /// Fully qualified names whose definitions are known not to change.
    pure: BTreeSet<String>,
    pub rng_state: u32,
}

impl Default for Stores {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Stores {
    pub fn new(random_seed: u32) -> Self {
        let mut stores = BTreeMap::new();
        stores.insert(DEFAULT_STORE.to_string(), Store::default());
        Self {
            stores,
            pure: BTreeSet::new(),
            rng_state: random_seed,
        }
    }

    pub fn create_store(&mut self, name: &str) {
        self.stores.entry(name.to_string()).or_default();
    }

    pub fn has_store(&self, name: &str) -> bool {
        self.stores.contains_key(name)
    }

    pub fn store(&self, name: &str) -> Option<&Store> {
        self.stores.get(name)
    }

    pub fn store_mut(&mut self, name: &str) -> &mut Store {
        self.stores.entry(name.to_string()).or_default()
    }

    pub fn store_names(&self) -> impl Iterator<Item = &str> {
        self.stores.keys().map(String::as_str)
    }

    pub fn contains(&self, store: &str, name: &str) -> bool {
        self.stores
            .get(store)
            .is_some_and(|store| store.values.contains_key(name))
    }

    pub fn get(&self, store: &str, name: &str) -> Result<VnValue, VnError> {
        self.stores
            .get(store)
            .and_then(|store| store.values.get(name))
            .cloned()
            .ok_or_else(|| {
                VnError::evaluation(
                    "NAMESPACE_KEY",
                    format!("Name \"{}\" is not defined in {}.", name, store),
                )
            })
    }

    pub fn set(&mut self, store: &str, name: &str, value: VnValue) {
        let target = self.store_mut(store);
        target.values.insert(name.to_string(), value);
        target.ever_been_changed.insert(name.to_string());
    }

    /// Writes without marking the variable as changed by the player.
    pub fn set_default(&mut self, store: &str, name: &str, value: VnValue) {
        self.store_mut(store)
            .values
            .insert(name.to_string(), value);
    }

    /// Removes a variable, returning what it held.
    pub fn remove(&mut self, store: &str, name: &str) -> Option<VnValue> {
        self.stores
            .get_mut(store)
            .and_then(|store| store.values.remove(name))
    }

    pub fn mark_pure(&mut self, fullname: String) {
        self.pure.insert(fullname);
    }

    pub fn is_pure(&self, fullname: &str) -> bool {
        self.pure.contains(fullname)
    }
}

/// A store-like target owned by the host instead of the variable stores,
/// e.g. preferences or configuration objects.
pub trait SpecialNamespace {
    fn get(&self, name: &str) -> Result<VnValue, VnError>;

    fn set(&mut self, name: &str, value: VnValue) -> Result<(), VnError>;

    fn set_default(&mut self, name: &str, value: VnValue) -> Result<(), VnError> {
        self.set(name, value)
    }

    fn pure(&self) -> bool {
        true
    }

    /// Whether `default` statements on this namespace run again every time
    /// defaults are applied.
    fn repeat_at_default_time(&self) -> bool {
        false
    }

    fn allow_child_namespaces(&self) -> bool {
        true
    }
}

/// A namespace the host keeps in plain memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapNamespace {
    pub values: BTreeMap<String, VnValue>,
    pub repeat_defaults: bool,
}

impl SpecialNamespace for MapNamespace {
    fn get(&self, name: &str) -> Result<VnValue, VnError> {
        self.values.get(name).cloned().ok_or_else(|| {
            VnError::evaluation(
                "NAMESPACE_KEY",
                format!("Name \"{}\" is not defined.", name),
            )
        })
    }

    fn set(&mut self, name: &str, value: VnValue) -> Result<(), VnError> {
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    fn repeat_at_default_time(&self) -> bool {
        self.repeat_defaults
    }
}

pub type SpecialNamespaces = BTreeMap<String, Box<dyn SpecialNamespace>>;

/// Fails when `store` is a child of a special namespace that forbids them.
pub(crate) fn check_child_namespace(
    specials: &SpecialNamespaces,
    store: &str,
) -> Result<(), VnError> {
    let mut parts = store.split('.');
    let (Some(root), Some(first), Some(_)) = (parts.next(), parts.next(), parts.next()) else {
        return Ok(());
    };
    let parent = format!("{}.{}", root, first);
    match specials.get(&parent) {
        Some(special) if !special.allow_child_namespaces() => Err(VnError::structural(
            "NAMESPACE_CHILD",
            format!("{} does not allow child namespaces.", parent),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod namespace_tests {
    use super::*;

    #[test]
    fn set_marks_changed_but_set_default_does_not() {
        let mut stores = Stores::default();
        stores.set_default("store", "hp", VnValue::Number(10.0));
        stores.set("store", "mp", VnValue::Number(3.0));
        let store = stores.store("store").expect("default store");
        assert!(!store.ever_been_changed.contains("hp"));
        assert!(store.ever_been_changed.contains("mp"));
        assert_eq!(stores.get("store", "hp"), Ok(VnValue::Number(10.0)));
        assert!(stores.get("store", "missing").is_err());
    }

    #[test]
    fn child_namespaces_can_be_forbidden() {
        struct Locked;
        impl SpecialNamespace for Locked {
            fn get(&self, _name: &str) -> Result<VnValue, VnError> {
                Ok(VnValue::Null)
            }
            fn set(&mut self, _name: &str, _value: VnValue) -> Result<(), VnError> {
                Ok(())
            }
            fn allow_child_namespaces(&self) -> bool {
                false
            }
        }

        let mut specials: SpecialNamespaces = BTreeMap::new();
        specials.insert("store.persistent".to_string(), Box::new(Locked));
        assert!(check_child_namespace(&specials, "store.persistent").is_ok());
        assert!(check_child_namespace(&specials, "store.persistent.inner").is_err());
        assert!(check_child_namespace(&specials, "store.other.inner").is_ok());
    }
}
