use super::*;
use crate::namespace::check_child_namespace;
use crate::statements::StatementEnv;
use vn_core::{DefineOperator, ErrorKind};

const CONFIG_STORE: &str = "store.config";

impl Session {
    /// Load-time pass over one node: creates the stores it names and runs
    /// early code before anything else is executed.
    pub(super) fn early_execute(&mut self, id: NodeId) -> Result<(), VnError> {
        let script = Arc::clone(&self.script);
        match &script.node(id).kind {
            NodeKind::Python { store, .. } | NodeKind::Default { store, .. } => {
                check_child_namespace(&self.special_namespaces, store)?;
                self.stores.create_store(store);
                Ok(())
            }
            NodeKind::EarlyPython { code, store, hide } => {
                check_child_namespace(&self.special_namespaces, store)?;
                self.stores.create_store(store);
                self.evaluator.exec(code, store, *hide, &mut self.stores)
            }
            NodeKind::Define {
                store,
                name,
                index,
                operator,
                expr,
            } => {
                check_child_namespace(&self.special_namespaces, store)?;
                self.stores.create_store(store);
                let early = store == CONFIG_STORE
                    && index.is_none()
                    && *operator == DefineOperator::Assign
                    && self.config.early_config.contains(name);
                if early {
                    let value = self.evaluate(expr)?;
                    tracing::debug!(name = %name, "early config");
                    self.stores.set_default(store, name, value);
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub(super) fn execute_define(&mut self, id: NodeId) -> Result<(), VnError> {
        let script = Arc::clone(&self.script);
        let node = script.node(id);
        self.context.next_node = node.next;
        self.statement_name("define");
        self.define_statements.push(id);

        if let NodeKind::Define {
            store,
            name,
            index: None,
            operator: DefineOperator::Assign,
            ..
        } = &node.kind
        {
            self.stores.mark_pure(format!("{}.{}", store, name));
        }
        self.define_set(id)
    }

    fn define_set(&mut self, id: NodeId) -> Result<(), VnError> {
        let script = Arc::clone(&self.script);
        let NodeKind::Define {
            store,
            name,
            index,
            operator,
            expr,
        } = &script.node(id).kind
        else {
            return Ok(());
        };

        let value = self.evaluate(expr)?;
        let key = match index {
            Some(index) => Some(self.evaluate(index)?),
            None => None,
        };

        if key.is_none() && *operator == DefineOperator::Assign {
            return self.write_define(store, name, value);
        }

        let current = self.read_define(store, name)?;
        let updated = match key {
            Some(key) => {
                let mut container = current;
                let slot = container.get_index(&key).unwrap_or(VnValue::Null);
                container.set_index(&key, combine(*operator, &slot, value)?)?;
                container
            }
            None => combine(*operator, &current, value)?,
        };
        self.write_define(store, name, updated)
    }

    fn read_define(&self, store: &str, name: &str) -> Result<VnValue, VnError> {
        match self.special_namespaces.get(store) {
            Some(special) => special.get(name),
            None => self.stores.get(store, name),
        }
    }

    fn write_define(&mut self, store: &str, name: &str, value: VnValue) -> Result<(), VnError> {
        match self.special_namespaces.get_mut(store) {
            Some(special) => special.set(name, value),
            None => {
                self.stores.set_default(store, name, value);
                Ok(())
            }
        }
    }

    /// Re-runs every executed `define` that targets one of `stores`, in the
    /// order they first ran.
    pub fn redefine(&mut self, stores: &[&str]) -> Result<(), VnError> {
        let script = Arc::clone(&self.script);
        let targets = self
            .define_statements
            .iter()
            .copied()
            .filter(|id| match &script.node(*id).kind {
                NodeKind::Define { store, .. } => stores.contains(&store.as_str()),
                _ => false,
            })
            .collect::<Vec<_>>();
        for id in targets {
            let node = script.node(id);
            self.define_set(id)
                .map_err(|error| error.at(&node.location, "define"))?;
        }
        Ok(())
    }

    pub(super) fn execute_default_node(&mut self, id: NodeId) -> Result<(), VnError> {
        let script = Arc::clone(&self.script);
        let node = script.node(id);
        self.context.next_node = node.next;
        self.statement_name("default");

        let NodeKind::Default { store, name, expr } = &node.kind else {
            return Ok(());
        };
        let repeat = match self.special_namespaces.get(store.as_str()) {
            Some(special) => special.repeat_at_default_time(),
            None => {
                self.default_statements.push(id);
                return Ok(());
            }
        };
        let value = self.evaluate(expr)?;
        if let Some(special) = self.special_namespaces.get_mut(store.as_str()) {
            special.set_default(name, value)?;
        }
        if repeat {
            self.default_statements.push(id);
        }
        Ok(())
    }

    /// Applies every collected `default`. With `start`, values are reset
    /// for a new game; otherwise only names the player never changed are
    /// filled in, as after loading a save.
    pub fn execute_default_statements(&mut self, start: bool) -> Result<(), VnError> {
        let script = Arc::clone(&self.script);
        let statements = self.default_statements.clone();
        for id in statements {
            let node = script.node(id);
            self.execute_default(id, start)
                .map_err(|error| error.at(&node.location, node.kind.statement_name()))?;
        }
        Ok(())
    }

    fn execute_default(&mut self, id: NodeId, start: bool) -> Result<(), VnError> {
        let script = Arc::clone(&self.script);
        let node = script.node(id);
        match &node.kind {
            NodeKind::Default { store, name, expr } => {
                self.execute_default_value(store, name, expr, start)
            }
            NodeKind::UserStatement(user) => {
                let kind = script.registry().get(&user.statement)?;
                let mut env = StatementEnv {
                    stores: &mut self.stores,
                    evaluator: self.evaluator.as_ref(),
                    interface: self.interface.as_mut(),
                    location: &node.location,
                };
                kind.execute_default(&user.parsed, &mut env)
            }
            _ => Ok(()),
        }
    }

    fn execute_default_value(
        &mut self,
        store: &str,
        name: &str,
        expr: &str,
        start: bool,
    ) -> Result<(), VnError> {
        if let Some(special) = self.special_namespaces.get(store) {
            if special.repeat_at_default_time() {
                let value = self.evaluate(expr)?;
                if let Some(special) = self.special_namespaces.get_mut(store) {
                    special.set_default(name, value)?;
                }
            }
            return Ok(());
        }

        let already_set = self
            .stores
            .store(store)
            .is_some_and(|target| target.defaults_set.contains(name));
        if already_set {
            if start && self.config.developer {
                return Err(VnError::new(
                    ErrorKind::Idempotency,
                    "DEFAULT_TWICE",
                    format!("{}.{} is being given a default a second time.", store, name),
                ));
            }
            if start {
                tracing::warn!(store, name, "default given a second time");
            } else {
                tracing::debug!(store, name, "default already applied");
            }
            return Ok(());
        }

        let child = format!("{}.{}", store, name);
        if start && self.config.developer && self.stores.has_store(&child) {
            return Err(VnError::new(
                ErrorKind::Idempotency,
                "DEFAULT_SHADOWS_NAMESPACE",
                format!("{} is being given a default, but a namespace has that name.", child),
            ));
        }

        let changed = self
            .stores
            .store(store)
            .is_some_and(|target| target.ever_been_changed.contains(name));
        if start || !changed {
            let value = self.evaluate(expr)?;
            self.stores.set_default(store, name, value);
        }

        let target = self.stores.store_mut(store);
        target.defaults_set.insert(name.to_string());
        target.ever_been_changed.insert(name.to_string());
        Ok(())
    }
}

fn combine(operator: DefineOperator, current: &VnValue, value: VnValue) -> Result<VnValue, VnError> {
    match operator {
        DefineOperator::Assign => Ok(value),
        DefineOperator::Add => current.add(&value),
        DefineOperator::Union => current.union(&value),
    }
}
