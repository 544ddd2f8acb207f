use std::collections::BTreeMap;
use std::sync::Arc;

use vn_core::{NodeName, VnError, VnValue};

use crate::config::{ErrorPolicy, SessionConfig, SessionHooks};
use crate::context::ExecutionContext;
use crate::eval::{Evaluator, RhaiEvaluator};
use crate::interface::Interface;
use crate::namespace::{SpecialNamespaces, Stores, DEFAULT_STORE};
use crate::node::{Node, NodeId, NodeKind};
use crate::script::Script;
use crate::translation::{PersistentState, StringTranslations, TranslationCounters};

mod control_flow;
mod define;
mod display;
mod lifecycle;
mod predict;
mod say;
mod scry;
mod snapshot;
mod step;
mod translate;
mod user;

#[cfg(test)]
mod tests;

pub use snapshot::{SavedContext, SessionSnapshot, SNAPSHOT_SCHEMA};

pub struct SessionOptions {
    pub script: Arc<Script>,
    pub interface: Box<dyn Interface>,
    pub config: SessionConfig,
    pub evaluator: Option<Box<dyn Evaluator>>,
    pub hooks: SessionHooks,
    pub special_namespaces: SpecialNamespaces,
    pub persistent: Option<PersistentState>,
}

impl SessionOptions {
    pub fn new(script: Arc<Script>, interface: Box<dyn Interface>) -> Self {
        Self {
            script,
            interface,
            config: SessionConfig::default(),
            evaluator: None,
            hooks: SessionHooks::default(),
            special_namespaces: SpecialNamespaces::new(),
            persistent: None,
        }
    }
}

/// One playthrough of a loaded script: the live execution context, the
/// variable stores and the collaborators statements talk to.
pub struct Session {
    script: Arc<Script>,
    config: SessionConfig,
    hooks: SessionHooks,
    evaluator: Box<dyn Evaluator>,
    interface: Box<dyn Interface>,
    stores: Stores,
    special_namespaces: SpecialNamespaces,
    context: ExecutionContext,
    persistent: PersistentState,
    counters: TranslationCounters,
    strings: StringTranslations,
    define_statements: Vec<NodeId>,
    default_statements: Vec<NodeId>,
    current_statement: String,
    steps_since_interaction: usize,
}

impl Session {
    pub fn new(options: SessionOptions) -> Self {
        let stores = Stores::new(options.config.random_seed);
        Self {
            script: options.script,
            hooks: options.hooks,
            evaluator: options
                .evaluator
                .unwrap_or_else(|| Box::new(RhaiEvaluator::new())),
            interface: options.interface,
            stores,
            special_namespaces: options.special_namespaces,
            context: ExecutionContext::default(),
            persistent: options.persistent.unwrap_or_default(),
            counters: TranslationCounters::default(),
            strings: StringTranslations::default(),
            define_statements: Vec::new(),
            default_statements: Vec::new(),
            current_statement: String::new(),
            steps_since_interaction: 0,
            config: options.config,
        }
    }

    pub fn script(&self) -> &Arc<Script> {
        &self.script
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn stores_mut(&mut self) -> &mut Stores {
        &mut self.stores
    }

    pub fn interface(&self) -> &dyn Interface {
        self.interface.as_ref()
    }

    pub fn interface_mut(&mut self) -> &mut dyn Interface {
        self.interface.as_mut()
    }

    pub fn persistent(&self) -> &PersistentState {
        &self.persistent
    }

    pub fn counters(&self) -> TranslationCounters {
        self.counters
    }

    pub fn hooks_mut(&mut self) -> &mut SessionHooks {
        &mut self.hooks
    }

    pub fn set_error_policy(&mut self, policy: ErrorPolicy) {
        self.config.error_policy = policy;
    }

    /// Name of the statement kind that ran last, as reported to callbacks.
    pub fn current_statement_name(&self) -> &str {
        &self.current_statement
    }

    pub fn current_node(&self) -> Option<&Node> {
        self.context.current.map(|id| self.script.node(id))
    }

    pub fn is_finished(&self) -> bool {
        self.context.current.is_none()
    }

    pub fn get(&self, name: &str) -> Result<VnValue, VnError> {
        self.stores.get(DEFAULT_STORE, name)
    }

    fn statement_name(&mut self, name: &str) {
        self.current_statement = name.to_string();
        for callback in &mut self.hooks.statement_callbacks {
            callback(name);
        }
    }

    fn evaluate(&mut self, source: &str) -> Result<VnValue, VnError> {
        self.evaluator
            .evaluate(source, DEFAULT_STORE, &mut self.stores)
    }

    fn evaluate_truthy(&mut self, source: &str) -> Result<bool, VnError> {
        Ok(self.evaluate(source)?.truthy())
    }

    /// Evaluates against a throwaway copy of the stores; failures become
    /// "unknown".
    fn speculate(&self, source: &str) -> Option<VnValue> {
        let mut scratch = self.stores.clone();
        self.evaluator
            .evaluate(source, DEFAULT_STORE, &mut scratch)
            .ok()
    }

    fn interacted(&mut self) {
        self.steps_since_interaction = 0;
    }

    fn node_name(&self, id: Option<NodeId>) -> Option<NodeName> {
        id.map(|id| self.script.node(id).name.clone())
    }

    /// Whether jumping into the middle of a script may start at `id`.
    pub fn can_warp(&self, id: NodeId) -> bool {
        match &self.script.node(id).kind {
            NodeKind::Show { .. }
            | NodeKind::Scene { .. }
            | NodeKind::Hide { .. }
            | NodeKind::ShowLayer { .. }
            | NodeKind::Camera { .. } => true,
            NodeKind::UserStatement(user) => self
                .script
                .registry()
                .get(&user.statement)
                .is_ok_and(|kind| kind.warp(&user.parsed)),
            _ => false,
        }
    }

    /// Variables in `store` the player has changed since they were set up.
    pub fn ever_changed(&self, store: &str) -> BTreeMap<String, VnValue> {
        self.stores
            .store(store)
            .map(|store| {
                store
                    .ever_been_changed
                    .iter()
                    .filter_map(|name| {
                        store
                            .values
                            .get(name)
                            .map(|value| (name.clone(), value.clone()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}
