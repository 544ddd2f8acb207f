use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use vn_core::{NodeName, SourceLocation, VnError, VnValue};

use crate::eval::Evaluator;
use crate::interface::{Interface, SayRequest};
use crate::namespace::{Stores, DEFAULT_STORE};
use crate::scry::Scry;

/// What a user statement's `execute` can touch.
pub struct StatementEnv<'a> {
    pub stores: &'a mut Stores,
    pub evaluator: &'a dyn Evaluator,
    pub interface: &'a mut dyn Interface,
    pub location: &'a SourceLocation,
}

impl StatementEnv<'_> {
    pub fn evaluate(&mut self, source: &str) -> Result<VnValue, VnError> {
        self.evaluator.evaluate(source, DEFAULT_STORE, self.stores)
    }

    pub fn exec(&mut self, source: &str) -> Result<(), VnError> {
        self.evaluator.exec(source, DEFAULT_STORE, false, self.stores)
    }

    pub fn narrate(&mut self, what: &str) -> Result<(), VnError> {
        self.interface.say(&SayRequest {
            who: None,
            what: what.to_string(),
            interact: true,
            args: Vec::new(),
            kwargs: BTreeMap::new(),
            attributes: None,
            temporary_attributes: None,
        })
    }
}

/// Names a user statement may report as reachable from itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ReachableInfo {
    pub own_label: Option<NodeName>,
    pub next: Option<NodeName>,
    pub block: Option<NodeName>,
}

/// Behaviour of one creator-defined statement kind. `parsed` is whatever
/// the parser produced for the statement line.
pub trait UserStatementKind {
    fn execute(&self, parsed: &VnValue, env: &mut StatementEnv<'_>) -> Result<(), VnError>;

    fn name(&self, _parsed: &VnValue) -> Option<String> {
        None
    }

    /// Gives the node a label name instead of a serial one.
    fn label(&self, _parsed: &VnValue) -> Option<String> {
        None
    }

    /// Label to continue at instead of the chained next statement.
    fn next(&self, _parsed: &VnValue, _block: Option<&NodeName>) -> Option<String> {
        None
    }

    fn predict(&self, _parsed: &VnValue) -> Vec<String> {
        Vec::new()
    }

    /// Successor names for prediction; `None` means "the chained next".
    fn predict_next(&self, _parsed: &VnValue, _next: Option<&NodeName>) -> Option<Vec<NodeName>> {
        None
    }

    /// Predict every sub-block head as well as the successor.
    fn predict_all(&self) -> bool {
        false
    }

    fn scry(&self, _parsed: &VnValue, _scry: &mut Scry) {}

    /// Override of the nodes reachable from this statement.
    fn reachable(&self, _parsed: &VnValue, _info: &ReachableInfo) -> Option<Vec<NodeName>> {
        None
    }

    fn warp(&self, _parsed: &VnValue) -> bool {
        false
    }

    fn init_priority(&self, _parsed: &VnValue) -> Option<i32> {
        None
    }

    fn execute_init(&self, _parsed: &VnValue, _env: &mut StatementEnv<'_>) -> Result<(), VnError> {
        Ok(())
    }

    fn has_execute_default(&self) -> bool {
        false
    }

    fn execute_default(
        &self,
        _parsed: &VnValue,
        _env: &mut StatementEnv<'_>,
    ) -> Result<(), VnError> {
        Ok(())
    }

    fn has_post_execute(&self) -> bool {
        false
    }

    fn post_execute(&self, _parsed: &VnValue, _env: &mut StatementEnv<'_>) -> Result<(), VnError> {
        Ok(())
    }

    fn translation_strings(&self, _parsed: &VnValue) -> Vec<String> {
        Vec::new()
    }
}

#[derive(Clone, Default)]
pub struct StatementRegistry {
    kinds: BTreeMap<String, Arc<dyn UserStatementKind>>,
}

impl fmt::Debug for StatementRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatementRegistry")
            .field("kinds", &self.kinds.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl StatementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, statement: &str, kind: Arc<dyn UserStatementKind>) {
        self.kinds.insert(statement.to_string(), kind);
    }

    pub fn get(&self, statement: &str) -> Result<&Arc<dyn UserStatementKind>, VnError> {
        self.kinds.get(statement).ok_or_else(|| {
            VnError::structural(
                "USER_STATEMENT_UNKNOWN",
                format!("No user statement is registered as \"{}\".", statement),
            )
        })
    }

    pub fn contains(&self, statement: &str) -> bool {
        self.kinds.contains_key(statement)
    }
}
