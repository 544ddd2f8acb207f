use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_LOOP_GUARD: usize = 10_000;

/// What the session does with a recoverable statement failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    #[default]
    Raise,
    /// Log the error and continue at the statement's successor.
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Enables checks that only make sense while authoring.
    pub developer: bool,
    pub error_policy: ErrorPolicy,
    /// Statements allowed between two interactions before the session
    /// assumes an infinite loop.
    pub loop_guard: usize,
    /// Menu captions are shown as narration instead of disabled choices.
    pub narrator_menu: bool,
    /// Record seen translation identifiers as hashes.
    pub hash_seen: bool,
    pub default_layer: String,
    pub tag_layers: BTreeMap<String, String>,
    pub language: Option<String>,
    /// `store.config` names that `define` sets during early execution.
    pub early_config: BTreeSet<String>,
    pub random_seed: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            developer: false,
            error_policy: ErrorPolicy::Raise,
            loop_guard: DEFAULT_LOOP_GUARD,
            narrator_menu: true,
            hash_seen: false,
            default_layer: "master".to_string(),
            tag_layers: BTreeMap::new(),
            language: None,
            early_config: BTreeSet::new(),
            random_seed: 1,
        }
    }
}

impl SessionConfig {
    pub fn layer_for(&self, explicit: Option<&str>, tag: &str) -> String {
        if let Some(layer) = explicit {
            return layer.to_string();
        }
        self.tag_layers
            .get(tag)
            .cloned()
            .unwrap_or_else(|| self.default_layer.clone())
    }
}

pub type LabelCallback = Box<dyn FnMut(&str, bool)>;
pub type StatementCallback = Box<dyn FnMut(&str)>;
pub type PythonCallback = Box<dyn FnMut()>;

/// Host callbacks invoked while statements run.
#[derive(Default)]
pub struct SessionHooks {
    /// Called with the label name and whether control arrived abnormally.
    pub label_callbacks: Vec<LabelCallback>,
    pub statement_callbacks: Vec<StatementCallback>,
    /// Called after every `python` statement outside the init phase.
    pub python_callbacks: Vec<PythonCallback>,
}

impl fmt::Debug for SessionHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHooks")
            .field("label_callbacks", &self.label_callbacks.len())
            .field("statement_callbacks", &self.statement_callbacks.len())
            .field("python_callbacks", &self.python_callbacks.len())
            .finish()
    }
}
