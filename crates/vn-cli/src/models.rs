use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vn_runtime::{PersistentState, SessionConfig, SessionSnapshot};

pub(crate) const PLAYER_STATE_SCHEMA: &str = "vn-player-state.v1";

#[derive(Debug, Clone)]
pub(crate) struct LoadedScenario {
    pub(crate) id: String,
    pub(crate) scripts_json: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlayerState {
    pub(crate) schema_version: String,
    pub(crate) scenario_id: String,
    pub(crate) config: SessionConfig,
    pub(crate) snapshot: SessionSnapshot,
    #[serde(default)]
    pub(crate) persistent: PersistentState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoundaryEvent {
    Choices,
    End,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Line {
    pub(crate) who: Option<String>,
    pub(crate) what: String,
}

#[derive(Debug, Clone)]
pub(crate) struct BoundaryResult {
    pub(crate) event: BoundaryEvent,
    pub(crate) lines: Vec<Line>,
    /// Index into the menu's items, and the caption shown for it.
    pub(crate) choices: Vec<(usize, String)>,
}
