use serde::{Deserialize, Serialize};

use super::*;
use crate::context::{DynamicFrame, PendingArguments, ReturnFrame};
use crate::node::DiffInfo;
use crate::translation::TranslationCounters;

pub const SNAPSHOT_SCHEMA: &str = "vn-session-snapshot.v1";

/// Execution context with node ids replaced by their persistent names, so
/// it survives a reload of the script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedContext {
    pub current: Option<NodeName>,
    pub return_stack: Vec<ReturnFrame>,
    pub base_dynamic: DynamicFrame,
    pub abnormal: bool,
    pub last_abnormal: bool,
    pub translate_identifier: Option<String>,
    pub alternate: Option<String>,
    pub pending_arguments: Option<PendingArguments>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub schema: String,
    pub context: SavedContext,
    pub stores: Stores,
    pub counters: TranslationCounters,
    pub language: Option<String>,
}

impl Session {
    pub fn checkpoint(&self) -> SessionSnapshot {
        let context = &self.context;
        SessionSnapshot {
            schema: SNAPSHOT_SCHEMA.to_string(),
            context: SavedContext {
                current: self.node_name(context.current),
                return_stack: context.return_stack.clone(),
                base_dynamic: context.base_dynamic.clone(),
                abnormal: context.abnormal,
                last_abnormal: context.last_abnormal,
                translate_identifier: context.translate_identifier.clone(),
                alternate: context.alternate.clone(),
                pending_arguments: context.pending_arguments.clone(),
            },
            stores: self.stores.clone(),
            counters: self.counters,
            language: self.config.language.clone(),
        }
    }

    /// Restores a checkpoint. The session is left untouched when the
    /// snapshot does not fit the loaded script. A checkpoint taken under
    /// another language runs that language's translate blocks again, then
    /// variables are taken from the checkpoint.
    pub fn rollback(&mut self, snapshot: SessionSnapshot) -> Result<(), VnError> {
        if snapshot.schema != SNAPSHOT_SCHEMA {
            return Err(VnError::usage(
                "SNAPSHOT_SCHEMA",
                format!(
                    "Snapshot schema {} is not supported (expected {}).",
                    snapshot.schema, SNAPSHOT_SCHEMA
                ),
            ));
        }

        let saved = snapshot.context;
        let current = match &saved.current {
            Some(name) => Some(self.script.lookup(name).map_err(|_| {
                VnError::resolution(
                    "SNAPSHOT_NODE_MISSING",
                    format!("Snapshot refers to {}, which is not in the script.", name),
                )
            })?),
            None => None,
        };
        for frame in &saved.return_stack {
            if let Some(site) = &frame.return_site {
                if self.script.lookup_or_none(site).is_none() {
                    return Err(VnError::resolution(
                        "SNAPSHOT_NODE_MISSING",
                        format!("Snapshot returns to {}, which is not in the script.", site),
                    ));
                }
            }
        }

        if snapshot.language != self.config.language {
            let previous_language = self.config.language.clone();
            let previous_stores = self.stores.clone();
            let saved_context = self.context.clone();
            if let Err(error) = self.change_language(snapshot.language.clone()) {
                self.config.language = previous_language;
                self.stores = previous_stores;
                self.context = saved_context;
                return Err(error);
            }
        }

        self.context = ExecutionContext {
            current,
            return_stack: saved.return_stack,
            base_dynamic: saved.base_dynamic,
            abnormal: saved.abnormal,
            last_abnormal: saved.last_abnormal,
            translate_identifier: saved.translate_identifier,
            alternate: saved.alternate,
            pending_arguments: saved.pending_arguments,
            ..ExecutionContext::default()
        };
        self.stores = snapshot.stores;
        self.counters = snapshot.counters;
        self.config.language = snapshot.language;
        self.interacted();
        tracing::debug!(current = ?saved.current, "rolled back");
        Ok(())
    }

    pub fn diff_info(&self, id: NodeId) -> DiffInfo {
        self.script.node(id).diff_info()
    }
}
