use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use vn_core::{ScriptFile, Statement, VnError};
use vn_runtime::{
    Interface, PersistentState, Script, Session, SessionConfig, SessionOptions, SessionSnapshot,
    StatementRegistry,
};

pub const DEFAULT_ENTRY_LABEL: &str = "start";

pub struct CreateSessionFromJsonOptions {
    pub scripts_json: BTreeMap<String, String>,
    pub entry_label: Option<String>,
    pub config: SessionConfig,
    pub interface: Box<dyn Interface>,
    pub registry: Option<Arc<StatementRegistry>>,
    pub persistent: Option<PersistentState>,
}

pub struct ResumeSessionFromJsonOptions {
    pub scripts_json: BTreeMap<String, String>,
    pub snapshot: SessionSnapshot,
    pub config: SessionConfig,
    pub interface: Box<dyn Interface>,
    pub registry: Option<Arc<StatementRegistry>>,
    pub persistent: Option<PersistentState>,
}

/// A source file is either a full script file or a bare statement list
/// named after its path.
#[derive(Deserialize)]
#[serde(untagged)]
enum FileSource {
    File(ScriptFile),
    Statements(Vec<Statement>),
}

pub fn parse_script_files_from_json_map(
    scripts_json: &BTreeMap<String, String>,
) -> Result<Vec<ScriptFile>, VnError> {
    scripts_json
        .iter()
        .map(|(path, raw)| {
            let source = serde_json::from_str::<FileSource>(raw).map_err(|error| {
                VnError::usage(
                    "API_SCRIPT_JSON_INVALID",
                    format!("Failed to parse {}: {}", path, error),
                )
            })?;
            Ok(match source {
                FileSource::File(file) => file,
                FileSource::Statements(statements) => ScriptFile {
                    filename: path.clone(),
                    version: 0,
                    statements,
                },
            })
        })
        .collect()
}

pub fn load_script_from_json_map(
    scripts_json: &BTreeMap<String, String>,
    registry: Option<Arc<StatementRegistry>>,
) -> Result<Script, VnError> {
    if scripts_json.is_empty() {
        return Err(VnError::usage(
            "API_SCRIPTS_EMPTY",
            "No script files were given.",
        ));
    }
    let files = parse_script_files_from_json_map(scripts_json)?;
    Script::load(files, registry.unwrap_or_default())
}

fn boot_session(
    script: Script,
    config: SessionConfig,
    interface: Box<dyn Interface>,
    persistent: Option<PersistentState>,
) -> Result<Session, VnError> {
    let mut options = SessionOptions::new(Arc::new(script), interface);
    options.config = config;
    options.persistent = persistent;
    let mut session = Session::new(options);
    session.boot()?;
    Ok(session)
}

/// Loads the scripts, runs the init phase and starts at the entry label.
#[tracing::instrument(level = "debug", skip_all)]
pub fn create_session_from_json(
    options: CreateSessionFromJsonOptions,
) -> Result<Session, VnError> {
    let script = load_script_from_json_map(&options.scripts_json, options.registry)?;
    let entry_label = resolve_entry_label(&script, options.entry_label)?;

    let mut session = boot_session(
        script,
        options.config,
        options.interface,
        options.persistent,
    )?;
    session.start(&entry_label)?;
    Ok(session)
}

/// Loads the scripts, runs the init phase and rolls back to `snapshot`.
#[tracing::instrument(level = "debug", skip_all)]
pub fn resume_session_from_json(
    options: ResumeSessionFromJsonOptions,
) -> Result<Session, VnError> {
    let script = load_script_from_json_map(&options.scripts_json, options.registry)?;
    let mut session = boot_session(
        script,
        options.config,
        options.interface,
        options.persistent,
    )?;
    session.rollback(options.snapshot)?;
    Ok(session)
}

fn resolve_entry_label(script: &Script, explicit: Option<String>) -> Result<String, VnError> {
    if let Some(entry) = explicit {
        if !script.has_label(&entry) {
            return Err(VnError::resolution(
                "API_ENTRY_LABEL_NOT_FOUND",
                format!("Entry label \"{}\" is not defined.", entry),
            ));
        }
        return Ok(entry);
    }

    if script.has_label(DEFAULT_ENTRY_LABEL) {
        return Ok(DEFAULT_ENTRY_LABEL.to_string());
    }

    Err(VnError::resolution(
        "API_ENTRY_START_NOT_FOUND",
        "Expected a label named \"start\" as default entry.",
    ))
}
