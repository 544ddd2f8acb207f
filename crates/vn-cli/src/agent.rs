use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use vn_api::{
    create_session_from_json, resume_session_from_json, CreateSessionFromJsonOptions,
    ResumeSessionFromJsonOptions,
};
use vn_core::VnError;
use vn_runtime::{Session, SessionConfig};

use crate::{
    emit_boundary, load_player_state, load_session_config, load_source_by_ref,
    load_source_by_scripts_dir, run_to_boundary, save_player_state, AgentArgs, AgentCommand,
    AgentInterface, ChooseArgs, LoadedScenario, PlayerState, StartArgs, Transcript,
    PLAYER_STATE_SCHEMA,
};

pub(crate) fn run_agent(args: AgentArgs) -> Result<i32, VnError> {
    match args.command {
        AgentCommand::Start(args) => run_start(args),
        AgentCommand::Choose(args) => run_choose(args),
    }
}

fn run_start(args: StartArgs) -> Result<i32, VnError> {
    let scenario = load_source_by_scripts_dir(&args.scripts_dir)?;
    let config = load_session_config(&args.session)?;
    let (interface, transcript) = AgentInterface::new(None);

    let mut session = create_session_from_json(CreateSessionFromJsonOptions {
        scripts_json: scenario.scripts_json.clone(),
        entry_label: args.entry_label,
        config: config.clone(),
        interface: Box::new(interface),
        registry: None,
        persistent: None,
    })?;
    advance(&mut session, &transcript, &scenario, config, &args.state_out)
}

fn run_choose(args: ChooseArgs) -> Result<i32, VnError> {
    let state = load_player_state(Path::new(&args.state_in))?;
    if state.snapshot.context.current.is_none() {
        return Err(VnError::usage(
            "CLI_STATE_FINISHED",
            "The saved session already reached the end of the script.",
        ));
    }
    let scenario = load_source_by_ref(&state.scenario_id)?;
    let (interface, transcript) = AgentInterface::new(Some(args.choice));

    let mut session = resume_session_from_json(ResumeSessionFromJsonOptions {
        scripts_json: scenario.scripts_json.clone(),
        snapshot: state.snapshot,
        config: state.config.clone(),
        interface: Box::new(interface),
        registry: None,
        persistent: Some(state.persistent),
    })?;
    advance(&mut session, &transcript, &scenario, state.config, &args.state_out)
}

fn advance(
    session: &mut Session,
    transcript: &Rc<RefCell<Transcript>>,
    scenario: &LoadedScenario,
    config: SessionConfig,
    state_out: &str,
) -> Result<i32, VnError> {
    let (boundary, snapshot) = run_to_boundary(session, transcript)?;
    save_player_state(
        Path::new(state_out),
        &PlayerState {
            schema_version: PLAYER_STATE_SCHEMA.to_string(),
            scenario_id: scenario.id.clone(),
            config,
            snapshot,
            persistent: session.persistent().clone(),
        },
    )?;
    emit_boundary(&boundary, session.counters());
    Ok(0)
}
