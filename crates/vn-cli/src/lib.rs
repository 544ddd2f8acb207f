use std::ffi::OsString;

use clap::Parser;
use vn_core::VnError;

mod agent;
mod boundary_runner;
mod cli_args;
mod error_map;
mod lint;
mod models;
mod player;
mod source_loader;
mod state_store;

pub(crate) use boundary_runner::{
    display_name, emit_boundary, run_to_boundary, AgentInterface, Transcript,
};
pub(crate) use cli_args::{
    AgentArgs, AgentCommand, ChooseArgs, Cli, LintArgs, Mode, PlayArgs, SessionArgs, StartArgs,
};
pub(crate) use error_map::{
    emit_error, json_string, map_cli_config_invalid, map_cli_config_read, map_cli_io,
    map_cli_source_path, map_cli_source_read, map_cli_source_scan, map_cli_state_invalid,
    map_cli_state_read, map_cli_state_write,
};
pub(crate) use models::{
    BoundaryEvent, BoundaryResult, Line, LoadedScenario, PlayerState, PLAYER_STATE_SCHEMA,
};
pub(crate) use source_loader::{
    load_session_config, load_source_by_ref, load_source_by_scripts_dir,
};
pub(crate) use state_store::{load_player_state, save_player_state};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    init_tracing(cli.log.as_deref());
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

/// Logs go to stderr so stdout stays machine readable. Nothing is
/// installed unless `--log` or RUST_LOG asks for it.
fn init_tracing(filter: Option<&str>) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match filter {
        Some(filter) => EnvFilter::new(filter),
        None => match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => return,
        },
    };
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .with(filter)
        .try_init();
}

fn run(cli: Cli) -> Result<i32, VnError> {
    match cli.command {
        Mode::Agent(args) => agent::run_agent(args),
        Mode::Play(args) => player::run_play(args),
        Mode::Lint(args) => lint::run_lint(args),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli_test_support::*;

    #[test]
    fn unknown_subcommands_fail_with_the_clap_exit_code() {
        assert_eq!(run_cli_from_args(["vn-cli", "dance"]), 2);
    }

    #[test]
    fn agent_round_trip_through_a_state_file() {
        let root = temp_path("agent");
        write_file(
            &root.join("scripts/script.json"),
            r#"[
              {"kind": "label", "name": "start", "block": [
                {"kind": "menu", "items": [
                  {"label": "Left", "block": [{"kind": "python", "code": "let side = \"left\";"}]},
                  {"label": "Right", "block": [{"kind": "python", "code": "let side = \"right\";"}]}
                ]},
                {"kind": "say", "what": "went somewhere"},
                {"kind": "return"}
              ]}
            ]"#,
        );
        let scripts_dir = root.join("scripts").to_string_lossy().to_string();
        let state = root.join("state.json").to_string_lossy().to_string();

        let code = run_cli_from_args([
            "vn-cli",
            "agent",
            "start",
            "--scripts-dir",
            &scripts_dir,
            "--state-out",
            &state,
        ]);
        assert_eq!(code, 0);
        let saved = load_player_state(std::path::Path::new(&state)).expect("state");
        assert!(saved.snapshot.context.current.is_some());

        let code = run_cli_from_args([
            "vn-cli", "agent", "choose", "--state-in", &state, "--choice", "1", "--state-out",
            &state,
        ]);
        assert_eq!(code, 0);
        let saved = load_player_state(std::path::Path::new(&state)).expect("state");
        assert!(saved.snapshot.context.current.is_none());
        assert_eq!(
            saved.snapshot.stores.get("store", "side").ok(),
            Some(vn_core::VnValue::String("right".to_string()))
        );

        let code = run_cli_from_args([
            "vn-cli", "agent", "choose", "--state-in", &state, "--choice", "0", "--state-out",
            &state,
        ]);
        assert_eq!(code, 1);
    }
}
