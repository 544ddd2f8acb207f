mod support;

use pretty_assertions::assert_eq;
use support::*;

fn dialogue(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter(|line| line.starts_with("LINE_JSON:") || line.starts_with("CHOICE:"))
        .cloned()
        .collect()
}

#[test]
fn agent_pauses_at_menus_and_resumes_with_a_choice() {
    let state = state_path("agent");
    let output = run_cli(&[
        "agent",
        "start",
        "--scripts-dir",
        &fixture("garden"),
        "--state-out",
        &state,
    ]);
    assert!(output.status.success());
    let lines = stdout_lines(&output);
    assert_eq!(lines[0], "RESULT:OK");
    assert_eq!(lines[1], "EVENT:CHOICES");
    assert_eq!(
        dialogue(&lines),
        vec![
            r#"LINE_JSON:{"what":"Welcome to the garden.","who":"Eileen"}"#,
            r#"LINE_JSON:{"what":"What now?","who":null}"#,
            r#"CHOICE:0|"Stay""#,
            r#"CHOICE:1|"Leave""#,
        ]
    );

    let output = run_cli(&[
        "agent", "choose", "--state-in", &state, "--choice", "0", "--state-out", &state,
    ]);
    assert!(output.status.success());
    let lines = stdout_lines(&output);
    assert_eq!(lines[1], "EVENT:END");
    assert_eq!(
        dialogue(&lines),
        vec![
            r#"LINE_JSON:{"what":"Let's stay a while.","who":"Eileen"}"#,
            r#"LINE_JSON:{"what":"You leave with some flowers.","who":null}"#,
        ]
    );
    assert!(lines.contains(&"SEEN:2|2".to_string()));

    let saved = std::fs::read_to_string(&state).expect("state file");
    let saved: serde_json::Value = serde_json::from_str(&saved).expect("state json");
    assert_eq!(saved["snapshot"]["stores"]["stores"]["store"]["values"]["flowers"], 2.0);

    let output = run_cli(&[
        "agent", "choose", "--state-in", &state, "--choice", "0", "--state-out", &state,
    ]);
    assert!(!output.status.success());
    let lines = stdout_lines(&output);
    assert_eq!(lines[0], "RESULT:ERROR");
    assert_eq!(lines[1], "ERROR_CODE:CLI_STATE_FINISHED");
}

#[test]
fn agent_uses_the_configured_language() {
    let state = state_path("agent-fr");
    let output = run_cli(&[
        "agent",
        "start",
        "--scripts-dir",
        &fixture("garden"),
        "--config",
        &fixture("configs/french.json"),
        "--state-out",
        &state,
    ]);
    assert!(output.status.success());
    assert_eq!(
        dialogue(&stdout_lines(&output)),
        vec![
            r#"LINE_JSON:{"what":"Bienvenue au jardin.","who":"Eileen"}"#,
            r#"LINE_JSON:{"what":"Et maintenant ?","who":null}"#,
            r#"CHOICE:0|"Rester""#,
            r#"CHOICE:1|"Partir""#,
        ]
    );

    let output = run_cli(&[
        "agent", "choose", "--state-in", &state, "--choice", "1", "--state-out", &state,
    ]);
    assert!(output.status.success());
    assert_eq!(
        dialogue(&stdout_lines(&output)),
        vec![r#"LINE_JSON:{"what":"Vous partez avec quelques fleurs.","who":null}"#]
    );
}

#[test]
fn runtime_errors_are_reported_with_their_location() {
    let state = state_path("agent-broken");
    let output = run_cli(&[
        "agent",
        "start",
        "--scripts-dir",
        &fixture("broken"),
        "--state-out",
        &state,
    ]);
    assert!(!output.status.success());
    let lines = stdout_lines(&output);
    assert_eq!(lines[0], "RESULT:ERROR");
    assert_eq!(lines[1], "ERROR_CODE:LABEL_MISSING");
    assert_eq!(lines[2], "ERROR_KIND:resolution");
    assert_eq!(lines[3], "ERROR_AT:broken.rpy:3");
}

#[test]
fn missing_scripts_dir_is_a_cli_error() {
    let output = run_cli(&[
        "agent",
        "start",
        "--scripts-dir",
        &fixture("does-not-exist"),
        "--state-out",
        &state_path("missing"),
    ]);
    assert!(!output.status.success());
    assert_eq!(stdout_lines(&output)[1], "ERROR_CODE:CLI_SOURCE_NOT_FOUND");
}
