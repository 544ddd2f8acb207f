use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use vn_core::ErrorKind;

use super::*;
use crate::interface::PredictionCache;
use crate::test_support::{
    script_from_json, script_with_registry, session_with, Recorded, RecordingInterface,
};

fn started(
    statements: &str,
    config: SessionConfig,
    choices: &[Option<usize>],
) -> (Session, Rc<RefCell<Recorded>>) {
    let (mut session, log) = session_with(script_from_json(statements), config, choices);
    session.start("start").expect("start should pass");
    (session, log)
}

#[test]
fn call_and_return_restore_continuation_and_dynamic_scope() {
    let (mut session, log) = started(
        r#"[
          {"kind": "label", "name": "start", "block": [
            {"kind": "python", "code": "let mood = \"outer\";"},
            {"kind": "call", "label": "greet", "arguments": {"arguments": [{"expr": "\"inner\""}]}},
            {"kind": "say", "what": "back [mood]"},
            {"kind": "return"}
          ]},
          {"kind": "label", "name": "greet",
           "parameters": {"parameters": [{"name": "mood", "kind": "positional_or_keyword"}]},
           "block": [
            {"kind": "say", "what": "in [mood]"},
            {"kind": "return", "expression": "42"}
          ]}
        ]"#,
        SessionConfig::default(),
        &[],
    );

    while session.current_statement_name() != "return" || session.context().call_depth() != 1 {
        assert!(session.step().expect("step should pass"));
    }
    assert_eq!(session.get("_return"), Ok(VnValue::Number(42.0)));
    assert_eq!(session.get("mood"), Ok(VnValue::String("outer".to_string())));

    session.run().expect("run should pass");
    assert_eq!(log.borrow().lines(), vec!["in inner", "back outer"]);
    assert!(session.is_finished());
    assert_eq!(session.context().call_depth(), 0);
}

#[test]
fn menu_guards_filter_choices_in_declaration_order() {
    let (mut session, log) = started(
        r#"[
          {"kind": "label", "name": "start", "block": [
            {"kind": "menu", "items": [
              {"label": "A", "condition": "false", "block": [{"kind": "say", "what": "picked A"}]},
              {"label": "B", "block": [{"kind": "say", "what": "picked B"}]},
              {"label": "C", "block": [{"kind": "say", "what": "picked C"}]}
            ]},
            {"kind": "say", "what": "after"}
          ]}
        ]"#,
        SessionConfig::default(),
        &[Some(1)],
    );
    session.run().expect("run should pass");

    let log = log.borrow();
    let captions = log.menus[0]
        .items
        .iter()
        .map(|item| (item.caption.as_str(), item.item))
        .collect::<Vec<_>>();
    assert_eq!(captions, vec![("B", Some(1)), ("C", Some(2))]);
    assert_eq!(log.lines(), vec!["picked C", "after"]);
}

#[test]
fn menu_captions_become_narration_and_set_hides_chosen_items() {
    let (mut session, log) = started(
        r#"[
          {"kind": "label", "name": "start", "block": [
            {"kind": "python", "code": "let chosen = [];"},
            {"kind": "menu", "set": "chosen", "items": [
              {"label": "Where to?"},
              {"label": "Park", "block": [{"kind": "pass"}]},
              {"label": "Beach", "block": [{"kind": "pass"}]}
            ]},
            {"kind": "menu", "set": "chosen", "items": [
              {"label": "Park", "block": [{"kind": "pass"}]},
              {"label": "Beach", "block": [{"kind": "pass"}]}
            ]}
          ]}
        ]"#,
        SessionConfig::default(),
        &[Some(0), Some(0)],
    );
    session.run().expect("run should pass");

    let log = log.borrow();
    assert_eq!(log.says[0].what, "Where to?");
    assert!(!log.says[0].interact);
    assert_eq!(log.menus[0].items.len(), 2);
    assert_eq!(log.menus[1].items.len(), 1);
    assert_eq!(log.menus[1].items[0].caption, "Beach");
    assert_eq!(
        session.get("chosen"),
        Ok(VnValue::Array(vec![
            VnValue::String("Park".to_string()),
            VnValue::String("Beach".to_string())
        ]))
    );
}

#[test]
fn out_of_range_choice_is_a_usage_error() {
    let (mut session, _log) = started(
        r#"[
          {"kind": "label", "name": "start", "block": [
            {"kind": "menu", "items": [{"label": "Only", "block": [{"kind": "pass"}]}]}
          ]}
        ]"#,
        SessionConfig::default(),
        &[Some(4)],
    );
    let error = session.run().expect_err("bad choice");
    assert_eq!(error.kind, ErrorKind::Usage);
    assert_eq!(error.code, "MENU_CHOICE_INDEX");
}

const TRANSLATED: &str = r#"[
  {"kind": "label", "name": "start", "block": [
    {"kind": "translate_say", "what": "Hello", "identifier": "start_hello"},
    {"kind": "translate_say", "what": "Bye", "identifier": "start_bye"},
    {"kind": "return"}
  ]},
  {"kind": "translate_say", "what": "Bonjour", "identifier": "start_hello", "language": "fr"}
]"#;

#[test]
fn translations_fall_back_and_count_each_line_once() {
    let config = SessionConfig {
        language: Some("fr".to_string()),
        ..SessionConfig::default()
    };
    let (mut session, log) = started(TRANSLATED, config, &[]);
    session.run().expect("run should pass");
    assert_eq!(log.borrow().lines(), vec!["Bonjour", "Bye"]);
    assert_eq!(session.counters(), TranslationCounters { seen: 2, new: 2 });
    assert!(session.persistent().has_seen_translate("start_hello"));

    session.start("start").expect("restart");
    session.run().expect("second run");
    assert_eq!(log.borrow().lines(), vec!["Bonjour", "Bye", "Bonjour", "Bye"]);
    assert_eq!(session.counters(), TranslationCounters { seen: 2, new: 2 });
}

#[test]
fn failed_translated_line_is_still_marked_seen() {
    let statements = r#"[
      {"kind": "label", "name": "start", "block": [
        {"kind": "translate_say", "who": "nobody", "what": "Hi", "identifier": "start_hi"},
        {"kind": "say", "what": "after"},
        {"kind": "return"}
      ]}
    ]"#;
    let config = SessionConfig {
        error_policy: ErrorPolicy::Ignore,
        ..SessionConfig::default()
    };
    let (mut session, log) = started(statements, config, &[]);
    session.run().expect("failed sayer is skipped");
    assert_eq!(log.borrow().lines(), vec!["after"]);
    assert_eq!(session.context().translate_identifier, None);
    assert_eq!(session.context().alternate, None);
    assert!(session.persistent().has_seen_translate("start_hi"));
    assert_eq!(session.counters(), TranslationCounters { seen: 1, new: 1 });
}

#[test]
fn hashed_seen_keys_are_recognised() {
    let config = SessionConfig {
        hash_seen: true,
        ..SessionConfig::default()
    };
    let (mut session, log) = started(TRANSLATED, config, &[]);
    session.run().expect("run should pass");
    assert_eq!(log.borrow().lines(), vec!["Hello", "Bye"]);
    assert!(!session
        .persistent()
        .seen_translates
        .contains("start_hello"));
    assert!(session.persistent().has_seen_translate("start_hello"));
}

#[test]
fn translate_blocks_switch_with_the_language() {
    let (mut session, log) = started(
        r#"[
          {"kind": "label", "name": "start", "block": [
            {"kind": "translate", "identifier": "start_intro", "block": [
              {"kind": "say", "what": "Welcome"},
              {"kind": "end_translate"}
            ]},
            {"kind": "say", "what": "..."}
          ]},
          {"kind": "translate", "identifier": "start_intro", "language": "fr", "block": [
            {"kind": "say", "what": "Bienvenue"},
            {"kind": "end_translate"}
          ]},
          {"kind": "translate", "identifier": "start_intro", "language": "de", "block": [
            {"kind": "jump", "target": "start"}
          ]}
        ]"#,
        SessionConfig::default(),
        &[],
    );
    session
        .change_language(Some("fr".to_string()))
        .expect("language change");
    session.run().expect("run should pass");
    assert_eq!(log.borrow().lines(), vec!["Bienvenue", "..."]);
    assert_eq!(session.counters().seen, 1);
    assert_eq!(session.get_all_translates("start_intro").len(), 3);
}

#[test]
fn language_bound_translate_cannot_run_directly() {
    let script = script_from_json(
        r#"[
          {"kind": "label", "name": "start", "block": []},
          {"kind": "translate", "identifier": "x", "language": "fr", "block": [{"kind": "pass"}]}
        ]"#,
    );
    let (mut session, _log) = session_with(script, SessionConfig::default(), &[]);
    session.start("start").expect("start");
    let error = session.run().expect_err("direct translate");
    assert_eq!(error.code, "TRANSLATE_DIRECT");
    assert_eq!(error.kind, ErrorKind::Usage);
}

#[test]
fn change_language_runs_translate_python_and_blocks() {
    let (mut session, log) = started(
        r#"[
          {"kind": "init", "block": [
            {"kind": "translate_string", "language": "fr", "old": "Yes", "new": "Oui"}
          ]},
          {"kind": "translate_python", "language": "fr", "code": "let greeting = \"bonjour\";"},
          {"kind": "translate_block", "language": "fr", "block": [
            {"kind": "python", "code": "let style = \"fr\";"}
          ]},
          {"kind": "label", "name": "start", "block": [
            {"kind": "menu", "items": [{"label": "Yes", "block": [{"kind": "pass"}]}]}
          ]}
        ]"#,
        SessionConfig::default(),
        &[],
    );
    session
        .change_language(Some("fr".to_string()))
        .expect("language change");
    assert_eq!(session.get("greeting"), Ok(VnValue::String("bonjour".to_string())));
    assert_eq!(session.get("style"), Ok(VnValue::String("fr".to_string())));
    assert_eq!(session.config().language.as_deref(), Some("fr"));

    session.run().expect("run should pass");
    assert_eq!(log.borrow().menus[0].items[0].caption, "Oui");
}

#[test]
fn while_loops_until_the_condition_fails() {
    let (mut session, log) = started(
        r#"[
          {"kind": "label", "name": "start", "block": [
            {"kind": "python", "code": "let n = 0;"},
            {"kind": "while", "condition": "n < 3", "block": [
              {"kind": "say", "what": "tick [n]"},
              {"kind": "python", "code": "n += 1;"}
            ]},
            {"kind": "say", "what": "done [n]"}
          ]}
        ]"#,
        SessionConfig::default(),
        &[],
    );
    session.run().expect("run should pass");
    assert_eq!(
        log.borrow().lines(),
        vec!["tick 0", "tick 1", "tick 2", "done 3"]
    );
}

#[test]
fn ignore_policy_skips_failed_statements() {
    let statements = r#"[
      {"kind": "label", "name": "start", "block": [
        {"kind": "say", "what": "[missing_var]"},
        {"kind": "say", "what": "still here"},
        {"kind": "jump", "target": "nowhere"}
      ]}
    ]"#;

    let (mut raising, _log) = started(statements, SessionConfig::default(), &[]);
    let error = raising.run().expect_err("undefined variable");
    assert_eq!(error.kind, ErrorKind::Evaluation);
    assert_eq!(error.statement.as_deref(), Some("say"));
    assert_eq!(
        error.location.as_ref().map(|location| location.filename.as_str()),
        Some("<synthetic>")
    );

    let config = SessionConfig {
        error_policy: ErrorPolicy::Ignore,
        ..SessionConfig::default()
    };
    let (mut ignoring, log) = started(statements, config, &[]);
    ignoring.run().expect("errors are skipped");
    assert_eq!(log.borrow().lines(), vec!["still here"]);
    assert!(ignoring.is_finished());
}

#[test]
fn loop_guard_trips_without_interaction_even_when_ignoring() {
    let config = SessionConfig {
        loop_guard: 50,
        error_policy: ErrorPolicy::Ignore,
        ..SessionConfig::default()
    };
    let (mut session, _log) = started(
        r#"[
          {"kind": "label", "name": "start", "block": [
            {"kind": "while", "condition": "true", "block": [{"kind": "pass"}]}
          ]}
        ]"#,
        config,
        &[],
    );
    let error = session.run().expect_err("infinite loop");
    assert_eq!(error.kind, ErrorKind::Structural);
    assert_eq!(error.code, "LOOP_GUARD");
}

const DEFAULTS: &str = r#"[
  {"kind": "init", "block": [
    {"kind": "default", "name": "points", "expr": "10"},
    {"kind": "define", "name": "bonus", "expr": "5"}
  ]},
  {"kind": "label", "name": "start", "block": [
    {"kind": "python", "code": "points += bonus;"},
    {"kind": "return"}
  ]}
]"#;

#[test]
fn defaults_apply_at_start_and_only_once() {
    let (mut session, _log) = started(DEFAULTS, SessionConfig::default(), &[]);
    assert_eq!(session.get("points"), Ok(VnValue::Number(10.0)));
    assert!(session.stores().is_pure("store.bonus"));
    session.run().expect("run should pass");
    assert_eq!(session.get("points"), Ok(VnValue::Number(15.0)));

    session
        .execute_default_statements(false)
        .expect("defaults after load");
    assert_eq!(session.get("points"), Ok(VnValue::Number(15.0)));
    assert!(session.ever_changed("store").contains_key("points"));
}

#[test]
fn developer_mode_rejects_a_second_default() {
    let config = SessionConfig {
        developer: true,
        ..SessionConfig::default()
    };
    let (mut session, _log) = started(DEFAULTS, config, &[]);
    let error = session
        .execute_default_statements(true)
        .expect_err("second default");
    assert_eq!(error.kind, ErrorKind::Idempotency);
    assert_eq!(error.code, "DEFAULT_TWICE");
}

#[test]
fn define_operators_update_existing_values() {
    let (mut session, _log) = started(
        r##"[
          {"kind": "init", "block": [
            {"kind": "define", "name": "items", "expr": "[1]"},
            {"kind": "define", "name": "items", "operator": "+=", "expr": "[2]"},
            {"kind": "define", "name": "flags", "expr": "#{a: 1}"},
            {"kind": "define", "name": "flags", "index": "\"b\"", "expr": "2"},
            {"kind": "define", "name": "flags", "operator": "|=", "expr": "#{c: 3}"}
          ]},
          {"kind": "label", "name": "start", "block": []}
        ]"##,
        SessionConfig::default(),
        &[],
    );
    assert_eq!(
        session.get("items"),
        Ok(VnValue::Array(vec![VnValue::Number(1.0), VnValue::Number(2.0)]))
    );
    let flags = session.get("flags").expect("flags");
    let keys = flags
        .as_map()
        .expect("map")
        .keys()
        .cloned()
        .collect::<Vec<_>>();
    assert_eq!(keys, vec!["a", "b", "c"]);

    session.stores_mut().set("store", "items", VnValue::Null);
    session.redefine(&["store"]).expect("redefine");
    assert_eq!(
        session.get("items"),
        Ok(VnValue::Array(vec![VnValue::Number(1.0), VnValue::Number(2.0)]))
    );
}

#[test]
fn early_config_is_defined_before_init() {
    let config = SessionConfig {
        early_config: ["name".to_string()].into_iter().collect(),
        ..SessionConfig::default()
    };
    let script = script_from_json(
        r#"[
          {"kind": "early_python", "code": "let early = 1;"},
          {"kind": "init", "block": [
            {"kind": "define", "store": "store.config", "name": "name", "expr": "\"Demo\""}
          ]}
        ]"#,
    );
    let (interface, _log) = RecordingInterface::new(&[]);
    let mut options = SessionOptions::new(Arc::new(script), Box::new(interface));
    options.config = config;
    let mut session = Session::new(options);
    session.early_execute_all().expect("early pass");
    assert_eq!(
        session.stores().get("store.config", "name"),
        Ok(VnValue::String("Demo".to_string()))
    );
    assert_eq!(session.get("early"), Ok(VnValue::Number(1.0)));
}

#[test]
fn return_during_init_is_only_an_error_for_developers() {
    let statements = r#"[{"kind": "init", "block": [{"kind": "return"}]}]"#;
    for developer in [false, true] {
        let (interface, _log) = RecordingInterface::new(&[]);
        let mut options =
            SessionOptions::new(Arc::new(script_from_json(statements)), Box::new(interface));
        options.config.developer = developer;
        let result = Session::new(options).boot();
        match developer {
            false => assert!(result.is_ok()),
            true => assert_eq!(result.expect_err("developer").code, "RETURN_IN_INIT"),
        }
    }
}

#[test]
fn label_callbacks_see_abnormal_arrivals() {
    let (mut session, _log) = session_with(
        script_from_json(
            r#"[
              {"kind": "label", "name": "start", "block": [
                {"kind": "call", "label": "sub"},
                {"kind": "return"}
              ]},
              {"kind": "label", "name": "sub", "block": [{"kind": "return"}]}
            ]"#,
        ),
        SessionConfig::default(),
        &[],
    );
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    session
        .hooks_mut()
        .label_callbacks
        .push(Box::new(move |name: &str, abnormal: bool| {
            sink.borrow_mut().push((name.to_string(), abnormal));
        }));
    let names = Rc::new(RefCell::new(Vec::new()));
    let name_sink = Rc::clone(&names);
    session
        .hooks_mut()
        .statement_callbacks
        .push(Box::new(move |name: &str| {
            name_sink.borrow_mut().push(name.to_string())
        }));

    session.start("start").expect("start");
    session.run().expect("run should pass");
    assert_eq!(
        *seen.borrow(),
        vec![("start".to_string(), false), ("sub".to_string(), true)]
    );
    assert_eq!(
        *names.borrow(),
        vec!["label", "call", "label", "return", "return"]
    );
    assert!(session.persistent().seen_labels.contains("sub"));
}

#[test]
fn prediction_is_speculative_and_never_fails() {
    let (mut session, _log) = session_with(
        script_from_json(
            r#"[
              {"kind": "label", "name": "start", "block": [
                {"kind": "call", "label": "target_name", "expression": true},
                {"kind": "call", "label": "pick()", "expression": true},
                {"kind": "jump", "target": "missing_var", "expression": true},
                {"kind": "return"}
              ]},
              {"kind": "label", "name": "elsewhere", "block": [{"kind": "return"}]}
            ]"#,
        ),
        SessionConfig::default(),
        &[],
    );
    session
        .stores_mut()
        .set("store", "target_name", VnValue::String("elsewhere".to_string()));
    session.start("start").expect("start");
    let before = session.stores().clone();

    let elsewhere = session.script().lookup_label("elsewhere").expect("label");
    let mut cache = PredictionCache::default();
    assert_eq!(session.predict(NodeId(1), &mut cache), vec![elsewhere]);
    assert_eq!(session.predict(NodeId(2), &mut cache), Vec::<NodeId>::new());
    assert_eq!(session.predict(NodeId(3), &mut cache), Vec::<NodeId>::new());
    assert_eq!(session.stores(), &before);

    let ahead = session.predict_ahead(10);
    assert_eq!(ahead.nodes, vec![NodeId(0), NodeId(1), elsewhere, NodeId(6)]);
}

#[test]
fn scry_reports_upcoming_interactions() {
    let (session, _log) = session_with(
        script_from_json(
            r#"[
              {"kind": "label", "name": "start", "block": [
                {"kind": "say", "who": "e", "what": "Hi"},
                {"kind": "menu", "has_caption": true, "items": [
                  {"label": "Go", "block": [{"kind": "pass"}]}
                ]},
                {"kind": "jump", "target": "start"}
              ]}
            ]"#,
        ),
        SessionConfig::default(),
        &[],
    );
    assert_eq!(session.scry_next(), None);

    let say = session.scry(NodeId(1));
    assert_eq!(say.say, Some(true));
    assert_eq!(say.interacts, Some(true));
    assert_eq!(say.next, Some(NodeId(2)));
    assert_eq!(say.who, None);
    assert_eq!(say.extend_text, Some(crate::scry::ExtendText::DoesNotExtend));

    let menu = session.scry(NodeId(2));
    assert_eq!(menu.menu_with_caption, Some(true));
    assert_eq!(menu.next, Some(NodeId(4)));

    assert_eq!(session.scry(NodeId(4)).next, Some(NodeId(0)));
}

#[test]
fn rollback_restores_context_and_variables() {
    let (mut session, log) = started(
        r#"[
          {"kind": "label", "name": "start", "block": [
            {"kind": "python", "code": "let count = 0;"},
            {"kind": "say", "what": "a"},
            {"kind": "python", "code": "count += 1;"},
            {"kind": "say", "what": "b [count]"}
          ]}
        ]"#,
        SessionConfig::default(),
        &[],
    );
    for _ in 0..3 {
        session.step().expect("step");
    }
    let snapshot = session.checkpoint();
    let text = serde_json::to_string(&snapshot).expect("snapshot json");
    let restored: SessionSnapshot = serde_json::from_str(&text).expect("snapshot back");

    session.run().expect("run should pass");
    assert_eq!(session.get("count"), Ok(VnValue::Number(1.0)));

    session.rollback(restored).expect("rollback");
    assert_eq!(session.get("count"), Ok(VnValue::Number(0.0)));
    session.run().expect("replay");
    assert_eq!(log.borrow().lines(), vec!["a", "b 1", "b 1"]);

    let mut stale = session.checkpoint();
    stale.schema = "old".to_string();
    assert_eq!(
        session.rollback(stale).expect_err("schema").code,
        "SNAPSHOT_SCHEMA"
    );
}

#[test]
fn rollback_loads_the_checkpoint_language() {
    let statements = r#"[
      {"kind": "label", "name": "start", "block": [
        {"kind": "python", "code": "let visits = 1;"},
        {"kind": "menu", "items": [{"label": "Yes", "block": [{"kind": "say", "what": "picked"}]}]},
        {"kind": "return"}
      ]},
      {"kind": "translate_block", "language": "fr", "block": [
        {"kind": "translate_string", "language": "fr", "old": "Yes", "new": "Oui"},
        {"kind": "python", "code": "let visits = 99;"}
      ]}
    ]"#;
    let french = SessionConfig {
        language: Some("fr".to_string()),
        ..SessionConfig::default()
    };
    let (mut source, _log) = started(statements, french, &[]);
    source.step().expect("label step");
    source.step().expect("python step");
    assert_eq!(source.get("visits"), Ok(VnValue::Number(1.0)));
    let snapshot = source.checkpoint();

    let (mut target, log) = started(statements, SessionConfig::default(), &[]);
    target.rollback(snapshot).expect("rollback");
    assert_eq!(target.config().language.as_deref(), Some("fr"));
    assert_eq!(target.get("visits"), Ok(VnValue::Number(1.0)));

    target.run().expect("run should pass");
    let captions = log.borrow().menus[0]
        .items
        .iter()
        .map(|item| item.caption.clone())
        .collect::<Vec<_>>();
    assert_eq!(captions, vec!["Oui".to_string()]);
    assert_eq!(log.borrow().lines(), vec!["picked"]);
}

#[test]
fn display_statements_reach_the_interface() {
    let config = SessionConfig {
        tag_layers: [("eileen".to_string(), "characters".to_string())]
            .into_iter()
            .collect(),
        ..SessionConfig::default()
    };
    let (mut session, log) = started(
        r#"[
          {"kind": "label", "name": "start", "block": [
            {"kind": "scene", "imspec": {"name": ["bg", "park"]}},
            {"kind": "show", "imspec": {"name": ["eileen", "happy"], "at_list": ["\"left\""]}},
            {"kind": "show", "imspec": {"name": [], "expression": "\"sunset.png\""}},
            {"kind": "hide", "imspec": {"name": ["eileen"]}},
            {"kind": "with", "expr": "\"dissolve\""}
          ]}
        ]"#,
        config,
        &[],
    );
    session.run().expect("run should pass");

    let log = log.borrow();
    assert_eq!(log.scenes, vec!["master"]);
    assert_eq!(log.shows[0].name, vec!["bg", "park"]);
    assert_eq!(log.shows[0].layer, "master");
    assert_eq!(log.shows[1].layer, "characters");
    assert_eq!(log.shows[1].at_list, vec![VnValue::String("left".to_string())]);
    assert_eq!(log.shows[2].tag.as_deref(), Some("_show_expression_0"));
    assert_eq!(
        log.shows[2].what,
        Some(VnValue::String("sunset.png".to_string()))
    );
    assert_eq!(
        log.hides,
        vec![("eileen".to_string(), "characters".to_string())]
    );
    assert_eq!(log.transitions, vec![VnValue::String("dissolve".to_string())]);
}

#[test]
fn user_statements_run_with_their_post_hook() {
    let (mut session, _log) = session_with(
        script_with_registry(
            r#"[
              {"kind": "label", "name": "start", "block": [
                {"kind": "user_statement", "line": "tally 2", "statement": "tally", "parsed": 2},
                {"kind": "user_statement", "line": "tally 3", "statement": "tally", "parsed": 3}
              ]}
            ]"#,
        ),
        SessionConfig::default(),
        &[],
    );
    session.start("start").expect("start");
    session.run().expect("run should pass");
    assert_eq!(session.get("tally"), Ok(VnValue::Number(5.0)));
    assert_eq!(session.get("tally_done"), Ok(VnValue::Bool(true)));
}
