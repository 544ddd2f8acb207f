use std::collections::BTreeMap;

use vn_api::load_script_from_json_map;
use vn_core::VnError;
use vn_runtime::Script;

use crate::{load_source_by_scripts_dir, LintArgs};

#[derive(Debug, Default, PartialEq)]
pub(crate) struct LintReport {
    /// `(file, line, node name)` of every statement no entry point reaches.
    pub(crate) unreachable: Vec<(String, usize, String)>,
    pub(crate) untranslated: BTreeMap<String, Vec<String>>,
    /// `(language, identifier)` of translations without a canonical line.
    pub(crate) orphans: Vec<(String, String)>,
}

impl LintReport {
    pub(crate) fn is_clean(&self) -> bool {
        self.unreachable.is_empty()
            && self.orphans.is_empty()
            && self.untranslated.values().all(Vec::is_empty)
    }
}

pub(crate) fn lint_script(script: &Script) -> LintReport {
    let unreachable = script
        .unreachable_nodes()
        .into_iter()
        .map(|id| {
            let node = script.node(id);
            (
                node.location.filename.clone(),
                node.location.line,
                node.name.to_string(),
            )
        })
        .collect();
    let orphans = script
        .translator()
        .orphans()
        .into_iter()
        .map(|(identifier, language, _)| (language.to_string(), identifier.to_string()))
        .collect();

    LintReport {
        unreachable,
        untranslated: script.translation_coverage(),
        orphans,
    }
}

pub(crate) fn run_lint(args: LintArgs) -> Result<i32, VnError> {
    let scenario = load_source_by_scripts_dir(&args.scripts_dir)?;
    let script = load_script_from_json_map(&scenario.scripts_json, None)?;
    let report = lint_script(&script);

    println!("RESULT:OK");
    for (file, line, name) in &report.unreachable {
        println!("UNREACHABLE:{}:{}|{}", file, line, name);
    }
    for (language, identifiers) in &report.untranslated {
        for identifier in identifiers {
            println!("UNTRANSLATED:{}|{}", language, identifier);
        }
    }
    for (language, identifier) in &report.orphans {
        println!("ORPHAN:{}|{}", language, identifier);
    }
    println!(
        "SUMMARY:unreachable={} untranslated={} orphans={}",
        report.unreachable.len(),
        report.untranslated.values().map(Vec::len).sum::<usize>(),
        report.orphans.len()
    );

    Ok(if args.strict && !report.is_clean() { 1 } else { 0 })
}
