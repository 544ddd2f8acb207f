use std::collections::{BTreeMap, VecDeque};

use rustc_hash::FxHashSet;
use vn_core::NodeName;

use crate::node::{Node, NodeId, NodeKind};
use crate::script::Script;
use crate::statements::ReachableInfo;

fn always_true(condition: &str) -> bool {
    matches!(condition.trim(), "true" | "True")
}

impl Script {
    /// Statements control may pass to directly after `id`. Computed
    /// statically, so evaluated targets are left out.
    pub fn get_reachable(&self, id: NodeId) -> Vec<NodeId> {
        let node = self.node(id);
        let mut out = Vec::new();
        match &node.kind {
            NodeKind::Call {
                label, expression, ..
            } => {
                if !*expression {
                    out.extend(self.lookup_label(label).ok());
                }
                out.extend(node.next);
            }
            NodeKind::Jump {
                target, expression, ..
            } => {
                if !*expression {
                    out.extend(self.lookup_label(target).ok());
                }
            }
            NodeKind::Return { .. } => {}
            NodeKind::While { condition, block } => {
                out.push(block.first().copied().unwrap_or(id));
                if !always_true(condition) {
                    out.extend(node.next);
                }
            }
            NodeKind::If { entries } => {
                let mut exhaustive = false;
                for entry in entries {
                    out.extend(entry.block.first().copied());
                    if always_true(&entry.condition) {
                        exhaustive = true;
                        break;
                    }
                }
                if !exhaustive {
                    out.extend(node.next);
                }
            }
            NodeKind::Init { block, .. } | NodeKind::TranslateBlock { block, .. } => {
                out.extend(block.first().copied());
                out.extend(node.next);
            }
            NodeKind::Translate {
                identifier,
                language,
                block,
                after,
                ..
            } => {
                out.extend(block.first().copied());
                out.extend(*after);
                if language.is_none() {
                    out.extend(self.other_translations(identifier, id));
                }
            }
            NodeKind::TranslateSay(translated) => {
                out.extend(node.next);
                if let (None, Some(identifier)) =
                    (&translated.language, translated.say.identifier.as_deref())
                {
                    out.extend(self.other_translations(identifier, id));
                }
            }
            NodeKind::UserStatement(user) => match self.registry().get(&user.statement) {
                Ok(kind) => {
                    let info = ReachableInfo {
                        own_label: kind.label(&user.parsed).map(NodeName::Label),
                        next: node.next.map(|next| self.node(next).name.clone()),
                        block: user
                            .code_block
                            .as_ref()
                            .and_then(|block| block.first())
                            .map(|first| self.node(*first).name.clone()),
                    };
                    match kind.reachable(&user.parsed, &info) {
                        Some(names) => out.extend(
                            names.iter().filter_map(|name| self.lookup_or_none(name)),
                        ),
                        None => {
                            out.extend(
                                user.code_block
                                    .iter()
                                    .chain(user.subblocks.iter())
                                    .filter_map(|block| block.first().copied()),
                            );
                            match kind.next(&user.parsed, info.block.as_ref()) {
                                Some(label) => out.extend(self.lookup_label(&label).ok()),
                                None => out.extend(node.next),
                            }
                            if let Some(label) = &info.own_label {
                                out.extend(self.lookup_or_none(label));
                            }
                        }
                    }
                }
                Err(_) => out.extend(node.next),
            },
            NodeKind::Menu { items, .. } => {
                out.extend(
                    items
                        .iter()
                        .filter_map(|item| item.block.as_ref().and_then(|block| block.first()))
                        .copied(),
                );
                out.extend(node.next);
            }
            _ => out.extend(node.next),
        }
        out
    }

    fn other_translations(&self, identifier: &str, canonical: NodeId) -> Vec<NodeId> {
        self.translator()
            .get_all_translates(identifier)
            .into_iter()
            .map(|(_, id)| id)
            .filter(|id| *id != canonical)
            .collect()
    }

    /// Breadth-first closure of `entries` under [`Script::get_reachable`].
    /// Entries come first in the result, then nodes in discovery order.
    /// A node already in `seen` is neither visited nor reported, which lets
    /// callers grow one reachable set over several calls. `validator` may
    /// veto individual edges.
    pub fn get_reachable_nodes(
        &self,
        entries: &[NodeId],
        mut validator: Option<&mut dyn FnMut(&Node, &Node) -> bool>,
        seen: Option<&mut FxHashSet<NodeId>>,
    ) -> Vec<NodeId> {
        let mut local = FxHashSet::default();
        let seen = seen.unwrap_or(&mut local);
        let mut out = Vec::new();
        let mut queue = VecDeque::new();

        for entry in entries {
            if seen.insert(*entry) {
                out.push(*entry);
                queue.push_back(*entry);
            }
        }

        while let Some(id) = queue.pop_front() {
            for successor in self.get_reachable(id) {
                if seen.contains(&successor) {
                    continue;
                }
                if let Some(validator) = validator.as_deref_mut() {
                    if !validator(self.node(id), self.node(successor)) {
                        continue;
                    }
                }
                seen.insert(successor);
                out.push(successor);
                queue.push_back(successor);
            }
        }
        out
    }

    /// Nodes no label, init block or translation entry point can reach.
    pub fn unreachable_nodes(&self) -> Vec<NodeId> {
        let mut entries = self.labels().map(|(_, id)| id).collect::<Vec<_>>();
        entries.extend(self.init_order().iter().copied());
        entries.extend(self.nodes().filter_map(|(id, node)| {
            matches!(
                node.kind,
                NodeKind::EarlyPython { .. }
                    | NodeKind::TranslateBlock { .. }
                    | NodeKind::TranslatePython { .. }
                    | NodeKind::TranslateString { .. }
            )
            .then_some(id)
        }));

        let mut seen = FxHashSet::default();
        self.get_reachable_nodes(&entries, None, Some(&mut seen));
        let unreachable = self
            .nodes()
            .map(|(id, _)| id)
            .filter(|id| !seen.contains(id))
            .collect::<Vec<_>>();
        tracing::debug!(unreachable = unreachable.len(), "reachability");
        unreachable
    }

    /// For every language, the canonical translation identifiers it does
    /// not translate.
    pub fn translation_coverage(&self) -> BTreeMap<String, Vec<String>> {
        let translator = self.translator();
        translator
            .languages()
            .iter()
            .map(|language| {
                let missing = translator
                    .identifiers()
                    .into_iter()
                    .filter(|identifier| !translator.has_translation(identifier, language))
                    .map(str::to_string)
                    .collect();
                (language.clone(), missing)
            })
            .collect()
    }
}

#[cfg(test)]
mod reachability_tests {
    use super::*;
    use crate::test_support::{script_from_json, script_with_kinds};
    use crate::statements::{StatementEnv, UserStatementKind};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use vn_core::{VnError, VnValue};

    fn names(script: &Script, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .map(|id| script.node(*id).name.to_string())
            .collect()
    }

    #[test]
    fn cycles_terminate_and_visit_each_node_once() {
        let script = script_from_json(
            r#"[
              {"kind": "label", "name": "start", "block": [
                {"kind": "while", "condition": "true", "block": [
                  {"kind": "say", "what": "again"},
                  {"kind": "jump", "target": "start"}
                ]},
                {"kind": "say", "what": "never"}
              ]}
            ]"#,
        );
        let start = script.lookup_label("start").expect("start");
        let reached = script.get_reachable_nodes(&[start], None, None);
        assert_eq!(
            names(&script, &reached),
            vec!["start", "(test.rpy, 1, 1)", "(test.rpy, 1, 2)", "(test.rpy, 1, 3)"]
        );
        let mut unique = reached.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), reached.len());
        assert_eq!(script.unreachable_nodes(), vec![NodeId(4)]);
    }

    #[test]
    fn if_stops_at_an_always_true_branch() {
        let script = script_from_json(
            r#"[
              {"kind": "if", "entries": [
                {"condition": "x", "block": [{"kind": "pass"}]},
                {"condition": "true", "block": [{"kind": "pass"}]},
                {"condition": "y", "block": [{"kind": "pass"}]}
              ]},
              {"kind": "pass"}
            ]"#,
        );
        assert_eq!(script.get_reachable(NodeId(0)), vec![NodeId(1), NodeId(2)]);
    }

    #[test]
    fn seen_set_and_validator_limit_the_walk() {
        let script = script_from_json(
            r#"[
              {"kind": "label", "name": "a", "block": [
                {"kind": "call", "label": "b"},
                {"kind": "return"}
              ]},
              {"kind": "label", "name": "b", "block": [{"kind": "return"}]}
            ]"#,
        );
        let a = script.lookup_label("a").expect("a");
        let b = script.lookup_label("b").expect("b");

        let mut seen = FxHashSet::default();
        let first = script.get_reachable_nodes(&[b], None, Some(&mut seen));
        assert_eq!(first.len(), 2);
        let second = script.get_reachable_nodes(&[a, b], None, Some(&mut seen));
        assert_eq!(names(&script, &second), vec!["a", "(test.rpy, 1, 1)", "(test.rpy, 1, 2)"]);

        let mut no_calls = |from: &Node, _to: &Node| !matches!(from.kind, NodeKind::Call { .. });
        let limited = script.get_reachable_nodes(&[a], Some(&mut no_calls), None);
        assert_eq!(limited.len(), 2);
    }

    struct Loop;

    impl UserStatementKind for Loop {
        fn execute(&self, _parsed: &VnValue, _env: &mut StatementEnv<'_>) -> Result<(), VnError> {
            Ok(())
        }

        fn next(&self, parsed: &VnValue, _block: Option<&NodeName>) -> Option<String> {
            parsed.as_string().map(str::to_string)
        }
    }

    #[test]
    fn user_statement_back_edges_terminate() {
        let script = script_with_kinds(
            r#"[
              {"kind": "label", "name": "top", "block": [
                {"kind": "say", "what": "hi"},
                {"kind": "user_statement", "line": "again top", "statement": "again", "parsed": "top"}
              ]}
            ]"#,
            vec![("again", Arc::new(Loop) as Arc<dyn UserStatementKind>)],
        );
        let top = script.lookup_label("top").expect("top");
        let user = NodeId(2);
        assert_eq!(script.get_reachable(user), vec![top]);
        let reached = script.get_reachable_nodes(&[top], None, None);
        assert_eq!(reached, vec![top, NodeId(1), user]);
    }

    #[test]
    fn coverage_lists_untranslated_identifiers() {
        let script = script_from_json(
            r#"[
              {"kind": "translate_say", "what": "a", "identifier": "one"},
              {"kind": "translate_say", "what": "b", "identifier": "two"},
              {"kind": "translate_say", "what": "A", "identifier": "one", "language": "fr"}
            ]"#,
        );
        let coverage = script.translation_coverage();
        assert_eq!(coverage.get("fr"), Some(&vec!["two".to_string()]));
        assert_eq!(
            script.get_reachable(NodeId(0)),
            vec![NodeId(1), NodeId(2)]
        );
    }
}
