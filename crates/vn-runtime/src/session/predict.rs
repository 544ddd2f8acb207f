use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use super::control_flow::{probably_side_effect_free, qualify_label};
use super::*;
use crate::interface::{PredictedAsset, PredictionCache};
use crate::node::SayNode;

impl Session {
    /// Likely successors of `id`, most likely first. Runs against scratch
    /// copies of the stores and never fails; anything that cannot be
    /// worked out is left out.
    pub fn predict(&self, id: NodeId, cache: &mut PredictionCache) -> Vec<NodeId> {
        let script = &self.script;
        let node = script.node(id);
        let next = node.next.into_iter().collect::<Vec<_>>();

        match &node.kind {
            NodeKind::Say(say) => {
                self.predict_say(say, cache);
                next
            }
            NodeKind::TranslateSay(translated) => {
                if translated.language.is_none() {
                    if let Some(identifier) = translated.say.identifier.as_deref() {
                        match self.lookup_translate(identifier, translated.alternate.as_deref()) {
                            Ok(entry) if entry != id => return vec![entry],
                            Ok(_) => {}
                            Err(_) => return Vec::new(),
                        }
                    }
                }
                self.predict_say(&translated.say, cache);
                next
            }
            NodeKind::Call {
                label,
                expression,
                global_label,
                ..
            } => self
                .predict_target(label, *expression, global_label)
                .into_iter()
                .collect(),
            NodeKind::Jump {
                target,
                expression,
                global_label,
            } => self
                .predict_target(target, *expression, global_label)
                .into_iter()
                .collect(),
            NodeKind::Return { .. } => self
                .context
                .predict_return()
                .and_then(|site| script.lookup_or_none(site))
                .into_iter()
                .collect(),
            NodeKind::While { block, .. } => {
                let mut out = vec![block.first().copied().unwrap_or(id)];
                out.extend(next);
                out
            }
            NodeKind::If { entries } => {
                let mut out = entries
                    .iter()
                    .filter_map(|entry| entry.block.first().copied())
                    .collect::<Vec<_>>();
                out.extend(next);
                out
            }
            NodeKind::Menu { items, .. } => {
                let language = self.config.language.as_deref();
                cache.push(PredictedAsset::Menu {
                    captions: items
                        .iter()
                        .map(|item| self.strings.translate(language, &item.label).to_string())
                        .collect(),
                });
                let mut out = items
                    .iter()
                    .filter_map(|item| item.block.as_ref().and_then(|block| block.first()))
                    .copied()
                    .collect::<Vec<_>>();
                out.extend(next);
                out
            }
            NodeKind::Translate {
                identifier,
                language: None,
                alternate,
                ..
            } => self
                .lookup_translate(identifier, alternate.as_deref())
                .ok()
                .and_then(|entry| script.translate_target(entry))
                .into_iter()
                .collect(),
            NodeKind::UserStatement(user) => {
                let Ok(kind) = script.registry().get(&user.statement) else {
                    return next;
                };
                for asset in kind.predict(&user.parsed) {
                    cache.push(PredictedAsset::Custom(asset));
                }
                let next_name = self.node_name(node.next);
                let mut out = match kind.predict_next(&user.parsed, next_name.as_ref()) {
                    Some(names) => names
                        .iter()
                        .filter_map(|name| script.lookup_or_none(name))
                        .collect(),
                    None => next,
                };
                if kind.predict_all() {
                    out.extend(
                        user.code_block
                            .iter()
                            .chain(user.subblocks.iter())
                            .filter_map(|block| block.first().copied()),
                    );
                }
                out
            }
            NodeKind::Show { .. }
            | NodeKind::Scene { .. }
            | NodeKind::Hide { .. }
            | NodeKind::With { .. } => {
                self.predict_display(&node.kind, cache);
                next
            }
            _ => next,
        }
    }

    fn predict_say(&self, say: &SayNode, cache: &mut PredictionCache) {
        let who = match say.who.as_deref() {
            Some(who) if say.who_fast => self.stores.get(DEFAULT_STORE, who).ok(),
            Some(who) if probably_side_effect_free(who) => self.speculate(who),
            _ => None,
        };
        cache.push(PredictedAsset::Say {
            who,
            what: say.what.clone(),
        });
    }

    fn predict_target(&self, target: &str, expression: bool, global_label: &str) -> Option<NodeId> {
        let label = if expression {
            if !probably_side_effect_free(target) {
                return None;
            }
            match self.speculate(target)? {
                VnValue::String(label) => label,
                _ => return None,
            }
        } else {
            target.to_string()
        };
        let label = qualify_label(label, global_label);
        if !self.script.has_label(&label) {
            return None;
        }
        self.script.lookup_label(&label).ok()
    }

    /// Walks predicted successors breadth-first from the current node,
    /// visiting at most `limit` nodes.
    pub fn predict_ahead(&self, limit: usize) -> PredictionCache {
        let mut cache = PredictionCache::default();
        let Some(start) = self.context.current else {
            return cache;
        };
        let mut seen = FxHashSet::default();
        let mut queue = VecDeque::from([start]);
        seen.insert(start);
        while let Some(id) = queue.pop_front() {
            if cache.nodes.len() >= limit {
                break;
            }
            cache.nodes.push(id);
            for successor in self.predict(id, &mut cache) {
                if seen.insert(successor) {
                    queue.push_back(successor);
                }
            }
        }
        tracing::trace!(nodes = cache.nodes.len(), assets = cache.assets.len(), "predicted");
        cache
    }
}
