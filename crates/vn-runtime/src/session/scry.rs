use super::*;
use crate::node::SayNode;
use crate::params::evaluate_arguments;
use crate::scry::{ExtendText, Scry};

impl Session {
    /// Cheap look at `id`. Never fails; whatever cannot be determined
    /// without side effects is left unknown.
    pub fn scry(&self, id: NodeId) -> Scry {
        let script = &self.script;
        let node = script.node(id);
        match &node.kind {
            NodeKind::Say(say) => self.scry_say(say, node.next),
            NodeKind::TranslateSay(translated) => {
                if translated.language.is_none() {
                    if let Some(identifier) = translated.say.identifier.as_deref() {
                        match self.lookup_translate(identifier, translated.alternate.as_deref()) {
                            Ok(entry) if entry != id => return self.scry(entry),
                            Ok(_) => {}
                            Err(_) => return Scry::default(),
                        }
                    }
                }
                self.scry_say(&translated.say, node.next)
            }
            NodeKind::Call { .. }
            | NodeKind::Return { .. }
            | NodeKind::While { .. }
            | NodeKind::If { .. } => Scry::default(),
            NodeKind::Jump {
                target,
                expression: false,
                global_label,
            } => {
                let label = super::control_flow::qualify_label(target.clone(), global_label);
                Scry::after(script.lookup_label(&label).ok())
            }
            NodeKind::Jump { .. } => Scry::default(),
            NodeKind::Menu { has_caption, .. } => Scry {
                interacts: Some(true),
                menu_with_caption: Some(*has_caption),
                ..Scry::after(node.next)
            },
            NodeKind::Translate {
                identifier,
                language: None,
                alternate,
                ..
            } => Scry::after(
                self.lookup_translate(identifier, alternate.as_deref())
                    .ok()
                    .and_then(|entry| script.translate_target(entry)),
            ),
            NodeKind::UserStatement(user) => {
                let Ok(kind) = script.registry().get(&user.statement) else {
                    return Scry::default();
                };
                let block = user
                    .code_block
                    .as_ref()
                    .and_then(|block| block.first())
                    .map(|first| script.node(*first).name.clone());
                let next = match kind.next(&user.parsed, block.as_ref()) {
                    Some(label) => script.lookup_label(&label).ok(),
                    None => node.next,
                };
                let mut scry = Scry::after(next);
                kind.scry(&user.parsed, &mut scry);
                scry
            }
            _ => Scry::after(node.next),
        }
    }

    /// Scry of the statement about to run.
    pub fn scry_next(&self) -> Option<Scry> {
        self.context.current.map(|id| self.scry(id))
    }

    fn scry_say(&self, say: &SayNode, next: Option<NodeId>) -> Scry {
        let who = match say.who.as_deref() {
            Some(who) if say.who_fast => self.stores.get(DEFAULT_STORE, who).ok(),
            Some(who) if super::control_flow::probably_side_effect_free(who) => {
                self.speculate(who)
            }
            _ => None,
        };
        let multiple = say.arguments.as_ref().and_then(|info| {
            let mut scratch = self.stores.clone();
            evaluate_arguments(info, self.evaluator.as_ref(), &mut scratch)
                .ok()
                .and_then(|arguments| match arguments.kwargs.get("multiple") {
                    Some(VnValue::Number(count)) => Some(*count as i64),
                    _ => None,
                })
        });

        let mut scry = Scry {
            interacts: Some(say.interact),
            say: Some(true),
            who: who.clone(),
            extend_text: Some(ExtendText::DoesNotExtend),
            multiple,
            ..Scry::after(next)
        };
        self.interface.scry_say(who.as_ref(), &mut scry);
        scry
    }
}
