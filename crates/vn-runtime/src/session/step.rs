use super::*;

impl Session {
    /// Executes the current statement and moves to the one it selected.
    /// Returns `false` once there is nothing left to run.
    pub fn step(&mut self) -> Result<bool, VnError> {
        let Some(id) = self.context.current else {
            return Ok(false);
        };
        let script = Arc::clone(&self.script);
        let node = script.node(id);

        self.context.begin_statement();
        self.steps_since_interaction += 1;
        if self.steps_since_interaction > self.config.loop_guard {
            self.steps_since_interaction = 0;
            return Err(VnError::structural(
                "LOOP_GUARD",
                format!(
                    "Possible infinite loop: {} statements ran without an interaction.",
                    self.config.loop_guard
                ),
            )
            .at(&node.location, node.kind.statement_name()));
        }

        tracing::trace!(node = %node.name, kind = node.kind.statement_name(), "execute");
        match self.execute(id) {
            Ok(()) => {
                self.context.current = self.context.next_node.take();
                Ok(true)
            }
            Err(error) => {
                let error = error.at(&node.location, node.kind.statement_name());
                if self.config.error_policy == ErrorPolicy::Ignore && error.kind.is_recoverable() {
                    tracing::warn!(error = %error.describe(), "statement error ignored");
                    self.skip_current();
                    return Ok(true);
                }
                Err(error)
            }
        }
    }

    fn execute(&mut self, id: NodeId) -> Result<(), VnError> {
        let script = Arc::clone(&self.script);
        let node = script.node(id);
        match &node.kind {
            NodeKind::Say(say) => {
                self.context.next_node = node.next;
                self.statement_name("say");
                self.execute_say(say)
            }
            NodeKind::TranslateSay(translated) => self.execute_translate_say(id, node, translated),
            NodeKind::Python { code, store, hide } => {
                self.execute_python(node, code, store, *hide)
            }
            NodeKind::EarlyPython { .. } => {
                self.context.next_node = node.next;
                self.statement_name("python early");
                Ok(())
            }
            NodeKind::Init { .. } => {
                self.context.next_node = node.next;
                self.statement_name("init");
                Ok(())
            }
            NodeKind::Label {
                name, parameters, ..
            } => self.execute_label(node, name, parameters.as_ref()),
            NodeKind::Image { name, expr } => self.execute_image(node, name, expr),
            NodeKind::Show { imspec } => {
                self.context.next_node = node.next;
                self.statement_name("show");
                self.show_imspec(imspec)
            }
            NodeKind::Scene { imspec, layer } => self.execute_scene(node, imspec.as_ref(), layer),
            NodeKind::Hide { imspec } => self.execute_hide(node, imspec),
            NodeKind::ShowLayer { layer, at_list } => {
                self.execute_layer_at_list(node, layer, at_list, false)
            }
            NodeKind::Camera { layer, at_list } => {
                self.execute_layer_at_list(node, layer, at_list, true)
            }
            NodeKind::With { expr, paired } => self.execute_with(node, expr, paired.as_deref()),
            NodeKind::Call {
                label,
                expression,
                arguments,
                global_label,
            } => self.execute_call(node, label, *expression, arguments.as_ref(), global_label),
            NodeKind::Return { expression } => self.execute_return(expression.as_deref()),
            NodeKind::Jump {
                target,
                expression,
                global_label,
            } => self.execute_jump(target, *expression, global_label),
            NodeKind::Pass => {
                self.context.next_node = node.next;
                self.statement_name("pass");
                Ok(())
            }
            NodeKind::While { condition, block } => {
                self.execute_while(id, node, condition, block)
            }
            NodeKind::If { entries } => self.execute_if(node, entries),
            NodeKind::Menu {
                items,
                set,
                with_,
                has_caption,
                arguments,
            } => self.execute_menu(
                node,
                items,
                set.as_deref(),
                with_.as_deref(),
                *has_caption,
                arguments.as_ref(),
            ),
            NodeKind::UserStatement(user) => self.execute_user(node, user),
            NodeKind::PostUserStatement { parent } => self.execute_post_user(node, *parent),
            NodeKind::Define { .. } => self.execute_define(id),
            NodeKind::Default { .. } => self.execute_default_node(id),
            NodeKind::Translate {
                identifier,
                language,
                alternate,
                ..
            } => self.execute_translate(
                node,
                identifier,
                language.as_deref(),
                alternate.as_deref(),
            ),
            NodeKind::EndTranslate => {
                self.context.next_node = node.next;
                self.statement_name("end translate");
                self.end_translate();
                Ok(())
            }
            NodeKind::TranslateString { language, old, new } => {
                self.context.next_node = node.next;
                self.statement_name("translate string");
                self.strings.add(language, old, new);
                Ok(())
            }
            NodeKind::TranslatePython { .. } => {
                self.context.next_node = node.next;
                self.statement_name("translate python");
                Ok(())
            }
            NodeKind::TranslateBlock { .. } => {
                self.context.next_node = node.next;
                self.statement_name("translate block");
                Ok(())
            }
        }
    }
}
