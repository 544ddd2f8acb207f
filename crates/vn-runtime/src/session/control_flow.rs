use super::*;
use crate::node::IfBranch;
use crate::params::{apply_arguments, evaluate_arguments};
use vn_core::{ArgumentInfo, ParameterInfo};

impl Session {
    pub(super) fn execute_python(
        &mut self,
        node: &Node,
        code: &str,
        store: &str,
        hide: bool,
    ) -> Result<(), VnError> {
        self.context.next_node = node.next;
        self.statement_name("python");
        let result = self.evaluator.exec(code, store, hide, &mut self.stores);
        if !self.context.init_phase {
            for callback in &mut self.hooks.python_callbacks {
                callback();
            }
        }
        result
    }

    pub(super) fn execute_label(
        &mut self,
        node: &Node,
        name: &str,
        parameters: Option<&ParameterInfo>,
    ) -> Result<(), VnError> {
        self.context.next_node = node.next;
        self.statement_name("label");
        self.persistent.seen_labels.insert(name.to_string());

        let pending = self.context.pending_arguments.take();
        let values = apply_arguments(
            parameters,
            pending,
            self.evaluator.as_ref(),
            &mut self.stores,
        )?;
        for (parameter, value) in values {
            self.context.dynamic(&mut self.stores, &parameter, value);
        }

        let abnormal = self.context.last_abnormal;
        for callback in &mut self.hooks.label_callbacks {
            callback(name, abnormal);
        }
        Ok(())
    }

    /// Target label of a call or jump. Expression targets are evaluated; a
    /// leading `.` refers to a local label under `global_label`.
    pub(super) fn resolve_target(
        &mut self,
        target: &str,
        expression: bool,
        global_label: &str,
    ) -> Result<String, VnError> {
        let label = if expression {
            match self.evaluate(target)? {
                VnValue::String(label) => label,
                other => {
                    return Err(VnError::evaluation(
                        "TARGET_NOT_STRING",
                        format!(
                            "Target expression \"{}\" produced {}, not a label name.",
                            target,
                            other.type_name()
                        ),
                    ))
                }
            }
        } else {
            target.to_string()
        };
        Ok(qualify_label(label, global_label))
    }

    pub(super) fn execute_call(
        &mut self,
        node: &Node,
        label: &str,
        expression: bool,
        arguments: Option<&ArgumentInfo>,
        global_label: &str,
    ) -> Result<(), VnError> {
        self.statement_name("call");
        let label = self.resolve_target(label, expression, global_label)?;
        let target = self.script.lookup_label(&label)?;
        let pending = match arguments {
            Some(info) => Some(evaluate_arguments(
                info,
                self.evaluator.as_ref(),
                &mut self.stores,
            )?),
            None => None,
        };

        let return_site = self.node_name(node.next);
        tracing::debug!(label = %label, depth = self.context.call_depth() + 1, "call");
        self.context.call(return_site);
        self.context.next_node = Some(target);
        self.context.abnormal = true;
        self.context.pending_arguments = pending;
        Ok(())
    }

    pub(super) fn execute_return(&mut self, expression: Option<&str>) -> Result<(), VnError> {
        self.statement_name("return");
        let value = match expression {
            Some(expression) => self.evaluate(expression)?,
            None => VnValue::Null,
        };
        self.stores.set(DEFAULT_STORE, "_return", value);

        if self.context.init_phase && self.context.return_stack.is_empty() {
            if self.config.developer {
                return Err(VnError::structural(
                    "RETURN_IN_INIT",
                    "A return statement was executed during init without a matching call.",
                ));
            }
            return Ok(());
        }

        let frame = self.context.pop_return().ok_or_else(|| {
            VnError::structural(
                "RETURN_STACK_EMPTY",
                "A return statement was executed with an empty call stack.",
            )
        })?;
        ExecutionContext::restore_dynamic(frame.dynamic, &mut self.stores);
        self.context.abnormal = true;
        self.context.next_node = match frame.return_site {
            Some(site) => Some(self.script.lookup(&site)?),
            None => None,
        };
        tracing::debug!(depth = self.context.call_depth(), "return");
        Ok(())
    }

    pub(super) fn execute_jump(
        &mut self,
        target: &str,
        expression: bool,
        global_label: &str,
    ) -> Result<(), VnError> {
        self.statement_name("jump");
        let label = self.resolve_target(target, expression, global_label)?;
        let target = self.script.lookup_label(&label)?;
        self.context.next_node = Some(target);
        self.context.abnormal = true;
        Ok(())
    }

    pub(super) fn execute_while(
        &mut self,
        id: NodeId,
        node: &Node,
        condition: &str,
        block: &[NodeId],
    ) -> Result<(), VnError> {
        self.context.next_node = node.next;
        self.statement_name("while");
        if self.evaluate_truthy(condition)? {
            self.context.next_node = Some(block.first().copied().unwrap_or(id));
        }
        Ok(())
    }

    pub(super) fn execute_if(&mut self, node: &Node, entries: &[IfBranch]) -> Result<(), VnError> {
        self.context.next_node = node.next;
        self.statement_name("if");
        for entry in entries {
            if self.evaluate_truthy(&entry.condition)? {
                if let Some(first) = entry.block.first() {
                    self.context.next_node = Some(*first);
                }
                return Ok(());
            }
        }
        Ok(())
    }
}

pub(super) fn qualify_label(label: String, global_label: &str) -> String {
    if label.starts_with('.') && !global_label.is_empty() {
        format!("{}{}", global_label, label)
    } else {
        label
    }
}

/// Expressions without calls are assumed safe to evaluate speculatively.
pub(super) fn probably_side_effect_free(source: &str) -> bool {
    !source.contains('(')
}
