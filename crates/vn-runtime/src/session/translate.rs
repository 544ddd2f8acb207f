use super::*;
use crate::node::TranslateSayNode;

impl Session {
    pub(super) fn execute_translate(
        &mut self,
        node: &Node,
        identifier: &str,
        language: Option<&str>,
        alternate: Option<&str>,
    ) -> Result<(), VnError> {
        self.context.next_node = node.next;
        self.statement_name("translate");
        if language.is_some() {
            return Err(VnError::usage(
                "TRANSLATE_DIRECT",
                "Translation nodes cannot be run directly.",
            ));
        }

        let entry = self.lookup_translate(identifier, alternate)?;
        self.context.next_node = self.script.translate_target(entry);
        self.context.translate_identifier = Some(identifier.to_string());
        self.context.alternate = alternate.map(str::to_string);
        Ok(())
    }

    pub(super) fn execute_translate_say(
        &mut self,
        id: NodeId,
        node: &Node,
        translated: &TranslateSayNode,
    ) -> Result<(), VnError> {
        self.context.next_node = node.next;
        self.statement_name("say");
        let Some(identifier) = translated.say.identifier.as_deref() else {
            return self.execute_say(&translated.say);
        };
        self.context.translate_identifier = Some(identifier.to_string());
        self.context.alternate = translated.alternate.clone();

        if translated.language.is_none() {
            let entry = self.lookup_translate(identifier, translated.alternate.as_deref())?;
            if entry != id {
                self.context.next_node = Some(entry);
                return Ok(());
            }
        }

        let result = self.execute_say(&translated.say);
        self.mark_seen();
        result
    }

    pub(super) fn end_translate(&mut self) {
        self.mark_seen();
    }

    /// Records the active translation identifier as seen, then clears it.
    fn mark_seen(&mut self) {
        let Some(identifier) = self.context.translate_identifier.take() else {
            return;
        };
        self.context.alternate = None;
        if self
            .persistent
            .mark_translate_seen(&identifier, self.config.hash_seen)
        {
            self.counters.seen += 1;
            self.counters.new += 1;
        }
    }

    /// Entry node for `identifier` in the active language.
    pub fn lookup_translate(
        &self,
        identifier: &str,
        alternate: Option<&str>,
    ) -> Result<NodeId, VnError> {
        self.script
            .translator()
            .lookup(identifier, alternate, self.config.language.as_deref())
    }

    pub fn get_all_translates(&self, identifier: &str) -> Vec<(Option<String>, NodeId)> {
        self.script.translator().get_all_translates(identifier)
    }

    /// Switches the active language. Early translate blocks of the new
    /// language run first, then its translate blocks and translate python
    /// in script order.
    pub fn change_language(&mut self, language: Option<String>) -> Result<(), VnError> {
        tracing::debug!(language = ?language, "change language");
        self.config.language = language;
        let Some(language) = self.config.language.clone() else {
            return Ok(());
        };

        let script = Arc::clone(&self.script);
        let matching = |early: bool| {
            script
                .nodes()
                .filter(|(_, node)| match &node.kind {
                    NodeKind::TranslateBlock {
                        language: block_language,
                        early: block_early,
                        ..
                    } => *block_language == language && *block_early == early,
                    NodeKind::TranslatePython {
                        language: block_language,
                        ..
                    } => !early && *block_language == language,
                    _ => false,
                })
                .map(|(id, _)| id)
                .collect::<Vec<_>>()
        };
        let ordered = matching(true)
            .into_iter()
            .chain(matching(false))
            .collect::<Vec<_>>();

        for id in ordered {
            let node = script.node(id);
            let result = match &node.kind {
                NodeKind::TranslateBlock { block, .. } => match block.first() {
                    Some(first) => self.run_block(*first),
                    None => Ok(()),
                },
                NodeKind::TranslatePython { code, .. } => {
                    self.evaluator
                        .exec(code, DEFAULT_STORE, false, &mut self.stores)
                }
                _ => Ok(()),
            };
            result.map_err(|error| error.at(&node.location, node.kind.statement_name()))?;
        }
        Ok(())
    }
}
