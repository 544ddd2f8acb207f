use super::*;

impl Session {
    /// Load-time passes: early execution of every node, then the init
    /// blocks by priority, then the configured language's translate blocks.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn boot(&mut self) -> Result<(), VnError> {
        self.early_execute_all()?;
        self.run_init()?;
        match self.config.language.clone() {
            Some(language) => self.change_language(Some(language)),
            None => Ok(()),
        }
    }

    pub fn early_execute_all(&mut self) -> Result<(), VnError> {
        let script = Arc::clone(&self.script);
        for (id, node) in script.nodes() {
            self.early_execute(id)
                .map_err(|error| error.at(&node.location, node.kind.statement_name()))?;
        }
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run_init(&mut self) -> Result<(), VnError> {
        let script = Arc::clone(&self.script);
        self.context.init_phase = true;
        let mut result = Ok(());
        for id in script.init_order() {
            let node = script.node(*id);
            tracing::debug!(node = %node.name, priority = ?node.get_init(), "init");
            if let Err(error) = self.execute_init(*id) {
                result = Err(error.at(&node.location, node.kind.statement_name()));
                break;
            }
        }
        self.context.init_phase = false;
        result
    }

    fn execute_init(&mut self, id: NodeId) -> Result<(), VnError> {
        let script = Arc::clone(&self.script);
        match &script.node(id).kind {
            NodeKind::Init { block, .. } => {
                self.interacted();
                match block.first() {
                    Some(first) => self.run_block(*first),
                    None => Ok(()),
                }
            }
            NodeKind::UserStatement(user) => self.execute_user_init(id, user),
            _ => Ok(()),
        }
    }

    /// Starts a playthrough at `label`. The label is entered as if called,
    /// so a top-level `return` ends the session.
    pub fn start(&mut self, label: &str) -> Result<(), VnError> {
        self.execute_default_statements(true)?;
        let target = self.script.lookup_label(label)?;
        self.context = ExecutionContext::default();
        self.context.call(None);
        self.context.current = Some(target);
        self.interacted();
        tracing::debug!(label, "session started");
        Ok(())
    }

    /// Runs statements until the script ends or a statement fails.
    pub fn run(&mut self) -> Result<(), VnError> {
        while self.step()? {}
        Ok(())
    }

    /// Runs a nested block to completion, then restores the current node.
    pub(crate) fn run_block(&mut self, first: NodeId) -> Result<(), VnError> {
        let saved = self.context.current.replace(first);
        let result = self.run();
        self.context.current = saved;
        result
    }

    /// Advances past the current statement without executing it, as the
    /// "ignore" choice of an error prompt does.
    pub fn skip_current(&mut self) {
        let Some(current) = self.context.current else {
            return;
        };
        self.context.current = self
            .context
            .next_node
            .take()
            .or(self.script.node(current).next);
    }
}
