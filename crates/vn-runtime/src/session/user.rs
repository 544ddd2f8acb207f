use super::*;
use crate::node::UserStatementNode;
use crate::statements::StatementEnv;

impl Session {
    pub(super) fn execute_user(
        &mut self,
        node: &Node,
        user: &UserStatementNode,
    ) -> Result<(), VnError> {
        self.context.next_node = node.next;
        let script = Arc::clone(&self.script);
        let kind = script.registry().get(&user.statement)?;

        let name = kind.name(&user.parsed).unwrap_or_else(|| user.statement.clone());
        self.statement_name(&name);

        let block = user
            .code_block
            .as_ref()
            .and_then(|block| block.first())
            .map(|first| script.node(*first).name.clone());
        if let Some(target) = kind.next(&user.parsed, block.as_ref()) {
            self.context.next_node = Some(script.lookup_label(&target)?);
        }

        let mut env = StatementEnv {
            stores: &mut self.stores,
            evaluator: self.evaluator.as_ref(),
            interface: self.interface.as_mut(),
            location: &node.location,
        };
        kind.execute(&user.parsed, &mut env)
    }

    pub(super) fn execute_post_user(&mut self, node: &Node, parent: NodeId) -> Result<(), VnError> {
        self.context.next_node = node.next;
        let script = Arc::clone(&self.script);
        let NodeKind::UserStatement(user) = &script.node(parent).kind else {
            return Ok(());
        };
        let kind = script.registry().get(&user.statement)?;
        self.statement_name(&format!("{} (post)", user.statement));

        let mut env = StatementEnv {
            stores: &mut self.stores,
            evaluator: self.evaluator.as_ref(),
            interface: self.interface.as_mut(),
            location: &node.location,
        };
        kind.post_execute(&user.parsed, &mut env)
    }

    pub(super) fn execute_user_init(
        &mut self,
        id: NodeId,
        user: &UserStatementNode,
    ) -> Result<(), VnError> {
        let script = Arc::clone(&self.script);
        let node = script.node(id);
        let kind = script.registry().get(&user.statement)?;
        if kind.has_execute_default() {
            self.default_statements.push(id);
        }

        let mut env = StatementEnv {
            stores: &mut self.stores,
            evaluator: self.evaluator.as_ref(),
            interface: self.interface.as_mut(),
            location: &node.location,
        };
        kind.execute_init(&user.parsed, &mut env)
    }
}
