use msci_core::{CompilerFault, ScriptCommand};

use super::{PassContext, Visitor};
use crate::traversal::preorder;
use crate::tree::{CommandTree, NodeId};

/// Emits the final command list, auxiliary commands included.
#[derive(Default)]
pub(super) struct CommandGenerator {
    /// Pre-order position of each node, indexed by node id.
    positions: Vec<usize>,
    /// Index of the first standard command at or after each position.
    next_standard: Vec<u16>,
}

impl CommandGenerator {
    fn reference_at(&self, id: NodeId) -> Option<u16> {
        let position = *self.positions.get(id.index())?;
        self.next_standard.get(position).copied()
    }
}

impl Visitor for CommandGenerator {
    fn visit_root(
        &mut self,
        tree: &mut CommandTree,
        context: &mut PassContext<'_>,
    ) -> Result<(), CompilerFault> {
        let order = preorder(tree);
        self.positions = vec![usize::MAX; tree.len()];
        for (position, id) in order.iter().enumerate() {
            self.positions[id.index()] = position;
        }

        let end = u16::try_from(context.standard_count).unwrap_or(u16::MAX);
        let mut next = end;
        self.next_standard = vec![end; order.len() + 1];
        for (position, id) in order.iter().enumerate().rev() {
            if let Some(index) = tree.node(*id).index {
                next = index;
            }
            self.next_standard[position] = next;
        }
        context.commands = Vec::with_capacity(order.len());
        Ok(())
    }

    fn visit(
        &mut self,
        tree: &mut CommandTree,
        id: NodeId,
        context: &mut PassContext<'_>,
    ) -> Result<(), CompilerFault> {
        let node = tree.node(id);
        let reference = if let Some(header) = node.macro_header {
            self.reference_at(header)
        } else if node.is_live() {
            None
        } else {
            self.reference_at(id)
        };

        context.commands.push(ScriptCommand {
            syntax_id: node.syntax_id(),
            line_number: node.line(),
            text: node.command.text.clone(),
            parameters: node.command.parameters.iter().map(|p| p.text()).collect(),
            postfix: node.postfix.iter().map(|token| token.text.clone()).collect(),
            branch_logic: node.command.branch_logic,
            command_type: node.command.command_type,
            origin: node.origin,
            commented: node.command.commented,
            index: node.index,
            reference,
            return_value: node.return_value,
            jump_destination: node.jump_destination,
        });
        Ok(())
    }

    fn finish(
        &mut self,
        _tree: &mut CommandTree,
        context: &mut PassContext<'_>,
    ) -> Result<(), CompilerFault> {
        tracing::trace!(commands = context.commands.len(), "commands generated");
        Ok(())
    }
}
