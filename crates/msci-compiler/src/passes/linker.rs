use msci_core::{BranchLogic, CompilerFault};
use msci_parser::command_ids;

use super::{PassContext, Visitor};
use crate::traversal::preorder;
use crate::tree::{CommandTree, JumpTarget, NodeId};

/// Resolves the structural target of every branching command.
#[derive(Default)]
pub(super) struct NodeLinker {
    order: Vec<NodeId>,
    /// Pre-order position of each node, indexed by node id.
    positions: Vec<usize>,
}

impl NodeLinker {
    fn first_standard_from(&self, tree: &CommandTree, position: usize) -> JumpTarget {
        self.order
            .iter()
            .skip(position)
            .find(|id| tree.node(**id).index.is_some())
            .map_or(JumpTarget::EndOfScript, |id| JumpTarget::Node(*id))
    }

    fn position(&self, id: NodeId) -> usize {
        self.positions.get(id.index()).copied().unwrap_or(usize::MAX)
    }

    /// First standard command after everything nested under `id`.
    fn after_subtree(&self, tree: &CommandTree, id: NodeId) -> JumpTarget {
        let mut last = id;
        while let Some(child) = tree.last_child(last) {
            last = child;
        }
        self.first_standard_from(tree, self.position(last).saturating_add(1))
    }

    /// Last block of the if/else-if/else chain containing `id`, when the
    /// chain is closed by `end`.
    fn chain_end(&self, tree: &CommandTree, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        loop {
            if tree.is_closed_by_end(current) {
                return Some(current);
            }
            let next = tree.next_sibling(current)?;
            let continues = tree.node(current).logic().is_conditional_branch()
                && matches!(
                    tree.node(next).logic(),
                    BranchLogic::Else | BranchLogic::ElseIf
                );
            if !continues {
                return None;
            }
            current = next;
        }
    }

    fn enclosing_loop(&self, tree: &CommandTree, id: NodeId) -> Option<NodeId> {
        tree.ancestors(id)
            .find(|ancestor| tree.node(*ancestor).logic() == BranchLogic::While)
    }

    /// `None` when a jump target is required but cannot be found;
    /// `Some(None)` for commands that do not jump.
    fn resolve(
        &self,
        tree: &CommandTree,
        id: NodeId,
        context: &PassContext<'_>,
    ) -> Option<Option<JumpTarget>> {
        let node = tree.node(id);
        let target = match node.syntax_id() {
            command_ids::HIDDEN_JUMP => {
                let parent = tree.parent(id)?;
                match tree.node(parent).logic() {
                    BranchLogic::While => Some(JumpTarget::Node(parent)),
                    logic if logic.is_conditional_branch() => self
                        .chain_end(tree, parent)
                        .map(|last| self.after_subtree(tree, last)),
                    _ => None,
                }
            }
            command_ids::GOTO_LABEL | command_ids::GOSUB => {
                let label = node.command.parameters.first()?.label()?;
                context.labels.get(label).map(|definition| JumpTarget::Node(*definition))
            }
            _ => match node.logic() {
                BranchLogic::If | BranchLogic::ElseIf => {
                    if tree.is_closed_by_end(id) {
                        Some(self.after_subtree(tree, id))
                    } else {
                        tree.next_sibling(id).and_then(|closer| match tree.node(closer).logic() {
                            BranchLogic::ElseIf => Some(JumpTarget::Node(closer)),
                            BranchLogic::Else => Some(
                                self.first_standard_from(tree, self.position(closer).saturating_add(1)),
                            ),
                            _ => None,
                        })
                    }
                }
                BranchLogic::While | BranchLogic::SkipIf => Some(self.after_subtree(tree, id)),
                BranchLogic::Break => self
                    .enclosing_loop(tree, id)
                    .map(|head| self.after_subtree(tree, head)),
                BranchLogic::Continue => self.enclosing_loop(tree, id).map(JumpTarget::Node),
                _ => return Some(None),
            },
        };
        target.map(Some)
    }
}

impl Visitor for NodeLinker {
    fn visit_root(
        &mut self,
        tree: &mut CommandTree,
        _context: &mut PassContext<'_>,
    ) -> Result<(), CompilerFault> {
        self.order = preorder(tree);
        self.positions = vec![usize::MAX; tree.len()];
        for (position, id) in self.order.iter().enumerate() {
            self.positions[id.index()] = position;
        }
        Ok(())
    }

    fn visit(
        &mut self,
        tree: &mut CommandTree,
        id: NodeId,
        context: &mut PassContext<'_>,
    ) -> Result<(), CompilerFault> {
        let node = tree.node(id);
        if node.has_error || !node.is_live() {
            return Ok(());
        }
        match self.resolve(tree, id, context) {
            Some(None) => Ok(()),
            Some(Some(target)) => {
                tree.node_mut(id).target = Some(target);
                Ok(())
            }
            None if context.errors.is_empty() => Err(CompilerFault::new(format!(
                "no jump target for line {}",
                tree.node(id).line()
            ))),
            None => {
                // Broken structure elsewhere in the script was already reported.
                tree.node_mut(id).has_error = true;
                Ok(())
            }
        }
    }
}
