use std::collections::VecDeque;

use msci_core::CompilerFault;

use crate::tree::{CommandTree, NodeId};

/// Successor generation for tree iteration.
pub trait Traversal {
    fn add_successors(&mut self, tree: &CommandTree, node: NodeId);
    fn next_successor(&mut self) -> Option<NodeId>;
    fn is_empty(&self) -> bool;
}

#[derive(Debug, Default)]
pub struct BreadthFirst {
    queue: VecDeque<NodeId>,
}

impl Traversal for BreadthFirst {
    fn add_successors(&mut self, tree: &CommandTree, node: NodeId) {
        self.queue.extend(tree.children(node).iter().copied());
    }

    fn next_successor(&mut self) -> Option<NodeId> {
        self.queue.pop_front()
    }

    fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Pre-order: a node, then each child subtree in order.
#[derive(Debug, Default)]
pub struct DepthFirst {
    stack: Vec<NodeId>,
}

impl Traversal for DepthFirst {
    fn add_successors(&mut self, tree: &CommandTree, node: NodeId) {
        self.stack.extend(tree.children(node).iter().rev().copied());
    }

    fn next_successor(&mut self) -> Option<NodeId> {
        self.stack.pop()
    }

    fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

/// Forward iterator over the subtree rooted at `start`, `start` included.
pub struct TreeIterator<'t, T: Traversal> {
    tree: &'t CommandTree,
    strategy: T,
    pending: Option<NodeId>,
}

impl<'t, T: Traversal> TreeIterator<'t, T> {
    pub fn new(tree: &'t CommandTree, start: NodeId, strategy: T) -> Self {
        Self {
            tree,
            strategy,
            pending: Some(start),
        }
    }

    pub fn has_next(&self) -> bool {
        self.pending.is_some() || !self.strategy.is_empty()
    }

    /// Advances, treating exhaustion as a fault in the caller.
    #[track_caller]
    pub fn expect_next(&mut self) -> Result<NodeId, CompilerFault> {
        match self.next() {
            Some(id) => Ok(id),
            None => Err(CompilerFault::new("tree iterator advanced past the last node")),
        }
    }
}

impl<T: Traversal> Iterator for TreeIterator<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = match self.pending.take() {
            Some(start) => start,
            None => self.strategy.next_successor()?,
        };
        self.strategy.add_successors(self.tree, current);
        Some(current)
    }
}

/// Visits every node of the subtree at `start` in `strategy` order.
pub fn walk<T: Traversal>(
    tree: &CommandTree,
    start: NodeId,
    strategy: T,
    mut visit: impl FnMut(NodeId),
) {
    for id in TreeIterator::new(tree, start, strategy) {
        visit(id);
    }
}

/// All nodes below the root in execution (pre-order) order.
pub fn preorder(tree: &CommandTree) -> Vec<NodeId> {
    TreeIterator::new(tree, tree.root(), DepthFirst::default())
        .skip(1)
        .collect()
}
