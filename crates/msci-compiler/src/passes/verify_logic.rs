use msci_core::{BranchLogic, CommandOrigin, CompilerFault};

use super::{PassContext, Visitor};
use crate::tree::{CommandTree, NodeId};

/// Checks that branch keywords pair up and that loop-only commands sit in
/// loops.
pub(super) struct LogicVerifier;

impl Visitor for LogicVerifier {
    fn visit(
        &mut self,
        tree: &mut CommandTree,
        id: NodeId,
        context: &mut PassContext<'_>,
    ) -> Result<(), CompilerFault> {
        let node = tree.node(id);
        if node.command.commented {
            return Ok(());
        }
        let logic = node.logic();
        let Some((code, message)) = check(tree, id, logic) else {
            return Ok(());
        };
        context.report(tree, id, code, message);
        Ok(())
    }
}

fn check(tree: &CommandTree, id: NodeId, logic: BranchLogic) -> Option<(&'static str, String)> {
    match logic {
        BranchLogic::Else | BranchLogic::ElseIf => {
            let matched = tree.previous_sibling(id).is_some_and(|previous| {
                tree.node(previous).logic().is_conditional_branch()
                    && !tree.is_closed_by_end(previous)
            });
            if matched {
                return unclosed(tree, id, logic);
            }
            Some(if logic == BranchLogic::Else {
                ("LOGIC_ELSE_UNMATCHED", "'else' has no matching 'if'.".to_string())
            } else {
                (
                    "LOGIC_ELSE_IF_UNMATCHED",
                    "'else if' has no matching 'if'.".to_string(),
                )
            })
        }
        BranchLogic::End => {
            let matched = tree.parent(id).is_some_and(|parent| {
                parent != tree.root()
                    && tree.node(parent).logic().opens_block()
                    && tree.last_child(parent) == Some(id)
            });
            (!matched).then(|| {
                (
                    "LOGIC_END_UNMATCHED",
                    "'end' has no matching 'if' or 'while'.".to_string(),
                )
            })
        }
        BranchLogic::If | BranchLogic::While => unclosed(tree, id, logic),
        BranchLogic::SkipIf => check_skip_target(tree, id),
        BranchLogic::Break | BranchLogic::Continue if !inside_loop(tree, id) => {
            Some(if logic == BranchLogic::Break {
                (
                    "LOGIC_BREAK_OUTSIDE_LOOP",
                    "'break' can only be used inside a loop.".to_string(),
                )
            } else {
                (
                    "LOGIC_CONTINUE_OUTSIDE_LOOP",
                    "'continue' can only be used inside a loop.".to_string(),
                )
            })
        }
        _ => None,
    }
}

fn unclosed(tree: &CommandTree, id: NodeId, logic: BranchLogic) -> Option<(&'static str, String)> {
    (!is_closed(tree, id, logic)).then(|| {
        (
            "LOGIC_BLOCK_UNCLOSED",
            format!("{} is never closed by 'end'.", describe(tree, id, logic)),
        )
    })
}

fn is_closed(tree: &CommandTree, id: NodeId, logic: BranchLogic) -> bool {
    if tree.is_closed_by_end(id) {
        return true;
    }
    logic.is_conditional_branch()
        && tree.next_sibling(id).is_some_and(|next| {
            matches!(
                tree.node(next).logic(),
                BranchLogic::Else | BranchLogic::ElseIf
            )
        })
}

fn describe(tree: &CommandTree, id: NodeId, logic: BranchLogic) -> String {
    let node = tree.node(id);
    if node.origin == CommandOrigin::Expanded {
        if let Some(header) = node.macro_header {
            return format!("'{}'", tree.node(header).command.text);
        }
    }
    match logic {
        BranchLogic::If => "'if'".to_string(),
        BranchLogic::ElseIf => "'else if'".to_string(),
        BranchLogic::Else => "'else'".to_string(),
        _ => "'while'".to_string(),
    }
}

fn check_skip_target(tree: &CommandTree, id: NodeId) -> Option<(&'static str, String)> {
    let skipped = tree
        .children(id)
        .iter()
        .copied()
        .filter(|child| tree.node(*child).is_live())
        .collect::<Vec<_>>();
    let branching = skipped.len() > 1
        || skipped.iter().any(|child| {
            let node = tree.node(*child);
            node.logic().opens_block() || node.origin == CommandOrigin::Expanded
        })
        || tree
            .children(id)
            .iter()
            .any(|child| tree.node(*child).origin == CommandOrigin::MacroHeader);

    if skipped.is_empty() && !branching {
        return Some((
            "LOGIC_SKIP_IF_EMPTY",
            "'skip if' must be followed by a command to skip.".to_string(),
        ));
    }
    branching.then(|| {
        (
            "LOGIC_SKIP_IF_BRANCH",
            "'skip if' cannot skip a block or macro.".to_string(),
        )
    })
}

fn inside_loop(tree: &CommandTree, id: NodeId) -> bool {
    tree.ancestors(id)
        .any(|ancestor| tree.node(ancestor).logic() == BranchLogic::While)
}
