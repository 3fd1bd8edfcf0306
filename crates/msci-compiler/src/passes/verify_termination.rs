use std::collections::BTreeSet;

use msci_core::CompilerFault;
use msci_parser::command_ids;

use super::{PassContext, Visitor};
use crate::traversal::{walk, DepthFirst};
use crate::tree::{CommandTree, NodeId};

/// Subroutines (labels called with `gosub`) must reach `endsub` or `return`
/// at top level before the next subroutine starts. The main body may simply
/// run off the end of the script.
pub(super) struct TerminationVerifier;

struct OpenSubroutine {
    label: NodeId,
    terminated: bool,
}

impl Visitor for TerminationVerifier {
    fn visit_root(
        &mut self,
        tree: &mut CommandTree,
        context: &mut PassContext<'_>,
    ) -> Result<(), CompilerFault> {
        let mut called = BTreeSet::new();
        walk(tree, tree.root(), DepthFirst::default(), |id| {
            let node = tree.node(id);
            if node.is(command_ids::GOSUB) {
                if let Some(label) = node.command.parameters.first().and_then(|p| p.label()) {
                    called.insert(label.to_string());
                }
            }
        });

        let mut current: Option<OpenSubroutine> = None;
        let mut unterminated = Vec::new();
        let mut stray_endsubs = Vec::new();

        for child in tree.children(tree.root()).to_vec() {
            let node = tree.node(child);
            if node.command.commented {
                continue;
            }
            if node.is(command_ids::DEFINE_LABEL) {
                let label = node
                    .command
                    .parameters
                    .first()
                    .and_then(|parameter| parameter.label())
                    .unwrap_or_default();
                if called.contains(label) {
                    if let Some(open) = current.take() {
                        if !open.terminated {
                            unterminated.push(open.label);
                        }
                    }
                    current = Some(OpenSubroutine {
                        label: child,
                        terminated: false,
                    });
                } else if let Some(open) = current.as_mut() {
                    // A jump target after `endsub` starts reachable code again.
                    open.terminated = false;
                }
                continue;
            }

            let terminal = node.is(command_ids::ENDSUB)
                || node.is(command_ids::RETURN)
                || node.is(command_ids::GOTO_LABEL);
            match current.as_mut() {
                Some(open) if terminal => open.terminated = true,
                Some(_) => {}
                None => collect_endsubs(tree, child, &mut stray_endsubs),
            }
        }
        if let Some(open) = current {
            if !open.terminated {
                unterminated.push(open.label);
            }
        }

        for label in unterminated {
            let name = tree
                .node(label)
                .command
                .parameters
                .first()
                .and_then(|parameter| parameter.label())
                .unwrap_or_default()
                .to_string();
            context.report(
                tree,
                label,
                "SUBROUTINE_UNTERMINATED",
                format!("Subroutine \"{}\" does not end with 'endsub' or 'return'.", name),
            );
        }
        for id in stray_endsubs {
            context.report(
                tree,
                id,
                "ENDSUB_OUTSIDE_SUBROUTINE",
                "'endsub' is not inside a subroutine.",
            );
        }
        Ok(())
    }

    fn visit(
        &mut self,
        _tree: &mut CommandTree,
        _id: NodeId,
        _context: &mut PassContext<'_>,
    ) -> Result<(), CompilerFault> {
        Ok(())
    }
}

fn collect_endsubs(tree: &CommandTree, start: NodeId, found: &mut Vec<NodeId>) {
    walk(tree, start, DepthFirst::default(), |id| {
        if tree.node(id).is(command_ids::ENDSUB) {
            found.push(id);
        }
    });
}
