use msci_core::{CompilerFault, UNRESOLVED_DESTINATION};

use super::{PassContext, Visitor};
use crate::tree::{CommandTree, NodeId};

/// Highest index a standard command may take; `0xFFFF` marks unresolved
/// jumps.
const MAX_INDEX: usize = UNRESOLVED_DESTINATION as usize - 1;

/// Numbers standard commands in execution order.
#[derive(Default)]
pub(super) struct NodeIndexer {
    next: usize,
    overflowed: bool,
}

impl Visitor for NodeIndexer {
    fn visit(
        &mut self,
        tree: &mut CommandTree,
        id: NodeId,
        context: &mut PassContext<'_>,
    ) -> Result<(), CompilerFault> {
        if !tree.node(id).is_live() {
            return Ok(());
        }
        match u16::try_from(self.next) {
            Ok(index) if self.next <= MAX_INDEX => {
                tree.node_mut(id).index = Some(index);
                self.next += 1;
            }
            _ => {
                if !self.overflowed {
                    self.overflowed = true;
                    context.report(
                        tree,
                        id,
                        "SCRIPT_TOO_LONG",
                        format!("Scripts are limited to {} commands.", MAX_INDEX + 1),
                    );
                }
            }
        }
        Ok(())
    }

    fn finish(
        &mut self,
        _tree: &mut CommandTree,
        context: &mut PassContext<'_>,
    ) -> Result<(), CompilerFault> {
        context.standard_count = self.next;
        Ok(())
    }
}
