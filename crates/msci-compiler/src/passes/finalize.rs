use msci_core::{CompilerFault, Conditional, ReturnValue, UNRESOLVED_DESTINATION};
use msci_parser::command_ids;

use super::{PassContext, Visitor};
use crate::tree::{CommandTree, JumpTarget, NodeId};

/// Turns structural targets into command indices and packs return values.
pub(super) struct LinkageFinalizer;

impl LinkageFinalizer {
    fn destination(
        &self,
        tree: &CommandTree,
        id: NodeId,
        context: &PassContext<'_>,
    ) -> Result<u16, CompilerFault> {
        let node = tree.node(id);
        if node.has_error {
            return Ok(UNRESOLVED_DESTINATION);
        }
        let resolved = match node.target {
            Some(JumpTarget::Node(target)) => tree.node(target).index,
            Some(JumpTarget::EndOfScript) => u16::try_from(context.standard_count).ok(),
            None => None,
        };
        match resolved {
            Some(destination) => Ok(destination),
            None if !context.errors.is_empty() => Ok(UNRESOLVED_DESTINATION),
            None => Err(CompilerFault::new(format!(
                "line {} was linked without a destination",
                node.line()
            ))),
        }
    }
}

impl Visitor for LinkageFinalizer {
    fn visit(
        &mut self,
        tree: &mut CommandTree,
        id: NodeId,
        context: &mut PassContext<'_>,
    ) -> Result<(), CompilerFault> {
        let node = tree.node(id);
        if !node.is_live() {
            return Ok(());
        }

        if node.is(command_ids::DEFINE_LABEL) {
            let label = node
                .command
                .parameters
                .first()
                .and_then(|parameter| parameter.label())
                .map(str::to_string);
            if let (Some(label), Some(index)) = (label, node.index) {
                if context.labels.get(&label) == Some(&id) {
                    if let Some(symbol) = context.symbols.label_mut(&label) {
                        symbol.id = index;
                    }
                }
            }
            return Ok(());
        }

        if node.command.return_slot().is_some() {
            let conditional = node.command.conditional;
            let value = match conditional {
                Conditional::None => {
                    let variable = node
                        .command
                        .assigned_variable()
                        .and_then(|token| context.symbols.variable(&token.value_text))
                        .map(|symbol| symbol.id);
                    match variable {
                        Some(variable_id) => ReturnValue::assignment(variable_id),
                        None if node.has_error || !context.errors.is_empty() => {
                            ReturnValue::assignment(UNRESOLVED_DESTINATION)
                        }
                        None => {
                            return Err(CompilerFault::new(format!(
                                "assignment on line {} has no variable id",
                                node.line()
                            )))
                        }
                    }
                }
                conditional if conditional.is_jump() => {
                    ReturnValue::new(conditional, self.destination(tree, id, context)?)
                }
                conditional => ReturnValue::new(conditional, 0),
            };
            tree.node_mut(id).return_value = Some(value);
            return Ok(());
        }

        if matches!(
            node.syntax_id(),
            command_ids::HIDDEN_JUMP
                | command_ids::BREAK
                | command_ids::CONTINUE
                | command_ids::GOTO_LABEL
                | command_ids::GOSUB
        ) {
            let destination = self.destination(tree, id, context)?;
            tree.node_mut(id).jump_destination = Some(destination);
        }
        Ok(())
    }
}
