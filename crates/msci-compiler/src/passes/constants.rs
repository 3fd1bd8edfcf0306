use msci_core::{CompilerFault, Conditional, SymbolKind};
use msci_parser::{command_ids, ParameterType};

use super::{PassContext, Visitor};
use crate::tree::{CommandTree, NodeId};

/// Marks variables written exactly once, by a top-level literal assignment.
pub(super) struct ConstantIdentifier;

impl Visitor for ConstantIdentifier {
    fn visit(
        &mut self,
        tree: &mut CommandTree,
        id: NodeId,
        context: &mut PassContext<'_>,
    ) -> Result<(), CompilerFault> {
        let node = tree.node(id);
        if !node.is_live() || !node.command.is_recognised() {
            return Ok(());
        }
        let assigned = node
            .command
            .assigned_variable()
            .map(|token| token.value_text.clone());
        let written = node
            .command
            .parameters
            .iter()
            .filter(|parameter| parameter.param_type == ParameterType::Var)
            .filter_map(|parameter| parameter.variable())
            .map(|token| token.value_text.clone());

        for name in assigned.into_iter().chain(written) {
            if let Some(symbol) = context.symbols.variable_mut(&name) {
                symbol.writes += 1;
                symbol.first_write.get_or_insert(id);
            }
        }
        Ok(())
    }

    fn finish(
        &mut self,
        tree: &mut CommandTree,
        context: &mut PassContext<'_>,
    ) -> Result<(), CompilerFault> {
        let root = tree.root();
        for symbol in context.symbols.variables_mut() {
            if symbol.kind != SymbolKind::Variable || symbol.writes != 1 {
                continue;
            }
            let Some(writer) = symbol.first_write else {
                continue;
            };
            let node = tree.node(writer);
            let literal_assignment = node.syntax_id() == command_ids::EXPRESSION
                && node.command.conditional == Conditional::None
                && node
                    .command
                    .parameters
                    .iter()
                    .find(|parameter| parameter.param_type == ParameterType::Expression)
                    .is_some_and(|expression| expression.is_literal());
            if literal_assignment && node.parent == Some(root) {
                symbol.kind = SymbolKind::Constant;
            }
        }
        Ok(())
    }
}
