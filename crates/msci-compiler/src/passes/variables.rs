use msci_core::{CommandOrigin, CompilerFault, SymbolKind};
use msci_parser::{command_ids, TokenType};

use super::{PassContext, Visitor};
use crate::tree::{CommandTree, NodeId};
use crate::INTERNAL_RESERVED_NAME_PREFIX;

/// Assigns variable IDs (arguments first) and collects label definitions.
#[derive(Default)]
pub(super) struct VariableIdentifier {
    label_references: Vec<(NodeId, String)>,
}

impl Visitor for VariableIdentifier {
    fn visit_root(
        &mut self,
        _tree: &mut CommandTree,
        context: &mut PassContext<'_>,
    ) -> Result<(), CompilerFault> {
        for argument in context.arguments {
            let name = argument.trim_start_matches('$');
            context.symbols.declare_variable(name, SymbolKind::Argument);
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
        if node.command.commented || !node.command.is_recognised() {
            return Ok(());
        }
        let user_written = matches!(node.origin, CommandOrigin::Source | CommandOrigin::MacroHeader);

        let mut reserved = None;
        let mut exhausted = false;
        for token in node
            .command
            .parameters
            .iter()
            .flat_map(|parameter| parameter.tokens.iter())
            .filter(|token| token.token_type == TokenType::Variable)
        {
            if user_written
                && reserved.is_none()
                && token.value_text.starts_with(INTERNAL_RESERVED_NAME_PREFIX)
            {
                reserved = Some(token.text.clone());
            }
            if context
                .symbols
                .declare_variable(&token.value_text, SymbolKind::Variable)
                .is_none()
            {
                exhausted = true;
            }
        }

        let label = node
            .command
            .parameters
            .first()
            .and_then(|parameter| parameter.label())
            .map(str::to_string);
        let syntax_id = node.syntax_id();

        if let Some(name) = reserved {
            context.report(
                tree,
                id,
                "VARIABLE_NAME_RESERVED",
                format!(
                    "Variable \"{}\" uses the reserved prefix \"{}\".",
                    name, INTERNAL_RESERVED_NAME_PREFIX
                ),
            );
        }
        if exhausted {
            context.report(
                tree,
                id,
                "VARIABLE_LIMIT_EXCEEDED",
                "Script uses more variables than the engine can address.",
            );
        }

        let Some(label) = label else {
            return Ok(());
        };
        match syntax_id {
            command_ids::DEFINE_LABEL => {
                if context.symbols.declare_label(&label) {
                    context.labels.insert(label, id);
                } else {
                    context.report(
                        tree,
                        id,
                        "LABEL_DUPLICATE",
                        format!("Label \"{}\" is already defined.", label),
                    );
                }
            }
            command_ids::GOTO_LABEL | command_ids::GOSUB => {
                self.label_references.push((id, label));
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(
        &mut self,
        tree: &mut CommandTree,
        context: &mut PassContext<'_>,
    ) -> Result<(), CompilerFault> {
        for (id, label) in std::mem::take(&mut self.label_references) {
            if !context.labels.contains_key(&label) {
                context.report(
                    tree,
                    id,
                    "LABEL_UNDEFINED",
                    format!("Label \"{}\" is not defined.", label),
                );
            }
        }
        Ok(())
    }
}
