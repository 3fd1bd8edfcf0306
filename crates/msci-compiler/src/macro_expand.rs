use msci_core::{CommandOrigin, CommandType, CompilerFault};
use msci_parser::{command_ids, join_tokens, parse_line, ParsedCommand, TokenType};

use crate::passes::PassContext;
use crate::traversal::preorder;
use crate::tree::{CommandTree, NodeId};
use crate::INTERNAL_RESERVED_NAME_PREFIX;

const ITERATOR_PREFIX: &str = "msci_iterator";

/// Generated source for one macro.
struct Expansion {
    /// Runs once before the loop, or is the whole expansion for `dim`.
    prelude: Vec<String>,
    /// Head of the generated loop.
    loop_head: Option<String>,
    /// First commands of every iteration, ahead of the user's body.
    loop_prelude: Vec<String>,
}

enum ExpansionError {
    StepZero,
    Malformed(String),
}

/// Rewrites `dim`, `for` and `for each` commands into standard commands.
///
/// The macro command stays in the tree as an auxiliary header; generated
/// commands follow it and carry the header's line number.
pub fn expand_macros(
    tree: &mut CommandTree,
    context: &mut PassContext<'_>,
) -> Result<(), CompilerFault> {
    seed_used_names(tree, context);

    let macros = preorder(tree)
        .into_iter()
        .filter(|id| {
            let node = tree.node(*id);
            node.origin == CommandOrigin::Source
                && !node.command.commented
                && node.parse_error.is_none()
                && command_ids::is_macro(node.syntax_id())
        })
        .collect::<Vec<_>>();

    for header in macros {
        match plan(tree, header, context) {
            Ok(expansion) => apply(tree, header, expansion, context)?,
            Err(ExpansionError::StepZero) => context.report(
                tree,
                header,
                "MACRO_STEP_ZERO",
                "Loop step must not be zero.",
            ),
            Err(ExpansionError::Malformed(line)) => context.report(
                tree,
                header,
                "MACRO_EXPANSION_FAILED",
                format!("Could not expand macro into '{}'.", line),
            ),
        }
    }
    tracing::debug!(
        iterators = context.iterator_counter,
        "macros expanded"
    );
    Ok(())
}

fn seed_used_names(tree: &CommandTree, context: &mut PassContext<'_>) {
    for id in preorder(tree) {
        for token in tree
            .node(id)
            .command
            .parameters
            .iter()
            .flat_map(|parameter| parameter.tokens.iter())
            .filter(|token| token.token_type == TokenType::Variable)
        {
            context.used_names.insert(token.value_text.clone());
        }
    }
}

fn next_iterator_name(context: &mut PassContext<'_>) -> String {
    loop {
        let candidate = format!(
            "{}{}{}",
            INTERNAL_RESERVED_NAME_PREFIX, ITERATOR_PREFIX, context.iterator_counter
        );
        context.iterator_counter += 1;
        if context.used_names.insert(candidate.clone()) {
            return format!("${}", candidate);
        }
    }
}

fn plan(
    tree: &CommandTree,
    header: NodeId,
    context: &mut PassContext<'_>,
) -> Result<Expansion, ExpansionError> {
    let command = &tree.node(header).command;
    let parameter = |index: usize| {
        command
            .parameters
            .get(index)
            .map(|parameter| parameter.text())
            .ok_or_else(|| ExpansionError::Malformed(command.text.clone()))
    };

    match command.syntax_id {
        command_ids::DIM => {
            let array = parameter(0)?;
            let items = command
                .parameters
                .get(1)
                .map(|values| values.items())
                .unwrap_or_default();
            let mut prelude = vec![format!("{} = array alloc: size={}", array, items.len())];
            prelude.extend(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| format!("{}[{}] = {}", array, index, join_tokens(*item))),
            );
            Ok(Expansion {
                prelude,
                loop_head: None,
                loop_prelude: Vec::new(),
            })
        }
        command_ids::FOR_LOOP | command_ids::FOR_LOOP_STEP => {
            let variable = parameter(0)?;
            let initial = parameter(1)?;
            let limit = parameter(2)?;
            let (step, literal_step) = if command.syntax_id == command_ids::FOR_LOOP_STEP {
                let step = command
                    .parameters
                    .get(3)
                    .ok_or_else(|| ExpansionError::Malformed(command.text.clone()))?;
                (step.text(), step.literal_number())
            } else {
                ("1".to_string(), Some(1))
            };
            if literal_step == Some(0) {
                return Err(ExpansionError::StepZero);
            }
            let descending = literal_step.is_some_and(|value| value < 0);
            let magnitude = match literal_step {
                Some(value) => value.abs().to_string(),
                None => step,
            };
            let (retreat, advance) = if descending { ("+", "-") } else { ("-", "+") };

            let literal_initial = command
                .parameters
                .get(1)
                .and_then(|parameter| parameter.literal_number());
            let start = match (literal_initial, literal_step) {
                (Some(initial), Some(step)) => (initial - step).to_string(),
                _ => format!("{} {} {}", initial, retreat, magnitude),
            };
            let iterator = next_iterator_name(context);
            Ok(Expansion {
                prelude: vec![
                    format!("{} = {}", iterator, limit),
                    format!("{} = {}", variable, start),
                ],
                loop_head: Some(format!(
                    "while {} {} {}",
                    variable,
                    if descending { ">" } else { "<" },
                    iterator
                )),
                loop_prelude: vec![format!("{} = {} {} {}", variable, variable, advance, magnitude)],
            })
        }
        command_ids::FOR_EACH | command_ids::FOR_EACH_COUNTER => {
            let item = parameter(0)?;
            let array = parameter(1)?;
            let counter = if command.syntax_id == command_ids::FOR_EACH_COUNTER {
                parameter(2)?
            } else {
                next_iterator_name(context)
            };
            Ok(Expansion {
                prelude: vec![format!("{} = size of array {}", counter, array)],
                loop_head: Some(format!("while {}", counter)),
                loop_prelude: vec![
                    format!("dec {} =", counter),
                    format!("{} = {}[{}]", item, array, counter),
                ],
            })
        }
        _ => Err(ExpansionError::Malformed(command.text.clone())),
    }
}

/// Parses one generated line; the error is the offending text.
fn parse_generated(
    text: &str,
    line_number: usize,
    context: &PassContext<'_>,
) -> Result<ParsedCommand, String> {
    match parse_line(text, line_number, context.table, context.version) {
        (command, None) if command.is_recognised() => Ok(command),
        _ => Err(text.to_string()),
    }
}

fn apply(
    tree: &mut CommandTree,
    header: NodeId,
    expansion: Expansion,
    context: &mut PassContext<'_>,
) -> Result<(), CompilerFault> {
    let line = tree.node(header).line();
    let parsed = (|| {
        let prelude = expansion
            .prelude
            .iter()
            .map(|text| parse_generated(text, line, context))
            .collect::<Result<Vec<_>, _>>()?;
        let loop_head = expansion
            .loop_head
            .as_deref()
            .map(|text| parse_generated(text, line, context))
            .transpose()?;
        let loop_prelude = expansion
            .loop_prelude
            .iter()
            .map(|text| parse_generated(text, line, context))
            .collect::<Result<Vec<_>, _>>()?;
        Ok::<_, String>((prelude, loop_head, loop_prelude))
    })();
    let (prelude, loop_head, loop_prelude) = match parsed {
        Ok(parsed) => parsed,
        Err(text) => {
            context.report(
                tree,
                header,
                "MACRO_EXPANSION_FAILED",
                format!("Could not expand macro into '{}'.", text),
            );
            return Ok(());
        }
    };

    let Some(parent) = tree.parent(header) else {
        return Err(CompilerFault::new(format!(
            "macro on line {} is detached from the tree",
            line
        )));
    };
    let body = tree.take_children(header);
    {
        let node = tree.node_mut(header);
        node.origin = CommandOrigin::MacroHeader;
        node.command.command_type = CommandType::Auxiliary;
    }

    let mut position = tree.position_in_parent(header).unwrap_or(0) + 1;
    let generated = |tree: &mut CommandTree, command: ParsedCommand| {
        let id = tree.create(command, CommandOrigin::Expanded);
        tree.node_mut(id).macro_header = Some(header);
        id
    };
    for command in prelude {
        let id = generated(tree, command);
        tree.insert(parent, position, id);
        position += 1;
    }

    match loop_head {
        Some(head) => {
            let head = generated(tree, head);
            tree.insert(parent, position, head);
            for command in loop_prelude {
                let id = generated(tree, command);
                tree.append(head, id);
            }
            for child in body {
                tree.append(head, child);
            }
        }
        None => {
            for child in body {
                tree.append(header, child);
            }
        }
    }
    Ok(())
}
