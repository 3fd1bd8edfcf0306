use std::collections::BTreeSet;

use msci_core::{GameVersion, ScriptCommand};
use msci_parser::{command_ids, parse_lines, ParsedCommand, SyntaxTable};

use crate::indentation::IndentationStack;

/// Re-indents script source. Unrecognised lines are kept as written.
pub fn format_script<S: AsRef<str>>(
    lines: &[S],
    table: &SyntaxTable,
    version: GameVersion,
    width: usize,
) -> Vec<String> {
    let (commands, _) = parse_lines(lines, table, version);
    let subroutines = commands
        .iter()
        .filter(|command| !command.commented && command.syntax_id == command_ids::GOSUB)
        .filter_map(|command| command.parameters.first().map(|label| label.text()))
        .collect::<BTreeSet<_>>();

    let mut stack = IndentationStack::new(width);
    commands
        .iter()
        .enumerate()
        .map(|(id, command)| {
            let is_header = is_label_definition(command)
                && command
                    .parameters
                    .first()
                    .is_some_and(|label| subroutines.contains(&label.text()));
            stack.pre_display(id, command.branch_logic, ends_subroutine(command));
            let line = if command.syntax_id == command_ids::NOP {
                String::new()
            } else {
                format!("{}{}", " ".repeat(stack.indentation()), command.display_text())
            };
            stack.post_display(
                id,
                command.branch_logic,
                command.command_type,
                command.commented,
                is_header,
            );
            line
        })
        .collect()
}

/// Prints compiled commands back as source. Generated commands are left
/// out; macro headers stand in for their expansion.
pub fn render_compiled(commands: &[ScriptCommand], width: usize) -> Vec<String> {
    let subroutines = commands
        .iter()
        .filter(|command| !command.commented && command.syntax_id == command_ids::GOSUB)
        .filter_map(|command| command.parameters.first().cloned())
        .collect::<BTreeSet<_>>();

    let mut stack = IndentationStack::new(width);
    commands
        .iter()
        .enumerate()
        .filter(|(_, command)| command.is_printable())
        .map(|(id, command)| {
            let is_header = !command.commented
                && command.syntax_id == command_ids::DEFINE_LABEL
                && command
                    .parameters
                    .first()
                    .is_some_and(|label| subroutines.contains(label));
            let ends_subroutine = !command.commented && command.syntax_id == command_ids::ENDSUB;
            stack.pre_display(id, command.branch_logic, ends_subroutine);
            let line = match display_text(command) {
                Some(text) => format!("{}{}", " ".repeat(stack.indentation()), text),
                None => String::new(),
            };
            stack.post_display(
                id,
                command.branch_logic,
                command.command_type,
                command.commented,
                is_header,
            );
            line
        })
        .collect()
}

fn is_label_definition(command: &ParsedCommand) -> bool {
    !command.commented && command.syntax_id == command_ids::DEFINE_LABEL
}

fn ends_subroutine(command: &ParsedCommand) -> bool {
    !command.commented && command.syntax_id == command_ids::ENDSUB
}

fn display_text(command: &ScriptCommand) -> Option<String> {
    match command.syntax_id {
        command_ids::NOP => None,
        command_ids::COMMENT if command.text.is_empty() => Some("*".to_string()),
        command_ids::COMMENT => Some(format!("* {}", command.text)),
        _ if command.commented => Some(format!("* {}", command.text)),
        _ => Some(command.text.clone()),
    }
}
