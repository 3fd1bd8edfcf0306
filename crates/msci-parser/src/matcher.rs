use msci_core::{
    BranchLogic, CommandType, Conditional, ErrorArray, ErrorToken, Extent, GameVersion,
};

use crate::lexer::{tokenize, Token, TokenType};
use crate::render::{join_tokens, render_command};
use crate::syntax::{command_ids, CommandSyntax, ParameterType, SyntaxTable, TemplatePiece};

/// Return-slot keyword sequences, longest first so `if not` wins over `if`.
const RETURN_SLOT_KEYWORDS: [Conditional; 9] = [
    Conditional::SkipIfNot,
    Conditional::SkipIf,
    Conditional::ElseIfNot,
    Conditional::ElseIf,
    Conditional::IfNot,
    Conditional::If,
    Conditional::WhileNot,
    Conditional::While,
    Conditional::Start,
];

/// Tokens bound to one syntax parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub param_type: ParameterType,
    pub tokens: Vec<Token>,
}

impl Parameter {
    pub fn new(param_type: ParameterType, tokens: Vec<Token>) -> Self {
        Self { param_type, tokens }
    }

    pub fn text(&self) -> String {
        join_tokens(&self.tokens)
    }

    /// The variable when the parameter is exactly one variable token.
    pub fn variable(&self) -> Option<&Token> {
        match self.tokens.as_slice() {
            [token] if token.token_type == TokenType::Variable => Some(token),
            _ => None,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self.tokens.as_slice() {
            [token] if token.token_type == TokenType::Label => Some(token.value_text.as_str()),
            _ => None,
        }
    }

    /// Numeric literal value, honouring a leading unary minus.
    pub fn literal_number(&self) -> Option<i64> {
        literal_number(&self.tokens)
    }

    /// A single constant operand: number, string, null or object name.
    pub fn is_literal(&self) -> bool {
        is_literal(&self.tokens)
    }

    /// Comma-separated items of a value list.
    pub fn items(&self) -> Vec<&[Token]> {
        self.tokens
            .split(|token| token.is(TokenType::BinaryOp, ","))
            .filter(|item| !item.is_empty())
            .collect()
    }
}

pub fn literal_number(tokens: &[Token]) -> Option<i64> {
    match tokens {
        [number] if number.token_type == TokenType::Number => number.text.parse().ok(),
        [minus, number]
            if minus.is(TokenType::UnaryOp, "-") && number.token_type == TokenType::Number =>
        {
            number.text.parse::<i64>().ok().map(|value| -value)
        }
        _ => None,
    }
}

pub fn is_literal(tokens: &[Token]) -> bool {
    match tokens {
        [token] => matches!(
            token.token_type,
            TokenType::Number
                | TokenType::String
                | TokenType::Null
                | TokenType::GameObject
                | TokenType::ScriptObject
        ),
        _ => literal_number(tokens).is_some(),
    }
}

/// One source line classified against the syntax table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub line_number: usize,
    pub syntax_id: u32,
    pub conditional: Conditional,
    pub branch_logic: BranchLogic,
    pub command_type: CommandType,
    pub commented: bool,
    /// Physical order, as declared by the syntax.
    pub parameters: Vec<Parameter>,
    /// Canonical text without any comment marker. For comments, the body.
    pub text: String,
    pub extent: Extent,
}

impl ParsedCommand {
    pub fn nop(line_number: usize) -> Self {
        Self {
            line_number,
            syntax_id: command_ids::NOP,
            conditional: Conditional::Discard,
            branch_logic: BranchLogic::Nop,
            command_type: CommandType::Auxiliary,
            commented: false,
            parameters: Vec::new(),
            text: String::new(),
            extent: Extent::default(),
        }
    }

    pub fn is_comment(&self) -> bool {
        self.syntax_id == command_ids::COMMENT
    }

    pub fn is_recognised(&self) -> bool {
        self.syntax_id != command_ids::UNRECOGNISED
    }

    pub fn is_standard(&self) -> bool {
        self.command_type == CommandType::Standard
    }

    /// Text as it should appear in a script file, without indentation.
    pub fn display_text(&self) -> String {
        if self.is_comment() {
            if self.text.is_empty() {
                return "*".to_string();
            }
            return format!("* {}", self.text);
        }
        if self.commented {
            return format!("* {}", self.text);
        }
        self.text.clone()
    }

    pub fn return_slot(&self) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|parameter| parameter.param_type.is_return_slot())
    }

    /// Variable receiving the result when the return slot is an assignment.
    pub fn assigned_variable(&self) -> Option<&Token> {
        if self.conditional != Conditional::None {
            return None;
        }
        self.return_slot()?.tokens.first()
    }
}

/// Command kind and branch role for a classified line.
pub fn classify(
    syntax_id: u32,
    conditional: Conditional,
    commented: bool,
) -> (BranchLogic, CommandType) {
    if commented {
        return (BranchLogic::Nop, CommandType::Auxiliary);
    }
    match syntax_id {
        command_ids::NOP | command_ids::COMMENT => (BranchLogic::Nop, CommandType::Auxiliary),
        command_ids::END => (BranchLogic::End, CommandType::Auxiliary),
        command_ids::ELSE => (BranchLogic::Else, CommandType::Auxiliary),
        command_ids::BREAK => (BranchLogic::Break, CommandType::Standard),
        command_ids::CONTINUE => (BranchLogic::Continue, CommandType::Standard),
        command_ids::UNRECOGNISED => (BranchLogic::None, CommandType::Standard),
        id if command_ids::is_loop_macro(id) => (BranchLogic::While, CommandType::Standard),
        _ => (conditional.branch_logic(), CommandType::Standard),
    }
}

/// Parses one line. The second value is a diagnostic for lines that could
/// not be matched for `version`; commented lines never produce one.
pub fn parse_line(
    line: &str,
    line_number: usize,
    table: &SyntaxTable,
    version: GameVersion,
) -> (ParsedCommand, Option<ErrorToken>) {
    let tokens = tokenize(line, false);
    let comment = tokens.comment();
    let commented = comment.is_some();
    let significant = tokens.significant();
    let extent = line_extent(line);

    let comment_command = |body: &str| {
        let mut command = ParsedCommand::nop(line_number);
        command.syntax_id = command_ids::COMMENT;
        command.text = body.trim().to_string();
        command.extent = extent;
        command
    };

    if significant.is_empty() {
        return match comment {
            Some(marker) => (comment_command(&line[marker.end..]), None),
            None => (ParsedCommand::nop(line_number), None),
        };
    }

    let found = match match_line(&significant, table, version) {
        Some(found) => found,
        None => {
            if let Some(marker) = comment {
                return (comment_command(&line[marker.end..]), None);
            }
            let text = line.trim().to_string();
            let error = ErrorToken::new(
                "SYNTAX_UNRECOGNISED",
                line_number,
                "Unrecognised command.",
                text.clone(),
            );
            let (branch_logic, command_type) =
                classify(command_ids::UNRECOGNISED, Conditional::Discard, false);
            let command = ParsedCommand {
                line_number,
                syntax_id: command_ids::UNRECOGNISED,
                conditional: Conditional::Discard,
                branch_logic,
                command_type,
                commented: false,
                parameters: Vec::new(),
                text,
                extent,
            };
            return (command, Some(error));
        }
    };

    let (branch_logic, command_type) = classify(found.syntax.id, found.conditional, commented);
    let text = render_command(found.syntax, &found.parameters);
    let unterminated = significant
        .iter()
        .find(|token| token.token_type == TokenType::GameObject && !token.text.ends_with('}'));
    let error = match unterminated {
        _ if commented => None,
        Some(token) => Some(ErrorToken::new(
            "SYNTAX_OBJECT_UNTERMINATED",
            line_number,
            format!("Object name {} is missing its closing '}}'.", token.text),
            text.clone(),
        )),
        None => (!found.supported).then(|| {
            ErrorToken::new(
                "SYNTAX_VERSION_UNSUPPORTED",
                line_number,
                format!("Command is not available in {}.", version),
                text.clone(),
            )
        }),
    };
    let command = ParsedCommand {
        line_number,
        syntax_id: found.syntax.id,
        conditional: found.conditional,
        branch_logic,
        command_type,
        commented,
        parameters: found.parameters,
        text,
        extent,
    };
    (command, error)
}

/// Parses a whole script. Line numbers are 1-based.
pub fn parse_lines<S: AsRef<str>>(
    lines: &[S],
    table: &SyntaxTable,
    version: GameVersion,
) -> (Vec<ParsedCommand>, ErrorArray) {
    let mut errors = ErrorArray::new();
    let mut commands = Vec::with_capacity(lines.len());
    for (offset, line) in lines.iter().enumerate() {
        let (command, error) = parse_line(line.as_ref(), offset + 1, table, version);
        if let Some(error) = error {
            tracing::debug!(line = error.line, code = %error.code, "line not matched");
            errors.push(error);
        }
        commands.push(command);
    }
    tracing::debug!(lines = lines.len(), errors = errors.len(), "script parsed");
    (commands, errors)
}

fn line_extent(line: &str) -> Extent {
    let trimmed_start = line.len() - line.trim_start().len();
    let trimmed_end = line.trim_end().len();
    Extent {
        start: trimmed_start.min(trimmed_end),
        end: trimmed_end,
    }
}

struct LineMatch<'t> {
    syntax: &'t CommandSyntax,
    conditional: Conditional,
    parameters: Vec<Parameter>,
    supported: bool,
}

fn match_line<'t>(
    tokens: &[Token],
    table: &'t SyntaxTable,
    version: GameVersion,
) -> Option<LineMatch<'t>> {
    let mut fallback = None;
    for syntax in table.candidates() {
        let Some((conditional, parameters)) = match_syntax(syntax, tokens) else {
            continue;
        };
        if syntax.supports(version) {
            return Some(LineMatch {
                syntax,
                conditional,
                parameters,
                supported: true,
            });
        }
        fallback.get_or_insert(LineMatch {
            syntax,
            conditional,
            parameters,
            supported: false,
        });
    }
    fallback
}

fn match_syntax(
    syntax: &CommandSyntax,
    tokens: &[Token],
) -> Option<(Conditional, Vec<Parameter>)> {
    let pieces = syntax.pieces();
    let mut slots: Vec<Option<Vec<Token>>> = vec![None; syntax.params.len()];
    let mut conditional = Conditional::Discard;
    let mut position = 0;

    for (piece_index, piece) in pieces.iter().enumerate() {
        match piece {
            TemplatePiece::Literal(text) => {
                if tokens.get(position)?.text != *text {
                    return None;
                }
                position += 1;
            }
            TemplatePiece::Param(index) => {
                let param_type = syntax.param_type(*index)?;
                let consumed = match param_type {
                    ParameterType::RetVar
                    | ParameterType::RetVarIf
                    | ParameterType::RetVarIfStart => {
                        let (found, consumed) = match_return_slot(tokens, position, param_type)?;
                        conditional = found;
                        consumed
                    }
                    ParameterType::Expression => {
                        let stop = pieces[piece_index + 1..].iter().find_map(|next| match next {
                            TemplatePiece::Literal(text) => Some(text.as_str()),
                            TemplatePiece::Param(_) => None,
                        });
                        match_expression(tokens, position, stop)?
                    }
                    ParameterType::ValueList => match_value_list(tokens, position)?,
                    ParameterType::LabelName => {
                        if tokens.get(position)?.token_type != TokenType::Label {
                            return None;
                        }
                        1
                    }
                    _ => match_value(tokens, position)?,
                };
                slots[*index] = Some(tokens[position..position + consumed].to_vec());
                position += consumed;
            }
        }
    }
    if position != tokens.len() {
        return None;
    }

    let parameters = slots
        .into_iter()
        .zip(&syntax.params)
        .map(|(tokens, param)| Parameter::new(param.param_type, tokens.unwrap_or_default()))
        .collect();
    Some((conditional, parameters))
}

fn match_return_slot(
    tokens: &[Token],
    position: usize,
    param_type: ParameterType,
) -> Option<(Conditional, usize)> {
    let rest = &tokens[position..];
    for conditional in RETURN_SLOT_KEYWORDS {
        let words = conditional.keywords();
        let matched = rest.len() >= words.len()
            && words
                .iter()
                .zip(rest)
                .all(|(word, token)| token.is(TokenType::Keyword, word));
        if matched {
            if !param_type.allows(conditional) {
                return None;
            }
            return Some((conditional, words.len()));
        }
    }
    if let [variable, equals, ..] = rest {
        if variable.token_type == TokenType::Variable && equals.is(TokenType::BinaryOp, "=") {
            return Some((Conditional::None, 2));
        }
    }
    Some((Conditional::Discard, 0))
}

fn match_value(tokens: &[Token], position: usize) -> Option<usize> {
    let first = tokens.get(position)?;
    if first.is(TokenType::UnaryOp, "-") {
        let next = tokens.get(position + 1)?;
        return (next.token_type == TokenType::Number).then_some(2);
    }
    first.is_operand().then_some(1)
}

fn match_value_list(tokens: &[Token], position: usize) -> Option<usize> {
    let mut consumed = match_value(tokens, position)?;
    while tokens
        .get(position + consumed)
        .is_some_and(|token| token.is(TokenType::BinaryOp, ","))
    {
        consumed += 1;
        consumed += match_value(tokens, position + consumed)?;
    }
    Some(consumed)
}

fn match_expression(tokens: &[Token], position: usize, stop: Option<&str>) -> Option<usize> {
    let mut consumed = 0;
    for token in &tokens[position..] {
        if stop.is_some_and(|stop| token.text == stop) {
            break;
        }
        if !(token.is_operand() || token.is_operator()) {
            return None;
        }
        consumed += 1;
    }
    (consumed > 0).then_some(consumed)
}

#[cfg(test)]
mod matcher_tests {
    use super::*;

    fn parse(line: &str) -> (ParsedCommand, Option<ErrorToken>) {
        parse_line(line, 1, &SyntaxTable::builtin(), GameVersion::AlbionPrelude)
    }

    #[test]
    fn blank_line_is_nop() {
        let (command, error) = parse("   ");
        assert_eq!(command.syntax_id, command_ids::NOP);
        assert_eq!(command.command_type, CommandType::Auxiliary);
        assert!(error.is_none());
    }

    #[test]
    fn assignment_expression_binds_return_variable() {
        let (command, error) = parse("  $b =   2 + $a");
        assert!(error.is_none());
        assert_eq!(command.syntax_id, command_ids::EXPRESSION);
        assert_eq!(command.conditional, Conditional::None);
        assert_eq!(command.branch_logic, BranchLogic::None);
        assert_eq!(command.text, "$b = 2 + $a");
        assert_eq!(
            command.assigned_variable().map(|token| token.value_text.as_str()),
            Some("b")
        );
        assert_eq!(command.parameters[1].text(), "2 + $a");
        assert_eq!(command.extent, Extent { start: 2, end: 15 });
    }

    #[test]
    fn conditional_keywords_select_branch_logic() {
        let cases = [
            ("if $a == 1", Conditional::If, BranchLogic::If),
            ("if not $a", Conditional::IfNot, BranchLogic::If),
            ("else if $a", Conditional::ElseIf, BranchLogic::ElseIf),
            ("else if not $a", Conditional::ElseIfNot, BranchLogic::ElseIf),
            ("while $a > 0", Conditional::While, BranchLogic::While),
            ("skip if not $a", Conditional::SkipIfNot, BranchLogic::SkipIf),
            ("$a", Conditional::Discard, BranchLogic::None),
        ];
        for (line, conditional, logic) in cases {
            let (command, error) = parse(line);
            assert!(error.is_none(), "{}", line);
            assert_eq!(command.conditional, conditional, "{}", line);
            assert_eq!(command.branch_logic, logic, "{}", line);
        }
    }

    #[test]
    fn structural_keywords_are_auxiliary() {
        let (end, _) = parse("end");
        assert_eq!((end.branch_logic, end.command_type), (BranchLogic::End, CommandType::Auxiliary));
        let (otherwise, _) = parse("else");
        assert_eq!(otherwise.branch_logic, BranchLogic::Else);
        let (stop, _) = parse("break");
        assert_eq!((stop.branch_logic, stop.command_type), (BranchLogic::Break, CommandType::Standard));
    }

    #[test]
    fn game_command_with_object_reference() {
        let (command, error) = parse("$sector = $ship -> get sector");
        assert!(error.is_none());
        assert_eq!(command.syntax_id, 103);
        assert_eq!(command.parameters[1].variable().map(|token| token.text.as_str()), Some("$ship"));

        let (command, _) = parse("skip if $ship -> is docked");
        assert_eq!(command.syntax_id, 106);
        assert_eq!(command.conditional, Conditional::SkipIf);
    }

    #[test]
    fn start_is_only_accepted_where_declared() {
        let (command, error) = parse("START $ship -> call script 'plugin.main'");
        assert!(error.is_none());
        assert_eq!(command.conditional, Conditional::Start);

        let (command, error) = parse("START $ship -> get sector");
        assert_eq!(command.syntax_id, command_ids::UNRECOGNISED);
        assert_eq!(error.map(|error| error.code), Some("SYNTAX_UNRECOGNISED".to_string()));
    }

    #[test]
    fn trailing_carriage_return_is_ignored() {
        let (command, error) = parse("if $a\r");
        assert!(error.is_none());
        assert_eq!(command.branch_logic, BranchLogic::If);
        assert_eq!(command.text, "if $a");
    }

    #[test]
    fn unterminated_object_name_is_reported() {
        let (command, error) = parse("$a = {SS_SH_OTAS_M2");
        assert_eq!(command.syntax_id, command_ids::EXPRESSION);
        let error = error.expect("unterminated object error");
        assert_eq!(error.code, "SYNTAX_OBJECT_UNTERMINATED");
        assert!(error.message.contains("{SS_SH_OTAS_M2"));

        let (_, error) = parse("$a = {SS_SH_OTAS_M2}");
        assert!(error.is_none());
    }

    #[test]
    fn array_commands_win_over_expressions() {
        let (get, _) = parse("$x = $arr[$i]");
        assert_eq!(get.syntax_id, command_ids::ARRAY_GET);
        let (set, _) = parse("$arr[2] = -5");
        assert_eq!(set.syntax_id, command_ids::ARRAY_SET);
        assert_eq!(set.parameters[2].literal_number(), Some(-5));
    }

    #[test]
    fn macros_are_recognised() {
        let (dim, _) = parse("dim $a = 1, 'two', $three");
        assert_eq!(dim.syntax_id, command_ids::DIM);
        assert_eq!(dim.parameters[1].items().len(), 3);

        let (for_loop, _) = parse("for $i = 10 to 0 step -2");
        assert_eq!(for_loop.syntax_id, command_ids::FOR_LOOP_STEP);
        assert_eq!(for_loop.branch_logic, BranchLogic::While);
        assert_eq!(for_loop.parameters[3].literal_number(), Some(-2));

        let (each, _) = parse("for each $x in array $list using counter $n");
        assert_eq!(each.syntax_id, command_ids::FOR_EACH_COUNTER);
    }

    #[test]
    fn labels_and_subroutines() {
        let (label, _) = parse("Main.Loop:");
        assert_eq!(label.syntax_id, command_ids::DEFINE_LABEL);
        assert_eq!(label.parameters[0].label(), Some("Main.Loop"));
        let (call, _) = parse("gosub Main.Loop:");
        assert_eq!(call.syntax_id, command_ids::GOSUB);
    }

    #[test]
    fn commented_lines_become_commands_or_comments() {
        let (command, error) = parse("* $a = 1");
        assert!(error.is_none());
        assert!(command.commented);
        assert_eq!(command.syntax_id, command_ids::EXPRESSION);
        assert_eq!(command.command_type, CommandType::Auxiliary);
        assert_eq!(command.display_text(), "* $a = 1");

        let (comment, error) = parse("*   just words here");
        assert!(error.is_none());
        assert!(comment.is_comment());
        assert_eq!(comment.text, "just words here");
        assert_eq!(comment.display_text(), "* just words here");

        let (bare, _) = parse("*");
        assert_eq!(bare.display_text(), "*");
    }

    #[test]
    fn version_only_match_is_reported() {
        let table = SyntaxTable::builtin();
        let (command, error) = parse_line("$d = $a -> get distance to $b", 4, &table, GameVersion::Reunion);
        assert_eq!(command.syntax_id, 122);
        let error = error.expect("version error");
        assert_eq!(error.code, "SYNTAX_VERSION_UNSUPPORTED");
        assert_eq!(error.line, 4);

        let (legacy, error) =
            parse_line("$m = $s -> get maximum upgrades for upgrade {Shield}", 1, &table, GameVersion::Reunion);
        assert_eq!(legacy.syntax_id, 121);
        assert!(error.is_none());
    }

    #[test]
    fn parse_lines_numbers_from_one_and_collects_errors() {
        let table = SyntaxTable::builtin();
        let (commands, errors) = parse_lines(&["$a = 1", "flibble wibble", ""], &table, GameVersion::default());
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[1].line_number, 2);
        assert!(!commands[1].is_recognised());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.as_slice()[0].line, 2);
    }
}
