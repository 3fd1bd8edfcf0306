pub mod lexer;
pub mod matcher;
pub mod render;
pub mod syntax;

pub use lexer::{tokenize, Token, TokenArray, TokenType};
pub use matcher::{
    classify, is_literal, literal_number, parse_line, parse_lines, Parameter, ParsedCommand,
};
pub use render::{join_tokens, render_command};
pub use syntax::{
    command_ids, CommandSyntax, ParameterSyntax, ParameterType, SyntaxTable, SyntaxTableError,
    TemplatePiece,
};
