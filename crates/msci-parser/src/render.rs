use crate::lexer::{Token, TokenType};
use crate::matcher::Parameter;
use crate::syntax::{CommandSyntax, TemplatePiece};

/// Joins tokens with single spaces, keeping brackets, commas and unary
/// operators tight.
pub fn join_tokens<'a>(tokens: impl IntoIterator<Item = &'a Token>) -> String {
    let mut out = String::new();
    let mut previous: Option<&Token> = None;
    for token in tokens {
        if let Some(prev) = previous {
            let tight_before = matches!(token.text.as_str(), ")" | "]" | "," | "[");
            let tight_after = matches!(prev.text.as_str(), "(" | "[")
                || prev.token_type == TokenType::UnaryOp;
            if !tight_before && !tight_after {
                out.push(' ');
            }
        }
        out.push_str(&token.text);
        previous = Some(token);
    }
    out
}

/// Canonical text of a command: template literals with parameters filled
/// in display order.
pub fn render_command(syntax: &CommandSyntax, parameters: &[Parameter]) -> String {
    let mut tokens = Vec::new();
    for piece in syntax.pieces() {
        match piece {
            TemplatePiece::Literal(text) => tokens.push(Token::synthetic(TokenType::Text, text)),
            TemplatePiece::Param(index) => {
                if let Some(parameter) = parameters.get(*index) {
                    tokens.extend(parameter.tokens.iter().cloned());
                }
            }
        }
    }
    join_tokens(&tokens)
}
