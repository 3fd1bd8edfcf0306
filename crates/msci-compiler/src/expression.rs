use msci_parser::{Token, TokenType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionError {
    pub code: &'static str,
    pub message: String,
}

impl ExpressionError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

const UNARY_PRECEDENCE: u8 = 8;

fn binary_precedence(operator: &str) -> Option<u8> {
    Some(match operator {
        "*" | "/" | "mod" => 7,
        "+" | "-" => 6,
        "<" | ">" | "<=" | ">=" => 5,
        "==" | "!=" => 4,
        "&" => 3,
        "|" | "^" => 2,
        "AND" => 1,
        "OR" => 0,
        _ => return None,
    })
}

fn stack_precedence(token: &Token) -> Option<u8> {
    match token.token_type {
        TokenType::UnaryOp => Some(UNARY_PRECEDENCE),
        _ => binary_precedence(&token.text),
    }
}

/// Converts infix expression tokens to evaluation order (shunting-yard).
///
/// Binary operators are left-associative, unary operators bind tightest and
/// associate to the right.
pub fn to_postfix(tokens: &[Token]) -> Result<Vec<Token>, ExpressionError> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut operators: Vec<Token> = Vec::new();
    let mut expect_operand = true;

    for token in tokens {
        if token.is_operand() {
            if !expect_operand {
                return Err(missing_operator(token));
            }
            output.push(token.clone());
            expect_operand = false;
            continue;
        }

        match (token.token_type, token.text.as_str()) {
            (TokenType::BinaryOp, "(") => {
                if !expect_operand {
                    return Err(missing_operator(token));
                }
                operators.push(token.clone());
            }
            (TokenType::BinaryOp, ")") => {
                if expect_operand {
                    return Err(missing_operand(token));
                }
                loop {
                    match operators.pop() {
                        Some(top) if top.text == "(" => break,
                        Some(top) => output.push(top),
                        None => {
                            return Err(ExpressionError::new(
                                "EXPRESSION_PARENTHESIS_UNBALANCED",
                                "Closing bracket has no matching opening bracket.",
                            ))
                        }
                    }
                }
            }
            (TokenType::UnaryOp, _) => {
                if !expect_operand {
                    return Err(missing_operator(token));
                }
                operators.push(token.clone());
            }
            (TokenType::BinaryOp, text) => {
                let Some(precedence) = binary_precedence(text) else {
                    return Err(ExpressionError::new(
                        "EXPRESSION_OPERATOR_INVALID",
                        format!("Operator '{}' cannot be used in an expression.", text),
                    ));
                };
                if expect_operand {
                    return Err(missing_operand(token));
                }
                while let Some(top) = operators.last() {
                    match stack_precedence(top) {
                        Some(top_precedence) if top_precedence >= precedence => {
                            if let Some(top) = operators.pop() {
                                output.push(top);
                            }
                        }
                        _ => break,
                    }
                }
                operators.push(token.clone());
                expect_operand = true;
            }
            _ => {
                return Err(ExpressionError::new(
                    "EXPRESSION_TOKEN_INVALID",
                    format!("'{}' is not valid in an expression.", token.text),
                ))
            }
        }
    }

    if expect_operand {
        return Err(ExpressionError::new(
            "EXPRESSION_OPERAND_MISSING",
            "Expression is incomplete.",
        ));
    }
    while let Some(top) = operators.pop() {
        if top.text == "(" {
            return Err(ExpressionError::new(
                "EXPRESSION_PARENTHESIS_UNBALANCED",
                "Opening bracket is never closed.",
            ));
        }
        output.push(top);
    }
    Ok(output)
}

fn missing_operator(token: &Token) -> ExpressionError {
    ExpressionError::new(
        "EXPRESSION_OPERATOR_MISSING",
        format!("Expected an operator before '{}'.", token.text),
    )
}

fn missing_operand(token: &Token) -> ExpressionError {
    ExpressionError::new(
        "EXPRESSION_OPERAND_MISSING",
        format!("Expected a value before '{}'.", token.text),
    )
}

#[cfg(test)]
mod expression_tests {
    use super::*;
    use msci_parser::tokenize;

    fn postfix(source: &str) -> Result<String, &'static str> {
        to_postfix(&tokenize(source, false).significant())
            .map(|tokens| {
                tokens
                    .iter()
                    .map(|token| token.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .map_err(|error| error.code)
    }

    #[test]
    fn respects_precedence_and_left_associativity() {
        assert_eq!(postfix("1 + 2 * 3"), Ok("1 2 3 * +".to_string()));
        assert_eq!(postfix("$a - $b - $c"), Ok("$a $b - $c -".to_string()));
        assert_eq!(
            postfix("$a == 1 AND $b OR $c"),
            Ok("$a 1 == $b AND $c OR".to_string())
        );
        assert_eq!(postfix("$a mod 3 < 2"), Ok("$a 3 mod 2 <".to_string()));
    }

    #[test]
    fn brackets_override_precedence() {
        assert_eq!(postfix("(1 + 2) * 3"), Ok("1 2 + 3 *".to_string()));
    }

    #[test]
    fn unary_operators_bind_tightest() {
        assert_eq!(postfix("-$a * 2"), Ok("$a - 2 *".to_string()));
        assert_eq!(postfix("! ! $a"), Ok("$a ! !".to_string()));
        assert_eq!(postfix("2 * -(1 + $b)"), Ok("2 1 $b + - *".to_string()));
    }

    #[test]
    fn reports_malformed_expressions() {
        assert_eq!(postfix("1 +"), Err("EXPRESSION_OPERAND_MISSING"));
        assert_eq!(postfix("1 2"), Err("EXPRESSION_OPERATOR_MISSING"));
        assert_eq!(postfix("(1 + 2"), Err("EXPRESSION_PARENTHESIS_UNBALANCED"));
        assert_eq!(postfix("1 + 2)"), Err("EXPRESSION_PARENTHESIS_UNBALANCED"));
        assert_eq!(postfix("()"), Err("EXPRESSION_OPERAND_MISSING"));
        assert_eq!(postfix("$a = 1"), Err("EXPRESSION_OPERATOR_INVALID"));
        assert_eq!(postfix(""), Err("EXPRESSION_OPERAND_MISSING"));
    }
}
