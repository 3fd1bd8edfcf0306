use msci_core::{CommandOrigin, CompilerFault};
use msci_parser::{ParameterType, Token, TokenType};

use super::{PassContext, Visitor};
use crate::expression::to_postfix;
use crate::tree::{CommandTree, NodeId};

/// Parameter type checks, expression compilation and object name lookup.
pub(super) struct CommandVerifier;

struct Violation {
    code: &'static str,
    message: String,
}

impl Visitor for CommandVerifier {
    fn visit(
        &mut self,
        tree: &mut CommandTree,
        id: NodeId,
        context: &mut PassContext<'_>,
    ) -> Result<(), CompilerFault> {
        let node = tree.node(id);
        if node.command.commented || node.origin == CommandOrigin::HiddenJump {
            return Ok(());
        }
        if let Some(error) = node.parse_error.clone() {
            tree.node_mut(id).has_error = true;
            context.errors.push(error);
            return Ok(());
        }

        let mut violations = Vec::new();
        let mut postfix = Vec::new();
        let check_types = node.origin != CommandOrigin::Expanded;
        for parameter in &node.command.parameters {
            if parameter.param_type == ParameterType::Expression {
                match to_postfix(&parameter.tokens) {
                    Ok(tokens) => {
                        check_ranges(&parameter.tokens, &mut violations);
                        check_objects(&tokens, context, &mut violations);
                        postfix = tokens;
                    }
                    Err(error) => violations.push(Violation {
                        code: error.code,
                        message: error.message,
                    }),
                }
                continue;
            }
            if check_types {
                check_parameter(parameter.param_type, &parameter.tokens, context, &mut violations);
            }
        }

        tree.node_mut(id).postfix = postfix;
        for violation in violations {
            context.report(tree, id, violation.code, violation.message);
        }
        Ok(())
    }
}

fn check_parameter(
    param_type: ParameterType,
    tokens: &[Token],
    context: &PassContext<'_>,
    violations: &mut Vec<Violation>,
) {
    let is_variable = matches!(tokens, [token] if token.token_type == TokenType::Variable);
    let single_type = match tokens {
        [token] => Some(token.token_type),
        _ => None,
    };
    let mismatch = |expected: &str| Violation {
        code: "PARAM_TYPE_MISMATCH",
        message: format!("Expected {}, found '{}'.", expected, join(tokens)),
    };

    match param_type {
        ParameterType::Var if !is_variable => violations.push(mismatch("a variable")),
        ParameterType::Number => {
            if numeric_literal(tokens).is_none() && !is_variable {
                violations.push(mismatch("a number"));
            }
        }
        ParameterType::String => {
            if single_type != Some(TokenType::String) && !is_variable {
                violations.push(mismatch("a string"));
            }
        }
        ParameterType::GameObject => {
            if single_type != Some(TokenType::GameObject) && !is_variable {
                violations.push(mismatch("a game object"));
            }
        }
        ParameterType::ScriptObject => {
            if single_type != Some(TokenType::ScriptObject) && !is_variable {
                violations.push(mismatch("a script object"));
            }
        }
        ParameterType::ValueList => {
            for item in tokens.split(|token| token.is(TokenType::BinaryOp, ",")) {
                check_parameter(ParameterType::Value, item, context, violations);
            }
            return;
        }
        _ => {}
    }

    if let Some((negative, number)) = numeric_literal(tokens) {
        if !fits_in_32_bits(negative, &number.text) {
            violations.push(out_of_range(tokens));
        }
    }
    check_objects(tokens, context, violations);
}

/// A lone number, optionally negated, regardless of its magnitude.
fn numeric_literal(tokens: &[Token]) -> Option<(bool, &Token)> {
    match tokens {
        [number] if number.token_type == TokenType::Number => Some((false, number)),
        [minus, number]
            if minus.is(TokenType::UnaryOp, "-") && number.token_type == TokenType::Number =>
        {
            Some((true, number))
        }
        _ => None,
    }
}

/// Every number inside an expression, with its unary minus when it has one.
fn check_ranges(tokens: &[Token], violations: &mut Vec<Violation>) {
    for (index, token) in tokens.iter().enumerate() {
        if token.token_type != TokenType::Number {
            continue;
        }
        let minus = index
            .checked_sub(1)
            .and_then(|previous| tokens.get(previous))
            .filter(|previous| previous.is(TokenType::UnaryOp, "-"));
        if !fits_in_32_bits(minus.is_some(), &token.text) {
            let start = if minus.is_some() { index - 1 } else { index };
            violations.push(out_of_range(&tokens[start..=index]));
        }
    }
}

/// Lexed numbers are bare digit runs, so a failed parse is an overflow.
fn fits_in_32_bits(negative: bool, digits: &str) -> bool {
    match digits.parse::<i64>() {
        Ok(value) => i32::try_from(if negative { -value } else { value }).is_ok(),
        Err(_) => false,
    }
}

fn out_of_range(tokens: &[Token]) -> Violation {
    Violation {
        code: "PARAM_OUT_OF_RANGE",
        message: format!("Number {} does not fit in 32 bits.", join(tokens)),
    }
}

fn check_objects(tokens: &[Token], context: &PassContext<'_>, violations: &mut Vec<Violation>) {
    let Some(library) = context.object_library else {
        return;
    };
    for token in tokens {
        let known = match token.token_type {
            TokenType::GameObject => library.contains_game_object(&token.value_text),
            TokenType::ScriptObject => library.contains_script_object(&token.value_text),
            _ => true,
        };
        if !known {
            violations.push(Violation {
                code: "OBJECT_UNKNOWN",
                message: format!("Unknown object name {}.", token.text),
            });
        }
    }
}

fn join(tokens: &[Token]) -> String {
    msci_parser::join_tokens(tokens)
}
