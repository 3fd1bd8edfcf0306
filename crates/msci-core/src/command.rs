use serde::{Deserialize, Serialize};

use crate::return_value::ReturnValue;
use crate::types::{BranchLogic, CommandOrigin, CommandType};

/// A finalized command in execution order, as handed to the game engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptCommand {
    pub syntax_id: u32,
    pub line_number: usize,
    pub text: String,
    pub parameters: Vec<String>,
    /// Expression operands and operators in evaluation order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub postfix: Vec<String>,
    pub branch_logic: BranchLogic,
    pub command_type: CommandType,
    pub origin: CommandOrigin,
    pub commented: bool,
    /// Position among standard commands.
    pub index: Option<u16>,
    /// Auxiliary: the standard command this one precedes.
    /// Expanded: the first standard command of the same macro.
    pub reference: Option<u16>,
    pub return_value: Option<ReturnValue>,
    pub jump_destination: Option<u16>,
}

impl ScriptCommand {
    pub fn is_standard(&self) -> bool {
        self.command_type == CommandType::Standard
    }

    pub fn encoded_return_value(&self) -> Option<u32> {
        self.return_value.map(|value| value.encoded())
    }

    /// Whether the command was written by the user, as opposed to produced by
    /// macro expansion or jump insertion.
    pub fn is_printable(&self) -> bool {
        !self.origin.is_synthetic()
    }
}

#[cfg(test)]
mod command_tests {
    use super::*;
    use crate::types::Conditional;

    fn sample(origin: CommandOrigin) -> ScriptCommand {
        ScriptCommand {
            syntax_id: 12,
            line_number: 1,
            text: "if $a == 1".to_string(),
            parameters: vec!["if".to_string(), "$a == 1".to_string()],
            postfix: vec!["$a".to_string(), "1".to_string(), "==".to_string()],
            branch_logic: BranchLogic::If,
            command_type: CommandType::Standard,
            origin,
            commented: false,
            index: Some(0),
            reference: None,
            return_value: Some(ReturnValue::new(Conditional::If, 2)),
            jump_destination: None,
        }
    }

    #[test]
    fn encoded_return_value_uses_packed_layout() {
        let command = sample(CommandOrigin::Source);
        assert_eq!(command.encoded_return_value(), Some(0x0300_0203));
        assert!(command.is_standard());
    }

    #[test]
    fn synthetic_commands_are_not_printable() {
        assert!(sample(CommandOrigin::Source).is_printable());
        assert!(sample(CommandOrigin::MacroHeader).is_printable());
        assert!(!sample(CommandOrigin::Expanded).is_printable());
        assert!(!sample(CommandOrigin::HiddenJump).is_printable());
    }

    #[test]
    fn command_serializes_with_camel_case_fields() {
        let json = serde_json::to_value(sample(CommandOrigin::Source)).expect("serialize");
        assert_eq!(json["syntaxId"], 12);
        assert_eq!(json["branchLogic"], "if");
        assert_eq!(json["returnValue"]["conditional"], "IF");
        assert_eq!(json["postfix"][2], "==");
    }
}
