use serde::{Deserialize, Serialize};

use crate::error::CompilerFault;
use crate::types::{Conditional, ReturnType};

/// Destination written for jumps that could not be resolved.
pub const UNRESOLVED_DESTINATION: u16 = 0xFFFF;

/// Packed branching descriptor: `[ReturnType:8][Destination:16][Conditional:8]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnValue {
    pub return_type: ReturnType,
    pub destination: u16,
    pub conditional: Conditional,
}

impl ReturnValue {
    pub fn new(conditional: Conditional, destination: u16) -> Self {
        Self {
            return_type: return_type_for(conditional),
            destination,
            conditional,
        }
    }

    pub fn assignment(variable_id: u16) -> Self {
        Self::new(Conditional::None, variable_id)
    }

    pub fn encoded(&self) -> u32 {
        (u32::from(self.return_type.as_byte()) << 24)
            | (u32::from(self.destination) << 8)
            | u32::from(self.conditional.as_byte())
    }

    pub fn decode(value: u32) -> Result<Self, CompilerFault> {
        let type_byte = (value >> 24) as u8;
        let destination = ((value >> 8) & 0xFFFF) as u16;
        let conditional_byte = (value & 0xFF) as u8;

        let conditional = Conditional::from_byte(conditional_byte).ok_or_else(|| {
            CompilerFault::new(format!(
                "return value {:#010x} has unknown conditional {}",
                value, conditional_byte
            ))
        })?;
        let return_type = ReturnType::from_byte(type_byte).ok_or_else(|| {
            CompilerFault::new(format!(
                "return value {:#010x} has unknown return type {}",
                value, type_byte
            ))
        })?;
        if return_type != return_type_for(conditional) {
            return Err(CompilerFault::new(format!(
                "return value {:#010x} pairs {:?} with {:?}",
                value, return_type, conditional
            )));
        }

        Ok(Self {
            return_type,
            destination,
            conditional,
        })
    }
}

pub fn return_type_for(conditional: Conditional) -> ReturnType {
    match conditional {
        Conditional::None => ReturnType::Assignment,
        Conditional::Start | Conditional::Discard => ReturnType::Discard,
        Conditional::If | Conditional::While | Conditional::ElseIf | Conditional::SkipIfNot => {
            ReturnType::JumpIfFalse
        }
        Conditional::IfNot
        | Conditional::WhileNot
        | Conditional::ElseIfNot
        | Conditional::SkipIf => ReturnType::JumpIfTrue,
    }
}
