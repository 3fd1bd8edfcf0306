use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Structural role of a command in control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BranchLogic {
    None,
    Nop,
    If,
    While,
    SkipIf,
    Else,
    ElseIf,
    End,
    Break,
    Continue,
}

impl BranchLogic {
    /// Opens a scope that must be closed by `else`, `else if` or `end`.
    pub fn opens_block(self) -> bool {
        matches!(self, Self::If | Self::While | Self::Else | Self::ElseIf)
    }

    pub fn is_conditional_branch(self) -> bool {
        matches!(self, Self::If | Self::ElseIf)
    }
}

/// How a command branches. Byte values are read by the game engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Conditional {
    None = 0,
    Discard = 1,
    Start = 2,
    If = 3,
    IfNot = 4,
    ElseIf = 5,
    ElseIfNot = 6,
    SkipIf = 7,
    SkipIfNot = 8,
    While = 9,
    WhileNot = 10,
}

impl Conditional {
    pub const ALL: [Conditional; 11] = [
        Self::None,
        Self::Discard,
        Self::Start,
        Self::If,
        Self::IfNot,
        Self::ElseIf,
        Self::ElseIfNot,
        Self::SkipIf,
        Self::SkipIfNot,
        Self::While,
        Self::WhileNot,
    ];

    pub fn from_byte(value: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|entry| *entry as u8 == value)
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn branch_logic(self) -> BranchLogic {
        match self {
            Self::If | Self::IfNot => BranchLogic::If,
            Self::ElseIf | Self::ElseIfNot => BranchLogic::ElseIf,
            Self::While | Self::WhileNot => BranchLogic::While,
            Self::SkipIf | Self::SkipIfNot => BranchLogic::SkipIf,
            Self::None | Self::Discard | Self::Start => BranchLogic::None,
        }
    }

    /// Source keywords that introduce this conditional, e.g. `skip if not`.
    /// Empty for `None` and `Discard`.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::None | Self::Discard => &[],
            Self::Start => &["START"],
            Self::If => &["if"],
            Self::IfNot => &["if", "not"],
            Self::ElseIf => &["else", "if"],
            Self::ElseIfNot => &["else", "if", "not"],
            Self::SkipIf => &["skip", "if"],
            Self::SkipIfNot => &["skip", "if", "not"],
            Self::While => &["while"],
            Self::WhileNot => &["while", "not"],
        }
    }

    pub fn is_jump(self) -> bool {
        !matches!(self, Self::None | Self::Discard | Self::Start)
    }
}

/// Engine-facing interpretation of a command's return slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum ReturnType {
    Assignment = 0,
    Discard = 1,
    JumpIfTrue = 2,
    JumpIfFalse = 3,
}

impl ReturnType {
    pub fn from_byte(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Assignment),
            1 => Some(Self::Discard),
            2 => Some(Self::JumpIfTrue),
            3 => Some(Self::JumpIfFalse),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Standard commands are executed and indexed; auxiliary ones are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandType {
    Standard,
    Auxiliary,
}

/// Where a command came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandOrigin {
    Source,
    MacroHeader,
    Expanded,
    HiddenJump,
}

impl CommandOrigin {
    pub fn is_synthetic(self) -> bool {
        matches!(self, Self::Expanded | Self::HiddenJump)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SymbolKind {
    Argument,
    Constant,
    Variable,
    Label,
}

/// Game release a script targets. Later releases extend the command set.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum GameVersion {
    Threat,
    Reunion,
    TerranConflict,
    #[default]
    AlbionPrelude,
}

impl GameVersion {
    pub const ALL: [GameVersion; 4] = [
        Self::Threat,
        Self::Reunion,
        Self::TerranConflict,
        Self::AlbionPrelude,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Threat => "Threat",
            Self::Reunion => "Reunion",
            Self::TerranConflict => "TerranConflict",
            Self::AlbionPrelude => "AlbionPrelude",
        }
    }
}

impl fmt::Display for GameVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GameVersion {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.to_ascii_lowercase().replace(['-', '_', ' '], "");
        match normalized.as_str() {
            "threat" | "x2" => Ok(Self::Threat),
            "reunion" | "x3r" => Ok(Self::Reunion),
            "terranconflict" | "x3tc" | "tc" => Ok(Self::TerranConflict),
            "albionprelude" | "x3ap" | "ap" => Ok(Self::AlbionPrelude),
            _ => Err(format!("unknown game version \"{}\"", value)),
        }
    }
}

/// Character extent of a command within its source line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extent {
    pub start: usize,
    pub end: usize,
}
