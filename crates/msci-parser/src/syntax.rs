use std::collections::BTreeSet;

use msci_core::{Conditional, GameVersion};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lexer::{tokenize, TokenType};

const DEFAULT_SYNTAX_JSON: &str = include_str!("../syntax/default_syntax.json");

/// Command IDs the compiler itself relies on.
pub mod command_ids {
    pub const NOP: u32 = 0;
    pub const COMMENT: u32 = 1;
    pub const END: u32 = 2;
    pub const ELSE: u32 = 3;
    pub const BREAK: u32 = 4;
    pub const CONTINUE: u32 = 5;
    pub const HIDDEN_JUMP: u32 = 6;
    pub const DEFINE_LABEL: u32 = 7;
    pub const GOTO_LABEL: u32 = 8;
    pub const GOSUB: u32 = 9;
    pub const ENDSUB: u32 = 10;
    pub const RETURN: u32 = 11;
    pub const EXPRESSION: u32 = 12;
    pub const INC: u32 = 13;
    pub const DEC: u32 = 14;
    pub const ARRAY_ALLOC: u32 = 15;
    pub const ARRAY_SIZE: u32 = 16;
    pub const ARRAY_GET: u32 = 17;
    pub const ARRAY_SET: u32 = 18;
    pub const DIM: u32 = 19;
    pub const FOR_LOOP: u32 = 20;
    pub const FOR_LOOP_STEP: u32 = 21;
    pub const FOR_EACH: u32 = 22;
    pub const FOR_EACH_COUNTER: u32 = 23;
    pub const UNRECOGNISED: u32 = u32::MAX;

    /// Highest ID reserved for compiler-defined commands.
    pub const LAST_RESERVED: u32 = 99;

    pub fn is_macro(id: u32) -> bool {
        matches!(id, DIM | FOR_LOOP | FOR_LOOP_STEP | FOR_EACH | FOR_EACH_COUNTER)
    }

    pub fn is_loop_macro(id: u32) -> bool {
        matches!(id, FOR_LOOP | FOR_LOOP_STEP | FOR_EACH | FOR_EACH_COUNTER)
    }

    /// Commands that never come from matching a source line.
    pub fn is_unmatchable(id: u32) -> bool {
        matches!(id, NOP | COMMENT | HIDDEN_JUMP)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterType {
    /// `$var =` or nothing.
    RetVar,
    /// Adds `if`, `while`, `skip if`, `else if` and their `not` forms.
    RetVarIf,
    /// Adds `START` on top of [`ParameterType::RetVarIf`].
    RetVarIfStart,
    Var,
    Value,
    Number,
    String,
    LabelName,
    Expression,
    ValueList,
    GameObject,
    ScriptObject,
}

impl ParameterType {
    pub fn is_return_slot(self) -> bool {
        matches!(self, Self::RetVar | Self::RetVarIf | Self::RetVarIfStart)
    }

    pub fn allows(self, conditional: Conditional) -> bool {
        match self {
            Self::RetVar => matches!(conditional, Conditional::None | Conditional::Discard),
            Self::RetVarIf => conditional != Conditional::Start,
            Self::RetVarIfStart => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSyntax {
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePiece {
    Literal(String),
    Param(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSyntax {
    pub id: u32,
    pub template: String,
    #[serde(default)]
    pub params: Vec<ParameterSyntax>,
    /// Releases that understand this command. Empty means all of them.
    #[serde(default)]
    pub versions: Vec<GameVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip)]
    pieces: Vec<TemplatePiece>,
}

impl CommandSyntax {
    pub fn new(id: u32, template: impl Into<String>, params: Vec<ParameterType>) -> Self {
        let mut syntax = Self {
            id,
            template: template.into(),
            params: params
                .into_iter()
                .map(|param_type| ParameterSyntax {
                    param_type,
                    name: None,
                })
                .collect(),
            versions: Vec::new(),
            group: None,
            pieces: Vec::new(),
        };
        syntax.pieces = template_pieces(&syntax.template);
        syntax
    }

    pub fn pieces(&self) -> &[TemplatePiece] {
        &self.pieces
    }

    pub fn supports(&self, version: GameVersion) -> bool {
        self.versions.is_empty() || self.versions.contains(&version)
    }

    pub fn literal_count(&self) -> usize {
        self.pieces
            .iter()
            .filter(|piece| matches!(piece, TemplatePiece::Literal(_)))
            .count()
    }

    pub fn has_expression(&self) -> bool {
        self.params
            .iter()
            .any(|param| param.param_type == ParameterType::Expression)
    }

    pub fn return_slot(&self) -> Option<usize> {
        self.params
            .iter()
            .position(|param| param.param_type.is_return_slot())
    }

    pub fn param_type(&self, index: usize) -> Option<ParameterType> {
        self.params.get(index).map(|param| param.param_type)
    }

    fn validate(&self) -> Result<(), SyntaxTableError> {
        let mut seen = BTreeSet::new();
        for piece in &self.pieces {
            if let TemplatePiece::Param(index) = piece {
                if *index >= self.params.len() {
                    return Err(SyntaxTableError::UnknownPlaceholder {
                        id: self.id,
                        index: *index,
                    });
                }
                if !seen.insert(*index) {
                    return Err(SyntaxTableError::DuplicatePlaceholder {
                        id: self.id,
                        index: *index,
                    });
                }
            }
        }
        if seen.len() != self.params.len() {
            return Err(SyntaxTableError::UnusedParameter { id: self.id });
        }
        Ok(())
    }
}

fn template_pieces(template: &str) -> Vec<TemplatePiece> {
    tokenize(template, true)
        .significant()
        .into_iter()
        .map(|token| {
            let placeholder = token.token_type == TokenType::Variable
                && !token.value_text.is_empty()
                && token.value_text.chars().all(|ch| ch.is_ascii_digit());
            match placeholder.then(|| token.value_text.parse::<usize>().ok()).flatten() {
                Some(index) => TemplatePiece::Param(index),
                None => TemplatePiece::Literal(token.text),
            }
        })
        .collect()
}

#[derive(Debug, Error)]
pub enum SyntaxTableError {
    #[error("Failed to parse syntax table: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Syntax {id} references parameter ${index} which is not declared.")]
    UnknownPlaceholder { id: u32, index: usize },
    #[error("Syntax {id} references parameter ${index} more than once.")]
    DuplicatePlaceholder { id: u32, index: usize },
    #[error("Syntax {id} declares parameters its template never uses.")]
    UnusedParameter { id: u32 },
}

#[derive(Debug, Deserialize)]
struct SyntaxFile {
    syntaxes: Vec<CommandSyntax>,
}

fn parse_syntaxes(source: &str) -> Result<Vec<CommandSyntax>, SyntaxTableError> {
    let file: SyntaxFile = serde_json::from_str(source)?;
    let mut syntaxes = file.syntaxes;
    for syntax in &mut syntaxes {
        syntax.pieces = template_pieces(&syntax.template);
        syntax.validate()?;
    }
    Ok(syntaxes)
}

/// Read-only grammar for every known command, shared across compiles.
#[derive(Debug, Clone, Default)]
pub struct SyntaxTable {
    syntaxes: Vec<CommandSyntax>,
    candidates: Vec<usize>,
}

impl SyntaxTable {
    /// The table shipped with the compiler.
    pub fn builtin() -> Self {
        let syntaxes = parse_syntaxes(DEFAULT_SYNTAX_JSON).expect("embedded syntax table must be valid");
        Self::from_syntaxes(syntaxes)
    }

    /// Loads a table. Compiler-reserved commands missing from `source` are
    /// taken from the built-in table.
    pub fn from_json(source: &str) -> Result<Self, SyntaxTableError> {
        let mut syntaxes = parse_syntaxes(source)?;
        let present = syntaxes.iter().map(|syntax| syntax.id).collect::<BTreeSet<_>>();
        for syntax in parse_syntaxes(DEFAULT_SYNTAX_JSON)? {
            if syntax.id <= command_ids::LAST_RESERVED && !present.contains(&syntax.id) {
                syntaxes.push(syntax);
            }
        }
        Ok(Self::from_syntaxes(syntaxes))
    }

    pub fn from_syntaxes(syntaxes: Vec<CommandSyntax>) -> Self {
        let mut candidates = (0..syntaxes.len())
            .filter(|index| !command_ids::is_unmatchable(syntaxes[*index].id))
            .collect::<Vec<_>>();
        // Most specific templates first; free-form expressions last.
        candidates.sort_by_key(|index| {
            let syntax = &syntaxes[*index];
            (
                syntax.has_expression(),
                std::cmp::Reverse(syntax.literal_count()),
                *index,
            )
        });
        tracing::debug!(syntaxes = syntaxes.len(), "syntax table loaded");
        Self {
            syntaxes,
            candidates,
        }
    }

    pub fn len(&self) -> usize {
        self.syntaxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.syntaxes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CommandSyntax> {
        self.syntaxes.iter()
    }

    /// Syntax for `id`, preferring a variant available in `version`.
    pub fn get(&self, id: u32, version: GameVersion) -> Option<&CommandSyntax> {
        let mut fallback = None;
        for syntax in self.syntaxes.iter().filter(|syntax| syntax.id == id) {
            if syntax.supports(version) {
                return Some(syntax);
            }
            fallback.get_or_insert(syntax);
        }
        fallback
    }

    /// Matchable syntaxes in matching priority order.
    pub fn candidates(&self) -> impl Iterator<Item = &CommandSyntax> {
        self.candidates.iter().map(|index| &self.syntaxes[*index])
    }
}

#[cfg(test)]
mod syntax_tests {
    use super::*;

    #[test]
    fn builtin_table_contains_reserved_commands() {
        let table = SyntaxTable::builtin();
        for id in [
            command_ids::END,
            command_ids::ELSE,
            command_ids::EXPRESSION,
            command_ids::FOR_EACH,
            command_ids::ARRAY_GET,
            command_ids::HIDDEN_JUMP,
        ] {
            assert!(
                table.get(id, GameVersion::AlbionPrelude).is_some(),
                "missing {}",
                id
            );
        }
    }

    #[test]
    fn template_placeholders_become_param_pieces() {
        let syntax = CommandSyntax::new(
            200,
            "$0 $1 -> get sector",
            vec![ParameterType::RetVar, ParameterType::Var],
        );
        assert_eq!(
            syntax.pieces(),
            &[
                TemplatePiece::Param(0),
                TemplatePiece::Param(1),
                TemplatePiece::Literal("->".to_string()),
                TemplatePiece::Literal("get".to_string()),
                TemplatePiece::Literal("sector".to_string()),
            ]
        );
        assert_eq!(syntax.literal_count(), 3);
        assert_eq!(syntax.return_slot(), Some(0));
    }

    #[test]
    fn expression_syntaxes_are_tried_last() {
        let table = SyntaxTable::builtin();
        let last = table.candidates().last().expect("candidates");
        assert!(last.has_expression());
    }

    #[test]
    fn custom_table_inherits_reserved_commands() {
        let table = SyntaxTable::from_json(
            r#"{"syntaxes":[{"id":500,"template":"$0 wait $1 ms","params":[{"type":"RetVar"},{"type":"Number"}]}]}"#,
        )
        .expect("table loads");
        assert!(table.get(500, GameVersion::Reunion).is_some());
        assert!(table.get(command_ids::END, GameVersion::Reunion).is_some());
    }

    #[test]
    fn invalid_tables_are_rejected() {
        let unknown = SyntaxTable::from_json(
            r#"{"syntaxes":[{"id":500,"template":"wait $1 ms","params":[{"type":"Number"}]}]}"#,
        );
        assert!(matches!(
            unknown,
            Err(SyntaxTableError::UnknownPlaceholder { id: 500, index: 1 })
        ));

        let unused = SyntaxTable::from_json(
            r#"{"syntaxes":[{"id":501,"template":"wait ms","params":[{"type":"Number"}]}]}"#,
        );
        assert!(matches!(unused, Err(SyntaxTableError::UnusedParameter { id: 501 })));

        assert!(matches!(
            SyntaxTable::from_json("{"),
            Err(SyntaxTableError::Parse(_))
        ));
    }

    #[test]
    fn get_prefers_version_specific_variant() {
        let table = SyntaxTable::builtin();
        let modern = table
            .get(121, GameVersion::TerranConflict)
            .expect("modern variant");
        assert!(modern.template.contains("max upgrades"));
        let legacy = table.get(121, GameVersion::Reunion).expect("legacy variant");
        assert!(legacy.template.contains("maximum upgrades"));

        let fallback = table.get(122, GameVersion::Reunion).expect("fallback");
        assert!(!fallback.supports(GameVersion::Reunion));
    }

    #[test]
    fn return_slots_limit_conditionals() {
        assert!(ParameterType::RetVar.allows(Conditional::None));
        assert!(!ParameterType::RetVar.allows(Conditional::If));
        assert!(ParameterType::RetVarIf.allows(Conditional::SkipIfNot));
        assert!(!ParameterType::RetVarIf.allows(Conditional::Start));
        assert!(ParameterType::RetVarIfStart.allows(Conditional::Start));
    }
}
