use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const KEYWORDS: &[&str] = &[
    "if", "not", "while", "skip", "else", "end", "break", "continue", "return", "gosub",
    "endsub", "goto", "START", "dim", "for", "each", "in", "to", "step",
];

const SYMBOL_OPERATORS: &[&str] = &[
    "==", "!=", "<=", ">=", "<", ">", "=", "+", "-", "*", "/", "&", "|", "^", "!", "~", "(", ")",
    "[", "]", ",",
];

const WORD_OPERATORS: &[&str] = &["mod", "AND", "OR"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenType {
    Keyword,
    Variable,
    Label,
    Number,
    String,
    Text,
    BinaryOp,
    UnaryOp,
    Null,
    GameObject,
    ScriptObject,
    Comment,
    Whitespace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub token_type: TokenType,
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub value_text: String,
}

impl Token {
    /// Builds a token that does not originate from a source line.
    pub fn synthetic(token_type: TokenType, text: impl Into<String>) -> Self {
        let text = text.into();
        let value_text = value_text_for(token_type, &text);
        Self {
            token_type,
            start: 0,
            end: text.len(),
            text,
            value_text,
        }
    }

    pub fn is_significant(&self) -> bool {
        !matches!(self.token_type, TokenType::Whitespace | TokenType::Comment)
    }

    pub fn is_operator(&self) -> bool {
        matches!(self.token_type, TokenType::BinaryOp | TokenType::UnaryOp)
    }

    pub fn is_operand(&self) -> bool {
        matches!(
            self.token_type,
            TokenType::Variable
                | TokenType::Number
                | TokenType::String
                | TokenType::Null
                | TokenType::GameObject
                | TokenType::ScriptObject
        )
    }

    pub fn is(&self, token_type: TokenType, text: &str) -> bool {
        self.token_type == token_type && self.text == text
    }
}

/// Tokens of one line, contiguous from offset 0 to the end of the line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenArray {
    tokens: Vec<Token>,
}

impl TokenArray {
    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }

    /// Token whose `[start, end)` contains `index`.
    pub fn find(&self, index: usize) -> Option<&Token> {
        self.tokens
            .iter()
            .find(|token| token.start <= index && index < token.end)
    }

    pub fn significant(&self) -> Vec<Token> {
        self.tokens
            .iter()
            .filter(|token| token.is_significant())
            .cloned()
            .collect()
    }

    pub fn comment(&self) -> Option<&Token> {
        self.tokens
            .iter()
            .find(|token| token.token_type == TokenType::Comment)
    }
}

impl<'a> IntoIterator for &'a TokenArray {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

/// Splits one line into tokens.
///
/// With `read_only` set, a `*` comment line becomes a single comment token.
/// Otherwise only the `*` marker is a comment and the remainder is lexed as
/// code, so that commented-out commands can still be recognised.
pub fn tokenize(line: &str, read_only: bool) -> TokenArray {
    let mut lexer = Lexer {
        line,
        position: 0,
        tokens: Vec::new(),
    };
    lexer.run(read_only);
    TokenArray {
        tokens: lexer.tokens,
    }
}

struct Lexer<'a> {
    line: &'a str,
    position: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn run(&mut self, read_only: bool) {
        let leading = whitespace_len(self.line);
        if leading > 0 {
            self.push(TokenType::Whitespace, leading);
        }
        if self.line[self.position..].starts_with('*') {
            let length = if read_only {
                self.line.len() - self.position
            } else {
                1
            };
            self.push(TokenType::Comment, length);
        }

        while self.position < self.line.len() {
            let rest = &self.line[self.position..];
            let (token_type, length) = self.classify(rest);
            self.push(token_type, length);
        }
    }

    fn push(&mut self, token_type: TokenType, length: usize) {
        let start = self.position;
        let end = start + length;
        let text = self.line[start..end].to_string();
        let value_text = value_text_for(token_type, &text);
        self.tokens.push(Token {
            token_type,
            start,
            end,
            text,
            value_text,
        });
        self.position = end;
    }

    fn classify(&self, rest: &str) -> (TokenType, usize) {
        let whitespace = whitespace_len(rest);
        if whitespace > 0 {
            return (TokenType::Whitespace, whitespace);
        }
        if let Some(length) = match_string(rest) {
            return (TokenType::String, length);
        }
        if let Some(length) = match_number(rest) {
            return (TokenType::Number, length);
        }
        if let Some(found) = match_keyword(rest) {
            return found;
        }
        if let Some(found) = label_regex().find(rest) {
            return (TokenType::Label, found.end());
        }
        if let Some(found) = self.match_operator(rest) {
            return found;
        }
        if let Some(found) = variable_regex().find(rest) {
            return (TokenType::Variable, found.end());
        }
        if rest.starts_with('{') {
            let length = rest.find('}').map(|index| index + 1).unwrap_or(rest.len());
            return (TokenType::GameObject, length);
        }
        if let Some(found) = script_object_regex().find(rest) {
            return (TokenType::ScriptObject, found.end());
        }
        match text_regex().find(rest) {
            Some(found) => (TokenType::Text, found.end()),
            None => (
                TokenType::Text,
                rest.chars().next().map(char::len_utf8).unwrap_or(rest.len()),
            ),
        }
    }

    fn match_operator(&self, rest: &str) -> Option<(TokenType, usize)> {
        if let Some(found) = word_regex().find(rest) {
            let word = found.as_str();
            if WORD_OPERATORS.contains(&word) && !continues_identifier(&rest[found.end()..]) {
                return Some((TokenType::BinaryOp, found.end()));
            }
            return None;
        }
        if rest.starts_with("->") {
            return None;
        }
        // `[NAME]` is a script object, not an index bracket.
        if rest.starts_with('[') && script_object_regex().is_match(rest) {
            return None;
        }

        let symbol = SYMBOL_OPERATORS
            .iter()
            .find(|symbol| rest.starts_with(**symbol))?;
        let token_type = match *symbol {
            "!" | "~" => TokenType::UnaryOp,
            "-" if !self.operand_precedes() => TokenType::UnaryOp,
            _ => TokenType::BinaryOp,
        };
        Some((token_type, symbol.len()))
    }

    fn operand_precedes(&self) -> bool {
        match self.tokens.iter().rev().find(|token| token.is_significant()) {
            None => false,
            Some(token) => match token.token_type {
                TokenType::BinaryOp | TokenType::UnaryOp => {
                    token.text == ")" || token.text == "]"
                }
                TokenType::Keyword | TokenType::Text | TokenType::Label => false,
                _ => true,
            },
        }
    }
}

fn value_text_for(token_type: TokenType, text: &str) -> String {
    match token_type {
        TokenType::String => {
            let inner = text.strip_prefix('\'').unwrap_or(text);
            inner.strip_suffix('\'').unwrap_or(inner).to_string()
        }
        TokenType::Variable => text.trim_start_matches('$').to_string(),
        TokenType::Label => text.trim_end_matches(':').to_string(),
        TokenType::GameObject => {
            let inner = text.strip_prefix('{').unwrap_or(text);
            inner.strip_suffix('}').unwrap_or(inner).to_string()
        }
        TokenType::ScriptObject => text
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string(),
        TokenType::Comment => text.trim_start_matches('*').trim().to_string(),
        _ => text.to_string(),
    }
}

fn whitespace_len(text: &str) -> usize {
    text.len() - text.trim_start_matches([' ', '\t', '\r']).len()
}

fn continues_identifier(rest: &str) -> bool {
    rest.chars()
        .next()
        .map(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '.')
        .unwrap_or(false)
}

fn match_string(rest: &str) -> Option<usize> {
    let body = rest.strip_prefix('\'')?;
    Some(match body.find('\'') {
        Some(index) => index + 2,
        None => rest.len(),
    })
}

fn match_number(rest: &str) -> Option<usize> {
    let found = number_regex().find(rest)?;
    if continues_identifier(&rest[found.end()..]) {
        return None;
    }
    Some(found.end())
}

fn match_keyword(rest: &str) -> Option<(TokenType, usize)> {
    let found = word_regex().find(rest)?;
    let after = &rest[found.end()..];
    if continues_identifier(after) || after.starts_with(':') || after.starts_with('(') {
        return None;
    }
    let word = found.as_str();
    if word == "null" {
        return Some((TokenType::Null, found.end()));
    }
    KEYWORDS
        .contains(&word)
        .then_some((TokenType::Keyword, found.end()))
}

fn word_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[A-Za-z]+").expect("word regex"))
}

fn number_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[0-9]+").expect("number regex"))
}

fn label_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*:").expect("label regex"))
}

fn variable_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^\$[A-Za-z0-9_.]+").expect("variable regex"))
}

fn script_object_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^\[[A-Za-z_][A-Za-z0-9_ .]*\]").expect("script object regex"))
}

fn text_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[^\s=,()'\[\]]+").expect("text regex"))
}

#[cfg(test)]
mod lexer_tests {
    use super::*;

    fn kinds(line: &str) -> Vec<(TokenType, String)> {
        tokenize(line, false)
            .iter()
            .filter(|token| token.is_significant())
            .map(|token| (token.token_type, token.text.clone()))
            .collect()
    }

    #[test]
    fn tokens_cover_the_whole_line_without_gaps() {
        let line = "  $s = $ship -> get sector  ";
        let tokens = tokenize(line, false);
        let mut expected_start = 0;
        for token in &tokens {
            assert_eq!(token.start, expected_start);
            expected_start = token.end;
        }
        assert_eq!(expected_start, line.len());
    }

    #[test]
    fn classifies_expression_tokens() {
        assert_eq!(
            kinds("if not $a == -1 AND $b"),
            vec![
                (TokenType::Keyword, "if".to_string()),
                (TokenType::Keyword, "not".to_string()),
                (TokenType::Variable, "$a".to_string()),
                (TokenType::BinaryOp, "==".to_string()),
                (TokenType::UnaryOp, "-".to_string()),
                (TokenType::Number, "1".to_string()),
                (TokenType::BinaryOp, "AND".to_string()),
                (TokenType::Variable, "$b".to_string()),
            ]
        );
    }

    #[test]
    fn minus_after_operand_is_binary() {
        let tokens = kinds("$a - 1");
        assert_eq!(tokens[1], (TokenType::BinaryOp, "-".to_string()));
        let tokens = kinds("($a) - 1");
        assert_eq!(tokens[3], (TokenType::BinaryOp, "-".to_string()));
    }

    #[test]
    fn arrow_is_text_not_operator() {
        let tokens = kinds("$ship -> get name");
        assert_eq!(tokens[1], (TokenType::Text, "->".to_string()));
        assert_eq!(tokens[2], (TokenType::Text, "get".to_string()));
    }

    #[test]
    fn keyword_followed_by_bracket_is_text() {
        let tokens = kinds("if($a)");
        assert_eq!(tokens[0], (TokenType::Text, "if".to_string()));
        assert_eq!(tokens[1], (TokenType::BinaryOp, "(".to_string()));
    }

    #[test]
    fn labels_objects_and_strings_keep_value_text() {
        let tokens = tokenize("gosub Main.Loop: {Argon Federation} [THIS] 'hi there' null", false)
            .significant();
        assert_eq!(tokens[1].token_type, TokenType::Label);
        assert_eq!(tokens[1].value_text, "Main.Loop");
        assert_eq!(tokens[2].token_type, TokenType::GameObject);
        assert_eq!(tokens[2].value_text, "Argon Federation");
        assert_eq!(tokens[3].token_type, TokenType::ScriptObject);
        assert_eq!(tokens[3].value_text, "THIS");
        assert_eq!(tokens[4].token_type, TokenType::String);
        assert_eq!(tokens[4].value_text, "hi there");
        assert_eq!(tokens[5].token_type, TokenType::Null);
    }

    #[test]
    fn index_brackets_are_operators() {
        assert_eq!(
            kinds("$x = $arr[$i]"),
            vec![
                (TokenType::Variable, "$x".to_string()),
                (TokenType::BinaryOp, "=".to_string()),
                (TokenType::Variable, "$arr".to_string()),
                (TokenType::BinaryOp, "[".to_string()),
                (TokenType::Variable, "$i".to_string()),
                (TokenType::BinaryOp, "]".to_string()),
            ]
        );
    }

    #[test]
    fn unterminated_string_runs_to_end_of_line() {
        let tokens = tokenize("$a = 'open", false).significant();
        assert_eq!(tokens[2].token_type, TokenType::String);
        assert_eq!(tokens[2].value_text, "open");
    }

    #[test]
    fn carriage_return_is_whitespace() {
        let tokens = tokenize("if $a\r", false);
        assert_eq!(tokens.significant().len(), 2);
        let last = tokens.as_slice().last().map(|token| token.token_type);
        assert_eq!(last, Some(TokenType::Whitespace));
    }

    #[test]
    fn unterminated_object_runs_to_end_of_line() {
        let tokens = tokenize("$a = {SS_SH_OTAS", false).significant();
        assert_eq!(tokens[2].token_type, TokenType::GameObject);
        assert_eq!(tokens[2].value_text, "SS_SH_OTAS");
    }

    #[test]
    fn numbers_followed_by_letters_are_text() {
        assert_eq!(kinds("2nd")[0].0, TokenType::Text);
        assert_eq!(kinds("42")[0].0, TokenType::Number);
    }

    #[test]
    fn comment_modes_differ() {
        let read_only = tokenize("* $a = 1", true);
        assert_eq!(read_only.len(), 1);
        assert_eq!(read_only.as_slice()[0].token_type, TokenType::Comment);

        let lenient = tokenize("* $a = 1", false);
        assert_eq!(lenient.as_slice()[0].token_type, TokenType::Comment);
        assert_eq!(lenient.significant().len(), 3);
    }

    #[test]
    fn find_returns_token_under_caret() {
        let tokens = tokenize("$a = 10", false);
        assert_eq!(tokens.find(0).map(|token| token.text.as_str()), Some("$a"));
        assert_eq!(tokens.find(5).map(|token| token.text.as_str()), Some("10"));
        assert!(tokens.find(7).is_none());
    }

    #[test]
    fn word_operators_need_boundaries() {
        assert_eq!(kinds("$a mod 2")[1], (TokenType::BinaryOp, "mod".to_string()));
        assert_eq!(kinds("model")[0], (TokenType::Text, "model".to_string()));
    }
}
