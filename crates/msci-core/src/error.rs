use std::panic::Location;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One compiler diagnostic against a source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("line {line}: {code}: {message}")]
pub struct ErrorToken {
    pub code: String,
    pub line: usize,
    pub message: String,
    pub text: String,
}

impl ErrorToken {
    pub fn new(
        code: impl Into<String>,
        line: usize,
        message: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            line,
            message: message.into(),
            text: text.into(),
        }
    }
}

/// Ordered diagnostics of one compile. Insertion order is reporting order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorArray {
    errors: Vec<ErrorToken>,
}

impl ErrorArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ErrorToken) {
        self.errors.push(error);
    }

    pub fn report(
        &mut self,
        code: &str,
        line: usize,
        message: impl Into<String>,
        text: impl Into<String>,
    ) {
        self.push(ErrorToken::new(code, line, message, text));
    }

    pub fn extend(&mut self, other: ErrorArray) {
        self.errors.extend(other.errors);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ErrorToken> {
        self.errors.iter()
    }

    pub fn as_slice(&self) -> &[ErrorToken] {
        &self.errors
    }

    pub fn into_vec(self) -> Vec<ErrorToken> {
        self.errors
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.errors.iter().any(|error| error.code == code)
    }
}

impl<'a> IntoIterator for &'a ErrorArray {
    type Item = &'a ErrorToken;
    type IntoIter = std::slice::Iter<'a, ErrorToken>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// An internal invariant violation. Never produced by malformed scripts.
#[derive(Debug, Clone, Error)]
#[error("internal compiler error at {}:{}: {message}", location.file(), location.line())]
pub struct CompilerFault {
    pub message: String,
    pub location: &'static Location<'static>,
}

impl CompilerFault {
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: Location::caller(),
        }
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn error_array_keeps_insertion_order() {
        let mut errors = ErrorArray::new();
        errors.report("B", 3, "second", "x");
        errors.report("A", 1, "first", "y");
        let lines = errors.iter().map(|error| error.line).collect::<Vec<_>>();
        assert_eq!(lines, vec![3, 1]);
        assert!(errors.has_code("A"));
        assert!(!errors.has_code("C"));
    }

    #[test]
    fn error_token_display_includes_line_and_code() {
        let error = ErrorToken::new("LOGIC_END_UNMATCHED", 4, "bad end", "end");
        assert_eq!(error.to_string(), "line 4: LOGIC_END_UNMATCHED: bad end");
    }

    #[test]
    fn compiler_fault_records_caller_location() {
        let fault = CompilerFault::new("boom");
        assert!(fault.location.file().ends_with("error.rs"));
        assert!(fault.to_string().contains("boom"));
    }

    #[test]
    fn error_array_serializes_as_plain_list() {
        let mut errors = ErrorArray::new();
        errors.report("X", 2, "msg", "text");
        let json = serde_json::to_value(&errors).expect("serialize");
        assert!(json.is_array());
        assert_eq!(json[0]["line"], 2);
    }
}
