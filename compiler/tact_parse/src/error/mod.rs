//! Parse and construction errors.
//!
//! Syntax errors and graph-construction errors share one positional channel:
//! both abort the unit they occur in and carry the span of the offending
//! token.

use tact_diagnostic::{Diagnostic, ErrorCode};
use tact_ir::{Span, TokenKind};

/// An error that discards the unit it was raised in.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub code: ErrorCode,
    pub message: String,
    /// Location of the offending token or construct.
    pub span: Span,
    /// A related location, such as the first of two duplicate definitions.
    pub related: Option<(Span, String)>,
    pub notes: Vec<String>,
}

impl ParseError {
    #[cold]
    pub fn new(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        ParseError {
            code,
            message: message.into(),
            span,
            related: None,
            notes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_related(mut self, span: Span, message: impl Into<String>) -> Self {
        self.related = Some((span, message.into()));
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// `expected X, found Y`.
    #[cold]
    pub fn unexpected(expected: &str, found: &TokenKind, span: Span) -> Self {
        ParseError::new(
            ErrorCode::E1001,
            format!("expected {expected}, found {}", found.display_name()),
            span,
        )
    }

    #[cold]
    pub fn unknown_name(what: &str, name: &str, span: Span) -> Self {
        ParseError::new(ErrorCode::E2001, format!("unknown {what} `{name}`"), span)
    }

    #[cold]
    pub fn type_mismatch(expected: &str, found: &str, span: Span) -> Self {
        ParseError::new(
            ErrorCode::E2006,
            format!("type mismatch: expected `{expected}`, found `{found}`"),
            span,
        )
    }

    #[cold]
    pub fn argument_count(callee: &str, expected: usize, found: usize, span: Span) -> Self {
        let s = if expected == 1 { "" } else { "s" };
        ParseError::new(
            ErrorCode::E2007,
            format!("`{callee}` takes {expected} argument{s}, but {found} were given"),
            span,
        )
    }

    /// Convert to a diagnostic for rendering.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.code)
            .with_message(self.message.clone())
            .with_label(self.span, self.code.description());
        if let Some((span, message)) = &self.related {
            diag = diag.with_secondary_label(*span, message.clone());
        }
        for note in &self.notes {
            diag = diag.with_note(note.clone());
        }
        diag
    }
}

#[cfg(test)]
mod tests;
