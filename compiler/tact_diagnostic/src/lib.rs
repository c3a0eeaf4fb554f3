//! Diagnostic system for script errors.
//!
//! Every error the lexer and parser report becomes a [`Diagnostic`]:
//! - an [`ErrorCode`] for searchability
//! - a message saying what went wrong
//! - a primary span saying where
//! - optional secondary labels and notes
//!
//! Rendering lives in [`emitter`]; line/column conversion in [`span_utils`].

mod diagnostic;
pub mod emitter;
mod error_code;
pub mod span_utils;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
