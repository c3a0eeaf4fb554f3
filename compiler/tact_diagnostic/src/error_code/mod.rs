//! Error codes for all script diagnostics.
//!
//! The first digit names the phase that raised the error.

use std::fmt;

/// Error codes for all script diagnostics.
///
/// Format: E#### where the first digit indicates phase:
/// - E0xxx: Lexer errors
/// - E1xxx: Syntax errors
/// - E2xxx: Construction errors (names, types, jumps, linking)
/// - W2xxx: Construction warnings
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Lexer Errors (E0xxx)
    /// Invalid character in source
    E0001,
    /// Unterminated string literal
    E0002,
    /// Invalid number literal
    E0003,

    // Syntax Errors (E1xxx)
    /// Unexpected token
    E1001,
    /// Expected expression
    E1002,
    /// Expected identifier
    E1003,
    /// Expected type
    E1004,
    /// Constructs nested too deeply
    E1005,

    // Construction Errors (E2xxx)
    /// Unknown name
    E2001,
    /// Unknown function
    E2002,
    /// Duplicate label
    E2003,
    /// Duplicate definition
    E2004,
    /// Jump outside a matching construct
    E2005,
    /// Type mismatch
    E2006,
    /// Argument count mismatch
    E2007,
    /// Unknown jump label
    E2008,
    /// Assignment to a constant
    E2009,
    /// Unknown return label
    E2010,
    /// Wrong kind of unit for this entry point
    E2011,

    // Warnings (W2xxx)
    /// Cycle without a guard
    W2001,
}

impl ErrorCode {
    /// All error code variants, for exhaustive testing.
    pub const ALL: &[ErrorCode] = &[
        ErrorCode::E0001,
        ErrorCode::E0002,
        ErrorCode::E0003,
        ErrorCode::E1001,
        ErrorCode::E1002,
        ErrorCode::E1003,
        ErrorCode::E1004,
        ErrorCode::E1005,
        ErrorCode::E2001,
        ErrorCode::E2002,
        ErrorCode::E2003,
        ErrorCode::E2004,
        ErrorCode::E2005,
        ErrorCode::E2006,
        ErrorCode::E2007,
        ErrorCode::E2008,
        ErrorCode::E2009,
        ErrorCode::E2010,
        ErrorCode::E2011,
        ErrorCode::W2001,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E0001 => "E0001",
            ErrorCode::E0002 => "E0002",
            ErrorCode::E0003 => "E0003",
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E1004 => "E1004",
            ErrorCode::E1005 => "E1005",
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E2005 => "E2005",
            ErrorCode::E2006 => "E2006",
            ErrorCode::E2007 => "E2007",
            ErrorCode::E2008 => "E2008",
            ErrorCode::E2009 => "E2009",
            ErrorCode::E2010 => "E2010",
            ErrorCode::E2011 => "E2011",
            ErrorCode::W2001 => "W2001",
        }
    }

    /// One-line description, used by `tactc explain`.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E0001 => "invalid character",
            ErrorCode::E0002 => "unterminated string literal",
            ErrorCode::E0003 => "invalid number literal",
            ErrorCode::E1001 => "unexpected token",
            ErrorCode::E1002 => "expected expression",
            ErrorCode::E1003 => "expected identifier",
            ErrorCode::E1004 => "expected type",
            ErrorCode::E1005 => "constructs nested too deeply",
            ErrorCode::E2001 => "unknown name",
            ErrorCode::E2002 => "unknown function",
            ErrorCode::E2003 => "duplicate label",
            ErrorCode::E2004 => "duplicate definition",
            ErrorCode::E2005 => "jump outside a matching construct",
            ErrorCode::E2006 => "type mismatch",
            ErrorCode::E2007 => "argument count mismatch",
            ErrorCode::E2008 => "unknown jump label",
            ErrorCode::E2009 => "assignment to a constant",
            ErrorCode::E2010 => "unknown return label",
            ErrorCode::E2011 => "wrong kind of unit for this entry point",
            ErrorCode::W2001 => "cycle without a guard",
        }
    }

    pub fn is_lexer_error(&self) -> bool {
        self.as_str().starts_with("E0")
    }

    pub fn is_syntax_error(&self) -> bool {
        self.as_str().starts_with("E1")
    }

    pub fn is_construction_error(&self) -> bool {
        self.as_str().starts_with("E2")
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, ErrorCode::W2001)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse a code string like `"E2001"` or `"W2001"`. Case-insensitive.
impl std::str::FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        Self::ALL
            .iter()
            .find(|code| code.as_str() == upper)
            .copied()
            .ok_or(())
    }
}

#[cfg(test)]
mod tests;
