//! Lexer for program scripts using logos with string interning.
//!
//! Produces a [`TokenList`] ending in [`TokenKind::Eof`]. Whitespace and
//! comments (`//` line, `/* */` block) are skipped. Identifiers and string
//! literal contents are interned.

use logos::Logos;
use tact_diagnostic::{Diagnostic, ErrorCode};
use tact_ir::{Span, SpanError, StringInterner, Token, TokenKind, TokenList};
use tracing::debug;

/// Raw token from logos (before interning).
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
enum RawToken {
    // === Unit keywords ===
    #[token("program")]
    Program,
    #[token("function")]
    Function,
    #[token("export")]
    Export,

    // === Statement keywords ===
    #[token("var")]
    Var,
    #[token("const")]
    Const,
    #[token("set")]
    Set,
    #[token("do")]
    Do,
    #[token("try")]
    Try,
    #[token("catch")]
    Catch,
    #[token("and")]
    And,
    #[token("if")]
    If,
    #[token("then")]
    Then,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("return")]
    Return,
    #[token("call")]
    Call,
    #[token("until")]
    Until,
    #[token("goto")]
    Goto,
    #[token("on")]
    On,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // === Type keywords ===
    #[token("int")]
    IntType,
    #[token("double")]
    DoubleType,
    #[token("bool")]
    BoolType,
    #[token("string")]
    StringType,

    // === Delimiters ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,

    // === Operators ===
    #[token("==")]
    EqEq,
    #[token("=")]
    Eq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token("<")]
    Lt,
    #[token(">=")]
    GtEq,
    #[token(">")]
    Gt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,

    // === Literals ===
    #[regex(r"[0-9][0-9_]*", |lex| lex.slice().replace('_', "").parse::<i64>().ok())]
    Int(i64),

    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*([eE][+-]?[0-9]+)?", |lex| {
        lex.slice().replace('_', "").parse::<f64>().ok()
    })]
    Float(f64),

    #[regex(r#""([^"\\]|\\.)*""#)]
    String,

    // Longest match prefers the terminated form whenever a closing quote exists.
    #[regex(r#""([^"\\]|\\.)*"#)]
    UnterminatedString,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

/// Errors raised while tokenizing.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("invalid character `{ch}`")]
    InvalidChar { ch: char, span: Span },
    #[error("unterminated string literal")]
    UnterminatedString { span: Span },
    #[error("invalid number literal `{text}`")]
    InvalidNumber { text: String, span: Span },
    #[error("source is too large to lex")]
    SourceTooLarge(#[from] SpanError),
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::InvalidChar { span, .. }
            | LexError::UnterminatedString { span }
            | LexError::InvalidNumber { span, .. } => *span,
            LexError::SourceTooLarge(_) => Span::DUMMY,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            LexError::InvalidChar { .. } | LexError::SourceTooLarge(_) => ErrorCode::E0001,
            LexError::UnterminatedString { .. } => ErrorCode::E0002,
            LexError::InvalidNumber { .. } => ErrorCode::E0003,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let label = match self {
            LexError::UnterminatedString { .. } => "string starts here",
            _ => "here",
        };
        Diagnostic::error(self.code())
            .with_message(self.to_string())
            .with_label(self.span(), label)
    }
}

/// Tokenize `source`, stopping at the first invalid token.
pub fn lex(source: &str, interner: &StringInterner) -> Result<TokenList, LexError> {
    let mut tokens = Vec::new();
    let mut logos = RawToken::lexer(source);

    while let Some(result) = logos.next() {
        let span = Span::try_from_range(logos.span())?;
        let slice = logos.slice();
        match result {
            Ok(raw) => tokens.push(Token::new(convert(raw, slice, span, interner)?, span)),
            Err(()) => return Err(classify_error(slice, span)),
        }
    }

    let end = u32::try_from(source.len()).map_err(|_| SpanError::EndTooLarge(source.len()))?;
    tokens.push(Token::new(TokenKind::Eof, Span::point(end)));
    debug!(count = tokens.len(), "lexed");
    Ok(TokenList::from_tokens(tokens))
}

#[cold]
#[inline(never)]
fn classify_error(slice: &str, span: Span) -> LexError {
    match slice.chars().next() {
        Some(c) if c.is_ascii_digit() => LexError::InvalidNumber {
            text: slice.to_string(),
            span,
        },
        Some(ch) => LexError::InvalidChar { ch, span },
        None => LexError::InvalidChar { ch: '\0', span },
    }
}

fn convert(
    raw: RawToken,
    slice: &str,
    span: Span,
    interner: &StringInterner,
) -> Result<TokenKind, LexError> {
    let kind = match raw {
        RawToken::Int(n) => TokenKind::Int(n),
        RawToken::Float(f) => TokenKind::Float(f.to_bits()),
        RawToken::String => {
            let content = &slice[1..slice.len() - 1];
            TokenKind::Str(interner.intern(&unescape_string(content)))
        }
        RawToken::UnterminatedString => {
            return Err(LexError::UnterminatedString {
                span: Span::new(span.start, span.start + 1),
            })
        }
        RawToken::Ident => TokenKind::Ident(interner.intern(slice)),

        RawToken::Program => TokenKind::Program,
        RawToken::Function => TokenKind::Function,
        RawToken::Export => TokenKind::Export,
        RawToken::Var => TokenKind::Var,
        RawToken::Const => TokenKind::Const,
        RawToken::Set => TokenKind::Set,
        RawToken::Do => TokenKind::Do,
        RawToken::Try => TokenKind::Try,
        RawToken::Catch => TokenKind::Catch,
        RawToken::And => TokenKind::And,
        RawToken::If => TokenKind::If,
        RawToken::Then => TokenKind::Then,
        RawToken::Else => TokenKind::Else,
        RawToken::While => TokenKind::While,
        RawToken::For => TokenKind::For,
        RawToken::Break => TokenKind::Break,
        RawToken::Continue => TokenKind::Continue,
        RawToken::Return => TokenKind::Return,
        RawToken::Call => TokenKind::Call,
        RawToken::Until => TokenKind::Until,
        RawToken::Goto => TokenKind::Goto,
        RawToken::On => TokenKind::On,
        RawToken::True => TokenKind::True,
        RawToken::False => TokenKind::False,

        RawToken::IntType => TokenKind::IntType,
        RawToken::DoubleType => TokenKind::DoubleType,
        RawToken::BoolType => TokenKind::BoolType,
        RawToken::StringType => TokenKind::StringType,

        RawToken::LParen => TokenKind::LParen,
        RawToken::RParen => TokenKind::RParen,
        RawToken::LBrace => TokenKind::LBrace,
        RawToken::RBrace => TokenKind::RBrace,
        RawToken::Comma => TokenKind::Comma,
        RawToken::Dot => TokenKind::Dot,
        RawToken::Colon => TokenKind::Colon,
        RawToken::Semicolon => TokenKind::Semicolon,

        RawToken::Eq => TokenKind::Eq,
        RawToken::EqEq => TokenKind::EqEq,
        RawToken::NotEq => TokenKind::NotEq,
        RawToken::Lt => TokenKind::Lt,
        RawToken::LtEq => TokenKind::LtEq,
        RawToken::Gt => TokenKind::Gt,
        RawToken::GtEq => TokenKind::GtEq,
        RawToken::Plus => TokenKind::Plus,
        RawToken::Minus => TokenKind::Minus,
        RawToken::Star => TokenKind::Star,
        RawToken::Slash => TokenKind::Slash,
        RawToken::Percent => TokenKind::Percent,
        RawToken::Bang => TokenKind::Bang,
        RawToken::AmpAmp => TokenKind::AmpAmp,
        RawToken::PipePipe => TokenKind::PipePipe,
    };
    Ok(kind)
}

/// Process string escape sequences. Unknown escapes are kept verbatim.
fn unescape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some('0') => result.push('\0'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }
    result
}
