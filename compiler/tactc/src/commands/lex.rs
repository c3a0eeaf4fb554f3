//! The `lex` command: print the token stream of a script.

use super::{lex_or_exit, read_file};
use std::path::Path;
use tact_diagnostic::emitter::ColorMode;
use tact_diagnostic::span_utils::LineOffsetTable;
use tact_ir::{StringInterner, TokenKind};

pub fn lex_file(path: &Path, color: ColorMode) {
    let source = read_file(path);
    let interner = StringInterner::new();
    let tokens = lex_or_exit(path, &source, &interner, color);
    let lines = LineOffsetTable::build(&source);

    for token in tokens.iter() {
        let (line, col) = lines.offset_to_line_col(&source, token.span.start);
        let text = match token.kind {
            TokenKind::Ident(name) => format!("identifier `{}`", interner.lookup(name)),
            TokenKind::Str(name) => format!("string {:?}", &*interner.lookup(name)),
            TokenKind::Int(value) => format!("integer {value}"),
            TokenKind::Float(bits) => format!("float {:?}", f64::from_bits(bits)),
            ref other => other.display_name().to_string(),
        };
        println!("{line:>4}:{col:<3} {text}");
    }
}
