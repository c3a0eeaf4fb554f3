#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::ErrorCode;
use pretty_assertions::assert_eq;
use tact_ir::Span;

fn sample_diagnostic() -> Diagnostic {
    Diagnostic::error(ErrorCode::E2005)
        .with_message("`break` outside of a loop")
        .with_label(Span::new(15, 20), "no enclosing loop")
        .with_note("break jumps to the exit of the innermost loop")
}

#[test]
fn test_no_color_without_source() {
    let mut output = Vec::new();
    let mut emitter = TerminalEmitter::with_color_mode(&mut output, ColorMode::Never, false);
    emitter.emit(&sample_diagnostic());
    emitter.flush();

    let text = String::from_utf8(output).unwrap();
    assert!(text.starts_with("error[E2005]: `break` outside of a loop\n"));
    assert!(text.contains("--> 15..20: no enclosing loop"));
    assert!(text.contains("= note: break jumps"));
    assert!(!text.contains("\x1b["));
}

#[test]
fn test_with_source_renders_line_and_caret() {
    let source = "program p {\n  break\n}\n";
    let diag = Diagnostic::error(ErrorCode::E2005)
        .with_message("`break` outside of a loop")
        .with_label(Span::new(14, 19), "no enclosing loop");

    let mut output = Vec::new();
    let mut emitter = TerminalEmitter::with_color_mode(&mut output, ColorMode::Never, false)
        .with_source("demo.tact", source);
    emitter.emit(&diag);

    let text = String::from_utf8(output).unwrap();
    assert_eq!(
        text,
        "error[E2005]: `break` outside of a loop\n\
         \x20 --> demo.tact:2:3\n\
         \x20 |\n\
         2 |   break\n\
         \x20 |   ^^^^^ no enclosing loop\n\
         \n"
    );
}

#[test]
fn test_colors_when_forced() {
    let mut output = Vec::new();
    let mut emitter = TerminalEmitter::with_color_mode(&mut output, ColorMode::Always, false);
    emitter.emit(&sample_diagnostic());
    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("\x1b["));
    assert!(text.contains("E2005"));
}

#[test]
fn test_auto_mode_follows_tty() {
    assert!(ColorMode::Auto.should_use_colors(true));
    assert!(!ColorMode::Auto.should_use_colors(false));
    assert!(ColorMode::Always.should_use_colors(false));
    assert!(!ColorMode::Never.should_use_colors(true));
}

#[test]
fn test_summary() {
    let mut output = Vec::new();
    let mut emitter = TerminalEmitter::with_color_mode(&mut output, ColorMode::Never, false);
    emitter.emit_summary(2, 1);
    emitter.emit_summary(0, 0);
    emitter.emit_summary(0, 3);
    let text = String::from_utf8(output).unwrap();
    assert_eq!(
        text,
        "error: aborting due to 2 previous errors; 1 warning emitted\nwarning: 3 warnings emitted\n"
    );
}

#[test]
fn test_emit_all_renders_each() {
    let mut output = Vec::new();
    let mut emitter = TerminalEmitter::with_color_mode(&mut output, ColorMode::Never, false);
    emitter.emit_all(&[
        Diagnostic::error(ErrorCode::E1001).with_message("first"),
        Diagnostic::error(ErrorCode::E2002).with_message("second"),
    ]);
    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("error[E1001]: first"));
    assert!(text.contains("error[E2002]: second"));
}
