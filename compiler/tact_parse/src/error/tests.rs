use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_unexpected_message() {
    let err = ParseError::unexpected("`{`", &TokenKind::Semicolon, Span::new(4, 5));
    assert_eq!(err.code, ErrorCode::E1001);
    assert_eq!(err.to_string(), "expected `{`, found ;");
}

#[test]
fn test_argument_count_pluralizes() {
    let one = ParseError::argument_count("grip", 1, 3, Span::DUMMY);
    let two = ParseError::argument_count("move", 2, 0, Span::DUMMY);
    assert_eq!(one.message, "`grip` takes 1 argument, but 3 were given");
    assert_eq!(two.message, "`move` takes 2 arguments, but 0 were given");
}

#[test]
fn test_to_diagnostic_carries_related_and_notes() {
    let err = ParseError::new(ErrorCode::E2003, "label `top` is defined twice", Span::new(30, 33))
        .with_related(Span::new(2, 5), "first defined here")
        .with_note("labels are unique within their graph");
    let diag = err.to_diagnostic();

    assert_eq!(diag.code, ErrorCode::E2003);
    assert_eq!(diag.message, "label `top` is defined twice");
    assert_eq!(diag.labels.len(), 2);
    assert!(diag.labels[0].is_primary);
    assert_eq!(diag.labels[1].span, Span::new(2, 5));
    assert_eq!(diag.notes, vec!["labels are unique within their graph".to_string()]);
}
