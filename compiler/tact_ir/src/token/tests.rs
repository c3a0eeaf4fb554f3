use super::*;

#[test]
fn test_from_tokens_appends_eof() {
    let list = TokenList::from_tokens(vec![Token::new(TokenKind::Do, Span::new(0, 2))]);
    assert_eq!(list.len(), 2);
    assert_eq!(list[1].kind, TokenKind::Eof);
    assert_eq!(list[1].span, Span::point(2));
}

#[test]
fn test_from_tokens_keeps_existing_eof() {
    let list = TokenList::from_tokens(vec![Token::new(TokenKind::Eof, Span::point(0))]);
    assert_eq!(list.len(), 1);
}

#[test]
fn test_display_names() {
    assert_eq!(TokenKind::While.display_name(), "while");
    assert_eq!(TokenKind::AmpAmp.display_name(), "&&");
    assert_eq!(TokenKind::Ident(Name::EMPTY).display_name(), "identifier");
    assert_eq!(TokenKind::Eof.to_string(), "end of file");
}

#[test]
fn test_same_kind_ignores_payload() {
    let a = TokenKind::Int(1);
    let b = TokenKind::Int(2);
    assert!(a.same_kind(&b));
    assert!(!a.same_kind(&TokenKind::Float(0)));
}
