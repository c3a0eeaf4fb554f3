use super::*;
use std::str::FromStr;

#[test]
fn test_every_code_in_exactly_one_phase() {
    for code in ErrorCode::ALL {
        let phases = [
            code.is_lexer_error(),
            code.is_syntax_error(),
            code.is_construction_error(),
            code.is_warning(),
        ];
        assert_eq!(
            phases.iter().filter(|p| **p).count(),
            1,
            "{code} must belong to exactly one phase"
        );
    }
}

#[test]
fn test_from_str_round_trips_all() {
    for code in ErrorCode::ALL {
        assert_eq!(ErrorCode::from_str(code.as_str()), Ok(*code));
    }
    assert_eq!(ErrorCode::from_str("e2005"), Ok(ErrorCode::E2005));
    assert_eq!(ErrorCode::from_str("w2001"), Ok(ErrorCode::W2001));
    assert_eq!(ErrorCode::from_str("E9999"), Err(()));
}

#[test]
fn test_descriptions_are_distinct() {
    let mut seen = std::collections::HashSet::new();
    for code in ErrorCode::ALL {
        assert!(seen.insert(code.description()), "{code}");
    }
}
