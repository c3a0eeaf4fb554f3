//! The `explain` command: describe an error code.

use tact_diagnostic::ErrorCode;

pub fn explain_error(code_str: &str) {
    let Ok(code) = code_str.parse::<ErrorCode>() else {
        eprintln!("Unknown error code: {code_str}");
        eprintln!();
        eprintln!("Codes have the format EXXXX or WXXXX where X is a digit.");
        eprintln!("Examples: E0001, E1001, E2005, W2001");
        std::process::exit(1);
    };

    println!("{code}: {}", code.description());
    println!();
    if code.is_warning() {
        println!("Reported after graph construction. The unit still builds.");
        return;
    }

    let phase = if code.is_lexer_error() {
        "lexing"
    } else if code.is_syntax_error() {
        "parsing"
    } else {
        "graph construction"
    };
    println!("Reported during {phase}. The unit containing the error is not built;");
    println!("the other units of the script are unaffected.");
}
