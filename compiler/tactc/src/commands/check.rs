//! The `check` command: build every unit of a script and report errors.

use super::{build, cycle_warnings, load_component, read_file, report, ParseMode};
use std::path::Path;
use tact_diagnostic::emitter::ColorMode;
use tact_ir::StringInterner;
use tact_parse::ParseOptions;

/// Build a script and print a one-line summary when nothing failed.
///
/// Graphs with a cycle of always-true edges are reported as warnings.
pub fn check_file(path: &Path, component: Option<&Path>, mode: ParseMode, color: ColorMode) {
    let source = read_file(path);
    let interner = StringInterner::new();
    let component = load_component(component, &interner);
    let built = build(
        path,
        &source,
        &interner,
        &component,
        mode,
        &ParseOptions::default(),
        color,
    );

    let warnings = cycle_warnings(&built, &interner);
    if report(path, &source, &built.errors, &warnings, color) {
        std::process::exit(1);
    }

    let programs = built.programs.len();
    let functions = built.functions.len();
    println!(
        "OK: {} ({programs} program{}, {functions} function{})",
        path.display(),
        plural_s(programs),
        plural_s(functions)
    );
}

fn plural_s(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
