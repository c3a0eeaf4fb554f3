//! The `graph` command: print the command graphs built from a script.

use super::{build, cycle_warnings, load_component, read_file, report, ParseMode};
use crate::render;
use std::path::Path;
use tact_diagnostic::emitter::ColorMode;
use tact_ir::StringInterner;
use tact_parse::ParseOptions;

/// Print every graph that built, then report the units that did not.
pub fn graph_file(
    path: &Path,
    component: Option<&Path>,
    mode: ParseMode,
    options: &ParseOptions,
    color: ColorMode,
) {
    let source = read_file(path);
    let interner = StringInterner::new();
    let component = load_component(component, &interner);
    let built = build(path, &source, &interner, &component, mode, options, color);

    let rendered = built
        .programs
        .iter()
        .map(|program| render::program(&interner, program))
        .chain(
            built
                .functions
                .iter()
                .map(|function| render::function(&interner, function)),
        );
    for (index, text) in rendered.enumerate() {
        if index > 0 {
            println!();
        }
        print!("{text}");
    }

    let warnings = cycle_warnings(&built, &interner);
    if report(path, &source, &built.errors, &warnings, color) {
        std::process::exit(1);
    }
}
