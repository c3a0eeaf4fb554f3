//! Subcommand implementations.
//!
//! Every command reads the script, reports problems through the terminal
//! emitter and exits with status 1 when anything failed.

mod check;
mod explain;
mod graph;
mod lex;

pub use check::check_file;
pub use explain::explain_error;
pub use graph::graph_file;
pub use lex::lex_file;

use std::io::{IsTerminal, Stderr};
use std::path::Path;
use tact_diagnostic::emitter::{ColorMode, DiagnosticEmitter, TerminalEmitter};
use tact_diagnostic::{Diagnostic, ErrorCode};
use tact_ir::{FunctionGraph, ProgramGraph, StringInterner, TokenList};
use tact_parse::{Component, ComponentSpec, ParseError, ParseOptions};
use tracing::debug;

/// Which entry point a script is built through.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ParseMode {
    Programs,
    Library,
    Body,
}

/// Everything one script built into.
pub(crate) struct Built {
    pub programs: Vec<ProgramGraph>,
    pub functions: Vec<FunctionGraph>,
    pub errors: Vec<ParseError>,
}

pub(crate) fn read_file(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("error: cannot read '{}': {e}", path.display());
            std::process::exit(1);
        }
    }
}

/// Load the component description, or an empty component without one.
pub(crate) fn load_component(path: Option<&Path>, interner: &StringInterner) -> Component {
    let Some(path) = path else {
        return Component::new();
    };
    let text = read_file(path);
    let spec: ComponentSpec = match serde_json::from_str(&text) {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("error: invalid component description '{}': {e}", path.display());
            std::process::exit(1);
        }
    };
    match spec.build(interner) {
        Ok(component) => component,
        Err(e) => {
            eprintln!("error: invalid component description '{}': {e}", path.display());
            std::process::exit(1);
        }
    }
}

pub(crate) fn emitter(path: &Path, source: &str, color: ColorMode) -> TerminalEmitter<Stderr> {
    let is_tty = std::io::stderr().is_terminal();
    TerminalEmitter::with_color_mode(std::io::stderr(), color, is_tty)
        .with_source(path.display().to_string(), source)
}

/// Lex a script, reporting a lex error and exiting on failure.
pub(crate) fn lex_or_exit(
    path: &Path,
    source: &str,
    interner: &StringInterner,
    color: ColorMode,
) -> TokenList {
    match tact_lexer::lex(source, interner) {
        Ok(tokens) => tokens,
        Err(e) => {
            let mut emitter = emitter(path, source, color);
            emitter.emit(&e.to_diagnostic());
            emitter.emit_summary(1, 0);
            emitter.flush();
            std::process::exit(1);
        }
    }
}

/// Lex and build a script through the entry point `mode` selects.
pub(crate) fn build(
    path: &Path,
    source: &str,
    interner: &StringInterner,
    component: &Component,
    mode: ParseMode,
    options: &ParseOptions,
    color: ColorMode,
) -> Built {
    let tokens = lex_or_exit(path, source, interner, color);
    debug!(tokens = tokens.len(), ?mode, "lexed");
    match mode {
        ParseMode::Programs | ParseMode::Library => {
            let output = if mode == ParseMode::Library {
                tact_parse::parse_functions(&tokens, interner, component, options)
            } else {
                tact_parse::parse(&tokens, interner, component, options)
            };
            Built {
                programs: output.programs,
                functions: output.functions,
                errors: output.errors,
            }
        }
        ParseMode::Body => {
            let name = path
                .file_stem()
                .map_or_else(|| "body".to_string(), |stem| stem.to_string_lossy().into_owned());
            match tact_parse::parse_body(&tokens, interner, component, &name, options) {
                Ok(function) => Built {
                    programs: Vec::new(),
                    functions: vec![function],
                    errors: Vec::new(),
                },
                Err(error) => Built {
                    programs: Vec::new(),
                    functions: Vec::new(),
                    errors: vec![error],
                },
            }
        }
    }
}

/// Warnings for graphs that contain a cycle of always-true edges. They
/// build fine but would keep the engine stepping without ever checking a
/// condition.
pub(crate) fn cycle_warnings(built: &Built, interner: &StringInterner) -> Vec<Diagnostic> {
    let programs = built
        .programs
        .iter()
        .map(|program| ("program", program.name, program.span, &program.graph));
    let functions = built
        .functions
        .iter()
        .map(|function| ("function", function.name, function.span, &function.graph));
    programs
        .chain(functions)
        .filter(|(_, _, _, graph)| graph.has_unconditional_cycle())
        .map(|(kind, name, span, _)| {
            let name = interner.lookup(name);
            debug!(unit = %name, "cycle without a guard");
            Diagnostic::warning(ErrorCode::W2001)
                .with_message(format!(
                    "{kind} `{name}` can loop forever without checking a condition"
                ))
                .with_label(span, "this unit")
                .with_note("every edge of the cycle is always true")
        })
        .collect()
}

/// Emit warnings, then parse errors, then a summary. Returns true if there
/// were any errors.
pub(crate) fn report(
    path: &Path,
    source: &str,
    errors: &[ParseError],
    warnings: &[Diagnostic],
    color: ColorMode,
) -> bool {
    if errors.is_empty() && warnings.is_empty() {
        return false;
    }
    write_report(&mut emitter(path, source, color), errors, warnings)
}

fn write_report(
    emitter: &mut impl DiagnosticEmitter,
    errors: &[ParseError],
    warnings: &[Diagnostic],
) -> bool {
    emitter.emit_all(warnings);
    let diagnostics: Vec<Diagnostic> = errors.iter().map(ParseError::to_diagnostic).collect();
    emitter.emit_all(&diagnostics);
    emitter.emit_summary(diagnostics.len(), warnings.len());
    emitter.flush();
    !errors.is_empty()
}
