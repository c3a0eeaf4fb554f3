//! Single-pass graph construction for Tact program scripts.
//!
//! The parser walks the token stream once, left to right. Each completed
//! statement mutates the graph of the unit it belongs to: it fills the
//! current node, links it to the next one and opens or closes constructs on
//! an explicit frame stack. Sub-parsers for expressions, conditions,
//! commands and value changes resolve names through a [`ComponentContext`].
//!
//! Any error discards the unit it occurs in. Sibling units still build, and
//! calls between functions are linked once the whole input has been read.

mod context;
mod cursor;
mod error;
mod grammar;
mod link;
mod stack;
mod unit;

pub use context::{
    Component, ComponentContext, ComponentSpec, ContextError, Member, MemberKind, Signature,
    SignatureSpec, StructSpec,
};
pub use cursor::Cursor;
pub use error::ParseError;

use tact_ir::{FunctionGraph, Name, ProgramGraph, Span, StringInterner, TokenList};
use tracing::debug;
use unit::{UnitKind, UnitState};

/// Knobs for graph construction.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ParseOptions {
    /// Deepest allowed stack of open constructs, the unit itself included.
    pub max_nesting: usize,
    /// Drop nodes no path from the entry reaches.
    pub prune_unreachable: bool,
    /// Bypass empty nodes that only forward control.
    pub collapse_pass_through: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            max_nesting: 64,
            prune_unreachable: true,
            collapse_pass_through: true,
        }
    }
}

/// Graphs of every unit that built, plus the errors of those that did not.
#[derive(Debug, Default)]
pub struct ParseOutput {
    pub programs: Vec<ProgramGraph>,
    /// Indexed by [`tact_ir::FunctionId`].
    pub functions: Vec<FunctionGraph>,
    /// Sorted by source position.
    pub errors: Vec<ParseError>,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn program(&self, name: Name) -> Option<&ProgramGraph> {
        self.programs.iter().find(|program| program.name == name)
    }

    pub fn function(&self, name: Name) -> Option<&FunctionGraph> {
        self.functions.iter().find(|function| function.name == name)
    }
}

/// Which top-level units an entry point accepts.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum EntryPoint {
    Programs,
    Functions,
}

/// Parse a script into program graphs and the function graphs they call.
pub fn parse(
    tokens: &TokenList,
    interner: &StringInterner,
    context: &dyn ComponentContext,
    options: &ParseOptions,
) -> ParseOutput {
    run(tokens, interner, context, options, EntryPoint::Programs)
}

/// Parse a function library.
///
/// Exported functions are returned together with every function they call.
/// A library that exports nothing returns all of its functions. Program
/// definitions are rejected.
pub fn parse_functions(
    tokens: &TokenList,
    interner: &StringInterner,
    context: &dyn ComponentContext,
    options: &ParseOptions,
) -> ParseOutput {
    run(tokens, interner, context, options, EntryPoint::Functions)
}

fn run(
    tokens: &TokenList,
    interner: &StringInterner,
    context: &dyn ComponentContext,
    options: &ParseOptions,
    entry: EntryPoint,
) -> ParseOutput {
    let mut parser = Parser::new(tokens, interner, context, *options);
    let (units, mut errors) = parser.parse_units(entry);
    let linked = link::link(units, interner, options, entry == EntryPoint::Functions);
    errors.extend(linked.errors);
    errors.sort_by_key(|error| error.span.start);
    debug!(
        programs = linked.programs.len(),
        functions = linked.functions.len(),
        errors = errors.len(),
        "parse finished"
    );
    ParseOutput {
        programs: linked.programs,
        functions: linked.functions,
        errors,
    }
}

/// Parse a bare statement block into a function graph named `name`.
///
/// The block takes no parameters and cannot call functions.
pub fn parse_body(
    tokens: &TokenList,
    interner: &StringInterner,
    context: &dyn ComponentContext,
    name: &str,
    options: &ParseOptions,
) -> Result<FunctionGraph, ParseError> {
    let mut parser = Parser::new(tokens, interner, context, *options);
    let unit = parser.parse_body_unit(interner.intern(name))?;
    let mut linked = link::link(vec![unit], interner, options, false);
    if let Some(error) = linked.errors.into_iter().next() {
        return Err(error);
    }
    linked.functions.pop().ok_or_else(|| {
        ParseError::new(
            tact_diagnostic::ErrorCode::E2011,
            "input did not form a body",
            Span::DUMMY,
        )
    })
}

/// Parser state for one parse invocation.
pub(crate) struct Parser<'a> {
    cursor: Cursor<'a>,
    context: &'a dyn ComponentContext,
    options: ParseOptions,
    /// The unit under construction.
    unit: UnitState,
}

impl<'a> Parser<'a> {
    fn new(
        tokens: &'a TokenList,
        interner: &'a StringInterner,
        context: &'a dyn ComponentContext,
        options: ParseOptions,
    ) -> Self {
        Parser {
            cursor: Cursor::new(tokens, interner),
            context,
            options,
            unit: UnitState::new(UnitKind::Program, Name::EMPTY, Span::DUMMY),
        }
    }

    #[inline]
    fn interner(&self) -> &'a StringInterner {
        self.cursor.interner()
    }

    /// Source spelling of an interned name, for messages.
    fn spell(&self, name: Name) -> String {
        self.interner().lookup(name).to_string()
    }
}

#[cfg(test)]
mod tests;
