//! Parser tests.
//!
//! Tests are organized into modules by category:
//! - `construction`: graph shapes produced by each statement and construct
//! - `expressions`: typing and evaluation of parsed expressions and conditions
//! - `errors`: construction errors, their codes and positions, and recovery
//! - `linking`: calls between functions, return labels, library entry points
//! - `properties`: generated programs checked for structural invariants

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod construction;
mod expressions;

use crate::{
    parse, parse_body, parse_functions, Component, ComponentSpec, ParseError, ParseOptions,
    ParseOutput,
};
use tact_ir::{
    Command, Edge, FunctionGraph, Graph, Name, NodeId, ProgramGraph, StringInterner,
};

/// The component every test script controls.
const ROBOT: &str = r#"{
    "structs": [
        { "name": "pose", "fields": [["x", "double"], ["y", "double"]] }
    ],
    "attributes": {
        "ready": "bool",
        "speed": "double",
        "count": "int",
        "label": "string",
        "target": "pose"
    },
    "queries": {
        "distance": { "params": ["double"], "returns": "double" },
        "ok": { "returns": "bool" }
    },
    "commands": {
        "a": {},
        "b": {},
        "c": {},
        "wait": { "params": ["double"] },
        "say": { "params": ["string"] }
    },
    "peers": {
        "arm": {
            "attributes": { "position": "double", "busy": "bool" },
            "queries": { "reach": { "returns": "double" } },
            "commands": {
                "open": {},
                "close": {},
                "move_to": { "params": ["double", "double"] }
            },
            "peers": {
                "gripper": {
                    "attributes": { "force": "double" },
                    "commands": { "grip": { "params": ["int"] } }
                }
            }
        }
    }
}"#;

/// Owns the interner and component the parser borrows.
pub(super) struct TestCtx {
    pub interner: StringInterner,
    pub component: Component,
}

impl TestCtx {
    pub fn new() -> Self {
        let interner = StringInterner::new();
        let spec: ComponentSpec = serde_json::from_str(ROBOT).unwrap();
        let component = spec.build(&interner).unwrap();
        TestCtx {
            interner,
            component,
        }
    }

    pub fn name(&self, text: &str) -> Name {
        self.interner.intern(text)
    }

    pub fn parse(&self, source: &str) -> ParseOutput {
        self.parse_with(source, &ParseOptions::default())
    }

    pub fn parse_with(&self, source: &str, options: &ParseOptions) -> ParseOutput {
        let tokens = tact_lexer::lex(source, &self.interner).unwrap();
        parse(&tokens, &self.interner, &self.component, options)
    }

    pub fn parse_functions(&self, source: &str) -> ParseOutput {
        let tokens = tact_lexer::lex(source, &self.interner).unwrap();
        parse_functions(
            &tokens,
            &self.interner,
            &self.component,
            &ParseOptions::default(),
        )
    }

    pub fn parse_body(&self, source: &str) -> Result<FunctionGraph, ParseError> {
        let tokens = tact_lexer::lex(source, &self.interner).unwrap();
        parse_body(
            &tokens,
            &self.interner,
            &self.component,
            "body",
            &ParseOptions::default(),
        )
    }

    /// Parse a script that must build without errors and return its only
    /// program.
    pub fn program(&self, source: &str) -> ProgramGraph {
        let output = self.parse(source);
        assert!(
            output.errors.is_empty(),
            "unexpected errors: {:?}",
            output.errors
        );
        assert_eq!(output.programs.len(), 1);
        output.programs.into_iter().next().unwrap()
    }

    /// Wrap statements in a program and build it.
    pub fn program_of(&self, statements: &str) -> ProgramGraph {
        self.program(&format!("program p {{ {statements} }}"))
    }

    /// Parse a script expected to fail and return its errors.
    pub fn errors(&self, source: &str) -> Vec<ParseError> {
        let output = self.parse(source);
        assert!(output.has_errors(), "expected errors for {source:?}");
        output.errors
    }

    /// Spelling of the component command a node invokes, `arm.open` style.
    pub fn invoked(&self, graph: &Graph, node: NodeId) -> Option<String> {
        match graph.node(node).command()? {
            Command::Invoke { path, name, .. } => {
                let mut text = String::new();
                for peer in path.peers() {
                    text.push_str(&self.interner.lookup(*peer));
                    text.push('.');
                }
                text.push_str(&self.interner.lookup(*name));
                Some(text)
            }
            _ => None,
        }
    }
}

/// Targets of a node's edges, in evaluation order.
pub(super) fn targets(graph: &Graph, node: NodeId) -> Vec<NodeId> {
    graph.edges(node).iter().map(|edge: &Edge| edge.target).collect()
}

pub(super) fn node(index: u32) -> NodeId {
    NodeId::new(index)
}
