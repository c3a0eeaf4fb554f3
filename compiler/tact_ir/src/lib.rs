//! Tact IR - graph model for program scripts
//!
//! This crate holds the data the parser produces and the engine consumes:
//! - Spans, interned names and tokens
//! - Static value types and runtime values
//! - Value expressions, guard conditions and commands
//! - Program and function graphs, plus the builder used to construct them
//!
//! Finished graphs are immutable. Evaluation reads state through the
//! [`RuntimeState`] trait and never mutates the graph.

mod command;
mod condition;
mod expr;
pub mod graph;
mod interner;
mod name;
mod runtime;
mod span;
mod token;
mod types;
mod value;

pub use command::{Command, CommandId, DispatchMode, FunctionId};
pub use condition::Condition;
pub use expr::{BinaryOp, ComponentPath, Literal, UnaryOp, ValueExpr, VarId};
pub use graph::{
    CommandNode, Edge, FunctionGraph, Graph, GraphBuilder, NodeId, NodeMap, ProgramGraph,
    ReturnExit, Variable, VariableKind,
};
pub use interner::StringInterner;
pub use name::Name;
pub use runtime::{CommandStatus, EvalError, RuntimeState, StateSnapshot};
pub use span::{Span, SpanError};
pub use token::{Token, TokenKind, TokenList};
pub use types::{StructType, ValueType};
pub use value::Value;
