//! Name resolution against the component the script controls.
//!
//! The parser never owns component metadata. It asks a [`ComponentContext`]
//! whether a name denotes a peer, an attribute, a query or a command, one
//! reference at a time. Nothing is cached between lookups.

mod component;

pub use component::{Component, ComponentSpec, ContextError, SignatureSpec, StructSpec};

use std::sync::Arc;
use tact_ir::{ComponentPath, Name, StructType, ValueType};

/// What kind of member a lookup is looking for.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum MemberKind {
    Peer,
    Attribute,
    Query,
    Command,
}

impl MemberKind {
    pub fn describe(self) -> &'static str {
        match self {
            MemberKind::Peer => "peer",
            MemberKind::Attribute => "attribute",
            MemberKind::Query => "query",
            MemberKind::Command => "command",
        }
    }
}

/// Parameter and result types of a query or command.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Signature {
    pub params: Vec<ValueType>,
    /// Result type of a query; `None` for commands.
    pub returns: Option<ValueType>,
}

impl Signature {
    pub fn command(params: Vec<ValueType>) -> Self {
        Signature {
            params,
            returns: None,
        }
    }

    pub fn query(params: Vec<ValueType>, returns: ValueType) -> Self {
        Signature {
            params,
            returns: Some(returns),
        }
    }
}

/// A resolved component member.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Member {
    Peer,
    Attribute(ValueType),
    Query(Signature),
    Command(Signature),
}

/// The root component context a parse runs against.
///
/// `path` addresses a component relative to the root (an empty path is the
/// root itself); nested peers are reached by extending the path.
pub trait ComponentContext {
    fn lookup(&self, path: &ComponentPath, name: Name, kind: MemberKind) -> Option<Member>;

    /// A structured type known to the component.
    fn struct_type(&self, name: Name) -> Option<Arc<StructType>>;
}

#[cfg(test)]
mod tests;
