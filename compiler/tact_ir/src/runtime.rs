//! The read-only view of execution state that guards are evaluated against.
//!
//! The stepping engine lives outside this workspace. It implements
//! [`RuntimeState`] over its own storage; guard evaluation never mutates it.

use crate::{CommandId, ComponentPath, Name, Value, VarId};
use rustc_hash::FxHashMap;

/// Progress of a dispatched command.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum CommandStatus {
    /// Not yet dispatched, or dispatched and still running.
    #[default]
    Pending,
    Done,
    Failed,
}

/// Errors raised while evaluating an expression or guard.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("variable {0:?} has no value")]
    UnboundVariable(VarId),
    #[error("component member {0:?} is not available")]
    UnboundMember(Name),
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow")]
    Overflow,
    #[error("operand has the wrong type for `{0}`")]
    TypeMismatch(&'static str),
}

/// Values and statuses visible to guard evaluation.
pub trait RuntimeState {
    /// Current value of a graph-local variable or parameter.
    fn variable(&self, id: VarId) -> Option<Value>;

    /// Current value of a component attribute.
    fn attribute(&self, path: &ComponentPath, name: Name) -> Option<Value>;

    /// Result of a synchronous, side-effect-free component query.
    fn query(&self, path: &ComponentPath, name: Name, args: &[Value]) -> Option<Value>;

    /// Status of a command dispatched by this graph.
    fn command_status(&self, id: CommandId) -> CommandStatus;

    /// Return of the function called by the current node.
    ///
    /// `None` while the callee is still running; `Some(label)` once it
    /// returned, carrying the return label it used (`None` for a plain
    /// `return` or falling off the end).
    fn call_return(&self) -> Option<Option<Name>>;
}

/// A fixed [`RuntimeState`] backed by plain maps.
///
/// Useful for stepping a graph by hand and for dry runs of guards. Queries
/// resolve by name only and ignore their arguments.
#[derive(Clone, Debug, Default)]
pub struct StateSnapshot {
    variables: FxHashMap<VarId, Value>,
    members: FxHashMap<(ComponentPath, Name), Value>,
    commands: FxHashMap<CommandId, CommandStatus>,
    call_return: Option<Option<Name>>,
}

impl StateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_variable(&mut self, id: VarId, value: Value) -> &mut Self {
        self.variables.insert(id, value);
        self
    }

    /// Value of an attribute, or of a query regardless of its arguments.
    pub fn set_member(&mut self, path: ComponentPath, name: Name, value: Value) -> &mut Self {
        self.members.insert((path, name), value);
        self
    }

    pub fn set_status(&mut self, id: CommandId, status: CommandStatus) -> &mut Self {
        self.commands.insert(id, status);
        self
    }

    pub fn set_call_return(&mut self, label: Option<Option<Name>>) -> &mut Self {
        self.call_return = label;
        self
    }
}

impl RuntimeState for StateSnapshot {
    fn variable(&self, id: VarId) -> Option<Value> {
        self.variables.get(&id).cloned()
    }

    fn attribute(&self, path: &ComponentPath, name: Name) -> Option<Value> {
        self.members.get(&(path.clone(), name)).cloned()
    }

    fn query(&self, path: &ComponentPath, name: Name, _args: &[Value]) -> Option<Value> {
        self.members.get(&(path.clone(), name)).cloned()
    }

    fn command_status(&self, id: CommandId) -> CommandStatus {
        self.commands.get(&id).copied().unwrap_or_default()
    }

    fn call_return(&self) -> Option<Option<Name>> {
        self.call_return
    }
}
