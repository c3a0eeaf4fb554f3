//! Command objects executed by graph nodes.

use crate::{Condition, ComponentPath, Name, ValueExpr, VarId};
use std::sync::Arc;

/// Identity of a dispatched command within its graph.
///
/// Done/failed conditions refer to the command through this id, so the
/// condition objects never own the command they observe.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct CommandId(u32);

impl CommandId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        CommandId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a function graph in a parse result.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct FunctionId(u32);

impl FunctionId {
    /// Placeholder held by call commands until functions are linked.
    pub const UNRESOLVED: FunctionId = FunctionId(u32::MAX);

    #[inline]
    pub const fn new(index: u32) -> Self {
        FunctionId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// How a command node treats failure of the commands it dispatches.
///
/// - `Do`: commands combined with `and` form one sequential step; the node
///   proceeds once every command is done, and a failure is a program error
///   the engine handles.
/// - `Try`: same normal edge, but any failing command takes the failure edge
///   to the innermost catch block.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum DispatchMode {
    #[default]
    Do,
    Try,
}

/// A command held by a node.
#[derive(Clone, PartialEq, Debug)]
pub enum Command {
    /// Asynchronous component command.
    Invoke {
        id: CommandId,
        path: ComponentPath,
        name: Name,
        args: Vec<ValueExpr>,
    },
    /// Store a value into a graph variable. Completes instantly.
    Assign { target: VarId, value: ValueExpr },
    /// Call a function graph. Arguments are evaluated at the call site and
    /// bound to the callee's parameters in order.
    Call {
        callee: Name,
        function: FunctionId,
        args: Vec<ValueExpr>,
    },
    /// Commands chained with `and`, dispatched in the same step.
    Composite(Vec<Command>),
}

impl Command {
    /// Ids of every component command this command dispatches.
    pub fn dispatched(&self) -> Vec<CommandId> {
        let mut ids = Vec::new();
        self.collect_dispatched(&mut ids);
        ids
    }

    fn collect_dispatched(&self, ids: &mut Vec<CommandId>) {
        match self {
            Command::Invoke { id, .. } => ids.push(*id),
            Command::Composite(parts) => {
                for part in parts {
                    part.collect_dispatched(ids);
                }
            }
            Command::Assign { .. } | Command::Call { .. } => {}
        }
    }

    /// Failure signal: any dispatched command failed.
    pub fn failure_condition(&self) -> Option<Arc<Condition>> {
        let ids = self.dispatched();
        if ids.is_empty() {
            return None;
        }
        Some(Condition::any(
            ids.into_iter()
                .map(|id| Arc::new(Condition::CommandFailed(id)))
                .collect(),
        ))
    }
}
