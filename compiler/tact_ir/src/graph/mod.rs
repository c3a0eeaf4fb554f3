//! Program and function graphs.
//!
//! A [`Graph`] is a set of [`CommandNode`]s linked by guarded [`Edge`]s. The
//! engine reads it through the accessors here; all mutation goes through
//! [`GraphBuilder`], which only the parser holds.
//!
//! Edges leaving a node are evaluated in the order they were declared and
//! the first guard that holds is taken. An always-true edge therefore acts as
//! the fallthrough and is only ever the last edge of its node.

mod builder;

pub use builder::{GraphBuilder, NodeMap};

use crate::{
    Command, Condition, DispatchMode, EvalError, Name, RuntimeState, Span, ValueType, VarId,
};
use smallvec::SmallVec;
use std::sync::Arc;

/// Index of a node within its graph.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct NodeId(u32);

impl NodeId {
    /// Target of an edge whose destination is not known yet (forward
    /// `goto`). Never present in a finished graph.
    pub const PENDING: NodeId = NodeId(u32::MAX);

    #[inline]
    pub const fn new(index: u32) -> Self {
        NodeId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A transition gated by a condition.
#[derive(Clone, PartialEq, Debug)]
pub struct Edge {
    pub guard: Arc<Condition>,
    pub target: NodeId,
}

/// One executable unit of a graph.
#[derive(Clone, PartialEq, Debug)]
pub struct CommandNode {
    pub(crate) command: Option<Command>,
    pub(crate) mode: DispatchMode,
    pub(crate) span: Span,
    pub(crate) edges: SmallVec<[Edge; 2]>,
}

impl CommandNode {
    pub(crate) fn new(span: Span) -> Self {
        CommandNode {
            command: None,
            mode: DispatchMode::Do,
            span,
            edges: SmallVec::new(),
        }
    }

    /// Command executed when the node is entered, if any.
    pub fn command(&self) -> Option<&Command> {
        self.command.as_ref()
    }

    /// How failures of the node's commands are handled.
    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Source span of the statement that produced the node.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Outgoing edges in evaluation order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn is_terminal(&self) -> bool {
        self.edges.is_empty()
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum VariableKind {
    Var,
    Const,
    Param,
}

/// A variable, constant or parameter owned by a graph.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Variable {
    pub name: Name,
    pub ty: ValueType,
    pub kind: VariableKind,
    pub span: Span,
}

/// A finished, label-resolved control-flow graph.
#[derive(Clone, PartialEq, Debug)]
pub struct Graph {
    nodes: Vec<CommandNode>,
    entry: NodeId,
    labels: Vec<(Name, NodeId)>,
    variables: Vec<Variable>,
}

impl Graph {
    /// The entry node. Fixed at creation.
    pub fn entry(&self) -> NodeId {
        self.entry
    }

    pub fn node(&self, id: NodeId) -> &CommandNode {
        &self.nodes[id.index()]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All nodes with their ids, in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &CommandNode)> {
        self.nodes.iter().enumerate().map(|(i, node)| (index_to_node(i), node))
    }

    pub fn edges(&self, id: NodeId) -> &[Edge] {
        self.node(id).edges()
    }

    /// Node a label was attached to.
    pub fn label(&self, name: Name) -> Option<NodeId> {
        self.labels
            .iter()
            .find(|(label, _)| *label == name)
            .map(|(_, node)| *node)
    }

    pub fn labels(&self) -> &[(Name, NodeId)] {
        &self.labels
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id.index()]
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Nodes without outgoing edges.
    pub fn terminals(&self) -> Vec<NodeId> {
        self.nodes()
            .filter(|(_, node)| node.is_terminal())
            .map(|(id, _)| id)
            .collect()
    }

    /// First edge of `node` whose guard holds, in declaration order.
    pub fn select_edge(
        &self,
        node: NodeId,
        state: &dyn RuntimeState,
    ) -> Result<Option<&Edge>, EvalError> {
        for edge in self.edges(node) {
            if edge.guard.evaluate(state)? {
                return Ok(Some(edge));
            }
        }
        Ok(None)
    }

    /// True if the graph contains a cycle made only of always-true edges.
    ///
    /// Such a cycle would spin forever without ever consulting a guard.
    pub fn has_unconditional_cycle(&self) -> bool {
        #[derive(Copy, Clone, PartialEq)]
        enum Mark {
            New,
            Active,
            Done,
        }

        let mut marks = vec![Mark::New; self.nodes.len()];
        for root in 0..self.nodes.len() {
            if marks[root] != Mark::New {
                continue;
            }
            // Iterative DFS over (node, next edge to visit), following only
            // always-true edges.
            let root = index_to_node(root);
            let mut stack = vec![(root, 0usize)];
            marks[root.index()] = Mark::Active;

            while let Some(frame) = stack.last_mut() {
                let (node, next) = *frame;
                let edges = self.edges(node);
                if next >= edges.len() {
                    marks[node.index()] = Mark::Done;
                    stack.pop();
                    continue;
                }
                frame.1 += 1;

                let edge = &edges[next];
                if !edge.guard.is_always_true() {
                    continue;
                }
                match marks[edge.target.index()] {
                    Mark::Active => return true,
                    Mark::Done => {}
                    Mark::New => {
                        marks[edge.target.index()] = Mark::Active;
                        stack.push((edge.target, 0));
                    }
                }
            }
        }
        false
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "graphs are built through GraphBuilder, which caps node count at u32"
)]
fn index_to_node(index: usize) -> NodeId {
    NodeId::new(index as u32)
}

/// Graph produced from one `program` definition.
#[derive(Clone, PartialEq, Debug)]
pub struct ProgramGraph {
    pub name: Name,
    /// Span of the whole `program ... { }` unit.
    pub span: Span,
    pub graph: Graph,
    /// The node reached when the program falls off its end. `None` when
    /// control can never get there, e.g. the program ends in an endless loop.
    pub exit: Option<NodeId>,
}

/// Where a function hands control back to its caller.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ReturnExit {
    /// Return label used by `return <label>`; `None` for the default exit.
    pub label: Option<Name>,
    pub node: NodeId,
}

/// Graph produced from one `function` definition.
#[derive(Clone, PartialEq, Debug)]
pub struct FunctionGraph {
    pub name: Name,
    pub span: Span,
    pub graph: Graph,
    /// Parameter slots in declaration order.
    pub params: Vec<VarId>,
    /// Default exit first, then one exit per return label in first-use order.
    /// Exits no path from the entry reaches are left out.
    pub exits: Vec<ReturnExit>,
    pub exported: bool,
}

impl FunctionGraph {
    /// Types of the formal parameters in order.
    pub fn param_types(&self) -> Vec<ValueType> {
        self.params
            .iter()
            .map(|id| self.graph.variable(*id).ty.clone())
            .collect()
    }

    pub fn exit(&self, label: Option<Name>) -> Option<NodeId> {
        self.exits
            .iter()
            .find(|exit| exit.label == label)
            .map(|exit| exit.node)
    }

    /// The exit used by a plain `return` or by falling off the end.
    pub fn default_exit(&self) -> Option<NodeId> {
        self.exit(None)
    }
}
