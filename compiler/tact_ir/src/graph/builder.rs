//! Mutable graph construction.

use super::{index_to_node, CommandNode, Edge, Graph, NodeId, Variable};
use crate::{Command, CommandId, Condition, DispatchMode, Name, Span, VarId};
use std::sync::Arc;

/// Builds a [`Graph`] node by node.
///
/// Node 0 is created with the builder and is the entry of the finished graph.
/// Edges may point at [`NodeId::PENDING`] while a forward target is unknown;
/// each must be resolved before [`GraphBuilder::finish`].
#[derive(Debug)]
pub struct GraphBuilder {
    nodes: Vec<CommandNode>,
    labels: Vec<(Name, NodeId)>,
    variables: Vec<Variable>,
    next_command: u32,
}

impl GraphBuilder {
    pub fn new(span: Span) -> Self {
        GraphBuilder {
            nodes: vec![CommandNode::new(span)],
            labels: Vec::new(),
            variables: Vec::new(),
            next_command: 0,
        }
    }

    #[inline]
    pub fn entry(&self) -> NodeId {
        NodeId::new(0)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn add_node(&mut self, span: Span) -> NodeId {
        let id = index_to_node(self.nodes.len());
        self.nodes.push(CommandNode::new(span));
        id
    }

    pub fn set_command(&mut self, node: NodeId, command: Command, mode: DispatchMode) {
        let slot = &mut self.nodes[node.index()];
        slot.command = Some(command);
        slot.mode = mode;
    }

    pub fn set_span(&mut self, node: NodeId, span: Span) {
        self.nodes[node.index()].span = span;
    }

    pub fn command(&self, node: NodeId) -> Option<&Command> {
        self.nodes[node.index()].command.as_ref()
    }

    pub fn command_mut(&mut self, node: NodeId) -> Option<&mut Command> {
        self.nodes[node.index()].command.as_mut()
    }

    pub fn edge_count(&self, node: NodeId) -> usize {
        self.nodes[node.index()].edges.len()
    }

    /// Append an edge; it is evaluated after all existing edges of `from`.
    ///
    /// An edge appended after an always-true edge could never be taken and
    /// is dropped; returns whether the edge was kept.
    pub fn push_edge(&mut self, from: NodeId, guard: Arc<Condition>, target: NodeId) -> bool {
        let edges = &mut self.nodes[from.index()].edges;
        if edges.last().is_some_and(|edge| edge.guard.is_always_true()) {
            return false;
        }
        edges.push(Edge { guard, target });
        true
    }

    /// Prepend an edge; it takes priority over all existing edges of `from`.
    pub fn insert_edge_front(&mut self, from: NodeId, guard: Arc<Condition>, target: NodeId) {
        self.nodes[from.index()]
            .edges
            .insert(0, Edge { guard, target });
    }

    /// Point the first still-pending edge of `from` at `target`.
    ///
    /// Pending edges are resolved in the order they were pushed.
    pub fn resolve_pending(&mut self, from: NodeId, target: NodeId) -> bool {
        match self.nodes[from.index()]
            .edges
            .iter_mut()
            .find(|edge| edge.target == NodeId::PENDING)
        {
            Some(edge) => {
                edge.target = target;
                true
            }
            None => false,
        }
    }

    /// Attach a label to a node. Returns the existing node on a duplicate.
    pub fn bind_label(&mut self, name: Name, node: NodeId) -> Result<(), NodeId> {
        if let Some(existing) = self.label(name) {
            return Err(existing);
        }
        self.labels.push((name, node));
        Ok(())
    }

    pub fn label(&self, name: Name) -> Option<NodeId> {
        self.labels
            .iter()
            .find(|(label, _)| *label == name)
            .map(|(_, node)| *node)
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "variable count is bounded by source length"
    )]
    pub fn declare(&mut self, variable: Variable) -> VarId {
        let id = VarId::new(self.variables.len() as u32);
        self.variables.push(variable);
        id
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id.index()]
    }

    pub fn next_command_id(&mut self) -> CommandId {
        let id = CommandId::new(self.next_command);
        self.next_command += 1;
        id
    }

    /// Freeze the graph.
    ///
    /// With `collapse` set, pass-through nodes (no command, a single
    /// always-true edge) are bypassed: edges pointing at them are redirected
    /// to where they lead. The entry, labelled nodes and the nodes listed in
    /// `keep` are never bypassed. With `prune` set, nodes unreachable from the
    /// entry are dropped, including kept and labelled ones, so the finished
    /// graph is connected. Node ids are renumbered densely; the returned map
    /// translates builder ids to graph ids.
    pub fn finish(mut self, keep: &[NodeId], prune: bool, collapse: bool) -> (Graph, NodeMap) {
        let forward = if collapse {
            self.pass_through_targets(keep)
        } else {
            (0..self.nodes.len()).map(index_to_node).collect()
        };
        let redirect = |node: NodeId| {
            if node == NodeId::PENDING {
                node
            } else {
                forward[node.index()]
            }
        };

        for node in &mut self.nodes {
            for edge in &mut node.edges {
                edge.target = redirect(edge.target);
            }
        }

        let live: Vec<bool> = if prune {
            self.reachable()
        } else {
            forward
                .iter()
                .enumerate()
                .map(|(index, target)| target.index() == index)
                .collect()
        };

        let mut dense = Vec::with_capacity(self.nodes.len());
        let mut next = 0u32;
        for &alive in &live {
            if alive {
                dense.push(Some(NodeId::new(next)));
                next += 1;
            } else {
                dense.push(None);
            }
        }
        let map = NodeMap(
            forward
                .iter()
                .map(|target| dense[target.index()])
                .collect(),
        );

        let nodes = self
            .nodes
            .into_iter()
            .zip(&live)
            .filter(|(_, alive)| **alive)
            .map(|(mut node, _)| {
                // Pending targets never survive a correct build; drop them.
                node.edges
                    .retain(|edge| edge.target != NodeId::PENDING && dense[edge.target.index()].is_some());
                for edge in &mut node.edges {
                    if let Some(target) = dense[edge.target.index()] {
                        edge.target = target;
                    }
                }
                node
            })
            .collect();

        let labels = self
            .labels
            .into_iter()
            .filter_map(|(name, node)| dense[node.index()].map(|node| (name, node)))
            .collect();

        let graph = Graph {
            nodes,
            entry: NodeId::new(0),
            labels,
            variables: self.variables,
        };
        (graph, map)
    }

    /// For every node, the node control actually reaches when entering it.
    fn pass_through_targets(&self, keep: &[NodeId]) -> Vec<NodeId> {
        let step = |node: NodeId| -> Option<NodeId> {
            if node == self.entry()
                || keep.contains(&node)
                || self.labels.iter().any(|(_, labelled)| *labelled == node)
            {
                return None;
            }
            let slot = &self.nodes[node.index()];
            match slot.edges.as_slice() {
                [edge]
                    if slot.command.is_none()
                        && edge.guard.is_always_true()
                        && edge.target != NodeId::PENDING =>
                {
                    Some(edge.target)
                }
                _ => None,
            }
        };

        (0..self.nodes.len())
            .map(|index| {
                let start = index_to_node(index);
                let mut current = start;
                // Chains that loop back on themselves stay in place.
                for _ in 0..self.nodes.len() {
                    match step(current) {
                        Some(next) => current = next,
                        None => return current,
                    }
                }
                start
            })
            .collect()
    }

    fn reachable(&self) -> Vec<bool> {
        let mut seen = vec![false; self.nodes.len()];
        let mut work = vec![self.entry()];
        while let Some(node) = work.pop() {
            if node == NodeId::PENDING || seen[node.index()] {
                continue;
            }
            seen[node.index()] = true;
            work.extend(self.nodes[node.index()].edges.iter().map(|e| e.target));
        }
        seen
    }
}

/// Translation from builder node ids to finished graph ids.
#[derive(Clone, Debug)]
pub struct NodeMap(Vec<Option<NodeId>>);

impl NodeMap {
    /// `None` if the node was pruned.
    pub fn get(&self, old: NodeId) -> Option<NodeId> {
        self.0.get(old.index()).copied().flatten()
    }
}
