//! Construction state of the unit being parsed.
//!
//! A unit (program, function or bare body) is built into its own
//! [`GraphBuilder`]. The state here lives only while that unit is open; on
//! failure it is dropped wholesale and nothing leaks into sibling units.

use crate::ParseError;
use std::sync::Arc;
use tact_diagnostic::ErrorCode;
use tact_ir::{
    Command, Condition, DispatchMode, GraphBuilder, Name, NodeId, ReturnExit, Span, ValueType,
    VarId, Variable, VariableKind,
};

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum UnitKind {
    Program,
    Function,
    /// Anonymous statement block parsed on its own.
    Body,
}

impl UnitKind {
    pub(crate) fn describe(self) -> &'static str {
        match self {
            UnitKind::Program => "program",
            UnitKind::Function => "function",
            UnitKind::Body => "body",
        }
    }

    pub(crate) fn returns(self) -> bool {
        !matches!(self, UnitKind::Program)
    }
}

/// An open construct.
#[derive(Debug)]
pub(crate) enum FrameKind {
    Root,
    Branch,
    Loop {
        /// Where `continue` goes: the head of a `while`, the increment of a `for`.
        resume: NodeId,
        exit: NodeId,
    },
    /// Nodes issued in try mode while this frame was the innermost try.
    Try { issued: Vec<NodeId> },
}

#[derive(Debug)]
pub(crate) struct Frame {
    pub kind: FrameKind,
    pub mode: DispatchMode,
}

/// A `goto` or `on ... goto` whose label was not bound yet.
#[derive(Debug)]
pub(crate) struct PendingGoto {
    pub node: NodeId,
    pub label: Name,
    pub span: Span,
}

/// A call site, checked once every function of the parse is known.
#[derive(Clone, Debug)]
pub(crate) struct PendingCall {
    pub node: NodeId,
    pub callee: Name,
    pub arg_types: Vec<ValueType>,
    pub arg_spans: Vec<Span>,
    /// Return labels named by `on` clauses.
    pub labels: Vec<(Name, Span)>,
    pub span: Span,
}

pub(crate) struct UnitState {
    pub kind: UnitKind,
    pub name: Name,
    pub span: Span,
    pub exported: bool,
    pub builder: GraphBuilder,
    /// The blank node the next statement fills.
    pub build: NodeId,
    pub frames: Vec<Frame>,
    scopes: Vec<Vec<VarId>>,
    pub params: Vec<VarId>,
    /// Return exits of a function; the unlabeled default exit comes first.
    pub exits: Vec<ReturnExit>,
    pub gotos: Vec<PendingGoto>,
    pub calls: Vec<PendingCall>,
    label_spans: Vec<(Name, Span)>,
}

impl UnitState {
    pub(crate) fn new(kind: UnitKind, name: Name, span: Span) -> Self {
        let mut builder = GraphBuilder::new(span);
        let build = builder.entry();
        let exits = if kind.returns() {
            vec![ReturnExit {
                label: None,
                node: builder.add_node(span),
            }]
        } else {
            Vec::new()
        };
        UnitState {
            kind,
            name,
            span,
            exported: false,
            builder,
            build,
            frames: vec![Frame {
                kind: FrameKind::Root,
                mode: DispatchMode::Do,
            }],
            scopes: vec![Vec::new()],
            params: Vec::new(),
            exits,
            gotos: Vec::new(),
            calls: Vec::new(),
            label_spans: Vec::new(),
        }
    }

    /// Dispatch mode of the innermost open construct.
    pub(crate) fn mode(&self) -> DispatchMode {
        self.frames.last().map_or(DispatchMode::Do, |frame| frame.mode)
    }

    /// Open a construct. The new frame inherits the current mode unless one
    /// is given.
    pub(crate) fn push_frame(
        &mut self,
        kind: FrameKind,
        mode: Option<DispatchMode>,
        max_nesting: usize,
        span: Span,
    ) -> Result<(), ParseError> {
        let mode = mode.unwrap_or_else(|| self.mode());
        self.frames.push(Frame { kind, mode });
        // The root frame is not a construct.
        if self.frames.len() - 1 > max_nesting {
            return Err(ParseError::new(
                ErrorCode::E1005,
                format!("constructs nested more than {max_nesting} levels deep"),
                span,
            ));
        }
        Ok(())
    }

    pub(crate) fn pop_frame(&mut self) -> Option<Frame> {
        debug_assert!(self.frames.len() > 1, "popped the root frame");
        self.frames.pop()
    }

    /// `(resume, exit)` of the innermost enclosing loop.
    pub(crate) fn innermost_loop(&self) -> Option<(NodeId, NodeId)> {
        self.frames.iter().rev().find_map(|frame| match frame.kind {
            FrameKind::Loop { resume, exit } => Some((resume, exit)),
            _ => None,
        })
    }

    /// Fill the build node with a command in the current mode.
    ///
    /// Nodes whose command can fail are remembered by the innermost try
    /// frame so its failure edge can be added when the frame closes.
    pub(crate) fn issue(&mut self, command: Command, span: Span) -> NodeId {
        let node = self.build;
        let mode = self.mode();
        let can_fail = command.failure_condition().is_some();
        self.builder.set_command(node, command, mode);
        self.builder.set_span(node, span);
        if mode == DispatchMode::Try && can_fail {
            if let Some(FrameKind::Try { issued }) = self
                .frames
                .iter_mut()
                .rev()
                .map(|frame| &mut frame.kind)
                .find(|kind| matches!(kind, FrameKind::Try { .. }))
            {
                issued.push(node);
            }
        }
        node
    }

    /// Link the build node to a fresh node under `guard` and move on to it.
    pub(crate) fn proceed(&mut self, guard: Arc<Condition>, span: Span) -> NodeId {
        let next = self.builder.add_node(span);
        self.builder.push_edge(self.build, guard, next);
        self.build = next;
        next
    }

    /// Unconditional jump from the build node.
    ///
    /// Statements following the jump are built into a fresh node nothing
    /// points at; it is pruned when the unit closes.
    pub(crate) fn jump(&mut self, target: NodeId, span: Span) {
        self.builder.push_edge(self.build, Condition::always(), target);
        self.build = self.builder.add_node(span);
    }

    /// Edge from `from` to the node bound to `label`, or a pending edge when
    /// the label is bound later in the unit.
    pub(crate) fn goto(&mut self, from: NodeId, guard: Arc<Condition>, label: Name, span: Span) {
        match self.builder.label(label) {
            Some(target) => {
                self.builder.push_edge(from, guard, target);
            }
            None => {
                // Recorded even when the edge is dropped, so the label is
                // still checked.
                self.builder.push_edge(from, guard, NodeId::PENDING);
                self.gotos.push(PendingGoto {
                    node: from,
                    label,
                    span,
                });
            }
        }
    }

    /// Bind `label` to the build node.
    pub(crate) fn bind_label(
        &mut self,
        label: Name,
        span: Span,
        spelled: &str,
    ) -> Result<(), ParseError> {
        if self.builder.bind_label(label, self.build).is_err() {
            let mut error = ParseError::new(
                ErrorCode::E2003,
                format!("label `{spelled}` is defined more than once"),
                span,
            );
            if let Some((_, first)) = self.label_spans.iter().find(|(name, _)| *name == label) {
                error = error.with_related(*first, "first defined here");
            }
            return Err(error);
        }
        self.label_spans.push((label, span));
        Ok(())
    }

    /// Exit node for `return [label]`, created on first use.
    pub(crate) fn exit(&mut self, label: Option<Name>, span: Span) -> NodeId {
        if let Some(exit) = self.exits.iter().find(|exit| exit.label == label) {
            return exit.node;
        }
        let node = self.builder.add_node(span);
        self.exits.push(ReturnExit { label, node });
        node
    }

    pub(crate) fn push_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    pub(crate) fn pop_scope(&mut self) {
        debug_assert!(self.scopes.len() > 1, "popped the unit scope");
        self.scopes.pop();
    }

    /// Variable visible under `name`, innermost scope first.
    pub(crate) fn lookup(&self, name: Name) -> Option<VarId> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .copied()
            .find(|id| self.builder.variable(*id).name == name)
    }

    /// Declare a variable in the innermost scope.
    ///
    /// A name may not shadow another variable visible at the declaration.
    pub(crate) fn declare(
        &mut self,
        name: Name,
        ty: ValueType,
        kind: VariableKind,
        span: Span,
        spelled: &str,
    ) -> Result<VarId, ParseError> {
        if let Some(existing) = self.lookup(name) {
            let first = self.builder.variable(existing).span;
            return Err(ParseError::new(
                ErrorCode::E2004,
                format!("`{spelled}` is already declared"),
                span,
            )
            .with_related(first, "first declared here"));
        }
        let id = self.builder.declare(Variable {
            name,
            ty,
            kind,
            span,
        });
        if let Some(scope) = self.scopes.last_mut() {
            scope.push(id);
        }
        Ok(id)
    }

    pub(crate) fn variable(&self, id: VarId) -> &Variable {
        self.builder.variable(id)
    }
}
