//! Text rendering of built graphs.
//!
//! One line per node with its command, then one indented line per edge in
//! evaluation order:
//!
//! ```text
//! program main (3 nodes, exit n2)
//!   n0 do arm.open()  #0
//!     -> n1 when done #0
//! ```

use std::fmt::Write;
use tact_ir::{
    Command, ComponentPath, Condition, DispatchMode, FunctionGraph, Graph, Literal, Name, NodeId,
    ProgramGraph, StringInterner, UnaryOp, ValueExpr, ValueType,
};

pub fn program(interner: &StringInterner, program: &ProgramGraph) -> String {
    let graph = &program.graph;
    let exit = program.exit.map_or_else(|| "unreachable".to_string(), node);
    let mut out = format!(
        "program {} ({} nodes, exit {exit})\n",
        interner.lookup(program.name),
        graph.node_count(),
    );
    Renderer { interner, graph }.write_nodes(&mut out);
    out
}

pub fn function(interner: &StringInterner, function: &FunctionGraph) -> String {
    let graph = &function.graph;
    let renderer = Renderer { interner, graph };
    let params: Vec<String> = function
        .params
        .iter()
        .map(|id| {
            let variable = graph.variable(*id);
            format!(
                "{} {}",
                variable.ty.display(interner),
                interner.lookup(variable.name)
            )
        })
        .collect();
    let exits: Vec<String> = function
        .exits
        .iter()
        .map(|exit| match exit.label {
            Some(label) => format!("{} {}", interner.lookup(label), node(exit.node)),
            None => format!("default {}", node(exit.node)),
        })
        .collect();

    let mut out = format!(
        "{}function {}({}) ({} nodes, exits: {})\n",
        if function.exported { "export " } else { "" },
        interner.lookup(function.name),
        params.join(", "),
        graph.node_count(),
        exits.join(", ")
    );
    renderer.write_nodes(&mut out);
    out
}

struct Renderer<'a> {
    interner: &'a StringInterner,
    graph: &'a Graph,
}

impl Renderer<'_> {
    fn write_nodes(&self, out: &mut String) {
        for (id, command_node) in self.graph.nodes() {
            let _ = write!(out, "  {}", node(id));
            if let Some(command) = command_node.command() {
                let mode = match command_node.mode() {
                    DispatchMode::Do => "do",
                    DispatchMode::Try => "try",
                };
                let _ = write!(out, " {mode} {}", self.command(command));
            }
            let labels: Vec<String> = self
                .graph
                .labels()
                .iter()
                .filter(|(_, target)| *target == id)
                .map(|(label, _)| format!("{}:", self.name(*label)))
                .collect();
            if !labels.is_empty() {
                let _ = write!(out, "  [{}]", labels.join(" "));
            }
            out.push('\n');
            for edge in command_node.edges() {
                let _ = write!(out, "    -> {}", node(edge.target));
                if !edge.guard.is_always_true() {
                    let _ = write!(out, " when {}", self.condition(&edge.guard));
                }
                out.push('\n');
            }
        }
    }

    fn name(&self, name: Name) -> String {
        self.interner.lookup(name).to_string()
    }

    fn member(&self, path: &ComponentPath, name: Name) -> String {
        let mut text = String::new();
        for peer in path.peers() {
            text.push_str(&self.interner.lookup(*peer));
            text.push('.');
        }
        text.push_str(&self.interner.lookup(name));
        text
    }

    fn args(&self, args: &[ValueExpr]) -> String {
        args.iter()
            .map(|arg| self.expr(arg))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn command(&self, command: &Command) -> String {
        match command {
            Command::Invoke {
                id,
                path,
                name,
                args,
            } => format!(
                "{}({})  #{}",
                self.member(path, *name),
                self.args(args),
                id.index()
            ),
            Command::Assign { target, value } => format!(
                "{} = {}",
                self.name(self.graph.variable(*target).name),
                self.expr(value)
            ),
            Command::Call { callee, args, .. } => {
                format!("call {}({})", self.name(*callee), self.args(args))
            }
            Command::Composite(parts) => parts
                .iter()
                .map(|part| self.command(part))
                .collect::<Vec<_>>()
                .join(" and "),
        }
    }

    fn condition(&self, condition: &Condition) -> String {
        match condition {
            Condition::True => "true".to_string(),
            Condition::False => "false".to_string(),
            Condition::Expr(expr) => self.expr(expr),
            Condition::Not(inner) => format!("!{}", self.grouped(inner)),
            Condition::And(items) => self.joined(items, " && "),
            Condition::Or(items) => self.joined(items, " || "),
            Condition::CommandDone(id) => format!("done #{}", id.index()),
            Condition::CommandFailed(id) => format!("failed #{}", id.index()),
            Condition::CallReturned(None) => "returned".to_string(),
            Condition::CallReturned(Some(label)) => format!("returned {}", self.name(*label)),
        }
    }

    fn joined(&self, items: &[std::sync::Arc<Condition>], separator: &str) -> String {
        items
            .iter()
            .map(|item| self.grouped(item))
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Parenthesize compound operands.
    fn grouped(&self, condition: &Condition) -> String {
        match condition {
            Condition::And(_)
            | Condition::Or(_)
            | Condition::CommandDone(_)
            | Condition::CommandFailed(_)
            | Condition::CallReturned(_)
            | Condition::Expr(ValueExpr::Binary { .. }) => {
                format!("({})", self.condition(condition))
            }
            _ => self.condition(condition),
        }
    }

    fn expr(&self, expr: &ValueExpr) -> String {
        match expr {
            ValueExpr::Literal(literal) => match literal {
                Literal::Int(i) => i.to_string(),
                Literal::Double(d) => format!("{d:?}"),
                Literal::Bool(b) => b.to_string(),
                Literal::String(s) => format!("{s:?}"),
            },
            ValueExpr::Var { id, .. } => self.name(self.graph.variable(*id).name),
            ValueExpr::Attribute { path, name, .. } => self.member(path, *name),
            ValueExpr::Query {
                path, name, args, ..
            } => format!("{}({})", self.member(path, *name), self.args(args)),
            ValueExpr::Field { base, index, .. } => match base.ty() {
                ValueType::Struct(def) => match def.fields.get(*index) {
                    Some((field, _)) => format!("{}.{}", self.operand(base), self.name(*field)),
                    None => format!("{}.{index}", self.operand(base)),
                },
                _ => format!("{}.{index}", self.operand(base)),
            },
            ValueExpr::Widen(inner) => format!("double({})", self.expr(inner)),
            ValueExpr::Unary { op, operand } => {
                let op = match op {
                    UnaryOp::Neg => "-",
                    UnaryOp::Not => "!",
                };
                format!("{op}{}", self.operand(operand))
            }
            ValueExpr::Binary { op, lhs, rhs, .. } => {
                format!("{} {op} {}", self.operand(lhs), self.operand(rhs))
            }
        }
    }

    fn operand(&self, expr: &ValueExpr) -> String {
        match expr {
            ValueExpr::Binary { .. } => format!("({})", self.expr(expr)),
            _ => self.expr(expr),
        }
    }
}

fn node(id: NodeId) -> String {
    format!("n{}", id.index())
}
