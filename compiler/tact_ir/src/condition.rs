//! Guard conditions.
//!
//! Conditions are immutable once built and shared through `Arc`: the
//! implicit "done" condition of a command can guard the node's normal edge
//! and also appear inside a composite guard without being duplicated.

use crate::{CommandId, CommandStatus, EvalError, Name, RuntimeState, ValueExpr};
use std::sync::Arc;

/// A re-evaluable boolean predicate.
///
/// Evaluation reads [`RuntimeState`] only; it never blocks and never has side
/// effects, so the engine can evaluate guards inside a control cycle.
#[derive(Clone, PartialEq, Debug)]
pub enum Condition {
    True,
    False,
    /// Boolean-typed expression.
    Expr(ValueExpr),
    Not(Arc<Condition>),
    And(Vec<Arc<Condition>>),
    Or(Vec<Arc<Condition>>),
    /// Implicit termination condition of a dispatched command.
    CommandDone(CommandId),
    /// Failure signal of a command dispatched in try mode.
    CommandFailed(CommandId),
    /// The function called by this node returned, optionally through a
    /// specific return label. `None` matches any return.
    CallReturned(Option<Name>),
}

impl Condition {
    pub fn always() -> Arc<Condition> {
        Arc::new(Condition::True)
    }

    /// Conjunction, collapsing the trivial cases.
    pub fn all(mut conditions: Vec<Arc<Condition>>) -> Arc<Condition> {
        conditions.retain(|c| !c.is_always_true());
        match conditions.len() {
            0 => Condition::always(),
            1 => conditions.remove(0),
            _ => Arc::new(Condition::And(conditions)),
        }
    }

    /// Disjunction, collapsing the single-operand case.
    pub fn any(mut conditions: Vec<Arc<Condition>>) -> Arc<Condition> {
        match conditions.len() {
            0 => Arc::new(Condition::False),
            1 => conditions.remove(0),
            _ => Arc::new(Condition::Or(conditions)),
        }
    }

    /// Negation that shares the operand with whoever else guards on it.
    pub fn negate(condition: &Arc<Condition>) -> Arc<Condition> {
        match &**condition {
            Condition::True => Arc::new(Condition::False),
            Condition::False => Condition::always(),
            _ => Arc::new(Condition::Not(Arc::clone(condition))),
        }
    }

    /// True if the condition holds regardless of runtime state.
    pub fn is_always_true(&self) -> bool {
        match self {
            Condition::True => true,
            Condition::Expr(expr) => expr.is_literal_true(),
            Condition::Not(inner) => matches!(**inner, Condition::False),
            Condition::And(items) => items.iter().all(|c| c.is_always_true()),
            Condition::Or(items) => items.iter().any(|c| c.is_always_true()),
            _ => false,
        }
    }

    /// Evaluate the predicate.
    pub fn evaluate(&self, state: &dyn RuntimeState) -> Result<bool, EvalError> {
        match self {
            Condition::True => Ok(true),
            Condition::False => Ok(false),
            Condition::Expr(expr) => expr
                .evaluate(state)?
                .as_bool()
                .ok_or(EvalError::TypeMismatch("condition")),
            Condition::Not(inner) => Ok(!inner.evaluate(state)?),
            Condition::And(items) => {
                for item in items {
                    if !item.evaluate(state)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Condition::Or(items) => {
                for item in items {
                    if item.evaluate(state)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Condition::CommandDone(id) => Ok(state.command_status(*id) == CommandStatus::Done),
            Condition::CommandFailed(id) => {
                Ok(state.command_status(*id) == CommandStatus::Failed)
            }
            Condition::CallReturned(wanted) => Ok(match (state.call_return(), wanted) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(used), Some(label)) => used == Some(*label),
            }),
        }
    }
}
