//! Guard conditions.

use crate::{ParseError, Parser};
use std::sync::Arc;
use tact_ir::{BinaryOp, Condition, Literal, UnaryOp, ValueExpr, ValueType};

impl Parser<'_> {
    /// A boolean expression, lowered into a condition object.
    pub(crate) fn parse_condition(&mut self) -> Result<Arc<Condition>, ParseError> {
        let parsed = self.parse_expr()?;
        let ty = parsed.expr.ty();
        if ty != ValueType::Bool {
            return Err(ParseError::type_mismatch(
                "bool",
                &ty.display(self.interner()),
                parsed.span,
            ));
        }
        Ok(lower_condition(parsed.expr))
    }
}

/// Split the boolean connectives off an expression so the engine can
/// evaluate each operand as its own condition.
pub(crate) fn lower_condition(expr: ValueExpr) -> Arc<Condition> {
    match expr {
        ValueExpr::Literal(Literal::Bool(true)) => Condition::always(),
        ValueExpr::Literal(Literal::Bool(false)) => Arc::new(Condition::False),
        ValueExpr::Unary {
            op: UnaryOp::Not,
            operand,
        } => Condition::negate(&lower_condition(*operand)),
        ValueExpr::Binary {
            op: BinaryOp::And,
            lhs,
            rhs,
            ..
        } => Arc::new(Condition::And(vec![
            lower_condition(*lhs),
            lower_condition(*rhs),
        ])),
        ValueExpr::Binary {
            op: BinaryOp::Or,
            lhs,
            rhs,
            ..
        } => Arc::new(Condition::Or(vec![
            lower_condition(*lhs),
            lower_condition(*rhs),
        ])),
        other => Arc::new(Condition::Expr(other)),
    }
}
