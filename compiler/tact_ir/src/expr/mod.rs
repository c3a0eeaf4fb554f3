//! Value-producing objects.
//!
//! The expression sub-parser produces a typed [`ValueExpr`] tree. All type
//! checking happens during parsing; evaluation assumes well-typed trees and
//! reports [`EvalError::TypeMismatch`] only if a [`RuntimeState`] hands back
//! values of the wrong shape.

use crate::{EvalError, Name, RuntimeState, Value, ValueType};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// Index of a variable or parameter in its owning graph's variable table.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct VarId(u32);

impl VarId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        VarId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Path of peer names from the root component to the addressed component.
///
/// An empty path addresses the root component itself.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct ComponentPath(SmallVec<[Name; 2]>);

impl ComponentPath {
    pub fn root() -> Self {
        ComponentPath(SmallVec::new())
    }

    pub fn from_peers(peers: impl IntoIterator<Item = Name>) -> Self {
        ComponentPath(peers.into_iter().collect())
    }

    pub fn peers(&self) -> &[Name] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar literal written in the script.
#[derive(Clone, PartialEq, Debug)]
pub enum Literal {
    Int(i64),
    Double(f64),
    Bool(bool),
    String(Arc<str>),
}

impl Literal {
    pub fn ty(&self) -> ValueType {
        match self {
            Literal::Int(_) => ValueType::Int,
            Literal::Double(_) => ValueType::Double,
            Literal::Bool(_) => ValueType::Bool,
            Literal::String(_) => ValueType::String,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Literal::Int(i) => Value::Int(*i),
            Literal::Double(d) => Value::Double(*d),
            Literal::Bool(b) => Value::Bool(*b),
            Literal::String(s) => Value::String(Arc::clone(s)),
        }
    }
}

/// A typed, re-evaluable value-producing object.
#[derive(Clone, PartialEq, Debug)]
pub enum ValueExpr {
    Literal(Literal),
    /// Graph-local variable or function parameter.
    Var { id: VarId, ty: ValueType },
    /// Attribute of a component, read at evaluation time.
    Attribute {
        path: ComponentPath,
        name: Name,
        ty: ValueType,
    },
    /// Synchronous component query.
    Query {
        path: ComponentPath,
        name: Name,
        args: Vec<ValueExpr>,
        ty: ValueType,
    },
    Field {
        base: Box<ValueExpr>,
        index: usize,
        ty: ValueType,
    },
    /// Implicit `int` → `double` conversion inserted by the type checker.
    Widen(Box<ValueExpr>),
    Unary {
        op: UnaryOp,
        operand: Box<ValueExpr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<ValueExpr>,
        rhs: Box<ValueExpr>,
        ty: ValueType,
    },
}

impl ValueExpr {
    /// Static type of the expression.
    pub fn ty(&self) -> ValueType {
        match self {
            ValueExpr::Literal(literal) => literal.ty(),
            ValueExpr::Var { ty, .. }
            | ValueExpr::Attribute { ty, .. }
            | ValueExpr::Query { ty, .. }
            | ValueExpr::Field { ty, .. }
            | ValueExpr::Binary { ty, .. } => ty.clone(),
            ValueExpr::Widen(_) => ValueType::Double,
            ValueExpr::Unary { op, operand } => match op {
                UnaryOp::Neg => operand.ty(),
                UnaryOp::Not => ValueType::Bool,
            },
        }
    }

    /// Wrap `self` so it can be stored into a slot of type `target`.
    ///
    /// Returns `None` when the types are incompatible.
    pub fn coerce_to(self, target: &ValueType) -> Option<ValueExpr> {
        let ty = self.ty();
        if ty == *target {
            Some(self)
        } else if target.accepts(&ty) {
            Some(ValueExpr::Widen(Box::new(self)))
        } else {
            None
        }
    }

    /// True if the expression is the literal `true`.
    pub fn is_literal_true(&self) -> bool {
        matches!(self, ValueExpr::Literal(Literal::Bool(true)))
    }

    /// Evaluate against the given runtime state.
    pub fn evaluate(&self, state: &dyn RuntimeState) -> Result<Value, EvalError> {
        match self {
            ValueExpr::Literal(literal) => Ok(literal.to_value()),
            ValueExpr::Var { id, .. } => state
                .variable(*id)
                .ok_or(EvalError::UnboundVariable(*id)),
            ValueExpr::Attribute { path, name, .. } => state
                .attribute(path, *name)
                .ok_or(EvalError::UnboundMember(*name)),
            ValueExpr::Query {
                path, name, args, ..
            } => {
                let args = args
                    .iter()
                    .map(|arg| arg.evaluate(state))
                    .collect::<Result<Vec<_>, _>>()?;
                state
                    .query(path, *name, &args)
                    .ok_or(EvalError::UnboundMember(*name))
            }
            ValueExpr::Field { base, index, .. } => match base.evaluate(state)? {
                Value::Struct(fields) => fields
                    .get(*index)
                    .cloned()
                    .ok_or(EvalError::TypeMismatch(".")),
                _ => Err(EvalError::TypeMismatch(".")),
            },
            ValueExpr::Widen(inner) => inner
                .evaluate(state)?
                .as_f64()
                .map(Value::Double)
                .ok_or(EvalError::TypeMismatch("double")),
            ValueExpr::Unary { op, operand } => {
                let value = operand.evaluate(state)?;
                match (op, value) {
                    (UnaryOp::Neg, Value::Int(i)) => {
                        i.checked_neg().map(Value::Int).ok_or(EvalError::Overflow)
                    }
                    (UnaryOp::Neg, Value::Double(d)) => Ok(Value::Double(-d)),
                    (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                    (UnaryOp::Neg, _) => Err(EvalError::TypeMismatch("-")),
                    (UnaryOp::Not, _) => Err(EvalError::TypeMismatch("!")),
                }
            }
            ValueExpr::Binary { op, lhs, rhs, .. } => eval_binary(*op, lhs, rhs, state),
        }
    }
}

fn eval_binary(
    op: BinaryOp,
    lhs: &ValueExpr,
    rhs: &ValueExpr,
    state: &dyn RuntimeState,
) -> Result<Value, EvalError> {
    // Logical operators short-circuit.
    if op.is_logical() {
        let left = lhs
            .evaluate(state)?
            .as_bool()
            .ok_or(EvalError::TypeMismatch(op.as_str()))?;
        let decided = match op {
            BinaryOp::And => !left,
            _ => left,
        };
        if decided {
            return Ok(Value::Bool(left));
        }
        let right = rhs
            .evaluate(state)?
            .as_bool()
            .ok_or(EvalError::TypeMismatch(op.as_str()))?;
        return Ok(Value::Bool(right));
    }

    let left = lhs.evaluate(state)?;
    let right = rhs.evaluate(state)?;
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => eval_int(op, a, b),
        (Value::Double(a), Value::Double(b)) => eval_double(op, a, b),
        (Value::String(a), Value::String(b)) => match op {
            BinaryOp::Add => Ok(Value::String(Arc::from(format!("{a}{b}")))),
            _ if op.is_comparison() => Ok(Value::Bool(compare(op, a.cmp(&b)))),
            _ => Err(EvalError::TypeMismatch(op.as_str())),
        },
        (Value::Bool(a), Value::Bool(b)) => match op {
            BinaryOp::Eq => Ok(Value::Bool(a == b)),
            BinaryOp::NotEq => Ok(Value::Bool(a != b)),
            _ => Err(EvalError::TypeMismatch(op.as_str())),
        },
        _ => Err(EvalError::TypeMismatch(op.as_str())),
    }
}

fn eval_int(op: BinaryOp, a: i64, b: i64) -> Result<Value, EvalError> {
    let value = match op {
        BinaryOp::Add => a.checked_add(b).ok_or(EvalError::Overflow)?,
        BinaryOp::Sub => a.checked_sub(b).ok_or(EvalError::Overflow)?,
        BinaryOp::Mul => a.checked_mul(b).ok_or(EvalError::Overflow)?,
        BinaryOp::Div | BinaryOp::Rem if b == 0 => return Err(EvalError::DivisionByZero),
        BinaryOp::Div => a.checked_div(b).ok_or(EvalError::Overflow)?,
        BinaryOp::Rem => a.checked_rem(b).ok_or(EvalError::Overflow)?,
        _ => return Ok(Value::Bool(compare(op, a.cmp(&b)))),
    };
    Ok(Value::Int(value))
}

fn eval_double(op: BinaryOp, a: f64, b: f64) -> Result<Value, EvalError> {
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Rem => a % b,
        _ => {
            // NaN compares unequal to everything, matching IEEE semantics.
            return Ok(Value::Bool(match a.partial_cmp(&b) {
                Some(ordering) => compare(op, ordering),
                None => op == BinaryOp::NotEq,
            }));
        }
    };
    Ok(Value::Double(value))
}

fn compare(op: BinaryOp, ordering: std::cmp::Ordering) -> bool {
    use std::cmp::Ordering::{Equal, Greater, Less};
    match op {
        BinaryOp::Eq => ordering == Equal,
        BinaryOp::NotEq => ordering != Equal,
        BinaryOp::Lt => ordering == Less,
        BinaryOp::LtEq => ordering != Greater,
        BinaryOp::Gt => ordering == Greater,
        BinaryOp::GtEq => ordering != Less,
        _ => false,
    }
}
