//! Runtime values produced by expression evaluation.

use crate::ValueType;
use std::fmt;
use std::sync::Arc;

/// A dynamically typed value.
#[derive(Clone, PartialEq, Debug)]
pub enum Value {
    Int(i64),
    Double(f64),
    Bool(bool),
    String(Arc<str>),
    /// Field values in declaration order of the struct type.
    Struct(Arc<[Value]>),
}

impl Value {
    /// The zero value a freshly declared variable of type `ty` holds.
    pub fn default_for(ty: &ValueType) -> Value {
        match ty {
            ValueType::Int => Value::Int(0),
            ValueType::Double => Value::Double(0.0),
            ValueType::Bool => Value::Bool(false),
            ValueType::String => Value::String(Arc::from("")),
            ValueType::Struct(def) => Value::Struct(
                def.fields
                    .iter()
                    .map(|(_, field)| Value::default_for(field))
                    .collect(),
            ),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(
                clippy::cast_precision_loss,
                reason = "int to double widening is the language's conversion rule"
            )]
            Value::Int(i) => Some(*i as f64),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Double(d) => write!(f, "{d:?}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Struct(fields) => {
                f.write_str("{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{field}")?;
                }
                f.write_str("}")
            }
        }
    }
}
