//! Static value types of the script language.

use crate::{Name, StringInterner};
use std::sync::Arc;

/// Static type of a value-producing expression, variable or parameter.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum ValueType {
    Int,
    Double,
    Bool,
    String,
    /// Structured value described by the component context.
    Struct(Arc<StructType>),
}

/// A named record type with ordered fields.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct StructType {
    pub name: Name,
    pub fields: Vec<(Name, ValueType)>,
}

impl StructType {
    /// Field position and type by name.
    pub fn field(&self, name: Name) -> Option<(usize, &ValueType)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, (field, _))| *field == name)
            .map(|(index, (_, ty))| (index, ty))
    }
}

impl ValueType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Int | ValueType::Double)
    }

    /// Whether a value of type `source` may be stored into a slot of this type.
    ///
    /// Identical types are accepted, and `int` widens to `double`.
    pub fn accepts(&self, source: &ValueType) -> bool {
        self == source || (*self == ValueType::Double && *source == ValueType::Int)
    }

    /// Render the type the way it is spelled in scripts.
    pub fn display(&self, interner: &StringInterner) -> String {
        match self {
            ValueType::Int => "int".to_string(),
            ValueType::Double => "double".to_string(),
            ValueType::Bool => "bool".to_string(),
            ValueType::String => "string".to_string(),
            ValueType::Struct(def) => interner.lookup(def.name).to_string(),
        }
    }
}
