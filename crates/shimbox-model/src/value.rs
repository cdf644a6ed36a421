//! Declared type tags and runtime values.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::heap::{Heap, InstanceId};

/// Declared type of a parameter, field, or return channel.
///
/// `Bool`, `Int`, `Float`, and `Str` are value kinds; `Obj` is the reference
/// kind and the only one that admits `Null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    Bool,
    Int,
    Float,
    Str,
    /// Reference kind, carrying the declared type name. Nullable.
    Obj(String),
}

impl TypeTag {
    pub fn is_reference(&self) -> bool {
        matches!(self, TypeTag::Obj(_))
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Bool => write!(f, "Bool"),
            TypeTag::Int => write!(f, "Int"),
            TypeTag::Float => write!(f, "Float"),
            TypeTag::Str => write!(f, "Str"),
            TypeTag::Obj(name) => write!(f, "{name}"),
        }
    }
}

/// A runtime value as it crosses the trampoline surface.
///
/// Reference-typed values carry an [`InstanceId`], so identity is preserved
/// through argument capture; value kinds compare by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Obj(InstanceId),
}

impl Value {
    /// Runtime type description, resolving object handles through the heap.
    pub fn type_name(&self, heap: &Heap) -> String {
        match self {
            Value::Null => "Null".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Float(_) => "Float".to_string(),
            Value::Str(_) => "Str".to_string(),
            Value::Obj(id) => heap
                .type_of(*id)
                .map(str::to_string)
                .unwrap_or_else(|| format!("<dangling {id}>")),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v:?}"),
            Value::Obj(id) => write!(f, "{id}"),
        }
    }
}

/// Argument vector crossing the uniformly-typed trampoline surface.
///
/// Inline capacity covers the receiver plus typical parameter counts without
/// spilling; the engine caps declared parameters at ten.
pub type ArgVec = SmallVec<[Value; 8]>;
