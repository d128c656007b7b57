//! Scalar coercion.

use crate::model::Value;

/// Target kind of a scalar attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Int,
    Float,
    Str,
}

impl ScalarKind {
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Int => "int",
            ScalarKind::Float => "float",
            ScalarKind::Str => "str",
        }
    }

    /// Coerce `value` to this kind. `None` if it cannot be represented.
    ///
    /// - float: floats, integers, numeric strings
    /// - int: integers, integral floats, integer strings
    /// - bool: booleans, `"true"` / `"false"`
    /// - str: any scalar except null
    pub fn coerce(self, value: &Value) -> Option<Value> {
        match self {
            ScalarKind::Float => match value {
                Value::String(s) => s.trim().parse::<f64>().ok().map(Value::Float),
                other => other.as_float().map(Value::Float),
            },
            ScalarKind::Int => match value {
                Value::String(s) => s.trim().parse::<i64>().ok().map(Value::Int),
                other => other.as_int().map(Value::Int),
            },
            ScalarKind::Bool => match value {
                Value::Bool(b) => Some(Value::Bool(*b)),
                Value::String(s) if s.eq_ignore_ascii_case("true") => Some(Value::Bool(true)),
                Value::String(s) if s.eq_ignore_ascii_case("false") => Some(Value::Bool(false)),
                _ => None,
            },
            ScalarKind::Str => match value {
                Value::String(s) => Some(Value::String(s.clone())),
                Value::Int(i) => Some(Value::String(i.to_string())),
                Value::Float(f) => Some(Value::String(f.to_string())),
                Value::Bool(b) => Some(Value::String(b.to_string())),
                _ => None,
            },
        }
    }
}
