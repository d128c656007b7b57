//! Cast attribute values.

use indexmap::IndexMap;

use super::{NodeId, TypeId, Value};

/// The value stored for a declared attribute once it has been cast.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// Optional attribute without a value or default.
    Null,
    /// Scalar (or verbatim raw) value.
    Value(Value),
    /// Owned child node.
    Node(NodeId),
    /// Sequence attribute, element order preserved.
    List(Vec<Field>),
    /// Mapping attribute, document order preserved.
    Dict(IndexMap<String, Field>),
    /// Cross-tree link. Never owning.
    Ref(Reference),
    /// Node type handle produced by a class attribute.
    Type(TypeId),
}

/// Reference attribute state.
///
/// Casting produces `Unresolved`; the reference resolver turns every one of
/// them into `Resolved` once the whole document exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Unresolved(String),
    Resolved { path: String, target: NodeId },
}

impl Reference {
    pub fn path(&self) -> &str {
        match self {
            Reference::Unresolved(path) => path,
            Reference::Resolved { path, .. } => path,
        }
    }

    pub fn target(&self) -> Option<NodeId> {
        match self {
            Reference::Unresolved(_) => None,
            Reference::Resolved { target, .. } => Some(*target),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Reference::Resolved { .. })
    }
}

impl Field {
    pub fn type_name(&self) -> &'static str {
        match self {
            Field::Null => "NULL",
            Field::Value(v) => v.type_name(),
            Field::Node(_) => "NODE",
            Field::List(_) => "LIST",
            Field::Dict(_) => "DICT",
            Field::Ref(_) => "REFERENCE",
            Field::Type(_) => "TYPE",
        }
    }

    pub fn is_null(&self) -> bool { matches!(self, Field::Null | Field::Value(Value::Null)) }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> { self.as_value().and_then(Value::as_float) }
    pub fn as_int(&self) -> Option<i64> { self.as_value().and_then(Value::as_int) }
    pub fn as_bool(&self) -> Option<bool> { self.as_value().and_then(Value::as_bool) }
    pub fn as_str(&self) -> Option<&str> { self.as_value().and_then(Value::as_str) }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Field::Node(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Field]> {
        match self {
            Field::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&IndexMap<String, Field>> {
        match self {
            Field::Dict(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Field::Ref(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<TypeId> {
        match self {
            Field::Type(t) => Some(*t),
            _ => None,
        }
    }

    /// Push every owned child node id, depth-first in storage order.
    /// References are skipped: they do not own their target.
    pub(crate) fn collect_owned(&self, out: &mut Vec<NodeId>) {
        match self {
            Field::Node(id) => out.push(*id),
            Field::List(items) => items.iter().for_each(|f| f.collect_owned(out)),
            Field::Dict(entries) => entries.values().for_each(|f| f.collect_owned(out)),
            _ => {}
        }
    }
}

impl From<Value> for Field {
    fn from(v: Value) -> Self { Field::Value(v) }
}
