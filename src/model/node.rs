//! Node instances of the cast object graph.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{Field, Value, ValueMap};

/// Opaque node identifier (index into the owning [`Tree`](super::Tree)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque node type identifier, issued by the [`Schema`](crate::Schema).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub u32);

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A cast node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Concrete type (for dynamic nodes: the resolved subtype).
    pub type_id: TypeId,
    /// Constructing parent. Non-owning; only used for naming.
    pub parent: Option<NodeId>,
    /// Key under which this node was cast, if any.
    pub attr_name: Option<String>,
    /// Path segment relative to the parent (`attr`, `attr.key`, `attr[3]`).
    pub segment: Option<String>,
    /// Declared attributes in merged declaration order.
    pub attrs: IndexMap<String, Field>,
    /// Unknown keys, kept verbatim.
    pub extras: ValueMap,
}

impl Node {
    pub fn new(type_id: TypeId, parent: Option<NodeId>) -> Self {
        Self {
            type_id,
            parent,
            attr_name: None,
            segment: None,
            attrs: IndexMap::new(),
            extras: ValueMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.attrs.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.attrs.get_mut(name)
    }

    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extras.get(key)
    }

    /// Ids of the nodes this node owns, in declaration order.
    pub fn children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        for field in self.attrs.values() {
            field.collect_owned(&mut out);
        }
        out
    }
}
