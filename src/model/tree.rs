//! Arena owning every node of one cast document.
//!
//! Ownership flows strictly parent → child through [`Field::Node`] entries.
//! Parent pointers and references are plain [`NodeId`]s, so the arena never
//! holds a cycle of owning handles.

use std::ops::{Index, IndexMut};

use super::{Node, NodeId};

/// Name reported for a node without a parent.
pub const ROOT_NAME: &str = "{root}";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node. `None` once the id space is exhausted.
    pub(crate) fn push(&mut self, node: Node) -> Option<NodeId> {
        let id = NodeId(u32::try_from(self.nodes.len()).ok()?);
        self.nodes.push(node);
        Some(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i as u32), n))
    }

    /// Fully-qualified dotted name of a node: `{root}.attr.key.child[0]`.
    pub fn node_name(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut cursor = self.get(id);
        while let Some(node) = cursor {
            match (node.parent, node.segment.as_deref()) {
                (Some(parent), Some(segment)) => {
                    segments.push(segment);
                    cursor = self.get(parent);
                }
                _ => break,
            }
        }
        let mut name = String::from(ROOT_NAME);
        for segment in segments.iter().rev() {
            name.push('.');
            name.push_str(segment);
        }
        name
    }

    /// Node ids reachable from `start` through owned children, pre-order.
    pub fn preorder(&self, start: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else { continue };
            out.push(id);
            let children = node.children();
            stack.extend(children.into_iter().rev());
        }
        out
    }
}

impl Index<NodeId> for Tree {
    type Output = Node;

    /// Panics if `id` was not issued by this tree.
    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }
}

impl IndexMut<NodeId> for Tree {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }
}
