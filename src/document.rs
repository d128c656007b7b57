//! Cast documents and read-only node views.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::model::*;
use crate::report::ConfigurationWarning;
use crate::resolve;
use crate::schema::Schema;

/// Where a document came from. Stamped on the root by the loader.
#[derive(Debug, Clone, PartialEq)]
pub struct Provenance {
    /// Format identifier of the parser that produced the raw tree.
    pub parser: String,
    /// Metadata returned by that parser, as-is.
    pub meta: Value,
    /// Absolute source path, if the document was read from a file.
    pub file: Option<PathBuf>,
}

/// A finished object graph: every node, its root, provenance and the
/// warnings raised while casting it.
#[derive(Debug, Clone)]
pub struct Document {
    schema: Arc<Schema>,
    tree: Tree,
    root: NodeId,
    provenance: Option<Provenance>,
    warnings: Vec<ConfigurationWarning>,
}

impl Document {
    pub(crate) fn new(
        schema: Arc<Schema>,
        tree: Tree,
        root: NodeId,
        warnings: Vec<ConfigurationWarning>,
    ) -> Self {
        Self { schema, tree, root, provenance: None, warnings }
    }

    pub(crate) fn stamp(&mut self, provenance: Provenance) {
        self.provenance = Some(provenance);
    }

    pub fn root(&self) -> NodeRef<'_> {
        NodeRef { doc: self, id: self.root }
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.tree.get(id).map(|_| NodeRef { doc: self, id })
    }

    /// Resolve a dotted path from the root (see [`resolve::lookup`]).
    pub fn lookup(&self, path: &str) -> Option<NodeRef<'_>> {
        resolve::lookup(&self.tree, self.root, path).map(|id| NodeRef { doc: self, id })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Mutable access to the graph for callers that own the document.
    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    pub fn warnings(&self) -> &[ConfigurationWarning] {
        &self.warnings
    }

    pub fn provenance(&self) -> Option<&Provenance> {
        self.provenance.as_ref()
    }

    /// Format identifier of the parser, when loaded through one.
    pub fn parser(&self) -> Option<&str> {
        self.provenance.as_ref().map(|p| p.parser.as_str())
    }

    pub fn meta(&self) -> Option<&Value> {
        self.provenance.as_ref().map(|p| &p.meta)
    }

    pub fn file(&self) -> Option<&Path> {
        self.provenance.as_ref().and_then(|p| p.file.as_deref())
    }
}

// ============================================================================
// NodeRef
// ============================================================================

/// Borrowed view of one node of a [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'d> {
    doc: &'d Document,
    id: NodeId,
}

impl<'d> NodeRef<'d> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn data(&self) -> &'d Node {
        &self.doc.tree[self.id]
    }

    pub fn type_id(&self) -> TypeId {
        self.data().type_id
    }

    /// Qualified name of the node's concrete type.
    pub fn type_name(&self) -> String {
        self.doc.schema.name_of(self.type_id())
    }

    /// True if the node's type is `qualified_name` or derives from it.
    pub fn is_instance_of(&self, qualified_name: &str) -> bool {
        self.doc
            .schema
            .type_id(qualified_name)
            .is_some_and(|iface| self.doc.schema.is_subtype(self.type_id(), iface))
    }

    pub fn attr_name(&self) -> Option<&'d str> {
        self.data().attr_name.as_deref()
    }

    /// Fully-qualified dotted name (`{root}.cells.granule`).
    pub fn node_name(&self) -> String {
        self.doc.tree.node_name(self.id)
    }

    pub fn parent(&self) -> Option<NodeRef<'d>> {
        self.data().parent.map(|id| NodeRef { doc: self.doc, id })
    }

    pub fn get(&self, attr: &str) -> Option<&'d Field> {
        self.data().get(attr)
    }

    pub fn extra(&self, key: &str) -> Option<&'d Value> {
        self.data().extra(key)
    }

    pub fn float(&self, attr: &str) -> Option<f64> {
        self.get(attr).and_then(Field::as_float)
    }

    pub fn int(&self, attr: &str) -> Option<i64> {
        self.get(attr).and_then(Field::as_int)
    }

    pub fn bool(&self, attr: &str) -> Option<bool> {
        self.get(attr).and_then(Field::as_bool)
    }

    pub fn str(&self, attr: &str) -> Option<&'d str> {
        self.get(attr).and_then(Field::as_str)
    }

    /// Child node held directly by `attr`, or the target of a resolved
    /// reference held by it.
    pub fn child(&self, attr: &str) -> Option<NodeRef<'d>> {
        self.wrap(self.get(attr)?)
    }

    /// Entry `key` of a dict attribute.
    pub fn entry(&self, attr: &str, key: &str) -> Option<NodeRef<'d>> {
        self.wrap(self.get(attr)?.as_dict()?.get(key)?)
    }

    /// Element `index` of a list attribute.
    pub fn item(&self, attr: &str, index: usize) -> Option<NodeRef<'d>> {
        self.wrap(self.get(attr)?.as_list()?.get(index)?)
    }

    /// Nodes held by a list or dict attribute, in stored order.
    pub fn children(&self, attr: &str) -> Vec<NodeRef<'d>> {
        match self.get(attr) {
            Some(Field::List(items)) => items.iter().filter_map(|f| self.wrap(f)).collect(),
            Some(Field::Dict(entries)) => entries.values().filter_map(|f| self.wrap(f)).collect(),
            Some(other) => self.wrap(other).into_iter().collect(),
            None => Vec::new(),
        }
    }

    fn wrap(&self, field: &Field) -> Option<NodeRef<'d>> {
        let id = match field {
            Field::Node(id) => *id,
            Field::Ref(reference) => reference.target()?,
            _ => return None,
        };
        self.doc.node(id)
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}
