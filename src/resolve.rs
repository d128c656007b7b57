//! # Reference Resolution
//!
//! Runs once per document, after the whole tree exists, so a reference may
//! point at a node cast later than the node holding it.
//!
//! Two passes over the finished tree:
//! 1. walk every attribute in declaration order, depth-first, and look up
//!    the target of each [`Reference::Unresolved`];
//! 2. rebind each of them to [`Reference::Resolved`].
//!
//! The first lookup failure in walk order aborts the document.

use smallvec::SmallVec;

use crate::model::*;
use crate::{Error, Result};

/// Ancestor chain of a visited node, root first.
pub type Parents = SmallVec<[NodeId; 8]>;

// ============================================================================
// Walk
// ============================================================================

/// One declared attribute of one node, as seen by [`walk_nodes`].
#[derive(Debug, Clone)]
pub struct Visit<'t> {
    pub node: NodeId,
    pub attr: &'t str,
    pub field: &'t Field,
    /// Ancestors of `node`, root first (excludes `node`).
    pub parents: Parents,
}

/// Walk every attribute reachable from `start`.
///
/// Order: attributes of a node in declaration order; right after an
/// attribute is yielded, the nodes it owns are walked before the next
/// attribute of the same node.
pub fn walk_nodes(tree: &Tree, start: NodeId) -> Walk<'_> {
    let mut walk = Walk { tree, stack: Vec::new() };
    walk.enter(start, Parents::new());
    walk
}

struct Frame<'t> {
    node: NodeId,
    parents: Parents,
    attrs: indexmap::map::Iter<'t, String, Field>,
}

pub struct Walk<'t> {
    tree: &'t Tree,
    stack: Vec<Frame<'t>>,
}

impl<'t> Walk<'t> {
    fn enter(&mut self, node: NodeId, parents: Parents) {
        if let Some(data) = self.tree.get(node) {
            self.stack.push(Frame { node, parents, attrs: data.attrs.iter() });
        }
    }
}

impl<'t> Iterator for Walk<'t> {
    type Item = Visit<'t>;

    fn next(&mut self) -> Option<Visit<'t>> {
        loop {
            let frame = self.stack.last_mut()?;
            let Some((attr, field)) = frame.attrs.next() else {
                self.stack.pop();
                continue;
            };
            let visit = Visit { node: frame.node, attr, field, parents: frame.parents.clone() };

            let mut owned = Vec::new();
            field.collect_owned(&mut owned);
            if !owned.is_empty() {
                let mut child_parents = visit.parents.clone();
                child_parents.push(visit.node);
                for child in owned.into_iter().rev() {
                    self.enter(child, child_parents.clone());
                }
            }
            return Some(visit);
        }
    }
}

// ============================================================================
// Lookup
// ============================================================================

/// Follow a dotted path from `root` through owned structure.
///
/// Segments name attributes of nodes, keys of dict attributes, or indices of
/// list attributes; `cells[2]` and `cells.2` are equivalent. References are
/// not followed. Only paths ending on a node resolve.
pub fn lookup(tree: &Tree, root: NodeId, path: &str) -> Option<NodeId> {
    enum Cursor<'t> {
        Node(NodeId),
        Field(&'t Field),
    }

    fn step<'t>(tree: &'t Tree, cursor: Cursor<'t>, name: &str) -> Option<Cursor<'t>> {
        let field = match cursor {
            Cursor::Node(id) => tree.get(id)?.get(name)?,
            Cursor::Field(Field::Node(id)) => tree.get(*id)?.get(name)?,
            Cursor::Field(Field::Dict(entries)) => entries.get(name)?,
            Cursor::Field(Field::List(items)) => items.get(name.parse::<usize>().ok()?)?,
            Cursor::Field(_) => return None,
        };
        Some(Cursor::Field(field))
    }

    if path.is_empty() {
        return None;
    }
    let mut cursor = Cursor::Node(root);
    for segment in path.split('.') {
        let (name, indices) = split_indices(segment)?;
        cursor = step(tree, cursor, name)?;
        for index in indices {
            cursor = step(tree, cursor, index)?;
        }
    }
    match cursor {
        Cursor::Node(id) => Some(id),
        Cursor::Field(Field::Node(id)) => Some(*id),
        Cursor::Field(_) => None,
    }
}

/// `cells[2][0]` → (`cells`, [`2`, `0`]).
fn split_indices(segment: &str) -> Option<(&str, Vec<&str>)> {
    let Some(open) = segment.find('[') else {
        return (!segment.is_empty()).then_some((segment, Vec::new()));
    };
    let (name, mut rest) = segment.split_at(open);
    let mut indices = Vec::new();
    while let Some(inner) = rest.strip_prefix('[') {
        let close = inner.find(']')?;
        indices.push(&inner[..close]);
        rest = &inner[close + 1..];
    }
    if !rest.is_empty() || name.is_empty() {
        return None;
    }
    Some((name, indices))
}

// ============================================================================
// Resolution
// ============================================================================

/// Position of a reference inside an attribute value.
#[derive(Debug, Clone, Copy)]
enum Step {
    Item(usize),
    Entry(usize),
}

struct Binding {
    node: NodeId,
    attr: String,
    steps: SmallVec<[Step; 4]>,
    path: String,
    target: NodeId,
}

/// Bind every unresolved reference under `root`. Returns the number bound.
pub fn resolve_references(tree: &mut Tree, root: NodeId) -> Result<usize> {
    let mut bindings = Vec::new();
    for visit in walk_nodes(tree, root) {
        let mut pending = Vec::new();
        find_unresolved(visit.field, &mut SmallVec::new(), &mut pending);
        for (steps, path) in pending {
            let target = lookup(tree, root, &path).ok_or_else(|| {
                Error::cast(
                    tree.node_name(visit.node),
                    format!("Could not resolve reference '{path}' of attribute '{}'", visit.attr),
                )
            })?;
            bindings.push(Binding { node: visit.node, attr: visit.attr.to_owned(), steps, path, target });
        }
    }

    let count = bindings.len();
    for binding in bindings {
        let slot = tree
            .get_mut(binding.node)
            .and_then(|n| n.get_mut(&binding.attr))
            .and_then(|f| descend(f, &binding.steps));
        if let Some(field) = slot {
            *field = Field::Ref(Reference::Resolved { path: binding.path, target: binding.target });
        }
    }
    tracing::debug!(references = count, "references resolved");
    Ok(count)
}

fn find_unresolved(
    field: &Field,
    steps: &mut SmallVec<[Step; 4]>,
    out: &mut Vec<(SmallVec<[Step; 4]>, String)>,
) {
    match field {
        Field::Ref(Reference::Unresolved(path)) => out.push((steps.clone(), path.clone())),
        Field::List(items) => {
            for (i, item) in items.iter().enumerate() {
                steps.push(Step::Item(i));
                find_unresolved(item, steps, out);
                steps.pop();
            }
        }
        Field::Dict(entries) => {
            for (i, item) in entries.values().enumerate() {
                steps.push(Step::Entry(i));
                find_unresolved(item, steps, out);
                steps.pop();
            }
        }
        _ => {}
    }
}

fn descend<'f>(mut field: &'f mut Field, steps: &[Step]) -> Option<&'f mut Field> {
    for step in steps {
        field = match (field, step) {
            (Field::List(items), Step::Item(i)) => items.get_mut(*i)?,
            (Field::Dict(entries), Step::Entry(i)) => entries.get_index_mut(*i)?.1,
            _ => return None,
        };
    }
    Some(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// root { cells: {a: Node, b: Node}, order: [Node], link: Ref("cells.b") }
    fn sample() -> (Tree, NodeId, NodeId, NodeId, NodeId) {
        let mut tree = Tree::new();
        let root = tree.push(Node::new(TypeId(0), None)).unwrap();
        let mk = |tree: &mut Tree, segment: &str| {
            let mut n = Node::new(TypeId(1), Some(root));
            n.segment = Some(segment.into());
            tree.push(n).unwrap()
        };
        let a = mk(&mut tree, "cells.a");
        let b = mk(&mut tree, "cells.b");
        let c = mk(&mut tree, "order[0]");
        tree[root].attrs.insert(
            "link".into(),
            Field::Ref(Reference::Unresolved("cells.b".into())),
        );
        tree[root].attrs.insert(
            "cells".into(),
            Field::Dict([("a".to_string(), Field::Node(a)), ("b".to_string(), Field::Node(b))].into_iter().collect()),
        );
        tree[root].attrs.insert("order".into(), Field::List(vec![Field::Node(c)]));
        (tree, root, a, b, c)
    }

    #[test]
    fn test_lookup_paths() {
        let (tree, root, a, b, c) = sample();
        assert_eq!(lookup(&tree, root, "cells.a"), Some(a));
        assert_eq!(lookup(&tree, root, "cells.b"), Some(b));
        assert_eq!(lookup(&tree, root, "order.0"), Some(c));
        assert_eq!(lookup(&tree, root, "order[0]"), Some(c));
        assert_eq!(lookup(&tree, root, "order[1]"), None);
        assert_eq!(lookup(&tree, root, "cells"), None);
        assert_eq!(lookup(&tree, root, "link"), None);
        assert_eq!(lookup(&tree, root, ""), None);
    }

    #[test]
    fn test_split_indices() {
        assert_eq!(split_indices("cells"), Some(("cells", vec![])));
        assert_eq!(split_indices("cells[2][0]"), Some(("cells", vec!["2", "0"])));
        assert_eq!(split_indices("cells[2"), None);
        assert_eq!(split_indices("[2]"), None);
    }

    #[test]
    fn test_walk_order_interleaves_children() {
        let (tree, root, a, b, c) = sample();
        let seen: Vec<(NodeId, &str)> = walk_nodes(&tree, root).map(|v| (v.node, v.attr)).collect();
        assert_eq!(seen, vec![(root, "link"), (root, "cells"), (root, "order")]);
        // Children carry no attributes here; add one to each and re-walk.
        let mut tree = tree;
        for id in [a, b, c] {
            tree[id].attrs.insert("x".into(), Field::Null);
        }
        let seen: Vec<(NodeId, &str)> = walk_nodes(&tree, root).map(|v| (v.node, v.attr)).collect();
        assert_eq!(
            seen,
            vec![(root, "link"), (root, "cells"), (a, "x"), (b, "x"), (root, "order"), (c, "x")]
        );
        let parents: Vec<Parents> = walk_nodes(&tree, root).map(|v| v.parents).collect();
        assert!(parents[0].is_empty());
        assert_eq!(parents[2].as_slice(), &[root]);
    }

    #[test]
    fn test_resolve_binds_forward_reference() {
        let (mut tree, root, _, b, _) = sample();
        assert_eq!(resolve_references(&mut tree, root).unwrap(), 1);
        assert_eq!(
            tree[root].get("link"),
            Some(&Field::Ref(Reference::Resolved { path: "cells.b".into(), target: b }))
        );
    }

    #[test]
    fn test_resolve_nested_reference_lists() {
        let (mut tree, root, a, b, _) = sample();
        tree[root].attrs.insert(
            "targets".into(),
            Field::List(vec![
                Field::Ref(Reference::Unresolved("cells.a".into())),
                Field::Ref(Reference::Unresolved("cells.b".into())),
            ]),
        );
        assert_eq!(resolve_references(&mut tree, root).unwrap(), 3);
        let targets: Vec<Option<NodeId>> = tree[root]
            .get("targets")
            .and_then(Field::as_list)
            .unwrap()
            .iter()
            .map(|f| f.as_reference().and_then(Reference::target))
            .collect();
        assert_eq!(targets, vec![Some(a), Some(b)]);
    }

    #[test]
    fn test_unresolvable_reference_fails() {
        let (mut tree, root, _, _, _) = sample();
        tree[root].attrs.insert("bad".into(), Field::Ref(Reference::Unresolved("cells.z".into())));
        let err = resolve_references(&mut tree, root).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not resolve reference 'cells.z' of attribute 'bad' in {root}"
        );
    }
}
