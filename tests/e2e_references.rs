//! End-to-end tests for deferred reference resolution and the tree walk.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use treecast::{
    Attr, Caster, Error, Field, NodeType, RefSpec, Reference, Schema, Value, walk_nodes,
};

fn section(pairs: Vec<(&str, Value)>) -> Value {
    pairs.into_iter().collect()
}

/// Connections are declared before the cell types they point at, so every
/// reference in these documents is a forward reference.
fn schema() -> Arc<Schema> {
    let mut schema = Schema::new();
    schema
        .register(
            NodeType::new("Connection")
                .attr(Attr::key_attr("name"))
                .attr(Attr::new("presynaptic", Caster::reference(RefSpec::within("cell_types"))).required())
                .attr(Attr::new("postsynaptic", Caster::reference(RefSpec::within("cell_types"))).required()),
        )
        .unwrap();
    schema
        .register(
            NodeType::new("CellType")
                .attr(Attr::key_attr("name"))
                .attr(Attr::new("radius", Caster::float())),
        )
        .unwrap();
    schema
        .register(
            NodeType::new("Network")
                .root()
                .attr(Attr::new("connections", Caster::dict(Caster::node("Connection"))))
                .attr(Attr::new("cell_types", Caster::dict(Caster::node("CellType"))))
                .attr(Attr::new("recorded", Caster::list(Caster::reference(RefSpec::path()))))
                .attr(Attr::new("focus", Caster::reference(RefSpec::path()))),
        )
        .unwrap();
    Arc::new(schema)
}

fn cells() -> Value {
    section(vec![
        ("granule", section(vec![("radius", Value::Float(2.5))])),
        ("golgi", section(vec![("radius", Value::Int(8))])),
    ])
}

fn connection(pre: &str, post: &str) -> Value {
    section(vec![("presynaptic", Value::from(pre)), ("postsynaptic", Value::from(post))])
}

// ============================================================================
// 1. Forward references between siblings
// ============================================================================

#[test]
fn test_forward_reference_resolves() {
    let raw = section(vec![
        ("connections", section(vec![("golgi_to_granule", connection("golgi", "granule"))])),
        ("cell_types", cells()),
    ]);
    let doc = treecast::cast(&schema(), "Network", &raw, None).unwrap();

    let conn = doc.root().entry("connections", "golgi_to_granule").unwrap();
    let pre = conn.child("presynaptic").unwrap();
    let post = conn.child("postsynaptic").unwrap();
    assert_eq!(pre, doc.root().entry("cell_types", "golgi").unwrap());
    assert_eq!(post.str("name"), Some("granule"));
    assert_eq!(pre.float("radius"), Some(8.0));

    // The referenced node keeps its owner.
    assert_eq!(pre.node_name(), "{root}.cell_types.golgi");
    assert_eq!(
        conn.get("presynaptic"),
        Some(&Field::Ref(Reference::Resolved { path: "cell_types.golgi".into(), target: pre.id() }))
    );
}

#[test]
fn test_lists_of_references_and_index_paths() {
    let raw = section(vec![
        ("cell_types", cells()),
        ("recorded", Value::List(vec![Value::from("cell_types.golgi"), Value::from("cell_types.granule")])),
        ("focus", Value::from("connections.c1")),
        ("connections", section(vec![("c1", connection("granule", "granule"))])),
    ]);
    let doc = treecast::cast(&schema(), "Network", &raw, None).unwrap();

    let recorded: Vec<String> = doc.root().children("recorded").iter().map(|n| n.node_name()).collect();
    assert_eq!(recorded, vec!["{root}.cell_types.golgi", "{root}.cell_types.granule"]);
    assert_eq!(doc.root().child("focus").and_then(|n| n.str("name")), Some("c1"));
    assert!(doc.root().item("recorded", 1).is_some());
}

// ============================================================================
// 2. Unresolvable paths fail after the full build
// ============================================================================

#[test]
fn test_missing_target_fails_whole_cast() {
    let raw = section(vec![
        ("connections", section(vec![("c1", connection("golgi", "purkinje"))])),
        ("cell_types", cells()),
    ]);
    let err = treecast::cast(&schema(), "Network", &raw, None).unwrap_err();
    match err {
        Error::Cast { node, message } => {
            assert_eq!(node, "{root}.connections.c1");
            assert_eq!(
                message,
                "Could not resolve reference 'cell_types.purkinje' of attribute 'postsynaptic'"
            );
        }
        other => panic!("expected a cast error, got {other:?}"),
    }
}

#[test]
fn test_reference_must_land_on_a_node() {
    let raw = section(vec![("cell_types", cells()), ("focus", Value::from("cell_types.golgi.radius"))]);
    let err = treecast::cast(&schema(), "Network", &raw, None).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Could not resolve reference 'cell_types.golgi.radius' of attribute 'focus' in {root}"
    );
}

#[test]
fn test_first_failure_in_walk_order_is_reported() {
    let raw = section(vec![
        ("connections", section(vec![("c1", connection("nope", "granule"))])),
        ("cell_types", cells()),
        ("focus", Value::from("also.missing")),
    ]);
    let err = treecast::cast(&schema(), "Network", &raw, None).unwrap_err();
    assert_eq!(err.node(), Some("{root}.connections.c1"));
}

// ============================================================================
// 3. Tree walk
// ============================================================================

#[test]
fn test_walk_visits_in_declaration_order() {
    let raw = section(vec![
        ("cell_types", section(vec![("granule", section(vec![]))])),
        ("connections", section(vec![("c1", connection("granule", "granule"))])),
    ]);
    let doc = treecast::cast(&schema(), "Network", &raw, None).unwrap();

    let visits: Vec<(String, &str)> = walk_nodes(doc.tree(), doc.root_id())
        .map(|v| (doc.tree().node_name(v.node), v.attr))
        .collect();
    assert_eq!(
        visits,
        vec![
            ("{root}".to_string(), "connections"),
            ("{root}.connections.c1".to_string(), "name"),
            ("{root}.connections.c1".to_string(), "presynaptic"),
            ("{root}.connections.c1".to_string(), "postsynaptic"),
            ("{root}".to_string(), "cell_types"),
            ("{root}.cell_types.granule".to_string(), "name"),
            ("{root}.cell_types.granule".to_string(), "radius"),
            ("{root}".to_string(), "recorded"),
            ("{root}".to_string(), "focus"),
        ]
    );

    let depth: Vec<usize> = walk_nodes(doc.tree(), doc.root_id()).map(|v| v.parents.len()).collect();
    assert_eq!(depth, vec![0, 1, 1, 1, 0, 1, 1, 0, 0]);
}

#[test]
fn test_document_lookup() {
    let raw = section(vec![("cell_types", cells())]);
    let doc = treecast::cast(&schema(), "Network", &raw, None).unwrap();
    assert_eq!(doc.lookup("cell_types.granule").and_then(|n| n.float("radius")), Some(2.5));
    assert!(doc.lookup("cell_types.basket").is_none());
}
