//! # Tree Caster
//!
//! Turns a raw section plus a declared node type into a node of the arena,
//! recursing into child nodes, sequences and mappings as the attribute
//! descriptors dictate.
//!
//! ```text
//! raw Value ──► cast_node ──► dynamic::resolve (dynamic types only)
//!                  │
//!                  ├─► per attribute: cast_field ──► cast_node (children)
//!                  ├─► unknown keys: warning + Node::extras
//!                  ▼
//!            resolve::resolve_references (once per document)
//! ```

pub mod dynamic;
pub mod scalar;

pub use dynamic::{ClassRef, load_class};
pub use scalar::ScalarKind;

use std::sync::Arc;

use indexmap::IndexMap;

use crate::config::CastConfig;
use crate::document::Document;
use crate::model::*;
use crate::report::{ConfigurationWarning, Reporter, TracingReporter};
use crate::resolve;
use crate::schema::{Caster, Schema};
use crate::{Error, Result};

// ============================================================================
// CastScope
// ============================================================================

/// Context handed to [`Caster::Func`] closures.
pub struct CastScope<'a> {
    tree: &'a Tree,
    schema: &'a Schema,
    node: NodeId,
    attr: &'a str,
    key: Option<&'a str>,
}

impl<'a> CastScope<'a> {
    /// Node owning the attribute being cast.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn node_name(&self) -> String {
        self.tree.node_name(self.node)
    }

    pub fn attr(&self) -> &str {
        self.attr
    }

    /// Key of the element being cast (the attribute name, or the mapping key
    /// for entries of a dict attribute).
    pub fn key(&self) -> Option<&str> {
        self.key
    }

    pub fn schema(&self) -> &Schema {
        self.schema
    }

    pub fn tree(&self) -> &Tree {
        self.tree
    }

    /// A cast error located at the owning node.
    pub fn error(&self, message: impl std::fmt::Display) -> Error {
        Error::cast(self.node_name(), format!("{message} for attribute '{}'", self.attr))
    }
}

// ============================================================================
// TreeCaster
// ============================================================================

/// Builds one document. Consumed by [`cast_document`](Self::cast_document).
pub struct TreeCaster {
    schema: Arc<Schema>,
    config: CastConfig,
    reporter: Arc<dyn Reporter>,
    tree: Tree,
    warnings: Vec<ConfigurationWarning>,
    depth: usize,
}

impl TreeCaster {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            config: CastConfig::default(),
            reporter: Arc::new(TracingReporter),
            tree: Tree::new(),
            warnings: Vec::new(),
            depth: 0,
        }
    }

    pub fn with_config(mut self, config: CastConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Cast a document rooted at `declared`, then bind its references.
    ///
    /// On any error nothing is returned: a partial graph never escapes.
    pub fn cast_document(mut self, section: &Value, declared: TypeId, key: Option<&str>) -> Result<Document> {
        tracing::debug!(root_type = %self.schema.name_of(declared), "casting document");
        let root = self.cast_node(declared, section, None, key, None)?;
        let bound = resolve::resolve_references(&mut self.tree, root)?;
        tracing::debug!(
            nodes = self.tree.len(),
            references = bound,
            warnings = self.warnings.len(),
            "document cast",
        );
        Ok(Document::new(self.schema, self.tree, root, self.warnings))
    }

    fn cast_node(
        &mut self,
        declared: TypeId,
        section: &Value,
        parent: Option<NodeId>,
        key: Option<&str>,
        segment: Option<String>,
    ) -> Result<NodeId> {
        if self.depth >= self.config.max_depth {
            return Err(Error::cast(
                self.pending_name(parent, segment.as_deref()),
                format!("Maximum nesting depth of {} exceeded", self.config.max_depth),
            ));
        }
        self.depth += 1;
        let result = self.build_node(declared, section, parent, key, segment);
        self.depth -= 1;
        result
    }

    fn build_node(
        &mut self,
        declared: TypeId,
        section: &Value,
        parent: Option<NodeId>,
        key: Option<&str>,
        segment: Option<String>,
    ) -> Result<NodeId> {
        let Value::Map(map) = section else {
            return Err(Error::cast(
                self.pending_name(parent, segment.as_deref()),
                format!("Expected a mapping, got {}", section.type_name()),
            ));
        };

        let is_dynamic = self.schema.node_type(declared).is_some_and(|t| t.is_dynamic());
        let concrete = if is_dynamic {
            let pending = self.pending_name(parent, segment.as_deref());
            dynamic::resolve(&self.schema, &self.config, map, declared, &pending)?
        } else {
            declared
        };
        let consumed = dynamic::discriminator(&self.schema, declared, &self.config).map(str::to_owned);

        // Parent and key go in before any attribute is cast so host casters
        // can name the node in their errors.
        let mut node = Node::new(concrete, parent);
        node.attr_name = key.map(str::to_owned);
        node.segment = segment;
        let Some(id) = self.tree.push(node) else {
            let owner = parent.map_or_else(|| ROOT_NAME.to_owned(), |p| self.tree.node_name(p));
            return Err(Error::cast(owner, "Node limit of the document exceeded"));
        };
        tracing::trace!(
            node = %self.tree.node_name(id),
            node_type = %self.schema.name_of(concrete),
            "casting node",
        );

        let attrs = self.schema.attrs(concrete);
        let mut fields = IndexMap::with_capacity(attrs.len());
        for attr in attrs.values() {
            let mut field = match map.get(&attr.name) {
                Some(raw) => self.cast_field(&attr.caster, raw, id, &attr.name, Some(attr.name.as_str()), &attr.name)?,
                None if attr.required && !attr.key => {
                    return Err(Error::cast(
                        self.tree.node_name(id),
                        format!("Missing required attribute '{}'", attr.name),
                    ));
                }
                None => attr.default.produce(),
            };
            if attr.key {
                if let Some(key) = key {
                    field = self.key_field(&attr.caster, key, id, &attr.name)?;
                }
            }
            fields.insert(attr.name.clone(), field);
        }

        let mut extras = ValueMap::new();
        for (name, raw) in map {
            if attrs.contains_key(name) || consumed.as_deref() == Some(name.as_str()) {
                continue;
            }
            if self.config.warn_unknown {
                let warning = ConfigurationWarning { node: self.tree.node_name(id), key: name.clone() };
                self.reporter.warn(&warning);
                self.warnings.push(warning);
            }
            if self.config.preserve_unknown {
                extras.insert(name.clone(), raw.clone());
            }
        }

        let node = &mut self.tree[id];
        node.attrs = fields;
        node.extras = extras;
        Ok(id)
    }

    fn cast_field(
        &mut self,
        caster: &Caster,
        raw: &Value,
        owner: NodeId,
        attr: &str,
        key: Option<&str>,
        segment: &str,
    ) -> Result<Field> {
        match caster {
            Caster::Any => Ok(Field::Value(raw.clone())),

            Caster::Scalar(kind) => kind.coerce(raw).map(Field::Value).ok_or_else(|| {
                self.attr_error(owner, attr, format!("Could not cast {raw} to {}", kind.name()))
            }),

            Caster::Node(type_name) => {
                let ty = self.schema.require(type_name)?;
                let child = self.cast_node(ty, raw, Some(owner), key, Some(segment.to_owned()))?;
                Ok(Field::Node(child))
            }

            Caster::List(inner) => {
                let Value::List(items) = raw else {
                    return Err(self.attr_error(owner, attr, format!("Expected a list, got {}", raw.type_name())));
                };
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    out.push(self.cast_field(inner, item, owner, attr, None, &format!("{segment}[{i}]"))?);
                }
                Ok(Field::List(out))
            }

            Caster::Dict(inner) => {
                let Value::Map(entries) = raw else {
                    return Err(self.attr_error(owner, attr, format!("Expected a mapping, got {}", raw.type_name())));
                };
                let mut out = IndexMap::with_capacity(entries.len());
                for (entry_key, item) in entries {
                    let field = self.cast_field(
                        inner,
                        item,
                        owner,
                        attr,
                        Some(entry_key.as_str()),
                        &format!("{segment}.{entry_key}"),
                    )?;
                    out.insert(entry_key.clone(), field);
                }
                Ok(Field::Dict(out))
            }

            Caster::Ref(spec) => match raw {
                Value::String(path) => Ok(Field::Ref(Reference::Unresolved(spec.lookup_path(path)))),
                other => Err(self.attr_error(
                    owner,
                    attr,
                    format!("Expected a reference path, got {}", other.type_name()),
                )),
            },

            Caster::Class(interface) => {
                let interface = interface.as_deref().map(|name| self.schema.require(name)).transpose()?;
                let Some(class) = ClassRef::from_value(raw) else {
                    return Err(self.attr_error(
                        owner,
                        attr,
                        format!("Expected a dotted type name, got {}", raw.type_name()),
                    ));
                };
                let node = self.tree.node_name(owner);
                dynamic::load_class(&self.schema, class, interface, &node).map(Field::Type)
            }

            Caster::Func(f) => {
                let scope = CastScope { tree: &self.tree, schema: &self.schema, node: owner, attr, key };
                f(raw, &scope)
            }
        }
    }

    /// Value of a key attribute: the key itself, coerced when the attribute
    /// declares a scalar kind.
    fn key_field(&self, caster: &Caster, key: &str, owner: NodeId, attr: &str) -> Result<Field> {
        let raw = Value::String(key.to_owned());
        match caster {
            Caster::Scalar(kind) => kind.coerce(&raw).map(Field::Value).ok_or_else(|| {
                self.attr_error(owner, attr, format!("Could not cast key {raw} to {}", kind.name()))
            }),
            _ => Ok(Field::Value(raw)),
        }
    }

    fn attr_error(&self, owner: NodeId, attr: &str, message: String) -> Error {
        Error::cast(self.tree.node_name(owner), format!("{message} for attribute '{attr}'"))
    }

    /// Name of a node that is about to be created.
    fn pending_name(&self, parent: Option<NodeId>, segment: Option<&str>) -> String {
        match (parent, segment) {
            (Some(parent), Some(segment)) => format!("{}.{segment}", self.tree.node_name(parent)),
            _ => ROOT_NAME.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::CollectingReporter;
    use crate::schema::{Attr, NodeType, RefSpec};

    fn section(pairs: Vec<(&str, Value)>) -> Value {
        pairs.into_iter().collect()
    }

    fn cast(schema: Schema, ty: &str, raw: &Value) -> Result<Document> {
        let schema = Arc::new(schema);
        let ty = schema.require(ty)?;
        TreeCaster::new(schema).cast_document(raw, ty, None)
    }

    #[test]
    fn test_empty_section_yields_defaults() {
        let mut schema = Schema::new();
        schema
            .register(
                NodeType::new("Opts")
                    .attr(Attr::new("verbose", Caster::bool()).default(Value::Bool(false)))
                    .attr(Attr::new("label", Caster::str())),
            )
            .unwrap();
        let doc = cast(schema, "Opts", &section(vec![])).unwrap();
        let root = doc.root();
        assert_eq!(root.get("verbose"), Some(&Field::Value(Value::Bool(false))));
        assert_eq!(root.get("label"), Some(&Field::Null));
        assert!(doc.warnings().is_empty());
    }

    #[test]
    fn test_non_mapping_section_is_cast_error() {
        let mut schema = Schema::new();
        schema.register(NodeType::new("Opts")).unwrap();
        let err = cast(schema, "Opts", &Value::List(vec![])).unwrap_err();
        assert!(matches!(err, Error::Cast { ref node, .. } if node == "{root}"));
        assert!(err.to_string().contains("Expected a mapping, got LIST"));
    }

    #[test]
    fn test_scalar_failure_names_attribute() {
        let mut schema = Schema::new();
        schema
            .register(NodeType::new("Sim").attr(Attr::new("duration", Caster::float()).required()))
            .unwrap();
        let err = cast(schema, "Sim", &section(vec![("duration", Value::from("long"))])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not cast \"long\" to float for attribute 'duration' in {root}"
        );
    }

    #[test]
    fn test_host_caster_sees_node_name() {
        let mut schema = Schema::new();
        schema
            .register(NodeType::new("Cell").attr(Attr::new(
                "radius",
                Caster::func(|raw, scope| match raw.as_float() {
                    Some(r) if r > 0.0 => Ok(Field::Value(Value::Float(r))),
                    _ => Err(scope.error("radius must be positive")),
                }),
            )))
            .unwrap();
        schema
            .register(NodeType::new("Net").attr(Attr::new("cells", Caster::dict(Caster::node("Cell")))))
            .unwrap();
        let raw = section(vec![(
            "cells",
            section(vec![("granule", section(vec![("radius", Value::Int(-1))]))]),
        )]);
        let err = cast(schema, "Net", &raw).unwrap_err();
        assert_eq!(
            err.to_string(),
            "radius must be positive for attribute 'radius' in {root}.cells.granule"
        );
    }

    #[test]
    fn test_list_elements_named_by_index() {
        let mut schema = Schema::new();
        schema.register(NodeType::new("Step").attr(Attr::new("dt", Caster::float()).required())).unwrap();
        schema
            .register(NodeType::new("Plan").attr(Attr::new("steps", Caster::list(Caster::node("Step")))))
            .unwrap();
        let raw = section(vec![(
            "steps",
            Value::List(vec![section(vec![("dt", Value::Int(1))]), section(vec![])]),
        )]);
        let err = cast(schema, "Plan", &raw).unwrap_err();
        assert_eq!(err.to_string(), "Missing required attribute 'dt' in {root}.steps[1]");
    }

    #[test]
    fn test_max_depth() {
        let mut schema = Schema::new();
        schema
            .register(NodeType::new("Chain").attr(Attr::new("next", Caster::node("Chain"))))
            .unwrap();
        let mut raw = section(vec![]);
        for _ in 0..5 {
            raw = section(vec![("next", raw)]);
        }
        let schema = Arc::new(schema);
        let ty = schema.require("Chain").unwrap();
        let config = CastConfig { max_depth: 3, ..CastConfig::default() };
        let err = TreeCaster::new(schema).with_config(config).cast_document(&raw, ty, None).unwrap_err();
        assert!(err.to_string().contains("Maximum nesting depth of 3 exceeded"));
    }

    #[test]
    fn test_unknown_keys_respect_config() {
        let mut schema = Schema::new();
        schema.register(NodeType::new("Opts")).unwrap();
        let schema = Arc::new(schema);
        let ty = schema.require("Opts").unwrap();
        let raw = section(vec![("stray", Value::Int(1))]);

        let sink = Arc::new(CollectingReporter::new());
        let config = CastConfig { warn_unknown: false, preserve_unknown: false, ..CastConfig::default() };
        let doc = TreeCaster::new(Arc::clone(&schema))
            .with_config(config)
            .with_reporter(sink.clone())
            .cast_document(&raw, ty, None)
            .unwrap();
        assert!(sink.is_empty());
        assert!(doc.warnings().is_empty());
        assert_eq!(doc.root().extra("stray"), None);
    }

    #[test]
    fn test_reference_requires_string() {
        let mut schema = Schema::new();
        schema
            .register(NodeType::new("Conn").attr(Attr::new("from", Caster::reference(RefSpec::path()))))
            .unwrap();
        let err = cast(schema, "Conn", &section(vec![("from", Value::Int(3))])).unwrap_err();
        assert!(err.to_string().contains("Expected a reference path, got INTEGER"));
    }
}
