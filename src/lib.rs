//! # treecast: Typed Object Graphs from Raw Documents
//!
//! Compiles a raw nested document (maps, sequences, scalars handed back by a
//! format parser) into a typed node graph whose node types, attributes and
//! cross-links are declared by the host program.
//!
//! ## Design Principles
//!
//! 1. **Schema-first**: `Schema` owns every node type; attribute sets are merged across
//!    the base chain once and cached
//! 2. **Arena graph**: nodes live in a `Tree` and point at each other by `NodeId`;
//!    parents and references never own anything
//! 3. **Two phases**: build the whole tree, then bind references, so a reference may
//!    point forward
//! 4. **Parser owns syntax**: the core only sees `Value` trees
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use treecast::{Attr, Caster, Loader, NodeType, ParserRegistry, Schema};
//!
//! # fn example() -> treecast::Result<()> {
//! let mut schema = Schema::new();
//! schema.register(
//!     NodeType::new("Network")
//!         .root()
//!         .attr(Attr::key_attr("name"))
//!         .attr(Attr::new("duration", Caster::float()).required()),
//! )?;
//!
//! let loader = Loader::new(Arc::new(schema), ParserRegistry::with_builtin());
//! let doc = loader.from_str("json", r#"{"duration": 100}"#)?;
//! assert_eq!(doc.root().float("duration"), Some(100.0));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Parsers
//!
//! | Format | Feature | Description |
//! |--------|---------|-------------|
//! | `json` | (always) | serde_json, document order preserved |
//! | `yaml` | `yaml` (default) | serde_yaml |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod schema;
pub mod cast;
pub mod resolve;
pub mod parser;
pub mod document;
pub mod report;
pub mod config;

use std::sync::Arc;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    Field, Reference, Node, NodeId, TypeId, Tree, Value, ValueMap, ROOT_NAME,
};

// ============================================================================
// Re-exports: Schema
// ============================================================================

pub use schema::{
    Attr, AttrDefault, AttrMap, Caster, Dynamic, NodeType, RefSpec, Schema,
};

// ============================================================================
// Re-exports: Casting
// ============================================================================

pub use cast::{CastScope, ClassRef, ScalarKind, TreeCaster, load_class};
pub use resolve::{Visit, lookup, walk_nodes};
pub use document::{Document, NodeRef, Provenance};
pub use report::{CollectingReporter, ConfigurationWarning, Reporter, TracingReporter};
pub use config::CastConfig;

// ============================================================================
// Re-exports: Parsers
// ============================================================================

pub use parser::{ConfigParser, JsonParser, Loader, ParserRegistry, Source};
#[cfg(feature = "yaml")]
pub use parser::YamlParser;

// ============================================================================
// Convenience
// ============================================================================

/// Cast `section` as a document of node type `type_name` with the default
/// configuration and the tracing reporter.
pub fn cast(schema: &Arc<Schema>, type_name: &str, section: &Value, key: Option<&str>) -> Result<Document> {
    let ty = schema.require(type_name)?;
    TreeCaster::new(Arc::clone(schema)).cast_document(section, ty, key)
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structural failure; `node` is the fully-qualified node name.
    #[error("{message} in {node}")]
    Cast { node: String, message: String },

    #[error("{message} in {node}")]
    DynamicClass { node: String, message: String },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Unknown parser format '{0}'")]
    UnknownParser(String),

    #[error("Parse error ({format}): {message}")]
    Parse { format: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn cast(node: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Cast { node: node.into(), message: message.into() }
    }

    pub fn dynamic_class(node: impl Into<String>, message: impl Into<String>) -> Self {
        Error::DynamicClass { node: node.into(), message: message.into() }
    }

    /// Fully-qualified name of the offending node, for cast failures.
    pub fn node(&self) -> Option<&str> {
        match self {
            Error::Cast { node, .. } | Error::DynamicClass { node, .. } => Some(node),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
