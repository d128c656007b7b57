//! # Parser Plugins
//!
//! Format-specific parsers turn serialized text into a raw [`Value`] tree
//! plus metadata. The core never looks at the syntax itself: it only keeps a
//! registry of parsers keyed by format identifier and casts whatever tree
//! the chosen parser returns.
//!
//! | Format | Parser | Feature |
//! |--------|--------|---------|
//! | `json` | [`JsonParser`] | (always) |
//! | `yaml` | [`YamlParser`] | `yaml` (default) |

pub mod json;
#[cfg(feature = "yaml")]
pub mod yaml;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::cast::TreeCaster;
use crate::config::CastConfig;
use crate::document::{Document, Provenance};
use crate::model::Value;
use crate::report::{Reporter, TracingReporter};
use crate::schema::Schema;
use crate::{Error, Result};

pub use json::JsonParser;
#[cfg(feature = "yaml")]
pub use yaml::YamlParser;

// ============================================================================
// ConfigParser trait
// ============================================================================

/// A serialized-format parser.
pub trait ConfigParser: Send + Sync {
    /// Parse `data`. `path` is the absolute source path when the data was
    /// read from a file. Returns the raw tree and parser metadata.
    fn parse(&self, data: &str, path: Option<&Path>) -> Result<(Value, Value)>;
}

/// Metadata shared by the built-in parsers: `{"path": <source path or null>}`.
pub(crate) fn source_meta(path: Option<&Path>) -> Value {
    let path = path.map(|p| Value::String(p.display().to_string()));
    [("path", Value::from(path))].into_iter().collect()
}

// ============================================================================
// Registry
// ============================================================================

/// Format identifier → parser.
#[derive(Clone, Default)]
pub struct ParserRegistry {
    parsers: IndexMap<String, Arc<dyn ConfigParser>>,
}

impl ParserRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the parsers compiled into this crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("json", JsonParser);
        #[cfg(feature = "yaml")]
        registry.register("yaml", YamlParser);
        registry
    }

    /// Register a parser, replacing any parser registered under `format`.
    pub fn register(&mut self, format: impl Into<String>, parser: impl ConfigParser + 'static) {
        self.parsers.insert(format.into(), Arc::new(parser));
    }

    pub fn get(&self, format: &str) -> Result<Arc<dyn ConfigParser>> {
        self.parsers
            .get(format)
            .cloned()
            .ok_or_else(|| Error::UnknownParser(format.to_owned()))
    }

    pub fn contains(&self, format: &str) -> bool {
        self.parsers.contains_key(format)
    }

    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.parsers.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("formats", &self.parsers.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ============================================================================
// Loader
// ============================================================================

/// Input of a load: a file to read or data already in memory.
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    File(&'a Path),
    Data(&'a str),
}

/// Parse + cast + stamp. The entry point for turning a serialized document
/// into a [`Document`] of the schema's root type.
#[derive(Clone)]
pub struct Loader {
    schema: Arc<Schema>,
    parsers: ParserRegistry,
    config: CastConfig,
    reporter: Arc<dyn Reporter>,
}

impl Loader {
    pub fn new(schema: Arc<Schema>, parsers: ParserRegistry) -> Self {
        Self {
            schema,
            parsers,
            config: CastConfig::default(),
            reporter: Arc::new(TracingReporter),
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

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn parsers(&self) -> &ParserRegistry {
        &self.parsers
    }

    pub fn load(&self, format: &str, source: Source<'_>) -> Result<Document> {
        // Unknown formats fail before any I/O.
        let parser = self.parsers.get(format)?;
        let root = self
            .schema
            .root_type()
            .ok_or_else(|| Error::Schema("No root node type registered".into()))?;

        let (data, file) = match source {
            Source::File(path) => {
                let file = std::path::absolute(path)?;
                (std::fs::read_to_string(&file)?, Some(file))
            }
            Source::Data(data) => (data.to_owned(), None),
        };
        tracing::debug!(format = %format, file = ?file, "loading document");

        let (raw, meta) = parser.parse(&data, file.as_deref())?;
        let mut doc = TreeCaster::new(Arc::clone(&self.schema))
            .with_config(self.config.clone())
            .with_reporter(Arc::clone(&self.reporter))
            .cast_document(&raw, root, None)?;
        doc.stamp(Provenance { parser: format.to_owned(), meta, file });
        Ok(doc)
    }

    pub fn from_file(&self, format: &str, path: impl AsRef<Path>) -> Result<Document> {
        self.load(format, Source::File(path.as_ref()))
    }

    pub fn from_str(&self, format: &str, data: &str) -> Result<Document> {
        self.load(format, Source::Data(data))
    }
}

/// Absolute form of `path`, for callers comparing against [`Document::file`].
pub fn absolute_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}
