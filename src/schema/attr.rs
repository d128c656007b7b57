//! Attribute descriptors, one per declared field of a node type.

use std::fmt;
use std::sync::Arc;

use crate::cast::{CastScope, ScalarKind};
use crate::model::{Field, Value};
use crate::Result;

/// Host-provided caster.
pub type CastFn = Arc<dyn Fn(&Value, &CastScope<'_>) -> Result<Field> + Send + Sync>;

/// Per-instance default factory.
pub type DefaultFn = Arc<dyn Fn() -> Field + Send + Sync>;

// ============================================================================
// Caster
// ============================================================================

/// How the raw value of an attribute is turned into a [`Field`].
#[derive(Clone)]
pub enum Caster {
    /// Keep the raw value verbatim.
    Any,
    /// Coerce to a scalar kind.
    Scalar(ScalarKind),
    /// Cast a child node of the named node type.
    Node(String),
    /// Sequence of elements, each cast with the inner caster.
    List(Box<Caster>),
    /// Mapping of entries, each cast with the inner caster under its key.
    Dict(Box<Caster>),
    /// Lookup path bound after the whole document is built.
    Ref(RefSpec),
    /// Dotted node type name, optionally constrained to an interface.
    Class(Option<String>),
    /// Arbitrary host function.
    Func(CastFn),
}

impl Caster {
    pub fn bool() -> Self { Caster::Scalar(ScalarKind::Bool) }
    pub fn int() -> Self { Caster::Scalar(ScalarKind::Int) }
    pub fn float() -> Self { Caster::Scalar(ScalarKind::Float) }
    pub fn str() -> Self { Caster::Scalar(ScalarKind::Str) }

    pub fn node(type_name: impl Into<String>) -> Self {
        Caster::Node(type_name.into())
    }

    pub fn list(element: Caster) -> Self {
        Caster::List(Box::new(element))
    }

    pub fn dict(element: Caster) -> Self {
        Caster::Dict(Box::new(element))
    }

    pub fn reference(spec: RefSpec) -> Self {
        Caster::Ref(spec)
    }

    pub fn class(interface: Option<&str>) -> Self {
        Caster::Class(interface.map(str::to_owned))
    }

    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&Value, &CastScope<'_>) -> Result<Field> + Send + Sync + 'static,
    {
        Caster::Func(Arc::new(f))
    }
}

impl fmt::Debug for Caster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Caster::Any => write!(f, "Any"),
            Caster::Scalar(kind) => write!(f, "{kind:?}"),
            Caster::Node(name) => write!(f, "Node({name})"),
            Caster::List(inner) => write!(f, "List({inner:?})"),
            Caster::Dict(inner) => write!(f, "Dict({inner:?})"),
            Caster::Ref(spec) => write!(f, "Ref({spec:?})"),
            Caster::Class(iface) => write!(f, "Class({iface:?})"),
            Caster::Func(_) => write!(f, "Func(..)"),
        }
    }
}

// ============================================================================
// References
// ============================================================================

/// Where a reference attribute looks for its target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefSpec {
    /// Dotted container path from the document root. When set, the document
    /// value is a key inside that container.
    pub within: Option<String>,
}

impl RefSpec {
    /// The document value is a full dotted path from the root.
    pub fn path() -> Self {
        Self { within: None }
    }

    /// The document value is a key inside `container`.
    pub fn within(container: impl Into<String>) -> Self {
        Self { within: Some(container.into()) }
    }

    pub fn lookup_path(&self, value: &str) -> String {
        match &self.within {
            Some(container) if !container.is_empty() => format!("{container}.{value}"),
            _ => value.to_owned(),
        }
    }
}

// ============================================================================
// Defaults
// ============================================================================

#[derive(Clone, Default)]
pub enum AttrDefault {
    /// No default; the attribute is stored as [`Field::Null`].
    #[default]
    None,
    /// Literal default, cloned into every node.
    Value(Field),
    /// Factory invoked once per node.
    Factory(DefaultFn),
}

impl AttrDefault {
    pub fn produce(&self) -> Field {
        match self {
            AttrDefault::None => Field::Null,
            AttrDefault::Value(field) => field.clone(),
            AttrDefault::Factory(make) => make(),
        }
    }
}

impl fmt::Debug for AttrDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrDefault::None => write!(f, "None"),
            AttrDefault::Value(field) => write!(f, "Value({field:?})"),
            AttrDefault::Factory(_) => write!(f, "Factory(..)"),
        }
    }
}

// ============================================================================
// Attr
// ============================================================================

/// Declared attribute of a node type.
#[derive(Debug, Clone)]
pub struct Attr {
    pub name: String,
    pub caster: Caster,
    pub required: bool,
    /// Value comes from the key the node was cast under, not from its body.
    pub key: bool,
    pub default: AttrDefault,
}

impl Attr {
    pub fn new(name: impl Into<String>, caster: Caster) -> Self {
        Self {
            name: name.into(),
            caster,
            required: false,
            key: false,
            default: AttrDefault::None,
        }
    }

    /// String attribute filled from the node's key.
    pub fn key_attr(name: impl Into<String>) -> Self {
        Self::new(name, Caster::str()).key()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }

    pub fn default(mut self, value: impl Into<Field>) -> Self {
        self.default = AttrDefault::Value(value.into());
        self
    }

    pub fn default_with<F>(mut self, make: F) -> Self
    where
        F: Fn() -> Field + Send + Sync + 'static,
    {
        self.default = AttrDefault::Factory(Arc::new(make));
        self
    }
}
