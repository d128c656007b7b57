//! Dynamic subtype resolution.
//!
//! A dynamic node type names an interface; the document picks the concrete
//! implementation with a discriminator key. Lookup goes through the closed
//! set of types registered on the [`Schema`], never through symbol loading.

use crate::config::CastConfig;
use crate::model::{TypeId, Value, ValueMap};
use crate::schema::{Dynamic, Schema};
use crate::{Error, Result};

/// A class designation: either a type handle or a dotted name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassRef<'a> {
    Handle(TypeId),
    Path(&'a str),
}

impl<'a> ClassRef<'a> {
    /// Class designation carried by a raw value: a type handle or a string.
    pub fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Type(id) => Some(ClassRef::Handle(*id)),
            Value::String(path) => Some(ClassRef::Path(path)),
            _ => None,
        }
    }
}

/// Discriminator key consumed by a dynamic type, if `declared` is dynamic.
pub fn discriminator<'s>(schema: &'s Schema, declared: TypeId, config: &'s CastConfig) -> Option<&'s str> {
    match schema.node_type(declared)?.dynamic_spec()? {
        Dynamic::Class { key: Some(key) } => Some(key.as_str()),
        Dynamic::Class { key: None } => Some(config.discriminator.as_str()),
        Dynamic::Plugin { key, .. } => Some(key.as_str()),
    }
}

/// Pick the concrete type for a section of a dynamic node type.
///
/// `node` is the pending node's name, used in diagnostics.
pub fn resolve(
    schema: &Schema,
    config: &CastConfig,
    section: &ValueMap,
    declared: TypeId,
    node: &str,
) -> Result<TypeId> {
    let Some(spec) = schema.node_type(declared).and_then(|t| t.dynamic_spec()) else {
        return Ok(declared);
    };
    match spec {
        Dynamic::Class { key } => {
            let key = key.as_deref().unwrap_or(config.discriminator.as_str());
            let Some(value) = section.get(key) else {
                return Err(Error::cast(
                    node,
                    format!("Dynamic node must contain a '{key}' attribute"),
                ));
            };
            let Some(class) = ClassRef::from_value(value) else {
                return Err(Error::cast(
                    node,
                    format!("'{key}' attribute must be a dotted type name, got {}", value.type_name()),
                ));
            };
            load_class(schema, class, Some(declared), node)
        }
        Dynamic::Plugin { key, plugin_name } => {
            let Some(value) = section.get(key.as_str()) else {
                return Err(Error::cast(
                    node,
                    format!("Pluggable node must contain a '{key}' attribute"),
                ));
            };
            let Value::String(alias) = value else {
                return Err(Error::cast(
                    node,
                    format!("'{key}' attribute must name a {plugin_name}, got {}", value.type_name()),
                ));
            };
            schema.plugin(declared, alias).ok_or_else(|| {
                Error::dynamic_class(
                    node,
                    format!(
                        "Unknown {plugin_name} '{alias}', available: {}",
                        schema.plugin_aliases(declared).join(", ")
                    ),
                )
            })
        }
    }
}

/// Load a class designation and check it against `interface`.
///
/// Dotted names split on the last `.`: the head is the namespace (empty for
/// the global one), the tail is the type name.
pub fn load_class(
    schema: &Schema,
    class: ClassRef<'_>,
    interface: Option<TypeId>,
    node: &str,
) -> Result<TypeId> {
    let (id, class_name) = match class {
        ClassRef::Handle(id) => {
            let ty = schema
                .node_type(id)
                .ok_or_else(|| Error::dynamic_class(node, format!("Unknown type handle {id}")))?;
            (id, ty.name().to_owned())
        }
        ClassRef::Path(path) => {
            let (module, name) = path.rsplit_once('.').unwrap_or(("", path));
            if !module.is_empty() && !schema.has_module(module) {
                return Err(Error::dynamic_class(node, format!("Module not found: '{module}'")));
            }
            let id = schema
                .lookup_class(module, name)
                .ok_or_else(|| Error::dynamic_class(node, format!("Class not found: '{path}'")))?;
            (id, name.to_owned())
        }
    };

    if let Some(interface) = interface {
        if !schema.is_subtype(id, interface) {
            return Err(Error::dynamic_class(
                node,
                format!(
                    "Dynamic class '{class_name}' must derive from {}",
                    schema.name_of(interface)
                ),
            ));
        }
    }
    Ok(id)
}
