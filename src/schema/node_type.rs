//! Node type declarations.

use super::Attr;

/// How a dynamic node type picks its concrete subtype from the data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dynamic {
    /// Dotted type name under a discriminator key. `None` uses
    /// [`CastConfig::discriminator`](crate::CastConfig::discriminator).
    Class { key: Option<String> },
    /// Short plugin alias under `key`, looked up among the plugins
    /// registered against this interface.
    Plugin { key: String, plugin_name: String },
}

/// Declared schema of one node type.
#[derive(Debug, Clone)]
pub struct NodeType {
    pub(crate) name: String,
    pub(crate) module: Option<String>,
    pub(crate) base: Option<String>,
    pub(crate) attrs: Vec<Attr>,
    pub(crate) dynamic: Option<Dynamic>,
    pub(crate) root: bool,
}

impl NodeType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: None,
            base: None,
            attrs: Vec::new(),
            dynamic: None,
            root: false,
        }
    }

    /// Dotted namespace the type is registered under (`"sim.nest"`).
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Qualified name of the base type.
    pub fn extends(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn attr(mut self, attr: Attr) -> Self {
        self.attrs.push(attr);
        self
    }

    pub fn attrs(mut self, attrs: impl IntoIterator<Item = Attr>) -> Self {
        self.attrs.extend(attrs);
        self
    }

    /// Subtype chosen from the configured discriminator key.
    pub fn dynamic(mut self) -> Self {
        self.dynamic = Some(Dynamic::Class { key: None });
        self
    }

    /// Subtype chosen from a custom discriminator key.
    pub fn dynamic_on(mut self, key: impl Into<String>) -> Self {
        self.dynamic = Some(Dynamic::Class { key: Some(key.into()) });
        self
    }

    /// Subtype chosen among registered plugins by alias.
    pub fn pluggable(mut self, key: impl Into<String>, plugin_name: impl Into<String>) -> Self {
        self.dynamic = Some(Dynamic::Plugin { key: key.into(), plugin_name: plugin_name.into() });
        self
    }

    pub fn root(mut self) -> Self {
        self.root = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module_path(&self) -> Option<&str> {
        self.module.as_deref()
    }

    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// Attributes declared directly on this type (not inherited).
    pub fn own_attrs(&self) -> &[Attr] {
        &self.attrs
    }

    pub fn dynamic_spec(&self) -> Option<&Dynamic> {
        self.dynamic.as_ref()
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic.is_some()
    }

    pub fn is_root(&self) -> bool {
        self.root
    }

    /// `module.Name`, or just `Name` for types in the global namespace.
    pub fn qualified_name(&self) -> String {
        match &self.module {
            Some(module) if !module.is_empty() => format!("{module}.{}", self.name),
            _ => self.name.clone(),
        }
    }
}
