//! Node type registry.
//!
//! Holds every declared [`NodeType`], the namespace table used by dynamic
//! class lookup, the plugin aliases of pluggable interfaces, and the cache of
//! inheritance-merged attribute maps.
//!
//! ## Merge cache
//!
//! `attrs()` computes the merged map outside of any lock and stores it only
//! if no other caller got there first. Two racing casts may both compute the
//! same map; the first insert wins and both see equal content.

use std::sync::Arc;

use hashbrown::HashMap;
use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::model::TypeId;
use crate::{Error, Result};
use super::{Attr, NodeType};

/// Merged attribute descriptors of a type, ancestors first.
pub type AttrMap = IndexMap<String, Attr>;

#[derive(Debug, Default)]
pub struct Schema {
    types: Vec<NodeType>,
    by_name: HashMap<String, TypeId>,
    /// module path ("" = global) → short name → type
    modules: HashMap<String, HashMap<String, TypeId>>,
    /// interface → alias → implementation
    plugins: HashMap<TypeId, IndexMap<String, TypeId>>,
    root: Option<TypeId>,
    merged: RwLock<HashMap<TypeId, Arc<AttrMap>>>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a node type. Its base type, if any, must already be registered.
    pub fn register(&mut self, ty: NodeType) -> Result<TypeId> {
        let qualified = ty.qualified_name();
        if self.by_name.contains_key(&qualified) {
            return Err(Error::Schema(format!("Node type '{qualified}' is already registered")));
        }
        if let Some(base) = ty.base() {
            if !self.by_name.contains_key(base) {
                return Err(Error::Schema(format!(
                    "Base type '{base}' of '{qualified}' is not registered"
                )));
            }
        }
        if ty.is_root() {
            if let Some(existing) = self.root {
                return Err(Error::Schema(format!(
                    "Cannot mark '{qualified}' as root: '{}' already is",
                    self.name_of(existing)
                )));
            }
        }

        let id = u32::try_from(self.types.len())
            .map(TypeId)
            .map_err(|_| Error::Schema(format!("Cannot register '{qualified}': too many node types")))?;
        if ty.is_root() {
            self.root = Some(id);
        }
        self.modules
            .entry(ty.module_path().unwrap_or_default().to_owned())
            .or_default()
            .insert(ty.name().to_owned(), id);
        self.by_name.insert(qualified, id);
        self.types.push(ty);
        Ok(id)
    }

    /// Register `implementation` under `alias` for the pluggable `interface`.
    pub fn register_plugin(&mut self, interface: &str, alias: &str, implementation: &str) -> Result<()> {
        let iface = self.require(interface)?;
        let imp = self.require(implementation)?;
        if !self.is_subtype(imp, iface) {
            return Err(Error::Schema(format!(
                "Plugin '{alias}' ({implementation}) must derive from {interface}"
            )));
        }
        self.plugins.entry(iface).or_default().insert(alias.to_owned(), imp);
        Ok(())
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn type_id(&self, qualified_name: &str) -> Option<TypeId> {
        self.by_name.get(qualified_name).copied()
    }

    /// Like [`type_id`](Self::type_id) but unknown names are a schema error.
    pub fn require(&self, qualified_name: &str) -> Result<TypeId> {
        self.type_id(qualified_name)
            .ok_or_else(|| Error::Schema(format!("Unknown node type '{qualified_name}'")))
    }

    pub fn node_type(&self, id: TypeId) -> Option<&NodeType> {
        self.types.get(id.0 as usize)
    }

    /// Qualified name of a type, or `"?"` for a foreign id.
    pub fn name_of(&self, id: TypeId) -> String {
        self.node_type(id).map(NodeType::qualified_name).unwrap_or_else(|| "?".into())
    }

    pub fn root_type(&self) -> Option<TypeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn has_module(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    /// Type named `name` inside `module` ("" = global namespace).
    pub fn lookup_class(&self, module: &str, name: &str) -> Option<TypeId> {
        self.modules.get(module).and_then(|m| m.get(name)).copied()
    }

    pub fn plugin(&self, interface: TypeId, alias: &str) -> Option<TypeId> {
        self.plugins.get(&interface).and_then(|p| p.get(alias)).copied()
    }

    /// Registered plugin aliases of an interface, in registration order.
    pub fn plugin_aliases(&self, interface: TypeId) -> Vec<&str> {
        self.plugins
            .get(&interface)
            .map(|p| p.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// The type and all its ancestors, base-most first.
    pub fn ancestors(&self, id: TypeId) -> Vec<TypeId> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(ty) = self.node_type(current) else { break };
            chain.push(current);
            cursor = ty.base().and_then(|b| self.type_id(b));
        }
        chain.reverse();
        chain
    }

    /// True if `ty` equals `interface` or derives from it.
    pub fn is_subtype(&self, ty: TypeId, interface: TypeId) -> bool {
        let mut cursor = Some(ty);
        while let Some(current) = cursor {
            if current == interface {
                return true;
            }
            cursor = self
                .node_type(current)
                .and_then(NodeType::base)
                .and_then(|b| self.type_id(b));
        }
        false
    }

    /// Merged attribute map of a type: ancestors first, derived declarations
    /// replace same-named inherited ones in place.
    pub fn attrs(&self, id: TypeId) -> Arc<AttrMap> {
        if let Some(hit) = self.merged.read().get(&id) {
            return Arc::clone(hit);
        }
        let merged = Arc::new(self.merge(id));
        let mut cache = self.merged.write();
        Arc::clone(cache.entry(id).or_insert(merged))
    }

    fn merge(&self, id: TypeId) -> AttrMap {
        let mut map = AttrMap::new();
        for ancestor in self.ancestors(id) {
            let Some(ty) = self.node_type(ancestor) else { continue };
            for attr in ty.own_attrs() {
                map.insert(attr.name.clone(), attr.clone());
            }
        }
        map
    }
}
