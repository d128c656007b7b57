//! # Schema
//!
//! The declaration surface consumed by the caster: attribute descriptors,
//! node types, and the registry that merges descriptors across the type
//! hierarchy.

pub mod attr;
pub mod node_type;
pub mod registry;

pub use attr::{Attr, AttrDefault, CastFn, Caster, DefaultFn, RefSpec};
pub use node_type::{Dynamic, NodeType};
pub use registry::{AttrMap, Schema};
