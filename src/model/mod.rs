//! # Document Model
//!
//! Clean DTOs for both sides of a cast: the raw document [`Value`] handed
//! over by a parser, and the typed node graph ([`Tree`], [`Node`], [`Field`])
//! the caster produces.
//!
//! Design rule: this module is pure data. No schema lookups or I/O.

pub mod field;
pub mod node;
pub mod tree;
pub mod value;

pub use field::{Field, Reference};
pub use node::{Node, NodeId, TypeId};
pub use tree::{Tree, ROOT_NAME};
pub use value::{Value, ValueMap};
