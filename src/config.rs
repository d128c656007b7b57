//! Caster configuration.

use serde::{Deserialize, Serialize};

/// Knobs for a cast. Deserializable so hosts can keep it next to their own
/// settings; every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CastConfig {
    /// Report unknown keys as configuration warnings.
    pub warn_unknown: bool,
    /// Keep unknown values on the node (`Node::extras`).
    pub preserve_unknown: bool,
    /// Node nesting depth beyond which the cast fails.
    pub max_depth: usize,
    /// Discriminator key of dynamic types that do not declare their own.
    pub discriminator: String,
}

impl Default for CastConfig {
    fn default() -> Self {
        Self {
            warn_unknown: true,
            preserve_unknown: true,
            max_depth: 128,
            discriminator: "class".into(),
        }
    }
}
