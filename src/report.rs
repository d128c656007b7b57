//! Diagnostics sink for non-fatal cast events.

use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// An unknown key was found in a section. The node is still built and the
/// value is kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigurationWarning {
    /// Fully-qualified name of the node carrying the key.
    pub node: String,
    pub key: String,
}

impl fmt::Display for ConfigurationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown attribute '{}' in {}", self.key, self.node)
    }
}

/// Host-provided warning sink.
pub trait Reporter: Send + Sync {
    fn warn(&self, warning: &ConfigurationWarning);
}

/// Default sink: one `tracing` warning per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn warn(&self, warning: &ConfigurationWarning) {
        tracing::warn!(node = %warning.node, key = %warning.key, "{warning}");
    }
}

/// Sink that keeps every warning in memory.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    warnings: Mutex<Vec<ConfigurationWarning>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.warnings.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.lock().is_empty()
    }

    /// Drain the collected warnings.
    pub fn take(&self) -> Vec<ConfigurationWarning> {
        std::mem::take(&mut *self.warnings.lock())
    }
}

impl Reporter for CollectingReporter {
    fn warn(&self, warning: &ConfigurationWarning) {
        self.warnings.lock().push(warning.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_reporter() {
        let sink = CollectingReporter::new();
        let w = ConfigurationWarning { node: "{root}.cells".into(), key: "colour".into() };
        sink.warn(&w);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.take(), vec![w.clone()]);
        assert!(sink.is_empty());
        assert_eq!(w.to_string(), "Unknown attribute 'colour' in {root}.cells");
    }
}
