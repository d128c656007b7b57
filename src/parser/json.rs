//! JSON parser plugin.

use std::path::Path;

use crate::model::Value;
use crate::{Error, Result};
use super::{ConfigParser, source_meta};

/// Parses JSON documents. Object key order is kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl ConfigParser for JsonParser {
    fn parse(&self, data: &str, path: Option<&Path>) -> Result<(Value, Value)> {
        let tree: serde_json::Value = serde_json::from_str(data).map_err(|e| Error::Parse {
            format: "json".into(),
            message: e.to_string(),
        })?;
        Ok((tree.into(), source_meta(path)))
    }
}
