//! YAML parser plugin.

use std::path::Path;

use crate::model::{Value, ValueMap};
use crate::{Error, Result};
use super::{ConfigParser, source_meta};

/// Parses YAML documents. Mapping order is kept; non-string keys are
/// stringified.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlParser;

impl ConfigParser for YamlParser {
    fn parse(&self, data: &str, path: Option<&Path>) -> Result<(Value, Value)> {
        let tree: serde_yaml::Value = serde_yaml::from_str(data).map_err(|e| Error::Parse {
            format: "yaml".into(),
            message: e.to_string(),
        })?;
        Ok((convert(tree), source_meta(path)))
    }
}

fn convert(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => Value::List(items.into_iter().map(convert).collect()),
        serde_yaml::Value::Mapping(map) => {
            let mut out = ValueMap::with_capacity(map.len());
            for (k, v) in map {
                out.insert(key_string(k), convert(v));
            }
            Value::Map(out)
        }
        serde_yaml::Value::Tagged(tagged) => convert(tagged.value),
    }
}

fn key_string(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        other => match convert(other) {
            Value::String(s) => s,
            scalar => scalar.to_string(),
        },
    }
}
