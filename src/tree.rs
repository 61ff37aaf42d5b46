//! Generic tree values.
//!
//! A [`TreeValue`] is a scalar, an ordered sequence, or an insertion-ordered
//! mapping with string keys, recursively. Parsed record content and
//! transform results both use this shape, and the tree writer renders it
//! back to text.

use crate::error::PipelineError;
use crate::text::{Encoding, TextWriter};
use crate::tree_writer::write_tree;
use indexmap::IndexMap;
use std::fmt;

/// A scalar, sequence, or mapping tree value.
///
/// Floats are always finite; non-finite values normalize to `Null` at
/// construction. Mappings keep insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TreeValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<TreeValue>),
    Map(IndexMap<String, TreeValue>),
}

impl TreeValue {
    /// Build a mapping from dynamic key/value pairs, coercing keys to text.
    ///
    /// String keys are used as-is and other scalars use their canonical
    /// textual form; a `Null` key fails with
    /// [`PipelineError::UnsupportedKey`].
    pub fn map_from<I>(pairs: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = (TreeValue, TreeValue)>,
    {
        let mut entries = IndexMap::new();
        for (key, value) in pairs {
            entries.insert(Self::coerce_key(key)?, value);
        }
        Ok(Self::Map(entries))
    }

    fn coerce_key(key: TreeValue) -> Result<String, PipelineError> {
        match key {
            TreeValue::Null => Err(PipelineError::UnsupportedKey),
            TreeValue::Str(s) => Ok(s),
            other => Ok(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, TreeValue::Null)
    }
}

impl From<bool> for TreeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for TreeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for TreeValue {
    fn from(value: f64) -> Self {
        if value.is_finite() {
            Self::Float(value)
        } else {
            Self::Null
        }
    }
}

impl From<&str> for TreeValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for TreeValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<TreeValue>> for TreeValue {
    fn from(value: Vec<TreeValue>) -> Self {
        Self::Seq(value)
    }
}

impl FromIterator<TreeValue> for TreeValue {
    fn from_iter<I: IntoIterator<Item = TreeValue>>(iter: I) -> Self {
        Self::Seq(iter.into_iter().collect())
    }
}

impl From<serde_json::Value> for TreeValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Self::from(f)
                } else {
                    Self::Null
                }
            }
            serde_json::Value::String(s) => Self::Str(s),
            serde_json::Value::Array(items) => {
                Self::Seq(items.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, TreeValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<TreeValue> for serde_json::Value {
    fn from(value: TreeValue) -> Self {
        match value {
            TreeValue::Null => serde_json::Value::Null,
            TreeValue::Bool(b) => serde_json::Value::Bool(b),
            TreeValue::Int(i) => serde_json::Value::from(i),
            TreeValue::Float(f) => serde_json::Value::from(f),
            TreeValue::Str(s) => serde_json::Value::String(s),
            TreeValue::Seq(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            TreeValue::Map(entries) => serde_json::Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Compact textual rendering, identical to `render` with indent `-1`.
impl fmt::Display for TreeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        let mut out = TextWriter::new(&mut buf, Encoding::Utf8);
        write_tree(self, &mut out, -1).map_err(|_| fmt::Error)?;
        out.flush().map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}
