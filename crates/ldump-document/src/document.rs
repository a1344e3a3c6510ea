//! Decoded configuration document
//!
//! A [`ConfigDocument`] is always a mapping at the top level. Nested values
//! stay as plain [`serde_yaml::Value`]s so callers can rewrite them in place.

use crate::decode::decode;
use crate::encode::{encode_mapping, EncodeOptions};
use crate::error::{DocumentError, DocumentResult};
use serde_yaml::{Mapping, Value};

/// Configuration document decoded from NEON text
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigDocument {
    root: Mapping,
}

impl ConfigDocument {
    /// Create from an existing mapping
    #[inline]
    #[must_use]
    pub fn new(root: Mapping) -> Self {
        Self { root }
    }

    /// Decode document text
    ///
    /// # Errors
    /// [`DocumentError::Syntax`] when the text does not parse, and
    /// [`DocumentError::NotAMapping`] when the root is any other kind of value.
    pub fn decode(content: &str) -> DocumentResult<Self> {
        Self::try_from(decode(content)?)
    }

    /// Encode back to block-mode text
    ///
    /// # Errors
    /// Returns error if a value has no block-mode representation.
    pub fn encode(&self, options: &EncodeOptions) -> DocumentResult<String> {
        encode_mapping(&self.root, options)
    }

    /// Top-level mapping
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Mapping {
        &self.root
    }

    /// Mutable top-level mapping
    #[inline]
    pub fn root_mut(&mut self) -> &mut Mapping {
        &mut self.root
    }

    /// Get value at a dotted path (`parameters.bootstrapFiles`)
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.root.get(segments.next()?)?;
        for segment in segments {
            current = current.as_mapping()?.get(segment)?;
        }
        Some(current)
    }
}

impl TryFrom<Value> for ConfigDocument {
    type Error = DocumentError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Mapping(root) => Ok(Self { root }),
            other => Err(DocumentError::NotAMapping {
                actual: value_kind(&other),
            }),
        }
    }
}

/// Human-readable name of a value's shape, used in error messages
#[must_use]
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "entity",
    }
}
