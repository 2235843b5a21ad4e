use serde_json::{Map, Value};
use std::fmt;

use crate::record::TraceContent;

/// Maximum JSON nesting accepted inside a trace (tool arguments included).
pub const MAX_DEPTH: usize = 64;

/// Error returned when a trace cannot be brought into canonical form.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CanonicalizationError {
    /// The record could not be converted to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
    /// Non-finite number (NaN/Infinity) detected.
    #[error("non-finite number detected at {0}")]
    NonFiniteNumber(String),
    /// Nesting exceeds [`MAX_DEPTH`].
    #[error("nesting deeper than {max} levels at {path}")]
    TooDeep {
        /// Location of the offending value.
        path: String,
        /// Configured limit.
        max: usize,
    },
    /// A raw event payload was not valid UTF-8.
    #[error("event {event} payload is not valid UTF-8: {reason}")]
    InvalidUtf8 {
        /// Index of the offending event.
        event: usize,
        /// Decoder message.
        reason: String,
    },
    /// Bytes did not parse as a trace.
    #[error("invalid trace bytes: {0}")]
    InvalidTrace(String),
}

/// Canonical UTF-8 bytes of a trace's content fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Borrows the bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the wrapper.
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    /// Number of bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no bytes were produced.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Views the bytes as text. Canonical output is always UTF-8.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Helper for building JSON paths during validation.
#[derive(Debug, Clone)]
struct Path {
    segments: Vec<String>,
}

impl Path {
    fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    fn push_field(&self, field: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(field.to_string());
        Self { segments }
    }

    fn push_index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(format!("[{}]", index));
        Self { segments }
    }

    fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "root")
        } else {
            write!(f, "{}", self.segments.join("."))
        }
    }
}

/// Serializer that emits the canonical byte form of a trace.
///
/// The form is: every object's members sorted by key (byte-wise UTF-8
/// order), two-space indentation, `": "` between key and value, no trailing
/// newline. Non-ASCII text is written as-is; only quotes, backslashes and
/// control characters are escaped. Only [`TraceContent`] fields take part, so
/// hashing metadata, signatures and redactions can never feed back into the
/// bytes they describe.
#[derive(Debug, Clone, Default)]
pub struct Canonicalizer;

impl Canonicalizer {
    /// Creates a canonicalizer.
    pub fn new() -> Self {
        Self
    }

    /// Produces the canonical bytes of `content`.
    pub fn serialize(
        &self,
        content: &TraceContent,
    ) -> Result<CanonicalBytes, CanonicalizationError> {
        let value = serde_json::to_value(content)
            .map_err(|err| CanonicalizationError::Serialization(err.to_string()))?;
        self.canonicalize_value(&value)
    }

    /// Produces canonical bytes for an arbitrary JSON value.
    pub fn canonicalize_value(
        &self,
        value: &Value,
    ) -> Result<CanonicalBytes, CanonicalizationError> {
        self.validate(value, Path::root())?;
        let sorted = sort_members(value);
        let bytes = serde_json::to_vec_pretty(&sorted)
            .map_err(|err| CanonicalizationError::Serialization(err.to_string()))?;
        Ok(CanonicalBytes(bytes))
    }

    /// Parses canonical (or any trace-shaped) bytes back into content.
    pub fn parse(&self, bytes: &[u8]) -> Result<TraceContent, CanonicalizationError> {
        serde_json::from_slice(bytes)
            .map_err(|err| CanonicalizationError::InvalidTrace(err.to_string()))
    }

    /// Returns true when `bytes` are exactly the canonical form of the trace
    /// they encode.
    pub fn is_canonical(&self, bytes: &[u8]) -> bool {
        self.parse(bytes)
            .and_then(|content| self.serialize(&content))
            .map(|canonical| canonical.as_bytes() == bytes)
            .unwrap_or(false)
    }

    #[allow(clippy::only_used_in_recursion)]
    fn validate(&self, value: &Value, path: Path) -> Result<(), CanonicalizationError> {
        if path.depth() > MAX_DEPTH {
            return Err(CanonicalizationError::TooDeep {
                path: path.to_string(),
                max: MAX_DEPTH,
            });
        }
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    self.validate(child, path.push_field(key))?;
                }
                Ok(())
            }
            Value::Array(items) => {
                for (idx, item) in items.iter().enumerate() {
                    self.validate(item, path.push_index(idx))?;
                }
                Ok(())
            }
            Value::Number(num) => match num.as_f64() {
                Some(f) if num.is_f64() && !f.is_finite() => {
                    Err(CanonicalizationError::NonFiniteNumber(path.to_string()))
                }
                _ => Ok(()),
            },
            Value::String(_) | Value::Bool(_) | Value::Null => Ok(()),
        }
    }
}

/// Rebuilds `value` with every object's members inserted in key order, so the
/// output order does not depend on how `serde_json::Map` is backed.
fn sort_members(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
            let mut sorted = Map::new();
            for (key, child) in entries {
                sorted.insert(key.clone(), sort_members(child));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_members).collect()),
        other => other.clone(),
    }
}
