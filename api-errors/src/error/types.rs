//! The `ApiError` value type

use http::StatusCode;
use serde_json::Value;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Per-occurrence metadata (field name, rejected value, ...)
pub type Metadata = BTreeMap<String, Value>;

/// One normalized error kind, or one occurrence of it
///
/// A registry holds templates with empty metadata; classifiers hand out
/// copies carrying per-occurrence metadata and, optionally, a rendered
/// message. Two occurrences are equal iff name, code, message, status and
/// metadata are all equal, so resolved sets can be deduplicated as sets.
///
/// Ordering is by error code first (numeric codes numerically, before any
/// non-numeric code), then name, message, status and metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    name: Cow<'static, str>,
    error_code: Cow<'static, str>,
    message: Cow<'static, str>,
    http_status: StatusCode,
    metadata: Metadata,
}

impl ApiError {
    /// Create an error template with no metadata
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        error_code: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
        http_status: StatusCode,
    ) -> Self {
        Self {
            name: name.into(),
            error_code: error_code.into(),
            message: message.into(),
            http_status,
            metadata: Metadata::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn error_code(&self) -> &str {
        &self.error_code
    }

    /// The error code as an integer, when it is numeric
    pub fn error_code_number(&self) -> Option<i64> {
        self.error_code.trim().parse().ok()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn http_status(&self) -> StatusCode {
        self.http_status
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Add a metadata entry to this occurrence
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Merge a whole metadata map into this occurrence
    pub fn with_metadata_map(mut self, metadata: Metadata) -> Self {
        self.metadata.extend(metadata);
        self
    }

    /// Override the default message for this occurrence
    pub fn with_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.message = message.into();
        self
    }

    /// Strip per-occurrence metadata, leaving the template
    pub fn without_metadata(mut self) -> Self {
        self.metadata.clear();
        self
    }

    /// True when both values describe the same registered error kind,
    /// ignoring message overrides and metadata
    pub fn same_kind(&self, other: &ApiError) -> bool {
        self.name == other.name
            && self.error_code == other.error_code
            && self.http_status == other.http_status
    }

    fn code_sort_key(&self) -> (Option<i64>, &str) {
        (self.error_code_number(), &self.error_code)
    }
}

impl Hash for ApiError {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.error_code.hash(state);
        self.message.hash(state);
        self.http_status.hash(state);
        self.metadata.len().hash(state);
        for (key, value) in &self.metadata {
            key.hash(state);
            canonical(value).hash(state);
        }
    }
}

impl Ord for ApiError {
    fn cmp(&self, other: &Self) -> Ordering {
        // Option<i64> orders None first, so flip it: numeric codes lead
        let (self_num, self_code) = self.code_sort_key();
        let (other_num, other_code) = other.code_sort_key();
        let numeric = match (self_num, other_num) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        numeric
            .then_with(|| self_code.cmp(other_code))
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.message.cmp(&other.message))
            .then_with(|| self.http_status.cmp(&other.http_status))
            .then_with(|| {
                self.metadata
                    .iter()
                    .map(|(k, v)| (k, canonical(v)))
                    .cmp(other.metadata.iter().map(|(k, v)| (k, canonical(v))))
            })
    }
}

impl PartialOrd for ApiError {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Render a metadata value so that values equal under `Value::eq` render
/// identically. Floats are the only case where they differ: `-0.0 == 0.0`.
fn canonical(value: &Value) -> String {
    fn normalize(value: &Value) -> Value {
        match value {
            Value::Number(n) if n.is_f64() && n.as_f64() == Some(0.0) => Value::from(0.0),
            Value::Array(items) => Value::Array(items.iter().map(normalize).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), normalize(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
    normalize(value).to_string()
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {}): {}",
            self.name,
            self.error_code,
            self.http_status.as_u16(),
            self.message
        )
    }
}
