//! Engine configuration
//!
//! # Environment variables
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | API_ERRORS_EMIT_ERROR_ID_HEADER | true | add the `error_uid` response header |
//! | API_ERRORS_MAX_LOGGED_BODY_BYTES | 4096 | cap on logged downstream bodies |
//! | API_ERRORS_LOG_CLIENT_ERRORS | true | log 4xx resolutions at `warn` (else `debug`) |
//!
//! # Error catalog
//!
//! Projects may declare their errors in JSON instead of code:
//!
//! ```json
//! {
//!   "range": { "name": "SIGNUP", "min": 1000, "max": 1099 },
//!   "errors": [
//!     { "name": "VALIDATION_FAILED", "code": 1001, "message": "Validation failed", "status": 422 }
//!   ],
//!   "constraint_bindings": { "NotBlank": "VALIDATION_FAILED" }
//! }
//! ```

use crate::classify::ConstraintBindings;
use crate::error::{ApiError, ErrorCodeRange, RegistryConfigError};
use crate::registry::ApiErrorRegistry;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Response header carrying the error id
pub const ERROR_ID_HEADER: &str = "error_uid";

pub const DEFAULT_MAX_LOGGED_BODY_BYTES: usize = 4096;

/// Runtime knobs of the resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Add [`ERROR_ID_HEADER`] to every resolved response
    pub emit_error_id_header: bool,
    /// Downstream bodies longer than this are truncated in logs
    pub max_logged_body_bytes: usize,
    /// Log 4xx resolutions at `warn`; when false they go to `debug`
    pub log_client_errors: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            emit_error_id_header: true,
            max_logged_body_bytes: DEFAULT_MAX_LOGGED_BODY_BYTES,
            log_client_errors: true,
        }
    }
}

impl ResolverConfig {
    /// Load from environment variables, using defaults for anything unset
    /// or unparsable
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            emit_error_id_header: lookup("API_ERRORS_EMIT_ERROR_ID_HEADER")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.emit_error_id_header),
            max_logged_body_bytes: lookup("API_ERRORS_MAX_LOGGED_BODY_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_logged_body_bytes),
            log_client_errors: lookup("API_ERRORS_LOG_CLIENT_ERRORS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.log_client_errors),
        }
    }
}

/// Declarative project error catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCatalog {
    pub range: RangeDef,
    #[serde(default)]
    pub errors: Vec<ErrorDef>,
    /// Constraint identifier -> error name
    #[serde(default)]
    pub constraint_bindings: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeDef {
    pub name: String,
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDef {
    pub name: String,
    pub code: CodeDef,
    pub message: String,
    pub status: u16,
}

/// Error codes may be written as JSON numbers or strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CodeDef {
    Number(i64),
    Text(String),
}

impl CodeDef {
    fn into_code(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

impl ErrorCatalog {
    pub fn from_json_str(json: &str) -> Result<Self, RegistryConfigError> {
        serde_json::from_str(json).map_err(|e| RegistryConfigError::Catalog(e.to_string()))
    }

    /// Build the validated registry and the constraint bindings it declares
    pub fn into_registry(
        self,
    ) -> Result<(ApiErrorRegistry, ConstraintBindings), RegistryConfigError> {
        let range = ErrorCodeRange::of(self.range.min, self.range.max, self.range.name)?;

        let mut errors = Vec::with_capacity(self.errors.len());
        for def in self.errors {
            let status = StatusCode::from_u16(def.status).map_err(|_| {
                RegistryConfigError::Catalog(format!(
                    "error {} has invalid http status {}",
                    def.name, def.status
                ))
            })?;
            errors.push(ApiError::new(def.name, def.code.into_code(), def.message, status));
        }

        let registry = ApiErrorRegistry::new(errors, range)?;
        let bindings = ConstraintBindings::from_names(&registry, self.constraint_bindings)?;
        Ok((registry, bindings))
    }
}

impl ApiErrorRegistry {
    /// Build from an error catalog, ignoring its constraint bindings
    pub fn from_catalog(catalog: ErrorCatalog) -> Result<Self, RegistryConfigError> {
        catalog.into_registry().map(|(registry, _)| registry)
    }

    pub fn from_catalog_json(json: &str) -> Result<Self, RegistryConfigError> {
        Self::from_catalog(ErrorCatalog::from_json_str(json)?)
    }
}
