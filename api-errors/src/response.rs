//! Client-facing response contract
//!
//! ```json
//! {
//!   "error_id": "6f1c0c8e-...",
//!   "errors": [
//!     { "error_code": "1001", "message": "Validation failed", "metadata": { "field": "age" } }
//!   ]
//! }
//! ```
//!
//! Only codes, messages and metadata are exposed. Names, statuses of
//! individual errors and logging details stay on the server.

use crate::error::{ApiError, Metadata};
use crate::resolver::ResolvedFailure;
use axum::Json;
use axum::response::{IntoResponse, Response};
use http::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One entry of the `errors` array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorContractEntry {
    pub error_code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl From<&ApiError> for ErrorContractEntry {
    fn from(err: &ApiError) -> Self {
        Self {
            error_code: err.error_code().to_string(),
            message: err.message().to_string(),
            metadata: err.metadata().clone(),
        }
    }
}

/// JSON body sent for every resolved failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponseBody {
    pub error_id: Uuid,
    pub errors: Vec<ErrorContractEntry>,
}

impl From<&ResolvedFailure> for ErrorResponseBody {
    fn from(resolved: &ResolvedFailure) -> Self {
        Self {
            error_id: resolved.error_id,
            errors: resolved.errors.iter().map(ErrorContractEntry::from).collect(),
        }
    }
}

impl IntoResponse for ResolvedFailure {
    fn into_response(self) -> Response {
        let body = ErrorResponseBody::from(&self);
        let mut response = (self.http_status, Json(body)).into_response();

        let headers = response.headers_mut();
        for (name, value) in &self.extra_response_headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => tracing::warn!(
                    error_id = %self.error_id,
                    header = %name,
                    "Skipping invalid response header"
                ),
            }
        }
        response
    }
}
