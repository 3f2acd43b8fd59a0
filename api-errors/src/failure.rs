//! Normalized failures
//!
//! Framework adapters turn whatever their framework raised into one
//! [`Failure`] value and hand it to the resolver. The variant is the
//! discriminant the classifiers match on.

use crate::error::ApiError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Key/value pairs destined for logs, never for clients
pub type LogDetails = Vec<(String, String)>;

/// Header name/value pairs added to the outgoing response
pub type ResponseHeaders = Vec<(String, String)>;

/// A failure raised while handling a request
#[derive(Debug, Clone)]
pub enum Failure {
    /// Application code raised errors it already mapped to `ApiError`s
    ApiErrors(ApiErrorFailure),
    /// Validation of an object failed, possibly on several fields at once
    Validation(ValidationFailure),
    /// The web framework rejected the request before the handler ran
    Framework(FrameworkFailure),
    /// A call to a downstream dependency failed
    Downstream(DownstreamFailure),
    /// Anything else
    Unknown(UnknownFailure),
}

impl Failure {
    /// Short tag naming the variant, used in logs
    pub fn tag(&self) -> &'static str {
        match self {
            Self::ApiErrors(_) => "explicit-api-error",
            Self::Validation(_) => "validation",
            Self::Framework(_) => "framework",
            Self::Downstream(_) => "downstream-network",
            Self::Unknown(_) => "unknown",
        }
    }

    /// Wrap any error as an unknown failure, keeping its cause chain
    pub fn unknown_from_error<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        Self::Unknown(UnknownFailure::from_error(err))
    }
}

impl From<ApiError> for Failure {
    fn from(err: ApiError) -> Self {
        Self::ApiErrors(ApiErrorFailure::new(err))
    }
}

impl From<ApiErrorFailure> for Failure {
    fn from(failure: ApiErrorFailure) -> Self {
        Self::ApiErrors(failure)
    }
}

impl From<ValidationFailure> for Failure {
    fn from(failure: ValidationFailure) -> Self {
        Self::Validation(failure)
    }
}

impl From<FrameworkFailure> for Failure {
    fn from(failure: FrameworkFailure) -> Self {
        Self::Framework(failure)
    }
}

impl From<DownstreamFailure> for Failure {
    fn from(failure: DownstreamFailure) -> Self {
        Self::Downstream(failure)
    }
}

impl From<UnknownFailure> for Failure {
    fn from(failure: UnknownFailure) -> Self {
        Self::Unknown(failure)
    }
}

impl From<anyhow::Error> for Failure {
    fn from(err: anyhow::Error) -> Self {
        Self::Unknown(UnknownFailure {
            type_name: "anyhow::Error".to_string(),
            message: err.to_string(),
            causes: err.chain().skip(1).map(ToString::to_string).collect(),
        })
    }
}

// ==================== Explicit API errors ====================

/// Errors raised on purpose by application code
///
/// The message is internal and only logged; clients see the `ApiError`s.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiErrorFailure {
    pub errors: Vec<ApiError>,
    pub message: String,
    pub extra_details_for_logging: LogDetails,
    pub extra_response_headers: ResponseHeaders,
}

impl ApiErrorFailure {
    pub fn new(error: ApiError) -> Self {
        Self::with_errors(vec![error])
    }

    pub fn with_errors(errors: Vec<ApiError>) -> Self {
        let message = errors
            .iter()
            .map(|e| e.name().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            errors,
            message,
            extra_details_for_logging: Vec::new(),
            extra_response_headers: Vec::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_log_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_details_for_logging.push((key.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_response_headers.push((name.into(), value.into()));
        self
    }
}

// ==================== Validation ====================

/// One failed constraint on one field
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintViolation {
    /// Dotted path of the offending field, e.g. `address.zip`
    pub field_path: String,
    /// Identifier of the violated constraint, e.g. `NotBlank`
    pub constraint: String,
    pub rejected_value: Value,
    /// Parameters declared on the constraint, e.g. `min`/`max`
    pub params: BTreeMap<String, Value>,
}

impl ConstraintViolation {
    pub fn new(field_path: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            constraint: constraint.into(),
            rejected_value: Value::Null,
            params: BTreeMap::new(),
        }
    }

    pub fn with_rejected_value(mut self, value: impl Into<Value>) -> Self {
        self.rejected_value = value.into();
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (rejected {})",
            self.field_path, self.constraint, self.rejected_value
        )
    }
}

/// Where the validated object came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOrigin {
    /// Data sent by the client; violations are the client's to fix
    ClientData,
    /// An object the service built itself; violations are a server bug
    Serverside,
}

/// Validation of one object failed
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure {
    pub origin: ValidationOrigin,
    /// Type of the validated object, for logs
    pub object_type: Option<String>,
    pub violations: Vec<ConstraintViolation>,
}

impl ValidationFailure {
    pub fn client_data(violations: Vec<ConstraintViolation>) -> Self {
        Self {
            origin: ValidationOrigin::ClientData,
            object_type: None,
            violations,
        }
    }

    pub fn serverside(violations: Vec<ConstraintViolation>) -> Self {
        Self {
            origin: ValidationOrigin::Serverside,
            object_type: None,
            violations,
        }
    }

    pub fn with_object_type(mut self, object_type: impl Into<String>) -> Self {
        self.object_type = Some(object_type.into());
        self
    }
}

impl From<&validator::ValidationErrors> for ValidationFailure {
    /// Flatten `validator` errors into client-data violations.
    ///
    /// Nested structs produce dotted paths (`address.zip`), lists produce
    /// indexed paths (`items[2].sku`). The `value` param becomes the
    /// rejected value; every other param is kept for message rendering.
    fn from(errors: &validator::ValidationErrors) -> Self {
        let mut violations = Vec::new();
        collect_violations("", errors, &mut violations);
        violations.sort_by(|a, b| a.field_path.cmp(&b.field_path));
        Self::client_data(violations)
    }
}

impl From<validator::ValidationErrors> for Failure {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(ValidationFailure::from(&errors))
    }
}

fn collect_violations(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut Vec<ConstraintViolation>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for err in list {
                    let mut violation = ConstraintViolation::new(path.clone(), err.code.to_string());
                    for (name, value) in &err.params {
                        if *name == "value" {
                            violation.rejected_value = value.clone();
                        } else {
                            violation.params.insert(name.to_string(), value.clone());
                        }
                    }
                    out.push(violation);
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_violations(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_violations(&format!("{path}[{index}]"), nested, out);
                }
            }
        }
    }
}

// ==================== Framework ====================

/// Request rejected by the framework before reaching a handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameworkFailure {
    NotFound,
    MethodNotAllowed { method: String },
    NotAcceptable,
    UnsupportedMediaType { content_type: Option<String> },
    /// Body present but unparsable
    MalformedRequest { detail: String },
    /// Body or a required part of it is absent
    MissingContent,
    /// A path/query/body value could not be converted
    TypeConversion {
        property: String,
        required_type: String,
    },
    Unauthorized { detail: String },
    Forbidden { detail: String },
    TooManyRequests,
}

// ==================== Downstream ====================

/// Why a downstream call produced no response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionProblem {
    Timeout,
    Refused,
    CircuitOpen,
    Other,
}

impl fmt::Display for ConnectionProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Timeout => "timeout",
            Self::Refused => "refused",
            Self::CircuitOpen => "circuit_open",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// A downstream dependency call failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownstreamFailure {
    pub dependency: String,
    /// Raw status, `None` when no response was received
    pub status: Option<u16>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub connection_problem: Option<ConnectionProblem>,
}

impl DownstreamFailure {
    /// The dependency answered with an error status
    pub fn status(dependency: impl Into<String>, status: u16) -> Self {
        Self {
            dependency: dependency.into(),
            status: Some(status),
            headers: Vec::new(),
            body: None,
            connection_problem: None,
        }
    }

    /// The dependency never answered
    pub fn connection(dependency: impl Into<String>, problem: ConnectionProblem) -> Self {
        Self {
            dependency: dependency.into(),
            status: None,
            headers: Vec::new(),
            body: None,
            connection_problem: Some(problem),
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

// ==================== Unknown ====================

/// A failure no adapter could put in a more specific shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFailure {
    pub type_name: String,
    pub message: String,
    /// Messages of the source chain, outermost first
    pub causes: Vec<String>,
}

impl UnknownFailure {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            causes: Vec::new(),
        }
    }

    /// Capture an error and the messages of its `source()` chain
    pub fn from_error<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Self {
            type_name: std::any::type_name::<E>().to_string(),
            message: err.to_string(),
            causes,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }
}
