//! Core error catalogue
//!
//! The fixed baseline every registry ships with. All codes live in the
//! reserved core range (`0..=99`):
//! - 1x: malformed or invalid client input
//! - 2x: access and routing errors
//! - 9x: server-side and downstream errors

use super::types::ApiError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Core error kinds
///
/// Codes are stable and never renumbered. Project-specific errors are
/// declared separately and registered next to these in
/// [`ApiErrorRegistry`](crate::registry::ApiErrorRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u16)]
pub enum CoreApiError {
    // ==================== 1x: Client input ====================
    /// Request is invalid for an unspecified reason
    GenericBadRequest = 10,
    /// A single field carries an invalid value
    InvalidValue = 11,
    /// Request body or required content is missing
    MissingExpectedContent = 12,
    /// A value could not be converted to the required type
    TypeConversionError = 13,
    /// Request body could not be parsed
    MalformedRequest = 14,

    // ==================== 2x: Access and routing ====================
    /// Caller is not authenticated
    Unauthorized = 20,
    /// Caller is authenticated but not allowed
    Forbidden = 21,
    /// No resource matches the request
    NotFound = 22,
    /// Resource does not support the request method
    MethodNotAllowed = 23,
    /// No representation matches the Accept header
    NoAcceptableRepresentation = 24,
    /// Request content type is not supported
    UnsupportedMediaType = 25,
    /// Caller exceeded its request quota
    TooManyRequests = 26,

    // ==================== 9x: Server and downstream ====================
    /// Generic server-side failure
    GenericServiceError = 90,
    /// An object built by the service itself failed validation
    ServersideValidationError = 91,
    /// A dependency returned an error that will not go away on retry
    OutsideDependencyReturnedAnUnrecoverableError = 92,
    /// Service is temporarily unable to handle the request
    TemporaryServiceProblem = 93,
    /// A dependency returned a transient error
    OutsideDependencyReturnedATemporaryError = 94,
    /// Nothing recognized the failure
    UnhandledError = 99,
}

impl CoreApiError {
    /// Every core error, in code order
    pub const ALL: [CoreApiError; 18] = [
        Self::GenericBadRequest,
        Self::InvalidValue,
        Self::MissingExpectedContent,
        Self::TypeConversionError,
        Self::MalformedRequest,
        Self::Unauthorized,
        Self::Forbidden,
        Self::NotFound,
        Self::MethodNotAllowed,
        Self::NoAcceptableRepresentation,
        Self::UnsupportedMediaType,
        Self::TooManyRequests,
        Self::GenericServiceError,
        Self::ServersideValidationError,
        Self::OutsideDependencyReturnedAnUnrecoverableError,
        Self::TemporaryServiceProblem,
        Self::OutsideDependencyReturnedATemporaryError,
        Self::UnhandledError,
    ];

    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Stable registry name
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GenericBadRequest => "GENERIC_BAD_REQUEST",
            Self::InvalidValue => "INVALID_VALUE",
            Self::MissingExpectedContent => "MISSING_EXPECTED_CONTENT",
            Self::TypeConversionError => "TYPE_CONVERSION_ERROR",
            Self::MalformedRequest => "MALFORMED_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::NoAcceptableRepresentation => "NO_ACCEPTABLE_REPRESENTATION",
            Self::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
            Self::TooManyRequests => "TOO_MANY_REQUESTS",
            Self::GenericServiceError => "GENERIC_SERVICE_ERROR",
            Self::ServersideValidationError => "SERVERSIDE_VALIDATION_ERROR",
            Self::OutsideDependencyReturnedAnUnrecoverableError => {
                "OUTSIDE_DEPENDENCY_RETURNED_AN_UNRECOVERABLE_ERROR"
            }
            Self::TemporaryServiceProblem => "TEMPORARY_SERVICE_PROBLEM",
            Self::OutsideDependencyReturnedATemporaryError => {
                "OUTSIDE_DEPENDENCY_RETURNED_A_TEMPORARY_ERROR"
            }
            Self::UnhandledError => "UNHANDLED_ERROR",
        }
    }

    pub const fn message(&self) -> &'static str {
        match self {
            Self::GenericBadRequest => "Invalid request",
            Self::InvalidValue => "Invalid value",
            Self::MissingExpectedContent => "Missing expected content",
            Self::TypeConversionError => "Type conversion error",
            Self::MalformedRequest => "Malformed request",
            Self::Unauthorized => "Unauthorized access",
            Self::Forbidden => "Forbidden access",
            Self::NotFound => "The requested resource was not found",
            Self::MethodNotAllowed => "Http method not allowed",
            Self::NoAcceptableRepresentation => "No acceptable representation for this resource",
            Self::UnsupportedMediaType => "Unsupported media type",
            Self::TooManyRequests => "Too many requests",
            Self::GenericServiceError => {
                "An error occurred while fulfilling the request"
            }
            Self::ServersideValidationError => {
                "An error occurred while fulfilling the request"
            }
            Self::OutsideDependencyReturnedAnUnrecoverableError => {
                "An error occurred while fulfilling the request"
            }
            Self::TemporaryServiceProblem => {
                "The service is experiencing temporary problems. Please try again later"
            }
            Self::OutsideDependencyReturnedATemporaryError => {
                "The service is experiencing temporary problems. Please try again later"
            }
            Self::UnhandledError => "An unexpected error occurred",
        }
    }

    /// Look a core error up by its registry name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.name() == name)
    }

    /// Build the registry value for this core error
    pub fn to_api_error(self) -> ApiError {
        ApiError::new(
            self.name(),
            self.code().to_string(),
            self.message(),
            self.http_status(),
        )
    }
}

impl From<CoreApiError> for ApiError {
    fn from(core: CoreApiError) -> Self {
        core.to_api_error()
    }
}

impl From<CoreApiError> for u16 {
    #[inline]
    fn from(core: CoreApiError) -> Self {
        core.code()
    }
}

/// Error when converting from a u16 that names no core error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidCoreCode(pub u16);

impl fmt::Display for InvalidCoreCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid core error code: {}", self.0)
    }
}

impl std::error::Error for InvalidCoreCode {}

impl TryFrom<u16> for CoreApiError {
    type Error = InvalidCoreCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|e| e.code() == value)
            .ok_or(InvalidCoreCode(value))
    }
}

impl fmt::Display for CoreApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
