//! HTTP status code mapping for core errors

use super::codes::CoreApiError;
use http::StatusCode;

impl CoreApiError {
    /// Get the HTTP status this core error implies
    pub const fn http_status(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            Self::GenericBadRequest
            | Self::InvalidValue
            | Self::MissingExpectedContent
            | Self::TypeConversionError
            | Self::MalformedRequest => StatusCode::BAD_REQUEST,

            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::NoAcceptableRepresentation => StatusCode::NOT_ACCEPTABLE,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,

            // 503 Service Unavailable (transient, client can retry)
            Self::TemporaryServiceProblem | Self::OutsideDependencyReturnedATemporaryError => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            // 500 Internal Server Error
            Self::GenericServiceError
            | Self::ServersideValidationError
            | Self::OutsideDependencyReturnedAnUnrecoverableError
            | Self::UnhandledError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for errors that describe a fault on the server side
    pub fn is_server_error(&self) -> bool {
        self.http_status().is_server_error()
    }
}
