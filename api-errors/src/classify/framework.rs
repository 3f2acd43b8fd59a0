//! Requests the framework rejected before a handler ran

use super::{Classification, ErrorClassifier};
use crate::error::CoreApiError;
use crate::failure::{Failure, FrameworkFailure};

/// Claims [`Failure::Framework`], mapping each rejection to a core error
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameworkClassifier;

impl ErrorClassifier for FrameworkClassifier {
    fn name(&self) -> &str {
        "framework"
    }

    fn classify(&self, failure: &Failure) -> Option<Classification> {
        let Failure::Framework(rejection) = failure else {
            return None;
        };

        let classification = match rejection {
            FrameworkFailure::NotFound => {
                Classification::single(CoreApiError::NotFound.to_api_error())
            }
            FrameworkFailure::MethodNotAllowed { method } => {
                Classification::single(CoreApiError::MethodNotAllowed.to_api_error())
                    .with_log_detail("method", method.clone())
            }
            FrameworkFailure::NotAcceptable => {
                Classification::single(CoreApiError::NoAcceptableRepresentation.to_api_error())
            }
            FrameworkFailure::UnsupportedMediaType { content_type } => {
                Classification::single(CoreApiError::UnsupportedMediaType.to_api_error())
                    .with_log_detail(
                        "content_type",
                        content_type.clone().unwrap_or_else(|| "<none>".to_string()),
                    )
            }
            FrameworkFailure::MalformedRequest { detail } => {
                Classification::single(CoreApiError::MalformedRequest.to_api_error())
                    .with_log_detail("malformed_detail", detail.clone())
            }
            FrameworkFailure::MissingContent => {
                Classification::single(CoreApiError::MissingExpectedContent.to_api_error())
            }
            // Property and type are safe to show; the client named them
            FrameworkFailure::TypeConversion {
                property,
                required_type,
            } => Classification::single(
                CoreApiError::TypeConversionError
                    .to_api_error()
                    .with_metadata("bad_property_name", property.clone())
                    .with_metadata("required_type", required_type.clone()),
            ),
            FrameworkFailure::Unauthorized { detail } => {
                Classification::single(CoreApiError::Unauthorized.to_api_error())
                    .with_log_detail("auth_detail", detail.clone())
            }
            FrameworkFailure::Forbidden { detail } => {
                Classification::single(CoreApiError::Forbidden.to_api_error())
                    .with_log_detail("auth_detail", detail.clone())
            }
            FrameworkFailure::TooManyRequests => {
                Classification::single(CoreApiError::TooManyRequests.to_api_error())
            }
        };
        Some(classification)
    }
}
