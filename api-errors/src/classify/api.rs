//! Errors raised explicitly by application code

use super::{Classification, ErrorClassifier};
use crate::failure::Failure;

/// Claims [`Failure::ApiErrors`] and passes its errors through unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiErrorClassifier;

impl ErrorClassifier for ApiErrorClassifier {
    fn name(&self) -> &str {
        "api-error"
    }

    fn classify(&self, failure: &Failure) -> Option<Classification> {
        let Failure::ApiErrors(raised) = failure else {
            return None;
        };
        if raised.errors.is_empty() {
            return None;
        }

        Some(
            Classification::new(raised.errors.iter().cloned())
                .with_log_detail("api_error_message", raised.message.clone())
                .with_log_details(raised.extra_details_for_logging.iter().cloned())
                .with_headers(raised.extra_response_headers.iter().cloned()),
        )
    }
}
