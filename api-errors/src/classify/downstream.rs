//! Failed calls to downstream dependencies
//!
//! | Downstream outcome | Error | Status |
//! |---|---|---|
//! | no response (timeout, refused, circuit open) | `TEMPORARY_SERVICE_PROBLEM` | 503 |
//! | 429 or 503 | `OUTSIDE_DEPENDENCY_RETURNED_A_TEMPORARY_ERROR` | 503 |
//! | any other status | `OUTSIDE_DEPENDENCY_RETURNED_AN_UNRECOVERABLE_ERROR` | 500 |
//!
//! The downstream status, headers and body go to the log only.

use super::{Classification, ErrorClassifier};
use crate::error::CoreApiError;
use crate::failure::{DownstreamFailure, Failure};

const REDACTED_HEADERS: [&str; 4] = ["authorization", "proxy-authorization", "cookie", "set-cookie"];

/// Claims [`Failure::Downstream`]
#[derive(Debug, Clone, Copy)]
pub struct DownstreamClassifier {
    max_logged_body_bytes: usize,
}

impl DownstreamClassifier {
    pub fn new(max_logged_body_bytes: usize) -> Self {
        Self {
            max_logged_body_bytes,
        }
    }

    fn core_error(failure: &DownstreamFailure) -> CoreApiError {
        match (failure.connection_problem, failure.status) {
            (Some(_), _) => CoreApiError::TemporaryServiceProblem,
            (None, Some(429 | 503)) => CoreApiError::OutsideDependencyReturnedATemporaryError,
            (None, _) => CoreApiError::OutsideDependencyReturnedAnUnrecoverableError,
        }
    }

    fn log_details(&self, failure: &DownstreamFailure) -> Vec<(String, String)> {
        let mut details = vec![("dependency".to_string(), failure.dependency.clone())];
        if let Some(status) = failure.status {
            details.push(("downstream_status".to_string(), status.to_string()));
        }
        if let Some(problem) = failure.connection_problem {
            details.push(("connection_problem".to_string(), problem.to_string()));
        }
        for (name, value) in &failure.headers {
            let value = if REDACTED_HEADERS
                .iter()
                .any(|h| h.eq_ignore_ascii_case(name))
            {
                "[redacted]".to_string()
            } else {
                value.clone()
            };
            details.push((format!("downstream_header.{}", name.to_ascii_lowercase()), value));
        }
        if let Some(body) = &failure.body {
            details.push((
                "downstream_body".to_string(),
                truncate(body, self.max_logged_body_bytes),
            ));
        }
        details
    }
}

impl Default for DownstreamClassifier {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_LOGGED_BODY_BYTES)
    }
}

impl ErrorClassifier for DownstreamClassifier {
    fn name(&self) -> &str {
        "downstream"
    }

    fn classify(&self, failure: &Failure) -> Option<Classification> {
        let Failure::Downstream(downstream) = failure else {
            return None;
        };
        Some(
            Classification::single(Self::core_error(downstream).to_api_error())
                .with_log_details(self.log_details(downstream)),
        )
    }
}

/// Cut `body` to at most `max` bytes on a char boundary
fn truncate(body: &str, max: usize) -> String {
    if body.len() <= max {
        return body.to_string();
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...[{} bytes truncated]", &body[..end], body.len() - end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::ConnectionProblem;
    use http::StatusCode;

    fn classify(failure: DownstreamFailure) -> Classification {
        DownstreamClassifier::new(16)
            .classify(&Failure::Downstream(failure))
            .unwrap()
    }

    fn detail<'a>(c: &'a Classification, key: &str) -> Option<&'a str> {
        c.extra_details_for_logging
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_connection_problems_are_temporary() {
        for problem in [
            ConnectionProblem::Timeout,
            ConnectionProblem::Refused,
            ConnectionProblem::CircuitOpen,
            ConnectionProblem::Other,
        ] {
            let result = classify(DownstreamFailure::connection("inventory", problem));
            assert_eq!(
                result.errors,
                vec![CoreApiError::TemporaryServiceProblem.to_api_error()]
            );
            assert_eq!(
                detail(&result, "connection_problem"),
                Some(problem.to_string().as_str())
            );
        }
    }

    #[test]
    fn test_throttled_or_unavailable_is_temporary() {
        for status in [429, 503] {
            let result = classify(DownstreamFailure::status("inventory", status));
            assert_eq!(result.errors[0].http_status(), StatusCode::SERVICE_UNAVAILABLE);
            assert_eq!(
                result.errors[0].name(),
                "OUTSIDE_DEPENDENCY_RETURNED_A_TEMPORARY_ERROR"
            );
        }
    }

    #[test]
    fn test_other_status_is_unrecoverable() {
        for status in [400, 404, 500, 502, 999] {
            let result = classify(DownstreamFailure::status("inventory", status));
            assert_eq!(
                result.errors,
                vec![CoreApiError::OutsideDependencyReturnedAnUnrecoverableError.to_api_error()],
                "status {status}"
            );
            assert_eq!(
                detail(&result, "downstream_status"),
                Some(status.to_string().as_str())
            );
        }
    }

    #[test]
    fn test_body_truncated_and_headers_redacted() {
        let result = classify(
            DownstreamFailure::status("billing", 500)
                .with_header("Authorization", "Bearer abc")
                .with_header("X-Request-Id", "r-1")
                .with_body("{\"error\":\"stack trace follows ...\"}"),
        );
        assert_eq!(detail(&result, "dependency"), Some("billing"));
        assert_eq!(
            detail(&result, "downstream_header.authorization"),
            Some("[redacted]")
        );
        assert_eq!(detail(&result, "downstream_header.x-request-id"), Some("r-1"));
        let body = detail(&result, "downstream_body").unwrap();
        assert!(body.starts_with("{\"error\":\"stack "));
        assert!(body.ends_with("bytes truncated]"));
        assert!(result.errors[0].metadata().is_empty());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 16), "short");
        // 'é' is two bytes; cutting at 2 would split it
        let cut = truncate("aéb", 2);
        assert!(cut.starts_with("a..."));
    }
}
