//! Resolution orchestrator
//!
//! [`ErrorResolver::resolve`] turns one [`Failure`] into a [`ResolvedFailure`]:
//! the deduplicated, sorted set of client-facing errors, one HTTP status, the
//! log-only diagnostics and the extra response headers.

use crate::classify::{Classification, ClassifierChain, ConstraintBindings};
use crate::config::{ERROR_ID_HEADER, ResolverConfig};
use crate::error::{ApiError, RegistryConfigError};
use crate::failure::{Failure, LogDetails, ResponseHeaders};
use crate::registry::ApiErrorRegistry;
use http::StatusCode;
use std::any::Any;
use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use uuid::Uuid;

/// Outcome of resolving one failure
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFailure {
    /// Ties the response body to the server log line
    pub error_id: Uuid,
    pub errors: BTreeSet<ApiError>,
    pub http_status: StatusCode,
    /// Name of the classifier that claimed the failure, `None` on fallback
    pub classifier: Option<String>,
    pub extra_details_for_logging: LogDetails,
    pub extra_response_headers: ResponseHeaders,
}

impl ResolvedFailure {
    pub fn is_server_error(&self) -> bool {
        self.http_status.is_server_error()
    }

    /// `NAME:code` for each error, in set order
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("{}:{}", e.name(), e.error_code()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Pick the response status for a set of errors: the numerically highest.
///
/// Returns `None` for an empty set.
pub fn arbitrate_status<'a>(errors: impl IntoIterator<Item = &'a ApiError>) -> Option<StatusCode> {
    errors
        .into_iter()
        .map(ApiError::http_status)
        .max_by_key(StatusCode::as_u16)
}

enum ChainOutcome {
    Claimed(String, Classification),
    Unclaimed,
    Panicked { classifier: String, message: String },
}

/// Runs the classifier chain and assembles the response outcome
///
/// Immutable after construction; share one instance across threads and
/// tasks behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ErrorResolver {
    registry: Arc<ApiErrorRegistry>,
    chain: ClassifierChain,
    config: ResolverConfig,
}

impl ErrorResolver {
    pub fn new(
        registry: Arc<ApiErrorRegistry>,
        chain: ClassifierChain,
        config: ResolverConfig,
    ) -> Self {
        Self {
            registry,
            chain,
            config,
        }
    }

    /// Resolver over the built-in classifier chain
    pub fn with_defaults(
        registry: Arc<ApiErrorRegistry>,
        bindings: ConstraintBindings,
        config: ResolverConfig,
    ) -> Result<Self, RegistryConfigError> {
        let chain = ClassifierChain::with_defaults(registry.clone(), bindings, &config)?;
        Ok(Self::new(registry, chain, config))
    }

    pub fn registry(&self) -> &ApiErrorRegistry {
        &self.registry
    }

    pub fn chain(&self) -> &ClassifierChain {
        &self.chain
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a failure. Never panics, even when a classifier does.
    pub fn resolve(&self, failure: &Failure) -> ResolvedFailure {
        let error_id = Uuid::new_v4();

        let (classifier, classification) = match self.run_chain(failure) {
            ChainOutcome::Claimed(name, classification) => (Some(name), classification),
            ChainOutcome::Unclaimed => (None, self.fallback()),
            ChainOutcome::Panicked {
                classifier,
                message,
            } => {
                tracing::error!(
                    error_id = %error_id,
                    classifier = %classifier,
                    panic = %message,
                    "Error classifier panicked, falling back to unhandled error"
                );
                let fallback = self
                    .fallback()
                    .with_log_detail("panicked_classifier", classifier)
                    .with_log_detail("panic", message);
                (None, fallback)
            }
        };

        let errors: BTreeSet<ApiError> = classification.errors.into_iter().collect();
        let http_status = arbitrate_status(&errors)
            .unwrap_or_else(|| self.registry.unhandled_error().http_status());

        let mut extra_response_headers = classification.extra_response_headers;
        if self.config.emit_error_id_header {
            extra_response_headers.push((ERROR_ID_HEADER.to_string(), error_id.to_string()));
        }

        let resolved = ResolvedFailure {
            error_id,
            errors,
            http_status,
            classifier,
            extra_details_for_logging: classification.extra_details_for_logging,
            extra_response_headers,
        };
        self.log(failure, &resolved);
        resolved
    }

    fn fallback(&self) -> Classification {
        Classification::single(self.registry.unhandled_error())
    }

    fn run_chain(&self, failure: &Failure) -> ChainOutcome {
        for classifier in self.chain.iter() {
            let result = panic::catch_unwind(AssertUnwindSafe(|| classifier.classify(failure)));
            match result {
                Ok(Some(classification)) if !classification.is_empty() => {
                    return ChainOutcome::Claimed(classifier.name().to_string(), classification);
                }
                Ok(_) => {}
                Err(panic_info) => {
                    return ChainOutcome::Panicked {
                        classifier: classifier.name().to_string(),
                        message: panic_message(&*panic_info),
                    };
                }
            }
        }
        ChainOutcome::Unclaimed
    }

    fn log(&self, failure: &Failure, resolved: &ResolvedFailure) {
        let errors = resolved.error_summary();
        let details = format_details(&resolved.extra_details_for_logging);
        let classifier = resolved.classifier.as_deref().unwrap_or("<fallback>");
        let status = resolved.http_status.as_u16();

        if resolved.is_server_error() {
            tracing::error!(
                error_id = %resolved.error_id,
                status,
                failure = failure.tag(),
                classifier,
                errors = %errors,
                details = %details,
                "Request failed"
            );
        } else if self.config.log_client_errors {
            tracing::warn!(
                error_id = %resolved.error_id,
                status,
                failure = failure.tag(),
                classifier,
                errors = %errors,
                details = %details,
                "Request rejected"
            );
        } else {
            tracing::debug!(
                error_id = %resolved.error_id,
                status,
                failure = failure.tag(),
                classifier,
                errors = %errors,
                details = %details,
                "Request rejected"
            );
        }
    }
}

fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

fn format_details(details: &LogDetails) -> String {
    details
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ")
}
