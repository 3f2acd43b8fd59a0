//! Classifier chain
//!
//! Each classifier looks at a [`Failure`] and either claims it, returning a
//! [`Classification`], or declines. The chain is consulted in order and the
//! first classifier that claims the failure wins; list position is the only
//! precedence rule.
//!
//! Default order:
//! 1. [`ApiErrorClassifier`] - errors the application raised on purpose
//! 2. [`ValidationClassifier`] - constraint violations
//! 3. [`FrameworkClassifier`] - requests the framework rejected
//! 4. [`DownstreamClassifier`] - failed dependency calls
//! 5. [`GenericClassifier`] - anything else, with diagnostics

mod api;
mod downstream;
mod framework;
mod generic;
mod validation;

pub use api::ApiErrorClassifier;
pub use downstream::DownstreamClassifier;
pub use framework::FrameworkClassifier;
pub use generic::GenericClassifier;
pub use validation::{ConstraintBindings, ValidationClassifier, render_message};

use crate::config::ResolverConfig;
use crate::error::{ApiError, RegistryConfigError};
use crate::failure::{Failure, LogDetails, ResponseHeaders};
use crate::registry::ApiErrorRegistry;
use std::fmt;
use std::sync::Arc;

/// One step of the chain
///
/// Implementations must be stateless or internally synchronized: the
/// resolver calls them concurrently for unrelated failures. A classifier
/// never blocks; if it cannot decide it returns `None`.
pub trait ErrorClassifier: Send + Sync {
    /// Name used in logs and for [`ClassifierChain::insert_before`]
    fn name(&self) -> &str;

    /// Claim the failure, or decline with `None`
    fn classify(&self, failure: &Failure) -> Option<Classification>;
}

/// Result of a classifier claiming a failure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub errors: Vec<ApiError>,
    /// Diagnostics for the server log, never sent to the client
    pub extra_details_for_logging: LogDetails,
    pub extra_response_headers: ResponseHeaders,
}

impl Classification {
    pub fn new(errors: impl IntoIterator<Item = ApiError>) -> Self {
        Self {
            errors: errors.into_iter().collect(),
            extra_details_for_logging: Vec::new(),
            extra_response_headers: Vec::new(),
        }
    }

    pub fn single(error: ApiError) -> Self {
        Self::new([error])
    }

    /// A classification with no errors counts as a decline
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn with_log_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_details_for_logging.push((key.into(), value.into()));
        self
    }

    pub fn with_log_details(mut self, details: impl IntoIterator<Item = (String, String)>) -> Self {
        self.extra_details_for_logging.extend(details);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_response_headers.push((name.into(), value.into()));
        self
    }

    pub fn with_headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.extra_response_headers.extend(headers);
        self
    }
}

/// Ordered list of classifiers, assembled once at startup
#[derive(Clone, Default)]
pub struct ClassifierChain {
    classifiers: Vec<Arc<dyn ErrorClassifier>>,
}

impl ClassifierChain {
    /// An empty chain; every failure falls back to the unhandled error
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in classifiers in their default order.
    ///
    /// Fails when a constraint binding names a template the registry does
    /// not contain.
    pub fn with_defaults(
        registry: Arc<ApiErrorRegistry>,
        bindings: ConstraintBindings,
        config: &ResolverConfig,
    ) -> Result<Self, RegistryConfigError> {
        bindings.check_against(&registry)?;
        Ok(Self::new()
            .push(ApiErrorClassifier)
            .push(ValidationClassifier::new(bindings))
            .push(FrameworkClassifier)
            .push(DownstreamClassifier::new(config.max_logged_body_bytes))
            .push(GenericClassifier::new(registry)))
    }

    /// Append a classifier at the end of the chain
    pub fn push(self, classifier: impl ErrorClassifier + 'static) -> Self {
        self.push_arc(Arc::new(classifier))
    }

    pub fn push_arc(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifiers.push(classifier);
        self
    }

    /// Insert at `index`, clamped to the chain length
    pub fn insert(mut self, index: usize, classifier: impl ErrorClassifier + 'static) -> Self {
        let index = index.min(self.classifiers.len());
        self.classifiers.insert(index, Arc::new(classifier));
        self
    }

    /// Insert in front of the classifier called `name`, or append when no
    /// classifier has that name
    pub fn insert_before(self, name: &str, classifier: impl ErrorClassifier + 'static) -> Self {
        match self.classifiers.iter().position(|c| c.name() == name) {
            Some(index) => self.insert(index, classifier),
            None => self.push(classifier),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.classifiers.iter().map(|c| c.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ErrorClassifier>> {
        self.classifiers.iter()
    }

    pub fn len(&self) -> usize {
        self.classifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classifiers.is_empty()
    }
}

impl fmt::Debug for ClassifierChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
