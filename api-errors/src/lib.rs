//! Error resolution engine for HTTP APIs
//!
//! Turns any failure raised while handling a request into a stable,
//! client-facing error contract: a set of [`ApiError`]s, one HTTP status and
//! an error id, with diagnostics kept in the server log.
//!
//! Startup builds three immutable pieces, shared via `Arc`:
//! - [`ApiErrorRegistry`]: core catalogue plus project errors, validated once
//! - [`ClassifierChain`]: ordered [`ErrorClassifier`]s, first claim wins
//! - [`ErrorResolver`]: runs the chain and assembles a [`ResolvedFailure`]
//!
//! ```
//! use api_errors::{
//!     ApiError, ApiErrorRegistry, ConstraintBindings, ConstraintViolation, ErrorCodeRange,
//!     ErrorResolver, Failure, ResolverConfig, ValidationFailure,
//! };
//! use http::StatusCode;
//! use std::sync::Arc;
//!
//! let validation_failed = ApiError::new(
//!     "VALIDATION_FAILED",
//!     "1001",
//!     "Validation failed",
//!     StatusCode::UNPROCESSABLE_ENTITY,
//! );
//! let range = ErrorCodeRange::of(1000, 1099, "SIGNUP").unwrap();
//! let registry = Arc::new(ApiErrorRegistry::new([validation_failed.clone()], range).unwrap());
//! let bindings = ConstraintBindings::new().bind("NotBlank", validation_failed);
//! let resolver =
//!     ErrorResolver::with_defaults(registry, bindings, ResolverConfig::default()).unwrap();
//!
//! let failure = Failure::from(ValidationFailure::client_data(vec![
//!     ConstraintViolation::new("name", "NotBlank").with_rejected_value(""),
//! ]));
//! let resolved = resolver.resolve(&failure);
//! assert_eq!(resolved.http_status, StatusCode::UNPROCESSABLE_ENTITY);
//! assert_eq!(resolved.errors.len(), 1);
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod failure;
pub mod registry;
pub mod resolver;
pub mod response;

// Re-exports
pub use classify::{Classification, ClassifierChain, ConstraintBindings, ErrorClassifier};
pub use config::{ERROR_ID_HEADER, ErrorCatalog, ResolverConfig};
pub use error::{
    ApiError, CoreApiError, ErrorCodeRange, InvalidRangeError, Metadata, RegistryConfigError,
    RegistryProblem,
};
pub use failure::{
    ApiErrorFailure, ConnectionProblem, ConstraintViolation, DownstreamFailure, Failure,
    FrameworkFailure, UnknownFailure, ValidationFailure, ValidationOrigin,
};
pub use registry::ApiErrorRegistry;
pub use resolver::{ErrorResolver, ResolvedFailure, arbitrate_status};
pub use response::{ErrorContractEntry, ErrorResponseBody};
