//! Error model for the resolution engine
//!
//! - [`ApiError`]: one client-facing error kind or occurrence
//! - [`CoreApiError`]: the fixed core catalogue (codes `0..=99`)
//! - [`ErrorCodeRange`]: numeric interval a project's codes must live in
//! - [`RegistryConfigError`]: fatal startup configuration errors
//!
//! # Example
//!
//! ```
//! use api_errors::error::{ApiError, CoreApiError, ErrorCodeRange};
//! use http::StatusCode;
//!
//! let range = ErrorCodeRange::of(1000, 1099, "billing").unwrap();
//! let err = ApiError::new("CARD_DECLINED", "1001", "Card declined", StatusCode::PAYMENT_REQUIRED);
//! assert!(range.is_in_range(err.error_code()));
//!
//! let occurrence = CoreApiError::InvalidValue
//!     .to_api_error()
//!     .with_metadata("field", "email");
//! assert_eq!(occurrence.error_code(), "11");
//! ```

mod codes;
mod http;
mod range;
mod types;

pub use codes::{CoreApiError, InvalidCoreCode};
pub use range::{CORE_ERROR_CODE_RANGE, CodeCandidate, ErrorCodeRange, InvalidRangeError};
pub use types::{ApiError, Metadata};

use thiserror::Error;

/// A single problem found while validating a registry
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Error)]
pub enum RegistryProblem {
    /// Project range shares codes with the reserved core range
    #[error("project range {range} overlaps reserved range {reserved}")]
    RangeOverlapsCore { range: String, reserved: String },

    /// Project error code is outside the declared project range
    #[error("project error {name} has code {code} outside range {range}")]
    CodeOutOfRange {
        name: String,
        code: String,
        range: String,
    },

    /// Two or more errors share a code
    #[error("error code {code} is shared by {names:?}")]
    DuplicateCode { code: String, names: Vec<String> },

    /// Two or more errors share a name
    #[error("error name {name} is declared {count} times")]
    DuplicateName { name: String, count: usize },
}

/// Fatal configuration error, raised while building the registry or its
/// bindings at startup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryConfigError {
    #[error(transparent)]
    InvalidRange(#[from] InvalidRangeError),

    /// Registry validation failed; every problem found is listed
    #[error("invalid error registry: {}", join_problems(problems))]
    Invalid { problems: Vec<RegistryProblem> },

    /// A constraint binding names an error the registry does not contain
    #[error("constraint {constraint} is bound to unknown error {name}")]
    UnknownBinding { constraint: String, name: String },

    /// Error catalogue could not be parsed
    #[error("invalid error catalog: {0}")]
    Catalog(String),
}

impl RegistryConfigError {
    /// Problems found by registry validation, empty for other variants
    pub fn problems(&self) -> &[RegistryProblem] {
        match self {
            Self::Invalid { problems } => problems,
            _ => &[],
        }
    }
}

fn join_problems(problems: &[RegistryProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
