//! Error code ranges
//!
//! Every project declares the numeric interval its own error codes live in.
//! The shipped core catalogue owns [`CORE_ERROR_CODE_RANGE`]; project ranges
//! must stay clear of it.

use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// Reserved range of the core error catalogue (`0..=99`)
pub const CORE_ERROR_CODE_RANGE: ErrorCodeRange = ErrorCodeRange {
    min_inclusive: 0,
    max_inclusive: 99,
    name: Cow::Borrowed("CORE"),
};

/// Returned when a range is declared with `min > max`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid error code range {name}: min {min} is greater than max {max}")]
pub struct InvalidRangeError {
    pub name: String,
    pub min: i64,
    pub max: i64,
}

/// A well-formed, inclusive interval of numeric error codes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ErrorCodeRange {
    min_inclusive: i64,
    max_inclusive: i64,
    name: Cow<'static, str>,
}

impl ErrorCodeRange {
    /// Create a range, rejecting `min > max`
    pub fn of(
        min: i64,
        max: i64,
        name: impl Into<Cow<'static, str>>,
    ) -> Result<Self, InvalidRangeError> {
        let name = name.into();
        if min > max {
            return Err(InvalidRangeError {
                name: name.into_owned(),
                min,
                max,
            });
        }
        Ok(Self {
            min_inclusive: min,
            max_inclusive: max,
            name,
        })
    }

    pub const fn min_inclusive(&self) -> i64 {
        self.min_inclusive
    }

    pub const fn max_inclusive(&self) -> i64 {
        self.max_inclusive
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check whether a candidate code falls inside this range.
    ///
    /// Total over its input: a textual candidate that does not parse as an
    /// integer is simply not in range.
    pub fn is_in_range<'a>(&self, candidate: impl Into<CodeCandidate<'a>>) -> bool {
        match candidate.into() {
            CodeCandidate::Number(n) => self.contains(n),
            CodeCandidate::Text(s) => s
                .trim()
                .parse::<i64>()
                .map(|n| self.contains(n))
                .unwrap_or(false),
        }
    }

    /// True when the two ranges share at least one code
    pub fn overlaps(&self, other: &ErrorCodeRange) -> bool {
        self.min_inclusive <= other.max_inclusive && other.min_inclusive <= self.max_inclusive
    }

    /// True when `other` lies entirely inside this range
    pub fn contains_range(&self, other: &ErrorCodeRange) -> bool {
        self.min_inclusive <= other.min_inclusive && other.max_inclusive <= self.max_inclusive
    }

    #[inline]
    fn contains(&self, n: i64) -> bool {
        self.min_inclusive <= n && n <= self.max_inclusive
    }
}

impl fmt::Display for ErrorCodeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}..={}]",
            self.name, self.min_inclusive, self.max_inclusive
        )
    }
}

/// Untyped input to [`ErrorCodeRange::is_in_range`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCandidate<'a> {
    Number(i64),
    Text(&'a str),
}

impl From<i64> for CodeCandidate<'_> {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for CodeCandidate<'_> {
    fn from(n: i32) -> Self {
        Self::Number(i64::from(n))
    }
}

impl From<u16> for CodeCandidate<'_> {
    fn from(n: u16) -> Self {
        Self::Number(i64::from(n))
    }
}

impl<'a> From<&'a str> for CodeCandidate<'a> {
    fn from(s: &'a str) -> Self {
        Self::Text(s)
    }
}

impl<'a> From<&'a String> for CodeCandidate<'a> {
    fn from(s: &'a String) -> Self {
        Self::Text(s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_of_accepts_min_le_max() {
        assert!(ErrorCodeRange::of(0, 0, "single").is_ok());
        assert!(ErrorCodeRange::of(1000, 1099, "project").is_ok());
        assert!(ErrorCodeRange::of(-10, 10, "signed").is_ok());
    }

    #[test]
    fn test_of_rejects_min_gt_max() {
        let err = ErrorCodeRange::of(10, 9, "broken").unwrap_err();
        assert_eq!(err.min, 10);
        assert_eq!(err.max, 9);
        assert_eq!(err.name, "broken");
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_is_in_range_numeric() {
        let range = ErrorCodeRange::of(1000, 1099, "project").unwrap();
        for n in [999_i64, 1000, 1050, 1099, 1100] {
            assert_eq!(range.is_in_range(n), (1000..=1099).contains(&n), "n = {n}");
        }
        assert!(range.is_in_range(1001_i32));
        assert!(!range.is_in_range(99_u16));
    }

    #[test]
    fn test_is_in_range_text() {
        let range = ErrorCodeRange::of(1000, 1099, "project").unwrap();
        assert!(range.is_in_range("1001"));
        assert!(range.is_in_range(" 1099 "));
        assert!(!range.is_in_range("1100"));
        assert!(!range.is_in_range("abc"));
        assert!(!range.is_in_range(""));
        assert!(!range.is_in_range("10.5"));
        assert!(!range.is_in_range("99999999999999999999999"));
        assert!(range.is_in_range(&String::from("1042")));
    }

    #[test]
    fn test_overlaps() {
        let project = ErrorCodeRange::of(1000, 1099, "project").unwrap();
        assert!(!project.overlaps(&CORE_ERROR_CODE_RANGE));

        let touching = ErrorCodeRange::of(99, 200, "touching").unwrap();
        assert!(touching.overlaps(&CORE_ERROR_CODE_RANGE));
        assert!(CORE_ERROR_CODE_RANGE.overlaps(&touching));

        let inner = ErrorCodeRange::of(1010, 1020, "inner").unwrap();
        assert!(project.overlaps(&inner));
        assert!(project.contains_range(&inner));
        assert!(!inner.contains_range(&project));
    }

    #[test]
    fn test_display() {
        assert_eq!(CORE_ERROR_CODE_RANGE.to_string(), "CORE[0..=99]");
    }
}
