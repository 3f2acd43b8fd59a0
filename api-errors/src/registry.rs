//! Error registry
//!
//! Combines the fixed core catalogue with a project's own errors. Built and
//! validated once at startup; a registry that exists is a valid registry.
//! Share it behind an `Arc` for the rest of the process lifetime.

use crate::error::{
    ApiError, CORE_ERROR_CODE_RANGE, CoreApiError, ErrorCodeRange, RegistryConfigError,
    RegistryProblem,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Validated union of core and project-specific errors
#[derive(Debug, Clone)]
pub struct ApiErrorRegistry {
    core_errors: BTreeSet<ApiError>,
    project_errors: BTreeSet<ApiError>,
    all_errors: BTreeSet<ApiError>,
    project_range: ErrorCodeRange,
    by_name: HashMap<String, ApiError>,
    by_code: HashMap<String, ApiError>,
}

impl ApiErrorRegistry {
    /// Build and validate a registry from project errors and their range.
    ///
    /// Fails when the range overlaps the core range, a project code lies
    /// outside the range, or any code or name is declared twice across the
    /// combined set. Every problem is reported, not just the first.
    pub fn new(
        project_errors: impl IntoIterator<Item = ApiError>,
        project_range: ErrorCodeRange,
    ) -> Result<Self, RegistryConfigError> {
        let core: Vec<ApiError> = CoreApiError::ALL
            .into_iter()
            .map(CoreApiError::to_api_error)
            .collect();
        let project: Vec<ApiError> = project_errors.into_iter().collect();

        check(&core, &project, &project_range)?;

        let all_errors: BTreeSet<ApiError> = core.iter().chain(project.iter()).cloned().collect();
        let by_name = all_errors
            .iter()
            .map(|e| (e.name().to_string(), e.clone()))
            .collect();
        let by_code = all_errors
            .iter()
            .map(|e| (canonical_code(e.error_code()), e.clone()))
            .collect();

        tracing::debug!(
            core_errors = core.len(),
            project_errors = project.len(),
            range = %project_range,
            "Error registry validated"
        );

        Ok(Self {
            core_errors: core.into_iter().collect(),
            project_errors: project.into_iter().collect(),
            all_errors,
            project_range,
            by_name,
            by_code,
        })
    }

    /// Registry with no project-specific errors
    pub fn core_only(project_range: ErrorCodeRange) -> Result<Self, RegistryConfigError> {
        Self::new(Vec::new(), project_range)
    }

    /// Re-run the construction checks against this registry's contents
    pub fn validate(&self) -> Result<(), RegistryConfigError> {
        let core: Vec<ApiError> = self.core_errors.iter().cloned().collect();
        let project: Vec<ApiError> = self.project_errors.iter().cloned().collect();
        check(&core, &project, &self.project_range)
    }

    pub fn core_errors(&self) -> &BTreeSet<ApiError> {
        &self.core_errors
    }

    pub fn project_errors(&self) -> &BTreeSet<ApiError> {
        &self.project_errors
    }

    /// Core and project errors together, sorted
    pub fn all_errors(&self) -> &BTreeSet<ApiError> {
        &self.all_errors
    }

    pub fn project_range(&self) -> &ErrorCodeRange {
        &self.project_range
    }

    /// The terminal fallback used when nothing recognizes a failure
    pub fn unhandled_error(&self) -> ApiError {
        CoreApiError::UnhandledError.to_api_error()
    }

    /// A core error from this registry
    pub fn core(&self, kind: CoreApiError) -> ApiError {
        kind.to_api_error()
    }

    pub fn error_by_name(&self, name: &str) -> Option<&ApiError> {
        self.by_name.get(name)
    }

    /// Look an error up by code; numeric codes match regardless of padding
    pub fn error_by_code(&self, code: &str) -> Option<&ApiError> {
        self.by_code.get(&canonical_code(code))
    }

    /// Look an error up by name, falling back to `fallback` when unknown
    pub fn error_by_name_or(&self, name: &str, fallback: CoreApiError) -> ApiError {
        self.error_by_name(name)
            .cloned()
            .unwrap_or_else(|| fallback.to_api_error())
    }
}

/// Numeric codes compare by value (`"01001"`, `" 1001 "` and `"1001"` are
/// one code), the way range checks read them
fn canonical_code(code: &str) -> String {
    match code.trim().parse::<i64>() {
        Ok(n) => n.to_string(),
        Err(_) => code.to_string(),
    }
}

fn check(
    core: &[ApiError],
    project: &[ApiError],
    range: &ErrorCodeRange,
) -> Result<(), RegistryConfigError> {
    let mut problems = Vec::new();

    if range.overlaps(&CORE_ERROR_CODE_RANGE) {
        problems.push(RegistryProblem::RangeOverlapsCore {
            range: range.to_string(),
            reserved: CORE_ERROR_CODE_RANGE.to_string(),
        });
    }

    for err in project {
        if !range.is_in_range(err.error_code()) {
            problems.push(RegistryProblem::CodeOutOfRange {
                name: err.name().to_string(),
                code: err.error_code().to_string(),
                range: range.to_string(),
            });
        }
    }

    let mut names_by_code: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut name_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for err in core.iter().chain(project) {
        names_by_code
            .entry(canonical_code(err.error_code()))
            .or_default()
            .push(err.name().to_string());
        *name_counts.entry(err.name()).or_default() += 1;
    }

    for (code, mut names) in names_by_code {
        if names.len() > 1 {
            names.sort();
            problems.push(RegistryProblem::DuplicateCode { code, names });
        }
    }
    for (name, count) in name_counts {
        if count > 1 {
            problems.push(RegistryProblem::DuplicateName {
                name: name.to_string(),
                count,
            });
        }
    }

    if problems.is_empty() {
        return Ok(());
    }
    problems.sort();
    tracing::error!(problems = problems.len(), "Error registry failed validation");
    Err(RegistryConfigError::Invalid { problems })
}
