//! Constraint violations
//!
//! Client-data validation failures become one `ApiError` occurrence per
//! violation, each tagged with the offending field and rejected value. All
//! violations are reported together so a client can fix every field in one
//! round trip.
//!
//! Server-side validation failures (objects the service built itself) are a
//! server bug: they collapse into one `SERVERSIDE_VALIDATION_ERROR` and the
//! violations only reach the log.

use super::{Classification, ErrorClassifier};
use crate::error::{ApiError, CoreApiError, RegistryConfigError};
use crate::failure::{ConstraintViolation, Failure, ValidationFailure, ValidationOrigin};
use crate::registry::ApiErrorRegistry;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Metadata key carrying the violating field path
pub const FIELD_METADATA_KEY: &str = "field";
/// Metadata key carrying the rejected value
pub const REJECTED_VALUE_METADATA_KEY: &str = "rejected_value";

/// Lookup table from constraint identifier to the error it maps to
///
/// Produced outside the engine (hand-written, loaded from the error catalog,
/// or generated from declarative field annotations).
#[derive(Debug, Clone, Default)]
pub struct ConstraintBindings {
    bindings: HashMap<String, ApiError>,
}

impl ConstraintBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a constraint to an error template
    pub fn bind(mut self, constraint: impl Into<String>, template: ApiError) -> Self {
        self.bindings
            .insert(constraint.into(), template.without_metadata());
        self
    }

    /// Bind constraints to errors by registry name.
    ///
    /// Fails on the first name the registry does not know.
    pub fn from_names<I, K, V>(
        registry: &ApiErrorRegistry,
        names: I,
    ) -> Result<Self, RegistryConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut bindings = HashMap::new();
        for (constraint, name) in names {
            let constraint = constraint.into();
            let name = name.as_ref();
            let Some(template) = registry.error_by_name(name) else {
                return Err(RegistryConfigError::UnknownBinding {
                    constraint,
                    name: name.to_string(),
                });
            };
            bindings.insert(constraint, template.clone());
        }
        Ok(Self { bindings })
    }

    /// Check every bound template against `registry`.
    ///
    /// A template must be the same kind as a registered error; anything else
    /// would reach clients with an unvalidated code.
    pub fn check_against(&self, registry: &ApiErrorRegistry) -> Result<(), RegistryConfigError> {
        let mut constraints: Vec<&String> = self.bindings.keys().collect();
        constraints.sort();
        for constraint in constraints {
            let template = &self.bindings[constraint];
            let registered = registry
                .error_by_name(template.name())
                .is_some_and(|known| known.same_kind(template));
            if !registered {
                return Err(RegistryConfigError::UnknownBinding {
                    constraint: constraint.clone(),
                    name: template.name().to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn get(&self, constraint: &str) -> Option<&ApiError> {
        self.bindings.get(constraint)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Claims [`Failure::Validation`]
#[derive(Debug, Clone, Default)]
pub struct ValidationClassifier {
    bindings: ConstraintBindings,
}

impl ValidationClassifier {
    pub fn new(bindings: ConstraintBindings) -> Self {
        Self { bindings }
    }

    /// Map one violation to its error occurrence
    pub fn occurrence(&self, violation: &ConstraintViolation) -> ApiError {
        let template = self
            .bindings
            .get(&violation.constraint)
            .cloned()
            .unwrap_or_else(|| CoreApiError::InvalidValue.to_api_error());

        let rendered = render_message(template.message(), &violation.params);
        let occurrence = if rendered == template.message() {
            template
        } else {
            template.with_message(rendered)
        };

        occurrence
            .with_metadata(FIELD_METADATA_KEY, violation.field_path.clone())
            .with_metadata(REJECTED_VALUE_METADATA_KEY, violation.rejected_value.clone())
    }

    fn client_data(&self, failure: &ValidationFailure) -> Classification {
        let classification = if failure.violations.is_empty() {
            Classification::single(CoreApiError::GenericBadRequest.to_api_error())
        } else {
            Classification::new(failure.violations.iter().map(|v| self.occurrence(v)))
        };
        classification.with_log_details(violation_details(failure))
    }

    fn serverside(&self, failure: &ValidationFailure) -> Classification {
        Classification::single(CoreApiError::ServersideValidationError.to_api_error())
            .with_log_details(violation_details(failure))
    }
}

impl ErrorClassifier for ValidationClassifier {
    fn name(&self) -> &str {
        "validation"
    }

    fn classify(&self, failure: &Failure) -> Option<Classification> {
        let Failure::Validation(validation) = failure else {
            return None;
        };
        let classification = match validation.origin {
            ValidationOrigin::ClientData => self.client_data(validation),
            ValidationOrigin::Serverside => self.serverside(validation),
        };
        Some(classification)
    }
}

fn violation_details(failure: &ValidationFailure) -> Vec<(String, String)> {
    let mut details = Vec::with_capacity(2);
    if let Some(object_type) = &failure.object_type {
        details.push(("validated_object".to_string(), object_type.clone()));
    }
    let summary = failure
        .violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    details.push(("constraint_violations".to_string(), summary));
    details
}

/// Fill `{name}` placeholders in `message` from `params`.
///
/// Single pass: substituted values are never expanded again. String values
/// are inserted without quotes; unknown placeholders are left as they are.
pub fn render_message(message: &str, params: &BTreeMap<String, Value>) -> String {
    let mut rendered = String::with_capacity(message.len());
    let mut rest = message;
    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            rest = &rest[open..];
            break;
        };
        let name = &after[..close];
        match params.get(name) {
            Some(Value::String(s)) => rendered.push_str(s),
            Some(other) => rendered.push_str(&other.to_string()),
            None => {
                // unknown: keep the brace and rescan from just after it
                rendered.push('{');
                rest = after;
                continue;
            }
        }
        rest = &after[close + 1..];
    }
    rendered.push_str(rest);
    rendered
}
