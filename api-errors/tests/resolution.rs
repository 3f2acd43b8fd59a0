use api_errors::{
    ApiError, ApiErrorRegistry, Classification, ClassifierChain, ConstraintBindings,
    ConstraintViolation, CoreApiError, ErrorCatalog, ErrorClassifier, ErrorCodeRange,
    ErrorResolver, Failure, RegistryConfigError, ResolverConfig, UnknownFailure,
    ValidationFailure,
};
use http::StatusCode;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn validation_failed() -> ApiError {
    ApiError::new(
        "VALIDATION_FAILED",
        "1001",
        "Validation failed",
        StatusCode::UNPROCESSABLE_ENTITY,
    )
}

fn project_registry(errors: Vec<ApiError>) -> Arc<ApiErrorRegistry> {
    let range = ErrorCodeRange::of(1000, 1099, "SIGNUP").unwrap();
    Arc::new(ApiErrorRegistry::new(errors, range).unwrap())
}

/// Counts calls; claims the failure only when `matches` is set
struct Counting {
    name: &'static str,
    matches: Option<ApiError>,
    calls: AtomicUsize,
}

impl Counting {
    fn new(name: &'static str, matches: Option<ApiError>) -> Arc<Self> {
        Arc::new(Self {
            name,
            matches,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ErrorClassifier for Counting {
    fn name(&self) -> &str {
        self.name
    }

    fn classify(&self, _failure: &Failure) -> Option<Classification> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.matches
            .clone()
            .map(|err| Classification::single(err).with_log_detail("by", self.name))
    }
}

#[test]
fn test_first_match_wins_and_later_classifiers_are_skipped() {
    let conflict = ApiError::new("EMAIL_TAKEN", "1002", "Email taken", StatusCode::CONFLICT);
    let doubles = [
        Counting::new("one", None),
        Counting::new("two", None),
        Counting::new("three", Some(conflict.clone())),
        Counting::new("four", Some(CoreApiError::NotFound.to_api_error())),
        Counting::new("five", Some(CoreApiError::Forbidden.to_api_error())),
    ];
    let chain = doubles
        .iter()
        .fold(ClassifierChain::new(), |chain, d| chain.push_arc(d.clone()));
    let resolver = ErrorResolver::new(
        project_registry(vec![conflict.clone()]),
        chain,
        ResolverConfig::default(),
    );

    let resolved = resolver.resolve(&UnknownFailure::new("E", "e").into());

    assert_eq!(resolved.errors, BTreeSet::from([conflict]));
    assert_eq!(resolved.http_status, StatusCode::CONFLICT);
    assert_eq!(resolved.classifier.as_deref(), Some("three"));
    assert_eq!(
        resolved.extra_details_for_logging,
        vec![("by".to_string(), "three".to_string())]
    );
    let calls: Vec<usize> = doubles.iter().map(|d| d.calls()).collect();
    assert_eq!(calls, [1, 1, 1, 0, 0]);
}

#[test]
fn test_three_violations_give_three_occurrences_and_max_status() {
    let too_young = ApiError::new("TOO_YOUNG", "1010", "Must be at least {min}", StatusCode::BAD_REQUEST);
    let taken = ApiError::new("EMAIL_TAKEN", "1011", "Email taken", StatusCode::CONFLICT);
    let registry = project_registry(vec![validation_failed(), too_young.clone(), taken.clone()]);
    let bindings = ConstraintBindings::from_names(
        &registry,
        [
            ("Min", "TOO_YOUNG"),
            ("Unique", "EMAIL_TAKEN"),
            ("NotBlank", "VALIDATION_FAILED"),
        ],
    )
    .unwrap();
    let resolver =
        ErrorResolver::with_defaults(registry, bindings, ResolverConfig::default()).unwrap();

    let failure = Failure::from(ValidationFailure::client_data(vec![
        ConstraintViolation::new("age", "Min")
            .with_rejected_value(12)
            .with_param("min", 18),
        ConstraintViolation::new("email", "Unique").with_rejected_value("a@b.c"),
        ConstraintViolation::new("name", "NotBlank").with_rejected_value(""),
    ]));
    let resolved = resolver.resolve(&failure);

    assert_eq!(resolved.errors.len(), 3);
    assert_eq!(resolved.http_status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: BTreeSet<&str> = resolved
        .errors
        .iter()
        .filter_map(|e| e.metadata()["field"].as_str())
        .collect();
    assert_eq!(fields, BTreeSet::from(["age", "email", "name"]));
    let young = resolved
        .errors
        .iter()
        .find(|e| e.same_kind(&too_young))
        .unwrap();
    assert_eq!(young.message(), "Must be at least 18");
}

#[test]
fn test_unmatched_failure_resolves_to_unhandled_error() {
    let registry = project_registry(Vec::new());
    let chain = ClassifierChain::new()
        .push_arc(Counting::new("a", None))
        .push_arc(Counting::new("b", None));
    let resolver = ErrorResolver::new(registry.clone(), chain, ResolverConfig::default());

    let resolved = resolver.resolve(&UnknownFailure::new("E", "e").into());

    assert_eq!(resolved.errors, BTreeSet::from([registry.unhandled_error()]));
    assert_eq!(resolved.http_status, registry.unhandled_error().http_status());
    assert_eq!(resolved.http_status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resolved.classifier, None);
}

#[test]
fn test_signup_scenario() {
    let registry = project_registry(vec![validation_failed()]);
    assert_eq!(registry.unhandled_error().error_code(), "99");
    assert!(registry.project_range().is_in_range(1001));

    let bindings = ConstraintBindings::new()
        .bind("Range", validation_failed())
        .bind("NotBlank", validation_failed());
    let resolver =
        ErrorResolver::with_defaults(registry, bindings, ResolverConfig::default()).unwrap();

    let failure = Failure::from(
        ValidationFailure::client_data(vec![
            ConstraintViolation::new("age", "Range").with_rejected_value(-1),
            ConstraintViolation::new("name", "NotBlank").with_rejected_value(""),
        ])
        .with_object_type("SignupRequest"),
    );
    let resolved = resolver.resolve(&failure);

    assert_eq!(resolved.http_status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resolved.errors.len(), 2);
    assert!(resolved.errors.iter().all(|e| e.error_code() == "1001"));
    let fields: Vec<_> = resolved
        .errors
        .iter()
        .map(|e| e.metadata()["field"].clone())
        .collect();
    assert_eq!(fields, [json!("age"), json!("name")]);
}

#[test]
fn test_catalog_driven_resolver() {
    let catalog = ErrorCatalog::from_json_str(
        r#"{
            "range": { "name": "SIGNUP", "min": 1000, "max": 1099 },
            "errors": [
                { "name": "VALIDATION_FAILED", "code": 1001, "message": "Validation failed", "status": 422 }
            ],
            "constraint_bindings": { "NotBlank": "VALIDATION_FAILED" }
        }"#,
    )
    .unwrap();
    let (registry, bindings) = catalog.into_registry().unwrap();
    let resolver =
        ErrorResolver::with_defaults(Arc::new(registry), bindings, ResolverConfig::default())
            .unwrap();

    let resolved = resolver.resolve(
        &ValidationFailure::client_data(vec![ConstraintViolation::new("name", "NotBlank")]).into(),
    );
    assert_eq!(resolved.http_status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        resolved.errors.first().map(ApiError::error_code),
        Some("1001")
    );
}

#[test]
fn test_value_bound_template_must_be_registered() {
    let registry = project_registry(Vec::new());
    let rogue = ApiError::new("ROGUE", "22", "Rogue", StatusCode::IM_A_TEAPOT);
    let bindings = ConstraintBindings::new().bind("X", rogue);

    let err = ErrorResolver::with_defaults(registry, bindings, ResolverConfig::default())
        .unwrap_err();
    assert_eq!(
        err,
        RegistryConfigError::UnknownBinding {
            constraint: "X".into(),
            name: "ROGUE".into(),
        }
    );
}
