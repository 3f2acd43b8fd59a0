use api_errors::{
    ApiErrorRegistry, ConnectionProblem, ConstraintBindings, ConstraintViolation, CoreApiError,
    DownstreamFailure, ErrorCodeRange, ErrorResolver, Failure, FrameworkFailure, ResolverConfig,
    UnknownFailure, ValidationFailure,
};
use http::StatusCode;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

fn resolver() -> Arc<ErrorResolver> {
    let registry = Arc::new(
        ApiErrorRegistry::core_only(ErrorCodeRange::of(1000, 1099, "P").unwrap()).unwrap(),
    );
    Arc::new(
        ErrorResolver::with_defaults(registry, ConstraintBindings::new(), ResolverConfig::default())
            .unwrap(),
    )
}

fn failure_for(i: usize) -> (Failure, StatusCode) {
    match i % 4 {
        0 => (
            ValidationFailure::client_data(vec![ConstraintViolation::new(
                format!("field{i}"),
                "Pattern",
            )])
            .into(),
            StatusCode::BAD_REQUEST,
        ),
        1 => (FrameworkFailure::NotFound.into(), StatusCode::NOT_FOUND),
        2 => (
            DownstreamFailure::connection("ledger", ConnectionProblem::Timeout).into(),
            StatusCode::SERVICE_UNAVAILABLE,
        ),
        _ => (
            UnknownFailure::new("Io", "broken pipe").into(),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    }
}

#[test]
fn test_concurrent_resolution_across_threads() {
    let resolver = resolver();

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let resolver = resolver.clone();
            thread::spawn(move || {
                (0..50)
                    .map(|n| {
                        let i = t * 50 + n;
                        let (failure, expected) = failure_for(i);
                        let resolved = resolver.resolve(&failure);
                        assert_eq!(resolved.http_status, expected, "failure #{i}");
                        if i % 4 == 0 {
                            let err = resolved.errors.first().unwrap();
                            assert!(err.same_kind(&CoreApiError::InvalidValue.to_api_error()));
                            assert_eq!(err.metadata()["field"], format!("field{i}").as_str());
                        }
                        resolved.error_id
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        ids.extend(handle.join().unwrap());
    }
    assert_eq!(ids.len(), 400);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_resolution_from_async_tasks() {
    let resolver = resolver();

    let tasks: Vec<_> = (0..64)
        .map(|i| {
            let resolver = resolver.clone();
            tokio::spawn(async move {
                let (failure, expected) = failure_for(i);
                let resolved = resolver.resolve(&failure);
                (resolved.http_status, expected)
            })
        })
        .collect();

    for task in tasks {
        let (status, expected) = task.await.unwrap();
        assert_eq!(status, expected);
    }
}
