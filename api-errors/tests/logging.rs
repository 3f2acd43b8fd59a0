use api_errors::{
    ApiErrorRegistry, ConstraintBindings, DownstreamFailure, ErrorCodeRange, ErrorResolver,
    FrameworkFailure, ResolverConfig,
};
use std::io;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn resolver(config: ResolverConfig) -> ErrorResolver {
    let registry = Arc::new(
        ApiErrorRegistry::core_only(ErrorCodeRange::of(1000, 1099, "P").unwrap()).unwrap(),
    );
    ErrorResolver::with_defaults(registry, ConstraintBindings::new(), config).unwrap()
}

fn capture(run: impl FnOnce()) -> String {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    tracing::subscriber::with_default(subscriber, run);
    captured.text()
}

#[test]
fn test_server_errors_log_at_error_with_details() {
    let resolver = resolver(ResolverConfig::default());
    let mut error_id = None;
    let logs = capture(|| {
        let resolved = resolver.resolve(
            &DownstreamFailure::status("billing", 502)
                .with_body("upstream exploded")
                .into(),
        );
        error_id = Some(resolved.error_id);
    });

    assert!(logs.contains("ERROR"), "{logs}");
    assert!(logs.contains(&error_id.unwrap().to_string()));
    assert!(logs.contains("OUTSIDE_DEPENDENCY_RETURNED_AN_UNRECOVERABLE_ERROR:92"));
    assert!(logs.contains("dependency=billing"));
    assert!(logs.contains("upstream exploded"));
}

#[test]
fn test_client_errors_log_at_warn() {
    let resolver = resolver(ResolverConfig::default());
    let logs = capture(|| {
        resolver.resolve(&FrameworkFailure::NotFound.into());
    });
    assert!(logs.contains("WARN"), "{logs}");
    assert!(logs.contains("NOT_FOUND:22"));
}

#[test]
fn test_client_errors_drop_to_debug_when_disabled() {
    let resolver = resolver(ResolverConfig {
        log_client_errors: false,
        ..ResolverConfig::default()
    });
    let logs = capture(|| {
        resolver.resolve(&FrameworkFailure::NotFound.into());
    });
    assert!(logs.contains("DEBUG"), "{logs}");
    assert!(!logs.contains("WARN"));
}
