//! Last-resort classifier for failures nothing else recognized

use super::{Classification, ErrorClassifier};
use crate::failure::Failure;
use crate::registry::ApiErrorRegistry;
use std::sync::Arc;

/// Claims [`Failure::Unknown`] with the registry's unhandled error,
/// attaching what is known about the failure for the log
#[derive(Debug, Clone)]
pub struct GenericClassifier {
    registry: Arc<ApiErrorRegistry>,
}

impl GenericClassifier {
    pub fn new(registry: Arc<ApiErrorRegistry>) -> Self {
        Self { registry }
    }
}

impl ErrorClassifier for GenericClassifier {
    fn name(&self) -> &str {
        "generic"
    }

    fn classify(&self, failure: &Failure) -> Option<Classification> {
        let Failure::Unknown(unknown) = failure else {
            return None;
        };

        let mut classification = Classification::single(self.registry.unhandled_error())
            .with_log_detail("failure_type", unknown.type_name.clone())
            .with_log_detail("failure_message", unknown.message.clone());
        if !unknown.causes.is_empty() {
            classification =
                classification.with_log_detail("caused_by", unknown.causes.join(" <- "));
        }
        Some(classification)
    }
}
