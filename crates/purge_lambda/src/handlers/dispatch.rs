use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};

use crate::adapters::cdn::CdnInvalidator;
use crate::adapters::edge::EdgePurger;
use crate::runtime::config::DispatcherConfig;
use crate::runtime::contract::{
    first_object_record, CdnInvalidationRequest, EdgePurgeRequest, InvalidationEvent,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchError {
    message: String,
}

impl DispatchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for DispatchError {}

/// Fans one object-created notification out to both caching backends and
/// returns the purge response body, or `None` when the notification carries
/// no object record.
pub async fn handle_object_created(
    event: &Value,
    config: &DispatcherConfig,
    invalidator: &Arc<dyn CdnInvalidator>,
    purger: &dyn EdgePurger,
) -> Result<Option<String>, DispatchError> {
    let Some(record) = first_object_record(event) else {
        log_dispatch_info("event_skipped", json!({ "reason": "no object record" }));
        return Ok(None);
    };

    let started_at = Instant::now();
    log_dispatch_info(
        "fanout_started",
        json!({
            "bucket": record.bucket.clone(),
            "object_key": record.object_key.clone(),
            "cdn_invalidation_enabled": config.cdn_distribution().is_some(),
        }),
    );

    match fan_out(&record, config, invalidator, purger).await {
        Ok(body) => {
            log_dispatch_info(
                "fanout_completed",
                json!({
                    "bucket": record.bucket.clone(),
                    "object_key": record.object_key.clone(),
                    "duration_ms": started_at.elapsed().as_millis(),
                    "purge_body_bytes": body.len(),
                }),
            );
            Ok(Some(body))
        }
        Err(message) => {
            log_dispatch_error(
                "fanout_failed",
                json!({
                    "bucket": record.bucket.clone(),
                    "object_key": record.object_key.clone(),
                    "duration_ms": started_at.elapsed().as_millis(),
                    "error": message.clone(),
                }),
            );
            Err(DispatchError::new(format!(
                "failed to invalidate object '{}' from bucket '{}': {message}",
                record.object_key, record.bucket
            )))
        }
    }
}

async fn fan_out(
    record: &InvalidationEvent,
    config: &DispatcherConfig,
    invalidator: &Arc<dyn CdnInvalidator>,
    purger: &dyn EdgePurger,
) -> Result<String, String> {
    // The invalidation is started before the purge call and its completion
    // observed only after the purge response has been read.
    let invalidation = config.cdn_distribution().map(|distribution_id| {
        let request = CdnInvalidationRequest::for_object(distribution_id, &record.object_key);
        let invalidator = Arc::clone(invalidator);
        tokio::spawn(async move { invalidator.create_invalidation(request).await })
    });

    let body = purger
        .purge_files(EdgePurgeRequest::for_object(config, &record.object_key))
        .await?;

    if let Some(task) = invalidation {
        task.await
            .map_err(|error| format!("invalidation task aborted: {error}"))??;
    }

    Ok(body)
}

fn log_dispatch_info(event: &str, details: Value) {
    eprintln!(
        "{}",
        json!({
            "component": "dispatch_handler",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}

fn log_dispatch_error(event: &str, details: Value) {
    eprintln!(
        "{}",
        json!({
            "component": "dispatch_handler",
            "level": "error",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    struct RecordingInvalidator {
        requests: Mutex<Vec<CdnInvalidationRequest>>,
        fail_with: Option<String>,
    }

    impl RecordingInvalidator {
        fn new() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                fail_with: None,
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                fail_with: Some(message.to_string()),
            }
        }

        fn requests(&self) -> Vec<CdnInvalidationRequest> {
            self.requests.lock().expect("poisoned mutex").clone()
        }
    }

    #[async_trait]
    impl CdnInvalidator for RecordingInvalidator {
        async fn create_invalidation(&self, request: CdnInvalidationRequest) -> Result<(), String> {
            self.requests.lock().expect("poisoned mutex").push(request);
            match &self.fail_with {
                Some(message) => Err(message.clone()),
                None => Ok(()),
            }
        }
    }

    struct RecordingPurger {
        requests: Mutex<Vec<EdgePurgeRequest>>,
        outcome: Result<String, String>,
    }

    impl RecordingPurger {
        fn returning(body: &str) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                outcome: Ok(body.to_string()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                outcome: Err(message.to_string()),
            }
        }

        fn requests(&self) -> Vec<EdgePurgeRequest> {
            self.requests.lock().expect("poisoned mutex").clone()
        }
    }

    #[async_trait]
    impl EdgePurger for RecordingPurger {
        async fn purge_files(&self, request: EdgePurgeRequest) -> Result<String, String> {
            self.requests.lock().expect("poisoned mutex").push(request);
            self.outcome.clone()
        }
    }

    fn object_created_event(bucket: &str, key: &str) -> Value {
        json!({
            "Records": [
                {
                    "eventSource": "aws:s3",
                    "eventName": "ObjectCreated:Put",
                    "s3": {
                        "bucket": {"name": bucket},
                        "object": {"key": key}
                    }
                }
            ]
        })
    }

    fn sample_config(cdn_distribution_id: Option<&str>) -> DispatcherConfig {
        DispatcherConfig {
            cdn_distribution_id: cdn_distribution_id.map(str::to_string),
            purge_email: "ops@example.com".to_string(),
            purge_api_key: "cf-key".to_string(),
            purge_zone_id: "zone-1".to_string(),
            public_domain: "https://cdn.example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn event_without_records_is_a_noop() {
        let recorder = Arc::new(RecordingInvalidator::new());
        let invalidator: Arc<dyn CdnInvalidator> = recorder.clone();
        let purger = RecordingPurger::returning("{}");

        let outcome = handle_object_created(
            &json!({}),
            &sample_config(Some("D1")),
            &invalidator,
            &purger,
        )
        .await
        .expect("empty event should not fail");

        assert_eq!(outcome, None);
        assert!(recorder.requests().is_empty());
        assert!(purger.requests().is_empty());
    }

    #[tokio::test]
    async fn disabled_distribution_purges_without_invalidation() {
        let recorder = Arc::new(RecordingInvalidator::new());
        let invalidator: Arc<dyn CdnInvalidator> = recorder.clone();
        let purger = RecordingPurger::returning("{\"success\":true}");

        let outcome = handle_object_created(
            &object_created_event("b", "images/a.png"),
            &sample_config(None),
            &invalidator,
            &purger,
        )
        .await
        .expect("purge-only dispatch should succeed");

        assert_eq!(outcome, Some("{\"success\":true}".to_string()));
        assert!(recorder.requests().is_empty());

        let purges = purger.requests();
        assert_eq!(purges.len(), 1);
        assert_eq!(
            purges[0].endpoint,
            "https://api.cloudflare.com/client/v4/zones/zone-1/purge_cache"
        );
        assert_eq!(
            serde_json::to_string(&purges[0].files_payload()).expect("payload serializes"),
            r#"{"files":["https://cdn.example.com/images/a.png"]}"#
        );
    }

    #[tokio::test]
    async fn blank_distribution_behaves_as_disabled() {
        let recorder = Arc::new(RecordingInvalidator::new());
        let invalidator: Arc<dyn CdnInvalidator> = recorder.clone();
        let purger = RecordingPurger::returning("{}");

        handle_object_created(
            &object_created_event("b", "images/a.png"),
            &sample_config(Some("   ")),
            &invalidator,
            &purger,
        )
        .await
        .expect("blank distribution should dispatch purge only");

        assert!(recorder.requests().is_empty());
        assert_eq!(purger.requests().len(), 1);
    }

    #[tokio::test]
    async fn enabled_distribution_issues_both_calls() {
        let recorder = Arc::new(RecordingInvalidator::new());
        let invalidator: Arc<dyn CdnInvalidator> = recorder.clone();
        let purger = RecordingPurger::returning("{\"success\":true}");

        let outcome = handle_object_created(
            &object_created_event("b", "images/a.png"),
            &sample_config(Some("D1")),
            &invalidator,
            &purger,
        )
        .await
        .expect("dual dispatch should succeed");

        assert_eq!(outcome, Some("{\"success\":true}".to_string()));

        let invalidations = recorder.requests();
        assert_eq!(invalidations.len(), 1);
        assert_eq!(invalidations[0].distribution_id, "D1");
        assert_eq!(invalidations[0].paths, vec!["/images/a.png".to_string()]);

        let purges = purger.requests();
        assert_eq!(purges.len(), 1);
        assert_eq!(
            purges[0].files,
            vec!["https://cdn.example.com/images/a.png".to_string()]
        );
    }

    #[tokio::test]
    async fn purge_failure_fails_the_invocation() {
        let recorder = Arc::new(RecordingInvalidator::new());
        let invalidator: Arc<dyn CdnInvalidator> = recorder.clone();
        let purger = RecordingPurger::failing("purge exploded");

        let error = handle_object_created(
            &object_created_event("b", "images/a.png"),
            &sample_config(Some("D1")),
            &invalidator,
            &purger,
        )
        .await
        .expect_err("purge failure should fail the invocation");

        assert!(error.message().contains("purge exploded"));
        assert!(error.message().contains("images/a.png"));
        assert!(error.message().contains("'b'"));
    }

    #[tokio::test]
    async fn invalidation_failure_fails_the_invocation_after_purge() {
        let recorder = Arc::new(RecordingInvalidator::failing("invalidation exploded"));
        let invalidator: Arc<dyn CdnInvalidator> = recorder.clone();
        let purger = RecordingPurger::returning("{}");

        let error = handle_object_created(
            &object_created_event("b", "images/a.png"),
            &sample_config(Some("D1")),
            &invalidator,
            &purger,
        )
        .await
        .expect_err("invalidation failure should fail the invocation");

        assert!(error.message().contains("invalidation exploded"));
        assert_eq!(purger.requests().len(), 1);
    }

    #[tokio::test]
    async fn nested_object_keys_pass_through_unescaped() {
        let recorder = Arc::new(RecordingInvalidator::new());
        let invalidator: Arc<dyn CdnInvalidator> = recorder.clone();
        let purger = RecordingPurger::returning("{}");

        handle_object_created(
            &object_created_event("b", "img/2024/a b.png"),
            &sample_config(Some("D1")),
            &invalidator,
            &purger,
        )
        .await
        .expect("nested key dispatch should succeed");

        assert_eq!(
            recorder.requests()[0].paths,
            vec!["/img/2024/a b.png".to_string()]
        );
        assert_eq!(
            purger.requests()[0].files,
            vec!["https://cdn.example.com/img/2024/a b.png".to_string()]
        );
    }

    #[tokio::test]
    async fn successive_fanouts_use_distinct_caller_references() {
        let recorder = Arc::new(RecordingInvalidator::new());
        let invalidator: Arc<dyn CdnInvalidator> = recorder.clone();
        let purger = RecordingPurger::returning("{}");
        let config = sample_config(Some("D1"));
        let event = object_created_event("b", "images/a.png");

        handle_object_created(&event, &config, &invalidator, &purger)
            .await
            .expect("first dispatch should succeed");
        handle_object_created(&event, &config, &invalidator, &purger)
            .await
            .expect("second dispatch should succeed");

        let invalidations = recorder.requests();
        assert_eq!(invalidations.len(), 2);
        assert_ne!(
            invalidations[0].caller_reference,
            invalidations[1].caller_reference
        );
    }
}
