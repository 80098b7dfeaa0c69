use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::DispatcherConfig;
use crate::targets::{invalidation_path, purge_endpoint, purge_file_url};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvalidationEvent {
    pub bucket: String,
    pub object_key: String,
}

/// Extracts the one consulted record from a raw storage notification.
///
/// Only the first record matters, and a payload without a usable record
/// (no `Records`, an empty array, or missing `s3` fields) is a no-op, not
/// an error. The object key is taken verbatim, never decoded.
pub fn first_object_record(event: &Value) -> Option<InvalidationEvent> {
    let record = event.get("Records")?.as_array()?.first()?;
    let entity = record.get("s3")?;
    let bucket = entity.get("bucket")?.get("name")?.as_str()?;
    let object_key = entity.get("object")?.get("key")?.as_str()?;

    Some(InvalidationEvent {
        bucket: bucket.to_string(),
        object_key: object_key.to_string(),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CdnInvalidationRequest {
    pub distribution_id: String,
    pub caller_reference: String,
    pub paths: Vec<String>,
}

impl CdnInvalidationRequest {
    /// Builds a single-path invalidation for one object, with a caller
    /// reference unique to this call.
    pub fn for_object(distribution_id: &str, object_key: &str) -> Self {
        Self {
            distribution_id: distribution_id.to_string(),
            caller_reference: next_caller_reference(),
            paths: vec![invalidation_path(object_key)],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EdgePurgeRequest {
    pub endpoint: String,
    pub email: String,
    pub api_key: String,
    pub files: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PurgeFilesPayload<'a> {
    pub files: &'a [String],
}

impl EdgePurgeRequest {
    /// Builds a single-file purge for one object under the public domain.
    pub fn for_object(config: &DispatcherConfig, object_key: &str) -> Self {
        Self {
            endpoint: purge_endpoint(&config.purge_zone_id),
            email: config.purge_email.clone(),
            api_key: config.purge_api_key.clone(),
            files: vec![purge_file_url(&config.public_domain, object_key)],
        }
    }

    /// The `{"files":[...]}` body shape the purge API expects.
    pub fn files_payload(&self) -> PurgeFilesPayload<'_> {
        PurgeFilesPayload { files: &self.files }
    }
}

static CALLER_REFERENCE_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Returns a time-derived caller reference unique for every call in this
/// process. The sequence suffix keeps successive references distinct even
/// when the clock is too coarse to separate two calls.
pub fn next_caller_reference() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let sequence = CALLER_REFERENCE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{nanos}-{sequence}")
}
