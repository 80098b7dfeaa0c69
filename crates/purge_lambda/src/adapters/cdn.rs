use async_trait::async_trait;
use aws_sdk_cloudfront::types::{InvalidationBatch, Paths};

use crate::runtime::contract::CdnInvalidationRequest;

#[async_trait]
pub trait CdnInvalidator: Send + Sync {
    async fn create_invalidation(&self, request: CdnInvalidationRequest) -> Result<(), String>;
}

pub struct CloudFrontInvalidator {
    client: aws_sdk_cloudfront::Client,
}

impl CloudFrontInvalidator {
    pub fn new(client: aws_sdk_cloudfront::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CdnInvalidator for CloudFrontInvalidator {
    async fn create_invalidation(&self, request: CdnInvalidationRequest) -> Result<(), String> {
        let quantity = request.paths.len() as i32;
        let paths = Paths::builder()
            .quantity(quantity)
            .set_items(Some(request.paths))
            .build()
            .map_err(|error| format!("failed to build invalidation paths: {error}"))?;
        let batch = InvalidationBatch::builder()
            .paths(paths)
            .caller_reference(request.caller_reference)
            .build()
            .map_err(|error| format!("failed to build invalidation batch: {error}"))?;

        // The response is discarded; completion without error is the only
        // signal observed.
        self.client
            .create_invalidation()
            .distribution_id(request.distribution_id)
            .invalidation_batch(batch)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| format!("failed to create cdn invalidation: {error}"))
    }
}

/// Stands in when no distribution id is configured; the dispatch routine
/// never reaches it because the configuration branch gates the call.
pub struct NoopInvalidator;

#[async_trait]
impl CdnInvalidator for NoopInvalidator {
    async fn create_invalidation(&self, _request: CdnInvalidationRequest) -> Result<(), String> {
        Ok(())
    }
}
