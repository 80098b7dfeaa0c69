use async_trait::async_trait;

use crate::runtime::contract::EdgePurgeRequest;

#[async_trait]
pub trait EdgePurger: Send + Sync {
    async fn purge_files(&self, request: EdgePurgeRequest) -> Result<String, String>;
}

/// Issues the purge DELETE against the edge-cache API over a client scoped
/// to the one call.
pub struct CloudflarePurger;

#[async_trait]
impl EdgePurger for CloudflarePurger {
    async fn purge_files(&self, request: EdgePurgeRequest) -> Result<String, String> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|error| format!("failed to build purge http client: {error}"))?;

        let response = client
            .delete(&request.endpoint)
            .header("X-Auth-Email", request.email.as_str())
            .header("X-Auth-Key", request.api_key.as_str())
            .json(&request.files_payload())
            .send()
            .await
            .map_err(|error| format!("failed to send purge request: {error}"))?;

        // Non-success statuses are not failures here: the body of any
        // completed exchange is returned verbatim for the caller to surface.
        response
            .text()
            .await
            .map_err(|error| format!("failed to read purge response body: {error}"))
    }
}
