//! Delivery of custom resource responses to CloudFormation.

use anyhow::{Context, Result};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use tracing::info;

use acctstack_cloudtrail_model::CustomResourceResponse;

/// Uploads responses to the presigned `ResponseURL` of a request.
#[derive(Debug, Clone)]
pub struct CfnResponder {
    http: reqwest::Client,
}

impl CfnResponder {
    /// Create a responder using `http`.
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// PUT `response` to `response_url`.
    ///
    /// The presigned URL is signed without a content type, so the request
    /// carries an empty one.
    pub async fn send(&self, response_url: &str, response: &CustomResourceResponse) -> Result<()> {
        let body = serde_json::to_vec(response)?;
        let status = self
            .http
            .put(response_url)
            .header(CONTENT_TYPE, "")
            .header(CONTENT_LENGTH, body.len())
            .body(body)
            .send()
            .await
            .context("failed to send custom resource response")?
            .error_for_status()
            .context("CloudFormation rejected the custom resource response")?
            .status();
        info!(status = %status, response_status = ?response.status, "custom resource response sent");
        Ok(())
    }
}
