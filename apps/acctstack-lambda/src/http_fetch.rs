//! HTTP GET for the SNS notification handler.

use async_trait::async_trait;

use acctstack_deploy_core::{ServiceError, UrlFetcher};

/// [`UrlFetcher`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher using `http`.
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

fn fetch_error(err: &reqwest::Error) -> ServiceError {
    match err.status() {
        Some(status) => ServiceError::new(status.as_str(), err.to_string()),
        None => ServiceError::message(err.to_string()),
    }
}

#[async_trait]
impl UrlFetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ServiceError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| fetch_error(&e))?;
        let body = response.bytes().await.map_err(|e| fetch_error(&e))?;
        Ok(body.to_vec())
    }
}
