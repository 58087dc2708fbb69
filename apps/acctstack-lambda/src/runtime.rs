//! Lambda Runtime API client.
//!
//! Implements the custom runtime side of
//! `/2018-06-01/runtime/{invocation/next, invocation/{id}/response,
//! invocation/{id}/error, init/error}`.

use anyhow::{Context, Result};
use reqwest::header::HeaderMap;
use serde::Serialize;
use serde_json::Value;

const API_VERSION: &str = "2018-06-01";
const REQUEST_ID_HEADER: &str = "lambda-runtime-aws-request-id";
const DEADLINE_HEADER: &str = "lambda-runtime-deadline-ms";
const TRACE_ID_HEADER: &str = "lambda-runtime-trace-id";
const ERROR_TYPE_HEADER: &str = "lambda-runtime-function-error-type";

/// One event handed out by `invocation/next`.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Request ID to report the outcome under.
    pub request_id: String,
    /// Deadline in Unix epoch milliseconds.
    pub deadline_ms: Option<u64>,
    /// X-Ray trace header.
    pub trace_id: Option<String>,
    /// Event payload.
    pub payload: Value,
}

impl Invocation {
    fn from_parts(headers: &HeaderMap, body: &[u8]) -> Result<Self> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };

        let request_id = header(REQUEST_ID_HEADER)
            .context("runtime API response is missing the request ID header")?;
        let payload = serde_json::from_slice(body)
            .with_context(|| format!("invocation {request_id} payload is not JSON"))?;

        Ok(Self {
            deadline_ms: header(DEADLINE_HEADER).and_then(|v| v.parse().ok()),
            trace_id: header(TRACE_ID_HEADER),
            request_id,
            payload,
        })
    }
}

/// Error body accepted by the `error` endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    /// Error message.
    pub error_message: String,
    /// Error classification, shown as the Step Functions error name.
    pub error_type: String,
}

impl ErrorReport {
    /// Report an error chain under `error_type`.
    #[must_use]
    pub fn new(error_type: &str, error: &anyhow::Error) -> Self {
        Self {
            error_message: format!("{error:#}"),
            error_type: error_type.to_owned(),
        }
    }
}

/// Client for the Runtime API of the current execution environment.
#[derive(Debug, Clone)]
pub struct RuntimeClient {
    http: reqwest::Client,
    base_url: String,
}

impl RuntimeClient {
    /// Create a client for the API at `host:port`.
    #[must_use]
    pub fn new(http: reqwest::Client, api: &str) -> Self {
        Self {
            http,
            base_url: format!("http://{api}/{API_VERSION}/runtime"),
        }
    }

    /// Block until the next event arrives.
    pub async fn next(&self) -> Result<Invocation> {
        let response = self
            .http
            .get(format!("{}/invocation/next", self.base_url))
            .send()
            .await
            .context("failed to poll for the next invocation")?
            .error_for_status()?;
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Invocation::from_parts(&headers, &body)
    }

    /// Report a successful result.
    pub async fn respond(&self, request_id: &str, result: &Value) -> Result<()> {
        self.http
            .post(format!("{}/invocation/{request_id}/response", self.base_url))
            .json(result)
            .send()
            .await
            .with_context(|| format!("failed to post response for {request_id}"))?
            .error_for_status()?;
        Ok(())
    }

    /// Report a failed invocation.
    pub async fn fail(&self, request_id: &str, report: &ErrorReport) -> Result<()> {
        self.http
            .post(format!("{}/invocation/{request_id}/error", self.base_url))
            .header(ERROR_TYPE_HEADER, report.error_type.as_str())
            .json(report)
            .send()
            .await
            .with_context(|| format!("failed to post error for {request_id}"))?
            .error_for_status()?;
        Ok(())
    }

    /// Report a failure to initialize. The environment is torn down afterwards.
    pub async fn init_error(&self, report: &ErrorReport) -> Result<()> {
        self.http
            .post(format!("{}/init/error", self.base_url))
            .header(ERROR_TYPE_HEADER, report.error_type.as_str())
            .json(report)
            .send()
            .await
            .context("failed to post initialization error")?
            .error_for_status()?;
        Ok(())
    }
}
