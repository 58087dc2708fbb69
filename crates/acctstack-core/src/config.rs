//! Process-wide configuration for the AcctStack Lambda handlers.
//!
//! All configuration is driven by environment variables. The Lambda service
//! sets `_HANDLER`, `AWS_REGION`, `AWS_LAMBDA_RUNTIME_API`, and
//! `AWS_LAMBDA_LOG_STREAM_NAME`; the rest come from the function definition.

use crate::error::AcctStackError;
use crate::types::AwsRegion;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Text,
    /// One JSON object per event, for CloudWatch Logs Insights.
    Json,
}

/// Global configuration for AcctStack.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcctStackConfig {
    /// Name of the handler this process serves.
    pub handler: String,
    /// Region of the function itself.
    pub region: AwsRegion,
    /// Log level.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
    /// `host:port` of the Lambda Runtime API.
    pub runtime_api: String,
    /// CloudWatch log stream of this execution environment.
    pub log_stream_name: String,
}

impl Default for AcctStackConfig {
    fn default() -> Self {
        Self {
            handler: String::new(),
            region: AwsRegion::default(),
            log_level: "info".to_owned(),
            log_format: LogFormat::Text,
            runtime_api: "127.0.0.1:9001".to_owned(),
            log_stream_name: String::new(),
        }
    }
}

impl AcctStackConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("_HANDLER") {
            config.handler = v;
        }
        if let Ok(v) = std::env::var("AWS_REGION").or_else(|_| std::env::var("DEFAULT_REGION")) {
            config.region = AwsRegion::new(v);
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Ok(v) = std::env::var("LOG_FORMAT") {
            config.log_format = if v.eq_ignore_ascii_case("json") {
                LogFormat::Json
            } else {
                LogFormat::Text
            };
        }
        if let Ok(v) = std::env::var("AWS_LAMBDA_RUNTIME_API") {
            config.runtime_api = v;
        }
        if let Ok(v) = std::env::var("AWS_LAMBDA_LOG_STREAM_NAME") {
            config.log_stream_name = v;
        }

        config
    }
}

/// Read a required environment variable.
///
/// # Errors
/// Returns [`AcctStackError::MissingEnv`] if the variable is unset or empty.
pub fn env_required(key: &'static str) -> Result<String, AcctStackError> {
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(AcctStackError::MissingEnv(key)),
    }
}
