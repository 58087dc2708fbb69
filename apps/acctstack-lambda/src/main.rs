//! AcctStack Lambda bootstrap.
//!
//! A custom runtime (`provided.al2023`) hosting every AcctStack handler. The
//! function's `_HANDLER` setting selects which one this environment serves.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `_HANDLER` | *(required)* | Handler name, e.g. `enroll-account` |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |
//! | `LOG_FORMAT` | `text` | `text` or `json` |
//! | `KMS_KEY_ID` | *(unset)* | Required by `assume-role` |
//!
//! `enroll-account` additionally reads the variables documented on
//! `DeployConfig::from_env`. `sns-notification` needs no configuration.

mod aws;
mod cfn_response;
mod dispatch;
mod http_fetch;
mod runtime;

use anyhow::{Context, Result};
use tracing::{Instrument, error, info, info_span};
use tracing_subscriber::EnvFilter;

use acctstack_core::{AcctStackConfig, LogFormat};
use acctstack_deploy_core::DeployError;

use crate::dispatch::Dispatcher;
use crate::runtime::{ErrorReport, Invocation, RuntimeClient};

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to `LOG_LEVEL`.
fn init_tracing(config: &AcctStackConfig) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(&config.log_level)
            .with_context(|| format!("invalid log level filter: {}", config.log_level))?
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(false);
    match config.log_format {
        LogFormat::Json => builder.json().with_current_span(true).init(),
        LogFormat::Text => builder.init(),
    }

    Ok(())
}

/// Classify an invocation error for the `errorType` field.
fn error_type(error: &anyhow::Error) -> &'static str {
    match error.downcast_ref::<DeployError>() {
        Some(DeployError::InvalidInput(_)) => "InvalidInput",
        Some(DeployError::Service { .. }) => "ServiceError",
        Some(DeployError::Notification(_)) => "InvalidSignature",
        Some(_) => "DeployError",
        None if error.downcast_ref::<serde_json::Error>().is_some() => "InvalidInput",
        None => "Error",
    }
}

async fn handle(
    runtime: &RuntimeClient,
    dispatcher: &Dispatcher,
    invocation: Invocation,
) -> Result<()> {
    match dispatcher.invoke(invocation.payload).await {
        Ok(result) => {
            info!("invocation succeeded");
            runtime.respond(&invocation.request_id, &result).await
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "invocation failed");
            let report = ErrorReport::new(error_type(&e), &e);
            runtime.fail(&invocation.request_id, &report).await
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AcctStackConfig::from_env();
    init_tracing(&config)?;

    let http = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;
    let runtime = RuntimeClient::new(http.clone(), &config.runtime_api);

    let dispatcher = match Dispatcher::init(&config, http).await {
        Ok(dispatcher) => dispatcher,
        Err(e) => {
            error!(handler = %config.handler, error = %format!("{e:#}"), "initialization failed");
            runtime
                .init_error(&ErrorReport::new("InitializationError", &e))
                .await?;
            return Err(e);
        }
    };

    info!(
        handler = %config.handler,
        region = %config.region,
        version = env!("CARGO_PKG_VERSION"),
        "AcctStack runtime ready"
    );

    loop {
        let invocation = runtime.next().await?;
        let span = info_span!(
            "invocation",
            request_id = %invocation.request_id,
            trace_id = invocation.trace_id.as_deref().unwrap_or_default(),
        );
        handle(&runtime, &dispatcher, invocation)
            .instrument(span)
            .await?;
    }
}
