//! Onboarding error types.

use acctstack_core::AcctStackError;

/// Failure reported by an AWS service collaborator.
///
/// Adapters keep the service's error code and message; onboarding logic
/// classifies some outcomes (missing stacks, no-op updates) by message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}{message}", .code.as_deref().map(|c| format!("{c}: ")).unwrap_or_default())]
pub struct ServiceError {
    /// Service error code, e.g. `ValidationError`.
    pub code: Option<String>,
    /// Service error message.
    pub message: String,
}

impl ServiceError {
    /// Create an error with a code.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// Create an error without a code.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }
}

/// Errors returned by the onboarding handlers.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Configuration or identifier error.
    #[error(transparent)]
    Core(#[from] AcctStackError),

    /// The handler input is malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An AWS call failed.
    #[error("{operation} failed: {source}")]
    Service {
        /// The API operation, e.g. `UpdateStack`.
        operation: &'static str,
        /// Underlying service error.
        #[source]
        source: ServiceError,
    },

    /// Ciphertext could not be decoded.
    #[error("invalid credentials ciphertext: {0}")]
    Ciphertext(String),

    /// A bucket policy could not be patched.
    #[error("bucket policy for {bucket}: {reason}")]
    Policy {
        /// Bucket whose policy was being patched.
        bucket: String,
        /// What went wrong.
        reason: String,
    },

    /// An SNS message failed authentication.
    #[error("invalid SNS message: {0}")]
    Notification(String),

    /// JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DeployError {
    /// Wrap a service error with the operation that produced it.
    #[must_use]
    pub fn service(operation: &'static str, source: ServiceError) -> Self {
        Self::Service { operation, source }
    }
}

/// Convenience result type for onboarding operations.
pub type DeployResult<T> = Result<T, DeployError>;
