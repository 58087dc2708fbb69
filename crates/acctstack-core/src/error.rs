//! Error types for the AcctStack core.

/// Core error type for AcctStack infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum AcctStackError {
    /// Invalid AWS account ID format.
    #[error("invalid AWS account ID: {0} (must be 12-digit numeric string)")]
    InvalidAccountId(String),

    /// Invalid IAM role ARN.
    #[error("invalid IAM role ARN: {arn}: {reason}")]
    InvalidRoleArn {
        /// The rejected ARN.
        arn: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A required environment variable is not set.
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),
}

/// Convenience result type for AcctStack operations.
pub type AcctStackResult<T> = Result<T, AcctStackError>;
