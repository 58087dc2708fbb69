//! Reconciliation error type.

/// Failure of a single reconciliation pass.
///
/// None of these are retried: the fetch-modify-write is not transactional, so
/// the caller reports the failure and lets the provisioning layer decide.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    /// Reading the trail's current selectors failed.
    #[error("failed to fetch event selectors for trail {trail}: {message}")]
    FetchFailed {
        /// Trail name.
        trail: String,
        /// Underlying error message.
        message: String,
    },

    /// The desired spec is malformed or incomplete.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// Writing the reconciled selectors failed; the trail keeps its previous
    /// configuration.
    #[error("failed to put event selectors for trail {trail}: {message}")]
    WriteFailed {
        /// Trail name.
        trail: String,
        /// Underlying error message.
        message: String,
    },
}
