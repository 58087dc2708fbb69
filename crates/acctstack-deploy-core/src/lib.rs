//! Cross-account onboarding for AcctStack.
//!
//! The onboarding state machines call one handler per step:
//!
//! ```text
//! enroll-account ──► parallel state machine ──► start-workflows
//!                                                   │
//!                    deploy state machine ◄─────────┘ (one per region)
//!                      assume-role ─► describe-stack ─► update-stack
//!                                                   │
//!                    get-workflow-statuses ◄────────┘ (polled)
//! ```
//!
//! Every AWS call goes through a collaborator trait ([`RoleAssumer`],
//! [`SecretCipher`], [`StackClient`], [`WorkflowExecutor`],
//! [`BucketPolicyStore`], [`AccountRegistry`], [`RegionLister`],
//! [`UrlFetcher`]) so the handlers can be driven by in-memory fakes.
//!
//! [`NotificationHandler`] serves the SNS topics the member accounts publish
//! to: it authenticates each message and confirms new subscriptions.

pub mod config;
pub mod credentials;
pub mod enroll;
pub mod error;
pub mod notification;
pub mod policy;
pub mod stack;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use config::DeployConfig;
pub use credentials::{
    RoleAssumer, SecretCipher, TemporaryCredentials, assume_role, decrypt_credentials,
};
pub use enroll::{AccountRegistry, CAPABILITY_NAMED_IAM, Enroller, RegionLister};
pub use error::{DeployError, DeployResult, ServiceError};
pub use notification::{
    MAX_MESSAGE_AGE_SECS, NotificationHandler, UrlFetcher, check_message_age, is_signing_cert_url,
    string_to_sign, verify_signature,
};
pub use policy::{BucketPolicyStore, PatchMode, StatementPatch, apply_patch, patch_bucket_policy};
pub use stack::{StackClient, StackOperations, StackSession, StackUpdate, format_parameters};
pub use workflow::{
    ExecutionDetails, WorkflowExecutor, aggregate_status, refresh_statuses, start_workflows,
};
