//! Core types, configuration, and errors for AcctStack.
//!
//! This crate provides the building blocks shared by every AcctStack handler:
//! the AWS identifiers passed between onboarding steps (account IDs, regions,
//! role ARNs), the process-wide configuration read from the Lambda
//! environment, and the core error type.

mod config;
mod error;
mod types;

pub use config::{AcctStackConfig, LogFormat, env_required};
pub use error::{AcctStackError, AcctStackResult};
pub use types::{AccountId, AwsRegion, RoleArn};
