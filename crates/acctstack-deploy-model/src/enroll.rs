//! Account enrollment payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use acctstack_core::{AccountId, RoleArn};

/// Input of the `enroll-account` handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EnrollAccountRequest {
    /// Cross-account role in the account being enrolled.
    #[serde(rename = "RoleARN")]
    pub role_arn: RoleArn,
}

/// Output of the `enroll-account` handler, also stored in the account table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EnrollmentRecord {
    /// Enrolled account.
    #[serde(rename = "AccountID")]
    pub account_id: AccountId,
    /// Cross-account role.
    #[serde(rename = "RoleARN")]
    pub role_arn: RoleArn,
    /// Parallel deployment execution.
    #[serde(rename = "WorkflowARN")]
    pub workflow_arn: String,
    /// When the deployment started.
    pub started: DateTime<Utc>,
}
