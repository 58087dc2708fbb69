//! Step Functions workflow payloads.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use acctstack_core::{AwsRegion, RoleArn};

use crate::stack::StackRef;

/// Input of one deploy-template execution: deploy a stack into one region of
/// one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeploymentWorkflow {
    /// Step Functions execution name.
    pub execution_name: String,
    /// Role to assume in the target account.
    #[serde(rename = "RoleARN")]
    pub role_arn: RoleArn,
    /// Target region.
    pub region: AwsRegion,
    /// S3 URL of the template.
    #[serde(rename = "TemplateURL")]
    pub template_url: String,
    /// Template parameters.
    pub parameters: BTreeMap<String, String>,
    /// Acknowledged capabilities.
    pub capabilities: Vec<String>,
    /// Stack to create or update.
    pub stack: StackRef,
}

/// Input of the parallel-execution state machine and the `start-workflows`
/// handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParallelExecutionInput {
    /// State machine to start once per workflow.
    pub state_machine_arn: String,
    /// Workflows to start.
    pub workflows: Vec<DeploymentWorkflow>,
}

/// An execution started by `start-workflows`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StartedExecution {
    /// Execution ARN.
    pub execution_arn: String,
    /// Start time.
    pub started_at: DateTime<Utc>,
}

/// Step Functions execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    /// Still running.
    Running,
    /// Finished successfully.
    Succeeded,
    /// Failed.
    Failed,
    /// Timed out.
    TimedOut,
    /// Aborted by a caller.
    Aborted,
    /// Failed and waiting for a redrive.
    PendingRedrive,
}

impl ExecutionStatus {
    /// Parse a Step Functions status name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "RUNNING" => Some(Self::Running),
            "SUCCEEDED" => Some(Self::Succeeded),
            "FAILED" => Some(Self::Failed),
            "TIMED_OUT" => Some(Self::TimedOut),
            "ABORTED" => Some(Self::Aborted),
            "PENDING_REDRIVE" => Some(Self::PendingRedrive),
            _ => None,
        }
    }
}

/// Combined status of a set of workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregateStatus {
    /// At least one workflow is still running.
    Running,
    /// Every workflow succeeded.
    Succeeded,
    /// Nothing is running and at least one workflow did not succeed.
    Failed,
}

/// A workflow whose execution is being polled.
///
/// Fields other than `ExecutionArn`, `Status`, and `StoppedAt` are passed
/// through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrackedWorkflow {
    /// Execution ARN.
    pub execution_arn: String,
    /// Last observed status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ExecutionStatus>,
    /// Stop time, once the execution has stopped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<DateTime<Utc>>,
    /// Other fields of the workflow.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Input and output of the `get-workflow-statuses` handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WorkflowStatusReport {
    /// Workflows being tracked.
    pub workflows: Vec<TrackedWorkflow>,
    /// Combined status, set by the handler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AggregateStatus>,
    /// Other fields of the state, passed through.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
