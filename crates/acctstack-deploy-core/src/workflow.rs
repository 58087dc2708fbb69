//! Step Functions fan-out and status polling.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use acctstack_deploy_model::{
    AggregateStatus, ExecutionStatus, ParallelExecutionInput, StartedExecution,
    WorkflowStatusReport,
};

use crate::error::{DeployError, DeployResult, ServiceError};

/// Current state of one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionDetails {
    /// Execution status.
    pub status: ExecutionStatus,
    /// Stop time, once stopped.
    pub stopped_at: Option<DateTime<Utc>>,
}

/// Step Functions API surface used by the workflow handlers.
#[async_trait]
pub trait WorkflowExecutor: Send + Sync + fmt::Debug {
    /// Start an execution of `state_machine_arn` named `name`.
    async fn start_execution(
        &self,
        state_machine_arn: &str,
        name: &str,
        input: String,
    ) -> Result<StartedExecution, ServiceError>;

    /// Look up an execution.
    async fn describe_execution(
        &self,
        execution_arn: &str,
    ) -> Result<ExecutionDetails, ServiceError>;
}

/// Start one execution per workflow, named after the workflow, with the
/// workflow itself as input.
pub async fn start_workflows(
    executor: &dyn WorkflowExecutor,
    input: &ParallelExecutionInput,
) -> DeployResult<Vec<StartedExecution>> {
    let mut started = Vec::with_capacity(input.workflows.len());
    for workflow in &input.workflows {
        let payload = serde_json::to_string(workflow)?;
        let execution = executor
            .start_execution(&input.state_machine_arn, &workflow.execution_name, payload)
            .await
            .map_err(|e| DeployError::service("StartExecution", e))?;
        debug!(
            execution_name = %workflow.execution_name,
            execution_arn = %execution.execution_arn,
            "started workflow"
        );
        started.push(execution);
    }
    info!(
        state_machine = %input.state_machine_arn,
        count = started.len(),
        "started workflows"
    );
    Ok(started)
}

/// Combine execution statuses: running wins, then all-succeeded, else failed.
///
/// An empty set is `SUCCEEDED`.
#[must_use]
pub fn aggregate_status<I>(statuses: I) -> AggregateStatus
where
    I: IntoIterator<Item = ExecutionStatus>,
{
    let mut all_succeeded = true;
    for status in statuses {
        match status {
            ExecutionStatus::Running => return AggregateStatus::Running,
            ExecutionStatus::Succeeded => {}
            _ => all_succeeded = false,
        }
    }
    if all_succeeded {
        AggregateStatus::Succeeded
    } else {
        AggregateStatus::Failed
    }
}

/// Refresh `Status` and `StoppedAt` of every tracked workflow and set the
/// aggregate `Status`. Other fields are left as they are.
pub async fn refresh_statuses(
    executor: &dyn WorkflowExecutor,
    mut report: WorkflowStatusReport,
) -> DeployResult<WorkflowStatusReport> {
    for workflow in &mut report.workflows {
        let details = executor
            .describe_execution(&workflow.execution_arn)
            .await
            .map_err(|e| DeployError::service("DescribeExecution", e))?;
        workflow.status = Some(details.status);
        if details.stopped_at.is_some() {
            workflow.stopped_at = details.stopped_at;
        }
    }

    let status = aggregate_status(report.workflows.iter().filter_map(|w| w.status));
    debug!(workflows = report.workflows.len(), status = ?status, "workflow statuses");
    report.status = Some(status);
    Ok(report)
}
