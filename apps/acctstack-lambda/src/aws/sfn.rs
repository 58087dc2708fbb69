//! Step Functions executions.

use async_trait::async_trait;
use aws_sdk_sfn::primitives::DateTime;

use acctstack_deploy_core::{ExecutionDetails, ServiceError, WorkflowExecutor};
use acctstack_deploy_model::{ExecutionStatus, StartedExecution};

use super::{service_error, to_chrono};

/// [`WorkflowExecutor`] backed by `StartExecution` / `DescribeExecution`.
#[derive(Debug, Clone)]
pub struct StepFunctionsExecutor {
    client: aws_sdk_sfn::Client,
}

impl StepFunctionsExecutor {
    /// Wrap a Step Functions client.
    #[must_use]
    pub fn new(client: aws_sdk_sfn::Client) -> Self {
        Self { client }
    }
}

fn timestamp(value: &DateTime) -> Result<chrono::DateTime<chrono::Utc>, ServiceError> {
    to_chrono(value).ok_or_else(|| ServiceError::message(format!("timestamp out of range: {value}")))
}

#[async_trait]
impl WorkflowExecutor for StepFunctionsExecutor {
    async fn start_execution(
        &self,
        state_machine_arn: &str,
        name: &str,
        input: String,
    ) -> Result<StartedExecution, ServiceError> {
        let output = self
            .client
            .start_execution()
            .state_machine_arn(state_machine_arn)
            .name(name)
            .input(input)
            .send()
            .await
            .map_err(|e| service_error(&e))?;
        Ok(StartedExecution {
            execution_arn: output.execution_arn().to_owned(),
            started_at: timestamp(output.start_date())?,
        })
    }

    async fn describe_execution(
        &self,
        execution_arn: &str,
    ) -> Result<ExecutionDetails, ServiceError> {
        let output = self
            .client
            .describe_execution()
            .execution_arn(execution_arn)
            .send()
            .await
            .map_err(|e| service_error(&e))?;

        let status = ExecutionStatus::from_name(output.status().as_str()).ok_or_else(|| {
            ServiceError::message(format!(
                "unknown execution status {} for {execution_arn}",
                output.status().as_str()
            ))
        })?;
        let stopped_at = output.stop_date().map(timestamp).transpose()?;

        Ok(ExecutionDetails { status, stopped_at })
    }
}
