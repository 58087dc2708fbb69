//! Handler selection and invocation.

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use acctstack_cloudtrail_core::EventSelectorResourceHandler;
use acctstack_cloudtrail_model::CustomResourceRequest;
use acctstack_core::{AcctStackConfig, env_required};
use acctstack_deploy_core::{
    DeployConfig, Enroller, NotificationHandler, RoleAssumer, SecretCipher, StackOperations, WorkflowExecutor,
    assume_role, refresh_statuses, start_workflows,
};
use acctstack_deploy_model::{
    AssumeRoleRequest, DeleteStackRequest, DescribeStackRequest, EnrollAccountRequest,
    ParallelExecutionInput, SnsMessage, UpdateStackRequest, WorkflowStatusReport,
};

use crate::aws::cloudformation::CloudFormationStacks;
use crate::aws::cloudtrail::CloudTrailStore;
use crate::aws::dynamodb::DynamoAccountRegistry;
use crate::aws::ec2::Ec2RegionLister;
use crate::aws::kms::KmsCipher;
use crate::aws::s3::S3PolicyStore;
use crate::aws::sfn::StepFunctionsExecutor;
use crate::aws::sts::StsRoleAssumer;
use crate::cfn_response::CfnResponder;
use crate::http_fetch::HttpFetcher;

/// The handlers this binary can serve, selected by `_HANDLER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LambdaHandler {
    /// `Custom::CloudTrailEventSelector` custom resource.
    EventSelectorResource,
    /// Assume a cross-account role.
    AssumeRole,
    /// Describe a stack in a target account.
    DescribeStack,
    /// Update a stack in a target account.
    UpdateStack,
    /// Delete a stack in a target account.
    DeleteStack,
    /// Start one execution per workflow.
    StartWorkflows,
    /// Poll workflow executions.
    GetWorkflowStatuses,
    /// Enroll a new account.
    EnrollAccount,
    /// Authenticate SNS messages and confirm subscriptions.
    SnsNotification,
}

impl LambdaHandler {
    /// Every handler.
    pub const ALL: [Self; 9] = [
        Self::EventSelectorResource,
        Self::AssumeRole,
        Self::DescribeStack,
        Self::UpdateStack,
        Self::DeleteStack,
        Self::StartWorkflows,
        Self::GetWorkflowStatuses,
        Self::EnrollAccount,
        Self::SnsNotification,
    ];

    /// The `_HANDLER` value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EventSelectorResource => "event-selector-resource",
            Self::AssumeRole => "assume-role",
            Self::DescribeStack => "describe-stack",
            Self::UpdateStack => "update-stack",
            Self::DeleteStack => "delete-stack",
            Self::StartWorkflows => "start-workflows",
            Self::GetWorkflowStatuses => "get-workflow-statuses",
            Self::EnrollAccount => "enroll-account",
            Self::SnsNotification => "sns-notification",
        }
    }

    /// Parse a `_HANDLER` value.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|h| h.as_str() == name.trim())
    }
}

impl fmt::Display for LambdaHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A handler wired to its AWS collaborators.
#[derive(Debug)]
pub enum Dispatcher {
    /// See [`LambdaHandler::EventSelectorResource`].
    EventSelectorResource {
        /// Reconciliation.
        handler: EventSelectorResourceHandler,
        /// Response delivery.
        responder: CfnResponder,
    },
    /// See [`LambdaHandler::AssumeRole`].
    AssumeRole {
        /// STS.
        assumer: Arc<dyn RoleAssumer>,
        /// KMS.
        cipher: Arc<dyn SecretCipher>,
        /// Key encrypting secret access keys.
        key_id: String,
    },
    /// Describe, update, or delete a stack.
    Stack {
        /// Which of the three.
        handler: LambdaHandler,
        /// The stack operations.
        operations: StackOperations,
    },
    /// Start or poll workflows.
    Workflow {
        /// Which of the two.
        handler: LambdaHandler,
        /// Step Functions.
        executor: Arc<dyn WorkflowExecutor>,
    },
    /// See [`LambdaHandler::EnrollAccount`].
    EnrollAccount(Enroller),
    /// See [`LambdaHandler::SnsNotification`].
    SnsNotification(NotificationHandler),
}

impl Dispatcher {
    /// Build the handler named in `config`, loading the AWS configuration
    /// from the default provider chain.
    pub async fn init(config: &AcctStackConfig, http: reqwest::Client) -> Result<Self> {
        let handler = LambdaHandler::from_name(&config.handler)
            .with_context(|| format!("unknown handler: {:?}", config.handler))?;
        let sdk = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

        let dispatcher = match handler {
            LambdaHandler::EventSelectorResource => Self::EventSelectorResource {
                handler: EventSelectorResourceHandler::new(
                    Arc::new(CloudTrailStore::new(aws_sdk_cloudtrail::Client::new(&sdk))),
                    config.log_stream_name.clone(),
                ),
                responder: CfnResponder::new(http),
            },
            LambdaHandler::AssumeRole => Self::AssumeRole {
                assumer: Arc::new(StsRoleAssumer::new(aws_sdk_sts::Client::new(&sdk))),
                cipher: Arc::new(KmsCipher::new(aws_sdk_kms::Client::new(&sdk))),
                key_id: env_required("KMS_KEY_ID")?,
            },
            LambdaHandler::DescribeStack | LambdaHandler::UpdateStack | LambdaHandler::DeleteStack => {
                Self::Stack {
                    handler,
                    operations: StackOperations::new(
                        Arc::new(CloudFormationStacks::new(sdk.clone())),
                        Arc::new(KmsCipher::new(aws_sdk_kms::Client::new(&sdk))),
                    ),
                }
            }
            LambdaHandler::StartWorkflows | LambdaHandler::GetWorkflowStatuses => Self::Workflow {
                handler,
                executor: Arc::new(StepFunctionsExecutor::new(aws_sdk_sfn::Client::new(&sdk))),
            },
            LambdaHandler::EnrollAccount => Self::EnrollAccount(
                Enroller::builder()
                    .config(DeployConfig::from_env()?)
                    .registry(Arc::new(DynamoAccountRegistry::new(
                        aws_sdk_dynamodb::Client::new(&sdk),
                    )))
                    .policies(Arc::new(S3PolicyStore::new(aws_sdk_s3::Client::new(&sdk))))
                    .regions(Arc::new(Ec2RegionLister::new(aws_sdk_ec2::Client::new(&sdk))))
                    .executor(Arc::new(StepFunctionsExecutor::new(
                        aws_sdk_sfn::Client::new(&sdk),
                    )))
                    .build(),
            ),
            LambdaHandler::SnsNotification => Self::SnsNotification(NotificationHandler::new(
                Arc::new(HttpFetcher::new(http)),
            )),
        };
        Ok(dispatcher)
    }

    /// Run one invocation and produce its result document.
    pub async fn invoke(&self, payload: Value) -> Result<Value> {
        match self {
            Self::EventSelectorResource { handler, responder } => {
                let request: CustomResourceRequest = parse(payload)?;
                let response = handler.handle(&request).await;
                responder.send(&request.response_url, &response).await?;
                to_value(&response)
            }
            Self::AssumeRole {
                assumer,
                cipher,
                key_id,
            } => {
                let request: AssumeRoleRequest = parse(payload)?;
                to_value(&assume_role(assumer.as_ref(), cipher.as_ref(), key_id, &request).await?)
            }
            Self::Stack {
                handler,
                operations,
            } => match handler {
                LambdaHandler::DescribeStack => {
                    let request: DescribeStackRequest = parse(payload)?;
                    to_value(&operations.describe(&request).await?)
                }
                LambdaHandler::UpdateStack => {
                    let request: UpdateStackRequest = parse(payload)?;
                    to_value(&operations.update(&request).await?)
                }
                LambdaHandler::DeleteStack => {
                    let request: DeleteStackRequest = parse(payload)?;
                    to_value(&operations.delete(&request).await?)
                }
                other => bail!("{other} is not a stack handler"),
            },
            Self::Workflow { handler, executor } => match handler {
                LambdaHandler::StartWorkflows => {
                    let input: ParallelExecutionInput = parse(payload)?;
                    to_value(&start_workflows(executor.as_ref(), &input).await?)
                }
                LambdaHandler::GetWorkflowStatuses => {
                    let report: WorkflowStatusReport = parse(payload)?;
                    to_value(&refresh_statuses(executor.as_ref(), report).await?)
                }
                other => bail!("{other} is not a workflow handler"),
            },
            Self::EnrollAccount(enroller) => {
                let request: EnrollAccountRequest = parse(payload)?;
                to_value(&enroller.enroll(&request).await?)
            }
            Self::SnsNotification(handler) => {
                let message: SnsMessage = parse(payload)?;
                to_value(&handler.handle(&message, Utc::now()).await?)
            }
        }
    }
}

fn parse<T: DeserializeOwned>(payload: Value) -> Result<T> {
    serde_json::from_value(payload).context("invalid event payload")
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}
