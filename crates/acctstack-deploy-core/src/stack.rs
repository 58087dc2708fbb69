//! CloudFormation stack operations in a target account.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use acctstack_core::AwsRegion;
use acctstack_deploy_model::{
    DeleteStackRequest, DeleteStackResponse, DescribeStackRequest, EncryptedCredentials,
    StackDescription, StackParameter, UpdateStackRequest, UpdateStackResponse, UpdateWarning,
};

use crate::credentials::{SecretCipher, TemporaryCredentials, decrypt_credentials};
use crate::error::{DeployError, DeployResult, ServiceError};

const DOES_NOT_EXIST_SUFFIX: &str = "does not exist";
const NO_UPDATES_MESSAGE: &str = "No updates are to be performed.";

/// Credentials and region for calls into a target account.
#[derive(Debug, Clone)]
pub struct StackSession {
    /// Decrypted credentials.
    pub credentials: TemporaryCredentials,
    /// Region to call.
    pub region: AwsRegion,
}

/// An `UpdateStack` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackUpdate {
    /// Stack name.
    pub stack_name: String,
    /// S3 URL of the template.
    pub template_url: String,
    /// Parameters, all with explicit values.
    pub parameters: Vec<StackParameter>,
    /// Acknowledged capabilities.
    pub capabilities: Vec<String>,
}

/// CloudFormation API surface used by the stack handlers.
#[async_trait]
pub trait StackClient: Send + Sync + fmt::Debug {
    /// Describe a stack by name or ID.
    async fn describe_stack(
        &self,
        session: &StackSession,
        stack: &str,
    ) -> Result<StackDescription, ServiceError>;

    /// Start a stack update, returning the stack ID.
    async fn update_stack(
        &self,
        session: &StackSession,
        update: StackUpdate,
    ) -> Result<Option<String>, ServiceError>;

    /// Delete a stack, returning the request ID.
    async fn delete_stack(
        &self,
        session: &StackSession,
        stack_id: &str,
    ) -> Result<String, ServiceError>;
}

/// Turn a parameter map into explicit `UpdateStack` parameters.
#[must_use]
pub fn format_parameters(parameters: &BTreeMap<String, String>) -> Vec<StackParameter> {
    parameters
        .iter()
        .map(|(key, value)| StackParameter {
            parameter_key: key.clone(),
            parameter_value: Some(value.clone()),
            use_previous_value: Some(false),
        })
        .collect()
}

/// The `describe-stack`, `update-stack`, and `delete-stack` handlers.
#[derive(Debug, Clone)]
pub struct StackOperations {
    client: Arc<dyn StackClient>,
    cipher: Arc<dyn SecretCipher>,
}

impl StackOperations {
    /// Create the handlers.
    #[must_use]
    pub fn new(client: Arc<dyn StackClient>, cipher: Arc<dyn SecretCipher>) -> Self {
        Self { client, cipher }
    }

    async fn session(
        &self,
        credentials: &EncryptedCredentials,
        region: &AwsRegion,
    ) -> DeployResult<StackSession> {
        Ok(StackSession {
            credentials: decrypt_credentials(self.cipher.as_ref(), credentials).await?,
            region: region.clone(),
        })
    }

    /// Describe a stack. A stack CloudFormation does not know about is
    /// reported with status `DOES_NOT_EXIST` rather than as an error.
    pub async fn describe(&self, request: &DescribeStackRequest) -> DeployResult<StackDescription> {
        let stack = request
            .stack
            .query()
            .ok_or_else(|| DeployError::InvalidInput("Stack needs StackId or StackName".into()))?;
        let session = self.session(&request.credentials, &request.region).await?;

        match self.client.describe_stack(&session, stack).await {
            Ok(description) => Ok(description),
            Err(e) if e.message.trim_end().ends_with(DOES_NOT_EXIST_SUFFIX) => {
                info!(stack, region = %request.region, "stack does not exist");
                Ok(StackDescription::does_not_exist(
                    request.stack.stack_name.clone(),
                ))
            }
            Err(e) => Err(DeployError::service("DescribeStacks", e)),
        }
    }

    /// Update a stack with explicit parameter values. An update with no
    /// changes is reported as `NOTHING_TO_UPDATE`.
    pub async fn update(&self, request: &UpdateStackRequest) -> DeployResult<UpdateStackResponse> {
        let stack_name = request
            .stack
            .stack_name
            .clone()
            .ok_or_else(|| DeployError::InvalidInput("Stack needs StackName".into()))?;
        let session = self.session(&request.credentials, &request.region).await?;

        let update = StackUpdate {
            stack_name: stack_name.clone(),
            template_url: request.template_url.clone(),
            parameters: format_parameters(&request.parameters),
            capabilities: request.capabilities.clone(),
        };

        match self.client.update_stack(&session, update).await {
            Ok(stack_id) => {
                info!(stack = %stack_name, region = %request.region, "stack update started");
                Ok(UpdateStackResponse {
                    stack_id,
                    warning: UpdateWarning::None,
                })
            }
            Err(e) if e.message.trim() == NO_UPDATES_MESSAGE => {
                warn!(stack = %stack_name, region = %request.region, "nothing to update");
                Ok(UpdateStackResponse {
                    stack_id: None,
                    warning: UpdateWarning::NothingToUpdate,
                })
            }
            Err(e) => Err(DeployError::service("UpdateStack", e)),
        }
    }

    /// Delete a stack by ID.
    pub async fn delete(&self, request: &DeleteStackRequest) -> DeployResult<DeleteStackResponse> {
        let stack_id = request
            .stack
            .stack_id
            .as_deref()
            .ok_or_else(|| DeployError::InvalidInput("Stack needs StackId".into()))?;
        let session = self.session(&request.credentials, &request.region).await?;

        let request_id = self
            .client
            .delete_stack(&session, stack_id)
            .await
            .map_err(|e| DeployError::service("DeleteStack", e))?;
        info!(stack_id, region = %request.region, request_id = %request_id, "stack delete requested");
        Ok(DeleteStackResponse { request_id })
    }
}
