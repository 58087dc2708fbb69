//! CloudFormation in target accounts.
//!
//! Each call builds a client from the shared SDK configuration with the
//! session's assumed-role credentials and region.

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_cloudformation::config::Region;
use aws_sdk_cloudformation::operation::RequestId;
use aws_sdk_cloudformation::types as sdk;

use acctstack_deploy_core::{ServiceError, StackClient, StackSession, StackUpdate};
use acctstack_deploy_model::{StackDescription, StackOutput, StackParameter, StackTag};

use super::service_error;

const CREDENTIALS_PROVIDER: &str = "acctstack-assumed-role";

/// [`StackClient`] backed by the CloudFormation API.
#[derive(Debug, Clone)]
pub struct CloudFormationStacks {
    base: aws_config::SdkConfig,
}

impl CloudFormationStacks {
    /// Create clients derived from `base`.
    #[must_use]
    pub fn new(base: aws_config::SdkConfig) -> Self {
        Self { base }
    }

    fn client(&self, session: &StackSession) -> aws_sdk_cloudformation::Client {
        let credentials = Credentials::new(
            session.credentials.access_key_id.clone(),
            session.credentials.secret_access_key.clone(),
            Some(session.credentials.session_token.clone()),
            None,
            CREDENTIALS_PROVIDER,
        );
        let config = aws_sdk_cloudformation::config::Builder::from(&self.base)
            .credentials_provider(credentials)
            .region(Region::new(session.region.as_str().to_owned()))
            .build();
        aws_sdk_cloudformation::Client::from_conf(config)
    }
}

fn owned<'a>(value: impl Into<Option<&'a str>>) -> Option<String> {
    value.into().map(str::to_owned)
}

fn describe(stack: &sdk::Stack) -> StackDescription {
    let status: Option<&sdk::StackStatus> = stack.stack_status().into();
    StackDescription {
        stack_name: owned(stack.stack_name()),
        stack_id: owned(stack.stack_id()),
        stack_status: status.map(|s| s.as_str().to_owned()),
        stack_status_reason: owned(stack.stack_status_reason()),
        parameters: stack
            .parameters()
            .iter()
            .filter_map(|p| {
                Some(StackParameter {
                    parameter_key: owned(p.parameter_key())?,
                    parameter_value: owned(p.parameter_value()),
                    use_previous_value: p.use_previous_value(),
                })
            })
            .collect(),
        outputs: stack
            .outputs()
            .iter()
            .filter_map(|o| {
                Some(StackOutput {
                    output_key: owned(o.output_key())?,
                    output_value: owned(o.output_value()),
                    export_name: owned(o.export_name()),
                })
            })
            .collect(),
        tags: stack
            .tags()
            .iter()
            .filter_map(|t| {
                Some(StackTag {
                    key: owned(t.key())?,
                    value: owned(t.value())?,
                })
            })
            .collect(),
        capabilities: stack
            .capabilities()
            .iter()
            .map(|c| c.as_str().to_owned())
            .collect(),
        notification_arns: stack.notification_arns().to_vec(),
        role_arn: owned(stack.role_arn()),
        change_set_id: owned(stack.change_set_id()),
    }
}

#[async_trait]
impl StackClient for CloudFormationStacks {
    async fn describe_stack(
        &self,
        session: &StackSession,
        stack: &str,
    ) -> Result<StackDescription, ServiceError> {
        let output = self
            .client(session)
            .describe_stacks()
            .stack_name(stack)
            .send()
            .await
            .map_err(|e| service_error(&e))?;
        output
            .stacks()
            .first()
            .map(describe)
            .ok_or_else(|| ServiceError::new("ValidationError", format!("Stack with id {stack} does not exist")))
    }

    async fn update_stack(
        &self,
        session: &StackSession,
        update: StackUpdate,
    ) -> Result<Option<String>, ServiceError> {
        let parameters = update
            .parameters
            .into_iter()
            .map(|p| {
                sdk::Parameter::builder()
                    .parameter_key(p.parameter_key)
                    .set_parameter_value(p.parameter_value)
                    .set_use_previous_value(p.use_previous_value)
                    .build()
            })
            .collect();
        let capabilities = update
            .capabilities
            .iter()
            .map(|c| sdk::Capability::from(c.as_str()))
            .collect();

        let output = self
            .client(session)
            .update_stack()
            .stack_name(update.stack_name)
            .template_url(update.template_url)
            .set_parameters(Some(parameters))
            .set_capabilities(Some(capabilities))
            .send()
            .await
            .map_err(|e| service_error(&e))?;
        Ok(output.stack_id().map(str::to_owned))
    }

    async fn delete_stack(
        &self,
        session: &StackSession,
        stack_id: &str,
    ) -> Result<String, ServiceError> {
        let output = self
            .client(session)
            .delete_stack()
            .stack_name(stack_id)
            .send()
            .await
            .map_err(|e| service_error(&e))?;
        Ok(output.request_id().unwrap_or_default().to_owned())
    }
}
