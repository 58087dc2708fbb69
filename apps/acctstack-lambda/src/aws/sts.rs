//! STS role assumption.

use async_trait::async_trait;

use acctstack_core::RoleArn;
use acctstack_deploy_core::{RoleAssumer, ServiceError, TemporaryCredentials};

use super::service_error;

/// [`RoleAssumer`] backed by `AssumeRole`.
#[derive(Debug, Clone)]
pub struct StsRoleAssumer {
    client: aws_sdk_sts::Client,
}

impl StsRoleAssumer {
    /// Wrap an STS client.
    #[must_use]
    pub fn new(client: aws_sdk_sts::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RoleAssumer for StsRoleAssumer {
    async fn assume_role(
        &self,
        role_arn: &RoleArn,
        session_name: &str,
    ) -> Result<TemporaryCredentials, ServiceError> {
        let output = self
            .client
            .assume_role()
            .role_arn(role_arn.as_str())
            .role_session_name(session_name)
            .send()
            .await
            .map_err(|e| service_error(&e))?;

        let credentials = output
            .credentials()
            .ok_or_else(|| ServiceError::message("AssumeRole returned no credentials"))?;
        Ok(TemporaryCredentials {
            access_key_id: credentials.access_key_id().to_owned(),
            secret_access_key: credentials.secret_access_key().to_owned(),
            session_token: credentials.session_token().to_owned(),
        })
    }
}
