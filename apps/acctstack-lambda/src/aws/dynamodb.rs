//! DynamoDB account table.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, SecondsFormat, Utc};

use acctstack_core::{AccountId, RoleArn};
use acctstack_deploy_core::{AccountRegistry, ServiceError};

use super::service_error;

/// [`AccountRegistry`] storing one item per account, keyed by `AccountID`.
#[derive(Debug, Clone)]
pub struct DynamoAccountRegistry {
    client: aws_sdk_dynamodb::Client,
}

impl DynamoAccountRegistry {
    /// Wrap a DynamoDB client.
    #[must_use]
    pub fn new(client: aws_sdk_dynamodb::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AccountRegistry for DynamoAccountRegistry {
    async fn put_account(
        &self,
        table: &str,
        account_id: &AccountId,
        role_arn: &RoleArn,
    ) -> Result<(), ServiceError> {
        self.client
            .put_item()
            .table_name(table)
            .item("AccountID", AttributeValue::S(account_id.to_string()))
            .item("RoleARN", AttributeValue::S(role_arn.to_string()))
            .send()
            .await
            .map_err(|e| service_error(&e))?;
        Ok(())
    }

    async fn record_workflow(
        &self,
        table: &str,
        account_id: &AccountId,
        workflow_arn: &str,
        started: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        self.client
            .update_item()
            .table_name(table)
            .key("AccountID", AttributeValue::S(account_id.to_string()))
            .update_expression("SET WorkflowARN = :workflow, Started = :started")
            .expression_attribute_values(":workflow", AttributeValue::S(workflow_arn.to_owned()))
            .expression_attribute_values(
                ":started",
                AttributeValue::S(started.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            )
            .send()
            .await
            .map_err(|e| service_error(&e))?;
        Ok(())
    }
}
