//! Onboarding configuration.
//!
//! Provides [`DeployConfig`], the buckets, tables, state machines, and
//! template coordinates the enrollment workflow operates on. Every value is
//! required; handlers that need it load it with [`DeployConfig::from_env`].

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use acctstack_core::{AcctStackError, env_required};

/// Onboarding configuration.
///
/// # Examples
///
/// ```
/// use acctstack_deploy_core::DeployConfig;
///
/// let config = DeployConfig::builder()
///     .kms_key_id("alias/acctstack")
///     .cloudtrail_bucket("org-cloudtrail")
///     .config_bucket("org-config")
///     .dist_bucket("org-dist")
///     .account_table("accounts")
///     .deploy_template_state_machine_arn("arn:aws:states:us-east-1:111111111111:stateMachine:deploy")
///     .parallel_execution_state_machine_arn("arn:aws:states:us-east-1:111111111111:stateMachine:parallel")
///     .events_sns_notification_url("https://hooks.example.com/events")
///     .config_sns_notification_url("https://hooks.example.com/config")
///     .cloudtrail_sns_notification_url("https://hooks.example.com/cloudtrail")
///     .stack_name("acctstack-base")
///     .template_file_name("base.yaml")
///     .management_account_id("111111111111")
///     .build();
/// assert_eq!(config.template_url(), "https://s3.amazonaws.com/org-dist/base.yaml");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
#[builder(field_defaults(setter(into)))]
pub struct DeployConfig {
    /// KMS key used to encrypt secret access keys.
    pub kms_key_id: String,
    /// Central CloudTrail log bucket.
    pub cloudtrail_bucket: String,
    /// Central AWS Config bucket.
    pub config_bucket: String,
    /// Bucket holding the deployment template.
    pub dist_bucket: String,
    /// DynamoDB table of enrolled accounts.
    pub account_table: String,
    /// State machine deploying the template into one region.
    pub deploy_template_state_machine_arn: String,
    /// State machine fanning out deploy executions.
    pub parallel_execution_state_machine_arn: String,
    /// Passed to the template as `EventsSNSNotificationURL`.
    pub events_sns_notification_url: String,
    /// Passed to the template as `ConfigSNSNotificationURL`.
    pub config_sns_notification_url: String,
    /// Passed to the template as `CloudTrailSNSNotificationURL`.
    pub cloudtrail_sns_notification_url: String,
    /// Name of the stack created in each region.
    pub stack_name: String,
    /// Template object key in the dist bucket.
    pub template_file_name: String,
    /// Passed to the template as `ManagementAccountID`.
    pub management_account_id: String,
}

impl DeployConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `KMS_KEY_ID` | `kms_key_id` |
    /// | `CLOUDTRAIL_BUCKET` | `cloudtrail_bucket` |
    /// | `CONFIG_BUCKET` | `config_bucket` |
    /// | `DIST_BUCKET` | `dist_bucket` |
    /// | `ACCOUNT_TABLE` | `account_table` |
    /// | `DEPLOY_TEMPLATE_STATE_MACHINE_ARN` | `deploy_template_state_machine_arn` |
    /// | `PARALLEL_EXECUTION_STATE_MACHINE_ARN` | `parallel_execution_state_machine_arn` |
    /// | `EVENTS_SNS_NOTIFICATION_URL` | `events_sns_notification_url` |
    /// | `CONFIG_SNS_NOTIFICATION_URL` | `config_sns_notification_url` |
    /// | `CLOUDTRAIL_SNS_NOTIFICATION_URL` | `cloudtrail_sns_notification_url` |
    /// | `STACK_NAME` | `stack_name` |
    /// | `TEMPLATE_FILE_NAME` | `template_file_name` |
    /// | `MANAGEMENT_ACCOUNT_ID` | `management_account_id` |
    pub fn from_env() -> Result<Self, AcctStackError> {
        Ok(Self {
            kms_key_id: env_required("KMS_KEY_ID")?,
            cloudtrail_bucket: env_required("CLOUDTRAIL_BUCKET")?,
            config_bucket: env_required("CONFIG_BUCKET")?,
            dist_bucket: env_required("DIST_BUCKET")?,
            account_table: env_required("ACCOUNT_TABLE")?,
            deploy_template_state_machine_arn: env_required("DEPLOY_TEMPLATE_STATE_MACHINE_ARN")?,
            parallel_execution_state_machine_arn: env_required(
                "PARALLEL_EXECUTION_STATE_MACHINE_ARN",
            )?,
            events_sns_notification_url: env_required("EVENTS_SNS_NOTIFICATION_URL")?,
            config_sns_notification_url: env_required("CONFIG_SNS_NOTIFICATION_URL")?,
            cloudtrail_sns_notification_url: env_required("CLOUDTRAIL_SNS_NOTIFICATION_URL")?,
            stack_name: env_required("STACK_NAME")?,
            template_file_name: env_required("TEMPLATE_FILE_NAME")?,
            management_account_id: env_required("MANAGEMENT_ACCOUNT_ID")?,
        })
    }

    /// S3 URL of the deployment template.
    #[must_use]
    pub fn template_url(&self) -> String {
        format!(
            "https://s3.amazonaws.com/{}/{}",
            self.dist_bucket, self.template_file_name
        )
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> DeployConfig {
    DeployConfig::builder()
        .kms_key_id("alias/acctstack")
        .cloudtrail_bucket("org-cloudtrail")
        .config_bucket("org-config")
        .dist_bucket("org-dist")
        .account_table("accounts")
        .deploy_template_state_machine_arn("arn:aws:states:us-east-1:111111111111:stateMachine:deploy")
        .parallel_execution_state_machine_arn(
            "arn:aws:states:us-east-1:111111111111:stateMachine:parallel",
        )
        .events_sns_notification_url("https://hooks.example.com/events")
        .config_sns_notification_url("https://hooks.example.com/config")
        .cloudtrail_sns_notification_url("https://hooks.example.com/cloudtrail")
        .stack_name("acctstack-base")
        .template_file_name("base.yaml")
        .management_account_id("111111111111")
        .build()
}
