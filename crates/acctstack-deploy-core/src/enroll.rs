//! Account enrollment.
//!
//! Enrolling an account records it in the account table, opens the central
//! buckets to it, and starts a parallel deployment of the base template into
//! every region.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;
use typed_builder::TypedBuilder;
use uuid::Uuid;

use acctstack_core::{AccountId, AwsRegion, RoleArn};
use acctstack_deploy_model::{
    DeploymentWorkflow, EnrollAccountRequest, EnrollmentRecord, ParallelExecutionInput, StackRef,
};

use crate::config::DeployConfig;
use crate::error::{DeployError, DeployResult, ServiceError};
use crate::policy::{BucketPolicyStore, PatchMode, StatementPatch, patch_bucket_policy};
use crate::workflow::WorkflowExecutor;

/// Capability acknowledged for the base template.
pub const CAPABILITY_NAMED_IAM: &str = "CAPABILITY_NAMED_IAM";

/// The account table (DynamoDB).
#[async_trait]
pub trait AccountRegistry: Send + Sync + fmt::Debug {
    /// Create or replace the account's item.
    async fn put_account(
        &self,
        table: &str,
        account_id: &AccountId,
        role_arn: &RoleArn,
    ) -> Result<(), ServiceError>;

    /// Record the deployment started for the account.
    async fn record_workflow(
        &self,
        table: &str,
        account_id: &AccountId,
        workflow_arn: &str,
        started: DateTime<Utc>,
    ) -> Result<(), ServiceError>;
}

/// Enabled regions (EC2 `DescribeRegions`).
#[async_trait]
pub trait RegionLister: Send + Sync + fmt::Debug {
    /// Regions to deploy into.
    async fn list_regions(&self) -> Result<Vec<AwsRegion>, ServiceError>;
}

/// The `enroll-account` handler.
#[derive(Debug, Clone, TypedBuilder)]
pub struct Enroller {
    config: DeployConfig,
    registry: Arc<dyn AccountRegistry>,
    policies: Arc<dyn BucketPolicyStore>,
    regions: Arc<dyn RegionLister>,
    executor: Arc<dyn WorkflowExecutor>,
}

impl Enroller {
    /// Enroll the account owning `request.role_arn`.
    pub async fn enroll(&self, request: &EnrollAccountRequest) -> DeployResult<EnrollmentRecord> {
        self.enroll_with_token(request, &execution_token()).await
    }

    async fn enroll_with_token(
        &self,
        request: &EnrollAccountRequest,
        token: &str,
    ) -> DeployResult<EnrollmentRecord> {
        let role_arn = &request.role_arn;
        let account_id = role_arn.account_id();
        let table = &self.config.account_table;

        self.registry
            .put_account(table, account_id, role_arn)
            .await
            .map_err(|e| DeployError::service("PutItem", e))?;
        info!(account_id = %account_id, role_arn = %role_arn, "account recorded");

        for (bucket, patch) in self.bucket_patches(account_id) {
            patch_bucket_policy(self.policies.as_ref(), bucket, &patch, PatchMode::Grant).await?;
        }

        let regions = self
            .regions
            .list_regions()
            .await
            .map_err(|e| DeployError::service("DescribeRegions", e))?;
        let input = ParallelExecutionInput {
            state_machine_arn: self.config.deploy_template_state_machine_arn.clone(),
            workflows: self.deployment_workflows(role_arn, &regions, token),
        };

        let name = format!("Deploy_{}_{account_id}_{token}", self.config.stack_name);
        let execution = self
            .executor
            .start_execution(
                &self.config.parallel_execution_state_machine_arn,
                &name,
                serde_json::to_string(&input)?,
            )
            .await
            .map_err(|e| DeployError::service("StartExecution", e))?;

        self.registry
            .record_workflow(
                table,
                account_id,
                &execution.execution_arn,
                execution.started_at,
            )
            .await
            .map_err(|e| DeployError::service("UpdateItem", e))?;

        info!(
            account_id = %account_id,
            regions = regions.len(),
            workflow_arn = %execution.execution_arn,
            "account enrollment started"
        );

        Ok(EnrollmentRecord {
            account_id: account_id.clone(),
            role_arn: role_arn.clone(),
            workflow_arn: execution.execution_arn,
            started: execution.started_at,
        })
    }

    fn bucket_patches(&self, account_id: &AccountId) -> [(&str, StatementPatch); 3] {
        let logs = |bucket: &str| format!("arn:aws:s3:::{bucket}/AWSLogs/{account_id}/*");
        let config = &self.config;
        [
            (
                config.cloudtrail_bucket.as_str(),
                StatementPatch::service_put_object(
                    "cloudtrail.amazonaws.com",
                    logs(&config.cloudtrail_bucket),
                ),
            ),
            (
                config.config_bucket.as_str(),
                StatementPatch::service_put_object(
                    "config.amazonaws.com",
                    logs(&config.config_bucket),
                ),
            ),
            (
                config.dist_bucket.as_str(),
                StatementPatch::account_get_object(account_id.root_principal_arn()),
            ),
        ]
    }

    /// One base-template deployment per region.
    #[must_use]
    pub fn deployment_workflows(
        &self,
        role_arn: &RoleArn,
        regions: &[AwsRegion],
        token: &str,
    ) -> Vec<DeploymentWorkflow> {
        let config = &self.config;
        let account_id = role_arn.account_id();
        let parameters = BTreeMap::from([
            (
                "ExternalCloudTrailBucket".to_owned(),
                config.cloudtrail_bucket.clone(),
            ),
            ("ExternalConfigBucket".to_owned(), config.config_bucket.clone()),
            (
                "EventsSNSNotificationURL".to_owned(),
                config.events_sns_notification_url.clone(),
            ),
            (
                "ConfigSNSNotificationURL".to_owned(),
                config.config_sns_notification_url.clone(),
            ),
            (
                "CloudTrailSNSNotificationURL".to_owned(),
                config.cloudtrail_sns_notification_url.clone(),
            ),
            (
                "ManagementAccountID".to_owned(),
                config.management_account_id.clone(),
            ),
        ]);

        regions
            .iter()
            .map(|region| DeploymentWorkflow {
                execution_name: format!(
                    "Deploy_{}_{account_id}_{region}_{token}",
                    config.stack_name
                ),
                role_arn: role_arn.clone(),
                region: region.clone(),
                template_url: config.template_url(),
                parameters: parameters.clone(),
                capabilities: vec![CAPABILITY_NAMED_IAM.to_owned()],
                stack: StackRef::named(&config.stack_name),
            })
            .collect()
    }
}

/// 16 uppercase hex characters, unique per enrollment.
fn execution_token() -> String {
    let mut token = Uuid::new_v4().simple().to_string();
    token.truncate(16);
    token.make_ascii_uppercase();
    token
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use dashmap::DashMap;
    use parking_lot::Mutex;
    use serde_json::json;

    use acctstack_deploy_model::StartedExecution;

    use super::*;
    use crate::config::test_config;
    use crate::testing::InMemoryPolicies;
    use crate::workflow::ExecutionDetails;

    #[derive(Debug, Default)]
    struct InMemoryAccounts {
        items: DashMap<String, BTreeMap<&'static str, String>>,
    }

    #[async_trait]
    impl AccountRegistry for InMemoryAccounts {
        async fn put_account(
            &self,
            _table: &str,
            account_id: &AccountId,
            role_arn: &RoleArn,
        ) -> Result<(), ServiceError> {
            self.items.insert(
                account_id.to_string(),
                BTreeMap::from([("RoleARN", role_arn.to_string())]),
            );
            Ok(())
        }

        async fn record_workflow(
            &self,
            _table: &str,
            account_id: &AccountId,
            workflow_arn: &str,
            started: DateTime<Utc>,
        ) -> Result<(), ServiceError> {
            let mut item = self
                .items
                .get_mut(account_id.as_str())
                .ok_or_else(|| ServiceError::message("item missing"))?;
            item.insert("WorkflowARN", workflow_arn.to_owned());
            item.insert("Started", started.to_rfc3339());
            Ok(())
        }
    }

    #[derive(Debug)]
    struct FixedRegions(Vec<&'static str>);

    #[async_trait]
    impl RegionLister for FixedRegions {
        async fn list_regions(&self) -> Result<Vec<AwsRegion>, ServiceError> {
            Ok(self.0.iter().map(|r| AwsRegion::new(*r)).collect())
        }
    }

    #[derive(Debug, Default)]
    struct RecordingExecutor {
        started: Mutex<Vec<(String, String, serde_json::Value)>>,
    }

    #[async_trait]
    impl WorkflowExecutor for RecordingExecutor {
        async fn start_execution(
            &self,
            state_machine_arn: &str,
            name: &str,
            input: String,
        ) -> Result<StartedExecution, ServiceError> {
            let input = serde_json::from_str(&input)
                .map_err(|e| ServiceError::new("InvalidExecutionInput", e.to_string()))?;
            self.started
                .lock()
                .push((state_machine_arn.to_owned(), name.to_owned(), input));
            Ok(StartedExecution {
                execution_arn: format!("arn:aws:states:us-east-1:111111111111:execution:parallel:{name}"),
                started_at: Utc.with_ymd_and_hms(2026, 10, 17, 8, 0, 0).unwrap(),
            })
        }

        async fn describe_execution(
            &self,
            execution_arn: &str,
        ) -> Result<ExecutionDetails, ServiceError> {
            Err(ServiceError::new("ExecutionDoesNotExist", execution_arn))
        }
    }

    struct Fixture {
        accounts: Arc<InMemoryAccounts>,
        policies: Arc<InMemoryPolicies>,
        executor: Arc<RecordingExecutor>,
        enroller: Enroller,
    }

    fn fixture() -> Fixture {
        let accounts = Arc::new(InMemoryAccounts::default());
        let policies = Arc::new(InMemoryPolicies::default());
        policies.policies.insert(
            "org-dist".to_owned(),
            json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Sid": "GetObject",
                    "Effect": "Allow",
                    "Principal": { "AWS": "arn:aws:iam::111111111111:root" },
                    "Action": "s3:GetObject",
                    "Resource": "arn:aws:s3:::org-dist/*"
                }]
            })
            .to_string(),
        );
        let executor = Arc::new(RecordingExecutor::default());
        let enroller = Enroller::builder()
            .config(test_config())
            .registry(accounts.clone())
            .policies(policies.clone())
            .regions(Arc::new(FixedRegions(vec!["us-east-1", "eu-west-1"])))
            .executor(executor.clone())
            .build();
        Fixture {
            accounts,
            policies,
            executor,
            enroller,
        }
    }

    fn request() -> EnrollAccountRequest {
        EnrollAccountRequest {
            role_arn: RoleArn::parse("arn:aws:iam::123456789012:role/OrgAccess").unwrap(),
        }
    }

    #[tokio::test]
    async fn test_should_enroll_account_end_to_end() {
        let f = fixture();
        let record = f
            .enroller
            .enroll_with_token(&request(), "TOKEN")
            .await
            .unwrap();

        assert_eq!(record.account_id.as_str(), "123456789012");
        assert!(record.workflow_arn.ends_with("Deploy_acctstack-base_123456789012_TOKEN"));

        let item = f.accounts.items.get("123456789012").unwrap();
        assert_eq!(item["RoleARN"], "arn:aws:iam::123456789012:role/OrgAccess");
        assert_eq!(item["WorkflowARN"], record.workflow_arn);
        assert_eq!(item["Started"], "2026-10-17T08:00:00+00:00");

        let started = f.executor.started.lock();
        let (state_machine, name, input) = &started[0];
        assert_eq!(
            state_machine,
            "arn:aws:states:us-east-1:111111111111:stateMachine:parallel"
        );
        assert_eq!(name, "Deploy_acctstack-base_123456789012_TOKEN");
        assert_eq!(
            input["StateMachineArn"],
            "arn:aws:states:us-east-1:111111111111:stateMachine:deploy"
        );
        assert_eq!(input["Workflows"].as_array().unwrap().len(), 2);
        assert_eq!(
            input["Workflows"][1]["ExecutionName"],
            "Deploy_acctstack-base_123456789012_eu-west-1_TOKEN"
        );
    }

    #[tokio::test]
    async fn test_should_open_buckets_to_enrolled_account() {
        let f = fixture();
        f.enroller
            .enroll_with_token(&request(), "TOKEN")
            .await
            .unwrap();

        let trail = f.policies.document("org-cloudtrail");
        assert_eq!(
            trail["Statement"][0]["Resource"],
            json!(["arn:aws:s3:::org-cloudtrail/AWSLogs/123456789012/*"])
        );
        assert_eq!(
            trail["Statement"][0]["Principal"]["Service"],
            json!(["cloudtrail.amazonaws.com"])
        );

        let config = f.policies.document("org-config");
        assert_eq!(
            config["Statement"][0]["Principal"]["Service"],
            json!(["config.amazonaws.com"])
        );

        let dist = f.policies.document("org-dist");
        assert_eq!(
            dist["Statement"][0]["Principal"]["AWS"],
            json!([
                "arn:aws:iam::111111111111:root",
                "arn:aws:iam::123456789012:root"
            ])
        );
    }

    #[test]
    fn test_should_build_workflow_per_region() {
        let f = fixture();
        let role_arn = request().role_arn;
        let workflows = f.enroller.deployment_workflows(
            &role_arn,
            &[AwsRegion::new("ap-northeast-1")],
            "TOKEN",
        );

        let value = serde_json::to_value(&workflows[0]).unwrap();
        assert_eq!(
            value,
            json!({
                "ExecutionName": "Deploy_acctstack-base_123456789012_ap-northeast-1_TOKEN",
                "RoleARN": "arn:aws:iam::123456789012:role/OrgAccess",
                "Region": "ap-northeast-1",
                "TemplateURL": "https://s3.amazonaws.com/org-dist/base.yaml",
                "Parameters": {
                    "ExternalCloudTrailBucket": "org-cloudtrail",
                    "ExternalConfigBucket": "org-config",
                    "EventsSNSNotificationURL": "https://hooks.example.com/events",
                    "ConfigSNSNotificationURL": "https://hooks.example.com/config",
                    "CloudTrailSNSNotificationURL": "https://hooks.example.com/cloudtrail",
                    "ManagementAccountID": "111111111111"
                },
                "Capabilities": ["CAPABILITY_NAMED_IAM"],
                "Stack": { "StackName": "acctstack-base" }
            })
        );
    }

    #[tokio::test]
    async fn test_should_fail_when_dist_statement_is_missing() {
        let f = fixture();
        f.policies.policies.remove("org-dist");
        let err = f
            .enroller
            .enroll_with_token(&request(), "TOKEN")
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Policy { ref bucket, .. } if bucket == "org-dist"));
        assert!(f.executor.started.lock().is_empty());
    }

    #[tokio::test]
    async fn test_should_revoke_enrollment_patches() {
        let f = fixture();
        f.enroller
            .enroll_with_token(&request(), "TOKEN")
            .await
            .unwrap();
        for (bucket, patch) in f.enroller.bucket_patches(request().role_arn.account_id()) {
            patch_bucket_policy(f.policies.as_ref(), bucket, &patch, PatchMode::Revoke)
                .await
                .unwrap();
        }

        assert!(!f.policies.policies.contains_key("org-cloudtrail"));
        assert!(!f.policies.policies.contains_key("org-config"));
        let dist = f.policies.document("org-dist");
        assert_eq!(
            dist["Statement"][0]["Principal"]["AWS"],
            json!(["arn:aws:iam::111111111111:root"])
        );
        assert_eq!(dist["Statement"][0]["Resource"], json!(["arn:aws:s3:::org-dist/*"]));
    }

    #[test]
    fn test_should_generate_distinct_tokens() {
        let a = execution_token();
        let b = execution_token();
        assert_eq!(a.len(), 16);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }
}
