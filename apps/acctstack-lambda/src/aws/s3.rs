//! S3 bucket policies.

use async_trait::async_trait;
use aws_sdk_s3::error::ProvideErrorMetadata;

use acctstack_deploy_core::{BucketPolicyStore, ServiceError};

use super::service_error;

const NO_SUCH_BUCKET_POLICY: &str = "NoSuchBucketPolicy";

/// [`BucketPolicyStore`] backed by the S3 bucket policy APIs.
#[derive(Debug, Clone)]
pub struct S3PolicyStore {
    client: aws_sdk_s3::Client,
}

impl S3PolicyStore {
    /// Wrap an S3 client.
    #[must_use]
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BucketPolicyStore for S3PolicyStore {
    async fn get_policy(&self, bucket: &str) -> Result<Option<String>, ServiceError> {
        match self.client.get_bucket_policy().bucket(bucket).send().await {
            Ok(output) => Ok(output.policy().map(str::to_owned)),
            Err(e) if e.code() == Some(NO_SUCH_BUCKET_POLICY) => Ok(None),
            Err(e) => Err(service_error(&e)),
        }
    }

    async fn put_policy(&self, bucket: &str, policy: String) -> Result<(), ServiceError> {
        self.client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy)
            .send()
            .await
            .map_err(|e| service_error(&e))?;
        Ok(())
    }

    async fn delete_policy(&self, bucket: &str) -> Result<(), ServiceError> {
        self.client
            .delete_bucket_policy()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| service_error(&e))?;
        Ok(())
    }
}
