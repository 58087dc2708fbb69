//! EC2 region discovery.

use async_trait::async_trait;

use acctstack_core::AwsRegion;
use acctstack_deploy_core::{RegionLister, ServiceError};

use super::service_error;

/// [`RegionLister`] backed by `DescribeRegions`.
#[derive(Debug, Clone)]
pub struct Ec2RegionLister {
    client: aws_sdk_ec2::Client,
}

impl Ec2RegionLister {
    /// Wrap an EC2 client.
    #[must_use]
    pub fn new(client: aws_sdk_ec2::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RegionLister for Ec2RegionLister {
    async fn list_regions(&self) -> Result<Vec<AwsRegion>, ServiceError> {
        let output = self
            .client
            .describe_regions()
            .send()
            .await
            .map_err(|e| service_error(&e))?;
        Ok(output
            .regions()
            .iter()
            .filter_map(|r| r.region_name())
            .map(AwsRegion::new)
            .collect())
    }
}
