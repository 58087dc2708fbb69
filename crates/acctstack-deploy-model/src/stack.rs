//! CloudFormation stack handler payloads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use acctstack_core::AwsRegion;

use crate::credentials::EncryptedCredentials;

/// Stack identity. Describe prefers the ID when both are known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackRef {
    /// Stack name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_name: Option<String>,
    /// Stack ARN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
}

impl StackRef {
    /// Reference a stack by name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            stack_name: Some(name.into()),
            stack_id: None,
        }
    }

    /// The identifier to query with: the ID if known, else the name.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.stack_id.as_deref().or(self.stack_name.as_deref())
    }
}

/// Input of the `describe-stack` handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeStackRequest {
    /// Credentials for the target account.
    pub credentials: EncryptedCredentials,
    /// Region of the stack.
    pub region: AwsRegion,
    /// Stack to describe.
    pub stack: StackRef,
}

/// Input of the `update-stack` handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateStackRequest {
    /// Credentials for the target account.
    pub credentials: EncryptedCredentials,
    /// Region of the stack.
    pub region: AwsRegion,
    /// S3 URL of the template.
    #[serde(rename = "TemplateURL")]
    pub template_url: String,
    /// Stack to update (by name).
    pub stack: StackRef,
    /// Template parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    /// Acknowledged capabilities, e.g. `CAPABILITY_NAMED_IAM`.
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// Input of the `delete-stack` handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteStackRequest {
    /// Credentials for the target account.
    pub credentials: EncryptedCredentials,
    /// Region of the stack.
    pub region: AwsRegion,
    /// Stack to delete (by ID).
    pub stack: StackRef,
}

/// A stack parameter, as sent to `UpdateStack` or returned by
/// `DescribeStacks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackParameter {
    /// Parameter name.
    pub parameter_key: String,
    /// Parameter value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_value: Option<String>,
    /// Whether to reuse the current value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_previous_value: Option<bool>,
}

/// A stack output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackOutput {
    /// Output name.
    pub output_key: String,
    /// Output value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_value: Option<String>,
    /// Export name, if exported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_name: Option<String>,
}

/// A stack tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackTag {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}

/// The subset of `DescribeStacks` output the workflows consume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackDescription {
    /// Stack name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_name: Option<String>,
    /// Stack ARN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
    /// CloudFormation status, or `DOES_NOT_EXIST`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_status: Option<String>,
    /// Status reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_status_reason: Option<String>,
    /// Current parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<StackParameter>,
    /// Outputs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<StackOutput>,
    /// Tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<StackTag>,
    /// Capabilities.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<String>,
    /// SNS topics notified of stack events.
    #[serde(
        rename = "NotificationARNs",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub notification_arns: Vec<String>,
    /// Service role.
    #[serde(rename = "RoleARN", default, skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<String>,
    /// Change set the stack was last updated from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_set_id: Option<String>,
}

impl StackDescription {
    /// Status reported for stacks CloudFormation does not know about.
    pub const DOES_NOT_EXIST: &'static str = "DOES_NOT_EXIST";

    /// Description of a stack that does not exist.
    #[must_use]
    pub fn does_not_exist(stack_name: Option<String>) -> Self {
        Self {
            stack_name,
            stack_status: Some(Self::DOES_NOT_EXIST.to_owned()),
            ..Default::default()
        }
    }
}

/// Whether `UpdateStack` had anything to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateWarning {
    /// An update was started.
    None,
    /// The template and parameters were unchanged.
    NothingToUpdate,
}

/// Output of the `update-stack` handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateStackResponse {
    /// Stack ARN, when an update was started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
    /// Update outcome.
    pub warning: UpdateWarning,
}

/// Output of the `delete-stack` handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteStackResponse {
    /// Request ID of the `DeleteStack` call.
    pub request_id: String,
}
