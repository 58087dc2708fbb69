//! CloudFormation custom resource protocol.
//!
//! CloudFormation invokes the function with a [`CustomResourceRequest`] and
//! waits for a [`CustomResourceResponse`] to be `PUT` to the pre-signed
//! `ResponseURL`. The function's own return value is ignored.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle operation requested by CloudFormation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    /// The resource is being created.
    Create,
    /// The resource's properties changed.
    Update,
    /// The resource is being deleted (or replaced).
    Delete,
}

impl RequestType {
    /// Returns the wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Custom resource invocation event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceRequest {
    /// Requested operation.
    pub request_type: RequestType,

    /// Pre-signed S3 URL the response must be uploaded to.
    #[serde(rename = "ResponseURL")]
    pub response_url: String,

    /// ARN of the stack owning the resource.
    pub stack_id: String,

    /// Unique request identifier.
    pub request_id: String,

    /// Template resource type, e.g. `Custom::CloudTrailEventSelector`.
    #[serde(default)]
    pub resource_type: String,

    /// Logical ID of the resource in the template.
    pub logical_resource_id: String,

    /// Physical ID reported by a previous response (Update and Delete only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,

    /// Current resource properties.
    #[serde(default)]
    pub resource_properties: serde_json::Value,

    /// Previous resource properties (Update only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_resource_properties: Option<serde_json::Value>,
}

/// Outcome reported to CloudFormation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    /// The operation succeeded.
    Success,
    /// The operation failed; `Reason` explains why.
    Failed,
}

/// Response document uploaded to the request's `ResponseURL`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceResponse {
    /// Outcome.
    pub status: ResponseStatus,
    /// Human-readable explanation, shown in stack events.
    pub reason: String,
    /// Physical ID of the resource.
    pub physical_resource_id: String,
    /// Echoed from the request.
    pub stack_id: String,
    /// Echoed from the request.
    pub request_id: String,
    /// Echoed from the request.
    pub logical_resource_id: String,
    /// Whether `Data` must be masked in the console.
    pub no_echo: bool,
    /// Attributes available to `Fn::GetAtt`.
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl CustomResourceResponse {
    /// Build a response to `request` with an empty data payload.
    #[must_use]
    pub fn for_request(
        request: &CustomResourceRequest,
        status: ResponseStatus,
        reason: impl Into<String>,
        physical_resource_id: impl Into<String>,
    ) -> Self {
        Self {
            status,
            reason: reason.into(),
            physical_resource_id: physical_resource_id.into(),
            stack_id: request.stack_id.clone(),
            request_id: request.request_id.clone(),
            logical_resource_id: request.logical_resource_id.clone(),
            no_echo: false,
            data: serde_json::Map::new(),
        }
    }
}
