//! Declarative event selector configuration.
//!
//! A [`DesiredSpec`] is the `ResourceProperties` object of a
//! `Custom::CloudTrailEventSelector` resource:
//!
//! ```yaml
//! CloudTrailEventSelectors:
//!   Type: Custom::CloudTrailEventSelector
//!   Properties:
//!     ServiceToken: !GetAtt EventSelectorResourceFn.Arn
//!     TrailName: !Ref CloudTrail
//!     ManagementEventReadWriteType: All
//!     DataEventSelectors:
//!       All:
//!         'AWS::S3::Object':
//!           - !Sub 'arn:aws:s3:::${CloudTrailBucket}/'
//!       WriteOnly:
//!         'AWS::S3::Object':
//!           - !Sub 'arn:aws:s3:::${OtherBucket}/'
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::ReconcileError;
use crate::selector::ReadWriteType;

/// Desired data resources: read/write type -> resource type -> ARN prefixes.
pub type DataEventSelectors = BTreeMap<ReadWriteType, BTreeMap<String, BTreeSet<String>>>;

/// Where management events should be captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManagementEventSelection {
    /// Capture read-only management events.
    ReadOnly,
    /// Capture mutating management events.
    WriteOnly,
    /// Capture all management events.
    All,
    /// Capture no management events.
    None,
}

impl ManagementEventSelection {
    /// The selector partition that should carry the management flag, if any.
    #[must_use]
    pub fn read_write_type(self) -> Option<ReadWriteType> {
        match self {
            Self::ReadOnly => Some(ReadWriteType::ReadOnly),
            Self::WriteOnly => Some(ReadWriteType::WriteOnly),
            Self::All => Some(ReadWriteType::All),
            Self::None => None,
        }
    }
}

/// Desired event selector configuration for one trail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DesiredSpec {
    /// Name or ARN of the trail to reconcile.
    pub trail_name: String,

    /// Management event selection. Absent means "leave as is".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_event_read_write_type: Option<ManagementEventSelection>,

    /// Data event selectors contributed by this resource.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data_event_selectors: DataEventSelectors,
}

impl DesiredSpec {
    /// Parse and validate custom resource properties.
    ///
    /// Unknown properties such as `ServiceToken` are ignored; unknown
    /// read/write types and management selections are rejected.
    pub fn from_properties(properties: &serde_json::Value) -> Result<Self, ReconcileError> {
        let spec: Self = serde_json::from_value(properties.clone())
            .map_err(|e| ReconcileError::ValidationFailed(format!("invalid properties: {e}")))?;
        spec.validate()?;
        Ok(spec)
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ReconcileError> {
        if self.trail_name.trim().is_empty() {
            return Err(ReconcileError::ValidationFailed(
                "TrailName must not be empty".to_owned(),
            ));
        }
        for (rw, resources) in &self.data_event_selectors {
            if let Some(resource_type) = resources.keys().find(|t| t.trim().is_empty()) {
                return Err(ReconcileError::ValidationFailed(format!(
                    "empty resource type {resource_type:?} under {rw}"
                )));
            }
        }
        Ok(())
    }
}
