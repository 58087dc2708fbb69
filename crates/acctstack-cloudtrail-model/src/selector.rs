//! Trail event selector wire types.
//!
//! These mirror the `EventSelectors` member of the CloudTrail
//! `GetEventSelectors` response and `PutEventSelectors` request.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Read/write partition of an event selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReadWriteType {
    /// Read-only API calls.
    ReadOnly,
    /// Mutating API calls.
    WriteOnly,
    /// Both read and write API calls.
    All,
}

impl ReadWriteType {
    /// All read/write types, in wire order.
    pub const ALL: [Self; 3] = [Self::ReadOnly, Self::WriteOnly, Self::All];

    /// Returns the wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadOnly => "ReadOnly",
            Self::WriteOnly => "WriteOnly",
            Self::All => "All",
        }
    }

    /// Parse a wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ReadOnly" => Some(Self::ReadOnly),
            "WriteOnly" => Some(Self::WriteOnly),
            "All" => Some(Self::All),
            _ => None,
        }
    }
}

impl fmt::Display for ReadWriteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A data resource logged by a selector, e.g. S3 object prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataResource {
    /// Resource type, e.g. `AWS::S3::Object` or `AWS::Lambda::Function`.
    #[serde(rename = "Type")]
    pub resource_type: String,

    /// ARN prefixes of the resources.
    #[serde(default)]
    pub values: Vec<String>,
}

/// A single event selector record.
///
/// `ReadWriteType` and `IncludeManagementEvents` are optional on the wire;
/// CloudTrail treats absence as `All` and `true` respectively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventSelector {
    /// The read/write partition this record applies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_write_type: Option<ReadWriteType>,

    /// Whether management events are captured under this partition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_management_events: Option<bool>,

    /// Data resources logged under this partition.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_resources: Vec<DataResource>,

    /// Event sources excluded from management event logging, e.g.
    /// `kms.amazonaws.com`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_management_event_sources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_should_deserialize_get_event_selectors_record() {
        let record: EventSelector = serde_json::from_value(json!({
            "ReadWriteType": "WriteOnly",
            "IncludeManagementEvents": false,
            "DataResources": [
                { "Type": "AWS::S3::Object", "Values": ["arn:aws:s3:::logs/"] }
            ],
            "ExcludeManagementEventSources": []
        }))
        .unwrap();

        assert_eq!(record.read_write_type, Some(ReadWriteType::WriteOnly));
        assert_eq!(record.include_management_events, Some(false));
        assert_eq!(record.data_resources[0].resource_type, "AWS::S3::Object");
        assert_eq!(record.data_resources[0].values, vec!["arn:aws:s3:::logs/"]);
    }

    #[test]
    fn test_should_omit_empty_members_when_serializing() {
        let record = EventSelector {
            read_write_type: Some(ReadWriteType::All),
            include_management_events: Some(true),
            ..Default::default()
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({ "ReadWriteType": "All", "IncludeManagementEvents": true })
        );
    }

    #[test]
    fn test_should_reject_unknown_read_write_type() {
        let result = serde_json::from_value::<EventSelector>(json!({ "ReadWriteType": "Sometimes" }));
        assert!(result.is_err());
        assert_eq!(ReadWriteType::from_name("Sometimes"), None);
    }

    #[test]
    fn test_should_round_trip_read_write_type_names() {
        for rw in ReadWriteType::ALL {
            assert_eq!(ReadWriteType::from_name(rw.as_str()), Some(rw));
        }
    }
}
