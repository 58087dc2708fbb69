//! S3 bucket policy documents.
//!
//! IAM policy JSON allows a single value wherever a list is accepted
//! (`"Action": "s3:GetObject"` or `"Action": ["s3:GetObject"]`). [`OneOrMany`]
//! accepts both and always writes a list.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// The IAM policy language version written into new documents.
pub const POLICY_VERSION: &str = "2012-10-17";

/// A list that deserializes from either a single value or an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OneOrMany<T>(pub Vec<T>);

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for OneOrMany<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr<T> {
            Many(Vec<T>),
            One(T),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Many(values) => Self(values),
            Repr::One(value) => Self(vec![value]),
        })
    }
}

impl<T> OneOrMany<T> {
    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Statement principal: the `"*"` wildcard or principals keyed by type
/// (`AWS`, `Service`, `Federated`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Principal {
    /// `"Principal": "*"`.
    Wildcard(String),
    /// `"Principal": {"Service": [...]}`.
    Typed(BTreeMap<String, OneOrMany<String>>),
}

/// One policy statement. Keys this model does not name are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    /// Statement ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    /// `Allow` or `Deny`.
    pub effect: String,
    /// Principal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    /// Actions.
    #[serde(default, skip_serializing_if = "OneOrMany::is_empty")]
    pub action: OneOrMany<String>,
    /// Resources.
    #[serde(default, skip_serializing_if = "OneOrMany::is_empty")]
    pub resource: OneOrMany<String>,
    /// Condition block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<serde_json::Value>,
    /// `NotPrincipal`, `NotAction`, `NotResource`, and anything else.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A bucket policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    /// Policy language version.
    #[serde(default = "default_version")]
    pub version: String,
    /// Policy ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Statements.
    #[serde(default)]
    pub statement: OneOrMany<PolicyStatement>,
}

fn default_version() -> String {
    POLICY_VERSION.to_owned()
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self {
            version: default_version(),
            id: None,
            statement: OneOrMany::default(),
        }
    }
}

impl PolicyDocument {
    /// Find a statement by `Sid`.
    pub fn statement_mut(&mut self, sid: &str) -> Option<&mut PolicyStatement> {
        self.statement
            .0
            .iter_mut()
            .find(|s| s.sid.as_deref() == Some(sid))
    }
}
