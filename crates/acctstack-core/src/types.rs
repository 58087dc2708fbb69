//! Common AWS identifiers passed between onboarding steps.

use std::fmt;
use std::str::FromStr;

use crate::error::AcctStackError;

/// AWS Account ID (12-digit string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Create a new account ID from a string.
    ///
    /// # Errors
    /// Returns an error if the account ID is not a 12-digit numeric string.
    pub fn new(id: impl Into<String>) -> Result<Self, AcctStackError> {
        let id = id.into();
        if id.len() != 12 || !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(AcctStackError::InvalidAccountId(id));
        }
        Ok(Self(id))
    }

    /// Get the account ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// ARN of the account's root principal, as used in resource policies.
    #[must_use]
    pub fn root_principal_arn(&self) -> String {
        format!("arn:aws:iam::{}:root", self.0)
    }
}

impl TryFrom<String> for AccountId {
    type Error = AcctStackError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccountId> for String {
    fn from(value: AccountId) -> Self {
        value.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// AWS Region identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct AwsRegion(String);

impl AwsRegion {
    /// Region used when neither `AWS_REGION` nor `DEFAULT_REGION` is set.
    pub const DEFAULT: &'static str = "us-east-1";

    /// Create a new region.
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self(region.into())
    }

    /// Get the region as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AwsRegion {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for AwsRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// IAM role ARN of the form `arn:<partition>:iam::<account>:role/<path/name>`.
///
/// Enrollment derives the target account from the role it is handed, so the
/// account field is validated eagerly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleArn {
    arn: String,
    account_id: AccountId,
}

impl RoleArn {
    /// Parse a role ARN.
    ///
    /// # Errors
    /// Returns an error if the string is not an IAM role ARN or its account
    /// field is not a valid account ID.
    pub fn parse(arn: impl Into<String>) -> Result<Self, AcctStackError> {
        let arn = arn.into();
        let invalid = |reason| AcctStackError::InvalidRoleArn {
            arn: arn.clone(),
            reason,
        };

        let fields: Vec<&str> = arn.splitn(6, ':').collect();
        if fields.len() != 6 || fields[0] != "arn" {
            return Err(invalid("expected six colon-separated fields"));
        }
        if fields[2] != "iam" {
            return Err(invalid("not an IAM ARN"));
        }
        if !fields[5].starts_with("role/") {
            return Err(invalid("resource is not a role"));
        }
        let account_id =
            AccountId::new(fields[4]).map_err(|_| invalid("account field is not 12 digits"))?;

        Ok(Self { arn, account_id })
    }

    /// The account that owns the role.
    #[must_use]
    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Get the ARN as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.arn
    }
}

impl FromStr for RoleArn {
    type Err = AcctStackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RoleArn {
    type Error = AcctStackError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<RoleArn> for String {
    fn from(value: RoleArn) -> Self {
        value.arn
    }
}

impl fmt::Display for RoleArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.arn)
    }
}
