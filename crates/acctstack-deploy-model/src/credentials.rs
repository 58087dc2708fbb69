//! Cross-account credentials as passed between workflow steps.

use std::fmt;

use serde::{Deserialize, Serialize};

use acctstack_core::RoleArn;

/// Input of the `assume-role` handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssumeRoleRequest {
    /// Role to assume in the target account.
    #[serde(rename = "RoleARN")]
    pub role_arn: RoleArn,
    /// Used as the role session name, so CloudTrail in the target account
    /// attributes calls to the workflow execution.
    pub execution_name: String,
}

/// Temporary credentials whose secret key is KMS-encrypted.
///
/// These travel through Step Functions execution history, so the secret
/// access key only ever appears as base64 ciphertext. The session token is
/// passed in the clear: its size is not bounded and can exceed the 4 KiB KMS
/// plaintext limit.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EncryptedCredentials {
    /// Access key ID.
    pub access_key_id: String,
    /// Base64-encoded KMS ciphertext of the secret access key.
    pub secret_access_key_ciphertext: String,
    /// Session token.
    pub session_token: String,
}

impl fmt::Debug for EncryptedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key_ciphertext", &"...")
            .field("session_token", &"...")
            .finish()
    }
}
