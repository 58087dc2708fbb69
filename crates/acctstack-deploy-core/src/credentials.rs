//! Cross-account role assumption and credential encryption.
//!
//! Credentials leave the `assume-role` step with the secret access key
//! encrypted under the deployment KMS key and base64-encoded. Later steps
//! decrypt it just before opening a session in the target account.

use std::fmt;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::info;

use acctstack_core::RoleArn;
use acctstack_deploy_model::{AssumeRoleRequest, EncryptedCredentials};

use crate::error::{DeployError, DeployResult, ServiceError};

/// STS limit on `RoleSessionName`.
const MAX_SESSION_NAME_LEN: usize = 64;

/// Plaintext temporary credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct TemporaryCredentials {
    /// Access key ID.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Session token.
    pub session_token: String,
}

impl fmt::Debug for TemporaryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporaryCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"...")
            .field("session_token", &"...")
            .finish()
    }
}

/// Issues temporary credentials for a role (STS `AssumeRole`).
#[async_trait]
pub trait RoleAssumer: Send + Sync + fmt::Debug {
    /// Assume `role_arn` with the given session name.
    async fn assume_role(
        &self,
        role_arn: &RoleArn,
        session_name: &str,
    ) -> Result<TemporaryCredentials, ServiceError>;
}

/// Symmetric encryption of small secrets (KMS `Encrypt` / `Decrypt`).
#[async_trait]
pub trait SecretCipher: Send + Sync + fmt::Debug {
    /// Encrypt `plaintext` under `key_id`.
    async fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<Vec<u8>, ServiceError>;

    /// Decrypt ciphertext produced by [`SecretCipher::encrypt`].
    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, ServiceError>;
}

/// Assume the requested role and encrypt the resulting secret key.
pub async fn assume_role(
    assumer: &dyn RoleAssumer,
    cipher: &dyn SecretCipher,
    key_id: &str,
    request: &AssumeRoleRequest,
) -> DeployResult<EncryptedCredentials> {
    let session_name = session_name(&request.execution_name);
    let credentials = assumer
        .assume_role(&request.role_arn, session_name)
        .await
        .map_err(|e| DeployError::service("AssumeRole", e))?;

    let ciphertext = cipher
        .encrypt(key_id, credentials.secret_access_key.as_bytes())
        .await
        .map_err(|e| DeployError::service("Encrypt", e))?;

    info!(
        role_arn = %request.role_arn,
        session_name,
        access_key_id = %credentials.access_key_id,
        "assumed role"
    );

    Ok(EncryptedCredentials {
        access_key_id: credentials.access_key_id,
        secret_access_key_ciphertext: STANDARD.encode(ciphertext),
        session_token: credentials.session_token,
    })
}

/// Decrypt credentials produced by [`assume_role`].
pub async fn decrypt_credentials(
    cipher: &dyn SecretCipher,
    credentials: &EncryptedCredentials,
) -> DeployResult<TemporaryCredentials> {
    let ciphertext = STANDARD
        .decode(&credentials.secret_access_key_ciphertext)
        .map_err(|e| DeployError::Ciphertext(e.to_string()))?;
    let plaintext = cipher
        .decrypt(&ciphertext)
        .await
        .map_err(|e| DeployError::service("Decrypt", e))?;
    let secret_access_key =
        String::from_utf8(plaintext).map_err(|e| DeployError::Ciphertext(e.to_string()))?;

    Ok(TemporaryCredentials {
        access_key_id: credentials.access_key_id.clone(),
        secret_access_key,
        session_token: credentials.session_token.clone(),
    })
}

fn session_name(execution_name: &str) -> &str {
    match execution_name.char_indices().nth(MAX_SESSION_NAME_LEN) {
        Some((idx, _)) => &execution_name[..idx],
        None => execution_name,
    }
}
