//! KMS encryption of secret access keys.

use async_trait::async_trait;
use aws_sdk_kms::primitives::Blob;

use acctstack_deploy_core::{SecretCipher, ServiceError};

use super::service_error;

/// [`SecretCipher`] backed by KMS `Encrypt` / `Decrypt`.
#[derive(Debug, Clone)]
pub struct KmsCipher {
    client: aws_sdk_kms::Client,
}

impl KmsCipher {
    /// Wrap a KMS client.
    #[must_use]
    pub fn new(client: aws_sdk_kms::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretCipher for KmsCipher {
    async fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<Vec<u8>, ServiceError> {
        let output = self
            .client
            .encrypt()
            .key_id(key_id)
            .plaintext(Blob::new(plaintext))
            .send()
            .await
            .map_err(|e| service_error(&e))?;
        output
            .ciphertext_blob()
            .map(|b| b.as_ref().to_vec())
            .ok_or_else(|| ServiceError::message("Encrypt returned no ciphertext"))
    }

    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, ServiceError> {
        let output = self
            .client
            .decrypt()
            .ciphertext_blob(Blob::new(ciphertext))
            .send()
            .await
            .map_err(|e| service_error(&e))?;
        output
            .plaintext()
            .map(|b| b.as_ref().to_vec())
            .ok_or_else(|| ServiceError::message("Decrypt returned no plaintext"))
    }
}
