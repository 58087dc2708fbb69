//! In-memory collaborators shared by the unit tests.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;

use crate::credentials::SecretCipher;
use crate::error::ServiceError;
use crate::notification::UrlFetcher;
use crate::policy::BucketPolicyStore;

/// Reversible stand-in for KMS.
#[derive(Debug, Default)]
pub(crate) struct XorCipher {
    keys: Mutex<Vec<String>>,
}

impl XorCipher {
    pub(crate) fn apply(bytes: &[u8]) -> Vec<u8> {
        bytes.iter().map(|b| b ^ 0x5a).collect()
    }

    pub(crate) fn keys_used(&self) -> Vec<String> {
        self.keys.lock().clone()
    }
}

#[async_trait]
impl SecretCipher for XorCipher {
    async fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<Vec<u8>, ServiceError> {
        self.keys.lock().push(key_id.to_owned());
        Ok(Self::apply(plaintext))
    }

    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, ServiceError> {
        Ok(Self::apply(ciphertext))
    }
}

/// Bucket policies keyed by bucket name.
#[derive(Debug, Default)]
pub(crate) struct InMemoryPolicies {
    pub(crate) policies: DashMap<String, String>,
}

impl InMemoryPolicies {
    pub(crate) fn document(&self, bucket: &str) -> Value {
        serde_json::from_str(self.policies.get(bucket).unwrap().as_str()).unwrap()
    }
}

#[async_trait]
impl BucketPolicyStore for InMemoryPolicies {
    async fn get_policy(&self, bucket: &str) -> Result<Option<String>, ServiceError> {
        Ok(self.policies.get(bucket).map(|p| p.clone()))
    }

    async fn put_policy(&self, bucket: &str, policy: String) -> Result<(), ServiceError> {
        self.policies.insert(bucket.to_owned(), policy);
        Ok(())
    }

    async fn delete_policy(&self, bucket: &str) -> Result<(), ServiceError> {
        self.policies.remove(bucket);
        Ok(())
    }
}

/// Canned HTTP responses; unknown URLs answer 404.
#[derive(Debug, Default)]
pub(crate) struct StaticFetcher {
    responses: DashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub(crate) fn respond(&self, url: &str, body: &[u8]) {
        self.responses.insert(url.to_owned(), body.to_vec());
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl UrlFetcher for StaticFetcher {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ServiceError> {
        self.requests.lock().push(url.to_owned());
        self.responses
            .get(url)
            .map(|body| body.clone())
            .ok_or_else(|| ServiceError::new("404", format!("no response for {url}")))
    }
}
