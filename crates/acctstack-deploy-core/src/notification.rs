//! SNS notification endpoint.
//!
//! Messages are authenticated the way SNS documents for HTTP(S)
//! subscriptions:
//!
//! 1. `SigningCertURL` must be an `https` URL on an `sns.<region>` host.
//! 2. The message must be at most an hour old.
//! 3. The signature over the canonical field string must verify against the
//!    certificate's public key (SHA1withRSA for version `1`, SHA256withRSA
//!    for version `2`).
//!
//! Certificates are fetched once per URL and cached for the lifetime of the
//! handler. A verified `SubscriptionConfirmation` is confirmed by fetching
//! its `SubscribeURL`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use aws_lc_rs::signature::{
    RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY, RSA_PKCS1_2048_8192_SHA256, UnparsedPublicKey,
    VerificationAlgorithm,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use tracing::{debug, info};
use x509_parser::pem::parse_x509_pem;

use acctstack_deploy_model::{NotificationReceipt, SnsMessage, SnsMessageType};

use crate::error::{DeployError, DeployResult, ServiceError};

/// Oldest message accepted, in seconds.
pub const MAX_MESSAGE_AGE_SECS: i64 = 3600;

/// Plain HTTP GET, used for signing certificates and subscription links.
#[async_trait]
pub trait UrlFetcher: Send + Sync + fmt::Debug {
    /// Fetch `url` and return the response body.
    async fn get(&self, url: &str) -> Result<Vec<u8>, ServiceError>;
}

/// Whether `url` points at an SNS signing certificate.
#[must_use]
pub fn is_signing_cert_url(url: &str) -> bool {
    let Some((host, path)) = url
        .strip_prefix("https://")
        .and_then(|rest| rest.split_once('/'))
    else {
        return false;
    };
    let region = host
        .strip_suffix(".amazonaws.com")
        .or_else(|| host.strip_suffix(".amazonaws.com.cn"))
        .and_then(|h| h.strip_prefix("sns."));

    region.is_some_and(|r| {
        !r.is_empty()
            && r
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    }) && path.ends_with(".pem")
        && !path.contains(['?', '#'])
}

/// The canonical string SNS signs for `message`.
#[must_use]
pub fn string_to_sign(message: &SnsMessage) -> String {
    let fields: Vec<(&str, Option<&str>)> = match message.message_type {
        SnsMessageType::Notification => vec![
            ("Message", Some(message.message.as_str())),
            ("MessageId", Some(message.message_id.as_str())),
            ("Subject", message.subject.as_deref()),
            ("Timestamp", Some(message.timestamp.as_str())),
            ("TopicArn", Some(message.topic_arn.as_str())),
            ("Type", Some(message.message_type.as_str())),
        ],
        SnsMessageType::SubscriptionConfirmation | SnsMessageType::UnsubscribeConfirmation => vec![
            ("Message", Some(message.message.as_str())),
            ("MessageId", Some(message.message_id.as_str())),
            ("SubscribeURL", message.subscribe_url.as_deref()),
            ("Timestamp", Some(message.timestamp.as_str())),
            ("Token", message.token.as_deref()),
            ("TopicArn", Some(message.topic_arn.as_str())),
            ("Type", Some(message.message_type.as_str())),
        ],
    };

    fields
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| format!("{name}\n{v}\n")))
        .collect()
}

/// Reject messages older than [`MAX_MESSAGE_AGE_SECS`] at `now`.
pub fn check_message_age(message: &SnsMessage, now: DateTime<Utc>) -> DeployResult<()> {
    let published = DateTime::parse_from_rfc3339(&message.timestamp)
        .map_err(|e| rejected(format!("invalid Timestamp {:?}: {e}", message.timestamp)))?;
    if now.signed_duration_since(published) > TimeDelta::seconds(MAX_MESSAGE_AGE_SECS) {
        return Err(rejected(format!("message expired at {}", message.timestamp)));
    }
    Ok(())
}

/// Verify the message signature against a PEM-encoded certificate.
pub fn verify_signature(message: &SnsMessage, certificate_pem: &[u8]) -> DeployResult<()> {
    let algorithm: &'static dyn VerificationAlgorithm = match message.signature_version.as_str() {
        "1" => &RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY,
        "2" => &RSA_PKCS1_2048_8192_SHA256,
        other => return Err(rejected(format!("unsupported SignatureVersion {other:?}"))),
    };
    let signature = STANDARD
        .decode(&message.signature)
        .map_err(|e| rejected(format!("Signature is not base64: {e}")))?;

    let (_, pem) = parse_x509_pem(certificate_pem)
        .map_err(|e| rejected(format!("signing certificate is not PEM: {e}")))?;
    let certificate = pem
        .parse_x509()
        .map_err(|e| rejected(format!("invalid signing certificate: {e}")))?;
    let public_key: &[u8] = &certificate.public_key().subject_public_key.data;

    UnparsedPublicKey::new(algorithm, public_key)
        .verify(string_to_sign(message).as_bytes(), &signature)
        .map_err(|_| rejected("signature mismatch".to_owned()))
}

fn rejected(reason: String) -> DeployError {
    DeployError::Notification(reason)
}

/// Handles messages POSTed by SNS to the notification endpoint.
#[derive(Debug)]
pub struct NotificationHandler {
    fetcher: Arc<dyn UrlFetcher>,
    certificates: DashMap<String, Arc<[u8]>>,
}

impl NotificationHandler {
    /// Create a handler fetching through `fetcher`.
    #[must_use]
    pub fn new(fetcher: Arc<dyn UrlFetcher>) -> Self {
        Self {
            fetcher,
            certificates: DashMap::new(),
        }
    }

    /// Authenticate `message` as of `now` and act on it.
    pub async fn handle(
        &self,
        message: &SnsMessage,
        now: DateTime<Utc>,
    ) -> DeployResult<NotificationReceipt> {
        if !is_signing_cert_url(&message.signing_cert_url) {
            return Err(rejected(format!(
                "untrusted SigningCertURL {}",
                message.signing_cert_url
            )));
        }
        check_message_age(message, now)?;
        let certificate = self.certificate(&message.signing_cert_url).await?;
        verify_signature(message, &certificate)?;

        let subscription_confirmed = match message.message_type {
            SnsMessageType::SubscriptionConfirmation => {
                let url = message.subscribe_url.as_deref().ok_or_else(|| {
                    DeployError::InvalidInput("SubscribeURL is missing".to_owned())
                })?;
                self.fetcher
                    .get(url)
                    .await
                    .map_err(|e| DeployError::service("ConfirmSubscription", e))?;
                info!(topic_arn = %message.topic_arn, "subscription confirmed");
                true
            }
            SnsMessageType::Notification | SnsMessageType::UnsubscribeConfirmation => {
                info!(
                    topic_arn = %message.topic_arn,
                    message_id = %message.message_id,
                    message_type = message.message_type.as_str(),
                    subject = message.subject.as_deref().unwrap_or_default(),
                    body = %message.message,
                    "notification received"
                );
                false
            }
        };

        Ok(NotificationReceipt {
            message_id: message.message_id.clone(),
            message_type: message.message_type,
            subscription_confirmed,
        })
    }

    async fn certificate(&self, url: &str) -> DeployResult<Arc<[u8]>> {
        if let Some(cached) = self.certificates.get(url) {
            return Ok(Arc::clone(cached.value()));
        }
        debug!(url, "fetching signing certificate");
        let body: Arc<[u8]> = self
            .fetcher
            .get(url)
            .await
            .map_err(|e| DeployError::service("GetSigningCertificate", e))?
            .into();
        self.certificates.insert(url.to_owned(), Arc::clone(&body));
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticFetcher;

    const CERT_URL: &str =
        "https://sns.us-east-1.amazonaws.com/SimpleNotificationService-f3ecfb7224c7233fe7bb5f59f96de52f.pem";
    const CERT_PEM: &str = include_str!("../fixtures/sns/signing-cert.pem");
    const CONFIRMATION: &str = include_str!("../fixtures/sns/subscription-confirmation.json");
    const NOTIFICATION: &str = include_str!("../fixtures/sns/notification.json");

    fn message(fixture: &str) -> SnsMessage {
        serde_json::from_str(fixture).unwrap()
    }

    fn now() -> DateTime<Utc> {
        "2026-10-17T08:10:00Z".parse().unwrap()
    }

    fn handler() -> (Arc<StaticFetcher>, NotificationHandler) {
        let fetcher = Arc::new(StaticFetcher::default());
        fetcher.respond(CERT_URL, CERT_PEM.as_bytes());
        (fetcher.clone(), NotificationHandler::new(fetcher))
    }

    #[tokio::test]
    async fn test_should_confirm_subscription() {
        let (fetcher, handler) = handler();
        let confirmation = message(CONFIRMATION);
        let subscribe_url = confirmation.subscribe_url.clone().unwrap();
        fetcher.respond(&subscribe_url, b"<ConfirmSubscriptionResponse/>");

        let receipt = handler.handle(&confirmation, now()).await.unwrap();

        assert!(receipt.subscription_confirmed);
        assert_eq!(receipt.message_type, SnsMessageType::SubscriptionConfirmation);
        assert_eq!(fetcher.requests(), vec![CERT_URL.to_owned(), subscribe_url]);
    }

    #[tokio::test]
    async fn test_should_accept_sha256_notification_and_reuse_certificate() {
        let (fetcher, handler) = handler();
        let notification = message(NOTIFICATION);

        for _ in 0..2 {
            let receipt = handler.handle(&notification, now()).await.unwrap();
            assert!(!receipt.subscription_confirmed);
            assert_eq!(receipt.message_id, notification.message_id);
        }
        assert_eq!(fetcher.requests(), vec![CERT_URL.to_owned()]);
    }

    #[tokio::test]
    async fn test_should_reject_tampered_message() {
        let (fetcher, handler) = handler();
        let mut confirmation = message(CONFIRMATION);
        confirmation.subscribe_url = Some("https://attacker.example/confirm".to_owned());

        let err = handler.handle(&confirmation, now()).await.unwrap_err();

        assert!(matches!(err, DeployError::Notification(ref r) if r == "signature mismatch"));
        assert_eq!(fetcher.requests(), vec![CERT_URL.to_owned()]);
    }

    #[tokio::test]
    async fn test_should_reject_untrusted_certificate_url_before_fetching() {
        let (fetcher, handler) = handler();
        let mut notification = message(NOTIFICATION);
        notification.signing_cert_url = "https://sns.us-east-1.evil.example/cert.pem".to_owned();

        let err = handler.handle(&notification, now()).await.unwrap_err();

        assert!(err.to_string().contains("untrusted SigningCertURL"));
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_should_reject_expired_message() {
        let (_, handler) = handler();
        let late = now() + TimeDelta::hours(2);
        let err = handler.handle(&message(NOTIFICATION), late).await.unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[tokio::test]
    async fn test_should_report_certificate_fetch_failure() {
        let handler = NotificationHandler::new(Arc::new(StaticFetcher::default()));
        let err = handler.handle(&message(NOTIFICATION), now()).await.unwrap_err();
        assert!(matches!(
            err,
            DeployError::Service { operation: "GetSigningCertificate", .. }
        ));
    }

    #[test]
    fn test_should_reject_unknown_signature_version() {
        let mut notification = message(NOTIFICATION);
        notification.signature_version = "3".to_owned();
        let err = verify_signature(&notification, CERT_PEM.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("SignatureVersion"));
    }

    #[test]
    fn test_should_build_canonical_string_without_absent_subject() {
        let mut notification = message(NOTIFICATION);
        notification.subject = None;
        let canonical = string_to_sign(&notification);
        assert!(canonical.starts_with("Message\n"));
        assert!(!canonical.contains("Subject\n"));
        assert!(canonical.ends_with("Type\nNotification\n"));
    }

    #[test]
    fn test_should_match_signing_certificate_urls() {
        assert!(is_signing_cert_url(CERT_URL));
        assert!(is_signing_cert_url(
            "https://sns.cn-north-1.amazonaws.com.cn/SimpleNotificationService-1.pem"
        ));
        assert!(!is_signing_cert_url(
            "http://sns.us-east-1.amazonaws.com/SimpleNotificationService-1.pem"
        ));
        assert!(!is_signing_cert_url("https://sns.amazonaws.com/cert.pem"));
        assert!(!is_signing_cert_url(
            "https://sns.us-east-1.amazonaws.com.evil.example/cert.pem"
        ));
        assert!(!is_signing_cert_url(
            "https://sns.us-east-1.amazonaws.com/cert.pem?x=1"
        ));
    }
}
