//! SNS messages delivered to the notification endpoint.

use serde::{Deserialize, Serialize};

/// The `Type` of an SNS message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnsMessageType {
    /// A message published to the topic.
    Notification,
    /// Sent once when the endpoint is subscribed; must be confirmed.
    SubscriptionConfirmation,
    /// Sent when the subscription is removed.
    UnsubscribeConfirmation,
}

impl SnsMessageType {
    /// The wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Notification => "Notification",
            Self::SubscriptionConfirmation => "SubscriptionConfirmation",
            Self::UnsubscribeConfirmation => "UnsubscribeConfirmation",
        }
    }
}

/// An SNS message as POSTed to an HTTP(S) subscription.
///
/// `Timestamp` is kept verbatim because it is part of the signed string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SnsMessage {
    /// Message type.
    #[serde(rename = "Type")]
    pub message_type: SnsMessageType,
    /// Unique message ID.
    pub message_id: String,
    /// Topic the message was published to.
    pub topic_arn: String,
    /// Optional subject of a notification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Message body.
    pub message: String,
    /// Publication time, ISO 8601.
    pub timestamp: String,
    /// `1` (SHA1withRSA) or `2` (SHA256withRSA).
    pub signature_version: String,
    /// Base64 signature over the canonical fields.
    pub signature: String,
    /// Location of the signing certificate.
    #[serde(rename = "SigningCertURL")]
    pub signing_cert_url: String,
    /// Confirmation link of a (un)subscribe message.
    #[serde(rename = "SubscribeURL", default, skip_serializing_if = "Option::is_none")]
    pub subscribe_url: Option<String>,
    /// Unsubscribe link of a notification.
    #[serde(rename = "UnsubscribeURL", default, skip_serializing_if = "Option::is_none")]
    pub unsubscribe_url: Option<String>,
    /// Subscription token of a (un)subscribe message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Output of the `sns-notification` handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NotificationReceipt {
    /// ID of the handled message.
    pub message_id: String,
    /// Its type.
    #[serde(rename = "Type")]
    pub message_type: SnsMessageType,
    /// Whether the subscription was confirmed by this invocation.
    pub subscription_confirmed: bool,
}
