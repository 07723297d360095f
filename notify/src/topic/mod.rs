pub mod memory;
pub mod sns;

use crate::errors::Result;
use async_trait::async_trait;
use serde::Serialize;

pub use memory::MemoryTopic;
pub use sns::SnsTopic;

/// One subscription as listed by the topic. Field names follow the
/// notification service's own listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Subscription {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_arn: Option<String>,
}

/// A single pub/sub topic.
#[async_trait]
pub trait NotificationTopic: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns the message id assigned by the topic, if any.
    async fn publish(&self, message: &str) -> Result<Option<String>>;

    async fn list_subscriptions(&self) -> Result<Vec<Subscription>>;

    /// Returns the new subscription's ARN. Subscriptions that still need
    /// confirmation may not have one yet.
    async fn subscribe(&self, protocol: &str, endpoint: &str) -> Result<Option<String>>;

    async fn unsubscribe(&self, subscription_arn: &str) -> Result<()>;
}
