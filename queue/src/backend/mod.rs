pub mod memory;
pub mod sqs;

use crate::config::ReceiveOptions;
use crate::errors::Result;
use async_trait::async_trait;
use serde::Serialize;

pub use memory::MemoryQueue;
pub use sqs::SqsQueue;

/// One received message, with the field names the queue service uses.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueueMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Needed to delete the message or change its visibility
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_handle: Option<String>,
    #[serde(rename = "MD5OfBody", skip_serializing_if = "Option::is_none")]
    pub md5_of_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[async_trait]
pub trait MessageQueue: Send + Sync {
    fn name(&self) -> &'static str;

    /// Enqueues `body` and returns the new message id.
    async fn send(&self, body: &str) -> Result<String>;

    /// Hands out up to `options.max_messages` visible messages and hides
    /// them for the visibility timeout.
    async fn receive(&self, options: &ReceiveOptions) -> Result<Vec<QueueMessage>>;

    async fn delete(&self, receipt_handle: &str) -> Result<()>;

    async fn change_visibility(&self, receipt_handle: &str, timeout_secs: i32) -> Result<()>;
}
