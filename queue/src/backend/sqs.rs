use super::{MessageQueue, QueueMessage};
use crate::config::ReceiveOptions;
use crate::errors::{QueueError, Result};
use async_trait::async_trait;
use aws_sdk_sqs::Client;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::Message;

pub struct SqsQueue {
    client: Client,
    queue_url: String,
}

impl SqsQueue {
    pub fn new(client: Client, queue_url: impl Into<String>) -> Self {
        SqsQueue {
            client,
            queue_url: queue_url.into(),
        }
    }
}

fn queue_error<E: std::error::Error>(operation: &'static str, e: E) -> QueueError {
    QueueError::Queue {
        operation,
        message: DisplayErrorContext(e).to_string(),
    }
}

fn convert_message(message: &Message) -> QueueMessage {
    QueueMessage {
        message_id: message.message_id().map(String::from),
        receipt_handle: message.receipt_handle().map(String::from),
        md5_of_body: message.md5_of_body().map(String::from),
        body: message.body().map(String::from),
    }
}

#[async_trait]
impl MessageQueue for SqsQueue {
    fn name(&self) -> &'static str {
        "sqs"
    }

    async fn send(&self, body: &str) -> Result<String> {
        let output = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| queue_error("SendMessage", e))?;
        output
            .message_id()
            .map(String::from)
            .ok_or(QueueError::MissingMessageId)
    }

    async fn receive(&self, options: &ReceiveOptions) -> Result<Vec<QueueMessage>> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(options.max_messages)
            .visibility_timeout(options.visibility_timeout_secs)
            .wait_time_seconds(options.wait_time_secs)
            .send()
            .await
            .map_err(|e| queue_error("ReceiveMessage", e))?;
        Ok(output.messages().iter().map(convert_message).collect())
    }

    async fn delete(&self, receipt_handle: &str) -> Result<()> {
        match self
            .client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.as_service_error().is_some_and(|e| e.is_receipt_handle_is_invalid()) => {
                Err(QueueError::InvalidReceipt(receipt_handle.to_string()))
            }
            Err(e) => Err(queue_error("DeleteMessage", e)),
        }
    }

    async fn change_visibility(&self, receipt_handle: &str, timeout_secs: i32) -> Result<()> {
        match self
            .client
            .change_message_visibility()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .visibility_timeout(timeout_secs)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.as_service_error().is_some_and(|e| e.is_receipt_handle_is_invalid()) => {
                Err(QueueError::InvalidReceipt(receipt_handle.to_string()))
            }
            Err(e) => Err(queue_error("ChangeMessageVisibility", e)),
        }
    }
}
