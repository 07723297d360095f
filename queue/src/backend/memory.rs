use super::{MessageQueue, QueueMessage};
use crate::config::ReceiveOptions;
use crate::errors::{QueueError, Result};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// In-process queue with visibility timeouts. Receiving never waits.
#[derive(Default)]
pub struct MemoryQueue {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    messages: Vec<Stored>,
    next_id: u64,
}

struct Stored {
    id: String,
    body: String,
    visible_at: Instant,
    /// Handle from the latest receive; older handles are no longer valid
    receipt_handle: Option<String>,
}

fn after(now: Instant, secs: i32) -> Instant {
    now + Duration::from_secs(u64::try_from(secs).unwrap_or(0))
}

impl MemoryQueue {
    /// Messages not yet deleted, visible or not.
    pub fn len(&self) -> usize {
        self.state().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn by_receipt(&mut self, receipt_handle: &str) -> Result<usize> {
        self.messages
            .iter()
            .position(|m| m.receipt_handle.as_deref() == Some(receipt_handle))
            .ok_or_else(|| QueueError::InvalidReceipt(receipt_handle.to_string()))
    }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn send(&self, body: &str) -> Result<String> {
        let mut state = self.state();
        let id = state.next_id("msg");
        state.messages.push(Stored {
            id: id.clone(),
            body: body.to_string(),
            visible_at: Instant::now(),
            receipt_handle: None,
        });
        Ok(id)
    }

    async fn receive(&self, options: &ReceiveOptions) -> Result<Vec<QueueMessage>> {
        let now = Instant::now();
        let limit = usize::try_from(options.max_messages).unwrap_or(0);
        let mut state = self.state();

        let visible: Vec<usize> = state
            .messages
            .iter()
            .enumerate()
            .filter(|(_, m)| m.visible_at <= now)
            .map(|(i, _)| i)
            .take(limit)
            .collect();

        let mut received = Vec::with_capacity(visible.len());
        for i in visible {
            let receipt_handle = state.next_id("rh");
            let message = &mut state.messages[i];
            message.visible_at = after(now, options.visibility_timeout_secs);
            message.receipt_handle = Some(receipt_handle.clone());
            received.push(QueueMessage {
                message_id: Some(message.id.clone()),
                receipt_handle: Some(receipt_handle),
                md5_of_body: None,
                body: Some(message.body.clone()),
            });
        }
        Ok(received)
    }

    async fn delete(&self, receipt_handle: &str) -> Result<()> {
        let mut state = self.state();
        let index = state.by_receipt(receipt_handle)?;
        state.messages.remove(index);
        Ok(())
    }

    async fn change_visibility(&self, receipt_handle: &str, timeout_secs: i32) -> Result<()> {
        let mut state = self.state();
        let index = state.by_receipt(receipt_handle)?;
        state.messages[index].visible_at = after(Instant::now(), timeout_secs);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(max_messages: i32, visibility_timeout_secs: i32) -> ReceiveOptions {
        ReceiveOptions {
            max_messages,
            visibility_timeout_secs,
            wait_time_secs: 0,
        }
    }

    #[tokio::test]
    async fn test_received_messages_are_hidden() {
        let queue = MemoryQueue::default();
        let id = queue.send("first").await.unwrap();
        queue.send("second").await.unwrap();

        let received = queue.receive(&options(1, 60)).await.unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].message_id.as_deref(), Some(id.as_str()));
        assert_eq!(received[0].body.as_deref(), Some("first"));

        let received = queue.receive(&options(10, 60)).await.unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].body.as_deref(), Some("second"));

        assert!(queue.receive(&options(10, 60)).await.unwrap().is_empty());
        assert_eq!(queue.len(), 2);
    }

    #[tokio::test]
    async fn test_zero_visibility_makes_message_available_again() {
        let queue = MemoryQueue::default();
        queue.send("again").await.unwrap();

        let first = queue.receive(&options(1, 0)).await.unwrap();
        let second = queue.receive(&options(1, 0)).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_ne!(first[0].receipt_handle, second[0].receipt_handle);

        // Only the latest handle is valid
        let stale = first[0].receipt_handle.clone().unwrap();
        assert!(matches!(
            queue.delete(&stale).await,
            Err(QueueError::InvalidReceipt(_))
        ));
        let current = second[0].receipt_handle.clone().unwrap();
        queue.delete(&current).await.unwrap();
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_change_visibility() {
        let queue = MemoryQueue::default();
        queue.send("hidden").await.unwrap();
        let received = queue.receive(&options(1, 600)).await.unwrap();
        let handle = received[0].receipt_handle.clone().unwrap();

        queue.change_visibility(&handle, 0).await.unwrap();
        assert_eq!(queue.receive(&options(1, 600)).await.unwrap().len(), 1);

        assert!(matches!(
            queue.change_visibility("rh-unknown", 10).await,
            Err(QueueError::InvalidReceipt(_))
        ));
    }
}
