use super::{NotificationTopic, Subscription};
use crate::errors::{NotifyError, Result};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

const OWNER: &str = "local";

/// In-process topic. Subscriptions are confirmed immediately.
pub struct MemoryTopic {
    topic_arn: String,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    published: Vec<String>,
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl MemoryTopic {
    pub fn new(topic_arn: impl Into<String>) -> Self {
        MemoryTopic {
            topic_arn: topic_arn.into(),
            state: Mutex::new(State::default()),
        }
    }

    /// Every message published so far, oldest first.
    pub fn published(&self) -> Vec<String> {
        self.state().published.clone()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryTopic {
    fn default() -> Self {
        MemoryTopic::new("arn:local:topic")
    }
}

#[async_trait]
impl NotificationTopic for MemoryTopic {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn publish(&self, message: &str) -> Result<Option<String>> {
        let mut state = self.state();
        state.next_id += 1;
        state.published.push(message.to_string());
        Ok(Some(format!("msg-{}", state.next_id)))
    }

    async fn list_subscriptions(&self) -> Result<Vec<Subscription>> {
        Ok(self.state().subscriptions.clone())
    }

    async fn subscribe(&self, protocol: &str, endpoint: &str) -> Result<Option<String>> {
        let mut state = self.state();
        state.next_id += 1;
        let arn = format!("{}:{}", self.topic_arn, state.next_id);
        state.subscriptions.push(Subscription {
            subscription_arn: Some(arn.clone()),
            owner: Some(OWNER.to_string()),
            protocol: Some(protocol.to_string()),
            endpoint: Some(endpoint.to_string()),
            topic_arn: Some(self.topic_arn.clone()),
        });
        Ok(Some(arn))
    }

    async fn unsubscribe(&self, subscription_arn: &str) -> Result<()> {
        let mut state = self.state();
        let before = state.subscriptions.len();
        state
            .subscriptions
            .retain(|s| s.subscription_arn.as_deref() != Some(subscription_arn));
        if state.subscriptions.len() == before {
            return Err(NotifyError::UnknownSubscription(subscription_arn.to_string()));
        }
        Ok(())
    }
}
