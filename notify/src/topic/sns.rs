use super::{NotificationTopic, Subscription};
use crate::errors::{NotifyError, Result};
use async_trait::async_trait;
use aws_sdk_sns::Client;
use aws_sdk_sns::error::DisplayErrorContext;
use aws_sdk_sns::types;

pub struct SnsTopic {
    client: Client,
    topic_arn: String,
}

impl SnsTopic {
    pub fn new(client: Client, topic_arn: impl Into<String>) -> Self {
        SnsTopic {
            client,
            topic_arn: topic_arn.into(),
        }
    }
}

fn topic_error<E: std::error::Error>(operation: &'static str, e: E) -> NotifyError {
    NotifyError::Topic {
        operation,
        message: DisplayErrorContext(e).to_string(),
    }
}

fn convert_subscription(subscription: &types::Subscription) -> Subscription {
    Subscription {
        subscription_arn: subscription.subscription_arn().map(String::from),
        owner: subscription.owner().map(String::from),
        protocol: subscription.protocol().map(String::from),
        endpoint: subscription.endpoint().map(String::from),
        topic_arn: subscription.topic_arn().map(String::from),
    }
}

#[async_trait]
impl NotificationTopic for SnsTopic {
    fn name(&self) -> &'static str {
        "sns"
    }

    async fn publish(&self, message: &str) -> Result<Option<String>> {
        let output = self
            .client
            .publish()
            .topic_arn(&self.topic_arn)
            .message(message)
            .send()
            .await
            .map_err(|e| topic_error("Publish", e))?;
        Ok(output.message_id().map(String::from))
    }

    async fn list_subscriptions(&self) -> Result<Vec<Subscription>> {
        let mut subscriptions = Vec::new();
        let mut next_token = None;
        loop {
            let output = self
                .client
                .list_subscriptions_by_topic()
                .topic_arn(&self.topic_arn)
                .set_next_token(next_token)
                .send()
                .await
                .map_err(|e| topic_error("ListSubscriptionsByTopic", e))?;
            subscriptions.extend(output.subscriptions().iter().map(convert_subscription));

            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => return Ok(subscriptions),
            }
        }
    }

    async fn subscribe(&self, protocol: &str, endpoint: &str) -> Result<Option<String>> {
        let output = self
            .client
            .subscribe()
            .topic_arn(&self.topic_arn)
            .protocol(protocol)
            .endpoint(endpoint)
            .send()
            .await
            .map_err(|e| topic_error("Subscribe", e))?;
        Ok(output.subscription_arn().map(String::from))
    }

    async fn unsubscribe(&self, subscription_arn: &str) -> Result<()> {
        match self
            .client
            .unsubscribe()
            .subscription_arn(subscription_arn)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.as_service_error().is_some_and(|e| e.is_not_found_exception()) => {
                Err(NotifyError::UnknownSubscription(subscription_arn.to_string()))
            }
            Err(e) => Err(topic_error("Unsubscribe", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_subscription() {
        let listed = types::Subscription::builder()
            .subscription_arn("arn:aws:sns:us-east-1:1:demo:abcd")
            .protocol("email")
            .endpoint("ops@example.com")
            .topic_arn("arn:aws:sns:us-east-1:1:demo")
            .build();

        let subscription = convert_subscription(&listed);
        assert_eq!(
            subscription.subscription_arn.as_deref(),
            Some("arn:aws:sns:us-east-1:1:demo:abcd")
        );
        assert_eq!(subscription.protocol.as_deref(), Some("email"));
        assert_eq!(subscription.owner, None);
        assert_eq!(
            serde_json::to_value(&subscription).unwrap(),
            serde_json::json!({
                "SubscriptionArn": "arn:aws:sns:us-east-1:1:demo:abcd",
                "Protocol": "email",
                "Endpoint": "ops@example.com",
                "TopicArn": "arn:aws:sns:us-east-1:1:demo"
            })
        );
    }
}
