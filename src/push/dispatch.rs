use time::{Duration, OffsetDateTime};

use crate::ports;
use crate::types::push::{DispatchResponse, Notification, Subscription, Topic};

/// How long the service keeps retrying an undelivered notification.
pub(crate) const EXPIRATION: Duration = Duration::days(7);

pub(crate) fn build_notification(
    subscription: &Subscription,
    topic: &Topic,
    now: OffsetDateTime,
) -> Notification {
    Notification {
        device_token: subscription.device_token.clone(),
        topic: topic.clone(),
        expiration: now + EXPIRATION,
        payload: payload(&subscription.account_id),
    }
}

/// Mail clients only need the account to refresh; nothing else is sent.
fn payload(account_id: &str) -> String {
    serde_json::json!({ "aps": { "account-id": account_id } }).to_string()
}

pub(crate) async fn dispatch<S, T>(
    sender: &S,
    time: &T,
    topic: &Topic,
    subscription: &Subscription,
) -> Result<DispatchResponse, S::Error>
where
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    let notification = build_notification(subscription, topic, time.now());
    sender.send(&notification).await
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use time::macros::datetime;

    #[derive(Clone)]
    struct FixedTime(OffsetDateTime);

    impl ports::TimeProvider for FixedTime {
        fn now(&self) -> OffsetDateTime {
            self.0
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSender {
        sent: Arc<Mutex<Vec<Notification>>>,
    }

    impl ports::PushSender for RecordingSender {
        type Error = std::convert::Infallible;
        type Fut<'a>
            = std::future::Ready<Result<DispatchResponse, Self::Error>>
        where
            Self: 'a;

        fn send<'a>(&'a self, notification: &'a Notification) -> Self::Fut<'a> {
            self.sent
                .lock()
                .expect("sent lock")
                .push(notification.clone());
            std::future::ready(Ok(DispatchResponse {
                status: 200,
                reason: String::new(),
                timestamp: None,
            }))
        }
    }

    fn subscription() -> Subscription {
        Subscription {
            account_id: "acct1".to_string(),
            device_token: "deadbeef01020304".to_string(),
            mailboxes: vec!["INBOX".to_string()],
        }
    }

    #[test]
    fn build_notification__should_target_token_with_week_expiration() {
        // Given
        let now = datetime!(2025-01-12 09:30:00 UTC);
        let topic = Topic::new("com.apple.mail.XServer.0f1e2d3c");

        // When
        let notification = build_notification(&subscription(), &topic, now);

        // Then
        assert_eq!(notification.device_token, "deadbeef01020304");
        assert_eq!(notification.topic, topic);
        assert_eq!(notification.expiration, datetime!(2025-01-19 09:30:00 UTC));
    }

    #[test]
    fn build_notification__should_carry_only_account_id() {
        let now = datetime!(2025-01-12 09:30:00 UTC);
        let topic = Topic::new("topic");

        let notification = build_notification(&subscription(), &topic, now);

        let payload: serde_json::Value =
            serde_json::from_str(&notification.payload).expect("payload json");
        assert_eq!(
            payload,
            serde_json::json!({ "aps": { "account-id": "acct1" } })
        );
    }

    #[test]
    fn payload__should_escape_account_id() {
        let payload: serde_json::Value =
            serde_json::from_str(&payload("a\"b")).expect("payload json");

        assert_eq!(payload["aps"]["account-id"], "a\"b");
    }

    #[tokio::test]
    async fn dispatch__should_send_through_sender() {
        // Given
        let sender = RecordingSender::default();
        let time = FixedTime(datetime!(2025-01-12 09:30:00 UTC));
        let topic = Topic::new("topic");

        // When
        let response = dispatch(&sender, &time, &topic, &subscription())
            .await
            .expect("dispatch");

        // Then
        assert_eq!(response.status, 200);
        let sent = sender.sent.lock().expect("sent lock");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].device_token, "deadbeef01020304");
        assert_eq!(sent[0].expiration, datetime!(2025-01-19 09:30:00 UTC));
    }
}
