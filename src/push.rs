use tracing::info;

use crate::ports;
use crate::types::push::{DispatchResponse, Topic};

pub(crate) mod dispatch;
pub(crate) mod prune;
pub(crate) mod subscriptions;

use subscriptions::SubscriptionRecord;

/// Everything a request needs to notify devices: the service client, a
/// clock and the topic resolved at startup. Cloned into each connection.
#[derive(Clone)]
pub struct Pusher<S, T> {
    sender: S,
    time: T,
    topic: Topic,
}

impl<S, T> Pusher<S, T>
where
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    pub fn new(sender: S, time: T, topic: Topic) -> Self {
        Self {
            sender,
            time,
            topic,
        }
    }

    /// Sends one notification for `record`, then prunes the record if the
    /// answer says its token is dead.
    pub(crate) async fn push_record(
        &self,
        record: &SubscriptionRecord,
    ) -> Result<DispatchResponse, S::Error> {
        let response = dispatch::dispatch(
            &self.sender,
            &self.time,
            &self.topic,
            &record.subscription,
        )
        .await?;
        info!(
            device = record.subscription.token_prefix(),
            code = response.status,
            reason = %response.reason,
            "push delivered"
        );
        prune::prune(record, &response).await;
        Ok(response)
    }
}
