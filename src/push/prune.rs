use time::OffsetDateTime;
use tracing::{info, warn};

use super::subscriptions::SubscriptionRecord;
use crate::types::push::DispatchResponse;

const STATUS_BAD_REQUEST: u16 = 400;
const STATUS_GONE: u16 = 410;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    Retain,
    Delete,
}

/// Whether the service's answer invalidates the record on disk.
///
/// A 400 always deletes. A 410 deletes only when the record was last written
/// before the moment the service says the token stopped being valid; a record
/// rewritten since then may belong to a fresh registration.
pub(crate) fn decide(response: &DispatchResponse, modified: OffsetDateTime) -> Decision {
    match (response.status, response.timestamp) {
        (STATUS_BAD_REQUEST, _) => Decision::Delete,
        (STATUS_GONE, Some(invalidated_at)) if modified < invalidated_at => Decision::Delete,
        _ => Decision::Retain,
    }
}

/// Applies [`decide`] to a record. Removal failures are only logged.
pub(crate) async fn prune(record: &SubscriptionRecord, response: &DispatchResponse) -> Decision {
    let decision = decide(response, record.modified);
    if decision == Decision::Delete {
        let device = record.subscription.token_prefix();
        match tokio::fs::remove_file(&record.path).await {
            Ok(()) => info!(device, "subscription removed"),
            Err(err) => warn!(
                device,
                path = %record.path.display(),
                "failed to remove subscription: {err}"
            ),
        }
    }
    decision
}
