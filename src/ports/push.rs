use crate::types::push::{DispatchResponse, Notification};

/// Client side of the push service.
///
/// `Ok` carries any protocol-level answer, whatever its status code.
/// `Err` is reserved for exchanges that never produced one.
pub trait PushSender: Clone + Send + Sync + 'static {
    type Error: std::fmt::Display + Send + Sync + 'static;
    type Fut<'a>: Future<Output = Result<DispatchResponse, Self::Error>> + Send + 'a
    where
        Self: 'a;

    fn send<'a>(&'a self, notification: &'a Notification) -> Self::Fut<'a>;
}
