//! Subscription handle returned by [`PubSub::subscribe`](crate::PubSub::subscribe).

use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    error::{PubSubError, Result},
    interface::EngineSubscription,
    message::Message,
};

/// A live subscription to one topic.
///
/// Only one task should read from a subscription at a time. Closing may
/// happen concurrently from anywhere through a [`SubscriptionCloser`].
/// Dropping the subscription closes it.
pub struct Subscription {
    inner: Arc<dyn EngineSubscription>,
    closer: SubscriptionCloser,
}

/// Cloneable handle that closes a [`Subscription`] from another task
#[derive(Clone)]
pub struct SubscriptionCloser {
    inner: Arc<dyn EngineSubscription>,
    discovery: Option<CancellationToken>,
    closed: CancellationToken,
}

impl Subscription {
    pub(crate) fn new(
        inner: Box<dyn EngineSubscription>,
        discovery: Option<CancellationToken>,
    ) -> Self {
        let inner: Arc<dyn EngineSubscription> = Arc::from(inner);
        let closer = SubscriptionCloser {
            inner: inner.clone(),
            discovery,
            closed: CancellationToken::new(),
        };
        Self { inner, closer }
    }

    /// Topic this subscription receives messages for
    pub fn topic(&self) -> &str {
        self.inner.topic()
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.closer.closed.is_cancelled()
    }

    /// Whether a discovery bootstrap was started for this subscription
    pub fn has_discovery(&self) -> bool {
        self.closer.discovery.is_some()
    }

    /// Handle that can close this subscription from another task
    pub fn closer(&self) -> SubscriptionCloser {
        self.closer.clone()
    }

    /// Wait for the next message.
    ///
    /// Fails with [`PubSubError::Closed`] once the subscription is closed.
    pub async fn next(&mut self) -> Result<Message> {
        let closed = self.closer.closed.clone();
        tokio::select! {
            biased;
            _ = closed.cancelled() => Err(PubSubError::Closed),
            message = self.inner.next() => Ok(message?),
        }
    }

    /// Like [`next`](Self::next), failing with [`PubSubError::Cancelled`]
    /// when `cancel` fires first
    pub async fn next_until(&mut self, cancel: &CancellationToken) -> Result<Message> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PubSubError::Cancelled),
            message = self.next() => message,
        }
    }

    /// Like [`next`](Self::next), failing with
    /// [`PubSubError::DeadlineExceeded`] after `timeout`
    pub async fn next_timeout(&mut self, timeout: Duration) -> Result<Message> {
        tokio::time::timeout(timeout, self.next())
            .await
            .map_err(|_| PubSubError::DeadlineExceeded)?
    }

    /// Stop discovery for this subscription and cancel it on the engine.
    ///
    /// Safe to call any number of times.
    pub fn close(&self) {
        self.closer.close();
    }
}

impl SubscriptionCloser {
    /// Same as [`Subscription::close`]
    pub fn close(&self) {
        let first = !self.closed.is_cancelled();
        self.closed.cancel();
        if let Some(discovery) = &self.discovery {
            discovery.cancel();
        }
        if first {
            debug!(topic = self.inner.topic(), "closing subscription");
            self.inner.cancel();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.closer.close();
    }
}
