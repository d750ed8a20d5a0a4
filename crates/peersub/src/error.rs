//! Error types for the pub/sub facade and its collaborators.

use thiserror::Error;

/// Result type used by the pub/sub facade
pub type Result<T, E = PubSubError> = std::result::Result<T, E>;

/// Errors surfaced by [`PubSub`](crate::PubSub) and [`Subscription`](crate::Subscription)
#[derive(Debug, Error)]
pub enum PubSubError {
    /// The messaging engine was never enabled on this node
    #[error("pubsub is not enabled on this node; start the node with pubsub enabled to use it")]
    FeatureDisabled,

    /// The node's network/routing subsystem is not running
    #[error("node is offline; this operation requires a running network")]
    NodeOffline,

    /// The engine rejected the subscription
    #[error("failed to subscribe: {0}")]
    SubscribeFailed(#[source] EngineError),

    /// The engine rejected the publish
    #[error("failed to publish: {0}")]
    PublishFailed(#[source] EngineError),

    /// Any other engine failure
    #[error(transparent)]
    Engine(EngineError),

    /// The caller's cancellation token fired before a message arrived
    #[error("operation cancelled")]
    Cancelled,

    /// The caller's deadline passed before a message arrived
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The subscription was closed
    #[error("subscription closed")]
    Closed,
}

impl From<EngineError> for PubSubError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Closed => PubSubError::Closed,
            other => PubSubError::Engine(other),
        }
    }
}

/// Errors reported by a [`MessagingEngine`](crate::MessagingEngine)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("messaging engine is disabled")]
    Disabled,
    #[error("subscription rejected: {0}")]
    Subscription(String),
    #[error("publish rejected: {0}")]
    Publish(String),
    #[error("subscription cancelled")]
    Closed,
    #[error("messaging engine is no longer running")]
    Unavailable,
}

/// Errors reported by a [`ContentRouter`](crate::ContentRouter)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("content routing is disabled")]
    Disabled,
    #[error("provider query failed: {0}")]
    Query(String),
    #[error("content router is no longer running")]
    Unavailable,
}

/// Errors reported by a [`NetworkHost`](crate::NetworkHost)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("dial failed: {0}")]
    Dial(String),
    #[error("network host is no longer running")]
    Unavailable,
}

/// Errors reported by a [`MarkerStore`](crate::MarkerStore)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("failed to announce block: {0}")]
    Provide(String),
    #[error("block store is no longer running")]
    Unavailable,
}
