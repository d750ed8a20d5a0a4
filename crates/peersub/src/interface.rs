//! Collaborator traits the pub/sub facade is built on.
//!
//! The facade never talks to libp2p directly. It goes through these traits,
//! which [`NodeHandle`](crate::NodeHandle) implements on top of a running
//! [`PeerNode`](crate::PeerNode). Tests substitute in-memory versions.

use async_trait::async_trait;
use futures::stream::BoxStream;
use libp2p::PeerId;

use crate::{
    content::ContentId,
    error::{EngineError, HostError, RoutingError, StoreError},
    message::{Message, PeerInfo},
};

/// Maps content identifiers to peers that provide them
#[async_trait]
pub trait ContentRouter: Send + Sync {
    /// Start looking for providers of `key`.
    ///
    /// The returned stream is lazy and yields at most `limit` peers; it may
    /// end early when the lookup runs out of candidates.
    async fn find_providers(
        &self,
        key: ContentId,
        limit: usize,
    ) -> Result<BoxStream<'static, PeerInfo>, RoutingError>;
}

/// Establishes connections to remote peers
#[async_trait]
pub trait NetworkHost: Send + Sync {
    /// Connect to `peer`. Callers bound the attempt with their own deadline.
    async fn connect(&self, peer: PeerInfo) -> Result<(), HostError>;
}

/// Content-addressed block storage used to publish discovery markers
#[async_trait]
pub trait MarkerStore: Send + Sync {
    /// Store `data` and announce the local node as a provider of it
    async fn put(&self, data: Vec<u8>) -> Result<ContentId, StoreError>;
}

/// Topic based messaging engine
#[async_trait]
pub trait MessagingEngine: Send + Sync {
    /// Open a new subscription to `topic`
    async fn subscribe(&self, topic: &str) -> Result<Box<dyn EngineSubscription>, EngineError>;

    /// Publish `data` to `topic`
    async fn publish(&self, topic: &str, data: Vec<u8>) -> Result<(), EngineError>;

    /// Topics with at least one local subscription
    async fn topics(&self) -> Result<Vec<String>, EngineError>;

    /// Peers participating in `topic`, or in any topic when `None`
    async fn peers(&self, topic: Option<&str>) -> Result<Vec<PeerId>, EngineError>;
}

/// One engine-level subscription
#[async_trait]
pub trait EngineSubscription: Send + Sync {
    /// Topic this subscription was opened for
    fn topic(&self) -> &str;

    /// Wait for the next message. Must fail with [`EngineError::Closed`]
    /// once [`cancel`](Self::cancel) has been called, including when a
    /// message is already queued.
    async fn next(&self) -> Result<Message, EngineError>;

    /// Cancel the subscription. Idempotent.
    fn cancel(&self);
}
