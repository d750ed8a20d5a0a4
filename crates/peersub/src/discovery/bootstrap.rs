//! Topic discovery bootstrap.
//!
//! On a subscribe with discovery enabled, the node stores a marker block
//! derived from the topic name. Storing it announces the node as a provider
//! of that block, so every subscriber of the topic ends up providing the same
//! content id. The bootstrap then asks the content router for other providers
//! and dials each of them concurrently, every attempt with its own timeout.
//!
//! Nothing waits on the bootstrap. Errors are logged and dropped; the join at
//! the end only makes sure no dial outlives the bootstrap.

use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use futures::StreamExt;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    content::ContentId,
    interface::{MarkerStore, NetworkHost},
    message::PeerInfo,
    pubsub::Routing,
};

/// Prefix prepended to the topic name to build its discovery marker
pub const DISCOVERY_NAMESPACE: &str = "floodsub:";

/// Maximum providers dialled per bootstrap
pub const MAX_PROVIDERS: usize = 10;

/// Timeout for a single connection attempt
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Limits applied to a discovery bootstrap.
///
/// Both values can only be tightened. Anything above [`MAX_PROVIDERS`] or
/// [`CONNECT_TIMEOUT`] is capped when the bootstrap starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Maximum number of providers requested and dialled
    pub provider_limit: usize,
    /// Timeout for each connection attempt
    pub connect_timeout: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self { provider_limit: MAX_PROVIDERS, connect_timeout: CONNECT_TIMEOUT }
    }
}

impl DiscoveryConfig {
    pub fn with_provider_limit(mut self, limit: usize) -> Self {
        self.provider_limit = limit.min(MAX_PROVIDERS);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout.min(CONNECT_TIMEOUT);
        self
    }

    /// Same config with both limits capped at their defaults
    pub fn clamped(self) -> Self {
        Self {
            provider_limit: self.provider_limit.min(MAX_PROVIDERS),
            connect_timeout: self.connect_timeout.min(CONNECT_TIMEOUT),
        }
    }
}

/// Marker block stored for `topic`
pub fn discovery_marker(topic: &str) -> Vec<u8> {
    let mut marker = Vec::with_capacity(DISCOVERY_NAMESPACE.len() + topic.len());
    marker.extend_from_slice(DISCOVERY_NAMESPACE.as_bytes());
    marker.extend_from_slice(topic.as_bytes());
    marker
}

/// Content id every subscriber of `topic` provides
pub fn discovery_key(topic: &str) -> ContentId {
    ContentId::of(&discovery_marker(topic))
}

/// What a bootstrap did. Only used for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Whether the marker block was stored
    pub marker_stored: bool,
    /// Connection attempts spawned
    pub attempted: usize,
    pub connected: usize,
    pub failed: usize,
    pub timed_out: usize,
    /// Set when the bootstrap was cancelled before it finished
    pub cancelled: bool,
}

/// Result of one connection attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Connected,
    Failed,
    TimedOut,
    Cancelled,
}

/// Discovery run for one subscription
pub struct Bootstrap {
    topic: String,
    blocks: Option<Weak<dyn MarkerStore>>,
    routing: Routing,
    config: DiscoveryConfig,
    token: CancellationToken,
}

impl Bootstrap {
    /// Create a bootstrap for `topic`.
    ///
    /// `token` must be derived from the node lifetime, never from a caller's
    /// request, so discovery keeps going after the subscribe call returns.
    pub fn new(
        topic: &str,
        blocks: Option<Weak<dyn MarkerStore>>,
        routing: Routing,
        config: DiscoveryConfig,
        token: CancellationToken,
    ) -> Self {
        Self { topic: topic.to_owned(), blocks, routing, config: config.clamped(), token }
    }

    /// Run the bootstrap to completion
    pub async fn run(self) -> BootstrapReport {
        let mut report = BootstrapReport::default();

        let Some(key) = self.store_marker(&mut report).await else {
            return report;
        };

        self.connect_to_providers(key, &mut report).await;
        report
    }

    async fn store_marker(&self, report: &mut BootstrapReport) -> Option<ContentId> {
        // The facade only holds a weak reference; the node may be gone.
        let Some(blocks) = self.blocks.as_ref().and_then(Weak::upgrade) else {
            error!(topic = %self.topic, "pubsub discovery: block store is not available");
            return None;
        };

        let marker = discovery_marker(&self.topic);
        let stored = tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                report.cancelled = true;
                return None;
            }
            stored = blocks.put(marker) => stored,
        };

        match stored {
            Ok(key) => {
                report.marker_stored = true;
                debug!(topic = %self.topic, %key, "pubsub discovery: marker stored");
                Some(key)
            }
            Err(e) => {
                error!(topic = %self.topic, error = %e, "pubsub discovery: failed to store marker");
                None
            }
        }
    }

    async fn connect_to_providers(&self, key: ContentId, report: &mut BootstrapReport) {
        let limit = self.config.provider_limit;

        let providers = tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                report.cancelled = true;
                return;
            }
            providers = self.routing.router.find_providers(key, limit) => providers,
        };

        let mut providers = match providers {
            Ok(providers) => providers.take(limit),
            Err(e) => {
                warn!(topic = %self.topic, error = %e, "pubsub discovery: provider query failed");
                return;
            }
        };

        let mut attempts = JoinSet::new();
        loop {
            let peer = tokio::select! {
                biased;
                _ = self.token.cancelled() => {
                    report.cancelled = true;
                    break;
                }
                peer = providers.next() => match peer {
                    Some(peer) => peer,
                    None => break,
                },
            };

            report.attempted += 1;
            attempts.spawn(connect(
                self.routing.host.clone(),
                peer,
                self.config.connect_timeout,
                self.token.clone(),
            ));
        }
        drop(providers);

        while let Some(joined) = attempts.join_next().await {
            match joined {
                Ok(Attempt::Connected) => report.connected += 1,
                Ok(Attempt::Failed) => report.failed += 1,
                Ok(Attempt::TimedOut) => report.timed_out += 1,
                Ok(Attempt::Cancelled) => report.cancelled = true,
                Err(e) => {
                    warn!(error = %e, "pubsub discovery: connection task failed");
                    report.failed += 1;
                }
            }
        }
    }
}

async fn connect(
    host: Arc<dyn NetworkHost>,
    peer: PeerInfo,
    timeout: Duration,
    token: CancellationToken,
) -> Attempt {
    let peer_id = peer.peer_id;

    tokio::select! {
        biased;
        _ = token.cancelled() => Attempt::Cancelled,
        attempt = tokio::time::timeout(timeout, host.connect(peer)) => match attempt {
            Ok(Ok(())) => {
                info!(peer = %peer_id, "connected to pubsub peer");
                Attempt::Connected
            }
            Ok(Err(e)) => {
                info!(peer = %peer_id, error = %e, "pubsub discovery: connect failed");
                Attempt::Failed
            }
            Err(_) => {
                info!(peer = %peer_id, ?timeout, "pubsub discovery: connect timed out");
                Attempt::TimedOut
            }
        },
    }
}
