//! Topic publish/subscribe facade.
//!
//! [`PubSub`] gates every operation behind the same liveness check, then
//! delegates to the messaging engine. Subscribing with discovery enabled
//! additionally launches a detached [`Bootstrap`] tied to the node lifetime.

mod guard;
mod subscription;

use std::{
    collections::HashSet,
    sync::{Arc, Weak},
};

use libp2p::PeerId;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub use guard::{Liveness, Routing};
pub use subscription::{Subscription, SubscriptionCloser};

use crate::{
    discovery::{Bootstrap, DiscoveryConfig},
    error::{PubSubError, Result},
    interface::{ContentRouter, MarkerStore, MessagingEngine, NetworkHost},
    options::{PeersOptions, SubscribeOptions},
};

/// Publish/subscribe facade over a messaging engine
pub struct PubSub {
    engine: Option<Arc<dyn MessagingEngine>>,
    router: Option<Arc<dyn ContentRouter>>,
    host: Option<Arc<dyn NetworkHost>>,
    blocks: Option<Weak<dyn MarkerStore>>,
    lifetime: CancellationToken,
    discovery: DiscoveryConfig,
}

impl PubSub {
    /// Start building a facade bound to the node lifetime `lifetime`.
    ///
    /// Discovery tasks are children of this token, so cancelling it stops
    /// every bootstrap and takes the facade offline.
    pub fn builder(lifetime: CancellationToken) -> PubSubBuilder {
        PubSubBuilder {
            pubsub: PubSub {
                engine: None,
                router: None,
                host: None,
                blocks: None,
                lifetime,
                discovery: DiscoveryConfig::default(),
            },
        }
    }

    /// Check whether pub/sub can be used right now
    pub fn liveness(&self) -> Liveness {
        let Some(engine) = &self.engine else {
            return Liveness::Disabled;
        };

        if self.lifetime.is_cancelled() {
            return Liveness::Offline;
        }

        match (&self.router, &self.host) {
            (Some(router), Some(host)) => Liveness::Ready {
                engine: engine.clone(),
                routing: Routing::new(router.clone(), host.clone()),
            },
            _ => Liveness::Offline,
        }
    }

    fn ready(&self) -> Result<(Arc<dyn MessagingEngine>, Routing)> {
        match self.liveness() {
            Liveness::Ready { engine, routing } => Ok((engine, routing)),
            Liveness::Disabled => Err(PubSubError::FeatureDisabled),
            Liveness::Offline => Err(PubSubError::NodeOffline),
        }
    }

    /// List topics with at least one local subscription, in engine order
    pub async fn topics(&self) -> Result<Vec<String>> {
        let (engine, _) = self.ready()?;
        Ok(engine.topics().await?)
    }

    /// List peers the engine knows for a topic, or for all topics
    pub async fn peers(&self, options: PeersOptions) -> Result<HashSet<PeerId>> {
        let (engine, _) = self.ready()?;
        let peers = engine.peers(options.topic.as_deref()).await?;
        Ok(peers.into_iter().collect())
    }

    /// Publish `data` to `topic`.
    ///
    /// Success only means the engine accepted the message; there is no
    /// delivery confirmation.
    pub async fn publish(&self, topic: &str, data: impl Into<Vec<u8>>) -> Result<()> {
        let (engine, _) = self.ready()?;
        engine.publish(topic, data.into()).await.map_err(PubSubError::PublishFailed)
    }

    /// Subscribe to `topic`.
    ///
    /// With `options.discover`, a discovery bootstrap is spawned in the
    /// background and this call returns without waiting for it.
    pub async fn subscribe(&self, topic: &str, options: SubscribeOptions) -> Result<Subscription> {
        let (engine, routing) = self.ready()?;

        let inner = engine.subscribe(topic).await.map_err(PubSubError::SubscribeFailed)?;
        info!(topic, discover = options.discover, "subscribed");

        let discovery = options.discover.then(|| {
            let token = self.lifetime.child_token();
            let bootstrap = Bootstrap::new(
                topic,
                self.blocks.clone(),
                routing,
                self.discovery,
                token.clone(),
            );
            tokio::spawn(async move {
                let report = bootstrap.run().await;
                debug!(?report, "pubsub discovery finished");
            });
            token
        });

        Ok(Subscription::new(inner, discovery))
    }

    /// Discovery limits applied to new subscriptions
    pub fn discovery_config(&self) -> DiscoveryConfig {
        self.discovery
    }
}

/// Builder for [`PubSub`]
pub struct PubSubBuilder {
    pubsub: PubSub,
}

impl PubSubBuilder {
    /// Messaging engine. Without one the facade reports
    /// [`PubSubError::FeatureDisabled`].
    pub fn engine(mut self, engine: Arc<dyn MessagingEngine>) -> Self {
        self.pubsub.engine = Some(engine);
        self
    }

    /// Content router used by discovery
    pub fn router(mut self, router: Arc<dyn ContentRouter>) -> Self {
        self.pubsub.router = Some(router);
        self
    }

    /// Network host used by discovery
    pub fn host(mut self, host: Arc<dyn NetworkHost>) -> Self {
        self.pubsub.host = Some(host);
        self
    }

    /// Block store for discovery markers. Only a weak reference is kept;
    /// the caller owns the store.
    pub fn blocks(mut self, blocks: &Arc<dyn MarkerStore>) -> Self {
        self.pubsub.blocks = Some(Arc::downgrade(blocks));
        self
    }

    /// Block store for discovery markers, for callers that only hold a weak
    /// reference themselves
    pub fn weak_blocks(mut self, blocks: Weak<dyn MarkerStore>) -> Self {
        self.pubsub.blocks = Some(blocks);
        self
    }

    /// Discovery limits, capped at the defaults
    pub fn discovery(mut self, config: DiscoveryConfig) -> Self {
        self.pubsub.discovery = config.clamped();
        self
    }

    pub fn build(self) -> PubSub {
        self.pubsub
    }
}
