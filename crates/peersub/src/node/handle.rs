//! Handle to a running [`PeerNode`](super::PeerNode).
//!
//! The swarm is owned by the event loop task; everything else talks to it
//! through commands. [`NodeHandle`] is the public entry point and assembles
//! the [`PubSub`] facade. The block store is owned by the event loop, so
//! handles and facades only hold a weak reference that dies with the node.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use futures::{stream::BoxStream, StreamExt};
use libp2p::{Multiaddr, PeerId};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use super::command::Command;
use crate::{
    content::ContentId,
    discovery::DiscoveryConfig,
    error::{EngineError, HostError, RoutingError, StoreError},
    interface::{ContentRouter, EngineSubscription, MarkerStore, MessagingEngine, NetworkHost},
    message::{Message, PeerInfo},
    pubsub::PubSub,
};

/// Send a command and wait for its reply. `None` once the event loop is gone.
async fn request<T>(
    commands: &mpsc::UnboundedSender<Command>,
    command: impl FnOnce(oneshot::Sender<T>) -> Command,
) -> Option<T> {
    let (reply, response) = oneshot::channel();
    commands.send(command(reply)).ok()?;
    response.await.ok()
}

/// Handle to a running node. Cheap to clone.
#[derive(Clone)]
pub struct NodeHandle {
    client: NodeClient,
    blocks: Weak<dyn MarkerStore>,
    lifetime: CancellationToken,
    pubsub_enabled: bool,
    discovery: DiscoveryConfig,
}

impl NodeHandle {
    pub(crate) fn new(
        peer_id: PeerId,
        commands: mpsc::UnboundedSender<Command>,
        blocks: Weak<dyn MarkerStore>,
        lifetime: CancellationToken,
        pubsub_enabled: bool,
        discovery: DiscoveryConfig,
    ) -> Self {
        Self {
            client: NodeClient { peer_id, commands },
            blocks,
            lifetime,
            pubsub_enabled,
            discovery,
        }
    }

    /// Peer id of the node
    pub fn peer_id(&self) -> PeerId {
        self.client.peer_id
    }

    /// Whether the event loop is still running
    pub fn is_running(&self) -> bool {
        !self.lifetime.is_cancelled()
    }

    /// The node lifetime token. Cancelling it shuts the node down.
    pub fn lifetime(&self) -> CancellationToken {
        self.lifetime.clone()
    }

    /// Stop the event loop. Every discovery bootstrap is cancelled with it.
    pub fn shutdown(&self) {
        self.lifetime.cancel();
    }

    /// Addresses the node is listening on
    pub async fn listen_addrs(&self) -> Vec<Multiaddr> {
        request(&self.client.commands, |reply| Command::ListenAddrs { reply })
            .await
            .unwrap_or_default()
    }

    /// Peers with an open connection
    pub async fn connected_peers(&self) -> Vec<PeerId> {
        request(&self.client.commands, |reply| Command::ConnectedPeers { reply })
            .await
            .unwrap_or_default()
    }

    /// Block store used for discovery markers. `None` once the event loop
    /// has exited.
    pub fn blocks(&self) -> Option<Arc<dyn MarkerStore>> {
        self.blocks.upgrade()
    }

    /// Build the pub/sub facade for this node.
    ///
    /// The facade stays usable after every handle is dropped; it goes
    /// offline when the node shuts down.
    pub fn pubsub(&self) -> PubSub {
        let client = Arc::new(self.client.clone());

        let builder = PubSub::builder(self.lifetime.clone())
            .router(client.clone())
            .host(client.clone())
            .weak_blocks(self.blocks.clone())
            .discovery(self.discovery);

        if self.pubsub_enabled {
            builder.engine(client).build()
        } else {
            builder.build()
        }
    }
}

#[derive(Clone)]
struct NodeClient {
    peer_id: PeerId,
    commands: mpsc::UnboundedSender<Command>,
}

#[async_trait]
impl MessagingEngine for NodeClient {
    async fn subscribe(&self, topic: &str) -> Result<Box<dyn EngineSubscription>, EngineError> {
        let (id, messages) = request(&self.commands, |reply| Command::Subscribe {
            topic: topic.to_string(),
            reply,
        })
        .await
        .ok_or(EngineError::Unavailable)??;

        Ok(Box::new(NodeSubscription {
            topic: topic.to_string(),
            id,
            messages: Mutex::new(messages),
            cancelled: CancellationToken::new(),
            commands: self.commands.clone(),
        }))
    }

    async fn publish(&self, topic: &str, data: Vec<u8>) -> Result<(), EngineError> {
        request(&self.commands, |reply| Command::Publish { topic: topic.to_string(), data, reply })
            .await
            .ok_or(EngineError::Unavailable)?
    }

    async fn topics(&self) -> Result<Vec<String>, EngineError> {
        request(&self.commands, |reply| Command::Topics { reply })
            .await
            .ok_or(EngineError::Unavailable)?
    }

    async fn peers(&self, topic: Option<&str>) -> Result<Vec<PeerId>, EngineError> {
        request(&self.commands, |reply| Command::Peers { topic: topic.map(str::to_string), reply })
            .await
            .ok_or(EngineError::Unavailable)?
    }
}

#[async_trait]
impl ContentRouter for NodeClient {
    async fn find_providers(
        &self,
        key: ContentId,
        limit: usize,
    ) -> Result<BoxStream<'static, PeerInfo>, RoutingError> {
        let (sender, receiver) = mpsc::channel(limit.max(1));
        request(&self.commands, |reply| Command::FindProviders { key, limit, sender, reply })
            .await
            .ok_or(RoutingError::Unavailable)??;

        Ok(ReceiverStream::new(receiver).boxed())
    }
}

#[async_trait]
impl NetworkHost for NodeClient {
    async fn connect(&self, peer: PeerInfo) -> Result<(), HostError> {
        request(&self.commands, |reply| Command::Connect { peer, reply })
            .await
            .ok_or(HostError::Unavailable)?
    }
}

/// Block store backed by the node's Kademlia provider records
pub(crate) struct NodeBlocks {
    commands: mpsc::UnboundedSender<Command>,
}

impl NodeBlocks {
    pub(crate) fn new(commands: mpsc::UnboundedSender<Command>) -> Self {
        Self { commands }
    }
}

#[async_trait]
impl MarkerStore for NodeBlocks {
    async fn put(&self, data: Vec<u8>) -> Result<ContentId, StoreError> {
        request(&self.commands, |reply| Command::PutBlock { data, reply })
            .await
            .ok_or(StoreError::Unavailable)?
    }
}

/// Engine subscription backed by a local subscriber queue in the event loop
struct NodeSubscription {
    topic: String,
    id: u64,
    messages: Mutex<mpsc::Receiver<Message>>,
    cancelled: CancellationToken,
    commands: mpsc::UnboundedSender<Command>,
}

#[async_trait]
impl EngineSubscription for NodeSubscription {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn next(&self) -> Result<Message, EngineError> {
        let mut messages = tokio::select! {
            biased;
            _ = self.cancelled.cancelled() => return Err(EngineError::Closed),
            messages = self.messages.lock() => messages,
        };

        // Checked first on every poll, so nothing queued is handed out after cancel
        tokio::select! {
            biased;
            _ = self.cancelled.cancelled() => Err(EngineError::Closed),
            message = messages.recv() => message.ok_or(EngineError::Closed),
        }
    }

    fn cancel(&self) {
        if self.cancelled.is_cancelled() {
            return;
        }
        self.cancelled.cancel();
        let _ = self.commands.send(Command::Unsubscribe { topic: self.topic.clone(), id: self.id });
    }
}

impl Drop for NodeSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::node::{NodeConfig, PeerNode};

    #[tokio::test]
    async fn test_block_store_follows_the_event_loop() {
        let config = NodeConfig::builder().port_range((0, 0)).disable_mdns().build();
        let handle = PeerNode::with_config(config).await.unwrap().spawn();
        let lifetime = handle.lifetime();
        let blocks = handle.blocks.clone();
        let pubsub = handle.pubsub();

        // Handles come and go; the store stays up while the node runs
        drop(handle);
        assert!(blocks.upgrade().is_some());
        assert!(pubsub.liveness().is_ready());

        lifetime.cancel();
        let gone = tokio::time::timeout(Duration::from_secs(2), async {
            while blocks.upgrade().is_some() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(gone.is_ok(), "block store outlived the event loop");
    }
}
