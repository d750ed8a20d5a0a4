//! PeerNode struct definition.

use std::sync::Arc;

use libp2p::{core::transport::ListenerId, multiaddr::Multiaddr, swarm::Swarm, PeerId};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    interface::MarkerStore,
    network::{PeerSubBehaviour, PeerSubBehaviourState},
    node::{
        command::Command,
        config::NodeConfig,
        handle::{NodeBlocks, NodeHandle},
    },
};

/// A peersub network node.
///
/// Build one with [`PeerNode::with_config`], then [`spawn`](PeerNode::spawn)
/// it to get a [`NodeHandle`].
pub struct PeerNode {
    /// The node's libp2p swarm
    pub swarm: Swarm<PeerSubBehaviour,>,

    /// The node's peer ID
    pub peer_id: PeerId,

    /// The node's configuration
    pub config: NodeConfig,

    /// Listeners that have been established
    pub listeners: Vec<(ListenerId, Multiaddr,),>,

    /// State kept next to the swarm
    pub state: PeerSubBehaviourState,

    /// Node lifetime; cancelled on shutdown
    pub(crate) lifetime: CancellationToken,

    pub(crate) commands: mpsc::UnboundedReceiver<Command,>,

    pub(crate) command_tx: mpsc::UnboundedSender<Command,>,

    /// Marker store handed out to facades; only the node holds it strongly
    pub(crate) blocks: Arc<dyn MarkerStore,>,
}

impl PeerNode {
    /// Get the peer ID of this node
    pub fn peer_id(&self,) -> PeerId {
        self.peer_id
    }

    /// Get the configuration of this node
    pub fn config(&self,) -> &NodeConfig {
        &self.config
    }

    /// Get the current listeners
    pub fn listeners(&self,) -> &[(ListenerId, Multiaddr,)] {
        &self.listeners
    }

    pub(crate) fn new_internal(swarm: Swarm<PeerSubBehaviour,>, peer_id: PeerId, config: NodeConfig,) -> Self {
        let (command_tx, commands,) = mpsc::unbounded_channel();
        let blocks: Arc<dyn MarkerStore,> = Arc::new(NodeBlocks::new(command_tx.clone(),),);
        Self {
            swarm,
            peer_id,
            config,
            listeners: Vec::new(),
            state: PeerSubBehaviourState::new(),
            lifetime: CancellationToken::new(),
            commands,
            command_tx,
            blocks,
        }
    }

    pub(crate) fn handle(&self,) -> NodeHandle {
        NodeHandle::new(
            self.peer_id,
            self.command_tx.clone(),
            Arc::downgrade(&self.blocks,),
            self.lifetime.clone(),
            self.config.enable_pubsub,
            self.config.discovery,
        )
    }
}
