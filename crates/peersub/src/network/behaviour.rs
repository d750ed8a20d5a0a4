//! Network behaviour for peersub.
//!
//! This module defines the libp2p NetworkBehaviour for peersub nodes.

use anyhow::Result;
use libp2p::{
    gossipsub, identify,
    identity::Keypair,
    kad::{self, store::MemoryStore},
    mdns,
    swarm::{behaviour::toggle::Toggle, NetworkBehaviour},
    PeerId,
};

use super::events::PeerSubEvent;
use crate::{
    discovery::{configure_kademlia, configure_mdns},
    node::NodeConfig,
    PROTOCOL_VERSION,
};

/// The main network behaviour for peersub
#[derive(NetworkBehaviour)]
#[behaviour(to_swarm = "PeerSubEvent")]
pub struct PeerSubBehaviour {
    /// Gossipsub, the messaging engine. Disabled when pubsub is off.
    pub gossipsub: Toggle<gossipsub::Behaviour>,
    /// Kademlia, the content router for discovery markers
    pub kademlia: Toggle<kad::Behaviour<MemoryStore>>,
    /// Identify, to learn the listen addresses of connected peers
    pub identify: identify::Behaviour,
    /// mDNS for local peer discovery
    pub mdns: Toggle<mdns::tokio::Behaviour>,
}

impl PeerSubBehaviour {
    /// Create a new PeerSubBehaviour
    pub fn new(keypair: &Keypair, config: &NodeConfig) -> Result<Self> {
        let local_peer_id = PeerId::from(keypair.public());

        let gossipsub = if config.enable_pubsub {
            tracing::info!("Pubsub enabled");
            Some(Self::create_gossipsub(keypair, config)?)
        } else {
            tracing::info!("Pubsub disabled by configuration");
            None
        };

        let kademlia = if config.enable_kademlia {
            tracing::info!("Kademlia content routing enabled");
            Some(configure_kademlia(local_peer_id)?)
        } else {
            tracing::info!("Kademlia disabled by configuration");
            None
        };

        let mdns = if config.enable_mdns {
            configure_mdns(local_peer_id)
        } else {
            tracing::info!("mDNS disabled by configuration");
            None
        };

        let identify = identify::Behaviour::new(identify::Config::new(
            PROTOCOL_VERSION.to_string(),
            keypair.public(),
        ));

        Ok(Self {
            gossipsub: gossipsub.into(),
            kademlia: kademlia.into(),
            identify,
            mdns: mdns.into(),
        })
    }

    fn create_gossipsub(keypair: &Keypair, config: &NodeConfig) -> Result<gossipsub::Behaviour> {
        // Default message ids (source + sequence number), so publishing the
        // same payload twice yields two distinct messages.
        let gossipsub_config = gossipsub::ConfigBuilder::default()
            .heartbeat_interval(config.heartbeat_interval)
            .validation_mode(gossipsub::ValidationMode::Strict)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create gossipsub config: {}", e))?;

        gossipsub::Behaviour::new(
            gossipsub::MessageAuthenticity::Signed(keypair.clone()),
            gossipsub_config,
        )
        .map_err(|e| anyhow::anyhow!("Failed to create gossipsub behaviour: {}", e))
    }
}
