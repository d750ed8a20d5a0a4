//! Construction methods for PeerNode.

use std::time::Duration;

use anyhow::{anyhow, Result};
use libp2p::{identity::Keypair, swarm::dial_opts::DialOpts, Multiaddr, PeerId};
use tracing::{debug, info, warn};

use super::peer_node::PeerNode;
use crate::{
    discovery::add_bootstrap_peers,
    network::PeerSubBehaviour,
    node::{config::NodeConfig, crypto::load_or_generate_keypair},
};

impl PeerNode {
    /// Create a new peersub node with default configuration
    pub async fn new() -> Result<Self> {
        Self::with_config(NodeConfig::default()).await
    }

    /// Create a new peersub node with the specified configuration.
    ///
    /// The node starts listening and dials its bootstrap peers, but nothing
    /// is processed until it is spawned.
    pub async fn with_config(config: NodeConfig) -> Result<Self> {
        let keypair = match &config.keypair_path {
            Some(path) => load_or_generate_keypair(path)?,
            None => Keypair::generate_ed25519(),
        };

        let peer_id = PeerId::from(keypair.public());
        info!("Local peer id: {}", peer_id);

        let behaviour = PeerSubBehaviour::new(&keypair, &config)?;

        let swarm = libp2p::SwarmBuilder::with_existing_identity(keypair)
            .with_tokio()
            .with_tcp(
                libp2p::tcp::Config::default().nodelay(true),
                libp2p::noise::Config::new,
                libp2p::yamux::Config::default,
            )?
            .with_dns()?
            .with_behaviour(|_| behaviour)?
            .with_swarm_config(|c| c.with_idle_connection_timeout(Duration::from_secs(60)))
            .build();

        let mut node = PeerNode::new_internal(swarm, peer_id, config);
        node.start_listening()?;
        node.connect_bootstrap_peers();

        Ok(node)
    }

    fn start_listening(&mut self) -> Result<()> {
        for port in self.config.listen_ports() {
            let addr: Multiaddr = format!("/ip4/0.0.0.0/tcp/{port}").parse()?;
            match self.swarm.listen_on(addr.clone()) {
                Ok(listener) => {
                    debug!("Listener started on {}", addr);
                    self.listeners.push((listener, addr));
                    return Ok(());
                }
                Err(e) => warn!("Failed to listen on {}: {}", addr, e),
            }
        }

        Err(anyhow!("no free port in range {:?}", self.config.port_range))
    }

    fn connect_bootstrap_peers(&mut self) {
        let peers = add_bootstrap_peers(
            self.swarm.behaviour_mut().kademlia.as_mut(),
            &self.config.bootstrap_peers,
        );

        for (peer_id, addr) in &peers {
            self.state.remember_addr(*peer_id, addr.clone());
            let opts = DialOpts::peer_id(*peer_id).addresses(vec![addr.clone()]).build();
            if let Err(e) = self.swarm.dial(opts) {
                warn!("Failed to dial bootstrap peer {}: {}", peer_id, e);
            }
        }

        if peers.is_empty() {
            return;
        }
        if let Some(kademlia) = self.swarm.behaviour_mut().kademlia.as_mut() {
            if let Err(e) = kademlia.bootstrap() {
                debug!("Kademlia bootstrap not started: {:?}", e);
            }
        }
    }
}
