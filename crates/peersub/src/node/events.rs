//! Swarm event handling for peersub nodes.

use libp2p::{identify, mdns, swarm::SwarmEvent};
use tracing::{debug, info, warn};

use crate::{error::HostError, network::PeerSubEvent, node::core::PeerNode};

impl PeerNode {
    /// Handle swarm events
    pub(crate) fn handle_swarm_event(&mut self, event: SwarmEvent<PeerSubEvent>) {
        match event {
            SwarmEvent::Behaviour(event) => self.handle_behaviour_event(event),
            SwarmEvent::NewListenAddr { address, .. } => {
                info!("Listening on {}/p2p/{}", address, self.peer_id);
                if !self.state.listen_addrs.contains(&address) {
                    self.state.listen_addrs.push(address);
                }
            },
            SwarmEvent::ExpiredListenAddr { address, .. } => {
                debug!("Listen address expired: {}", address);
                self.state.listen_addrs.retain(|a| a != &address);
            },
            SwarmEvent::ConnectionEstablished { peer_id, connection_id, endpoint, .. } => {
                info!("Connection established with {} via {}", peer_id, endpoint.get_remote_address());
                self.resolve_dial(connection_id, Ok(()));
            },
            SwarmEvent::ConnectionClosed { peer_id, endpoint, cause, .. } => {
                info!(
                    "Connection closed with {} via {} (cause: {:?})",
                    peer_id,
                    endpoint.get_remote_address(),
                    cause
                );
            },
            SwarmEvent::OutgoingConnectionError { connection_id, peer_id, error, .. } => {
                match peer_id {
                    Some(peer_id) => warn!("Outgoing connection error to {}: {}", peer_id, error),
                    None => warn!("Outgoing connection error: {}", error),
                }
                self.resolve_dial(connection_id, Err(HostError::Dial(error.to_string())));
            },
            SwarmEvent::IncomingConnectionError { local_addr, send_back_addr, error, .. } => {
                debug!(
                    "Incoming connection error from {} to {}: {}",
                    send_back_addr, local_addr, error
                );
            },
            _ => {},
        }
    }

    fn handle_behaviour_event(&mut self, event: PeerSubEvent) {
        match event {
            PeerSubEvent::Gossipsub(event) => self.handle_gossipsub_event(event),
            PeerSubEvent::Kademlia(event) => self.handle_kademlia_event(event),
            PeerSubEvent::Identify(event) => {
                if let identify::Event::Received { peer_id, info, .. } = *event {
                    debug!("Identified {} ({})", peer_id, info.agent_version);
                    for addr in info.listen_addrs {
                        self.state.remember_addr(peer_id, addr.clone());
                        if let Some(kademlia) = self.swarm.behaviour_mut().kademlia.as_mut() {
                            kademlia.add_address(&peer_id, addr);
                        }
                    }
                }
            },
            PeerSubEvent::Mdns(mdns::Event::Discovered(peers)) => {
                for (peer_id, addr) in peers {
                    info!("Discovered peer {} via mDNS at {}", peer_id, addr);
                    self.state.remember_addr(peer_id, addr.clone());
                    if let Some(kademlia) = self.swarm.behaviour_mut().kademlia.as_mut() {
                        kademlia.add_address(&peer_id, addr.clone());
                    }
                    if !self.swarm.is_connected(&peer_id) {
                        if let Err(e) = self.swarm.dial(addr) {
                            debug!("Failed to dial mDNS peer {}: {}", peer_id, e);
                        }
                    }
                }
            },
            PeerSubEvent::Mdns(mdns::Event::Expired(peers)) => {
                for (peer_id, addr) in peers {
                    debug!("mDNS record expired for {} at {}", peer_id, addr);
                }
            },
        }
    }
}
