//! mDNS configuration for peersub nodes.

use libp2p::{mdns, PeerId};
use tracing::{info, warn};

/// Create mDNS for local peer discovery.
///
/// Returns `None` when the platform or network does not allow it; peers
/// are then found through Kademlia and bootstrap peers only.
pub fn configure_mdns(local_peer_id: PeerId) -> Option<mdns::tokio::Behaviour> {
    match mdns::tokio::Behaviour::new(mdns::Config::default(), local_peer_id) {
        Ok(behaviour) => {
            info!("mDNS local peer discovery enabled");
            Some(behaviour)
        }
        Err(e) => {
            warn!("Failed to enable mDNS (platform limitation or network config): {}", e);
            None
        }
    }
}
