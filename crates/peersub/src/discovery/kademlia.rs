//! Kademlia configuration for peersub nodes.
//!
//! Kademlia is the content router: discovery markers are announced as
//! provider records and looked up with `get_providers`.

use std::time::Duration;

use anyhow::Result;
use libp2p::{
    kad::{self, store::MemoryStore},
    Multiaddr, PeerId,
};
use tracing::{debug, warn};

use crate::network::split_peer_multiaddr;

/// Configure and create the Kademlia behaviour
pub fn configure_kademlia(local_peer_id: PeerId) -> Result<kad::Behaviour<MemoryStore>> {
    let store = MemoryStore::new(local_peer_id);
    let mut config = kad::Config::new(kad::PROTOCOL_NAME);

    config
        .set_query_timeout(Duration::from_secs(30))
        .set_record_ttl(Some(Duration::from_secs(60 * 60))) // 1 hour
        .set_provider_record_ttl(Some(Duration::from_secs(24 * 60 * 60))) // 24 hours
        .set_provider_publication_interval(Some(Duration::from_secs(12 * 60 * 60)));

    let mut kademlia = kad::Behaviour::with_config(local_peer_id, store, config);

    // Server mode so other subscribers can find our provider records
    kademlia.set_mode(Some(kad::Mode::Server));

    debug!("Kademlia initialized for peer {}", local_peer_id);
    Ok(kademlia)
}

/// Parse bootstrap peers and add them to Kademlia when it is enabled.
///
/// Returns the parsed peers with the address to dial them on. Addresses
/// without a `/p2p/` component are skipped.
pub fn add_bootstrap_peers(
    mut kademlia: Option<&mut kad::Behaviour<MemoryStore>>,
    bootstrap_peers: &[String],
) -> Vec<(PeerId, Multiaddr)> {
    let mut added = Vec::new();

    for peer_addr in bootstrap_peers {
        let addr = match peer_addr.parse::<Multiaddr>() {
            Ok(addr) => addr,
            Err(e) => {
                warn!("Failed to parse bootstrap peer address '{}': {}", peer_addr, e);
                continue;
            }
        };

        match split_peer_multiaddr(&addr) {
            Some((peer_id, transport_addr)) => {
                if let Some(kademlia) = kademlia.as_deref_mut() {
                    debug!("Adding bootstrap peer to Kademlia: {} at {}", peer_id, transport_addr);
                    kademlia.add_address(&peer_id, transport_addr.clone());
                }
                added.push((peer_id, transport_addr));
            }
            None => warn!("Bootstrap peer address '{}' has no peer id, skipping", peer_addr),
        }
    }

    added
}
