//! Peer discovery for peersub.
//!
//! Topic discovery (the bootstrap run on subscribe) sits on top of the
//! network-level mechanisms configured here: Kademlia and mDNS.

pub mod bootstrap;
pub mod kademlia;
pub mod mdns;

// Re-export main items
pub use bootstrap::{
    discovery_key, discovery_marker, Bootstrap, BootstrapReport, DiscoveryConfig,
    CONNECT_TIMEOUT, DISCOVERY_NAMESPACE, MAX_PROVIDERS,
};
pub use kademlia::{add_bootstrap_peers, configure_kademlia};
pub use mdns::configure_mdns;
