//! Node configuration types for peersub.
//!
//! This module defines the configuration data structures for peersub nodes.

use std::time::Duration;

use crate::{discovery::DiscoveryConfig, DEFAULT_PORT_RANGE};

/// Configuration options for a peersub node
#[derive(Debug, Clone,)]
pub struct NodeConfig {
    /// The port range to listen on; `(0, 0)` picks a random port
    pub port_range: (u16, u16,),

    /// Path to keypair file (will be generated if it doesn't exist)
    pub keypair_path: Option<String,>,

    /// Bootstrap peers to connect to, as `/.../p2p/<peer id>` multiaddrs
    pub bootstrap_peers: Vec<String,>,

    /// Whether the messaging engine (gossipsub) is enabled
    pub enable_pubsub: bool,

    /// Whether to enable Kademlia content routing
    pub enable_kademlia: bool,

    /// Whether to enable mDNS discovery
    pub enable_mdns: bool,

    /// Gossipsub heartbeat interval
    pub heartbeat_interval: Duration,

    /// Limits for topic discovery on subscribe
    pub discovery: DiscoveryConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            port_range: DEFAULT_PORT_RANGE,
            keypair_path: None,
            bootstrap_peers: Vec::new(),
            enable_pubsub: true,
            enable_kademlia: true,
            enable_mdns: true,
            heartbeat_interval: Duration::from_secs(1),
            discovery: DiscoveryConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Create a new configuration builder
    pub fn builder() -> NodeConfigBuilder {
        NodeConfigBuilder::default()
    }
}

/// Builder for NodeConfig
#[derive(Default,)]
pub struct NodeConfigBuilder {
    pub(crate) config: NodeConfig,
}
