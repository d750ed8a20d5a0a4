//! Node configuration methods for peersub.

use std::time::Duration;

use super::types::{NodeConfig, NodeConfigBuilder};
use crate::discovery::DiscoveryConfig;

impl NodeConfig {
    /// Enable or disable the messaging engine
    pub fn with_pubsub(mut self, enable: bool) -> Self {
        self.enable_pubsub = enable;
        self
    }

    /// Enable or disable mDNS discovery
    pub fn with_mdns(mut self, enable: bool) -> Self {
        self.enable_mdns = enable;
        self
    }

    /// Enable or disable Kademlia content routing
    pub fn with_kademlia(mut self, enable: bool) -> Self {
        self.enable_kademlia = enable;
        self
    }

    /// Set bootstrap peers
    pub fn with_bootstrap_peers(mut self, peers: Vec<String>) -> Self {
        self.bootstrap_peers = peers;
        self
    }

    /// Set keypair path
    pub fn with_keypair_path(mut self, path: String) -> Self {
        self.keypair_path = Some(path);
        self
    }

    /// Set port range
    pub fn with_port_range(mut self, range: (u16, u16)) -> Self {
        self.port_range = range;
        self
    }

    /// Set discovery limits
    pub fn with_discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.discovery = discovery;
        self
    }

    /// Ports to try, in order. A zero start means "any port".
    pub fn listen_ports(&self) -> Vec<u16> {
        let (start, end) = self.port_range;
        if start == 0 || end < start {
            vec![start]
        } else {
            (start..=end).collect()
        }
    }
}

impl NodeConfigBuilder {
    /// Build the configuration
    pub fn build(self) -> NodeConfig {
        self.config
    }

    /// Set port range
    pub fn port_range(mut self, range: (u16, u16)) -> Self {
        self.config.port_range = range;
        self
    }

    /// Set keypair path
    pub fn keypair_path(mut self, path: String) -> Self {
        self.config.keypair_path = Some(path);
        self
    }

    /// Add bootstrap peer
    pub fn bootstrap_peer(mut self, peer: String) -> Self {
        self.config.bootstrap_peers.push(peer);
        self
    }

    /// Enable pubsub
    pub fn enable_pubsub(mut self) -> Self {
        self.config.enable_pubsub = true;
        self
    }

    /// Disable pubsub; the facade then reports the feature as disabled
    pub fn disable_pubsub(mut self) -> Self {
        self.config.enable_pubsub = false;
        self
    }

    /// Enable Kademlia
    pub fn enable_kademlia(mut self) -> Self {
        self.config.enable_kademlia = true;
        self
    }

    /// Disable Kademlia
    pub fn disable_kademlia(mut self) -> Self {
        self.config.enable_kademlia = false;
        self
    }

    /// Enable mDNS
    pub fn enable_mdns(mut self) -> Self {
        self.config.enable_mdns = true;
        self
    }

    /// Disable mDNS
    pub fn disable_mdns(mut self) -> Self {
        self.config.enable_mdns = false;
        self
    }

    /// Set the gossipsub heartbeat interval
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.config.heartbeat_interval = interval;
        self
    }

    /// Set discovery limits
    pub fn discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.config.discovery = discovery;
        self
    }
}
