//! peersub - topic publish/subscribe over a libp2p overlay
//!
//! This library exposes a small pub/sub facade ([`PubSub`]) on top of a
//! gossip messaging engine, together with an opportunistic discovery
//! bootstrap: subscribing with discovery enabled advertises the local node
//! as a provider of the topic's discovery marker and dials other providers
//! in the background.
//!
//! The collaborators the facade relies on are traits (see [`interface`]), and
//! [`PeerNode`] provides a libp2p implementation of all of them.

pub mod content;
pub mod discovery;
pub mod error;
pub mod interface;
pub mod message;
pub mod network;
pub mod node;
pub mod options;
pub mod pubsub;

// Re-export main types
pub use content::ContentId;
pub use discovery::{Bootstrap, BootstrapReport, DiscoveryConfig};
pub use error::{EngineError, HostError, PubSubError, Result, RoutingError, StoreError};
pub use interface::{ContentRouter, EngineSubscription, MarkerStore, MessagingEngine, NetworkHost};
pub use message::{Message, PeerInfo};
pub use node::{load_or_generate_keypair, NodeConfig, NodeConfigBuilder, NodeHandle, PeerNode};
pub use options::{PeersOptions, SubscribeOptions};
pub use pubsub::{Liveness, PubSub, PubSubBuilder, Routing, Subscription, SubscriptionCloser};

/// Re-exported so callers can name peer ids and addresses without a direct libp2p dependency
pub use libp2p::{Multiaddr, PeerId};

/// The version of the peersub protocol, advertised through identify
pub const PROTOCOL_VERSION: &str = "/peersub/1.0.0";

/// Default port range for peersub nodes
pub const DEFAULT_PORT_RANGE: (u16, u16) = (4100, 4110);
