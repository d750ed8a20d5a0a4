//! Network module for peersub.
//!
//! This module contains the libp2p network behaviour, its events, and the
//! state the node's event loop keeps next to the swarm.

pub mod behaviour;
pub mod events;
pub mod helpers;
pub mod state;

// Re-export main types
pub use behaviour::PeerSubBehaviour;
pub use events::PeerSubEvent;
pub use helpers::split_peer_multiaddr;
pub use state::{LocalSubscriber, PeerSubBehaviourState, ProviderQuery};
