//! Main peersub node implementation.
//!
//! This module contains the core PeerNode struct and its methods, split by
//! the concern each one serves in the event loop.

mod connect;
mod dht;
mod gossipsub;
mod node_methods;
mod peer_node;
mod run;

pub use gossipsub::SUBSCRIBER_QUEUE_SIZE;
pub use peer_node::PeerNode;
