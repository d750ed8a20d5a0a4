//! Node module for peersub.
//!
//! This module contains all node-related functionality including
//! configuration, the swarm event loop, and the handle used to talk to it.

mod command;
pub mod config;
pub mod core;
pub mod crypto;
mod events;
pub mod handle;

// Re-export main types
pub use config::{NodeConfig, NodeConfigBuilder};
pub use core::{PeerNode, SUBSCRIBER_QUEUE_SIZE};
pub use crypto::load_or_generate_keypair;
pub use handle::NodeHandle;
