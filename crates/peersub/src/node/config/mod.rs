//! Node configuration for peersub.
//!
//! This module defines the configuration options for peersub nodes.

mod methods;
mod types;

pub use types::{NodeConfig, NodeConfigBuilder};
