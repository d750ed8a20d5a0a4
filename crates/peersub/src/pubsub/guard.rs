//! Liveness guard shared by every facade operation.

use std::{fmt, sync::Arc};

use crate::interface::{ContentRouter, MessagingEngine, NetworkHost};

/// Handles to the routing subsystem, needed by discovery
#[derive(Clone)]
pub struct Routing {
    pub router: Arc<dyn ContentRouter>,
    pub host: Arc<dyn NetworkHost>,
}

impl Routing {
    pub fn new(router: Arc<dyn ContentRouter>, host: Arc<dyn NetworkHost>) -> Self {
        Self { router, host }
    }
}

/// Outcome of the liveness check
pub enum Liveness {
    /// Pub/sub is enabled and the node is online
    Ready { engine: Arc<dyn MessagingEngine>, routing: Routing },
    /// No messaging engine was configured for this node
    Disabled,
    /// The node's network/routing subsystem is not running
    Offline,
}

impl Liveness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Liveness::Ready { .. })
    }
}

impl fmt::Debug for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Liveness::Ready { .. } => f.write_str("Ready"),
            Liveness::Disabled => f.write_str("Disabled"),
            Liveness::Offline => f.write_str("Offline"),
        }
    }
}
