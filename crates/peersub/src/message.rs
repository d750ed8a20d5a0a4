//! Messages delivered on a subscription and peer descriptors used by discovery.

use libp2p::{Multiaddr, PeerId};

/// A message received on a topic subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    from: PeerId,
    data: Vec<u8>,
    seq: Vec<u8>,
    topics: Vec<String>,
}

impl Message {
    pub fn new(from: PeerId, data: Vec<u8>, seq: Vec<u8>, topics: Vec<String>) -> Self {
        Self { from, data, seq, topics }
    }

    /// Peer that originally published the message
    pub fn from(&self) -> PeerId {
        self.from
    }

    /// Raw payload
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Sequence token assigned by the publisher. Opaque, and not comparable
    /// across publishers.
    pub fn seq(&self) -> &[u8] {
        &self.seq
    }

    /// Topics the message was published under
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Take ownership of the payload
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// A peer identity plus the addresses it may be reachable on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    pub peer_id: PeerId,
    pub addrs: Vec<Multiaddr>,
}

impl PeerInfo {
    pub fn new(peer_id: PeerId, addrs: Vec<Multiaddr>) -> Self {
        Self { peer_id, addrs }
    }
}

impl From<PeerId> for PeerInfo {
    fn from(peer_id: PeerId) -> Self {
        Self { peer_id, addrs: Vec::new() }
    }
}
