//! Network events for peersub.
//!
//! This module defines the events emitted by the peersub network behaviour
//! and the conversions from each sub-behaviour's events.

use libp2p::{gossipsub, identify, kad, mdns};

/// Events emitted by the PeerSubBehaviour
#[derive(Debug)]
pub enum PeerSubEvent {
    /// Gossipsub event (messages, topic membership)
    Gossipsub(gossipsub::Event),
    /// Kademlia event (provider queries, routing updates)
    Kademlia(kad::Event),
    /// Identify event (peer listen addresses)
    Identify(Box<identify::Event>),
    /// mDNS event (local peers)
    Mdns(mdns::Event),
}

impl From<gossipsub::Event> for PeerSubEvent {
    fn from(event: gossipsub::Event) -> Self {
        PeerSubEvent::Gossipsub(event)
    }
}

impl From<kad::Event> for PeerSubEvent {
    fn from(event: kad::Event) -> Self {
        PeerSubEvent::Kademlia(event)
    }
}

impl From<identify::Event> for PeerSubEvent {
    fn from(event: identify::Event) -> Self {
        PeerSubEvent::Identify(Box::new(event))
    }
}

impl From<mdns::Event> for PeerSubEvent {
    fn from(event: mdns::Event) -> Self {
        PeerSubEvent::Mdns(event)
    }
}
