//! State management for the peersub event loop.
//!
//! This module manages the state that lives next to the swarm but is not
//! part of the NetworkBehaviour: local subscriber queues, in-flight provider
//! queries and dials, and known peer addresses.

use std::{
    collections::{HashMap, HashSet},
    time::{SystemTime, UNIX_EPOCH},
};

use libp2p::{kad::QueryId, swarm::ConnectionId, Multiaddr, PeerId};
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::{
    error::HostError,
    message::{Message, PeerInfo},
};

/// Addresses remembered per peer
const MAX_ADDRS_PER_PEER: usize = 8;

/// A local subscription queue for one topic
pub struct LocalSubscriber {
    pub id: u64,
    pub sender: mpsc::Sender<Message>,
}

/// A provider lookup whose results are streamed to a consumer
pub struct ProviderQuery {
    pub sender: mpsc::Sender<PeerInfo>,
    pub remaining: usize,
    pub seen: HashSet<PeerId>,
}

/// Internal state for the peersub event loop
pub struct PeerSubBehaviourState {
    /// Local subscriber queues by topic
    pub subscribers: HashMap<String, Vec<LocalSubscriber>>,
    /// Provider lookups in flight
    pub provider_queries: HashMap<QueryId, ProviderQuery>,
    /// Outbound dials waiting for their outcome
    pub pending_dials: HashMap<ConnectionId, oneshot::Sender<Result<(), HostError>>>,
    /// Addresses learned through identify, mDNS and bootstrap config
    pub peer_addrs: HashMap<PeerId, Vec<Multiaddr>>,
    /// Our own listen addresses
    pub listen_addrs: Vec<Multiaddr>,
    subscriber_counter: u64,
    seqno: u64,
}

impl PeerSubBehaviourState {
    /// Create a new state instance
    pub fn new() -> Self {
        // Start sequence numbers at the current time so they keep increasing
        // across restarts of the same identity.
        let seqno = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();

        Self {
            subscribers: HashMap::new(),
            provider_queries: HashMap::new(),
            pending_dials: HashMap::new(),
            peer_addrs: HashMap::new(),
            listen_addrs: Vec::new(),
            subscriber_counter: 0,
            seqno,
        }
    }

    /// Next sequence number for a locally published message
    pub fn next_seqno(&mut self) -> u64 {
        self.seqno = self.seqno.wrapping_add(1);
        self.seqno
    }

    /// Register a local subscriber queue for `topic`, returning its id
    pub fn add_subscriber(&mut self, topic: &str, sender: mpsc::Sender<Message>) -> u64 {
        self.subscriber_counter += 1;
        let id = self.subscriber_counter;
        self.subscribers
            .entry(topic.to_string())
            .or_default()
            .push(LocalSubscriber { id, sender });
        id
    }

    /// Remove a subscriber. Returns true when it was the last one for the topic.
    pub fn remove_subscriber(&mut self, topic: &str, id: u64) -> bool {
        let Some(subscribers) = self.subscribers.get_mut(topic) else {
            return false;
        };

        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        let removed = subscribers.len() != before;

        if subscribers.is_empty() {
            self.subscribers.remove(topic);
            return removed;
        }
        false
    }

    /// Whether any local subscriber is registered for `topic`
    pub fn has_subscribers(&self, topic: &str) -> bool {
        self.subscribers.contains_key(topic)
    }

    /// Push `message` to every local subscriber of `topic`.
    ///
    /// Queues that are full drop the message; queues whose receiver is gone
    /// are pruned. Returns the number of queues that accepted it.
    pub fn deliver(&mut self, topic: &str, message: &Message) -> usize {
        let Some(subscribers) = self.subscribers.get_mut(topic) else {
            return 0;
        };

        let mut delivered = 0;
        subscribers.retain(|subscriber| match subscriber.sender.try_send(message.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(topic, subscriber = subscriber.id, "subscriber queue full, dropping message");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });

        delivered
    }

    /// Remember an address for `peer`
    pub fn remember_addr(&mut self, peer: PeerId, addr: Multiaddr) {
        let addrs = self.peer_addrs.entry(peer).or_default();
        if addrs.contains(&addr) {
            return;
        }
        if addrs.len() >= MAX_ADDRS_PER_PEER {
            addrs.remove(0);
        }
        addrs.push(addr);
    }

    /// Known addresses of `peer`
    pub fn addrs_of(&self, peer: &PeerId) -> Vec<Multiaddr> {
        self.peer_addrs.get(peer).cloned().unwrap_or_default()
    }
}

impl Default for PeerSubBehaviourState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(topic: &str) -> Message {
        Message::new(PeerId::random(), b"hello".to_vec(), vec![1], vec![topic.to_string()])
    }

    #[test]
    fn test_last_subscriber_removal_is_reported() {
        let mut state = PeerSubBehaviourState::new();
        let (tx1, _rx1) = mpsc::channel(1);
        let (tx2, _rx2) = mpsc::channel(1);

        let first = state.add_subscriber("news", tx1);
        let second = state.add_subscriber("news", tx2);
        assert_ne!(first, second);

        assert!(!state.remove_subscriber("news", first));
        assert!(state.has_subscribers("news"));
        assert!(state.remove_subscriber("news", second));
        assert!(!state.has_subscribers("news"));

        // Removing again is harmless
        assert!(!state.remove_subscriber("news", second));
    }

    #[test]
    fn test_deliver_fans_out_and_prunes_closed() {
        let mut state = PeerSubBehaviourState::new();
        let (tx1, mut rx1) = mpsc::channel(4);
        let (tx2, rx2) = mpsc::channel(4);
        state.add_subscriber("news", tx1);
        state.add_subscriber("news", tx2);
        drop(rx2);

        assert_eq!(state.deliver("news", &message("news")), 1);
        assert_eq!(state.subscribers["news"].len(), 1);
        assert!(rx1.try_recv().is_ok());

        assert_eq!(state.deliver("sports", &message("sports")), 0);
    }

    #[test]
    fn test_deliver_drops_when_queue_full() {
        let mut state = PeerSubBehaviourState::new();
        let (tx, mut rx) = mpsc::channel(1);
        state.add_subscriber("news", tx);

        assert_eq!(state.deliver("news", &message("news")), 1);
        assert_eq!(state.deliver("news", &message("news")), 0);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_seqno_increments() {
        let mut state = PeerSubBehaviourState::new();
        let a = state.next_seqno();
        let b = state.next_seqno();
        assert_eq!(b, a.wrapping_add(1));
    }

    #[test]
    fn test_remember_addr_dedupes_and_caps() {
        let mut state = PeerSubBehaviourState::new();
        let peer = PeerId::random();

        for port in 0..(MAX_ADDRS_PER_PEER as u16 + 2) {
            let addr: Multiaddr = format!("/ip4/127.0.0.1/tcp/{}", 5000 + port).parse().unwrap();
            state.remember_addr(peer, addr.clone());
            state.remember_addr(peer, addr);
        }

        let addrs = state.addrs_of(&peer);
        assert_eq!(addrs.len(), MAX_ADDRS_PER_PEER);
        assert_eq!(addrs[0], "/ip4/127.0.0.1/tcp/5002".parse::<Multiaddr>().unwrap());
        assert!(state.addrs_of(&PeerId::random()).is_empty());
    }
}
