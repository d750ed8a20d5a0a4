//! Network helpers for peersub.

use libp2p::{multiaddr::Protocol, Multiaddr, PeerId};

/// Split `/.../p2p/<id>` into the peer id and its transport address
pub fn split_peer_multiaddr(addr: &Multiaddr) -> Option<(PeerId, Multiaddr)> {
    let mut transport = addr.clone();
    match transport.pop() {
        Some(Protocol::P2p(peer_id)) => Some((peer_id, transport)),
        _ => None,
    }
}
