//! Outbound dials requested through the network host.

use libp2p::swarm::{
    dial_opts::{DialOpts, PeerCondition},
    ConnectionId,
};
use tracing::debug;

use super::PeerNode;
use crate::{error::HostError, message::PeerInfo, node::command::Reply};

impl PeerNode {
    /// Dial `peer` and reply once the connection is up or the dial failed
    pub(crate) fn connect_to_peer(&mut self, peer: PeerInfo, reply: Reply<Result<(), HostError>>) {
        if self.swarm.is_connected(&peer.peer_id) {
            let _ = reply.send(Ok(()));
            return;
        }

        for addr in &peer.addrs {
            self.state.remember_addr(peer.peer_id, addr.clone());
        }

        let opts = DialOpts::peer_id(peer.peer_id)
            .addresses(self.state.addrs_of(&peer.peer_id))
            .condition(PeerCondition::Always)
            .extend_addresses_through_behaviour()
            .build();
        let connection_id = opts.connection_id();

        match self.swarm.dial(opts) {
            Ok(()) => {
                debug!("Dialing {}", peer.peer_id);
                self.state.pending_dials.insert(connection_id, reply);
            },
            Err(e) => {
                let _ = reply.send(Err(HostError::Dial(e.to_string())));
            },
        }
    }

    /// Settle a pending dial, if `connection_id` belongs to one
    pub(crate) fn resolve_dial(&mut self, connection_id: ConnectionId, result: Result<(), HostError>) {
        if let Some(reply) = self.state.pending_dials.remove(&connection_id) {
            let _ = reply.send(result);
        }
    }
}
