//! PeerNode event loop: drives the swarm and serves handle commands.

use futures::StreamExt;
use tracing::info;

use super::peer_node::PeerNode;
use crate::node::{command::Command, handle::NodeHandle};

impl PeerNode {
    /// Move the node onto its own task and return a handle to it
    pub fn spawn(self) -> NodeHandle {
        let handle = self.handle();
        tokio::spawn(self.run());
        handle
    }

    /// Run the event loop until the node lifetime is cancelled
    async fn run(mut self) {
        // Whatever ends the loop, the lifetime ends with it
        let _lifetime = self.lifetime.clone().drop_guard();

        info!("PeerNode event loop started for {}", self.peer_id);
        loop {
            tokio::select! {
                _ = self.lifetime.cancelled() => {
                    info!("Node lifetime ended, shutting down {}", self.peer_id);
                    break;
                }
                Some(command) = self.commands.recv() => self.handle_command(command),
                event = self.swarm.select_next_some() => self.handle_swarm_event(event),
            }
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Subscribe { topic, reply } => {
                let _ = reply.send(self.subscribe_to_topic(&topic));
            }
            Command::Unsubscribe { topic, id } => self.unsubscribe_from_topic(&topic, id),
            Command::Publish { topic, data, reply } => {
                let _ = reply.send(self.publish_to_topic(&topic, data));
            }
            Command::Topics { reply } => {
                let _ = reply.send(self.get_subscribed_topics());
            }
            Command::Peers { topic, reply } => {
                let _ = reply.send(self.get_topic_peers(topic.as_deref()));
            }
            Command::FindProviders { key, limit, sender, reply } => {
                let _ = reply.send(self.dht_get_providers(key, limit, sender));
            }
            Command::Connect { peer, reply } => self.connect_to_peer(peer, reply),
            Command::PutBlock { data, reply } => {
                let _ = reply.send(self.dht_put_block(data));
            }
            Command::ListenAddrs { reply } => {
                let _ = reply.send(self.state.listen_addrs.clone());
            }
            Command::ConnectedPeers { reply } => {
                let _ = reply.send(self.swarm.connected_peers().copied().collect());
            }
        }
    }
}
