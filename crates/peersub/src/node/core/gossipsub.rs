//! Gossipsub-backed messaging engine methods for PeerNode.
//!
//! Several local subscriptions may share one gossipsub topic. Each gets its
//! own queue; the node leaves the gossipsub topic when the last one goes.

use libp2p::{
    gossipsub::{self, IdentTopic, TopicHash},
    PeerId,
};
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::{error::EngineError, message::Message, node::core::peer_node::PeerNode};

/// Messages buffered per local subscription before new ones are dropped
pub const SUBSCRIBER_QUEUE_SIZE: usize = 32;

impl PeerNode {
    fn gossipsub_mut(&mut self) -> Result<&mut gossipsub::Behaviour, EngineError> {
        self.swarm.behaviour_mut().gossipsub.as_mut().ok_or(EngineError::Disabled)
    }

    fn gossipsub(&self) -> Result<&gossipsub::Behaviour, EngineError> {
        self.swarm.behaviour().gossipsub.as_ref().ok_or(EngineError::Disabled)
    }

    /// Subscribe to a topic and register a new local subscriber queue
    pub(crate) fn subscribe_to_topic(
        &mut self,
        topic_name: &str,
    ) -> Result<(u64, mpsc::Receiver<Message>), EngineError> {
        let topic = IdentTopic::new(topic_name);
        let newly_joined = self
            .gossipsub_mut()?
            .subscribe(&topic)
            .map_err(|e| EngineError::Subscription(e.to_string()))?;

        if newly_joined {
            info!("Joined gossipsub topic {}", topic_name);
        }

        let (sender, receiver) = mpsc::channel(SUBSCRIBER_QUEUE_SIZE);
        let id = self.state.add_subscriber(topic_name, sender);
        debug!("Local subscriber {} registered on topic {}", id, topic_name);

        Ok((id, receiver))
    }

    /// Drop a local subscriber; leave the topic when it was the last one
    pub(crate) fn unsubscribe_from_topic(&mut self, topic_name: &str, id: u64) {
        if !self.state.remove_subscriber(topic_name, id) {
            debug!("Local subscriber {} removed from topic {}", id, topic_name);
            return;
        }

        let Ok(gossipsub) = self.gossipsub_mut() else {
            return;
        };
        if gossipsub.unsubscribe(&IdentTopic::new(topic_name)) {
            info!("Left gossipsub topic {}", topic_name);
        }
    }

    /// Publish a message to a topic.
    ///
    /// Local subscribers of the topic receive the message too.
    pub(crate) fn publish_to_topic(&mut self, topic_name: &str, data: Vec<u8>) -> Result<(), EngineError> {
        let topic = IdentTopic::new(topic_name);

        match self.gossipsub_mut()?.publish(topic, data.clone()) {
            Ok(_) => debug!("Published message to topic {}", topic_name),
            Err(gossipsub::PublishError::NoPeersSubscribedToTopic) => {
                debug!("No peers on topic {} yet, message delivered locally only", topic_name)
            }
            Err(e) => return Err(EngineError::Publish(e.to_string())),
        }

        let seq = self.state.next_seqno().to_be_bytes().to_vec();
        let message = Message::new(self.peer_id, data, seq, vec![topic_name.to_string()]);
        self.state.deliver(topic_name, &message);
        Ok(())
    }

    /// Peers subscribed to a topic, or to any topic
    pub(crate) fn get_topic_peers(&self, topic: Option<&str>) -> Result<Vec<PeerId>, EngineError> {
        let topic_hash = topic.map(TopicHash::from_raw);
        let peers = self
            .gossipsub()?
            .all_peers()
            .filter(|(_, topics)| match &topic_hash {
                Some(hash) => topics.contains(&hash),
                None => true,
            })
            .map(|(peer, _)| *peer)
            .collect();
        Ok(peers)
    }

    /// Get all subscribed topics
    pub(crate) fn get_subscribed_topics(&self) -> Result<Vec<String>, EngineError> {
        Ok(self.gossipsub()?.topics().map(|t| t.to_string()).collect())
    }

    pub(crate) fn handle_gossipsub_event(&mut self, event: gossipsub::Event) {
        match event {
            gossipsub::Event::Message { propagation_source, message, .. } => {
                let topic = message.topic.to_string();
                let seq = message
                    .sequence_number
                    .map(|seq| seq.to_be_bytes().to_vec())
                    .unwrap_or_default();
                let from = message.source.unwrap_or(propagation_source);

                let message = Message::new(from, message.data, seq, vec![topic.clone()]);
                let delivered = self.state.deliver(&topic, &message);
                trace!("Message from {} on {} delivered to {} subscribers", from, topic, delivered);
            }
            gossipsub::Event::Subscribed { peer_id, topic } => {
                debug!("Peer {} subscribed to {}", peer_id, topic);
            }
            gossipsub::Event::Unsubscribed { peer_id, topic } => {
                debug!("Peer {} unsubscribed from {}", peer_id, topic);
            }
            other => trace!("Unhandled gossipsub event: {:?}", other),
        }
    }
}
