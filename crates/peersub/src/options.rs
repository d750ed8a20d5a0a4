//! Per-call options for the pub/sub facade.

/// Options for [`PubSub::subscribe`](crate::PubSub::subscribe)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Advertise interest in the topic and dial other subscribers found
    /// through content routing
    pub discover: bool,
}

impl SubscribeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable discovery
    pub fn discover(mut self, enable: bool) -> Self {
        self.discover = enable;
        self
    }
}

/// Options for [`PubSub::peers`](crate::PubSub::peers)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeersOptions {
    /// Only list peers of this topic. `None` lists peers of every topic.
    pub topic: Option<String>,
}

impl PeersOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the listing to one topic
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert!(!SubscribeOptions::new().discover);
        assert_eq!(PeersOptions::new().topic, None);
    }

    #[test]
    fn test_builders() {
        assert!(SubscribeOptions::new().discover(true).discover);
        assert_eq!(PeersOptions::new().topic("news").topic.as_deref(), Some("news"));
    }
}
