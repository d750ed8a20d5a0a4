//! Integration tests for peersub nodes
//!
//! These tests run real libp2p nodes on loopback with mDNS disabled.

mod common;

use std::time::Duration;

use common::init_tracing;
use peersub::{
    load_or_generate_keypair, Multiaddr, NodeConfig, NodeHandle, PeerId, PeerNode, PeersOptions,
    PubSubError, SubscribeOptions,
};
use tokio::time::timeout;

fn test_config() -> NodeConfig {
    NodeConfig::builder()
        .port_range((0, 0)) // Use random port for testing
        .disable_mdns()
        .heartbeat_interval(Duration::from_millis(100))
        .build()
}

async fn loopback_addr(handle: &NodeHandle) -> Multiaddr {
    for _ in 0..100 {
        let addr = handle
            .listen_addrs()
            .await
            .into_iter()
            .find(|a| a.to_string().starts_with("/ip4/127.0.0.1/"));
        if let Some(addr) = addr {
            return addr;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("node never reported a loopback listen address");
}

#[tokio::test]
async fn test_peer_node_with_config() {
    init_tracing();

    let result = PeerNode::with_config(test_config()).await;
    assert!(result.is_ok(), "Failed to create PeerNode with config: {:?}", result.err());

    let node = result.unwrap();
    assert_eq!(node.listeners().len(), 1);
}

#[tokio::test]
async fn test_publish_is_delivered_locally() {
    init_tracing();

    let handle = PeerNode::with_config(test_config()).await.unwrap().spawn();
    let pubsub = handle.pubsub();

    let mut sub = pubsub.subscribe("news", SubscribeOptions::new()).await.unwrap();
    assert_eq!(pubsub.topics().await.unwrap(), vec!["news"]);
    assert!(pubsub.peers(PeersOptions::new().topic("news")).await.unwrap().is_empty());

    pubsub.publish("news", "hello").await.unwrap();

    let message = sub.next_timeout(Duration::from_secs(2)).await.unwrap();
    assert_eq!(message.data(), b"hello");
    assert_eq!(message.from(), handle.peer_id());
    assert_eq!(message.seq().len(), 8);

    sub.close();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(pubsub.topics().await.unwrap().is_empty());

    handle.shutdown();
}

#[tokio::test]
async fn test_pubsub_disabled_node() {
    let config = NodeConfig::builder().port_range((0, 0)).disable_mdns().disable_pubsub().build();
    let handle = PeerNode::with_config(config).await.unwrap().spawn();

    let result = handle.pubsub().subscribe("news", SubscribeOptions::new()).await;
    assert!(matches!(result, Err(PubSubError::FeatureDisabled)));

    handle.shutdown();
}

#[tokio::test]
async fn test_node_lifecycle() {
    init_tracing();

    let handle = PeerNode::with_config(test_config()).await.unwrap().spawn();
    let pubsub = handle.pubsub();
    assert!(handle.is_running());

    let mut sub = pubsub.subscribe("news", SubscribeOptions::new().discover(true)).await.unwrap();

    handle.shutdown();
    assert!(!handle.is_running());
    assert!(matches!(pubsub.publish("news", "hi").await, Err(PubSubError::NodeOffline)));

    // The engine behind the subscription is gone with the event loop
    let next = timeout(Duration::from_secs(2), sub.next()).await.unwrap();
    assert!(matches!(next, Err(PubSubError::Closed)));
}

#[tokio::test]
async fn test_two_nodes_exchange_messages() {
    init_tracing();

    let a = PeerNode::with_config(test_config()).await.unwrap().spawn();
    let addr = loopback_addr(&a).await;

    let b = PeerNode::with_config(config_via(&addr, a.peer_id())).await.unwrap().spawn();
    assert!(wait_connected(&b, a.peer_id(), Duration::from_secs(5)).await, "nodes did not connect");

    let _sub_a = a.pubsub().subscribe("news", SubscribeOptions::new()).await.unwrap();
    let mut sub_b = b.pubsub().subscribe("news", SubscribeOptions::new()).await.unwrap();

    // The mesh forms over a few heartbeats, so keep publishing until it arrives
    let received = timeout(Duration::from_secs(10), async {
        loop {
            a.pubsub().publish("news", "from a").await.unwrap();
            if let Ok(message) = sub_b.next_timeout(Duration::from_millis(200)).await {
                return message;
            }
        }
    })
    .await
    .expect("message never reached the second node");

    assert_eq!(received.data(), b"from a");
    assert_eq!(received.from(), a.peer_id());
    assert!(b.pubsub().peers(PeersOptions::new()).await.unwrap().contains(&a.peer_id()));

    a.shutdown();
    b.shutdown();
}

fn config_via(hub: &Multiaddr, hub_id: PeerId) -> NodeConfig {
    NodeConfig::builder()
        .port_range((0, 0))
        .disable_mdns()
        .heartbeat_interval(Duration::from_millis(100))
        .bootstrap_peer(format!("{hub}/p2p/{hub_id}"))
        .build()
}

async fn wait_connected(handle: &NodeHandle, peer: PeerId, limit: Duration) -> bool {
    timeout(limit, async {
        while !handle.connected_peers().await.contains(&peer) {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .is_ok()
}

#[tokio::test]
async fn test_discovery_connects_subscribers() {
    init_tracing();

    let hub = PeerNode::with_config(test_config()).await.unwrap().spawn();
    let hub_addr = loopback_addr(&hub).await;

    // B is only reachable through its facade; the handle that spawned it is gone
    let b = PeerNode::with_config(config_via(&hub_addr, hub.peer_id())).await.unwrap().spawn();
    let b_id = b.peer_id();
    let b_lifetime = b.lifetime();
    let b_pubsub = b.pubsub();
    drop(b);

    let c = PeerNode::with_config(config_via(&hub_addr, hub.peer_id())).await.unwrap().spawn();
    assert!(wait_connected(&c, hub.peer_id(), Duration::from_secs(5)).await);

    let _sub_b = b_pubsub.subscribe("news", SubscribeOptions::new().discover(true)).await.unwrap();

    // Provider records need a moment to reach the hub, so retry the lookup
    let c_pubsub = c.pubsub();
    let mut subs = Vec::new();
    let mut found = false;
    for _ in 0..5 {
        subs.push(c_pubsub.subscribe("news", SubscribeOptions::new().discover(true)).await.unwrap());
        if wait_connected(&c, b_id, Duration::from_secs(3)).await {
            found = true;
            break;
        }
    }
    assert!(found, "discovery never connected the two subscribers");

    hub.shutdown();
    c.shutdown();
    b_lifetime.cancel();
}

#[test]
fn test_keypair_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keys").join("node.key");

    let first = load_or_generate_keypair(&path).unwrap();
    assert!(path.exists());
    let second = load_or_generate_keypair(&path).unwrap();

    assert_eq!(first.public().to_peer_id(), second.public().to_peer_id());
}

#[tokio::test]
async fn test_identity_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("node.key").to_string_lossy().into_owned();

    let config = test_config().with_keypair_path(path.clone());
    let first = PeerNode::with_config(config.clone()).await.unwrap().peer_id();
    let second = PeerNode::with_config(config).await.unwrap().peer_id();

    assert_eq!(first, second);
}
