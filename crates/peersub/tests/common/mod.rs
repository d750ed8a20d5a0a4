//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use futures::{
    stream::{self, BoxStream},
    StreamExt,
};
use peersub::{
    ContentId, ContentRouter, EngineError, EngineSubscription, HostError, MarkerStore, Message,
    MessagingEngine, NetworkHost, PeerId, PeerInfo, PubSub, RoutingError, StoreError,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Engine that delivers published messages to its own subscriptions
#[derive(Default)]
pub struct MockEngine {
    topics: Mutex<Vec<String>>,
    queues: Mutex<HashMap<String, Vec<mpsc::Sender<Message>>>>,
    peers: Mutex<Vec<(PeerId, String)>>,
    pub reject_subscribe: bool,
    pub reject_publish: bool,
    pub cancels: Arc<AtomicUsize>,
    local: Option<PeerId>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self { local: Some(PeerId::random()), ..Default::default() }
    }

    pub fn rejecting() -> Self {
        Self { reject_subscribe: true, reject_publish: true, ..Self::new() }
    }

    pub fn add_peer(&self, peer: PeerId, topic: &str) {
        self.peers.lock().unwrap().push((peer, topic.to_string()));
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessagingEngine for MockEngine {
    async fn subscribe(&self, topic: &str) -> Result<Box<dyn EngineSubscription>, EngineError> {
        if self.reject_subscribe {
            return Err(EngineError::Subscription("rejected".into()));
        }

        let (sender, receiver) = mpsc::channel(16);
        self.queues.lock().unwrap().entry(topic.to_string()).or_default().push(sender);
        let mut topics = self.topics.lock().unwrap();
        if !topics.iter().any(|t| t == topic) {
            topics.push(topic.to_string());
        }

        Ok(Box::new(MockSubscription {
            topic: topic.to_string(),
            messages: tokio::sync::Mutex::new(receiver),
            cancelled: CancellationToken::new(),
            cancels: self.cancels.clone(),
        }))
    }

    async fn publish(&self, topic: &str, data: Vec<u8>) -> Result<(), EngineError> {
        if self.reject_publish {
            return Err(EngineError::Publish("rejected".into()));
        }

        let from = self.local.unwrap_or_else(PeerId::random);
        let message = Message::new(from, data, vec![1], vec![topic.to_string()]);
        if let Some(queues) = self.queues.lock().unwrap().get(topic) {
            for queue in queues {
                let _ = queue.try_send(message.clone());
            }
        }
        Ok(())
    }

    async fn topics(&self) -> Result<Vec<String>, EngineError> {
        Ok(self.topics.lock().unwrap().clone())
    }

    async fn peers(&self, topic: Option<&str>) -> Result<Vec<PeerId>, EngineError> {
        Ok(self
            .peers
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, t)| topic.map_or(true, |topic| topic == t))
            .map(|(peer, _)| *peer)
            .collect())
    }
}

pub struct MockSubscription {
    topic: String,
    messages: tokio::sync::Mutex<mpsc::Receiver<Message>>,
    cancelled: CancellationToken,
    cancels: Arc<AtomicUsize>,
}

#[async_trait]
impl EngineSubscription for MockSubscription {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn next(&self) -> Result<Message, EngineError> {
        let mut messages = tokio::select! {
            biased;
            _ = self.cancelled.cancelled() => return Err(EngineError::Closed),
            messages = self.messages.lock() => messages,
        };
        tokio::select! {
            biased;
            _ = self.cancelled.cancelled() => Err(EngineError::Closed),
            message = messages.recv() => message.ok_or(EngineError::Closed),
        }
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.cancelled.cancel();
    }
}

/// Router that hands out a fixed provider list, regardless of the limit
#[derive(Default)]
pub struct MockRouter {
    pub providers: Vec<PeerInfo>,
    pub fail: bool,
    /// Keep the stream open after the last provider
    pub hang: bool,
    pub queries: AtomicUsize,
    pub keys: Mutex<Vec<(ContentId, usize)>>,
}

impl MockRouter {
    pub fn with_providers(providers: Vec<PeerInfo>) -> Self {
        Self { providers, ..Default::default() }
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentRouter for MockRouter {
    async fn find_providers(
        &self,
        key: ContentId,
        limit: usize,
    ) -> Result<BoxStream<'static, PeerInfo>, RoutingError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.keys.lock().unwrap().push((key, limit));
        if self.fail {
            return Err(RoutingError::Query("no route".into()));
        }

        let found = stream::iter(self.providers.clone());
        if self.hang {
            Ok(found.chain(stream::pending()).boxed())
        } else {
            Ok(found.boxed())
        }
    }
}

/// How the mock host answers a connect for one peer
#[derive(Debug, Clone, Copy)]
pub enum Dial {
    Ok,
    Fail,
    Hang,
    After(Duration),
}

#[derive(Default)]
pub struct MockHost {
    pub dials: HashMap<PeerId, Dial>,
    pub attempts: Mutex<Vec<PeerId>>,
    pub in_flight: Arc<AtomicUsize>,
}

impl MockHost {
    pub fn with_dials(dials: impl IntoIterator<Item = (PeerId, Dial)>) -> Self {
        Self { dials: dials.into_iter().collect(), ..Default::default() }
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl NetworkHost for MockHost {
    async fn connect(&self, peer: PeerInfo) -> Result<(), HostError> {
        self.attempts.lock().unwrap().push(peer.peer_id);
        let _guard = InFlight::enter(&self.in_flight);

        match self.dials.get(&peer.peer_id).copied().unwrap_or(Dial::Ok) {
            Dial::Ok => Ok(()),
            Dial::Fail => Err(HostError::Dial("connection refused".into())),
            Dial::Hang => futures::future::pending().await,
            Dial::After(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            },
        }
    }
}

#[derive(Default)]
pub struct MockStore {
    pub fail: bool,
    pub puts: AtomicUsize,
    pub stored: Mutex<Vec<Vec<u8>>>,
}

impl MockStore {
    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarkerStore for MockStore {
    async fn put(&self, data: Vec<u8>) -> Result<ContentId, StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(StoreError::Provide("disk full".into()));
        }
        let id = ContentId::of(&data);
        self.stored.lock().unwrap().push(data);
        Ok(id)
    }
}

pub fn providers(n: usize) -> Vec<PeerInfo> {
    (0..n).map(|_| PeerInfo::from(PeerId::random())).collect()
}

/// Collaborators of a fully wired facade, kept so tests can inspect them
pub struct Harness {
    pub engine: Arc<MockEngine>,
    pub router: Arc<MockRouter>,
    pub host: Arc<MockHost>,
    pub store: Arc<MockStore>,
    pub blocks: Arc<dyn MarkerStore>,
    pub lifetime: CancellationToken,
    pub pubsub: PubSub,
}

impl Harness {
    pub fn new(router: MockRouter, host: MockHost) -> Self {
        Self::with_engine(MockEngine::new(), router, host, MockStore::default())
    }

    pub fn with_engine(engine: MockEngine, router: MockRouter, host: MockHost, store: MockStore) -> Self {
        let engine = Arc::new(engine);
        let router = Arc::new(router);
        let host = Arc::new(host);
        let store = Arc::new(store);
        let blocks: Arc<dyn MarkerStore> = store.clone();
        let lifetime = CancellationToken::new();

        let pubsub = PubSub::builder(lifetime.clone())
            .engine(engine.clone())
            .router(router.clone())
            .host(host.clone())
            .blocks(&blocks)
            .build();

        Self { engine, router, host, store, blocks, lifetime, pubsub }
    }
}

/// Poll `check` until it holds or `limit` elapses
pub async fn wait_for(limit: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
