//! Commands sent from a [`NodeHandle`](super::NodeHandle) to the event loop.

use libp2p::{Multiaddr, PeerId};
use tokio::sync::{mpsc, oneshot};

use crate::{
    content::ContentId,
    error::{EngineError, HostError, RoutingError, StoreError},
    message::{Message, PeerInfo},
};

pub(crate) type Reply<T> = oneshot::Sender<T>;

pub(crate) enum Command {
    Subscribe {
        topic: String,
        reply: Reply<Result<(u64, mpsc::Receiver<Message>), EngineError>>,
    },
    Unsubscribe {
        topic: String,
        id: u64,
    },
    Publish {
        topic: String,
        data: Vec<u8>,
        reply: Reply<Result<(), EngineError>>,
    },
    Topics {
        reply: Reply<Result<Vec<String>, EngineError>>,
    },
    Peers {
        topic: Option<String>,
        reply: Reply<Result<Vec<PeerId>, EngineError>>,
    },
    FindProviders {
        key: ContentId,
        limit: usize,
        sender: mpsc::Sender<PeerInfo>,
        reply: Reply<Result<(), RoutingError>>,
    },
    Connect {
        peer: PeerInfo,
        reply: Reply<Result<(), HostError>>,
    },
    PutBlock {
        data: Vec<u8>,
        reply: Reply<Result<ContentId, StoreError>>,
    },
    ListenAddrs {
        reply: Reply<Vec<Multiaddr>>,
    },
    ConnectedPeers {
        reply: Reply<Vec<PeerId>>,
    },
}
