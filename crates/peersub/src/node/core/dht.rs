//! Kademlia operations backing the content router and the block store.
//!
//! Provider lookups stream each newly found peer to the consumer as soon as
//! Kademlia reports it, and the query is finished early once the requested
//! number of providers was delivered or the consumer went away.

use libp2p::kad::{self, GetProvidersOk, QueryId, QueryResult};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use super::PeerNode;
use crate::{
    content::ContentId,
    error::{RoutingError, StoreError},
    message::PeerInfo,
    network::ProviderQuery,
};

impl PeerNode {
    fn kademlia_mut(&mut self) -> Option<&mut kad::Behaviour<kad::store::MemoryStore>> {
        self.swarm.behaviour_mut().kademlia.as_mut()
    }

    /// Start a provider lookup for `key`, streaming up to `limit` peers to `sender`
    pub(crate) fn dht_get_providers(
        &mut self,
        key: ContentId,
        limit: usize,
        sender: mpsc::Sender<PeerInfo>,
    ) -> Result<(), RoutingError> {
        let kademlia = self.kademlia_mut().ok_or(RoutingError::Disabled)?;

        // Nothing to find; dropping the sender ends the stream right away
        if limit == 0 {
            return Ok(());
        }

        let query_id = kademlia.get_providers(key.record_key());
        debug!("Provider lookup for {} started: {:?}", key, query_id);

        self.state.provider_queries.insert(
            query_id,
            ProviderQuery { sender, remaining: limit, seen: Default::default() },
        );
        Ok(())
    }

    /// Announce this node as a provider for `data`
    pub(crate) fn dht_put_block(&mut self, data: Vec<u8>) -> Result<ContentId, StoreError> {
        let id = ContentId::of(&data);

        if let Some(kademlia) = self.kademlia_mut() {
            kademlia
                .start_providing(id.record_key())
                .map_err(|e| StoreError::Provide(e.to_string()))?;
            debug!("Providing block {}", id);
        }

        Ok(id)
    }

    pub(crate) fn handle_kademlia_event(&mut self, event: kad::Event) {
        match event {
            kad::Event::OutboundQueryProgressed { id, result, step, .. } => match result {
                QueryResult::GetProviders(result) => self.on_providers(id, result, step.last),
                QueryResult::StartProviding(Ok(ok)) => {
                    trace!("Provider record published for {:?}", ok.key);
                },
                QueryResult::StartProviding(Err(e)) => {
                    // Expected while the routing table is empty
                    debug!("Publishing provider record failed: {:?}", e);
                },
                QueryResult::Bootstrap(Ok(ok)) => {
                    debug!("Kademlia bootstrap step, {} buckets remaining", ok.num_remaining);
                },
                QueryResult::Bootstrap(Err(e)) => warn!("Kademlia bootstrap failed: {:?}", e),
                other => trace!("Unhandled Kademlia query result: {:?}", other),
            },
            kad::Event::RoutingUpdated { peer, addresses, .. } => {
                for addr in addresses.iter() {
                    self.state.remember_addr(peer, addr.clone());
                }
                trace!("Routing table updated with {}", peer);
            },
            other => trace!("Kademlia event: {:?}", other),
        }
    }

    fn on_providers(
        &mut self,
        id: QueryId,
        result: Result<GetProvidersOk, kad::GetProvidersError>,
        last: bool,
    ) {
        let Some(mut query) = self.state.provider_queries.remove(&id) else {
            return;
        };

        let mut done = last;
        match result {
            Ok(GetProvidersOk::FoundProviders { providers, .. }) => {
                for provider in providers {
                    if query.remaining == 0 {
                        break;
                    }
                    if provider == self.peer_id || !query.seen.insert(provider) {
                        continue;
                    }

                    let addrs = self.state.addrs_of(&provider);
                    match query.sender.try_send(PeerInfo::new(provider, addrs)) {
                        Ok(()) => query.remaining -= 1,
                        Err(mpsc::error::TrySendError::Full(_)) => {
                            warn!("Provider stream full, dropping {}", provider);
                        },
                        Err(mpsc::error::TrySendError::Closed(_)) => {
                            done = true;
                            break;
                        },
                    }
                }
                done |= query.remaining == 0;
            },
            Ok(GetProvidersOk::FinishedWithNoAdditionalRecord { .. }) => done = true,
            Err(e) => {
                info!("Provider lookup ended: {:?}", e);
                done = true;
            },
        }

        if query.sender.is_closed() {
            done = true;
        }
        if !done {
            self.state.provider_queries.insert(id, query);
            return;
        }

        if !last {
            if let Some(mut query) = self.kademlia_mut().and_then(|k| k.query_mut(&id)) {
                query.finish();
            }
        }
    }
}
