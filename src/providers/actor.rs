use std::time::Instant;

use flume::{Receiver, Selector, Sender};
use tracing::{debug, trace};

use crate::{
    context::{Context, Selected},
    Key, PeerId,
};

use super::{config::Config, store::ProviderStore};

#[derive(Debug)]
pub(crate) enum ActorMessage {
    AddProvider(Key, PeerId),
    GetProviders(Key, Sender<Vec<PeerId>>),
    GetLocal(Sender<Vec<Key>>),
}

#[derive(Debug)]
pub(crate) struct Actor {
    ctx: Context,
    store: ProviderStore,
    receiver: Receiver<ActorMessage>,
    config: Config,
}

impl Actor {
    pub fn new(
        ctx: Context,
        local: PeerId,
        config: Config,
        receiver: Receiver<ActorMessage>,
    ) -> Self {
        let sentinel = PeerId::derive_sentinel(&config.sentinel_seed);

        let store = ProviderStore::new(local, sentinel, config.provider_ttl, config.sentinel_ttl);

        Self {
            ctx,
            store,
            receiver,
            config,
        }
    }

    /// Process messages and sweeps one at a time until the governing context is
    /// cancelled or every handle is dropped.
    pub fn run(mut self) {
        debug!(local = %self.store.local_peer(), "Provider manager started");

        let mut next_sweep = Instant::now() + self.config.sweep_interval;

        loop {
            let selector = Selector::new().recv(&self.receiver, |message| match message {
                Ok(message) => Selected::Ready(Some(message)),
                // Every handle was dropped.
                Err(_) => Selected::Ready(None),
            });

            match self.ctx.select(selector, Some(next_sweep)) {
                Selected::Ready(Some(message)) => self.handle(message),
                Selected::Ready(None) => {
                    debug!("Provider manager handles were dropped");
                    break;
                }
                Selected::Cancelled => {
                    debug!("Provider manager context was cancelled");
                    break;
                }
                Selected::TimedOut => {
                    let now = Instant::now();

                    let evicted = self.store.sweep(now);
                    debug!(
                        evicted,
                        keys = self.store.keys_count(),
                        "Swept stale providers"
                    );

                    next_sweep = now + self.config.sweep_interval;
                }
            }
        }
    }

    fn handle(&mut self, message: ActorMessage) {
        match message {
            ActorMessage::AddProvider(key, peer) => {
                trace!(?key, %peer, "Add provider");

                self.store.add_provider(key, peer, Instant::now());
            }
            ActorMessage::GetProviders(key, sender) => {
                let providers = self.store.get_providers(&key);
                trace!(?key, count = providers.len(), "Get providers");

                // Capacity is one, so this never blocks, the caller may have left.
                let _ = sender.try_send(providers);
            }
            ActorMessage::GetLocal(sender) => {
                let _ = sender.try_send(self.store.local());
            }
        }
    }
}
