//! Provider records manager.
//!
//! A single actor thread owns every provider record. Handles talk to it through a
//! mailbox, so reads and writes are serialized without locks, and stale records are
//! swept from the same loop.

mod actor;
pub mod config;
pub mod store;

use std::{
    thread::{self, JoinHandle},
    time::Duration,
};

use flume::{Selector, Sender};
use tracing::trace;

use crate::{
    context::{Context, Selected},
    Key, PeerId, Result,
};

use actor::{Actor, ActorMessage};

pub use config::Config;
pub use store::{ProviderRecord, ProviderSet, ProviderStore};

/// Default interval between sweeps of stale providers.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);
/// Default time an ordinary provider is kept after its last announcement.
pub const DEFAULT_PROVIDER_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Default time the sentinel provider is kept after its last announcement.
pub const DEFAULT_SENTINEL_TTL: Duration = Duration::from_secs(168 * 60 * 60);
/// Default number of messages the actor's mailbox holds before senders block.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 1024;

#[derive(Debug)]
/// Handle to the provider records actor.
///
/// Cloning is cheap, every clone talks to the same actor. The actor stops when the
/// [Context] it was started with is cancelled, or when all handles are dropped.
pub struct ProviderManager {
    sender: Sender<ActorMessage>,
    local: PeerId,
    handle: Option<JoinHandle<()>>,
}

impl Clone for ProviderManager {
    fn clone(&self) -> Self {
        ProviderManager {
            sender: self.sender.clone(),
            local: self.local.clone(),
            handle: None,
        }
    }
}

impl ProviderManager {
    /// Start the actor with the [Config::default] settings.
    pub fn with_defaults(ctx: &Context, local: PeerId) -> Result<Self> {
        Self::new(ctx, local, Config::default())
    }

    /// Start the actor on its own thread, living as long as `ctx`.
    pub fn new(ctx: &Context, local: PeerId, config: Config) -> Result<Self> {
        let (sender, receiver) = flume::bounded(config.mailbox_capacity);

        let actor = Actor::new(ctx.clone(), local.clone(), config, receiver);

        let handle = thread::Builder::new()
            .name("provider-manager".to_string())
            .spawn(move || actor.run())?;

        Ok(ProviderManager {
            sender,
            local,
            handle: Some(handle),
        })
    }

    // === Getters ===

    pub fn local_peer(&self) -> &PeerId {
        &self.local
    }

    /// Returns `false` once the actor stopped accepting messages.
    pub fn is_running(&self) -> bool {
        !self.sender.is_disconnected()
    }

    // === Public Methods ===

    /// Record that `peer` provides `key`.
    ///
    /// Returns as soon as the message is enqueued. Does nothing if `ctx` is
    /// cancelled first, or if the actor is gone.
    pub fn add_provider(&self, ctx: &Context, key: Key, peer: PeerId) {
        if ctx.is_cancelled() {
            return;
        }

        let selector = Selector::new().send(
            &self.sender,
            ActorMessage::AddProvider(key, peer),
            Selected::Ready,
        );

        match ctx.select(selector, None) {
            Selected::Ready(Ok(())) => {}
            Selected::Ready(Err(_)) => trace!("Provider manager is shut down, dropped provider"),
            Selected::Cancelled | Selected::TimedOut => {}
        }
    }

    /// Providers of `key`, in the order they were first announced.
    ///
    /// Returns an empty list if the key is unknown, if `ctx` is cancelled before the
    /// answer arrives, or if the actor is gone.
    pub fn get_providers(&self, ctx: &Context, key: Key) -> Vec<PeerId> {
        if ctx.is_cancelled() {
            return Vec::new();
        }

        // Buffered so the actor never waits on a caller that gave up.
        let (sender, receiver) = flume::bounded::<Vec<PeerId>>(1);

        let selector = Selector::new().send(
            &self.sender,
            ActorMessage::GetProviders(key, sender),
            |result| Selected::Ready(result.is_ok()),
        );

        match ctx.select(selector, None) {
            Selected::Ready(true) => {}
            _ => return Vec::new(),
        }

        let selector =
            Selector::new().recv(&receiver, |peers| Selected::Ready(peers.unwrap_or_default()));

        match ctx.select(selector, None) {
            Selected::Ready(peers) => peers,
            Selected::Cancelled | Selected::TimedOut => Vec::new(),
        }
    }

    /// Keys this node announced itself as a provider for, in no particular order.
    ///
    /// Waits for the actor even if its mailbox is busy, returns an empty list if the
    /// actor is gone.
    pub fn get_local(&self) -> Vec<Key> {
        let (sender, receiver) = flume::bounded::<Vec<Key>>(1);

        if self.sender.send(ActorMessage::GetLocal(sender)).is_err() {
            return Vec::new();
        }

        receiver.recv().unwrap_or_default()
    }

    /// Block until the actor thread exits.
    ///
    /// The actor exits once the governing [Context] is cancelled or every other handle
    /// is dropped. Only the handle returned by [ProviderManager::new] owns the thread,
    /// on clones this returns immediately.
    pub fn block_until_shutdown(self) {
        let ProviderManager { sender, handle, .. } = self;
        drop(sender);

        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}
