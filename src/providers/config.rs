use std::time::Duration;

use crate::common::DEFAULT_SENTINEL_SEED;

use super::{
    DEFAULT_MAILBOX_CAPACITY, DEFAULT_PROVIDER_TTL, DEFAULT_SENTINEL_TTL, DEFAULT_SWEEP_INTERVAL,
};

#[derive(Debug, Clone)]
/// Provider manager configurations
pub struct Config {
    /// How often stale providers are swept.
    ///
    /// Defaults to [DEFAULT_SWEEP_INTERVAL]
    pub sweep_interval: Duration,
    /// How long an ordinary provider is kept after its last announcement.
    ///
    /// Defaults to [DEFAULT_PROVIDER_TTL]
    pub provider_ttl: Duration,
    /// How long the sentinel provider is kept after its last announcement.
    ///
    /// Defaults to [DEFAULT_SENTINEL_TTL]
    pub sentinel_ttl: Duration,
    /// Seed the sentinel [crate::PeerId] is derived from, see [crate::PeerId::derive_sentinel].
    ///
    /// Defaults to [DEFAULT_SENTINEL_SEED]
    pub sentinel_seed: Box<[u8]>,
    /// Capacity of the actor's mailbox, senders block while it is full.
    ///
    /// Defaults to [DEFAULT_MAILBOX_CAPACITY]
    pub mailbox_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            provider_ttl: DEFAULT_PROVIDER_TTL,
            sentinel_ttl: DEFAULT_SENTINEL_TTL,
            sentinel_seed: DEFAULT_SENTINEL_SEED.into(),
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
        }
    }
}
