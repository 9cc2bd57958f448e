//! Manage announced providers for content keys.

use std::{
    collections::{HashMap, HashSet},
    time::{Duration, Instant},
};

use crate::{Key, PeerId};

#[derive(Debug, Clone, PartialEq, Eq)]
/// A `(key, peer, last_seen)` fact held by the store.
pub struct ProviderRecord {
    pub key: Key,
    pub peer: PeerId,
    pub last_seen: Instant,
}

#[derive(Debug, Default)]
/// Providers of a single key.
///
/// `membership` is the source of truth for presence and recency, `providers` holds
/// the same peers in announcement order and is what queries return.
pub struct ProviderSet {
    providers: Vec<PeerId>,
    membership: HashMap<PeerId, Instant>,
}

impl ProviderSet {
    /// Insert `peer` if absent, and mark it as seen at `now` either way.
    pub fn add(&mut self, peer: PeerId, now: Instant) {
        if !self.membership.contains_key(&peer) {
            self.providers.push(peer.clone());
        }

        self.membership.insert(peer, now);
    }

    pub fn providers(&self) -> &[PeerId] {
        &self.providers
    }

    pub fn last_seen(&self, peer: &PeerId) -> Option<Instant> {
        self.membership.get(peer).copied()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[derive(Debug)]
/// The state owned by the provider actor.
pub struct ProviderStore {
    local_peer: PeerId,
    sentinel: PeerId,
    provider_ttl: Duration,
    sentinel_ttl: Duration,
    providers: HashMap<Key, ProviderSet>,
    local: HashSet<Key>,
}

impl ProviderStore {
    pub fn new(
        local_peer: PeerId,
        sentinel: PeerId,
        provider_ttl: Duration,
        sentinel_ttl: Duration,
    ) -> Self {
        Self {
            local_peer,
            sentinel,
            provider_ttl,
            sentinel_ttl,
            providers: HashMap::new(),
            local: HashSet::new(),
        }
    }

    // === Getters ===

    pub fn local_peer(&self) -> &PeerId {
        &self.local_peer
    }

    pub fn sentinel(&self) -> &PeerId {
        &self.sentinel
    }

    /// Number of keys in the index, including keys whose provider set is empty.
    pub fn keys_count(&self) -> usize {
        self.providers.len()
    }

    pub fn provider_set(&self, key: &Key) -> Option<&ProviderSet> {
        self.providers.get(key)
    }

    // === Public Methods ===

    pub fn add_provider(&mut self, key: Key, peer: PeerId, now: Instant) {
        if peer == self.local_peer {
            self.local.insert(key.clone());
        }

        self.providers.entry(key).or_default().add(peer, now);
    }

    /// Providers of `key` in announcement order, empty if the key is unknown.
    pub fn get_providers(&self, key: &Key) -> Vec<PeerId> {
        self.providers
            .get(key)
            .map(|set| set.providers.clone())
            .unwrap_or_default()
    }

    /// Keys the local peer provides, in no particular order.
    pub fn local(&self) -> Vec<Key> {
        self.local.iter().cloned().collect()
    }

    pub fn records(&self) -> Vec<ProviderRecord> {
        self.providers
            .iter()
            .flat_map(|(key, set)| {
                set.providers.iter().filter_map(move |peer| {
                    set.last_seen(peer).map(|last_seen| ProviderRecord {
                        key: key.clone(),
                        peer: peer.clone(),
                        last_seen,
                    })
                })
            })
            .collect()
    }

    /// Evict providers not seen for longer than their TTL, returns the number of
    /// evicted entries.
    ///
    /// The sentinel peer uses `sentinel_ttl`, every other peer `provider_ttl`.
    /// Keys are kept even when they end up with no providers.
    pub fn sweep(&mut self, now: Instant) -> usize {
        let sentinel = &self.sentinel;
        let provider_ttl = self.provider_ttl;
        let sentinel_ttl = self.sentinel_ttl;

        let mut evicted = 0;

        for set in self.providers.values_mut() {
            let membership = &mut set.membership;

            set.providers.retain(|peer| {
                let ttl = if peer == sentinel {
                    sentinel_ttl
                } else {
                    provider_ttl
                };

                let expired = membership
                    .get(peer)
                    .map_or(true, |last_seen| now.saturating_duration_since(*last_seen) > ttl);

                if expired {
                    membership.remove(peer);
                    evicted += 1;
                }

                !expired
            });
        }

        evicted
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const HOUR: Duration = Duration::from_secs(60 * 60);

    fn store(local: &PeerId) -> ProviderStore {
        ProviderStore::new(
            local.clone(),
            PeerId::sentinel().clone(),
            24 * HOUR,
            168 * HOUR,
        )
    }

    #[test]
    fn dedupe_and_order() {
        let local = PeerId::random();
        let mut store = store(&local);

        let key = Key::from("film:42");
        let peer_a = PeerId::random();
        let peer_b = PeerId::random();

        let start = Instant::now();

        store.add_provider(key.clone(), peer_a.clone(), start);
        store.add_provider(key.clone(), peer_b.clone(), start);
        store.add_provider(
            key.clone(),
            peer_a.clone(),
            start + Duration::from_millis(1),
        );

        assert_eq!(store.get_providers(&key), vec![peer_a.clone(), peer_b]);
        assert!(store.local().is_empty());

        let set = store.provider_set(&key).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.providers()[0], peer_a);
        assert_eq!(
            set.last_seen(&peer_a),
            Some(start + Duration::from_millis(1))
        );
    }

    #[test]
    fn local_keys() {
        let local = PeerId::random();
        let mut store = store(&local);
        let now = Instant::now();

        store.add_provider(Key::from("mine"), local.clone(), now);
        store.add_provider(Key::from("mine"), local, now);
        store.add_provider(Key::from("theirs"), PeerId::random(), now);

        assert_eq!(store.local(), vec![Key::from("mine")]);
    }

    #[test]
    fn unknown_key() {
        let store = store(&PeerId::random());

        assert!(store.get_providers(&Key::from("nothing")).is_empty());
    }

    #[test]
    fn ttl_boundary() {
        let mut store = store(&PeerId::random());

        let key = Key::from("k");
        let peer = PeerId::random();
        let start = Instant::now();

        assert_eq!(store.sentinel(), PeerId::sentinel());

        store.add_provider(key.clone(), peer.clone(), start);
        store.add_provider(key.clone(), PeerId::sentinel().clone(), start);

        assert_eq!(store.sweep(start + 24 * HOUR), 0);
        assert_eq!(store.get_providers(&key).len(), 2);

        assert_eq!(store.sweep(start + 24 * HOUR + Duration::from_nanos(1)), 1);
        assert_eq!(
            store.get_providers(&key),
            vec![PeerId::sentinel().clone()]
        );

        assert_eq!(store.sweep(start + 168 * HOUR), 0);
        assert_eq!(store.get_providers(&key).len(), 1);

        assert_eq!(store.sweep(start + 168 * HOUR + Duration::from_secs(1)), 1);
        assert!(store.get_providers(&key).is_empty());

        // Keys are never removed.
        assert_eq!(store.keys_count(), 1);
        assert!(store.provider_set(&key).unwrap().is_empty());
        assert!(store.records().is_empty());
    }

    #[test]
    fn sweep_keeps_fresh_providers_in_order() {
        let mut store = store(&PeerId::random());

        let key = Key::from("k");
        let peers: Vec<PeerId> = (0..5).map(|_| PeerId::random()).collect();
        let start = Instant::now();

        for (i, peer) in peers.iter().enumerate() {
            // peers 0, 2 and 4 are announced again an hour later
            store.add_provider(key.clone(), peer.clone(), start);
            if i % 2 == 0 {
                store.add_provider(key.clone(), peer.clone(), start + HOUR);
            }
        }

        assert_eq!(store.sweep(start + 24 * HOUR + Duration::from_secs(1)), 2);
        assert_eq!(
            store.get_providers(&key),
            vec![peers[0].clone(), peers[2].clone(), peers[4].clone()]
        );

        // Re-announcing an evicted peer appends it again once.
        store.add_provider(key.clone(), peers[1].clone(), start + 25 * HOUR);
        assert_eq!(store.get_providers(&key).len(), 4);
        assert_eq!(store.get_providers(&key)[3], peers[1]);
    }

    #[test]
    fn records() {
        let mut store = store(&PeerId::random());
        let now = Instant::now();
        let peer = PeerId::random();

        store.add_provider(Key::from("a"), peer.clone(), now);
        store.add_provider(Key::from("b"), peer.clone(), now);

        let mut records = store.records();
        records.sort_by(|a, b| a.key.cmp(&b.key));

        assert_eq!(
            records,
            vec![
                ProviderRecord {
                    key: Key::from("a"),
                    peer: peer.clone(),
                    last_seen: now
                },
                ProviderRecord {
                    key: Key::from("b"),
                    peer,
                    last_seen: now
                },
            ]
        );
    }
}
