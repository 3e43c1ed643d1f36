// Copyright 2026 warren Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Concurrent cache map orchestrator.

use std::{
    hash::Hash,
    sync::{
        atomic::{AtomicIsize, Ordering},
        Arc,
    },
};

use equivalent::Equivalent;
use warren_common::{
    code::{DefaultHashBuilder, HashBuilder, Key, Value},
    event::EntryEvent,
    id::{CacheId, TopologyVersion},
    metrics::Metrics,
    strict_assert, strict_assert_eq,
};

use crate::{
    context::CacheContext,
    entry::CacheEntry,
    factory::EntryFactory,
    store::EntryMapStore,
    view::{Entries, EntryPredicate, EntrySet},
};

/// Capacity/topology permit gating whether a new entry may be installed.
///
/// A get-or-create call acquires at most one permit, on the first iteration
/// that needs to construct a candidate. Denial aborts the whole call with no
/// side effects. A granted permit is released exactly once, carrying the
/// call's computed size change.
pub trait Reservation<K, V>: Send + Sync + 'static
where
    K: Key,
    V: Value,
{
    /// Try to take a permit for one new entry.
    fn acquire(&self) -> bool;

    /// Return the permit, applying the call's size change exactly once.
    fn release(&self, size_change: isize, entry: Option<&Arc<CacheEntry<K, V>>>);
}

/// Externally observable size accounting.
///
/// Invoked exactly once per logical create/destroy; never written to
/// directly by callers.
pub trait SizeAccounting<K, V>: Send + Sync + 'static
where
    K: Key,
    V: Value,
{
    /// One more entry is publicly visible.
    fn increment(&self, entry: Option<&Arc<CacheEntry<K, V>>>);

    /// One less entry is publicly visible.
    fn decrement(&self, entry: Option<&Arc<CacheEntry<K, V>>>);
}

/// Eviction subsystem registration point.
pub trait EvictionHook<K, V>: Send + Sync + 'static
where
    K: Key,
    V: Value,
{
    /// Register the entry as an eviction candidate at the given version.
    fn touch(&self, entry: &Arc<CacheEntry<K, V>>, topology_version: TopologyVersion);
}

/// Hook that registers nothing.
#[derive(Debug, Default)]
pub struct NoopEvictionHook;

impl<K, V> EvictionHook<K, V> for NoopEvictionHook
where
    K: Key,
    V: Value,
{
    fn touch(&self, _: &Arc<CacheEntry<K, V>>, _: TopologyVersion) {}
}

/// Accounting over a plain atomic counter, mirrored to the size gauge.
#[derive(Debug)]
pub struct AtomicSizeAccounting {
    size: AtomicIsize,
    metrics: Arc<Metrics>,
}

impl AtomicSizeAccounting {
    /// Create an accounting starting at zero.
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            size: AtomicIsize::new(0),
            metrics,
        }
    }

    /// Current externally observable size.
    pub fn size(&self) -> isize {
        self.size.load(Ordering::Acquire)
    }
}

impl<K, V> SizeAccounting<K, V> for AtomicSizeAccounting
where
    K: Key,
    V: Value,
{
    fn increment(&self, _: Option<&Arc<CacheEntry<K, V>>>) {
        self.size.fetch_add(1, Ordering::AcqRel);
        self.metrics.map_size.increment(1.0);
    }

    fn decrement(&self, _: Option<&Arc<CacheEntry<K, V>>>) {
        self.size.fetch_sub(1, Ordering::AcqRel);
        self.metrics.map_size.decrement(1.0);
    }
}

/// Reservation that always grants and funnels size changes into the
/// accounting.
pub struct UnboundedReservation<K, V>
where
    K: Key,
    V: Value,
{
    size: Arc<dyn SizeAccounting<K, V>>,
}

impl<K, V> UnboundedReservation<K, V>
where
    K: Key,
    V: Value,
{
    /// Create a reservation over the given accounting.
    pub fn new(size: Arc<dyn SizeAccounting<K, V>>) -> Self {
        Self { size }
    }
}

impl<K, V> Reservation<K, V> for UnboundedReservation<K, V>
where
    K: Key,
    V: Value,
{
    fn acquire(&self) -> bool {
        true
    }

    fn release(&self, size_change: isize, entry: Option<&Arc<CacheEntry<K, V>>>) {
        match size_change {
            1 => self.size.increment(entry),
            -1 => self.size.decrement(entry),
            _ => {}
        }
    }
}

/// Configuration for [`ConcurrentCacheMap`].
pub struct CacheMapConfig<K, V, S = DefaultHashBuilder>
where
    K: Key,
    V: Value,
    S: HashBuilder,
{
    /// Resolves per-cache entry tables.
    pub store: Arc<dyn EntryMapStore<K, V, S>>,
    /// Constructs candidate entries.
    pub factory: Arc<dyn EntryFactory<K, V>>,
    /// Gates installation of new entries.
    pub reservation: Arc<dyn Reservation<K, V>>,
    /// Externally observable size.
    pub size: Arc<dyn SizeAccounting<K, V>>,
    /// Operation metrics.
    pub metrics: Arc<Metrics>,
}

/// Concurrent cache map.
///
/// Orchestrates entry lookup, creation, and removal over the per-cache
/// tables resolved from the injected store. Same-key coordination is
/// optimistic: structural changes go through atomic single-key primitives,
/// and a lost race re-evaluates against the new occupant. The loop never
/// parks a thread; the only early exit is reservation denial, which leaves
/// no partial mutation behind.
///
/// Whatever the retry count, the side effects of a call (size delta,
/// lifecycle events, eviction registration) are applied exactly once, in a
/// single finalization step after the loop reaches a terminal state.
pub struct ConcurrentCacheMap<K, V, S = DefaultHashBuilder>
where
    K: Key,
    V: Value,
    S: HashBuilder,
{
    store: Arc<dyn EntryMapStore<K, V, S>>,
    factory: Arc<dyn EntryFactory<K, V>>,
    reservation: Arc<dyn Reservation<K, V>>,
    size: Arc<dyn SizeAccounting<K, V>>,
    metrics: Arc<Metrics>,
}

/// Cross-iteration state of one get-or-create call.
///
/// The candidate is constructed once and reused across retries; the
/// reservation is acquired at most once per call.
struct Attempt<K, V>
where
    K: Key,
    V: Value,
{
    candidate: Option<Arc<CacheEntry<K, V>>>,
    reserved: bool,
}

impl<K, V> Default for Attempt<K, V>
where
    K: Key,
    V: Value,
{
    fn default() -> Self {
        Self {
            candidate: None,
            reserved: false,
        }
    }
}

/// Terminal state of the retry loop.
struct Outcome<K, V>
where
    K: Key,
    V: Value,
{
    cur: Option<Arc<CacheEntry<K, V>>>,
    created: Option<Arc<CacheEntry<K, V>>>,
    doomed: Option<Arc<CacheEntry<K, V>>>,
}

impl<K, V, S> ConcurrentCacheMap<K, V, S>
where
    K: Key,
    V: Value,
    S: HashBuilder,
{
    /// Create a map from its collaborators.
    pub fn new(config: CacheMapConfig<K, V, S>) -> Self {
        Self {
            store: config.store,
            factory: config.factory,
            reservation: config.reservation,
            size: config.size,
            metrics: config.metrics,
        }
    }

    /// Pure lookup: no side effects, no creation, no reservation.
    pub fn get_entry<Q>(&self, cache_id: CacheId, key: &Q) -> Option<Arc<CacheEntry<K, V>>>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        let entry = self.store.entries_map(cache_id).and_then(|table| table.get(key));
        if entry.is_some() {
            self.metrics.map_hit.increment(1);
        } else {
            self.metrics.map_miss.increment(1);
        }
        entry
    }

    /// Resolve the entry for the key, installing a fresh one if needed.
    ///
    /// Behavior per occupant state:
    ///
    /// - no occupant: with `create` a candidate is installed via atomic
    ///   insert-if-absent, otherwise the call returns none;
    /// - obsolete occupant: with `create` the tombstone is displaced via
    ///   atomic compare-and-replace, otherwise it is purged via atomic
    ///   compare-and-remove and the call returns none;
    /// - live occupant: returned as-is.
    ///
    /// A lost race retries against the new occupant. The candidate is
    /// constructed once and reused across retries; it stays thread-local
    /// until published. Reservation denial aborts the call with none and
    /// zero side effects.
    ///
    /// After the loop terminates, exactly once: a doomed predecessor
    /// decrements the size unless it was already logically deleted and emits
    /// a destroy event if subscribed; a created candidate increments the
    /// size, emits a create event if subscribed, and, when `touch` is set,
    /// registers with the eviction subsystem at `topology_version`.
    pub fn get_or_create_entry(
        &self,
        ctx: &Arc<CacheContext<K, V>>,
        topology_version: TopologyVersion,
        key: &K,
        create: bool,
        touch: bool,
    ) -> Option<Arc<CacheEntry<K, V>>> {
        let mut table = self.store.entries_map(ctx.cache_id());
        let mut attempt = Attempt::default();

        let outcome = loop {
            let occupant = table.as_ref().map(|table| (table.clone(), table.get(key)));

            match occupant {
                None | Some((_, None)) => {
                    if !create {
                        break Outcome {
                            cur: None,
                            created: None,
                            doomed: None,
                        };
                    }

                    let candidate = self.ensure_candidate(ctx, topology_version, key, &mut attempt)?;
                    let table = table
                        .get_or_insert_with(|| self.store.entries_map_or_create(ctx.cache_id()));

                    if table.put_if_absent(&candidate).is_none() {
                        break Outcome {
                            cur: Some(candidate.clone()),
                            created: Some(candidate),
                            doomed: None,
                        };
                    }
                    self.metrics.map_retry.increment(1);
                }
                Some((table, Some(entry))) => {
                    if entry.is_obsolete() {
                        if create {
                            let candidate =
                                self.ensure_candidate(ctx, topology_version, key, &mut attempt)?;
                            if table.replace_exact(&entry, candidate.clone()) {
                                break Outcome {
                                    cur: Some(candidate.clone()),
                                    created: Some(candidate),
                                    doomed: Some(entry),
                                };
                            }
                        } else if table.remove_exact(&entry) {
                            break Outcome {
                                cur: None,
                                created: None,
                                doomed: Some(entry),
                            };
                        }
                        self.metrics.map_retry.increment(1);
                    } else {
                        break Outcome {
                            cur: Some(entry),
                            created: None,
                            doomed: None,
                        };
                    }
                }
            }
        };

        self.finish(ctx, topology_version, touch, attempt.reserved, outcome)
    }

    /// Detach the exact entry instance from its cache's mapping.
    ///
    /// Succeeds only if the instance is still the one mapped for its key; a
    /// stale reference can never remove its successor. On success a destroy
    /// event is emitted if subscribed, and the size is decremented unless
    /// the entry was already logically deleted.
    pub fn remove_entry(&self, entry: &Arc<CacheEntry<K, V>>) -> bool {
        let ctx = entry.context();

        let removed = self
            .store
            .entries_map(ctx.cache_id())
            .map(|table| table.remove_exact(entry))
            .unwrap_or(false);

        if removed {
            tracing::trace!("[cache map]: removed entry for key {:?}", entry.key());

            let events = ctx.events();
            if events.is_subscribed(EntryEvent::Destroyed) {
                events.emit(entry.partition(), entry.key(), ctx.local_node(), EntryEvent::Destroyed);
            }

            {
                let _guard = entry.flags_guard();
                if !entry.is_deleted() {
                    self.size.decrement(Some(entry));
                }
            }

            self.metrics.map_remove.increment(1);
        }

        removed
    }

    /// Live filtered collection view over the cache's entries.
    pub fn entries(
        &self,
        cache_id: CacheId,
        filter: Vec<Arc<dyn EntryPredicate<K, V>>>,
    ) -> Entries<K, V, S> {
        Entries::new(self.store.entries_map(cache_id), filter)
    }

    /// Live filtered set view; membership follows the filter exactly.
    pub fn entry_set(
        &self,
        cache_id: CacheId,
        filter: Vec<Arc<dyn EntryPredicate<K, V>>>,
    ) -> EntrySet<K, V, S> {
        EntrySet::new(self.store.entries_map(cache_id), filter)
    }

    /// Operation metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    // Memoize the candidate, acquiring the reservation on first need.
    //
    // Returns `None` iff the reservation was denied; the caller must then
    // abort the whole call without side effects.
    fn ensure_candidate(
        &self,
        ctx: &Arc<CacheContext<K, V>>,
        topology_version: TopologyVersion,
        key: &K,
        attempt: &mut Attempt<K, V>,
    ) -> Option<Arc<CacheEntry<K, V>>> {
        if attempt.candidate.is_none() {
            if !attempt.reserved {
                if !self.reservation.acquire() {
                    self.metrics.map_reserve_fail.increment(1);
                    return None;
                }
                attempt.reserved = true;
            }

            tracing::trace!("[cache map]: constructed candidate for key {key:?}");
            attempt.candidate = Some(self.factory.create(ctx, topology_version, key));
        }
        attempt.candidate.clone()
    }

    // Apply the side effects of a terminated retry loop, exactly once.
    fn finish(
        &self,
        ctx: &Arc<CacheContext<K, V>>,
        topology_version: TopologyVersion,
        touch: bool,
        reserved: bool,
        outcome: Outcome<K, V>,
    ) -> Option<Arc<CacheEntry<K, V>>> {
        let Outcome { cur, created, doomed } = outcome;

        let mut size_change: isize = 0;

        if let Some(doomed) = doomed.as_ref() {
            {
                let _guard = doomed.flags_guard();
                // A predecessor that was already logically deleted has been
                // accounted for; decrementing again would double-count.
                if !doomed.is_deleted() {
                    size_change -= 1;
                }
            }

            let events = ctx.events();
            if events.is_subscribed(EntryEvent::Destroyed) {
                events.emit(doomed.partition(), doomed.key(), ctx.local_node(), EntryEvent::Destroyed);
            }

            self.metrics.map_destroy.increment(1);
            tracing::trace!("[cache map]: doomed obsolete occupant for key {:?}", doomed.key());
        }

        if let Some(created) = created.as_ref() {
            size_change += 1;

            let events = ctx.events();
            if events.is_subscribed(EntryEvent::Created) {
                events.emit(created.partition(), created.key(), ctx.local_node(), EntryEvent::Created);
            }

            if touch {
                ctx.evictions().touch(created, topology_version);
            }

            self.metrics.map_create.increment(1);
            tracing::trace!("[cache map]: installed entry for key {:?}", created.key());
        }

        strict_assert!(size_change.abs() <= 1);

        if reserved {
            self.reservation.release(size_change, cur.as_ref());
        } else if size_change != 0 {
            // Without a reservation the loop can only have removed a
            // tombstone.
            strict_assert_eq!(size_change, -1);
            self.size.decrement(cur.as_ref());
        }

        cur
    }
}

#[cfg(test)]
mod tests {
    use warren_common::id::NodeId;

    use super::*;
    use crate::{
        context::{CacheDescriptor, CacheMode},
        factory::DefaultEntryFactory,
        store::SharedEntryMapStore,
        test_utils::{CountingEvictionHook, DenyingReservation, RecordingEventSink},
    };

    struct Fixture {
        map: ConcurrentCacheMap<String, u64>,
        ctx: Arc<CacheContext<String, u64>>,
        size: Arc<AtomicSizeAccounting>,
        events: Arc<RecordingEventSink<String>>,
        evictions: Arc<CountingEvictionHook>,
    }

    impl Fixture {
        fn cache_id(&self) -> CacheId {
            self.ctx.cache_id()
        }

        fn create(&self, key: &str) -> Arc<CacheEntry<String, u64>> {
            self.map
                .get_or_create_entry(&self.ctx, TopologyVersion::ZERO, &key.to_string(), true, false)
                .unwrap()
        }
    }

    fn map_for_test(events: Arc<RecordingEventSink<String>>) -> Fixture {
        let metrics = Arc::new(Metrics::new("test"));
        let size = Arc::new(AtomicSizeAccounting::new(metrics.clone()));
        let evictions = Arc::new(CountingEvictionHook::default());
        let descriptor = Arc::new(CacheDescriptor::new("accounts", CacheMode::Partitioned, 64).unwrap());
        let ctx = Arc::new(CacheContext::new(
            descriptor,
            events.clone(),
            evictions.clone(),
            NodeId::new(7),
        ));
        let map = ConcurrentCacheMap::new(CacheMapConfig {
            store: Arc::new(SharedEntryMapStore::new(4)),
            factory: Arc::new(DefaultEntryFactory::default()),
            reservation: Arc::new(UnboundedReservation::new(size.clone())),
            size: size.clone(),
            metrics,
        });
        Fixture {
            map,
            ctx,
            size,
            events,
            evictions,
        }
    }

    #[test_log::test]
    fn test_create_on_absent_key() {
        let f = map_for_test(Arc::new(RecordingEventSink::new()));

        let entry = f
            .map
            .get_or_create_entry(&f.ctx, TopologyVersion::ZERO, &"a".to_string(), true, true)
            .unwrap();

        assert_eq!(f.size.size(), 1);
        assert_eq!(f.events.created(), 1);
        assert_eq!(f.events.destroyed(), 0);
        assert_eq!(f.evictions.touches(), 1);
        assert!(Arc::ptr_eq(&f.map.get_entry(f.cache_id(), "a").unwrap(), &entry));
    }

    #[test]
    fn test_lookup_without_create_on_absent_key() {
        let f = map_for_test(Arc::new(RecordingEventSink::new()));

        let entry =
            f.map
                .get_or_create_entry(&f.ctx, TopologyVersion::ZERO, &"a".to_string(), false, false);

        assert!(entry.is_none());
        assert_eq!(f.size.size(), 0);
        assert_eq!(f.events.created(), 0);
        assert!(f.map.get_entry(f.cache_id(), "a").is_none());
    }

    #[test]
    fn test_live_entry_short_circuits() {
        let f = map_for_test(Arc::new(RecordingEventSink::new()));

        let first = f.create("a");
        let second = f
            .map
            .get_or_create_entry(&f.ctx, TopologyVersion::new(1), &"a".to_string(), true, true)
            .unwrap();

        // The live occupant is returned as-is: no second instance, no size
        // change, no events, no eviction touch.
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(f.size.size(), 1);
        assert_eq!(f.events.created(), 1);
        assert_eq!(f.evictions.touches(), 0);
    }

    #[test]
    fn test_lookup_without_create_returns_live_entry() {
        let f = map_for_test(Arc::new(RecordingEventSink::new()));

        let entry = f.create("a");
        let looked_up = f
            .map
            .get_or_create_entry(&f.ctx, TopologyVersion::ZERO, &"a".to_string(), false, false)
            .unwrap();

        assert!(Arc::ptr_eq(&entry, &looked_up));
        assert_eq!(f.size.size(), 1);
    }

    #[test_log::test]
    fn test_replace_obsolete_occupant() {
        let f = map_for_test(Arc::new(RecordingEventSink::new()));

        let old = f.create("a");
        assert!(old.mark_obsolete());

        let new = f
            .map
            .get_or_create_entry(&f.ctx, TopologyVersion::new(2), &"a".to_string(), true, false)
            .unwrap();

        assert!(!Arc::ptr_eq(&old, &new));
        assert!(Arc::ptr_eq(&f.map.get_entry(f.cache_id(), "a").unwrap(), &new));
        // One destroy for the tombstone, one create for its replacement; the
        // pair nets to zero.
        assert_eq!(f.size.size(), 1);
        assert_eq!(f.events.created(), 2);
        assert_eq!(f.events.destroyed(), 1);
    }

    #[test]
    fn test_purge_obsolete_on_lookup() {
        let f = map_for_test(Arc::new(RecordingEventSink::new()));

        let entry = f.create("a");
        entry.mark_obsolete();

        let purged =
            f.map
                .get_or_create_entry(&f.ctx, TopologyVersion::ZERO, &"a".to_string(), false, false);

        assert!(purged.is_none());
        assert!(f.map.get_entry(f.cache_id(), "a").is_none());
        assert_eq!(f.size.size(), 0);
        assert_eq!(f.events.destroyed(), 1);
    }

    #[test]
    fn test_purge_of_deleted_tombstone_keeps_size() {
        let f = map_for_test(Arc::new(RecordingEventSink::new()));

        let entry = f.create("a");
        entry.set_deleted(true);
        entry.mark_obsolete();
        assert_eq!(f.size.size(), 1);

        let purged =
            f.map
                .get_or_create_entry(&f.ctx, TopologyVersion::ZERO, &"a".to_string(), false, false);

        // The logical deletion was already accounted for elsewhere; the
        // destroy event still fires.
        assert!(purged.is_none());
        assert_eq!(f.size.size(), 1);
        assert_eq!(f.events.destroyed(), 1);
    }

    #[test]
    fn test_events_gated_by_subscription() {
        let f = map_for_test(Arc::new(RecordingEventSink::muted()));

        let entry = f.create("a");
        entry.mark_obsolete();
        let _ = f
            .map
            .get_or_create_entry(&f.ctx, TopologyVersion::ZERO, &"a".to_string(), false, false);

        // Size accounting is independent of the subscription gate.
        assert_eq!(f.events.created(), 0);
        assert_eq!(f.events.destroyed(), 0);
        assert_eq!(f.size.size(), 0);
    }

    #[test]
    fn test_reservation_denied() {
        let events = Arc::new(RecordingEventSink::new());
        let metrics = Arc::new(Metrics::new("test"));
        let size = Arc::new(AtomicSizeAccounting::new(metrics.clone()));
        let reservation = Arc::new(DenyingReservation::default());
        let descriptor = Arc::new(CacheDescriptor::new("accounts", CacheMode::Partitioned, 64).unwrap());
        let ctx = Arc::new(CacheContext::new(
            descriptor,
            events.clone(),
            Arc::new(NoopEvictionHook),
            NodeId::new(7),
        ));
        let map: ConcurrentCacheMap<String, u64> = ConcurrentCacheMap::new(CacheMapConfig {
            store: Arc::new(SharedEntryMapStore::new(4)),
            factory: Arc::new(DefaultEntryFactory::default()),
            reservation: reservation.clone(),
            size: size.clone(),
            metrics,
        });

        let entry = map.get_or_create_entry(&ctx, TopologyVersion::ZERO, &"b".to_string(), true, true);

        // Denial aborts with zero side effects: no mapping, no events, no
        // size change, and no release of a permit that was never granted.
        assert!(entry.is_none());
        assert!(map.get_entry(ctx.cache_id(), "b").is_none());
        assert_eq!(size.size(), 0);
        assert_eq!(events.created(), 0);
        assert_eq!(reservation.releases(), 0);
    }

    #[test]
    fn test_remove_entry_exact_instance() {
        let f = map_for_test(Arc::new(RecordingEventSink::new()));

        let entry = f.create("a");
        assert!(f.map.remove_entry(&entry));
        assert!(!f.map.remove_entry(&entry));

        assert!(f.map.get_entry(f.cache_id(), "a").is_none());
        assert_eq!(f.size.size(), 0);
        assert_eq!(f.events.destroyed(), 1);
        assert!(!f.map.entry_set(f.cache_id(), vec![]).contains(&entry));
    }

    #[test]
    fn test_stale_remove_cannot_touch_successor() {
        let f = map_for_test(Arc::new(RecordingEventSink::new()));

        let old = f.create("a");
        old.mark_obsolete();
        let new = f.create("a");

        assert!(!f.map.remove_entry(&old));
        assert!(Arc::ptr_eq(&f.map.get_entry(f.cache_id(), "a").unwrap(), &new));
        assert_eq!(f.size.size(), 1);
    }

    #[test]
    fn test_remove_entry_deleted_gate() {
        let f = map_for_test(Arc::new(RecordingEventSink::new()));

        let entry = f.create("a");
        entry.set_deleted(true);

        assert!(f.map.remove_entry(&entry));
        // The destroy event fires regardless of the deleted flag; only the
        // size decrement is gated.
        assert_eq!(f.events.destroyed(), 1);
        assert_eq!(f.size.size(), 1);
    }

    #[test]
    fn test_touch_fires_only_for_created_entries() {
        let f = map_for_test(Arc::new(RecordingEventSink::new()));

        f.map
            .get_or_create_entry(&f.ctx, TopologyVersion::ZERO, &"a".to_string(), true, true)
            .unwrap();
        assert_eq!(f.evictions.touches(), 1);

        f.map
            .get_or_create_entry(&f.ctx, TopologyVersion::ZERO, &"a".to_string(), true, true)
            .unwrap();
        assert_eq!(f.evictions.touches(), 1);

        f.map
            .get_or_create_entry(&f.ctx, TopologyVersion::ZERO, &"b".to_string(), true, false)
            .unwrap();
        assert_eq!(f.evictions.touches(), 1);
    }

    #[test]
    fn test_entry_set_membership_and_traversal() {
        let f = map_for_test(Arc::new(RecordingEventSink::new()));

        let a = f.create("apple");
        let b = f.create("apricot");
        let c = f.create("banana");

        let starts_with_a: Arc<dyn EntryPredicate<String, u64>> =
            Arc::new(|entry: &CacheEntry<String, u64>| entry.key().starts_with("ap"));

        let set = f.map.entry_set(f.cache_id(), vec![starts_with_a]);
        assert_eq!(set.len(), 2);
        assert!(set.contains(&a));
        assert!(set.contains(&b));
        assert!(!set.contains(&c));

        // Tombstoned entries are not visitable even while still mapped.
        b.mark_obsolete();
        assert_eq!(set.len(), 1);
        assert!(!set.contains(&b));

        let all = f.map.entries(f.cache_id(), vec![]);
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|entry| entry.is_visible()));
    }

    #[test]
    fn test_views_over_unknown_cache_are_empty() {
        let f = map_for_test(Arc::new(RecordingEventSink::new()));
        let unknown = CacheId::from_name("unknown");

        assert_eq!(f.map.entries(unknown, vec![]).len(), 0);
        let set = f.map.entry_set(unknown, vec![]);
        assert!(set.is_empty());
        assert_eq!(set.iter().count(), 0);
    }

    #[test]
    fn test_separate_caches_do_not_interfere() {
        let f = map_for_test(Arc::new(RecordingEventSink::new()));

        let other_descriptor =
            Arc::new(CacheDescriptor::new("orders", CacheMode::Partitioned, 64).unwrap());
        let other_ctx = Arc::new(CacheContext::new(
            other_descriptor,
            f.events.clone(),
            f.evictions.clone(),
            NodeId::new(7),
        ));

        f.create("a");
        f.map
            .get_or_create_entry(&other_ctx, TopologyVersion::ZERO, &"a".to_string(), true, false)
            .unwrap();

        assert_eq!(f.map.entries(f.cache_id(), vec![]).len(), 1);
        assert_eq!(f.map.entries(other_ctx.cache_id(), vec![]).len(), 1);
        assert_eq!(f.size.size(), 2);
    }
}
