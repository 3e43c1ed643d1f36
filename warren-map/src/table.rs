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

//! Per-cache concurrent key-to-entry table.

use std::{hash::Hash, sync::Arc};

use equivalent::Equivalent;
use hashbrown::{hash_map::Entry as Slot, HashMap};
use itertools::Itertools;
use parking_lot::RwLock;
use warren_common::{
    code::{HashBuilder, Key, Value},
    scope::Scope,
    strict_assert_eq,
};

use crate::entry::CacheEntry;

/// Concurrent key-to-entry mapping for one cache.
///
/// The key space is sharded over independent locks; there is no coarse lock
/// over the whole table. Each structural primitive is a short critical
/// section on a single shard:
///
/// - [`EntryTable::put_if_absent`]: atomic insert-if-absent;
/// - [`EntryTable::replace_exact`]: atomic compare-and-replace keyed on the
///   specific instance;
/// - [`EntryTable::remove_exact`]: atomic compare-and-remove keyed on the
///   specific instance.
///
/// Instance identity is `Arc` pointer identity, so a stale reference can
/// never displace or remove its successor.
pub struct EntryTable<K, V, S>
where
    K: Key,
    V: Value,
    S: HashBuilder,
{
    shards: Vec<RwLock<HashMap<K, Arc<CacheEntry<K, V>>, S>>>,
    hash_builder: S,
}

impl<K, V, S> EntryTable<K, V, S>
where
    K: Key,
    V: Value,
    S: HashBuilder,
{
    /// Create an empty table with the given shard count.
    pub fn new(shards: usize, hash_builder: S) -> Self {
        assert!(shards > 0, "shards must be greater than zero.");

        let shards = (0..shards)
            .map(|_| RwLock::new(HashMap::with_hasher(hash_builder.clone())))
            .collect_vec();

        Self { shards, hash_builder }
    }

    /// Look up the current occupant for the key.
    pub fn get<Q>(&self, key: &Q) -> Option<Arc<CacheEntry<K, V>>>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        self.shards[self.shard(key)].read().get(key).cloned()
    }

    /// Install the entry if its key has no occupant.
    ///
    /// Returns the current occupant on failure.
    pub fn put_if_absent(&self, entry: &Arc<CacheEntry<K, V>>) -> Option<Arc<CacheEntry<K, V>>> {
        self.shards[self.shard(entry.key())].write().with(|mut shard| {
            match shard.entry(entry.key().clone()) {
                Slot::Occupied(o) => Some(o.get().clone()),
                Slot::Vacant(v) => {
                    v.insert(entry.clone());
                    None
                }
            }
        })
    }

    /// Replace the exact current occupant with the next entry.
    ///
    /// Fails if the occupant for the key is not the given instance anymore.
    pub fn replace_exact(&self, current: &Arc<CacheEntry<K, V>>, next: Arc<CacheEntry<K, V>>) -> bool {
        strict_assert_eq!(current.key(), next.key());

        self.shards[self.shard(current.key())].write().with(|mut shard| {
            match shard.get_mut(current.key()) {
                Some(slot) if Arc::ptr_eq(slot, current) => {
                    *slot = next;
                    true
                }
                _ => false,
            }
        })
    }

    /// Remove the exact current occupant.
    ///
    /// Fails if the occupant for the key is not the given instance anymore.
    pub fn remove_exact(&self, current: &Arc<CacheEntry<K, V>>) -> bool {
        self.shards[self.shard(current.key())].write().with(|mut shard| {
            match shard.get(current.key()) {
                Some(slot) if Arc::ptr_eq(slot, current) => {
                    shard.remove(current.key());
                    true
                }
                _ => false,
            }
        })
    }

    /// Number of occupants, including tombstoned ones.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    /// Whether the table holds no occupants at all.
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.read().is_empty())
    }

    pub(crate) fn shard_count(&self) -> usize {
        self.shards.len()
    }

    // Copies one shard's occupants out. The lock is held only for the copy.
    pub(crate) fn shard_values(&self, index: usize) -> Vec<Arc<CacheEntry<K, V>>> {
        self.shards[index].read().values().cloned().collect_vec()
    }

    fn shard<Q>(&self, key: &Q) -> usize
    where
        Q: Hash + ?Sized,
    {
        self.hash_builder.hash_one(key) as usize % self.shards.len()
    }
}

/// Weakly consistent iterator over all occupants, one shard at a time.
pub(crate) struct Scan<K, V, S>
where
    K: Key,
    V: Value,
    S: HashBuilder,
{
    table: Arc<EntryTable<K, V, S>>,
    shard: usize,
    batch: std::vec::IntoIter<Arc<CacheEntry<K, V>>>,
}

impl<K, V, S> Scan<K, V, S>
where
    K: Key,
    V: Value,
    S: HashBuilder,
{
    pub(crate) fn new(table: Arc<EntryTable<K, V, S>>) -> Self {
        Self {
            table,
            shard: 0,
            batch: Vec::new().into_iter(),
        }
    }
}

impl<K, V, S> Iterator for Scan<K, V, S>
where
    K: Key,
    V: Value,
    S: HashBuilder,
{
    type Item = Arc<CacheEntry<K, V>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.batch.next() {
                return Some(entry);
            }
            if self.shard == self.table.shard_count() {
                return None;
            }
            self.batch = self.table.shard_values(self.shard).into_iter();
            self.shard += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;
    use warren_common::{
        code::DefaultHashBuilder,
        id::{PartitionId, TopologyVersion},
    };

    use super::*;
    use crate::test_utils::noop_context;

    fn table_for_test() -> Arc<EntryTable<String, u64, DefaultHashBuilder>> {
        Arc::new(EntryTable::new(4, DefaultHashBuilder::default()))
    }

    fn entry_for_test(key: &str) -> Arc<CacheEntry<String, u64>> {
        Arc::new(CacheEntry::new(
            key.to_string(),
            PartitionId::new(0),
            TopologyVersion::ZERO,
            noop_context("table"),
        ))
    }

    #[test]
    fn test_put_if_absent() {
        let table = table_for_test();
        let first = entry_for_test("a");
        let second = entry_for_test("a");

        assert!(table.put_if_absent(&first).is_none());
        let existing = table.put_if_absent(&second).unwrap();
        assert!(Arc::ptr_eq(&existing, &first));

        assert!(Arc::ptr_eq(&table.get("a").unwrap(), &first));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_replace_exact_rejects_stale_instance() {
        let table = table_for_test();
        let first = entry_for_test("a");
        let second = entry_for_test("a");
        let third = entry_for_test("a");

        assert!(table.put_if_absent(&first).is_none());
        assert!(table.replace_exact(&first, second.clone()));

        // The displaced instance cannot act on behalf of its successor.
        assert!(!table.replace_exact(&first, third.clone()));
        assert!(!table.remove_exact(&first));
        assert!(Arc::ptr_eq(&table.get("a").unwrap(), &second));
    }

    #[test]
    fn test_remove_exact() {
        let table = table_for_test();
        let entry = entry_for_test("a");

        assert!(!table.remove_exact(&entry));
        assert!(table.put_if_absent(&entry).is_none());
        assert!(table.remove_exact(&entry));
        assert!(!table.remove_exact(&entry));
        assert!(table.get("a").is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_scan_visits_every_shard() {
        let table = table_for_test();
        for key in ["a", "b", "c", "d", "e"] {
            assert!(table.put_if_absent(&entry_for_test(key)).is_none());
        }

        let mut keys = Scan::new(table.clone()).map(|e| e.key().clone()).collect_vec();
        keys.sort();
        assert_eq!(keys, vec!["a", "b", "c", "d", "e"]);
    }
}
