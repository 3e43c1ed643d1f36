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

//! Resolution of per-cache entry tables.

use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;
use warren_common::{
    code::{DefaultHashBuilder, HashBuilder, Key, Value},
    id::CacheId,
};

use crate::table::EntryTable;

/// Resolves the entry table backing a cache.
///
/// Absence from [`EntryMapStore::entries_map`] is not an error: it signals
/// "no entries yet for this cache". The store is injected into the
/// orchestration core as a trait object so backing strategies swap without
/// touching it.
pub trait EntryMapStore<K, V, S>: Send + Sync + 'static
where
    K: Key,
    V: Value,
    S: HashBuilder,
{
    /// Resolve the table for the cache, if one was created before.
    fn entries_map(&self, cache_id: CacheId) -> Option<Arc<EntryTable<K, V, S>>>;

    /// Resolve the table for the cache, creating it on first access.
    ///
    /// Exactly one fresh table is created and registered even when callers
    /// race on the first access to the same cache id.
    fn entries_map_or_create(&self, cache_id: CacheId) -> Arc<EntryTable<K, V, S>>;
}

/// Store keeping one table per cache id in a shared registry.
pub struct SharedEntryMapStore<K, V, S = DefaultHashBuilder>
where
    K: Key,
    V: Value,
    S: HashBuilder,
{
    registry: RwLock<HashMap<CacheId, Arc<EntryTable<K, V, S>>>>,
    table_shards: usize,
    hash_builder: S,
}

impl<K, V, S> SharedEntryMapStore<K, V, S>
where
    K: Key,
    V: Value,
    S: HashBuilder + Default,
{
    /// Create a store whose tables carry the given shard count.
    pub fn new(table_shards: usize) -> Self {
        Self::with_hash_builder(table_shards, S::default())
    }
}

impl<K, V, S> SharedEntryMapStore<K, V, S>
where
    K: Key,
    V: Value,
    S: HashBuilder,
{
    /// Create a store with an explicit hash builder for its tables.
    pub fn with_hash_builder(table_shards: usize, hash_builder: S) -> Self {
        assert!(table_shards > 0, "table shards must be greater than zero.");

        Self {
            registry: RwLock::new(HashMap::new()),
            table_shards,
            hash_builder,
        }
    }
}

impl<K, V, S> EntryMapStore<K, V, S> for SharedEntryMapStore<K, V, S>
where
    K: Key,
    V: Value,
    S: HashBuilder,
{
    fn entries_map(&self, cache_id: CacheId) -> Option<Arc<EntryTable<K, V, S>>> {
        self.registry.read().get(&cache_id).cloned()
    }

    fn entries_map_or_create(&self, cache_id: CacheId) -> Arc<EntryTable<K, V, S>> {
        if let Some(table) = self.registry.read().get(&cache_id) {
            return table.clone();
        }

        // Losers of the write race land on the winner's table.
        self.registry
            .write()
            .entry(cache_id)
            .or_insert_with(|| Arc::new(EntryTable::new(self.table_shards, self.hash_builder.clone())))
            .clone()
    }
}

/// Store bound to a single cache, holding its table up front.
///
/// Resolution for any other cache id yields none.
pub struct DedicatedEntryMapStore<K, V, S = DefaultHashBuilder>
where
    K: Key,
    V: Value,
    S: HashBuilder,
{
    cache_id: CacheId,
    table: Arc<EntryTable<K, V, S>>,
}

impl<K, V, S> DedicatedEntryMapStore<K, V, S>
where
    K: Key,
    V: Value,
    S: HashBuilder + Default,
{
    /// Create a store for the cache with the given table shard count.
    pub fn new(cache_id: CacheId, table_shards: usize) -> Self {
        Self {
            cache_id,
            table: Arc::new(EntryTable::new(table_shards, S::default())),
        }
    }
}

impl<K, V, S> EntryMapStore<K, V, S> for DedicatedEntryMapStore<K, V, S>
where
    K: Key,
    V: Value,
    S: HashBuilder,
{
    fn entries_map(&self, cache_id: CacheId) -> Option<Arc<EntryTable<K, V, S>>> {
        (cache_id == self.cache_id).then(|| self.table.clone())
    }

    fn entries_map_or_create(&self, cache_id: CacheId) -> Arc<EntryTable<K, V, S>> {
        assert_eq!(cache_id, self.cache_id, "store is dedicated to another cache");
        self.table.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_mapping_is_not_an_error() {
        let store: SharedEntryMapStore<String, u64> = SharedEntryMapStore::new(4);
        assert!(store.entries_map(CacheId::from_name("accounts")).is_none());
    }

    #[test]
    fn test_lazy_creation_is_idempotent() {
        let store: SharedEntryMapStore<String, u64> = SharedEntryMapStore::new(4);
        let id = CacheId::from_name("accounts");

        let first = store.entries_map_or_create(id);
        let second = store.entries_map_or_create(id);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &store.entries_map(id).unwrap()));
    }

    #[test]
    fn test_racing_first_access_creates_one_table() {
        let store: Arc<SharedEntryMapStore<String, u64>> = Arc::new(SharedEntryMapStore::new(4));
        let id = CacheId::from_name("accounts");

        let handles = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.entries_map_or_create(id))
            })
            .collect::<Vec<_>>();

        let tables = handles.into_iter().map(|h| h.join().unwrap()).collect::<Vec<_>>();
        for table in tables.iter() {
            assert!(Arc::ptr_eq(table, &tables[0]));
        }
    }

    #[test]
    fn test_dedicated_store_resolves_its_cache_only() {
        let id = CacheId::from_name("accounts");
        let store: DedicatedEntryMapStore<String, u64> = DedicatedEntryMapStore::new(id, 4);

        assert!(store.entries_map(id).is_some());
        assert!(store.entries_map(CacheId::from_name("orders")).is_none());
        assert!(Arc::ptr_eq(&store.entries_map_or_create(id), &store.entries_map(id).unwrap()));
    }
}
