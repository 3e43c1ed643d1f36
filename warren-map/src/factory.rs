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

//! Entry construction.

use std::sync::Arc;

use warren_common::{
    code::{DefaultHashBuilder, HashBuilder, Key, Value},
    id::{PartitionId, TopologyVersion},
};

use crate::{context::CacheContext, entry::CacheEntry};

/// Constructs entry objects.
///
/// Pure: a factory never registers the entry into any mapping and produces
/// no side effects beyond allocation. The orchestrator publishes the entry
/// itself, and only after winning the structural race.
pub trait EntryFactory<K, V>: Send + Sync + 'static
where
    K: Key,
    V: Value,
{
    /// Build a fresh entry for the key under the given topology version.
    fn create(
        &self,
        ctx: &Arc<CacheContext<K, V>>,
        topology_version: TopologyVersion,
        key: &K,
    ) -> Arc<CacheEntry<K, V>>;
}

/// Factory assigning partitions by key hash.
#[derive(Debug)]
pub struct DefaultEntryFactory<S = DefaultHashBuilder> {
    hash_builder: S,
}

impl<S> DefaultEntryFactory<S> {
    /// Create a factory with an explicit hash builder.
    pub fn new(hash_builder: S) -> Self {
        Self { hash_builder }
    }
}

impl Default for DefaultEntryFactory<DefaultHashBuilder> {
    fn default() -> Self {
        Self::new(DefaultHashBuilder::default())
    }
}

impl<K, V, S> EntryFactory<K, V> for DefaultEntryFactory<S>
where
    K: Key,
    V: Value,
    S: HashBuilder,
{
    fn create(
        &self,
        ctx: &Arc<CacheContext<K, V>>,
        topology_version: TopologyVersion,
        key: &K,
    ) -> Arc<CacheEntry<K, V>> {
        let partitions = ctx.descriptor().partitions() as u64;
        let partition = PartitionId::new((self.hash_builder.hash_one(key) % partitions) as u32);
        Arc::new(CacheEntry::new(key.clone(), partition, topology_version, ctx.clone()))
    }
}
