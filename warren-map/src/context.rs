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

//! Cache descriptor and the per-cache context consulted by the entry map.

use std::{
    fmt::Debug,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use arc_swap::{ArcSwap, ArcSwapOption};
use serde::{Deserialize, Serialize};
use warren_common::{
    code::{Key, Value},
    error::{Error, ErrorKind, Result},
    event::EventSink,
    id::{CacheId, NodeId, TopologyVersion},
};

use crate::map::EvictionHook;

/// Replication mode of a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheMode {
    /// Keys are spread over partitions owned by different nodes.
    Partitioned,
    /// Every node holds every key.
    Replicated,
    /// The cache exists on the local node only.
    Local,
}

/// Queryable schema attached to a cache.
///
/// Replaced wholesale on change; readers always observe a complete copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSchema {
    /// Type names queryable on the cache.
    pub types: Vec<String>,
}

/// Static metadata of one cache.
///
/// A pure data holder: the only synchronization is copy-on-read/write for
/// the schema and plain atomics for the mutable scalars.
pub struct CacheDescriptor {
    name: String,
    cache_id: CacheId,
    mode: CacheMode,
    partitions: u32,

    schema: ArcSwap<CacheSchema>,
    start_version: ArcSwapOption<TopologyVersion>,
    updates_allowed: AtomicBool,
}

impl Debug for CacheDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheDescriptor")
            .field("name", &self.name)
            .field("cache_id", &self.cache_id)
            .field("mode", &self.mode)
            .field("partitions", &self.partitions)
            .finish()
    }
}

impl CacheDescriptor {
    /// Create a descriptor for the named cache.
    pub fn new(name: impl Into<String>, mode: CacheMode, partitions: u32) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::new(ErrorKind::Config, "cache name must not be empty"));
        }
        if partitions == 0 {
            return Err(Error::new(ErrorKind::Config, "cache must carry at least one partition")
                .with_context("name", &name));
        }

        let cache_id = CacheId::from_name(&name);

        Ok(Self {
            name,
            cache_id,
            mode,
            partitions,
            schema: ArcSwap::from_pointee(CacheSchema::default()),
            start_version: ArcSwapOption::empty(),
            updates_allowed: AtomicBool::new(true),
        })
    }

    /// Cache name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cache id, derived from the name.
    pub fn cache_id(&self) -> CacheId {
        self.cache_id
    }

    /// Replication mode.
    pub fn mode(&self) -> CacheMode {
        self.mode
    }

    /// Partition count.
    pub fn partitions(&self) -> u32 {
        self.partitions
    }

    /// Current schema copy.
    pub fn schema(&self) -> Arc<CacheSchema> {
        self.schema.load_full()
    }

    /// Replace the schema.
    pub fn set_schema(&self, schema: CacheSchema) {
        self.schema.store(Arc::new(schema));
    }

    /// Topology version the cache started under, if started.
    pub fn start_version(&self) -> Option<TopologyVersion> {
        self.start_version.load_full().map(|v| *v)
    }

    /// Record the topology version the cache started under.
    pub fn set_start_version(&self, version: TopologyVersion) {
        self.start_version.store(Some(Arc::new(version)));
    }

    /// Whether updates are currently allowed on the cache.
    pub fn updates_allowed(&self) -> bool {
        self.updates_allowed.load(Ordering::Acquire)
    }

    /// Allow or forbid updates on the cache.
    pub fn set_updates_allowed(&self, allowed: bool) {
        self.updates_allowed.store(allowed, Ordering::Release);
    }
}

/// Per-cache execution context.
///
/// Bundles the descriptor with the collaborators the entry map consults:
/// the lifecycle event sink, the eviction hook, and the local node id.
pub struct CacheContext<K, V>
where
    K: Key,
    V: Value,
{
    descriptor: Arc<CacheDescriptor>,
    events: Arc<dyn EventSink<Key = K>>,
    evictions: Arc<dyn EvictionHook<K, V>>,
    local_node: NodeId,
}

impl<K, V> CacheContext<K, V>
where
    K: Key,
    V: Value,
{
    /// Bundle a context from its parts.
    pub fn new(
        descriptor: Arc<CacheDescriptor>,
        events: Arc<dyn EventSink<Key = K>>,
        evictions: Arc<dyn EvictionHook<K, V>>,
        local_node: NodeId,
    ) -> Self {
        Self {
            descriptor,
            events,
            evictions,
            local_node,
        }
    }

    /// Cache id of the owning cache.
    pub fn cache_id(&self) -> CacheId {
        self.descriptor.cache_id()
    }

    /// Cache descriptor.
    pub fn descriptor(&self) -> &Arc<CacheDescriptor> {
        &self.descriptor
    }

    /// Lifecycle event sink.
    pub fn events(&self) -> &Arc<dyn EventSink<Key = K>> {
        &self.events
    }

    /// Eviction registration hook.
    pub fn evictions(&self) -> &Arc<dyn EvictionHook<K, V>> {
        &self.evictions
    }

    /// Local node id, used as the originating node of emitted events.
    pub fn local_node(&self) -> NodeId {
        self.local_node
    }
}
