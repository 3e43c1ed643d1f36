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

//! Cache entry: one key's cached record with its lifecycle flags.

use std::{
    fmt::Debug,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use bitflags::bitflags;
use parking_lot::{Mutex, MutexGuard};
use warren_common::{
    code::{Key, Value},
    id::{PartitionId, TopologyVersion},
};

use crate::{context::CacheContext, view::EntryPredicate};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Flags: u64 {
        const OBSOLETE = 0b00000001;
        const DELETED = 0b00000010;
    }
}

/// One key's cached record.
///
/// An entry is exclusively referenced from its cache's mapping while live.
/// Once detached from the mapping it becomes history: callers may still hold
/// the `Arc`, but the instance can never displace or remove its successor.
///
/// Two lifecycle flags are tracked independently and must not be collapsed:
///
/// - *obsolete*: the instance is tombstoned, retired from active service and
///   pending physical removal;
/// - *deleted*: the record was logically removed by application action,
///   regardless of whether the instance is still physically mapped.
///
/// Size accounting consults the deleted flag under the entry's narrow lock
/// ([`CacheEntry::flags_guard`]); event emission does not.
pub struct CacheEntry<K, V>
where
    K: Key,
    V: Value,
{
    key: K,
    partition: PartitionId,
    start_version: TopologyVersion,
    context: Arc<CacheContext<K, V>>,

    value: Mutex<Option<V>>,
    flags: AtomicU64,
    // Guards the deleted/obsolete flag reads during the size-accounting
    // decision. Never guards map-level structural operations.
    guard: Mutex<()>,
}

impl<K, V> Debug for CacheEntry<K, V>
where
    K: Key,
    V: Value,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("key", &self.key)
            .field("partition", &self.partition)
            .field("obsolete", &self.is_obsolete())
            .field("deleted", &self.is_deleted())
            .finish()
    }
}

impl<K, V> CacheEntry<K, V>
where
    K: Key,
    V: Value,
{
    pub(crate) fn new(
        key: K,
        partition: PartitionId,
        start_version: TopologyVersion,
        context: Arc<CacheContext<K, V>>,
    ) -> Self {
        Self {
            key,
            partition,
            start_version,
            context,
            value: Mutex::new(None),
            flags: AtomicU64::new(0),
            guard: Mutex::new(()),
        }
    }

    /// Get the immutable reference of the entry key.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Get the partition the key maps to.
    pub fn partition(&self) -> PartitionId {
        self.partition
    }

    /// Get the topology version the entry was constructed under.
    pub fn start_version(&self) -> TopologyVersion {
        self.start_version
    }

    /// Get the owning cache context.
    pub fn context(&self) -> &Arc<CacheContext<K, V>> {
        &self.context
    }

    /// Copy the current value out of the entry.
    pub fn value(&self) -> Option<V> {
        self.value.lock().clone()
    }

    /// Set the entry value, returning the previous one.
    pub fn set_value(&self, value: V) -> Option<V> {
        self.value.lock().replace(value)
    }

    /// Take the entry value out.
    pub fn take_value(&self) -> Option<V> {
        self.value.lock().take()
    }

    /// Whether the instance is tombstoned.
    pub fn is_obsolete(&self) -> bool {
        self.get_flags(Flags::OBSOLETE, Ordering::Acquire)
    }

    /// Tombstone the instance, retiring it from active service.
    ///
    /// Returns whether the flag was newly set.
    pub fn mark_obsolete(&self) -> bool {
        let old = self.flags.fetch_or(Flags::OBSOLETE.bits(), Ordering::AcqRel);
        old & Flags::OBSOLETE.bits() == 0
    }

    /// Whether the record was logically removed by application action.
    pub fn is_deleted(&self) -> bool {
        self.get_flags(Flags::DELETED, Ordering::Acquire)
    }

    /// Set the logical-removal flag.
    pub fn set_deleted(&self, deleted: bool) {
        let _guard = self.guard.lock();
        self.set_flags(Flags::DELETED, deleted, Ordering::Release);
    }

    /// Lock the flag reads for a size-accounting decision.
    pub(crate) fn flags_guard(&self) -> MutexGuard<'_, ()> {
        self.guard.lock()
    }

    /// Whether filtered views may visit the entry.
    pub fn is_visible(&self) -> bool {
        !self.is_obsolete() && !self.is_deleted()
    }

    pub(crate) fn visitable(&self, filter: &[Arc<dyn EntryPredicate<K, V>>]) -> bool {
        self.is_visible() && filter.iter().all(|p| p.test(self))
    }

    fn set_flags(&self, flags: Flags, val: bool, order: Ordering) {
        match val {
            true => self.flags.fetch_or(flags.bits(), order),
            false => self.flags.fetch_and(!flags.bits(), order),
        };
    }

    fn get_flags(&self, flags: Flags, order: Ordering) -> bool {
        self.flags.load(order) & flags.bits() == flags.bits()
    }
}
