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

//! Concurrent entry map at the heart of the warren partitioned in-memory cache.
//!
//! The crate maps a cache key to its live entry object and coordinates
//! concurrent creation and removal on the same key without a global lock.
//! Structural changes go through atomic single-key primitives on sharded
//! per-cache tables; an optimistic retry loop re-evaluates on every lost
//! race. Size accounting, lifecycle-event emission, and eviction
//! registration happen exactly once per call, no matter how many retries
//! the call took.

mod context;
mod entry;
mod factory;
mod map;
mod store;
mod table;
mod view;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use context::{CacheContext, CacheDescriptor, CacheMode, CacheSchema};
pub use entry::CacheEntry;
pub use factory::{DefaultEntryFactory, EntryFactory};
pub use map::{
    AtomicSizeAccounting, CacheMapConfig, ConcurrentCacheMap, EvictionHook, NoopEvictionHook,
    Reservation, SizeAccounting, UnboundedReservation,
};
pub use store::{DedicatedEntryMapStore, EntryMapStore, SharedEntryMapStore};
pub use table::EntryTable;
pub use view::{Entries, EntryPredicate, EntrySet, Iter};
