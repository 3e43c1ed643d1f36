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

//! Test doubles for the entry map collaborators.

use std::{
    marker::PhantomData,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use warren_common::{
    code::{Key, Value},
    event::{EntryEvent, EventSink},
    id::{NodeId, PartitionId, TopologyVersion},
};

use crate::{
    context::{CacheContext, CacheDescriptor, CacheMode},
    entry::CacheEntry,
    map::{EvictionHook, NoopEvictionHook, Reservation},
};

/// Event sink counting emissions per kind.
pub struct RecordingEventSink<K> {
    subscribed: bool,
    created: AtomicUsize,
    destroyed: AtomicUsize,
    _marker: PhantomData<K>,
}

impl<K> RecordingEventSink<K> {
    /// Sink subscribed to every event kind.
    pub fn new() -> Self {
        Self {
            subscribed: true,
            created: AtomicUsize::new(0),
            destroyed: AtomicUsize::new(0),
            _marker: PhantomData,
        }
    }

    /// Sink subscribed to nothing; any emission is a test failure.
    pub fn muted() -> Self {
        Self {
            subscribed: false,
            ..Self::new()
        }
    }

    /// Observed create events.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Observed destroy events.
    pub fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }
}

impl<K> Default for RecordingEventSink<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> EventSink for RecordingEventSink<K>
where
    K: Send + Sync + 'static,
{
    type Key = K;

    fn is_subscribed(&self, _: EntryEvent) -> bool {
        self.subscribed
    }

    fn emit(&self, _: PartitionId, _: &Self::Key, _: NodeId, event: EntryEvent) {
        assert!(self.subscribed, "emission must be gated on the subscription");
        match event {
            EntryEvent::Created => self.created.fetch_add(1, Ordering::SeqCst),
            EntryEvent::Destroyed => self.destroyed.fetch_add(1, Ordering::SeqCst),
        };
    }
}

/// Eviction hook counting registrations.
#[derive(Debug, Default)]
pub struct CountingEvictionHook {
    touches: AtomicUsize,
}

impl CountingEvictionHook {
    /// Observed registrations.
    pub fn touches(&self) -> usize {
        self.touches.load(Ordering::SeqCst)
    }
}

impl<K, V> EvictionHook<K, V> for CountingEvictionHook
where
    K: Key,
    V: Value,
{
    fn touch(&self, _: &Arc<CacheEntry<K, V>>, _: TopologyVersion) {
        self.touches.fetch_add(1, Ordering::SeqCst);
    }
}

/// Reservation that denies every acquisition.
#[derive(Debug, Default)]
pub struct DenyingReservation {
    releases: AtomicUsize,
}

impl DenyingReservation {
    /// Observed releases. Must stay zero: a permit that was never granted
    /// must never be returned.
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl<K, V> Reservation<K, V> for DenyingReservation
where
    K: Key,
    V: Value,
{
    fn acquire(&self) -> bool {
        false
    }

    fn release(&self, _: isize, _: Option<&Arc<CacheEntry<K, V>>>) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Context over a throwaway descriptor with no-op collaborators.
pub fn noop_context<K, V>(name: &str) -> Arc<CacheContext<K, V>>
where
    K: Key,
    V: Value,
{
    let descriptor = Arc::new(CacheDescriptor::new(name, CacheMode::Partitioned, 64).unwrap());
    Arc::new(CacheContext::new(
        descriptor,
        Arc::new(warren_common::event::NoopEventSink::default()),
        Arc::new(NoopEvictionHook),
        NodeId::new(1),
    ))
}
