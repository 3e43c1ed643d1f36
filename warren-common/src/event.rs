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

//! Lifecycle event contract between the entry map and the event subsystem.

use std::marker::PhantomData;

use crate::id::{NodeId, PartitionId};

/// Lifecycle event kinds observable on the entry map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryEvent {
    /// A new entry was installed into the mapping.
    Created,
    /// An entry instance was detached from the mapping for good.
    Destroyed,
}

/// Trait for the customized lifecycle event sink.
///
/// Emission is gated on [`EventSink::is_subscribed`]: the entry map checks
/// the subscription before building and emitting the event, so a sink that
/// answers `false` must tolerate not seeing the event at all.
pub trait EventSink: Send + Sync + 'static {
    /// Associated key type.
    type Key;

    /// Whether anyone currently listens for the given event kind.
    fn is_subscribed(&self, event: EntryEvent) -> bool;

    /// Record a lifecycle event for the key.
    fn emit(&self, partition: PartitionId, key: &Self::Key, node: NodeId, event: EntryEvent);
}

/// Sink that subscribes to nothing.
pub struct NoopEventSink<K>(PhantomData<K>);

impl<K> Default for NoopEventSink<K> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<K> EventSink for NoopEventSink<K>
where
    K: Send + Sync + 'static,
{
    type Key = K;

    fn is_subscribed(&self, _: EntryEvent) -> bool {
        false
    }

    fn emit(&self, _: PartitionId, _: &Self::Key, _: NodeId, _: EntryEvent) {}
}
