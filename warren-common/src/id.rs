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

//! Identifier newtypes shared across the cache.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use twox_hash::XxHash64;

/// Stable identifier of a cache, derived from the cache name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CacheId(u32);

impl CacheId {
    /// Derive the identifier from the cache name.
    ///
    /// The derivation only depends on the name, so every node computes the
    /// same id for the same cache.
    pub fn from_name(name: &str) -> Self {
        let hash = XxHash64::oneshot(0, name.as_bytes());
        Self((hash ^ (hash >> 32)) as u32)
    }

    /// Raw id.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl Display for CacheId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a cache partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionId(u32);

impl PartitionId {
    /// Wrap a raw partition number.
    pub const fn new(partition: u32) -> Self {
        Self(partition)
    }

    /// Raw partition number.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

/// Identifier of a cluster node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// Wrap a raw node id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw node id.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Version of the cluster membership and partition ownership under which an
/// operation executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TopologyVersion(u64);

impl TopologyVersion {
    /// The version before any membership change was observed.
    pub const ZERO: Self = Self(0);

    /// Wrap a raw version.
    pub const fn new(version: u64) -> Self {
        Self(version)
    }

    /// Raw version.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Display for TopologyVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
