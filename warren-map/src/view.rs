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

//! Read-only filtered views over a cache's entries.

use std::sync::Arc;

use warren_common::code::{HashBuilder, Key, Value};

use crate::{
    entry::CacheEntry,
    table::{EntryTable, Scan},
};

/// Predicate over entries for filtered views.
pub trait EntryPredicate<K, V>: Send + Sync + 'static
where
    K: Key,
    V: Value,
{
    /// Whether the view accepts the entry.
    fn test(&self, entry: &CacheEntry<K, V>) -> bool;
}

impl<K, V, F> EntryPredicate<K, V> for F
where
    K: Key,
    V: Value,
    F: Fn(&CacheEntry<K, V>) -> bool + Send + Sync + 'static,
{
    fn test(&self, entry: &CacheEntry<K, V>) -> bool {
        self(entry)
    }
}

/// Read-only filtered collection view over a cache's entries.
///
/// The view is live, not snapshot-isolated: every call re-reads the current
/// mapping. An entry is visited iff every supplied predicate accepts it and
/// the entry itself is visible. A single iteration is weakly consistent:
/// each shard is observed atomically, but shards are observed one after
/// another.
pub struct Entries<K, V, S>
where
    K: Key,
    V: Value,
    S: HashBuilder,
{
    table: Option<Arc<EntryTable<K, V, S>>>,
    filter: Vec<Arc<dyn EntryPredicate<K, V>>>,
}

impl<K, V, S> Entries<K, V, S>
where
    K: Key,
    V: Value,
    S: HashBuilder,
{
    pub(crate) fn new(
        table: Option<Arc<EntryTable<K, V, S>>>,
        filter: Vec<Arc<dyn EntryPredicate<K, V>>>,
    ) -> Self {
        Self { table, filter }
    }

    /// Iterate over the visitable entries.
    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter {
            scan: self.table.as_ref().map(|table| Scan::new(table.clone())),
            filter: &self.filter,
        }
    }

    /// Number of visitable entries, computed by traversal.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether no entry is visitable.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

impl<'a, K, V, S> IntoIterator for &'a Entries<K, V, S>
where
    K: Key,
    V: Value,
    S: HashBuilder,
{
    type Item = Arc<CacheEntry<K, V>>;
    type IntoIter = Iter<'a, K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Read-only filtered set view over a cache's entries.
///
/// Iteration and liveness follow [`Entries`]. Membership is instance
/// identity plus the filter: an entry is contained iff it is the mapping's
/// current occupant for its key and it passes the filter.
pub struct EntrySet<K, V, S>
where
    K: Key,
    V: Value,
    S: HashBuilder,
{
    table: Option<Arc<EntryTable<K, V, S>>>,
    filter: Vec<Arc<dyn EntryPredicate<K, V>>>,
}

impl<K, V, S> EntrySet<K, V, S>
where
    K: Key,
    V: Value,
    S: HashBuilder,
{
    pub(crate) fn new(
        table: Option<Arc<EntryTable<K, V, S>>>,
        filter: Vec<Arc<dyn EntryPredicate<K, V>>>,
    ) -> Self {
        Self { table, filter }
    }

    /// Iterate over the visitable entries.
    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter {
            scan: self.table.as_ref().map(|table| Scan::new(table.clone())),
            filter: &self.filter,
        }
    }

    /// Number of visitable entries.
    ///
    /// Computed by full traversal on each call, since the backing table
    /// offers no O(1) filtered cardinality.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether no entry is visitable.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Whether the exact instance is currently mapped and passes the filter.
    pub fn contains(&self, entry: &Arc<CacheEntry<K, V>>) -> bool {
        let Some(table) = self.table.as_ref() else {
            return false;
        };
        match table.get(entry.key()) {
            Some(current) => Arc::ptr_eq(&current, entry) && entry.visitable(&self.filter),
            None => false,
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a EntrySet<K, V, S>
where
    K: Key,
    V: Value,
    S: HashBuilder,
{
    type Item = Arc<CacheEntry<K, V>>;
    type IntoIter = Iter<'a, K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the visitable entries of a view.
pub struct Iter<'a, K, V, S>
where
    K: Key,
    V: Value,
    S: HashBuilder,
{
    scan: Option<Scan<K, V, S>>,
    filter: &'a [Arc<dyn EntryPredicate<K, V>>],
}

impl<K, V, S> Iterator for Iter<'_, K, V, S>
where
    K: Key,
    V: Value,
    S: HashBuilder,
{
    type Item = Arc<CacheEntry<K, V>>;

    fn next(&mut self) -> Option<Self::Item> {
        let scan = self.scan.as_mut()?;
        let filter = self.filter;
        scan.find(|entry| entry.visitable(filter))
    }
}
