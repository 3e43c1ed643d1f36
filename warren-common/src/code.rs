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

//! Bound traits for keys, values, and hash builders.

use std::{
    fmt::Debug,
    hash::{BuildHasher, BuildHasherDefault, Hash},
};

use twox_hash::XxHash64;

/// Key trait for the entry map.
pub trait Key: Send + Sync + 'static + Hash + Eq + Clone + Debug {}
impl<T> Key for T where T: Send + Sync + 'static + Hash + Eq + Clone + Debug {}

/// Value trait for the entry map.
pub trait Value: Send + Sync + 'static + Clone {}
impl<T> Value for T where T: Send + Sync + 'static + Clone {}

/// Hash builder trait for the entry tables.
pub trait HashBuilder: BuildHasher + Clone + Send + Sync + 'static {}
impl<T> HashBuilder for T where T: BuildHasher + Clone + Send + Sync + 'static {}

/// Default hash builder for the entry tables.
pub type DefaultHashBuilder = BuildHasherDefault<XxHash64>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hash_builder_is_deterministic() {
        let a = DefaultHashBuilder::default();
        let b = DefaultHashBuilder::default();
        assert_eq!(a.hash_one("warren"), b.hash_one("warren"));
    }
}
