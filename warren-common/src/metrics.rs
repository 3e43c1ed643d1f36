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

//! Entry map metrics via the `metrics` facade.

use std::fmt::Debug;

use metrics::{counter, gauge, Counter, Gauge};

/// Operation metrics for one concurrent cache map.
#[derive(Clone)]
pub struct Metrics {
    /// Lookup that found a mapped entry.
    pub map_hit: Counter,
    /// Lookup that found nothing.
    pub map_miss: Counter,
    /// Candidate entry installed into a mapping.
    pub map_create: Counter,
    /// Obsolete predecessor displaced or removed by the retry loop.
    pub map_destroy: Counter,
    /// Explicit entry removal that took effect.
    pub map_remove: Counter,
    /// Retry-loop iteration lost to a concurrent structural change.
    pub map_retry: Counter,
    /// Creation aborted by reservation denial.
    pub map_reserve_fail: Counter,

    /// Externally observable entry count.
    pub map_size: Gauge,
}

impl Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish()
    }
}

impl Metrics {
    /// Create a new metric bundle with the given map name.
    pub fn new(name: &str) -> Self {
        let map_hit = counter!("warren_map_op_total", "name" => name.to_string(), "op" => "hit");
        let map_miss = counter!("warren_map_op_total", "name" => name.to_string(), "op" => "miss");
        let map_create = counter!("warren_map_op_total", "name" => name.to_string(), "op" => "create");
        let map_destroy = counter!("warren_map_op_total", "name" => name.to_string(), "op" => "destroy");
        let map_remove = counter!("warren_map_op_total", "name" => name.to_string(), "op" => "remove");
        let map_retry = counter!("warren_map_op_total", "name" => name.to_string(), "op" => "retry");
        let map_reserve_fail =
            counter!("warren_map_op_total", "name" => name.to_string(), "op" => "reserve_fail");

        let map_size = gauge!("warren_map_size", "name" => name.to_string());

        Self {
            map_hit,
            map_miss,
            map_create,
            map_destroy,
            map_remove,
            map_retry,
            map_reserve_fail,
            map_size,
        }
    }
}
