// Copyright 2025 dentsusoken
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

#![allow(dead_code)]

use hilock::clock::ManualClock;
use hilock::config::HilockConfig;
use hilock::locking::{LockCoordinator, LockScope};
use hilock::store::MemoryStore;
use std::sync::Arc;

pub const START: i64 = 1_700_000_000;

/// Coordinator over an in-memory store driven by a manual clock.
pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryStore>,
    pub coordinator: LockCoordinator,
}

impl Harness {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::at_unix(START));
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        let coordinator =
            LockCoordinator::with_clock(store.clone(), &HilockConfig::default(), clock.clone());
        Self {
            clock,
            store,
            coordinator,
        }
    }
}

pub fn scope(module: &str, class: &str) -> LockScope {
    LockScope::new("default", module, class).unwrap()
}
