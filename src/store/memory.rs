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

use crate::clock::{Clock, SystemClock};
use crate::error::{HilockError, Result};
use crate::store::CoordinationStore;
use crate::store::keyspace::Keyspace;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Process-local store. Every primitive runs under one mutex, which gives the
/// same per-operation atomicity a networked store offers.
pub struct MemoryStore {
    state: Mutex<Keyspace>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(Keyspace::default()),
            clock,
        }
    }

    /// Locks the keyspace and drops every key whose TTL has elapsed.
    fn state(&self, now: DateTime<Utc>) -> Result<MutexGuard<'_, Keyspace>> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| HilockError::StoreUnavailable("memory store lock poisoned".to_string()))?;
        state.evict_expired(now);
        Ok(state)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinationStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let now = self.clock.now();
        Ok(self.state(now)?.get(key, now))
    }

    fn create_if_absent(&self, key: &str, value: &str) -> Result<bool> {
        let now = self.clock.now();
        Ok(self.state(now)?.create_if_absent(key, value, now))
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        let now = self.clock.now();
        self.state(now)?.expire(key, ttl, now);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.state(self.clock.now())?.delete(key);
        Ok(())
    }

    fn set_add(&self, key: &str, member: &str) -> Result<()> {
        self.state(self.clock.now())?.set_add(key, member);
        Ok(())
    }

    fn set_remove(&self, key: &str, member: &str) -> Result<()> {
        self.state(self.clock.now())?.set_remove(key, member);
        Ok(())
    }

    fn set_members(&self, key: &str) -> Result<Vec<String>> {
        Ok(self.state(self.clock.now())?.set_members(key))
    }
}
