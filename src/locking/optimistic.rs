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

//! Flat single-key lock without any hierarchy: create-if-absent plus TTL to
//! take it, delete to drop it. Useful for guarding one resource by name when
//! class/module grouping does not apply.

use crate::error::{HilockError, Result};
use crate::locking::coordinator::validate_lease;
use crate::locking::protocol::discard_created_key;
use crate::locking::scope::KeyResolver;
use crate::store::CoordinationStore;
use log::debug;
use std::time::Duration;

pub struct OptimisticLock<'a> {
    store: &'a dyn CoordinationStore,
    resolver: &'a KeyResolver,
}

impl<'a> OptimisticLock<'a> {
    pub fn new(store: &'a dyn CoordinationStore, resolver: &'a KeyResolver) -> Self {
        Self { store, resolver }
    }

    /// Returns `false` when someone else holds `name`.
    pub fn try_lock(&self, name: &str, value: &str, lease: Duration) -> Result<bool> {
        validate_lease(lease)?;
        let key = self.key(name)?;
        if !self.store.create_if_absent(&key, value)? {
            debug!("Optimistic lock {key} is already held");
            return Ok(false);
        }
        if let Err(err) = self.store.expire(&key, lease) {
            discard_created_key(self.store, &key, &err);
            return Err(err);
        }
        debug!("Acquired optimistic lock {key} for {}s", lease.as_secs());
        Ok(true)
    }

    pub fn unlock(&self, name: &str) -> Result<()> {
        let key = self.key(name)?;
        self.store.delete(&key)?;
        debug!("Released optimistic lock {key}");
        Ok(())
    }

    pub fn holder(&self, name: &str) -> Result<Option<String>> {
        self.store.get(&self.key(name)?)
    }

    fn key(&self, name: &str) -> Result<String> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(HilockError::InvalidScope(
                "optimistic lock name must not be empty".to_string(),
            ));
        }
        Ok(self.resolver.flat_key(trimmed))
    }
}
