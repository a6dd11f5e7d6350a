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

use crate::error::Result;
use crate::locking::coordinator::LockCoordinator;
use crate::locking::scope::{LockLevel, LockScope};
use log::warn;

/// RAII guard that releases a hierarchical lock when dropped.
pub struct ScopedLockGuard<'a> {
    coordinator: &'a LockCoordinator,
    scope: LockScope,
    level: LockLevel,
    released: bool,
}

impl<'a> ScopedLockGuard<'a> {
    pub(crate) fn new(coordinator: &'a LockCoordinator, scope: LockScope, level: LockLevel) -> Self {
        Self {
            coordinator,
            scope,
            level,
            released: false,
        }
    }

    pub fn scope(&self) -> &LockScope {
        &self.scope
    }

    pub fn level(&self) -> LockLevel {
        self.level
    }

    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.coordinator.release(&self.scope, self.level)
    }
}

impl Drop for ScopedLockGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(err) = self.coordinator.release(&self.scope, self.level) {
            warn!(
                "Failed to release {} lock for {}: {err}",
                self.level, self.scope
            );
        }
    }
}
