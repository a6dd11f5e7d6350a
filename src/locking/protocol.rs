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

use crate::error::{HilockError, Result};
use crate::locking::class_lock::ClassLock;
use crate::locking::module_lock::ModuleLock;
use crate::locking::scope::{LockLevel, ScopeKeys};
use crate::store::CoordinationStore;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::time::Duration;

/// Store handle and the instant the current operation is evaluated at.
pub struct ProtocolContext<'a> {
    pub store: &'a dyn CoordinationStore,
    pub now: DateTime<Utc>,
}

/// Acquire/release steps for one lock level.
pub trait LevelProtocol: Send + Sync {
    fn level(&self) -> LockLevel;

    fn acquire(&self, ctx: &ProtocolContext<'_>, keys: &ScopeKeys, lease: Duration) -> Result<()>;

    /// Must succeed when nothing is held.
    fn release(&self, ctx: &ProtocolContext<'_>, keys: &ScopeKeys) -> Result<()>;
}

static CLASS_LOCK: ClassLock = ClassLock;
static MODULE_LOCK: ModuleLock = ModuleLock;

pub fn protocol_for(level: LockLevel) -> &'static dyn LevelProtocol {
    match level {
        LockLevel::Class => &CLASS_LOCK,
        LockLevel::Module => &MODULE_LOCK,
    }
}

/// Best-effort delete of a key created earlier in an acquire that then failed.
/// A key left behind here would carry no TTL and never free itself.
pub(crate) fn discard_created_key(store: &dyn CoordinationStore, key: &str, cause: &HilockError) {
    match store.delete(key) {
        Ok(()) => debug!("Discarded {key} after failed acquire: {cause}"),
        Err(err) => warn!("Failed to discard {key} after failed acquire ({cause}): {err}"),
    }
}
