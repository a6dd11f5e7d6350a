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

//! Fine-grained lock on one class.
//!
//! Acquire: refuse if the module is locked, create the class key if absent,
//! set its TTL, then register the same value in the module's intention set.
//! Release: delete the class key and withdraw its intention, pruning any other
//! expired intentions found in the set.
//!
//! If setting the TTL or registering fails after the key was created, the key
//! is deleted again before the error is returned.
//!
//! The module check and the intention registration are separate round-trips.
//! A module acquire running between the class key creation and the
//! registration sees an empty intention set and succeeds, so both locks can be
//! briefly live at once. Closing that window needs a single atomic multi-key
//! operation on the store side.

use crate::error::{HilockError, Result};
use crate::locking::entry::LeaseEntry;
use crate::locking::intention::IntentionSet;
use crate::locking::protocol::{LevelProtocol, ProtocolContext, discard_created_key};
use crate::locking::scope::{LockLevel, ScopeKeys};
use log::{debug, trace};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default)]
pub struct ClassLock;

impl LevelProtocol for ClassLock {
    fn level(&self) -> LockLevel {
        LockLevel::Class
    }

    fn acquire(&self, ctx: &ProtocolContext<'_>, keys: &ScopeKeys, lease: Duration) -> Result<()> {
        if ctx.store.get(&keys.module_key)?.is_some() {
            debug!(
                "Class lock {} refused: module {} is locked",
                keys.class_key, keys.module_key
            );
            return Err(HilockError::busy(&keys.module_key, LockLevel::Module));
        }

        let entry = LeaseEntry::granted(keys.class_key.as_str(), ctx.now, lease);
        if !ctx.store.create_if_absent(&keys.class_key, &entry.encode())? {
            debug!("Class lock {} is already held", keys.class_key);
            return Err(HilockError::busy(&keys.class_key, LockLevel::Class));
        }
        let armed = ctx
            .store
            .expire(&keys.class_key, lease)
            .and_then(|()| IntentionSet::new(ctx.store, &keys.intention_key).register(&entry));
        if let Err(err) = armed {
            discard_created_key(ctx.store, &keys.class_key, &err);
            return Err(err);
        }
        debug!("Acquired class lock {entry}");
        Ok(())
    }

    fn release(&self, ctx: &ProtocolContext<'_>, keys: &ScopeKeys) -> Result<()> {
        let Some(member) = ctx.store.get(&keys.class_key)?.filter(|v| !v.is_empty()) else {
            trace!("Class lock {} not held; nothing to release", keys.class_key);
            return Ok(());
        };

        ctx.store.delete(&keys.class_key)?;
        let report = IntentionSet::new(ctx.store, &keys.intention_key).withdraw(&member, ctx.now)?;
        debug!(
            "Released class lock {} ({} live intention(s) remain in {})",
            keys.class_key,
            report.live.len(),
            keys.intention_key
        );
        Ok(())
    }
}
