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

//! Coarse lock on a whole module.
//!
//! Granted only when the module's intention set holds no live member and the
//! module key can be created. Expired members met while checking are pruned.

use crate::error::{HilockError, Result};
use crate::locking::intention::IntentionSet;
use crate::locking::protocol::{LevelProtocol, ProtocolContext, discard_created_key};
use crate::locking::scope::{LockLevel, ScopeKeys};
use log::debug;
use std::time::Duration;

/// Value stored under a held module key.
pub const MODULE_SENTINEL: &str = "1";

#[derive(Debug, Clone, Copy, Default)]
pub struct ModuleLock;

impl LevelProtocol for ModuleLock {
    fn level(&self) -> LockLevel {
        LockLevel::Module
    }

    fn acquire(&self, ctx: &ProtocolContext<'_>, keys: &ScopeKeys, lease: Duration) -> Result<()> {
        let intentions = IntentionSet::new(ctx.store, &keys.intention_key);
        if let Some(outstanding) = intentions.find_live(ctx.now)? {
            debug!(
                "Module lock {} refused: class lock {outstanding} is outstanding",
                keys.module_key
            );
            return Err(HilockError::busy(outstanding.holder(), LockLevel::Class));
        }

        if !ctx.store.create_if_absent(&keys.module_key, MODULE_SENTINEL)? {
            debug!("Module lock {} is already held", keys.module_key);
            return Err(HilockError::busy(&keys.module_key, LockLevel::Module));
        }
        if let Err(err) = ctx.store.expire(&keys.module_key, lease) {
            discard_created_key(ctx.store, &keys.module_key, &err);
            return Err(err);
        }
        debug!(
            "Acquired module lock {} for {}s",
            keys.module_key,
            lease.as_secs()
        );
        Ok(())
    }

    fn release(&self, ctx: &ProtocolContext<'_>, keys: &ScopeKeys) -> Result<()> {
        ctx.store.delete(&keys.module_key)?;
        debug!("Released module lock {}", keys.module_key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locking::entry::LeaseEntry;
    use crate::locking::scope::{LockScope, resolve};
    use crate::store::{CoordinationStore, MemoryStore};
    use chrono::DateTime;

    fn keys() -> ScopeKeys {
        resolve("DL", &LockScope::new("default", "billing", "ordersync").unwrap())
    }

    fn ctx(store: &MemoryStore, now: i64) -> ProtocolContext<'_> {
        ProtocolContext {
            store,
            now: DateTime::from_timestamp(now, 0).unwrap(),
        }
    }

    #[test]
    fn acquires_when_no_intentions() {
        let store = MemoryStore::new();
        let keys = keys();
        ModuleLock
            .acquire(&ctx(&store, 1_000), &keys, Duration::from_secs(10))
            .unwrap();
        assert_eq!(
            store.get(&keys.module_key).unwrap().as_deref(),
            Some(MODULE_SENTINEL)
        );
    }

    #[test]
    fn live_intention_blocks_and_names_holder() {
        let store = MemoryStore::new();
        let keys = keys();
        store
            .set_add(&keys.intention_key, "DL:default:ordersync@2000")
            .unwrap();

        let err = ModuleLock
            .acquire(&ctx(&store, 1_000), &keys, Duration::from_secs(10))
            .unwrap_err();
        match err {
            HilockError::LockBusy { key, level } => {
                assert_eq!(key, "DL:default:ordersync");
                assert_eq!(level, LockLevel::Class);
            }
            other => panic!("Expected busy error, got {other:?}"),
        }
        assert!(store.get(&keys.module_key).unwrap().is_none());
    }

    #[test]
    fn expired_intentions_are_pruned_then_granted() {
        let store = MemoryStore::new();
        let keys = keys();
        let stale = LeaseEntry::parse("DL:default:ordersync@999").unwrap();
        store.set_add(&keys.intention_key, &stale.encode()).unwrap();

        ModuleLock
            .acquire(&ctx(&store, 1_000), &keys, Duration::from_secs(10))
            .unwrap();
        assert!(store.set_members(&keys.intention_key).unwrap().is_empty());
    }

    #[test]
    fn second_module_acquire_is_busy() {
        let store = MemoryStore::new();
        let keys = keys();
        let lease = Duration::from_secs(10);
        ModuleLock.acquire(&ctx(&store, 1_000), &keys, lease).unwrap();
        let err = ModuleLock
            .acquire(&ctx(&store, 1_000), &keys, lease)
            .unwrap_err();
        assert!(err.is_busy());
    }

    #[test]
    fn release_is_idempotent() {
        let store = MemoryStore::new();
        let keys = keys();
        ModuleLock.release(&ctx(&store, 1_000), &keys).unwrap();
        ModuleLock
            .acquire(&ctx(&store, 1_000), &keys, Duration::from_secs(10))
            .unwrap();
        ModuleLock.release(&ctx(&store, 1_001), &keys).unwrap();
        ModuleLock.release(&ctx(&store, 1_001), &keys).unwrap();
        assert!(store.get(&keys.module_key).unwrap().is_none());
    }
}
