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
use crate::config::HilockConfig;
use crate::error::{HilockError, Result};
use crate::locking::guard::ScopedLockGuard;
use crate::locking::intention::{IntentionMember, IntentionSet, PruneReport};
use crate::locking::optimistic::OptimisticLock;
use crate::locking::protocol::{ProtocolContext, protocol_for};
use crate::locking::scope::{KeyResolver, LockLevel, LockScope, ScopeKeys};
use crate::store::{CoordinationStore, FileStore};
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;

/// Snapshot of the store state relevant to one scope.
#[derive(Debug, Clone)]
pub struct ScopeStatus {
    pub scope: LockScope,
    pub keys: ScopeKeys,
    pub class_value: Option<String>,
    pub module_locked: bool,
    pub intentions: Vec<IntentionMember>,
}

impl ScopeStatus {
    pub fn live_intentions(&self) -> usize {
        self.intentions.iter().filter(|m| m.live).count()
    }
}

/// Entry point for taking and releasing hierarchical locks.
///
/// The coordinator holds no lock state of its own; everything lives in the
/// injected store, so any number of coordinators in any number of processes
/// may share one store.
pub struct LockCoordinator {
    store: Arc<dyn CoordinationStore>,
    clock: Arc<dyn Clock>,
    resolver: KeyResolver,
    default_prefix: String,
    default_lease: Duration,
}

impl LockCoordinator {
    pub fn new(store: Arc<dyn CoordinationStore>, config: &HilockConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn CoordinationStore>,
        config: &HilockConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            clock,
            resolver: KeyResolver::new(config.namespace.clone()),
            default_prefix: config.default_prefix.clone(),
            default_lease: config.default_lease(),
        }
    }

    /// Builds a coordinator over the file store configured in `config`.
    pub fn open(config: &HilockConfig) -> Result<Self> {
        let store = FileStore::open(config.store_path(), config.store_timeout())?;
        debug!("Using file store at {}", store.path().display());
        Ok(Self::new(Arc::new(store), config))
    }

    pub fn default_lease(&self) -> Duration {
        self.default_lease
    }

    pub fn default_prefix(&self) -> &str {
        &self.default_prefix
    }

    pub fn keys(&self, scope: &LockScope) -> Arc<ScopeKeys> {
        self.resolver.keys(scope)
    }

    /// Acquires with the configured default lease.
    pub fn acquire(&self, scope: &LockScope, level: LockLevel) -> Result<()> {
        self.acquire_with_lease(scope, level, self.default_lease)
    }

    /// Fails with [`HilockError::LockBusy`] on contention. Not reentrant: a
    /// holder asking again is refused like anyone else.
    pub fn acquire_with_lease(
        &self,
        scope: &LockScope,
        level: LockLevel,
        lease: Duration,
    ) -> Result<()> {
        validate_lease(lease)?;
        let keys = self.keys(scope);
        protocol_for(level).acquire(&self.context(), &keys, lease)?;
        info!("Acquired {level} lock for {scope} ({}s lease)", lease.as_secs());
        Ok(())
    }

    /// Idempotent; releasing an unheld lock is not an error.
    pub fn release(&self, scope: &LockScope, level: LockLevel) -> Result<()> {
        let keys = self.keys(scope);
        protocol_for(level).release(&self.context(), &keys)?;
        info!("Released {level} lock for {scope}");
        Ok(())
    }

    /// Acquires and returns a guard that releases when dropped.
    pub fn acquire_guard(
        &self,
        scope: &LockScope,
        level: LockLevel,
        lease: Option<Duration>,
    ) -> Result<ScopedLockGuard<'_>> {
        self.acquire_with_lease(scope, level, lease.unwrap_or(self.default_lease))?;
        Ok(ScopedLockGuard::new(self, scope.clone(), level))
    }

    /// Reads the scope's keys without pruning anything.
    pub fn inspect(&self, scope: &LockScope) -> Result<ScopeStatus> {
        let keys = self.keys(scope);
        let now = self.clock.now();
        let class_value = self.store.get(&keys.class_key)?;
        let module_locked = self.store.get(&keys.module_key)?.is_some();
        let intentions =
            IntentionSet::new(self.store.as_ref(), &keys.intention_key).members(now)?;
        Ok(ScopeStatus {
            scope: scope.clone(),
            keys: (*keys).clone(),
            class_value,
            module_locked,
            intentions,
        })
    }

    /// Prunes the module's intention set on demand.
    pub fn prune(&self, scope: &LockScope) -> Result<PruneReport> {
        let keys = self.keys(scope);
        IntentionSet::new(self.store.as_ref(), &keys.intention_key).prune(self.clock.now())
    }

    /// Flat single-key locks sharing this coordinator's store and namespace.
    pub fn optimistic(&self) -> OptimisticLock<'_> {
        OptimisticLock::new(self.store.as_ref(), &self.resolver)
    }

    fn context(&self) -> ProtocolContext<'_> {
        ProtocolContext {
            store: self.store.as_ref(),
            now: self.clock.now(),
        }
    }
}

pub(crate) fn validate_lease(lease: Duration) -> Result<()> {
    if lease.as_secs() == 0 {
        return Err(HilockError::InvalidLease(format!(
            "lease must be at least one second, got {:.3}s",
            lease.as_secs_f64()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;
    use mockall::mock;
    use std::sync::atomic::{AtomicBool, Ordering};

    mock! {
        Store {}

        impl CoordinationStore for Store {
            fn get(&self, key: &str) -> Result<Option<String>>;
            fn create_if_absent(&self, key: &str, value: &str) -> Result<bool>;
            fn expire(&self, key: &str, ttl: Duration) -> Result<()>;
            fn delete(&self, key: &str) -> Result<()>;
            fn set_add(&self, key: &str, member: &str) -> Result<()>;
            fn set_remove(&self, key: &str, member: &str) -> Result<()>;
            fn set_members(&self, key: &str) -> Result<Vec<String>>;
        }
    }

    fn scope(class: &str) -> LockScope {
        LockScope::new("default", "Billing", class).unwrap()
    }

    fn coordinator() -> (LockCoordinator, Arc<MemoryStore>) {
        let clock = Arc::new(ManualClock::at_unix(1_700_000_000));
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        let coordinator =
            LockCoordinator::with_clock(store.clone(), &HilockConfig::default(), clock);
        (coordinator, store)
    }

    #[test]
    fn default_lease_comes_from_config() {
        let (coordinator, store) = coordinator();
        coordinator
            .acquire(&scope("OrderSync"), LockLevel::Class)
            .unwrap();
        let value = store.get("DL:default:ordersync").unwrap().unwrap();
        assert_eq!(value, "DL:default:ordersync@1700000010");
        assert_eq!(coordinator.default_prefix(), "default");
    }

    #[test]
    fn zero_lease_is_rejected() {
        let (coordinator, _) = coordinator();
        let err = coordinator
            .acquire_with_lease(&scope("OrderSync"), LockLevel::Module, Duration::ZERO)
            .unwrap_err();
        assert!(matches!(err, HilockError::InvalidLease(_)));
    }

    #[test]
    fn inspect_reports_without_pruning() {
        let (coordinator, store) = coordinator();
        store.set_add("DL:default:IX:billing", "old@1").unwrap();
        coordinator
            .acquire(&scope("OrderSync"), LockLevel::Class)
            .unwrap();

        let status = coordinator.inspect(&scope("OrderSync")).unwrap();
        assert!(status.class_value.is_some());
        assert!(!status.module_locked);
        assert_eq!(status.intentions.len(), 2);
        assert_eq!(status.live_intentions(), 1);

        let report = coordinator.prune(&scope("OrderSync")).unwrap();
        assert_eq!(report.removed, 1);
        assert_eq!(report.live.len(), 1);
    }

    #[test]
    fn guard_releases_on_drop() {
        let (coordinator, store) = coordinator();
        {
            let guard = coordinator
                .acquire_guard(&scope("OrderSync"), LockLevel::Class, None)
                .unwrap();
            assert_eq!(guard.level(), LockLevel::Class);
            assert!(store.get("DL:default:ordersync").unwrap().is_some());
        }
        assert!(store.get("DL:default:ordersync").unwrap().is_none());
        coordinator
            .acquire(&scope("Billing"), LockLevel::Module)
            .unwrap();
    }

    #[test]
    fn store_failure_propagates_unchanged() {
        let mut store = MockStore::new();
        store
            .expect_get()
            .returning(|_| Err(HilockError::StoreUnavailable("connection reset".to_string())));
        let coordinator = LockCoordinator::new(Arc::new(store), &HilockConfig::default());

        let err = coordinator
            .acquire(&scope("OrderSync"), LockLevel::Class)
            .unwrap_err();
        assert!(matches!(err, HilockError::StoreUnavailable(msg) if msg == "connection reset"));

        let err = coordinator
            .release(&scope("OrderSync"), LockLevel::Class)
            .unwrap_err();
        assert!(!err.is_busy());
    }

    #[test]
    fn module_release_is_one_round_trip() {
        let mut store = MockStore::new();
        store
            .expect_delete()
            .withf(|key| key == "DL:default:billing")
            .times(1)
            .returning(|_| Ok(()));
        let coordinator = LockCoordinator::new(Arc::new(store), &HilockConfig::default());
        coordinator
            .release(&scope("OrderSync"), LockLevel::Module)
            .unwrap();
    }

    fn unavailable(msg: &str) -> HilockError {
        HilockError::StoreUnavailable(msg.to_string())
    }

    #[test]
    fn failed_registration_deletes_created_class_key() {
        let mut store = MockStore::new();
        store.expect_get().returning(|_| Ok(None));
        store.expect_create_if_absent().returning(|_, _| Ok(true));
        store.expect_expire().returning(|_, _| Ok(()));
        store
            .expect_set_add()
            .returning(|_, _| Err(unavailable("write failed")));
        store
            .expect_delete()
            .withf(|key| key == "DL:default:ordersync")
            .times(1)
            .returning(|_| Ok(()));
        let coordinator = LockCoordinator::new(Arc::new(store), &HilockConfig::default());

        let err = coordinator
            .acquire(&scope("OrderSync"), LockLevel::Class)
            .unwrap_err();
        assert!(matches!(err, HilockError::StoreUnavailable(msg) if msg == "write failed"));
    }

    #[test]
    fn failed_expire_deletes_created_class_key() {
        let mut store = MockStore::new();
        store.expect_get().returning(|_| Ok(None));
        store.expect_create_if_absent().returning(|_, _| Ok(true));
        store
            .expect_expire()
            .returning(|_, _| Err(unavailable("ttl failed")));
        store.expect_set_add().never();
        store
            .expect_delete()
            .withf(|key| key == "DL:default:ordersync")
            .times(1)
            .returning(|_| Ok(()));
        let coordinator = LockCoordinator::new(Arc::new(store), &HilockConfig::default());

        let err = coordinator
            .acquire(&scope("OrderSync"), LockLevel::Class)
            .unwrap_err();
        assert!(matches!(err, HilockError::StoreUnavailable(msg) if msg == "ttl failed"));
    }

    #[test]
    fn failed_expire_deletes_created_module_key() {
        let mut store = MockStore::new();
        store.expect_set_members().returning(|_| Ok(Vec::new()));
        store.expect_create_if_absent().returning(|_, _| Ok(true));
        store
            .expect_expire()
            .returning(|_, _| Err(unavailable("ttl failed")));
        store
            .expect_delete()
            .withf(|key| key == "DL:default:billing")
            .times(1)
            .returning(|_| Ok(()));
        let coordinator = LockCoordinator::new(Arc::new(store), &HilockConfig::default());

        let err = coordinator
            .acquire(&scope("OrderSync"), LockLevel::Module)
            .unwrap_err();
        assert!(matches!(err, HilockError::StoreUnavailable(msg) if msg == "ttl failed"));
    }

    #[test]
    fn failed_cleanup_keeps_original_error() {
        let mut store = MockStore::new();
        store.expect_create_if_absent().returning(|_, _| Ok(true));
        store
            .expect_expire()
            .returning(|_, _| Err(unavailable("ttl failed")));
        store
            .expect_delete()
            .withf(|key| key == "DL:OL:payout")
            .times(1)
            .returning(|_| Err(unavailable("delete failed")));
        let coordinator = LockCoordinator::new(Arc::new(store), &HilockConfig::default());

        let err = coordinator
            .optimistic()
            .try_lock("payout", "1", Duration::from_secs(10))
            .unwrap_err();
        assert!(matches!(err, HilockError::StoreUnavailable(msg) if msg == "ttl failed"));
    }

    /// Memory store whose next `expire` call fails once.
    struct ExpireFailsOnce {
        inner: MemoryStore,
        fail_next: AtomicBool,
    }

    impl CoordinationStore for ExpireFailsOnce {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn create_if_absent(&self, key: &str, value: &str) -> Result<bool> {
            self.inner.create_if_absent(key, value)
        }

        fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(unavailable("blip"));
            }
            self.inner.expire(key, ttl)
        }

        fn delete(&self, key: &str) -> Result<()> {
            self.inner.delete(key)
        }

        fn set_add(&self, key: &str, member: &str) -> Result<()> {
            self.inner.set_add(key, member)
        }

        fn set_remove(&self, key: &str, member: &str) -> Result<()> {
            self.inner.set_remove(key, member)
        }

        fn set_members(&self, key: &str) -> Result<Vec<String>> {
            self.inner.set_members(key)
        }
    }

    #[test]
    fn transient_expire_failure_leaves_lock_free() {
        let clock = Arc::new(ManualClock::at_unix(1_700_000_000));
        let store = Arc::new(ExpireFailsOnce {
            inner: MemoryStore::with_clock(clock.clone()),
            fail_next: AtomicBool::new(true),
        });
        let coordinator =
            LockCoordinator::with_clock(store.clone(), &HilockConfig::default(), clock);

        let err = coordinator
            .acquire(&scope("OrderSync"), LockLevel::Class)
            .unwrap_err();
        assert!(matches!(err, HilockError::StoreUnavailable(msg) if msg == "blip"));
        assert!(store.get("DL:default:ordersync").unwrap().is_none());
        assert!(store.set_members("DL:default:IX:billing").unwrap().is_empty());

        coordinator
            .acquire(&scope("OrderSync"), LockLevel::Class)
            .unwrap();
    }
}
