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

//! Caller-side waiting for contended locks.
//!
//! The protocol itself never retries. Callers that would rather wait than
//! fail fast wrap an acquire here: only `LockBusy` is retried, with
//! exponential backoff; any other error aborts immediately.

use crate::error::{HilockError, Result};
use crate::locking::coordinator::LockCoordinator;
use crate::locking::scope::{LockLevel, LockScope};
use log::{debug, info};
use retry::{OperationResult, delay::Exponential, retry_with_index};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: usize,
    pub initial_delay_ms: u64,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// One attempt, no waiting.
    pub fn no_retry() -> Self {
        Self::new(1)
    }

    fn delays(&self) -> impl Iterator<Item = Duration> + use<> {
        let cap = self.max_delay;
        Exponential::from_millis(self.initial_delay_ms.max(1))
            .map(move |delay| delay.min(cap))
            .take(self.max_attempts.saturating_sub(1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 100,
            max_delay: Duration::from_secs(2),
        }
    }
}

pub fn acquire_with_retry(
    coordinator: &LockCoordinator,
    scope: &LockScope,
    level: LockLevel,
    lease: Duration,
    policy: &RetryPolicy,
) -> Result<()> {
    let result = retry_with_index(policy.delays(), |attempt| {
        match coordinator.acquire_with_lease(scope, level, lease) {
            Ok(()) => OperationResult::Ok(()),
            Err(err) if err.is_busy() => {
                debug!("Attempt {attempt} for {level} lock on {scope} busy: {err}");
                OperationResult::Retry(err)
            }
            Err(err) => OperationResult::Err(err),
        }
    });

    result.map_err(|retry_err| {
        if retry_err.error.is_busy() {
            info!(
                "Giving up on {level} lock for {scope} after {} attempt(s)",
                retry_err.tries
            );
        }
        retry_err.error
    })
}

/// Same as [`acquire_with_retry`] but yields `Ok(false)` instead of an error
/// when the lock stays busy.
pub fn try_acquire_with_retry(
    coordinator: &LockCoordinator,
    scope: &LockScope,
    level: LockLevel,
    lease: Duration,
    policy: &RetryPolicy,
) -> Result<bool> {
    match acquire_with_retry(coordinator, scope, level, lease, policy) {
        Ok(()) => Ok(true),
        Err(HilockError::LockBusy { .. }) => Ok(false),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HilockConfig;
    use crate::store::MemoryStore;
    use std::sync::Arc;
    use std::thread;

    fn fast_policy(attempts: usize) -> RetryPolicy {
        RetryPolicy {
            max_attempts: attempts,
            initial_delay_ms: 2,
            max_delay: Duration::from_millis(20),
        }
    }

    #[test]
    fn delays_are_capped_and_counted() {
        let policy = fast_policy(4);
        let delays: Vec<Duration> = policy.delays().collect();
        assert_eq!(delays.len(), 3);
        assert!(delays.iter().all(|d| *d <= Duration::from_millis(20)));
        assert_eq!(RetryPolicy::no_retry().delays().count(), 0);
    }

    #[test]
    fn gives_up_with_busy_error() {
        let coordinator =
            LockCoordinator::new(Arc::new(MemoryStore::new()), &HilockConfig::default());
        let scope = LockScope::new("default", "billing", "ordersync").unwrap();
        coordinator.acquire(&scope, LockLevel::Class).unwrap();

        let err = acquire_with_retry(
            &coordinator,
            &scope,
            LockLevel::Class,
            Duration::from_secs(10),
            &fast_policy(3),
        )
        .unwrap_err();
        assert!(err.is_busy());

        let acquired = try_acquire_with_retry(
            &coordinator,
            &scope,
            LockLevel::Class,
            Duration::from_secs(10),
            &fast_policy(2),
        )
        .unwrap();
        assert!(!acquired);
    }

    #[test]
    fn non_busy_errors_are_not_retried() {
        let coordinator =
            LockCoordinator::new(Arc::new(MemoryStore::new()), &HilockConfig::default());
        let scope = LockScope::new("default", "billing", "ordersync").unwrap();
        let err = acquire_with_retry(
            &coordinator,
            &scope,
            LockLevel::Class,
            Duration::ZERO,
            &fast_policy(50),
        )
        .unwrap_err();
        assert!(matches!(err, HilockError::InvalidLease(_)));
    }

    #[test]
    fn succeeds_once_holder_releases() {
        let coordinator = Arc::new(LockCoordinator::new(
            Arc::new(MemoryStore::new()),
            &HilockConfig::default(),
        ));
        let scope = LockScope::new("default", "billing", "ordersync").unwrap();
        coordinator.acquire(&scope, LockLevel::Module).unwrap();

        let releaser = {
            let coordinator = coordinator.clone();
            let scope = scope.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                coordinator.release(&scope, LockLevel::Module).unwrap();
            })
        };

        let policy = RetryPolicy {
            max_attempts: 50,
            initial_delay_ms: 5,
            max_delay: Duration::from_millis(20),
        };
        acquire_with_retry(
            &coordinator,
            &scope,
            LockLevel::Class,
            Duration::from_secs(10),
            &policy,
        )
        .unwrap();
        releaser.join().unwrap();
    }
}
