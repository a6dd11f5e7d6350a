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

use crate::commands::ScopeArgs;
use crate::error::Result;
use crate::locking::{LockCoordinator, LockLevel, RetryPolicy, acquire_with_retry};
use std::time::Duration;

pub struct AcquireCommand<'a> {
    coordinator: &'a LockCoordinator,
}

impl<'a> AcquireCommand<'a> {
    pub fn new(coordinator: &'a LockCoordinator) -> Self {
        Self { coordinator }
    }

    /// `wait` is the number of extra attempts made while the lock is busy.
    pub fn execute(
        &self,
        scope_args: &ScopeArgs,
        level: LockLevel,
        lease_secs: Option<u64>,
        wait: usize,
    ) -> Result<()> {
        let scope = scope_args.to_scope(self.coordinator)?;
        let lease = lease_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.coordinator.default_lease());

        let policy = RetryPolicy::new(wait.saturating_add(1));
        acquire_with_retry(self.coordinator, &scope, level, lease, &policy)?;

        let keys = self.coordinator.keys(&scope);
        println!(
            "Acquired {level} lock {} for {}s",
            keys.lock_key(level),
            lease.as_secs()
        );
        Ok(())
    }
}
