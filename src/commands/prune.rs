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
use crate::locking::{LockCoordinator, LockScope};

pub struct PruneCommand<'a> {
    coordinator: &'a LockCoordinator,
}

impl<'a> PruneCommand<'a> {
    pub fn new(coordinator: &'a LockCoordinator) -> Self {
        Self { coordinator }
    }

    pub fn execute(&self, prefix: Option<&str>, module: &str) -> Result<()> {
        let prefix = prefix.unwrap_or_else(|| self.coordinator.default_prefix());
        // The intention set is per module; the class component is irrelevant here.
        let scope = LockScope::new(prefix, module, module)?;
        let report = self.coordinator.prune(&scope)?;

        let keys = self.coordinator.keys(&scope);
        println!(
            "Pruned {} expired intention(s) from {} ({} live)",
            report.removed,
            keys.intention_key,
            report.live.len()
        );
        Ok(())
    }
}
