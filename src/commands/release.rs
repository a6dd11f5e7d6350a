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
use crate::locking::{LockCoordinator, LockLevel};

pub struct ReleaseCommand<'a> {
    coordinator: &'a LockCoordinator,
}

impl<'a> ReleaseCommand<'a> {
    pub fn new(coordinator: &'a LockCoordinator) -> Self {
        Self { coordinator }
    }

    pub fn execute(&self, scope_args: &ScopeArgs, level: LockLevel) -> Result<()> {
        let scope = scope_args.to_scope(self.coordinator)?;
        self.coordinator.release(&scope, level)?;

        let keys = self.coordinator.keys(&scope);
        println!("Released {level} lock {}", keys.lock_key(level));
        Ok(())
    }
}
