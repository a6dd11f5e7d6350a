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

pub mod acquire;
pub mod init;
pub mod prune;
pub mod release;
pub mod status;

use crate::error::Result;
use crate::locking::{LockCoordinator, LockScope};
use clap::Args;

/// Identifies the lock scope a command operates on.
#[derive(Args, Debug, Clone)]
pub struct ScopeArgs {
    /// Lock group (defaults to the configured default prefix)
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Module the class belongs to
    #[arg(short, long)]
    pub module: String,

    /// Class (unit of work) inside the module
    #[arg(short, long)]
    pub class: String,
}

impl ScopeArgs {
    pub fn to_scope(&self, coordinator: &LockCoordinator) -> Result<LockScope> {
        let prefix = self
            .prefix
            .as_deref()
            .unwrap_or_else(|| coordinator.default_prefix());
        LockScope::new(prefix, &self.module, &self.class)
    }
}
