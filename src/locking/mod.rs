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

//! Hierarchical advisory locks.
//!
//! Two granularities share one store: a `class` lock guards one unit of work,
//! a `module` lock guards every class in a module. Class locks advertise
//! themselves in a per-module intention set so a module lock can be refused
//! without scanning class keys. Locks are advisory and lease-bound: nothing
//! stops a caller that skips the protocol, and a crashed holder's lock lapses
//! once its lease runs out.

pub mod class_lock;
pub mod coordinator;
pub mod entry;
pub mod guard;
pub mod intention;
pub mod module_lock;
pub mod optimistic;
pub mod protocol;
pub mod retry;
pub mod scope;

pub use coordinator::{LockCoordinator, ScopeStatus};
pub use entry::{EntryParseError, LeaseEntry};
pub use guard::ScopedLockGuard;
pub use intention::{IntentionMember, IntentionSet, PruneReport};
pub use optimistic::OptimisticLock;
pub use retry::{RetryPolicy, acquire_with_retry, try_acquire_with_retry};
pub use scope::{KeyResolver, LockLevel, LockScope, ScopeKeys, resolve};
