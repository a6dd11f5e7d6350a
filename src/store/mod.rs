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

//! Shared key/value store the lock protocol coordinates through.
//!
//! The protocol only needs a handful of primitives, each atomic on its own:
//! plain string keys with optional TTL, an atomic create-if-absent, and
//! unordered string sets. Composite protocol steps are not atomic.

pub mod file;
mod keyspace;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;

pub trait CoordinationStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` only if `key` is absent. Returns whether it was stored.
    fn create_if_absent(&self, key: &str, value: &str) -> Result<bool>;

    /// Sets or refreshes the TTL of `key`. No-op if the key is absent.
    fn expire(&self, key: &str, ttl: Duration) -> Result<()>;

    fn delete(&self, key: &str) -> Result<()>;

    fn set_add(&self, key: &str, member: &str) -> Result<()>;

    fn set_remove(&self, key: &str, member: &str) -> Result<()>;

    fn set_members(&self, key: &str) -> Result<Vec<String>>;
}

impl<S: CoordinationStore + ?Sized> CoordinationStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn create_if_absent(&self, key: &str, value: &str) -> Result<bool> {
        (**self).create_if_absent(key, value)
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        (**self).expire(key, ttl)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }

    fn set_add(&self, key: &str, member: &str) -> Result<()> {
        (**self).set_add(key, member)
    }

    fn set_remove(&self, key: &str, member: &str) -> Result<()> {
        (**self).set_remove(key, member)
    }

    fn set_members(&self, key: &str) -> Result<Vec<String>> {
        (**self).set_members(key)
    }
}
