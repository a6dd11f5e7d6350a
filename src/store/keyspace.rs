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

use crate::clock;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// In-memory image of the store shared by the bundled backends.
///
/// A key whose deadline is `t` is absent for every `now >= t`. Sets follow the
/// usual convention that removing the last member removes the set.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub(crate) struct Keyspace {
    #[serde(default)]
    values: BTreeMap<String, StoredValue>,
    #[serde(default)]
    sets: BTreeMap<String, BTreeSet<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredValue {
    value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
}

impl StoredValue {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

impl Keyspace {
    /// Drops keys whose TTL has elapsed. Returns how many were dropped.
    pub(crate) fn evict_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.values.len();
        self.values.retain(|_, stored| !stored.is_expired(now));
        before - self.values.len()
    }

    pub(crate) fn get(&mut self, key: &str, now: DateTime<Utc>) -> Option<String> {
        self.evict_key(key, now);
        self.values.get(key).map(|stored| stored.value.clone())
    }

    pub(crate) fn create_if_absent(&mut self, key: &str, value: &str, now: DateTime<Utc>) -> bool {
        self.evict_key(key, now);
        if self.values.contains_key(key) {
            return false;
        }
        self.values.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                expires_at: None,
            },
        );
        true
    }

    pub(crate) fn expire(&mut self, key: &str, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.evict_key(key, now);
        match self.values.get_mut(key) {
            Some(stored) => {
                stored.expires_at = Some(clock::deadline(now, ttl));
                true
            }
            None => false,
        }
    }

    pub(crate) fn delete(&mut self, key: &str) -> bool {
        let removed_value = self.values.remove(key).is_some();
        let removed_set = self.sets.remove(key).is_some();
        removed_value || removed_set
    }

    pub(crate) fn set_add(&mut self, key: &str, member: &str) -> bool {
        self.sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string())
    }

    pub(crate) fn set_remove(&mut self, key: &str, member: &str) -> bool {
        let Some(members) = self.sets.get_mut(key) else {
            return false;
        };
        let removed = members.remove(member);
        if members.is_empty() {
            self.sets.remove(key);
        }
        removed
    }

    pub(crate) fn set_members(&self, key: &str) -> Vec<String> {
        self.sets
            .get(key)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn value_count(&self) -> usize {
        self.values.len()
    }

    fn evict_key(&mut self, key: &str, now: DateTime<Utc>) {
        if self.values.get(key).is_some_and(|stored| stored.is_expired(now)) {
            self.values.remove(key);
        }
    }
}
