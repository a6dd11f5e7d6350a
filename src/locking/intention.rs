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

//! Intention set maintenance.
//!
//! Each module has one set recording the class locks outstanding inside it.
//! Members carry no TTL, so a holder that crashes leaves its member behind
//! until someone touches the set again and notices the embedded expiry has
//! passed. There is no background sweeper: stale members live at most until
//! the next class release or module acquire for that module.

use crate::error::Result;
use crate::locking::entry::LeaseEntry;
use crate::store::CoordinationStore;
use chrono::{DateTime, Utc};
use log::{debug, warn};

/// Outcome of a pruning pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PruneReport {
    pub removed: usize,
    pub live: Vec<LeaseEntry>,
}

/// Read-only view of one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentionMember {
    pub raw: String,
    pub entry: Option<LeaseEntry>,
    pub live: bool,
}

pub struct IntentionSet<'a> {
    store: &'a dyn CoordinationStore,
    key: &'a str,
}

impl<'a> IntentionSet<'a> {
    pub fn new(store: &'a dyn CoordinationStore, key: &'a str) -> Self {
        Self { store, key }
    }

    pub fn key(&self) -> &str {
        self.key
    }

    pub fn register(&self, entry: &LeaseEntry) -> Result<()> {
        self.store.set_add(self.key, &entry.encode())?;
        debug!("Registered intention {entry} in {}", self.key);
        Ok(())
    }

    /// Removes `member`, then prunes whatever else has expired.
    pub fn withdraw(&self, member: &str, now: DateTime<Utc>) -> Result<PruneReport> {
        self.store.set_remove(self.key, member)?;
        debug!("Withdrew intention {member} from {}", self.key);
        self.prune(now)
    }

    /// Removes every expired or unreadable member and reports the live ones.
    pub fn prune(&self, now: DateTime<Utc>) -> Result<PruneReport> {
        let mut report = PruneReport::default();
        for member in self.store.set_members(self.key)? {
            match live_entry(&member, now) {
                Some(entry) => report.live.push(entry),
                None => {
                    self.store.set_remove(self.key, &member)?;
                    report.removed += 1;
                }
            }
        }
        if report.removed > 0 {
            debug!(
                "Pruned {} stale intention(s) from {}",
                report.removed, self.key
            );
        }
        Ok(report)
    }

    /// Returns the first live member, pruning expired members met on the way.
    /// Stops scanning as soon as a live member is found.
    pub fn find_live(&self, now: DateTime<Utc>) -> Result<Option<LeaseEntry>> {
        for member in self.store.set_members(self.key)? {
            match live_entry(&member, now) {
                Some(entry) => return Ok(Some(entry)),
                None => {
                    self.store.set_remove(self.key, &member)?;
                    debug!("Pruned stale intention {member} from {}", self.key);
                }
            }
        }
        Ok(None)
    }

    /// Lists members without modifying the set.
    pub fn members(&self, now: DateTime<Utc>) -> Result<Vec<IntentionMember>> {
        Ok(self
            .store
            .set_members(self.key)?
            .into_iter()
            .map(|raw| {
                let entry = LeaseEntry::parse(&raw).ok();
                let live = entry.as_ref().is_some_and(|e| e.is_live(now));
                IntentionMember { raw, entry, live }
            })
            .collect())
    }
}

fn live_entry(member: &str, now: DateTime<Utc>) -> Option<LeaseEntry> {
    match LeaseEntry::parse(member) {
        Ok(entry) if entry.is_live(now) => Some(entry),
        Ok(_) => None,
        Err(err) => {
            warn!("Treating unreadable intention as expired: {err}");
            None
        }
    }
}
