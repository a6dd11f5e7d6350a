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

//! Self-describing lease values.
//!
//! Class-lock values and intention-set members share the `holder@expiry`
//! format, where `expiry` is an absolute unix timestamp in seconds. Set members
//! carry no TTL of their own, so staleness has to be readable from the value.

use crate::clock;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const ENTRY_SEPARATOR: char = '@';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseEntry {
    holder: String,
    expires_at: DateTime<Utc>,
}

impl LeaseEntry {
    /// Expiry is truncated to whole seconds, the resolution of the encoding.
    pub fn new(holder: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        let expires_at =
            DateTime::from_timestamp(expires_at.timestamp(), 0).unwrap_or(expires_at);
        Self {
            holder: holder.into(),
            expires_at,
        }
    }

    pub fn granted(holder: impl Into<String>, now: DateTime<Utc>, lease: Duration) -> Self {
        Self::new(holder, clock::deadline(now, lease))
    }

    pub fn holder(&self) -> &str {
        &self.holder
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Live while `now` has not passed the embedded expiry.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() <= self.expires_at.timestamp()
    }

    pub fn encode(&self) -> String {
        format!(
            "{}{ENTRY_SEPARATOR}{}",
            self.holder,
            self.expires_at.timestamp()
        )
    }

    pub fn parse(raw: &str) -> Result<Self, EntryParseError> {
        let (holder, expiry) = raw
            .rsplit_once(ENTRY_SEPARATOR)
            .ok_or_else(|| EntryParseError::new(raw, "missing '@' separator"))?;
        if holder.is_empty() {
            return Err(EntryParseError::new(raw, "empty holder"));
        }
        let seconds = expiry
            .parse::<i64>()
            .map_err(|_| EntryParseError::new(raw, "expiry is not a unix timestamp"))?;
        let expires_at = DateTime::from_timestamp(seconds, 0)
            .ok_or_else(|| EntryParseError::new(raw, "expiry out of range"))?;
        Ok(Self {
            holder: holder.to_string(),
            expires_at,
        })
    }
}

impl fmt::Display for LeaseEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for LeaseEntry {
    type Err = EntryParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

/// Error produced when a stored value is not a valid `holder@expiry` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryParseError {
    message: String,
}

impl EntryParseError {
    fn new(raw: &str, reason: &str) -> Self {
        Self {
            message: format!("Lease entry '{raw}' is malformed: {reason}"),
        }
    }
}

impl fmt::Display for EntryParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EntryParseError {}
