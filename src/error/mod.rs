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

mod context;
mod exit_codes;
mod format;
#[cfg(test)]
mod tests;

pub use context::ErrorContext;
pub use exit_codes::get_exit_code;
pub use format::{format_error_chain, format_error_with_color};

use crate::locking::LockLevel;
use thiserror::Error;

/// Stable code reported for lock contention. Callers branch on it to decide
/// between "retry later" and a hard failure.
///
/// This is the distributed-lock code (4400) for every busy outcome. Earlier
/// clients may have seen 4300 for the same condition; it is no longer used.
pub const LOCK_BUSY_CODE: u32 = 4400;

#[derive(Error, Debug)]
pub enum HilockError {
    #[error("Lock '{key}' is busy, try again shortly")]
    LockBusy { key: String, level: LockLevel },

    #[error("Coordination store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Coordination store is corrupt: {0}")]
    CorruptStore(String),

    #[error("Invalid lock scope: {0}")]
    InvalidScope(String),

    #[error("Invalid lease: {0}")]
    InvalidLease(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl HilockError {
    pub fn busy(key: impl Into<String>, level: LockLevel) -> Self {
        HilockError::LockBusy {
            key: key.into(),
            level,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, HilockError::LockBusy { .. })
    }

    /// Numeric code that stays stable across releases.
    pub fn code(&self) -> u32 {
        match self {
            HilockError::LockBusy { .. } => LOCK_BUSY_CODE,
            HilockError::StoreUnavailable(_) => 4410,
            HilockError::CorruptStore(_) => 4420,
            HilockError::InvalidScope(_) | HilockError::InvalidLease(_) => 4200,
            HilockError::InvalidConfig(_) | HilockError::ConfigError(_) => 4210,
            HilockError::Io(_) | HilockError::Json(_) => 400,
        }
    }
}

impl From<config::ConfigError> for HilockError {
    fn from(err: config::ConfigError) -> Self {
        HilockError::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HilockError>;
