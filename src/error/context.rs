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

use crate::error::HilockError;
use std::fmt;

pub struct ErrorContext<'a> {
    pub error: &'a HilockError,
    pub suggestion: Option<String>,
    pub details: Option<String>,
}

impl<'a> ErrorContext<'a> {
    pub fn new(error: &'a HilockError) -> Self {
        let (suggestion, details) = match error {
            HilockError::LockBusy { key, level } => {
                let suggestion = Some(
                    "Another holder owns this lock or a conflicting one. Wait for it to be \
                     released or for its lease to expire, then try again (or pass --wait)."
                        .to_string(),
                );
                let details = Some(format!("{level} lock contention on {key}"));
                (suggestion, details)
            }
            HilockError::StoreUnavailable(msg) => {
                let suggestion = Some(
                    "Check that the coordination store is reachable and writable. Increase \
                     HILOCK_STORE__TIMEOUT_MS if the store is heavily contended."
                        .to_string(),
                );
                let details = Some(format!("Store failure: {msg}"));
                (suggestion, details)
            }
            HilockError::CorruptStore(msg) => {
                let suggestion = Some(
                    "The store document could not be parsed. Remove it to reset all locks; \
                     leases are short-lived so no long-term state is lost."
                        .to_string(),
                );
                let details = Some(msg.clone());
                (suggestion, details)
            }
            HilockError::InvalidScope(msg) => {
                let suggestion = Some(
                    "Prefix, module and class must be non-empty and must not contain ':' \
                     (e.g., --prefix default --module billing --class order_sync)."
                        .to_string(),
                );
                let details = Some(format!("Invalid scope: {msg}"));
                (suggestion, details)
            }
            HilockError::InvalidLease(msg) => {
                let suggestion =
                    Some("Use a lease of at least one second (e.g., --lease 10).".to_string());
                let details = Some(msg.clone());
                (suggestion, details)
            }
            HilockError::InvalidConfig(msg) | HilockError::ConfigError(msg) => {
                let suggestion = Some(
                    "Check config.toml in HILOCK_HOME and any HILOCK_* environment variables."
                        .to_string(),
                );
                let details = Some(msg.clone());
                (suggestion, details)
            }
            HilockError::Io(io_err) => {
                let suggestion = match io_err.kind() {
                    std::io::ErrorKind::PermissionDenied => Some(
                        "Ensure you have write permissions to the store directory.".to_string(),
                    ),
                    std::io::ErrorKind::NotFound => {
                        Some("Ensure HILOCK_HOME points to an existing directory.".to_string())
                    }
                    _ => None,
                };
                (suggestion, None)
            }
            HilockError::Json(_) => (None, None),
        };

        Self {
            error,
            suggestion,
            details,
        }
    }
}

impl fmt::Display for ErrorContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error [{}]: {}", self.error.code(), self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\n\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}
