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

use crate::error::format::format_error_with_color;
use crate::error::*;
use crate::locking::LockLevel;

#[test]
fn test_lock_busy_has_stable_code() {
    let error = HilockError::busy("DL:default:OrderSync", LockLevel::Class);
    assert_eq!(error.code(), LOCK_BUSY_CODE);
    assert_eq!(error.code(), 4400);
    assert_ne!(error.code(), 4300);
    assert!(error.is_busy());
}

#[test]
fn test_store_unavailable_is_not_busy() {
    let error = HilockError::StoreUnavailable("connection refused".to_string());
    assert!(!error.is_busy());
    assert_ne!(error.code(), LOCK_BUSY_CODE);
}

#[test]
fn test_error_context_lock_busy() {
    let error = HilockError::busy("DL:default:billing", LockLevel::Module);
    let context = ErrorContext::new(&error);

    assert!(context.suggestion.unwrap().contains("try again"));
    let details = context.details.unwrap();
    assert!(details.contains("module"));
    assert!(details.contains("DL:default:billing"));
}

#[test]
fn test_error_context_invalid_scope() {
    let error = HilockError::InvalidScope("module is empty".to_string());
    let context = ErrorContext::new(&error);

    assert!(context.suggestion.unwrap().contains("--module"));
    assert!(context.details.unwrap().contains("module is empty"));
}

#[test]
fn test_error_context_store_unavailable() {
    let error = HilockError::StoreUnavailable("timed out".to_string());
    let context = ErrorContext::new(&error);

    assert!(
        context
            .suggestion
            .unwrap()
            .contains("HILOCK_STORE__TIMEOUT_MS")
    );
}

#[test]
fn test_format_error_chain_includes_code() {
    let error = HilockError::busy("DL:default:OrderSync", LockLevel::Class);
    let formatted = format_error_chain(&error);

    assert!(formatted.starts_with("Error [4400]:"));
    assert!(formatted.contains("Details:"));
    assert!(formatted.contains("Suggestion:"));
}

#[test]
fn test_format_error_with_color_disabled() {
    let error = HilockError::InvalidLease("lease must be positive".to_string());
    let formatted = format_error_with_color(&error, false);

    assert!(!formatted.contains("\x1b["));
    assert!(formatted.starts_with("Error [4200]:"));
    assert!(formatted.contains("Suggestion: Use a lease"));
    assert_eq!(formatted, format_error_chain(&error));
}

#[test]
fn test_format_error_with_color_enabled() {
    let error = HilockError::StoreUnavailable("down".to_string());
    let formatted = format_error_with_color(&error, true);

    assert!(formatted.contains("\x1b[31m"));
    assert!(formatted.contains("Store failure: down"));
    assert!(formatted.contains("Suggestion:"));
    assert!(formatted.ends_with("\x1b[0m"));
}
