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

use crate::error::{ErrorContext, HilockError};

const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Plain rendering: the error line, then details and a suggestion when known.
pub fn format_error_chain(error: &HilockError) -> String {
    ErrorContext::new(error).to_string()
}

/// Same layout as [`format_error_chain`], styled with ANSI colours when
/// `use_color` is set. Styled output always ends with a reset.
pub fn format_error_with_color(error: &HilockError, use_color: bool) -> String {
    if !use_color {
        return format_error_chain(error);
    }

    let context = ErrorContext::new(error);
    let mut output = format!("{RED}{BOLD}Error [{}]:{RESET} {error}", error.code());
    if let Some(details) = &context.details {
        output.push_str(&format!("\n\n{BOLD}Details:{RESET} {details}"));
    }
    if let Some(suggestion) = &context.suggestion {
        output.push_str(&format!(
            "\n\n{YELLOW}{BOLD}Suggestion:{RESET} {CYAN}{suggestion}"
        ));
    }
    output.push_str(RESET);
    output
}
