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

use crate::commands::ScopeArgs;
use crate::error::Result;
use crate::locking::{LockCoordinator, ScopeStatus};
use colored::Colorize;
use comfy_table::{Cell, Color, Table};
use serde::Serialize;

#[derive(Serialize)]
struct StatusOutput<'a> {
    scope: String,
    class_key: &'a str,
    class_holder: Option<&'a str>,
    module_key: &'a str,
    module_locked: bool,
    intention_key: &'a str,
    intentions: Vec<IntentionOutput<'a>>,
}

#[derive(Serialize)]
struct IntentionOutput<'a> {
    member: &'a str,
    expires_at: Option<i64>,
    live: bool,
}

impl<'a> From<&'a ScopeStatus> for StatusOutput<'a> {
    fn from(status: &'a ScopeStatus) -> Self {
        Self {
            scope: status.scope.label(),
            class_key: &status.keys.class_key,
            class_holder: status.class_value.as_deref(),
            module_key: &status.keys.module_key,
            module_locked: status.module_locked,
            intention_key: &status.keys.intention_key,
            intentions: status
                .intentions
                .iter()
                .map(|member| IntentionOutput {
                    member: &member.raw,
                    expires_at: member.entry.as_ref().map(|e| e.expires_at().timestamp()),
                    live: member.live,
                })
                .collect(),
        }
    }
}

pub struct StatusCommand<'a> {
    coordinator: &'a LockCoordinator,
}

impl<'a> StatusCommand<'a> {
    pub fn new(coordinator: &'a LockCoordinator) -> Self {
        Self { coordinator }
    }

    pub fn execute(&self, scope_args: &ScopeArgs, json: bool) -> Result<()> {
        let scope = scope_args.to_scope(self.coordinator)?;
        let status = self.coordinator.inspect(&scope)?;

        if json {
            let output = StatusOutput::from(&status);
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!("{} {}", "Scope:".bold(), status.scope);

        let mut table = Table::new();
        table.load_preset(comfy_table::presets::UTF8_BORDERS_ONLY);
        table.set_header(vec![Cell::new("Key"), Cell::new("Kind"), Cell::new("State")]);
        table.add_row(vec![
            Cell::new(&status.keys.class_key),
            Cell::new("class"),
            held_cell(status.class_value.is_some()),
        ]);
        table.add_row(vec![
            Cell::new(&status.keys.module_key),
            Cell::new("module"),
            held_cell(status.module_locked),
        ]);
        for member in &status.intentions {
            let state = if member.live {
                Cell::new("live").fg(Color::Yellow)
            } else {
                Cell::new("expired").fg(Color::DarkGrey)
            };
            table.add_row(vec![Cell::new(&member.raw), Cell::new("intention"), state]);
        }
        println!("{table}");

        if status.intentions.len() > status.live_intentions() {
            println!(
                "{}",
                "Expired intentions are pruned on the next acquire/release, or run 'hilock prune'."
                    .dimmed()
            );
        }
        Ok(())
    }
}

fn held_cell(held: bool) -> Cell {
    if held {
        Cell::new("held").fg(Color::Red)
    } else {
        Cell::new("free").fg(Color::Green)
    }
}
