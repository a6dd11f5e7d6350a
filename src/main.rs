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

use clap::{Parser, Subcommand};
use hilock::commands::ScopeArgs;
use hilock::commands::acquire::AcquireCommand;
use hilock::commands::init::InitCommand;
use hilock::commands::prune::PruneCommand;
use hilock::commands::release::ReleaseCommand;
use hilock::commands::status::StatusCommand;
use hilock::config::new_hilock_config;
use hilock::error::{HilockError, Result, format_error_with_color, get_exit_code};
use hilock::locking::{LockCoordinator, LockLevel};
use hilock::logging;
use std::io::IsTerminal;

#[derive(Parser)]
#[command(name = "hilock")]
#[command(author, version, about = "Hierarchical advisory locks over a shared store", long_about = None)]
struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Acquire a class or module lock
    #[command(visible_alias = "a")]
    Acquire {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Lock granularity: class or module
        #[arg(short, long, default_value = "class")]
        level: LockLevel,

        /// Lease in seconds (defaults to the configured lease)
        #[arg(long, value_name = "SECONDS")]
        lease: Option<u64>,

        /// Extra attempts with backoff while the lock is busy
        #[arg(long, value_name = "ATTEMPTS", default_value_t = 0)]
        wait: usize,
    },

    /// Release a class or module lock
    #[command(visible_alias = "r")]
    Release {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Lock granularity: class or module
        #[arg(short, long, default_value = "class")]
        level: LockLevel,
    },

    /// Show the keys and intentions of a scope
    #[command(visible_alias = "st")]
    Status {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Remove expired intentions from a module's intention set
    Prune {
        /// Lock group (defaults to the configured default prefix)
        #[arg(short, long)]
        prefix: Option<String>,

        /// Module whose intention set is pruned
        #[arg(short, long)]
        module: String,
    },

    /// Write the effective configuration to config.toml
    Init {
        /// Overwrite an existing config.toml
        #[arg(short, long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    logging::setup_logger(cli.verbose);

    // Load configuration once at startup
    let config = match new_hilock_config() {
        Ok(config) => config,
        Err(e) => exit_with_error(&e),
    };

    let result: Result<()> = (|| {
        if let Commands::Init { force } = cli.command {
            return InitCommand::new(&config).execute(force);
        }

        let coordinator = LockCoordinator::open(&config)?;
        match cli.command {
            Commands::Acquire {
                scope,
                level,
                lease,
                wait,
            } => AcquireCommand::new(&coordinator).execute(&scope, level, lease, wait),
            Commands::Release { scope, level } => {
                ReleaseCommand::new(&coordinator).execute(&scope, level)
            }
            Commands::Status { scope, json } => {
                StatusCommand::new(&coordinator).execute(&scope, json)
            }
            Commands::Prune { prefix, module } => {
                PruneCommand::new(&coordinator).execute(prefix.as_deref(), &module)
            }
            Commands::Init { .. } => Ok(()),
        }
    })();

    if let Err(e) = result {
        exit_with_error(&e);
    }
}

fn exit_with_error(error: &HilockError) -> ! {
    eprintln!(
        "{}",
        format_error_with_color(error, std::io::stderr().is_terminal())
    );
    std::process::exit(get_exit_code(error));
}
