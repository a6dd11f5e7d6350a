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

use crate::error::{HilockError, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const STORE_FILE_NAME: &str = "store.json";
pub const HOME_ENV_VAR: &str = "HILOCK_HOME";
const ENV_PREFIX: &str = "HILOCK";
const DEFAULT_HOME_DIR: &str = ".hilock";

pub const DEFAULT_NAMESPACE: &str = "DL";
pub const DEFAULT_PREFIX: &str = "default";
pub const DEFAULT_LEASE_SECS: u64 = 10;
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 2_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HilockConfig {
    /// Directory holding `config.toml` and, by default, the store document.
    #[serde(skip)]
    pub home: PathBuf,

    /// First segment of every store key.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Lock group used when a caller does not name one.
    #[serde(default = "default_prefix")]
    pub default_prefix: String,

    #[serde(default = "default_lease_secs")]
    pub default_lease_secs: u64,

    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store document location; relative paths resolve against the home dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// How long one store operation may wait for the store's own file lock.
    #[serde(default = "default_store_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            timeout_ms: DEFAULT_STORE_TIMEOUT_MS,
        }
    }
}

impl Default for HilockConfig {
    fn default() -> Self {
        Self {
            home: PathBuf::from("."),
            namespace: default_namespace(),
            default_prefix: default_prefix(),
            default_lease_secs: DEFAULT_LEASE_SECS,
            store: StoreConfig::default(),
        }
    }
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_lease_secs() -> u64 {
    DEFAULT_LEASE_SECS
}

fn default_store_timeout_ms() -> u64 {
    DEFAULT_STORE_TIMEOUT_MS
}

impl HilockConfig {
    /// Loads `<home>/config.toml` (optional) overlaid with `HILOCK_*`
    /// environment variables, e.g. `HILOCK_DEFAULT_LEASE_SECS=30` or
    /// `HILOCK_STORE__TIMEOUT_MS=500`.
    pub fn load(home: &Path) -> Result<Self> {
        let config_path = home.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            log::debug!("Loading config from {}", config_path.display());
        } else {
            log::debug!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
        }

        let settings = Config::builder()
            .add_source(
                File::from(config_path)
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: HilockConfig = settings.try_deserialize()?;
        config.home = home.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = self.config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| HilockError::ConfigError(format!("Failed to serialize config: {e}")))?;

        fs::write(&config_path, contents)?;
        log::debug!("Saved config to {}", config_path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() || self.namespace.contains(':') {
            return Err(HilockError::InvalidConfig(format!(
                "namespace '{}' must be non-empty and must not contain ':'",
                self.namespace
            )));
        }
        if self.default_prefix.trim().is_empty() {
            return Err(HilockError::InvalidConfig(
                "default_prefix must not be empty".to_string(),
            ));
        }
        if self.default_lease_secs == 0 {
            return Err(HilockError::InvalidConfig(
                "default_lease_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.home.join(CONFIG_FILE_NAME)
    }

    pub fn store_path(&self) -> PathBuf {
        match &self.store.path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.home.join(path),
            None => self.home.join(STORE_FILE_NAME),
        }
    }

    pub fn default_lease(&self) -> Duration {
        Duration::from_secs(self.default_lease_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store.timeout_ms)
    }
}

/// `HILOCK_HOME`, else `~/.hilock`.
pub fn resolve_home() -> Result<PathBuf> {
    if let Ok(home) = env::var(HOME_ENV_VAR)
        && !home.trim().is_empty()
    {
        return Ok(PathBuf::from(home));
    }
    dirs::home_dir()
        .map(|dir| dir.join(DEFAULT_HOME_DIR))
        .ok_or_else(|| {
            HilockError::ConfigError(format!(
                "Could not determine home directory; set {HOME_ENV_VAR}"
            ))
        })
}

pub fn new_hilock_config() -> Result<HilockConfig> {
    let home = resolve_home()?;
    HilockConfig::load(&home)
}
