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

//! Store backed by a JSON document on a local or shared filesystem.
//!
//! Every primitive runs inside an exclusive advisory lock on a sidecar
//! `<store>.lock` file: load the document, apply the operation, write it back
//! through a temporary file and rename. Independent processes on one host
//! therefore see the same per-operation atomicity as a networked store.

use crate::clock::{Clock, SystemClock};
use crate::error::{HilockError, Result};
use crate::store::CoordinationStore;
use crate::store::keyspace::Keyspace;
use chrono::{DateTime, Utc};
use log::{debug, trace, warn};
use retry::delay::Exponential;
use std::fs::{self, File, OpenOptions, TryLockError};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

const LOCK_SUFFIX: &str = ".lock";
const INITIAL_POLL_MS: u64 = 5;
const MAX_POLL_DELAY: Duration = Duration::from_millis(200);

pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
    timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl FileStore {
    pub fn open<P: Into<PathBuf>>(path: P, timeout: Duration) -> Result<Self> {
        Self::with_clock(path, timeout, Arc::new(SystemClock))
    }

    pub fn with_clock<P: Into<PathBuf>>(
        path: P,
        timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                HilockError::StoreUnavailable(format!(
                    "Failed to create store directory {}: {err}",
                    parent.display()
                ))
            })?;
        }
        let mut lock_name = path.file_name().unwrap_or_default().to_os_string();
        lock_name.push(LOCK_SUFFIX);
        let lock_path = path.with_file_name(lock_name);
        Ok(Self {
            path,
            lock_path,
            timeout,
            clock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs `op` against the current document under the store lock. The
    /// document is written back when `op` reports a change or expired keys
    /// were evicted while loading.
    fn transact<T>(&self, op: impl FnOnce(&mut Keyspace, DateTime<Utc>) -> (T, bool)) -> Result<T> {
        let lock_file = self.lock_exclusive()?;
        let result = self.transact_locked(op);
        if let Err(err) = lock_file.unlock() {
            warn!(
                "Failed to release store lock {}: {err}",
                self.lock_path.display()
            );
        }
        result
    }

    fn transact_locked<T>(
        &self,
        op: impl FnOnce(&mut Keyspace, DateTime<Utc>) -> (T, bool),
    ) -> Result<T> {
        let now = self.clock.now();
        let mut keyspace = self.load()?;
        let evicted = keyspace.evict_expired(now);
        let (value, changed) = op(&mut keyspace, now);
        if changed || evicted > 0 {
            self.save(&keyspace)?;
        }
        Ok(value)
    }

    fn lock_exclusive(&self) -> Result<File> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|err| {
                HilockError::StoreUnavailable(format!(
                    "Failed to open store lock {}: {err}",
                    self.lock_path.display()
                ))
            })?;

        let started = Instant::now();
        let mut delays =
            Exponential::from_millis(INITIAL_POLL_MS).map(|delay| delay.min(MAX_POLL_DELAY));
        loop {
            match file.try_lock() {
                Ok(()) => {
                    trace!(
                        "Acquired store lock {} after {:.3}s",
                        self.lock_path.display(),
                        started.elapsed().as_secs_f64()
                    );
                    return Ok(file);
                }
                Err(TryLockError::WouldBlock) => {
                    let elapsed = started.elapsed();
                    if elapsed >= self.timeout {
                        return Err(HilockError::StoreUnavailable(format!(
                            "Timed out after {:.3}s waiting for store lock {}",
                            elapsed.as_secs_f64(),
                            self.lock_path.display()
                        )));
                    }
                    let delay = delays.next().unwrap_or(MAX_POLL_DELAY);
                    thread::sleep(delay.min(self.timeout - elapsed));
                }
                Err(TryLockError::Error(err)) if err.kind() == io::ErrorKind::Interrupted => {
                    continue;
                }
                Err(TryLockError::Error(err)) => {
                    return Err(HilockError::StoreUnavailable(format!(
                        "Failed to lock {}: {err}",
                        self.lock_path.display()
                    )));
                }
            }
        }
    }

    fn load(&self) -> Result<Keyspace> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Keyspace::default()),
            Err(err) => {
                return Err(HilockError::StoreUnavailable(format!(
                    "Failed to read store {}: {err}",
                    self.path.display()
                )));
            }
        };
        if contents.trim().is_empty() {
            return Ok(Keyspace::default());
        }
        serde_json::from_str(&contents).map_err(|err| {
            HilockError::CorruptStore(format!("{}: {err}", self.path.display()))
        })
    }

    fn save(&self, keyspace: &Keyspace) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut staged = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut staged, keyspace)?;
        staged.write_all(b"\n")?;
        staged.flush()?;
        staged
            .persist(&self.path)
            .map_err(|err| HilockError::Io(err.error))?;
        debug!("Saved store document {}", self.path.display());
        Ok(())
    }
}

impl CoordinationStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.transact(|keyspace, now| (keyspace.get(key, now), false))
    }

    fn create_if_absent(&self, key: &str, value: &str) -> Result<bool> {
        self.transact(|keyspace, now| {
            let created = keyspace.create_if_absent(key, value, now);
            (created, created)
        })
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        self.transact(|keyspace, now| ((), keyspace.expire(key, ttl, now)))
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.transact(|keyspace, _| ((), keyspace.delete(key)))
    }

    fn set_add(&self, key: &str, member: &str) -> Result<()> {
        self.transact(|keyspace, _| ((), keyspace.set_add(key, member)))
    }

    fn set_remove(&self, key: &str, member: &str) -> Result<()> {
        self.transact(|keyspace, _| ((), keyspace.set_remove(key, member)))
    }

    fn set_members(&self, key: &str) -> Result<Vec<String>> {
        self.transact(|keyspace, _| (keyspace.set_members(key), false))
    }
}
