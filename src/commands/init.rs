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

use crate::config::HilockConfig;
use crate::error::{HilockError, Result};

pub struct InitCommand<'a> {
    config: &'a HilockConfig,
}

impl<'a> InitCommand<'a> {
    pub fn new(config: &'a HilockConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self, force: bool) -> Result<()> {
        let path = self.config.config_path();
        if path.exists() && !force {
            return Err(HilockError::InvalidConfig(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )));
        }
        self.config.save()?;
        println!("Wrote {}", path.display());
        Ok(())
    }
}
