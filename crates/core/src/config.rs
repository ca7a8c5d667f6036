// Copyright 2024 Privacy Guard Team
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

//! Engine configuration management

use crate::{GuardError, GuardResult, OverlayStyle};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Delay between a screenshot notification and the follow-up capture check
pub const DEFAULT_RECHECK_DELAY_MS: u64 = 250;

/// Protection engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Screenshot re-check delay in milliseconds
    pub recheck_delay_ms: u64,
    /// Treat a failed capture query as "captured"
    pub fail_closed: bool,
    /// Initial value of the protection gate
    pub start_enabled: bool,
    pub overlay: OverlayStyle,
    /// Log filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        GuardConfig {
            recheck_delay_ms: DEFAULT_RECHECK_DELAY_MS,
            fail_closed: true,
            start_enabled: true,
            overlay: OverlayStyle::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl GuardConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> GuardResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: GuardConfig = serde_json::from_str(&content)?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> GuardResult<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        debug!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> GuardResult<()> {
        if self.recheck_delay_ms == 0 {
            return Err(GuardError::Config("recheck_delay_ms must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.overlay.dim_alpha) {
            return Err(GuardError::Config(format!(
                "overlay.dim_alpha out of range: {}",
                self.overlay.dim_alpha
            )));
        }
        Ok(())
    }

    pub fn recheck_delay(&self) -> Duration {
        Duration::from_millis(self.recheck_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlurStyle, ViewMarker};

    #[test]
    fn test_default_config() {
        let config = GuardConfig::default();
        assert_eq!(config.recheck_delay(), Duration::from_millis(250));
        assert!(config.fail_closed);
        assert!(config.start_enabled);
        assert_eq!(config.overlay.marker, ViewMarker::OVERLAY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: GuardConfig =
            serde_json::from_str(r#"{ "recheck_delay_ms": 400, "overlay": { "blur": "light" } }"#).unwrap();
        assert_eq!(config.recheck_delay_ms, 400);
        assert_eq!(config.overlay.blur, BlurStyle::Light);
        assert_eq!(config.overlay.dim_alpha, 0.95);
        assert!(config.fail_closed);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let config = GuardConfig { recheck_delay_ms: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(GuardError::Config(_))));

        let mut config = GuardConfig::default();
        config.overlay.dim_alpha = 1.5;
        assert!(matches!(config.validate(), Err(GuardError::Config(_))));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("privacy-guard-config-{}.json", std::process::id()));
        let config = GuardConfig { fail_closed: false, ..Default::default() };
        config.save(&path).unwrap();
        let loaded = GuardConfig::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }
}
