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

//! High-risk environment heuristics
//!
//! Simple boolean queries the application combines with capture protection.
//! None of them feed the protection state machine.

use crate::PlatformResult;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Developer-mode and display queries
pub trait EnvironmentProbe: Send + Sync {
    /// ADB or developer settings are switched on
    fn developer_mode_enabled(&self) -> PlatformResult<bool>;

    /// Number of displays currently attached, including mirroring targets
    fn display_count(&self) -> PlatformResult<usize>;
}

/// Result of one environment assessment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentReport {
    pub developer_mode: bool,
    pub screen_mirroring: bool,
}

impl EnvironmentReport {
    /// Query every heuristic; a failing query counts as "not detected"
    pub fn assess(probe: &dyn EnvironmentProbe) -> Self {
        EnvironmentReport {
            developer_mode: developer_mode(probe),
            screen_mirroring: screen_mirroring(probe),
        }
    }

    pub fn is_high_risk(&self) -> bool {
        self.developer_mode || self.screen_mirroring
    }
}

pub fn developer_mode(probe: &dyn EnvironmentProbe) -> bool {
    probe.developer_mode_enabled().unwrap_or_else(|e| {
        warn!("Developer mode query failed: {}", e);
        false
    })
}

/// More than one display means the screen may be mirrored
pub fn screen_mirroring(probe: &dyn EnvironmentProbe) -> bool {
    match probe.display_count() {
        Ok(count) => count > 1,
        Err(e) => {
            warn!("Display query failed: {}", e);
            false
        }
    }
}
