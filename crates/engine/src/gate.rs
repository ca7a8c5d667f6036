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

//! Protection enable/disable gate

use tracing::info;

/// Process-wide arm switch, changed only through the command channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtectionGate {
    enabled: bool,
}

impl ProtectionGate {
    pub fn new(enabled: bool) -> Self {
        ProtectionGate { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns true if the value changed
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        let changed = self.enabled != enabled;
        if changed {
            info!("Protection gate {}", if enabled { "opened" } else { "closed" });
        }
        self.enabled = enabled;
        changed
    }
}

impl Default for ProtectionGate {
    fn default() -> Self {
        Self::new(true)
    }
}
