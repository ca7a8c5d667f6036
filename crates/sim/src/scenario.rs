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

//! Replayable scenario files

use anyhow::{Context, Result};
use privacy_guard_platform::SimulatedPlatform;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// A named list of timed steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    pub steps: Vec<Step>,
}

/// One action, run `after_ms` after the previous step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub after_ms: u64,
    #[serde(flatten)]
    pub action: Action,
}

impl Step {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.after_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    // Host commands, sent through the method channel
    Enable,
    Disable,
    SetEnabled { enabled: bool },
    Call {
        channel: String,
        method: String,
        #[serde(default)]
        arguments: Value,
    },

    // Platform events
    StartCapture,
    StopCapture,
    Screenshot,
    ResignActive,
    BecomeActive,
    CaptureQueryFails { fails: bool },
    CloseKeyWindow,
    /// Leave the window open but without key status
    ClearKeyWindow,
    OpenWindow,

    /// No-op, lets pending timers run
    Wait,
}

impl Action {
    pub fn label(&self) -> String {
        match self {
            Action::SetEnabled { enabled } => format!("set_enabled({})", enabled),
            Action::Call { channel, method, .. } => format!("{}.{}", channel, method),
            Action::CaptureQueryFails { fails } => format!("capture_query_fails({})", fails),
            other => serde_json::to_value(other)
                .ok()
                .and_then(|v| v.get("action").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| format!("{:?}", other)),
        }
    }

    /// Apply a platform event; `false` for host commands
    pub fn apply_to(&self, platform: &SimulatedPlatform) -> bool {
        match self {
            Action::StartCapture => {
                platform.start_capture();
            }
            Action::StopCapture => {
                platform.stop_capture();
            }
            Action::Screenshot => {
                platform.take_screenshot();
            }
            Action::ResignActive => {
                platform.resign_active();
            }
            Action::BecomeActive => {
                platform.become_active();
            }
            Action::CaptureQueryFails { fails } => platform.set_capture_query_fails(*fails),
            Action::CloseKeyWindow => {
                if let Some(window) = privacy_guard_platform::WindowHost::key_window(platform) {
                    platform.close_window(window);
                }
            }
            Action::ClearKeyWindow => platform.set_key_window(None),
            Action::OpenWindow => {
                platform.open_window(true);
            }
            Action::Wait => {}
            Action::Enable | Action::Disable | Action::SetEnabled { .. } | Action::Call { .. } => {
                return false;
            }
        }
        true
    }
}

impl Scenario {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        let scenario = serde_json::from_str(&content)
            .with_context(|| format!("parsing scenario {}", path.display()))?;
        Ok(scenario)
    }

    /// Built-in walk through capture, screenshot and background handling
    pub fn demo() -> Self {
        let step = |after_ms, action| Step { after_ms, action };
        Scenario {
            name: "demo".to_string(),
            steps: vec![
                step(0, Action::Enable),
                step(100, Action::StartCapture),
                step(500, Action::StopCapture),
                step(100, Action::Screenshot),
                step(300, Action::Wait),
                step(100, Action::Screenshot),
                step(50, Action::ResignActive),
                step(300, Action::BecomeActive),
                step(100, Action::Disable),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use privacy_guard_core::ViewMarker;
    use serde_json::json;

    #[test]
    fn test_parse_steps() {
        let scenario: Scenario = serde_json::from_value(json!({
            "name": "lift",
            "steps": [
                { "action": "enable" },
                { "after_ms": 50, "action": "screenshot" },
                { "after_ms": 10, "action": "set_enabled", "enabled": false },
                { "action": "call", "channel": "security_channel", "method": "isScreenMirroring" }
            ]
        }))
        .unwrap();

        assert_eq!(scenario.steps.len(), 4);
        assert_eq!(scenario.steps[0].after_ms, 0);
        assert_eq!(scenario.steps[1].delay(), Duration::from_millis(50));
        assert_eq!(scenario.steps[2].action, Action::SetEnabled { enabled: false });
        assert_eq!(scenario.steps[3].action.label(), "security_channel.isScreenMirroring");
    }

    #[test]
    fn test_unknown_action_rejected() {
        let result: serde_json::Result<Scenario> =
            serde_json::from_value(json!({ "steps": [{ "action": "reboot" }] }));
        assert!(result.is_err());
    }

    #[test]
    fn test_bundled_scenarios_load() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios");
        for entry in std::fs::read_dir(dir).unwrap() {
            let scenario = Scenario::load(entry.unwrap().path()).unwrap();
            assert!(!scenario.steps.is_empty());
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(Action::StartCapture.label(), "start_capture");
        assert_eq!(Action::Wait.label(), "wait");
    }

    #[test]
    fn test_platform_actions() {
        let platform = SimulatedPlatform::new();
        assert!(Action::StartCapture.apply_to(&platform));
        assert!(!Action::Enable.apply_to(&platform));
        assert!(Action::CloseKeyWindow.apply_to(&platform));
        assert!(privacy_guard_platform::WindowHost::key_window(&platform).is_none());
    }

    #[test]
    fn test_clear_key_window_keeps_window() {
        let platform = SimulatedPlatform::new();
        let window = privacy_guard_platform::WindowHost::key_window(&platform).unwrap();

        assert!(Action::ClearKeyWindow.apply_to(&platform));
        assert!(privacy_guard_platform::WindowHost::key_window(&platform).is_none());
        assert!(platform.add_view(window, ViewMarker::UNTAGGED).is_some());
    }
}
