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

//! Core types for Privacy Guard

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform notification kinds the engine subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// Screen recording or mirroring started or stopped
    CaptureChanged,
    /// The user took a screenshot
    ScreenshotTaken,
    /// The app is about to leave the foreground
    WillResignActive,
    /// The app returned to the foreground
    DidBecomeActive,
}

impl SignalKind {
    /// Every kind, in subscription order
    pub const ALL: [SignalKind; 4] = [
        SignalKind::CaptureChanged,
        SignalKind::ScreenshotTaken,
        SignalKind::WillResignActive,
        SignalKind::DidBecomeActive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::CaptureChanged => "capture_changed",
            SignalKind::ScreenshotTaken => "screenshot_taken",
            SignalKind::WillResignActive => "will_resign_active",
            SignalKind::DidBecomeActive => "did_become_active",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fire-and-forget platform notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub at: DateTime<Utc>,
}

impl Signal {
    /// Create a signal stamped with the current time
    pub fn now(kind: SignalKind) -> Self {
        Signal { kind, at: Utc::now() }
    }
}

/// Last capture flag observed through a capture-changed signal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureState {
    pub is_captured: bool,
    pub last_changed_at: Option<DateTime<Utc>>,
}

/// Externally observable protection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectionState {
    Disabled,
    EnabledUnprotected,
    EnabledProtected,
}

impl ProtectionState {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, ProtectionState::Disabled)
    }

    pub fn is_protected(&self) -> bool {
        matches!(self, ProtectionState::EnabledProtected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProtectionState::Disabled => "disabled",
            ProtectionState::EnabledUnprotected => "enabled-unprotected",
            ProtectionState::EnabledProtected => "enabled-protected",
        }
    }
}

impl fmt::Display for ProtectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events forwarded to application logic over the command channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutboundEvent {
    CaptureStarted,
    CaptureStopped,
    ScreenshotTaken,
}

impl OutboundEvent {
    /// Method name invoked on the application side
    pub fn method_name(&self) -> &'static str {
        match self {
            OutboundEvent::CaptureStarted => "onScreenCaptureStarted",
            OutboundEvent::CaptureStopped => "onScreenCaptureStopped",
            OutboundEvent::ScreenshotTaken => "onScreenshotTaken",
        }
    }
}

/// Opaque top-level window identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u64);

/// Opaque view identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewId(pub u64);

/// Tag attached to a view so it can be found again in a window's children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewMarker(pub i64);

impl ViewMarker {
    /// Reserved for the protection overlay
    pub const OVERLAY: ViewMarker = ViewMarker(999_999);

    /// Marker of views that carry no tag
    pub const UNTAGGED: ViewMarker = ViewMarker(0);
}

/// Blur applied underneath the dimming layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlurStyle {
    Dark,
    Light,
    None,
}

/// Visual description of the protection overlay
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub marker: ViewMarker,
    pub blur: BlurStyle,
    pub dim_alpha: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        OverlayStyle {
            marker: ViewMarker::OVERLAY,
            blur: BlurStyle::Dark,
            dim_alpha: 0.95,
        }
    }
}

/// View description handed to the window host on attach
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSpec {
    pub marker: ViewMarker,
    pub blur: BlurStyle,
    pub dim_alpha: f32,
    /// Cover the full window bounds and follow resizes
    pub fill_window: bool,
}

impl From<&OverlayStyle> for ViewSpec {
    fn from(style: &OverlayStyle) -> Self {
        ViewSpec {
            marker: style.marker,
            blur: style.blur,
            dim_alpha: style.dim_alpha,
            fill_window: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbound_method_names() {
        assert_eq!(OutboundEvent::CaptureStarted.method_name(), "onScreenCaptureStarted");
        assert_eq!(OutboundEvent::CaptureStopped.method_name(), "onScreenCaptureStopped");
        assert_eq!(OutboundEvent::ScreenshotTaken.method_name(), "onScreenshotTaken");
    }

    #[test]
    fn test_protection_state_predicates() {
        assert!(!ProtectionState::Disabled.is_enabled());
        assert!(ProtectionState::EnabledUnprotected.is_enabled());
        assert!(!ProtectionState::EnabledUnprotected.is_protected());
        assert!(ProtectionState::EnabledProtected.is_protected());
    }

    #[test]
    fn test_signal_kind_serde_names() {
        let json = serde_json::to_string(&SignalKind::WillResignActive).unwrap();
        assert_eq!(json, "\"will_resign_active\"");
        let kind: SignalKind = serde_json::from_str("\"did_become_active\"").unwrap();
        assert_eq!(kind, SignalKind::DidBecomeActive);
    }

    #[test]
    fn test_view_spec_from_default_style() {
        let spec = ViewSpec::from(&OverlayStyle::default());
        assert_eq!(spec.marker, ViewMarker::OVERLAY);
        assert_eq!(spec.blur, BlurStyle::Dark);
        assert!(spec.fill_window);
    }
}
