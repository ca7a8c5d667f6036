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

//! # Privacy Guard Engine
//!
//! The capture-detection-and-overlay protection engine. Platform signals
//! (capture changes, screenshots, foreground transitions) drive a small state
//! machine that keeps an opaque overlay on the key window whenever content
//! could leak through a recording, a mirror, a screenshot or the app switcher.
//!
//! [`ProtectionEngine`] is the synchronous state machine. [`GuardService`]
//! runs it on a single tokio task and hands out a cloneable [`GuardHandle`]
//! for commands.

pub mod gate;
pub mod machine;
pub mod overlay;
pub mod service;
pub mod subscriptions;
pub mod timer;
pub mod tracker;

pub use gate::ProtectionGate;
pub use machine::ProtectionEngine;
pub use overlay::{OverlayController, OverlayHandle};
pub use service::{GuardHandle, GuardService};
pub use subscriptions::SubscriptionSet;
pub use timer::{RecheckTicket, RecheckTimer, TokioRecheckTimer};
pub use tracker::CaptureTracker;

use privacy_guard_core::*;
use privacy_guard_platform::PlatformError;
use serde::Serialize;

/// Engine result type
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine errors
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Configuration error: {0}")]
    Config(#[from] GuardError),

    #[error("Protection service is not running")]
    ServiceStopped,
}

/// Receiver of outbound events (capture started/stopped, screenshot taken)
pub trait EventSink: Send {
    fn emit(&self, event: OutboundEvent);
}

impl<F> EventSink for F
where
    F: Fn(OutboundEvent) + Send,
{
    fn emit(&self, event: OutboundEvent) {
        self(event)
    }
}

/// Snapshot of the engine for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuardStatus {
    pub state: ProtectionState,
    pub gate_enabled: bool,
    pub armed: bool,
    pub app_active: bool,
    pub overlay_visible: bool,
    pub subscriptions: usize,
    pub capture: CaptureState,
    pub recheck_pending: bool,
}
