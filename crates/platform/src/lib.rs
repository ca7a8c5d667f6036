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

//! # Privacy Guard Platform
//!
//! Trait seams for everything the protection engine needs from the host
//! operating system: the capture flag, notification sources, the window tree
//! and the auxiliary secure-flag and environment queries. Native backends
//! implement these traits inside the host shell; the `simulated` backend is an
//! in-memory implementation used by tests and the `guard-sim` tool.

use privacy_guard_core::*;
use std::sync::Arc;

pub mod environment;
#[cfg(feature = "simulated")]
pub mod sim;

pub use environment::{EnvironmentProbe, EnvironmentReport};
#[cfg(feature = "simulated")]
pub use sim::SimulatedPlatform;

/// Platform result type
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Platform-specific errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    /// The API does not exist on this platform version
    #[error("Unsupported on this platform: {0}")]
    Unsupported(String),

    #[error("Platform query failed: {0}")]
    QueryFailed(String),

    #[error("No key window available")]
    NoWindow,

    #[error("Window {0:?} no longer exists")]
    WindowGone(WindowId),
}

impl PlatformError {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, PlatformError::Unsupported(_))
    }
}

/// Callback invoked by a signal source on every notification
pub type SignalListener = Arc<dyn Fn(Signal) + Send + Sync>;

/// Handle returned by [`SignalSource::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Point-in-time capture flag (recording or mirroring active)
pub trait CaptureProbe: Send + Sync {
    fn is_captured(&self) -> PlatformResult<bool>;
}

/// Registry of platform notification observers
pub trait SignalSource: Send + Sync {
    /// Register `listener` for `kind`. Fails with [`PlatformError::Unsupported`]
    /// when the notification does not exist on this platform version.
    fn subscribe(&self, kind: SignalKind, listener: SignalListener) -> PlatformResult<SubscriptionId>;

    /// Remove a registration; returns false if it was already gone
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

/// Access to the application's top-level window tree
pub trait WindowHost: Send + Sync {
    /// Current key window, if any
    fn key_window(&self) -> Option<WindowId>;

    /// Add a view as the topmost direct child of `window`
    fn attach_view(&self, window: WindowId, spec: &ViewSpec) -> PlatformResult<ViewId>;

    /// Detach a view from its parent; returns false if it was not attached
    fn remove_view(&self, view: ViewId) -> bool;

    fn is_attached(&self, view: ViewId) -> bool;

    /// Direct children of `window` with their markers
    fn subviews(&self, window: WindowId) -> Vec<(ViewId, ViewMarker)>;
}

/// Secure-window attribute that blanks the window in captures
pub trait SecureWindow: Send + Sync {
    fn set_secure(&self, enabled: bool) -> PlatformResult<()>;
    fn is_secure(&self) -> bool;
}

/// Everything the protection engine needs from a platform backend
pub trait Platform: CaptureProbe + SignalSource + WindowHost {}

impl<T: CaptureProbe + SignalSource + WindowHost> Platform for T {}
