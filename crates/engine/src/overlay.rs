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

//! Protection overlay management
//!
//! The controller owns at most one overlay view. `show` and `hide` are
//! idempotent, and `hide` also sweeps the window for any view carrying the
//! overlay marker so a lost handle can never leave content covered forever or
//! let a second overlay pile up.

use crate::EngineResult;
use privacy_guard_core::{OverlayStyle, ViewId, ViewSpec, WindowId};
use privacy_guard_platform::{PlatformError, WindowHost};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The currently attached overlay view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayHandle {
    pub window: WindowId,
    pub view: ViewId,
}

/// Attaches and detaches the opaque protection view
pub struct OverlayController<H> {
    host: Arc<H>,
    spec: ViewSpec,
    handle: Option<OverlayHandle>,
    last_window: Option<WindowId>,
}

impl<H: WindowHost> OverlayController<H> {
    pub fn new(host: Arc<H>, style: &OverlayStyle) -> Self {
        OverlayController {
            host,
            spec: ViewSpec::from(style),
            handle: None,
            last_window: None,
        }
    }

    /// Cover the key window. Returns true if a view was attached by this call.
    pub fn show(&mut self) -> EngineResult<bool> {
        if let Some(handle) = self.handle {
            if self.host.is_attached(handle.view) {
                return Ok(false);
            }
            warn!("Overlay view {:?} was detached externally, re-attaching", handle.view);
            self.handle = None;
        }

        let window = self.host.key_window().ok_or(PlatformError::NoWindow)?;

        // A marked view left behind by a lost handle would become a duplicate.
        let strays = self.sweep(window);
        if strays > 0 {
            debug!("Removed {} stray overlay view(s) before attaching", strays);
        }

        let view = self.host.attach_view(window, &self.spec)?;
        self.handle = Some(OverlayHandle { window, view });
        self.last_window = Some(window);
        info!("Protection overlay shown");
        Ok(true)
    }

    /// Uncover the window. Returns true if any view was removed.
    pub fn hide(&mut self) -> bool {
        let mut removed = false;
        if let Some(handle) = self.handle.take() {
            removed |= self.host.remove_view(handle.view);
        }

        let key = self.host.key_window();
        if let Some(window) = self.last_window {
            removed |= self.sweep(window) > 0;
        }
        if let Some(window) = key.filter(|w| Some(*w) != self.last_window) {
            removed |= self.sweep(window) > 0;
        }

        if removed {
            info!("Protection overlay hidden");
        }
        removed
    }

    /// True while our view is attached to a window
    pub fn is_shown(&self) -> bool {
        self.handle.map(|h| self.host.is_attached(h.view)).unwrap_or(false)
    }

    pub fn handle(&self) -> Option<OverlayHandle> {
        self.handle
    }

    fn sweep(&self, window: WindowId) -> usize {
        self.host
            .subviews(window)
            .into_iter()
            .filter(|(_, marker)| *marker == self.spec.marker)
            .filter(|(view, _)| self.host.remove_view(*view))
            .count()
    }
}
