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

//! Capture state tracking

use chrono::{DateTime, Utc};
use privacy_guard_core::CaptureState;
use privacy_guard_platform::CaptureProbe;
use std::sync::Arc;
use tracing::{debug, warn};

/// Reads the platform capture flag and remembers the last value delivered by
/// a capture-changed signal
pub struct CaptureTracker<P> {
    probe: Arc<P>,
    state: CaptureState,
    fail_closed: bool,
}

impl<P: CaptureProbe> CaptureTracker<P> {
    pub fn new(probe: Arc<P>, fail_closed: bool) -> Self {
        CaptureTracker {
            probe,
            state: CaptureState::default(),
            fail_closed,
        }
    }

    /// Query the platform flag right now; never touches the tracked state
    pub fn on_capture_signal(&self) -> bool {
        self.query()
    }

    /// Re-read the flag after a capture-changed signal and record it
    pub fn handle_capture_changed(&mut self, at: DateTime<Utc>) -> bool {
        let captured = self.query();
        if captured != self.state.is_captured || self.state.last_changed_at.is_none() {
            self.state.last_changed_at = Some(at);
        }
        self.state.is_captured = captured;
        debug!("Screen capture state changed: {}", captured);
        captured
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    fn query(&self) -> bool {
        match self.probe.is_captured() {
            Ok(captured) => captured,
            // The API is missing on this OS version, so the flag can never be set.
            Err(e) if e.is_unsupported() => {
                debug!("Capture query unavailable: {}", e);
                false
            }
            Err(e) => {
                warn!("Capture query failed, assuming captured={}: {}", self.fail_closed, e);
                self.fail_closed
            }
        }
    }
}
