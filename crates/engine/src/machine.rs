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

//! Protection state machine
//!
//! | state               | event               | effect                                   |
//! |---------------------|---------------------|------------------------------------------|
//! | Disabled            | enable              | subscribe all, show if already captured  |
//! | Enabled-*           | disable             | unsubscribe all, hide, no event          |
//! | Enabled-Unprotected | capture started     | show, emit `CaptureStarted`              |
//! | Enabled-Protected   | capture stopped     | hide (foreground only), emit `CaptureStopped` |
//! | Enabled-Unprotected | will resign active  | show, no event                           |
//! | Enabled-Protected   | did become active   | hide unless still captured               |
//! | Enabled-*           | screenshot          | show, emit `ScreenshotTaken`, re-check later |
//!
//! The protection state is never stored: it is derived from whether the
//! engine is armed and whether the overlay is attached.

use crate::{
    EngineResult, EventSink, GuardStatus, OverlayController, ProtectionGate, RecheckTicket,
    RecheckTimer, SubscriptionSet, CaptureTracker,
};
use chrono::{DateTime, Utc};
use privacy_guard_core::*;
use privacy_guard_platform::{Platform, SignalListener};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Synchronous protection state machine.
///
/// Every method must be called from the same execution context; the engine
/// does no locking of its own.
pub struct ProtectionEngine<P: Platform> {
    config: GuardConfig,
    gate: ProtectionGate,
    armed: bool,
    app_active: bool,
    tracker: CaptureTracker<P>,
    overlay: OverlayController<P>,
    subscriptions: SubscriptionSet<P>,
    listener: SignalListener,
    events: Box<dyn EventSink>,
    timer: Box<dyn RecheckTimer>,
    pending_recheck: Option<RecheckTicket>,
    next_ticket: u64,
}

impl<P: Platform> ProtectionEngine<P> {
    /// Create a disarmed engine.
    ///
    /// `listener` is what gets registered with the platform for every signal
    /// kind; it must route signals back into [`ProtectionEngine::handle_signal`]
    /// on the engine's context.
    pub fn new(
        platform: Arc<P>,
        config: GuardConfig,
        listener: SignalListener,
        events: Box<dyn EventSink>,
        timer: Box<dyn RecheckTimer>,
    ) -> Self {
        ProtectionEngine {
            gate: ProtectionGate::new(config.start_enabled),
            armed: false,
            app_active: true,
            tracker: CaptureTracker::new(platform.clone(), config.fail_closed),
            overlay: OverlayController::new(platform.clone(), &config.overlay),
            subscriptions: SubscriptionSet::new(platform),
            listener,
            events,
            timer,
            pending_recheck: None,
            next_ticket: 0,
            config,
        }
    }

    // Commands

    /// Arm protection. Ignored while the gate is closed.
    pub fn enable_protection(&mut self) {
        if !self.gate.is_enabled() {
            info!("Protection gate is closed, enable ignored");
            return;
        }

        // Re-arming replaces every existing registration of the same kind.
        if let Err(e) = self.subscriptions.subscribe_all(&self.listener) {
            warn!("Subscribing to platform signals failed: {}", e);
        }
        if !self.armed {
            // Fresh arm assumes the foreground; a re-arm keeps what the
            // lifecycle signals reported.
            self.app_active = true;
        }
        self.armed = true;

        if self.tracker.on_capture_signal() {
            if let Err(e) = self.overlay.show() {
                warn!("Could not show overlay while arming, will retry on next signal: {}", e);
            }
        }

        info!(
            "Privacy protection enabled ({} signal source(s), state {})",
            self.subscriptions.len(),
            self.state()
        );
    }

    /// Disarm protection. The overlay is gone when this returns.
    pub fn disable_protection(&mut self) {
        self.cancel_recheck();
        let removed = self.subscriptions.clear();
        self.overlay.hide();
        self.armed = false;
        info!("Privacy protection disabled ({} subscription(s) removed)", removed);
    }

    /// Set the gate and arm or disarm accordingly
    pub fn set_protection_enabled(&mut self, enabled: bool) {
        self.gate.set_enabled(enabled);
        if enabled {
            self.enable_protection();
        } else {
            self.disable_protection();
        }
    }

    /// Live capture flag, fail-closed
    pub fn is_screen_being_captured(&self) -> bool {
        self.tracker.on_capture_signal()
    }

    // Queries

    pub fn state(&self) -> ProtectionState {
        if !self.armed {
            ProtectionState::Disabled
        } else if self.overlay.is_shown() {
            ProtectionState::EnabledProtected
        } else {
            ProtectionState::EnabledUnprotected
        }
    }

    pub fn gate(&self) -> &ProtectionGate {
        &self.gate
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn status(&self) -> GuardStatus {
        GuardStatus {
            state: self.state(),
            gate_enabled: self.gate.is_enabled(),
            armed: self.armed,
            app_active: self.app_active,
            overlay_visible: self.overlay.is_shown(),
            subscriptions: self.subscriptions.len(),
            capture: self.tracker.state(),
            recheck_pending: self.pending_recheck.is_some(),
        }
    }

    // Signals

    /// Process one platform signal. Handler errors are logged and the
    /// attempted transition is dropped; the next signal restores consistency.
    pub fn handle_signal(&mut self, signal: Signal) {
        if !self.armed {
            debug!("Ignoring {} while disabled", signal.kind);
            return;
        }

        debug!("Handling {} (state {})", signal.kind, self.state());
        let result = match signal.kind {
            SignalKind::CaptureChanged => self.on_capture_changed(signal.at),
            SignalKind::ScreenshotTaken => self.on_screenshot(),
            SignalKind::WillResignActive => self.on_will_resign_active(),
            SignalKind::DidBecomeActive => self.on_did_become_active(),
        };

        if let Err(e) = result {
            warn!("Handling {} failed, will retry on next signal: {}", signal.kind, e);
        }
    }

    /// Deferred screenshot re-check. Superseded or cancelled tickets are no-ops.
    pub fn handle_recheck(&mut self, ticket: RecheckTicket) {
        if self.pending_recheck != Some(ticket) {
            debug!("Ignoring stale re-check {:?}", ticket);
            return;
        }
        self.pending_recheck = None;

        if !self.armed || !self.app_active {
            debug!("Re-check {:?} skipped, app not in foreground or disarmed", ticket);
            return;
        }
        if self.tracker.on_capture_signal() {
            debug!("Re-check {:?}: still captured, keeping overlay", ticket);
            return;
        }
        self.overlay.hide();
    }

    fn on_capture_changed(&mut self, at: DateTime<Utc>) -> EngineResult<()> {
        self.cancel_recheck();

        if self.tracker.handle_capture_changed(at) {
            self.events.emit(OutboundEvent::CaptureStarted);
            if self.gate.is_enabled() {
                self.overlay.show()?;
            }
        } else {
            self.events.emit(OutboundEvent::CaptureStopped);
            if self.app_active {
                self.overlay.hide();
            } else {
                // The app switcher can still snapshot us; foreground hides it.
                debug!("Capture stopped while in background, keeping overlay");
            }
        }
        Ok(())
    }

    fn on_screenshot(&mut self) -> EngineResult<()> {
        if !self.gate.is_enabled() {
            return Ok(());
        }
        info!("Screenshot detected");
        self.events.emit(OutboundEvent::ScreenshotTaken);
        self.overlay.show()?;
        self.schedule_recheck();
        Ok(())
    }

    fn on_will_resign_active(&mut self) -> EngineResult<()> {
        self.app_active = false;
        self.cancel_recheck();
        if self.gate.is_enabled() {
            debug!("App going to background, showing overlay");
            self.overlay.show()?;
        }
        Ok(())
    }

    fn on_did_become_active(&mut self) -> EngineResult<()> {
        self.app_active = true;
        if self.tracker.on_capture_signal() {
            // Still captured: keep (or re-establish) the overlay
            if self.gate.is_enabled() {
                self.overlay.show()?;
            }
        } else {
            self.overlay.hide();
        }
        Ok(())
    }

    fn schedule_recheck(&mut self) {
        self.cancel_recheck();
        self.next_ticket += 1;
        let ticket = RecheckTicket(self.next_ticket);
        self.timer.schedule(ticket, self.config.recheck_delay());
        self.pending_recheck = Some(ticket);
    }

    fn cancel_recheck(&mut self) {
        if let Some(ticket) = self.pending_recheck.take() {
            self.timer.cancel(ticket);
        }
    }
}
