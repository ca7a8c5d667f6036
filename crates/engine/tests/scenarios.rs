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

//! End-to-end protection scenarios against the simulated platform

use privacy_guard_core::*;
use privacy_guard_engine::*;
use privacy_guard_platform::SimulatedPlatform;
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct Fixture {
    platform: Arc<SimulatedPlatform>,
    guard: GuardHandle,
    events: Arc<Mutex<Vec<OutboundEvent>>>,
}

impl Fixture {
    fn start() -> Self {
        Self::start_with(SimulatedPlatform::new(), GuardConfig::default())
    }

    fn start_with(platform: SimulatedPlatform, config: GuardConfig) -> Self {
        let platform = Arc::new(platform);
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let guard = GuardService::spawn(
            platform.clone(),
            config,
            Box::new(move |event: OutboundEvent| sink.lock().unwrap().push(event)),
        )
        .unwrap();
        Fixture { platform, guard, events }
    }

    fn events(&self) -> Vec<OutboundEvent> {
        self.events.lock().unwrap().clone()
    }

    fn overlays(&self) -> usize {
        self.platform.views_with_marker(ViewMarker::OVERLAY)
    }

    /// Round-trip through the mailbox so every queued signal is processed
    async fn settle(&self) -> GuardStatus {
        self.guard.status().await.unwrap()
    }
}

#[tokio::test]
async fn test_repeated_enable_keeps_single_subscriptions() {
    let f = Fixture::start();

    f.guard.enable_protection().await.unwrap();
    f.guard.enable_protection().await.unwrap();
    f.guard.disable_protection().await.unwrap();
    assert_eq!(f.platform.total_listeners(), 0);
    f.guard.enable_protection().await.unwrap();
    f.guard.set_protection_enabled(true).await.unwrap();

    for kind in SignalKind::ALL {
        assert_eq!(f.platform.listener_count(kind), 1, "{} registered more than once", kind);
    }
    assert_eq!(f.settle().await.subscriptions, 4);

    // One physical event, one delivery
    assert_eq!(f.platform.take_screenshot(), 1);
    f.settle().await;
    assert_eq!(f.events(), vec![OutboundEvent::ScreenshotTaken]);
}

#[tokio::test]
async fn test_scenario_a_capture_started() {
    let f = Fixture::start();
    assert_eq!(f.guard.enable_protection().await.unwrap(), ProtectionState::EnabledUnprotected);

    f.platform.start_capture();
    let status = f.settle().await;

    assert_eq!(status.state, ProtectionState::EnabledProtected);
    assert!(status.capture.is_captured);
    assert_eq!(f.overlays(), 1);
    assert_eq!(f.events(), vec![OutboundEvent::CaptureStarted]);
    assert!(f.guard.is_screen_being_captured().await.unwrap());
}

#[tokio::test]
async fn test_scenario_b_background_without_event() {
    let f = Fixture::start();
    f.guard.enable_protection().await.unwrap();

    f.platform.resign_active();
    let status = f.settle().await;

    assert_eq!(status.state, ProtectionState::EnabledProtected);
    assert!(!status.app_active);
    assert_eq!(f.overlays(), 1);
    assert!(f.events().is_empty());
}

#[tokio::test]
async fn test_scenario_c_foreground_clears_background_overlay() {
    let f = Fixture::start();
    f.guard.enable_protection().await.unwrap();
    f.platform.resign_active();
    f.settle().await;

    f.platform.become_active();
    let status = f.settle().await;

    assert_eq!(status.state, ProtectionState::EnabledUnprotected);
    assert_eq!(f.overlays(), 0);
    assert!(f.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_scenario_d_screenshot_overlay_lifts_after_delay() {
    let f = Fixture::start();
    f.guard.enable_protection().await.unwrap();

    f.platform.take_screenshot();
    let status = f.settle().await;
    assert_eq!(status.state, ProtectionState::EnabledProtected);
    assert!(status.recheck_pending);
    assert_eq!(f.events(), vec![OutboundEvent::ScreenshotTaken]);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(f.settle().await.state, ProtectionState::EnabledProtected);

    tokio::time::sleep(Duration::from_millis(60)).await;
    let status = f.settle().await;
    assert_eq!(status.state, ProtectionState::EnabledUnprotected);
    assert!(!status.recheck_pending);
    assert_eq!(f.overlays(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_scenario_d_capture_during_delay_keeps_overlay() {
    let f = Fixture::start();
    f.guard.enable_protection().await.unwrap();

    f.platform.take_screenshot();
    f.settle().await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    f.platform.start_capture();
    f.settle().await;

    tokio::time::sleep(Duration::from_millis(300)).await;
    let status = f.settle().await;
    assert_eq!(status.state, ProtectionState::EnabledProtected);
    assert_eq!(f.overlays(), 1);
    assert_eq!(f.events(), vec![OutboundEvent::ScreenshotTaken, OutboundEvent::CaptureStarted]);
}

#[tokio::test(start_paused = true)]
async fn test_screenshot_then_background_keeps_overlay() {
    let f = Fixture::start();
    f.guard.enable_protection().await.unwrap();

    f.platform.take_screenshot();
    f.settle().await;
    f.platform.resign_active();
    f.settle().await;

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(f.settle().await.state, ProtectionState::EnabledProtected);
}

#[tokio::test(start_paused = true)]
async fn test_scenario_e_disable_while_protected() {
    let f = Fixture::start();
    f.guard.enable_protection().await.unwrap();
    f.platform.start_capture();
    f.platform.take_screenshot();
    f.settle().await;
    assert_eq!(f.overlays(), 1);

    let state = f.guard.disable_protection().await.unwrap();
    assert_eq!(state, ProtectionState::Disabled);
    assert_eq!(f.overlays(), 0);
    assert_eq!(f.platform.total_listeners(), 0);

    // Nothing reaches the engine any more, and the old re-check is gone
    assert_eq!(f.platform.resign_active(), 0);
    assert_eq!(f.platform.stop_capture(), 0);
    tokio::time::sleep(Duration::from_millis(500)).await;

    let status = f.settle().await;
    assert_eq!(status.state, ProtectionState::Disabled);
    assert_eq!(f.overlays(), 0);
    assert_eq!(f.events(), vec![OutboundEvent::CaptureStarted, OutboundEvent::ScreenshotTaken]);
}

#[tokio::test]
async fn test_captured_implies_protected_after_each_step() {
    let f = Fixture::start();
    f.guard.enable_protection().await.unwrap();

    let steps: [fn(&SimulatedPlatform) -> usize; 6] = [
        SimulatedPlatform::start_capture,
        SimulatedPlatform::resign_active,
        SimulatedPlatform::become_active,
        SimulatedPlatform::take_screenshot,
        SimulatedPlatform::stop_capture,
        SimulatedPlatform::start_capture,
    ];

    for step in steps {
        step(&f.platform);
        let status = f.settle().await;
        if status.capture.is_captured && status.gate_enabled {
            assert_eq!(status.state, ProtectionState::EnabledProtected);
        }
    }
}

#[tokio::test]
async fn test_gate_closed_ignores_enable_command() {
    let config = GuardConfig { start_enabled: false, ..Default::default() };
    let f = Fixture::start_with(SimulatedPlatform::new(), config);

    assert_eq!(f.guard.enable_protection().await.unwrap(), ProtectionState::Disabled);
    assert_eq!(f.guard.state().await.unwrap(), ProtectionState::Disabled);
    assert_eq!(f.platform.total_listeners(), 0);

    assert_eq!(
        f.guard.set_protection_enabled(true).await.unwrap(),
        ProtectionState::EnabledUnprotected
    );
    assert!(f.settle().await.gate_enabled);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let config = GuardConfig { recheck_delay_ms: 0, ..Default::default() };
    let result = GuardService::spawn(
        Arc::new(SimulatedPlatform::new()),
        config,
        Box::new(|_: OutboundEvent| {}),
    );
    assert!(matches!(result, Err(EngineError::Config(_))));
}

#[tokio::test]
async fn test_shutdown_disarms_and_stops() {
    let f = Fixture::start();
    f.guard.enable_protection().await.unwrap();
    f.platform.resign_active();
    f.settle().await;

    f.guard.shutdown().await.unwrap();
    assert_eq!(f.overlays(), 0);
    assert_eq!(f.platform.total_listeners(), 0);
    assert!(matches!(f.guard.status().await, Err(EngineError::ServiceStopped)));
    assert!(!f.guard.is_running());
}
