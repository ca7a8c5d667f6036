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

//! In-memory platform backend
//!
//! Mirrors the observable behaviour of a mobile host: a capture flag that can
//! flip at any time, notification observers keyed by kind, a window tree with
//! a key window, plus the secure flag and environment queries. Every API can be
//! marked unavailable to model older OS versions.

use crate::*;
use dashmap::{DashMap, DashSet};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug, Default)]
struct WindowTree {
    key: Option<WindowId>,
    children: HashMap<WindowId, Vec<(ViewId, ViewMarker)>>,
}

/// Simulated mobile platform
pub struct SimulatedPlatform {
    captured: AtomicBool,
    capture_api: AtomicBool,
    capture_query_fails: AtomicBool,
    listeners: DashMap<SubscriptionId, (SignalKind, SignalListener)>,
    unavailable: DashSet<SignalKind>,
    next_id: AtomicU64,
    tree: Mutex<WindowTree>,
    secure: AtomicBool,
    developer_mode: AtomicBool,
    displays: AtomicUsize,
    environment_query_fails: AtomicBool,
}

impl SimulatedPlatform {
    /// Platform with a single key window
    pub fn new() -> Self {
        let platform = Self::headless();
        platform.open_window(true);
        platform
    }

    /// Platform without any window
    pub fn headless() -> Self {
        SimulatedPlatform {
            captured: AtomicBool::new(false),
            capture_api: AtomicBool::new(true),
            capture_query_fails: AtomicBool::new(false),
            listeners: DashMap::new(),
            unavailable: DashSet::new(),
            next_id: AtomicU64::new(1),
            tree: Mutex::new(WindowTree::default()),
            secure: AtomicBool::new(false),
            developer_mode: AtomicBool::new(false),
            displays: AtomicUsize::new(1),
            environment_query_fails: AtomicBool::new(false),
        }
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn tree(&self) -> MutexGuard<'_, WindowTree> {
        self.tree.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // Capture flag

    /// Flip the capture flag without notifying observers
    pub fn set_captured(&self, captured: bool) {
        self.captured.store(captured, Ordering::SeqCst);
    }

    /// Start recording or mirroring and post the change notification
    pub fn start_capture(&self) -> usize {
        self.set_captured(true);
        self.emit(SignalKind::CaptureChanged)
    }

    /// Stop recording or mirroring and post the change notification
    pub fn stop_capture(&self) -> usize {
        self.set_captured(false);
        self.emit(SignalKind::CaptureChanged)
    }

    pub fn set_capture_api_available(&self, available: bool) {
        self.capture_api.store(available, Ordering::SeqCst);
    }

    /// Make every capture query fail until reset
    pub fn set_capture_query_fails(&self, fails: bool) {
        self.capture_query_fails.store(fails, Ordering::SeqCst);
    }

    // Notifications

    pub fn take_screenshot(&self) -> usize {
        self.emit(SignalKind::ScreenshotTaken)
    }

    pub fn resign_active(&self) -> usize {
        self.emit(SignalKind::WillResignActive)
    }

    pub fn become_active(&self) -> usize {
        self.emit(SignalKind::DidBecomeActive)
    }

    /// Deliver a notification of `kind` to every registered observer and
    /// return how many received it
    pub fn emit(&self, kind: SignalKind) -> usize {
        // Listeners are collected first so a callback may unsubscribe.
        let targets: Vec<SignalListener> = self
            .listeners
            .iter()
            .filter(|entry| entry.value().0 == kind)
            .map(|entry| entry.value().1.clone())
            .collect();

        debug!("Simulated {} delivered to {} listener(s)", kind, targets.len());
        let signal = Signal::now(kind);
        for listener in &targets {
            listener(signal);
        }
        targets.len()
    }

    /// Model an OS version that lacks the notification
    pub fn set_signal_available(&self, kind: SignalKind, available: bool) {
        if available {
            self.unavailable.remove(&kind);
        } else {
            self.unavailable.insert(kind);
        }
    }

    pub fn listener_count(&self, kind: SignalKind) -> usize {
        self.listeners.iter().filter(|entry| entry.value().0 == kind).count()
    }

    pub fn total_listeners(&self) -> usize {
        self.listeners.len()
    }

    // Window tree

    /// Open a new window, optionally making it the key window
    pub fn open_window(&self, make_key: bool) -> WindowId {
        let id = WindowId(self.next_id());
        let mut tree = self.tree();
        tree.children.insert(id, Vec::new());
        if make_key {
            tree.key = Some(id);
        }
        id
    }

    /// Destroy a window together with its views
    pub fn close_window(&self, window: WindowId) {
        let mut tree = self.tree();
        tree.children.remove(&window);
        if tree.key == Some(window) {
            tree.key = None;
        }
    }

    pub fn set_key_window(&self, window: Option<WindowId>) {
        self.tree().key = window;
    }

    /// Add an unrelated view, as the rest of the application would
    pub fn add_view(&self, window: WindowId, marker: ViewMarker) -> Option<ViewId> {
        let id = ViewId(self.next_id());
        let mut tree = self.tree();
        let children = tree.children.get_mut(&window)?;
        children.push((id, marker));
        Some(id)
    }

    /// Number of attached views carrying `marker`, across all windows
    pub fn views_with_marker(&self, marker: ViewMarker) -> usize {
        self.tree()
            .children
            .values()
            .flat_map(|children| children.iter())
            .filter(|(_, m)| *m == marker)
            .count()
    }

    pub fn view_count(&self, window: WindowId) -> usize {
        self.tree().children.get(&window).map(Vec::len).unwrap_or(0)
    }

    // Auxiliary queries

    pub fn set_developer_mode(&self, enabled: bool) {
        self.developer_mode.store(enabled, Ordering::SeqCst);
    }

    pub fn set_display_count(&self, count: usize) {
        self.displays.store(count, Ordering::SeqCst);
    }

    pub fn set_environment_query_fails(&self, fails: bool) {
        self.environment_query_fails.store(fails, Ordering::SeqCst);
    }
}

impl Default for SimulatedPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureProbe for SimulatedPlatform {
    fn is_captured(&self) -> PlatformResult<bool> {
        if !self.capture_api.load(Ordering::SeqCst) {
            return Err(PlatformError::Unsupported("screen capture flag".to_string()));
        }
        if self.capture_query_fails.load(Ordering::SeqCst) {
            return Err(PlatformError::QueryFailed("screen capture flag".to_string()));
        }
        Ok(self.captured.load(Ordering::SeqCst))
    }
}

impl SignalSource for SimulatedPlatform {
    fn subscribe(&self, kind: SignalKind, listener: SignalListener) -> PlatformResult<SubscriptionId> {
        if self.unavailable.contains(&kind) {
            return Err(PlatformError::Unsupported(format!("{} notification", kind)));
        }
        let id = SubscriptionId(self.next_id());
        self.listeners.insert(id, (kind, listener));
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.remove(&id).is_some()
    }
}

impl WindowHost for SimulatedPlatform {
    fn key_window(&self) -> Option<WindowId> {
        self.tree().key
    }

    fn attach_view(&self, window: WindowId, spec: &ViewSpec) -> PlatformResult<ViewId> {
        let id = ViewId(self.next_id());
        let mut tree = self.tree();
        let children = tree.children.get_mut(&window).ok_or(PlatformError::WindowGone(window))?;
        children.push((id, spec.marker));
        Ok(id)
    }

    fn remove_view(&self, view: ViewId) -> bool {
        let mut tree = self.tree();
        for children in tree.children.values_mut() {
            if let Some(index) = children.iter().position(|(id, _)| *id == view) {
                children.remove(index);
                return true;
            }
        }
        false
    }

    fn is_attached(&self, view: ViewId) -> bool {
        self.tree()
            .children
            .values()
            .any(|children| children.iter().any(|(id, _)| *id == view))
    }

    fn subviews(&self, window: WindowId) -> Vec<(ViewId, ViewMarker)> {
        self.tree().children.get(&window).cloned().unwrap_or_default()
    }
}

impl SecureWindow for SimulatedPlatform {
    fn set_secure(&self, enabled: bool) -> PlatformResult<()> {
        if self.key_window().is_none() {
            return Err(PlatformError::NoWindow);
        }
        self.secure.store(enabled, Ordering::SeqCst);
        Ok(())
    }

    fn is_secure(&self) -> bool {
        self.secure.load(Ordering::SeqCst)
    }
}

impl EnvironmentProbe for SimulatedPlatform {
    fn developer_mode_enabled(&self) -> PlatformResult<bool> {
        if self.environment_query_fails.load(Ordering::SeqCst) {
            return Err(PlatformError::QueryFailed("developer settings".to_string()));
        }
        Ok(self.developer_mode.load(Ordering::SeqCst))
    }

    fn display_count(&self) -> PlatformResult<usize> {
        if self.environment_query_fails.load(Ordering::SeqCst) {
            return Err(PlatformError::QueryFailed("display manager".to_string()));
        }
        Ok(self.displays.load(Ordering::SeqCst))
    }
}
