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

//! Signal source subscriptions

use crate::EngineResult;
use privacy_guard_core::SignalKind;
use privacy_guard_platform::{SignalListener, SignalSource, SubscriptionId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// At most one live registration per signal kind
pub struct SubscriptionSet<S: SignalSource> {
    source: Arc<S>,
    active: HashMap<SignalKind, SubscriptionId>,
}

impl<S: SignalSource> SubscriptionSet<S> {
    pub fn new(source: Arc<S>) -> Self {
        SubscriptionSet {
            source,
            active: HashMap::new(),
        }
    }

    /// Register `listener` for `kind`, dropping any earlier registration of
    /// the same kind first. A kind the platform lacks is skipped.
    pub fn subscribe(&mut self, kind: SignalKind, listener: SignalListener) -> EngineResult<()> {
        if let Some(previous) = self.active.remove(&kind) {
            self.source.unsubscribe(previous);
            debug!("Replaced existing {} subscription", kind);
        }

        match self.source.subscribe(kind, listener) {
            Ok(id) => {
                self.active.insert(kind, id);
                Ok(())
            }
            Err(e) if e.is_unsupported() => {
                warn!("{} not available, treating it as never fired: {}", kind, e);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Subscribe to every kind; stops at the first hard failure
    pub fn subscribe_all(&mut self, listener: &SignalListener) -> EngineResult<()> {
        for kind in SignalKind::ALL {
            self.subscribe(kind, listener.clone())?;
        }
        Ok(())
    }

    /// Remove every registration and return how many were removed
    pub fn clear(&mut self) -> usize {
        let count = self.active.len();
        for (_, id) in self.active.drain() {
            self.source.unsubscribe(id);
        }
        count
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn contains(&self, kind: SignalKind) -> bool {
        self.active.contains_key(&kind)
    }
}

impl<S: SignalSource> Drop for SubscriptionSet<S> {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use privacy_guard_core::Signal;
    use privacy_guard_platform::SimulatedPlatform;

    fn noop() -> SignalListener {
        Arc::new(|_: Signal| {})
    }

    #[test]
    fn test_resubscribe_keeps_one_per_kind() {
        let platform = Arc::new(SimulatedPlatform::new());
        let mut set = SubscriptionSet::new(platform.clone());
        let listener = noop();

        set.subscribe_all(&listener).unwrap();
        set.subscribe_all(&listener).unwrap();

        assert_eq!(set.len(), 4);
        for kind in SignalKind::ALL {
            assert_eq!(platform.listener_count(kind), 1);
        }
    }

    #[test]
    fn test_clear_and_drop_unsubscribe() {
        let platform = Arc::new(SimulatedPlatform::new());
        let mut set = SubscriptionSet::new(platform.clone());
        set.subscribe_all(&noop()).unwrap();

        assert_eq!(set.clear(), 4);
        assert!(set.is_empty());
        assert_eq!(platform.total_listeners(), 0);

        set.subscribe(SignalKind::ScreenshotTaken, noop()).unwrap();
        drop(set);
        assert_eq!(platform.total_listeners(), 0);
    }

    #[test]
    fn test_missing_kind_is_skipped() {
        let platform = Arc::new(SimulatedPlatform::new());
        platform.set_signal_available(SignalKind::CaptureChanged, false);
        let mut set = SubscriptionSet::new(platform.clone());

        set.subscribe_all(&noop()).unwrap();
        assert_eq!(set.len(), 3);
        assert!(!set.contains(SignalKind::CaptureChanged));
    }
}
