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

//! Deferred screenshot re-check scheduling

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Identifies one scheduled re-check; a newer ticket supersedes older ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecheckTicket(pub u64);

/// Schedules the delayed re-check on behalf of the state machine
pub trait RecheckTimer: Send {
    /// Arrange for `ticket` to be delivered back to the engine after `delay`
    fn schedule(&mut self, ticket: RecheckTicket, delay: Duration);

    /// Best-effort cancellation; a ticket that fires anyway must be ignored
    /// by the engine
    fn cancel(&mut self, ticket: RecheckTicket);
}

/// Callback delivering a due ticket
pub type RecheckCallback = Arc<dyn Fn(RecheckTicket) + Send + Sync>;

/// Timer backed by `tokio::time::sleep` tasks
pub struct TokioRecheckTimer {
    fire: RecheckCallback,
    pending: HashMap<RecheckTicket, JoinHandle<()>>,
}

impl TokioRecheckTimer {
    pub fn new(fire: RecheckCallback) -> Self {
        TokioRecheckTimer {
            fire,
            pending: HashMap::new(),
        }
    }

    /// Number of sleep tasks that have not completed yet
    pub fn pending(&self) -> usize {
        self.pending.values().filter(|task| !task.is_finished()).count()
    }
}

impl RecheckTimer for TokioRecheckTimer {
    fn schedule(&mut self, ticket: RecheckTicket, delay: Duration) {
        self.pending.retain(|_, task| !task.is_finished());

        let fire = self.fire.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fire(ticket);
        });
        debug!("Scheduled re-check {:?} in {:?}", ticket, delay);
        self.pending.insert(ticket, task);
    }

    fn cancel(&mut self, ticket: RecheckTicket) {
        if let Some(task) = self.pending.remove(&ticket) {
            task.abort();
            debug!("Cancelled re-check {:?}", ticket);
        }
    }
}

impl Drop for TokioRecheckTimer {
    fn drop(&mut self) {
        for (_, task) in self.pending.drain() {
            task.abort();
        }
    }
}
