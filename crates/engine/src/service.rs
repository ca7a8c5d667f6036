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

//! Single-context runtime for the protection engine
//!
//! Platform callbacks, timer fires and commands are all funnelled through one
//! unbounded mailbox and processed in arrival order by a single tokio task,
//! so the engine never runs concurrently with itself.

use crate::{
    EngineError, EngineResult, EventSink, GuardStatus, ProtectionEngine, RecheckTicket,
    TokioRecheckTimer,
};
use privacy_guard_core::*;
use privacy_guard_platform::{Platform, SignalListener};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

enum EngineMessage {
    Signal(Signal),
    Recheck(RecheckTicket),
    Command(Command),
}

enum Command {
    Enable(oneshot::Sender<ProtectionState>),
    Disable(oneshot::Sender<ProtectionState>),
    SetEnabled(bool, oneshot::Sender<ProtectionState>),
    IsCaptured(oneshot::Sender<bool>),
    Status(oneshot::Sender<GuardStatus>),
    Shutdown(oneshot::Sender<()>),
}

/// Spawns the engine task
pub struct GuardService;

impl GuardService {
    /// Start the engine on the current tokio runtime. The engine starts
    /// disarmed; the task ends when every [`GuardHandle`] is dropped or
    /// [`GuardHandle::shutdown`] is called.
    pub fn spawn<P: Platform + 'static>(
        platform: Arc<P>,
        config: GuardConfig,
        events: Box<dyn EventSink>,
    ) -> EngineResult<GuardHandle> {
        config.validate()?;

        let (tx, rx) = mpsc::unbounded_channel();

        // Weak senders so platform registrations don't keep the task alive.
        let mailbox = tx.downgrade();
        let listener: SignalListener = Arc::new(move |signal: Signal| {
            if let Some(tx) = mailbox.upgrade() {
                let _ = tx.send(EngineMessage::Signal(signal));
            }
        });

        let mailbox = tx.downgrade();
        let timer = TokioRecheckTimer::new(Arc::new(move |ticket: RecheckTicket| {
            if let Some(tx) = mailbox.upgrade() {
                let _ = tx.send(EngineMessage::Recheck(ticket));
            }
        }));

        let engine = ProtectionEngine::new(platform, config, listener, events, Box::new(timer));
        tokio::spawn(run(engine, rx));

        Ok(GuardHandle { tx })
    }
}

async fn run<P: Platform + 'static>(
    mut engine: ProtectionEngine<P>,
    mut rx: mpsc::UnboundedReceiver<EngineMessage>,
) {
    info!("Protection service started");

    while let Some(message) = rx.recv().await {
        match message {
            EngineMessage::Signal(signal) => engine.handle_signal(signal),
            EngineMessage::Recheck(ticket) => engine.handle_recheck(ticket),
            EngineMessage::Command(Command::Shutdown(reply)) => {
                engine.disable_protection();
                let _ = reply.send(());
                info!("Protection service stopped");
                return;
            }
            EngineMessage::Command(command) => handle_command(&mut engine, command),
        }
    }

    debug!("All handles dropped, disarming");
    if engine.state().is_enabled() {
        engine.disable_protection();
    }
    info!("Protection service stopped");
}

fn handle_command<P: Platform>(engine: &mut ProtectionEngine<P>, command: Command) {
    match command {
        Command::Enable(reply) => {
            engine.enable_protection();
            let _ = reply.send(engine.state());
        }
        Command::Disable(reply) => {
            engine.disable_protection();
            let _ = reply.send(engine.state());
        }
        Command::SetEnabled(enabled, reply) => {
            engine.set_protection_enabled(enabled);
            let _ = reply.send(engine.state());
        }
        Command::IsCaptured(reply) => {
            let _ = reply.send(engine.is_screen_being_captured());
        }
        Command::Status(reply) => {
            let _ = reply.send(engine.status());
        }
        Command::Shutdown(reply) => {
            let _ = reply.send(());
        }
    }
}

/// Cloneable command handle for a running [`GuardService`]
#[derive(Clone)]
pub struct GuardHandle {
    tx: mpsc::UnboundedSender<EngineMessage>,
}

impl GuardHandle {
    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> EngineResult<T> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(EngineMessage::Command(make(reply)))
            .map_err(|_| EngineError::ServiceStopped)?;
        response.await.map_err(|_| EngineError::ServiceStopped)
    }

    /// Arm protection; returns the resulting state
    pub async fn enable_protection(&self) -> EngineResult<ProtectionState> {
        self.request(Command::Enable).await
    }

    /// Disarm protection; the overlay is hidden before this resolves
    pub async fn disable_protection(&self) -> EngineResult<ProtectionState> {
        self.request(Command::Disable).await
    }

    pub async fn set_protection_enabled(&self, enabled: bool) -> EngineResult<ProtectionState> {
        self.request(|reply| Command::SetEnabled(enabled, reply)).await
    }

    pub async fn is_screen_being_captured(&self) -> EngineResult<bool> {
        self.request(Command::IsCaptured).await
    }

    pub async fn status(&self) -> EngineResult<GuardStatus> {
        self.request(Command::Status).await
    }

    pub async fn state(&self) -> EngineResult<ProtectionState> {
        Ok(self.status().await?.state)
    }

    /// Disarm and stop the engine task
    pub async fn shutdown(&self) -> EngineResult<()> {
        self.request(Command::Shutdown).await
    }

    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }
}
