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

//! Drives a guard on the simulated platform through a scenario

use crate::scenario::{Action, Scenario, Step};
use anyhow::{Context, Result};
use privacy_guard_channel::{register_plugin, ErrorReply, MethodCall, Plugin, GUARD_CHANNEL};
use privacy_guard_core::{format_duration, GuardConfig, ViewMarker};
use privacy_guard_engine::GuardStatus;
use privacy_guard_platform::SimulatedPlatform;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// What happened during one step
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub at_ms: u64,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<Result<Value, ErrorReply>>,
    pub events: Vec<String>,
    pub overlays: usize,
    pub status: GuardStatus,
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:>8}] {:<24} state={} overlay={}",
            format_duration(Duration::from_millis(self.at_ms)),
            self.action,
            self.status.state,
            self.overlays
        )?;
        match &self.reply {
            Some(Ok(Value::Null)) | None => {}
            Some(Ok(value)) => write!(f, " reply={}", value)?,
            Some(Err(e)) => write!(f, " error={}({})", e.code, e.message)?,
        }
        if !self.events.is_empty() {
            write!(f, " events=[{}]", self.events.join(", "))?;
        }
        Ok(())
    }
}

pub struct Runner {
    platform: Arc<SimulatedPlatform>,
    plugin: Plugin,
}

impl Runner {
    /// Start a guard on a fresh simulated device; must run inside a tokio runtime
    pub fn start(config: GuardConfig) -> Result<Self> {
        let platform = Arc::new(SimulatedPlatform::new());
        let plugin = register_plugin(platform.clone(), config).context("starting guard")?;
        Ok(Runner { platform, plugin })
    }

    #[cfg(test)]
    pub fn platform(&self) -> &SimulatedPlatform {
        &self.platform
    }

    pub async fn run(&mut self, scenario: &Scenario) -> Result<Vec<StepReport>> {
        info!("Running scenario '{}' ({} steps)", scenario.name, scenario.steps.len());
        let started = Instant::now();
        let mut reports = Vec::with_capacity(scenario.steps.len());

        for step in &scenario.steps {
            tokio::time::sleep(step.delay()).await;
            reports.push(self.run_step(step, started.elapsed()).await?);
        }

        let state = self.plugin.guard.state().await.context("guard stopped")?;
        info!("Scenario '{}' finished in state {}", scenario.name, state);
        Ok(reports)
    }

    pub async fn run_step(&mut self, step: &Step, at: Duration) -> Result<StepReport> {
        debug!("Step {}", step.action.label());

        let reply = if step.action.apply_to(&self.platform) {
            None
        } else {
            let (channel, call) = host_call(&step.action);
            let reply = self.plugin.router.dispatch(&channel, call).await;
            Some(reply.map_err(|e| e.to_reply()))
        };

        // Round-trip the mailbox so the step's signals are handled
        let status = self.plugin.guard.status().await.context("guard stopped")?;

        let mut events = Vec::new();
        while let Ok(message) = self.plugin.events.try_recv() {
            events.push(message.method);
        }

        Ok(StepReport {
            at_ms: at.as_millis() as u64,
            action: step.action.label(),
            reply,
            events,
            overlays: self.platform.views_with_marker(ViewMarker::OVERLAY),
            status,
        })
    }

    pub async fn shutdown(self) -> Result<()> {
        self.plugin.guard.shutdown().await.context("guard stopped")?;
        Ok(())
    }
}

fn host_call(action: &Action) -> (String, MethodCall) {
    let guard = |method: &str, arguments: Value| {
        (GUARD_CHANNEL.to_string(), MethodCall::with_arguments(method, arguments))
    };
    match action {
        Action::Enable => guard("enableProtection", Value::Null),
        Action::Disable => guard("disableProtection", Value::Null),
        Action::SetEnabled { enabled } => guard("setProtectionEnabled", json!({ "enabled": enabled })),
        Action::Call {
            channel,
            method,
            arguments,
        } => (channel.clone(), MethodCall::with_arguments(method.clone(), arguments.clone())),
        other => guard(&other.label(), Value::Null),
    }
}
