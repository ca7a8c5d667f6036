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

//! Per-channel method handlers

use crate::messages::*;
use crate::ChannelError;
use async_trait::async_trait;
use privacy_guard_engine::GuardHandle;
use privacy_guard_platform::environment::{developer_mode, screen_mirroring};
use privacy_guard_platform::{EnvironmentProbe, EnvironmentReport, SecureWindow};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Handles every method of one channel
#[async_trait]
pub trait MethodHandler: Send + Sync {
    /// Channel name this handler answers on
    fn channel(&self) -> &'static str;

    async fn handle(&self, call: MethodCall) -> MethodResponse;
}

/// Capture protection commands on `ios_privacy_guard`
pub struct PrivacyGuardHandler {
    guard: GuardHandle,
}

impl PrivacyGuardHandler {
    pub fn new(guard: GuardHandle) -> Self {
        PrivacyGuardHandler { guard }
    }
}

#[async_trait]
impl MethodHandler for PrivacyGuardHandler {
    fn channel(&self) -> &'static str {
        GUARD_CHANNEL
    }

    async fn handle(&self, call: MethodCall) -> MethodResponse {
        debug!("{} <- {}", GUARD_CHANNEL, call.method);

        match call.method.as_str() {
            "enableProtection" => {
                self.guard.enable_protection().await?;
                Ok(Value::Null)
            }
            "disableProtection" => {
                self.guard.disable_protection().await?;
                Ok(Value::Null)
            }
            "setProtectionEnabled" => {
                let enabled = call
                    .bool_argument("enabled")
                    .ok_or_else(|| ChannelError::invalid_args("Missing enabled parameter"))?;
                self.guard.set_protection_enabled(enabled).await?;
                Ok(Value::Null)
            }
            "isScreenBeingCaptured" => {
                let captured = self.guard.is_screen_being_captured().await?;
                Ok(Value::Bool(captured))
            }
            "getStatus" => {
                let status = self.guard.status().await?;
                Ok(serde_json::to_value(status)?)
            }
            _ => Err(ChannelError::NotImplemented(call.method)),
        }
    }
}

/// Secure-window toggle on `privacy_guard`
pub struct SecureFlagHandler {
    window: Arc<dyn SecureWindow>,
}

impl SecureFlagHandler {
    pub fn new(window: Arc<dyn SecureWindow>) -> Self {
        SecureFlagHandler { window }
    }
}

#[async_trait]
impl MethodHandler for SecureFlagHandler {
    fn channel(&self) -> &'static str {
        SECURE_FLAG_CHANNEL
    }

    async fn handle(&self, call: MethodCall) -> MethodResponse {
        match call.method.as_str() {
            "setSecureFlag" => {
                let enabled = call.bool_argument("enabled").unwrap_or(false);
                self.window.set_secure(enabled)?;
                info!("Secure flag {}", if enabled { "set" } else { "cleared" });
                Ok(Value::Null)
            }
            _ => Err(ChannelError::NotImplemented(call.method)),
        }
    }
}

/// Environment risk queries on `security_channel`
pub struct SecurityHandler {
    probe: Arc<dyn EnvironmentProbe>,
}

impl SecurityHandler {
    pub fn new(probe: Arc<dyn EnvironmentProbe>) -> Self {
        SecurityHandler { probe }
    }

    /// Developer mode or mirroring detected
    pub fn is_high_risk_environment(&self) -> bool {
        EnvironmentReport::assess(self.probe.as_ref()).is_high_risk()
    }
}

#[async_trait]
impl MethodHandler for SecurityHandler {
    fn channel(&self) -> &'static str {
        SECURITY_CHANNEL
    }

    async fn handle(&self, call: MethodCall) -> MethodResponse {
        match call.method.as_str() {
            "isDeveloperModeEnabled" => Ok(Value::Bool(developer_mode(self.probe.as_ref()))),
            "isScreenMirroring" => Ok(Value::Bool(screen_mirroring(self.probe.as_ref()))),
            "isHighRiskEnvironment" => Ok(Value::Bool(self.is_high_risk_environment())),
            _ => Err(ChannelError::NotImplemented(call.method)),
        }
    }
}
