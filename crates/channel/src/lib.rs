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

//! Method channel bindings for the privacy guard engine
//!
//! Inbound calls arrive as [`MethodCall`]s addressed to a channel name and
//! are dispatched by the [`ChannelRouter`]. Outbound capture events leave
//! through a [`ChannelEventSink`] as fire-and-forget [`OutboundMessage`]s.

pub mod events;
pub mod handler;
pub mod messages;
pub mod router;

pub use events::ChannelEventSink;
pub use handler::{MethodHandler, PrivacyGuardHandler, SecureFlagHandler, SecurityHandler};
pub use messages::*;
pub use router::ChannelRouter;

use privacy_guard_core::GuardConfig;
use privacy_guard_engine::{EngineError, GuardHandle, GuardService};
use privacy_guard_platform::{EnvironmentProbe, Platform, PlatformError, SecureWindow};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

/// Channel error types
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("{message}")]
    InvalidArgs { message: String },

    #[error("Method not implemented: {0}")]
    NotImplemented(String),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ChannelError {
    pub fn invalid_args(message: impl Into<String>) -> Self {
        ChannelError::InvalidArgs { message: message.into() }
    }

    /// Error code reported back to the caller
    pub fn code(&self) -> &'static str {
        match self {
            ChannelError::InvalidArgs { .. } => "INVALID_ARGS",
            ChannelError::NotImplemented(_) => "NOT_IMPLEMENTED",
            ChannelError::Engine(_) => "ENGINE_UNAVAILABLE",
            ChannelError::Platform(_) => "PLATFORM_ERROR",
            ChannelError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, ChannelError::NotImplemented(_))
    }

    pub fn to_reply(&self) -> ErrorReply {
        ErrorReply {
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }
}

pub type ChannelResult<T> = Result<T, ChannelError>;

/// A running guard with its channels wired up
pub struct Plugin {
    pub router: ChannelRouter,
    pub events: mpsc::UnboundedReceiver<OutboundMessage>,
    pub guard: GuardHandle,
}

/// Start the engine on `platform` and register all three channels
pub fn register_plugin<P>(platform: Arc<P>, config: GuardConfig) -> ChannelResult<Plugin>
where
    P: Platform + SecureWindow + EnvironmentProbe + 'static,
{
    let (sink, events) = ChannelEventSink::new(GUARD_CHANNEL);
    let guard = GuardService::spawn(platform.clone(), config, Box::new(sink))?;

    let mut router = ChannelRouter::new();
    router.register(Arc::new(PrivacyGuardHandler::new(guard.clone())));
    router.register(Arc::new(SecureFlagHandler::new(platform.clone())));
    router.register(Arc::new(SecurityHandler::new(platform)));

    info!("Registered channels: {}", router.channels().join(", "));
    Ok(Plugin { router, events, guard })
}
