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

//! Channel name to handler dispatch

use crate::handler::MethodHandler;
use crate::messages::{MethodCall, MethodResponse};
use crate::ChannelError;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Routes method calls to the handler registered for their channel
#[derive(Default, Clone)]
pub struct ChannelRouter {
    handlers: HashMap<&'static str, Arc<dyn MethodHandler>>,
}

impl ChannelRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one for the same channel
    pub fn register(&mut self, handler: Arc<dyn MethodHandler>) {
        let channel = handler.channel();
        if self.handlers.insert(channel, handler).is_some() {
            warn!("Replaced handler for channel {}", channel);
        }
    }

    pub fn channels(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub async fn dispatch(&self, channel: &str, call: MethodCall) -> MethodResponse {
        let Some(handler) = self.handlers.get(channel) else {
            debug!("No handler for channel {}", channel);
            return Err(ChannelError::NotImplemented(format!("{}.{}", channel, call.method)));
        };

        let method = call.method.clone();
        let result = handler.handle(call).await;
        if let Err(e) = &result {
            debug!("{}.{} failed: {}", channel, method, e);
        }
        result
    }
}
