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

//! Outbound event sink

use crate::messages::OutboundMessage;
use privacy_guard_core::OutboundEvent;
use privacy_guard_engine::EventSink;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Forwards engine events to the host as channel invocations
pub struct ChannelEventSink {
    channel: String,
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl ChannelEventSink {
    pub fn new(channel: &str) -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = ChannelEventSink {
            channel: channel.to_string(),
            tx,
        };
        (sink, rx)
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: OutboundEvent) {
        let message = OutboundMessage::event(&self.channel, event);
        trace!("Outbound {}.{}", message.channel, message.method);
        if self.tx.send(message).is_err() {
            debug!("Host receiver gone, dropping {}", event.method_name());
        }
    }
}
