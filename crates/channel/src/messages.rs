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

//! Wire shapes for method channel traffic

use privacy_guard_core::OutboundEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Capture protection commands and events
pub const GUARD_CHANNEL: &str = "ios_privacy_guard";

/// Secure-window flag toggle
pub const SECURE_FLAG_CHANNEL: &str = "privacy_guard";

/// Environment risk queries
pub const SECURITY_CHANNEL: &str = "security_channel";

/// Inbound method invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>) -> Self {
        MethodCall {
            method: method.into(),
            arguments: Value::Null,
        }
    }

    pub fn with_arguments(method: impl Into<String>, arguments: Value) -> Self {
        MethodCall {
            method: method.into(),
            arguments,
        }
    }

    /// Boolean argument by name; `None` when absent or not a bool
    pub fn bool_argument(&self, name: &str) -> Option<bool> {
        self.arguments.get(name).and_then(Value::as_bool)
    }
}

/// Successful replies carry a JSON value, `null` for commands
pub type MethodResponse = crate::ChannelResult<Value>;

/// Error payload returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub code: String,
    pub message: String,
}

/// Fire-and-forget invocation sent to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub channel: String,
    pub method: String,
    pub arguments: Value,
}

impl OutboundMessage {
    pub fn event(channel: &str, event: OutboundEvent) -> Self {
        OutboundMessage {
            channel: channel.to_string(),
            method: event.method_name().to_string(),
            arguments: Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bool_argument() {
        let call = MethodCall::with_arguments("setProtectionEnabled", json!({ "enabled": true }));
        assert_eq!(call.bool_argument("enabled"), Some(true));

        let call = MethodCall::with_arguments("setProtectionEnabled", json!({ "enabled": "yes" }));
        assert_eq!(call.bool_argument("enabled"), None);

        assert_eq!(MethodCall::new("setProtectionEnabled").bool_argument("enabled"), None);
    }

    #[test]
    fn test_call_without_arguments_parses() {
        let call: MethodCall = serde_json::from_str(r#"{"method":"enableProtection"}"#).unwrap();
        assert_eq!(call, MethodCall::new("enableProtection"));
    }

    #[test]
    fn test_outbound_shape() {
        let msg = OutboundMessage::event(GUARD_CHANNEL, OutboundEvent::ScreenshotTaken);
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "channel": "ios_privacy_guard",
                "method": "onScreenshotTaken",
                "arguments": null,
            })
        );
    }
}
