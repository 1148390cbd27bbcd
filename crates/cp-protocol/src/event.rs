//! Context Protocol event types streamed over SSE.
//!
//! Trimmed from the teacher's ~25-variant AG-UI event set down to the
//! lifecycle events a tool/resource gateway actually needs: a call starts,
//! its arguments are echoed, it ends with a result or an error. There is no
//! chat-message or thinking-step concept in this protocol.

use crate::ids::{RequestId, ToolCallId};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Discriminant used for SSE `event:` framing and JSON `type` tagging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    ToolCallStart,
    ToolCallArgs,
    ToolCallResult,
    ToolCallError,
    RequestFinished,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::ToolCallStart => "TOOL_CALL_START",
            EventType::ToolCallArgs => "TOOL_CALL_ARGS",
            EventType::ToolCallResult => "TOOL_CALL_RESULT",
            EventType::ToolCallError => "TOOL_CALL_ERROR",
            EventType::RequestFinished => "REQUEST_FINISHED",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallStartEvent {
    pub tool_call_id: ToolCallId,
    pub tool_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallArgsEvent {
    pub tool_call_id: ToolCallId,
    pub arguments: JsonValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResultEvent {
    pub tool_call_id: ToolCallId,
    pub result: JsonValue,
    /// True when one or more non-primary integrations were degraded.
    #[serde(default)]
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallErrorEvent {
    pub tool_call_id: ToolCallId,
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFinishedEvent {
    pub request_id: RequestId,
}

/// A single Context Protocol event, as streamed over SSE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "TOOL_CALL_START")]
    ToolCallStart(ToolCallStartEvent),
    #[serde(rename = "TOOL_CALL_ARGS")]
    ToolCallArgs(ToolCallArgsEvent),
    #[serde(rename = "TOOL_CALL_RESULT")]
    ToolCallResult(ToolCallResultEvent),
    #[serde(rename = "TOOL_CALL_ERROR")]
    ToolCallError(ToolCallErrorEvent),
    #[serde(rename = "REQUEST_FINISHED")]
    RequestFinished(RequestFinishedEvent),
}

impl Event {
    pub fn event_type(&self) -> EventType {
        match self {
            Event::ToolCallStart(_) => EventType::ToolCallStart,
            Event::ToolCallArgs(_) => EventType::ToolCallArgs,
            Event::ToolCallResult(_) => EventType::ToolCallResult,
            Event::ToolCallError(_) => EventType::ToolCallError,
            Event::RequestFinished(_) => EventType::RequestFinished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_call_result_serializes_with_type_tag() {
        let event = Event::ToolCallResult(ToolCallResultEvent {
            tool_call_id: ToolCallId::random(),
            result: JsonValue::from(42),
            degraded: false,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "TOOL_CALL_RESULT");
        assert_eq!(json["result"], 42);
    }
}
