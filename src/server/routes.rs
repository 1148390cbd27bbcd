//! HTTP routes for the Context Protocol transport.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cp_protocol::{Event, RequestId, ToolCallId};
use cp_transport::SseHandler;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::error::ErrorEnvelope;

use super::GatewayState;

/// Liveness: true whenever the process is accepting connections at all.
pub async fn health() -> Json<JsonValue> {
    Json(json!({"status": "ok"}))
}

/// Readiness: 200 only once the tool/resource registries have been
/// populated by server composition.
pub async fn ready(State(state): State<GatewayState>) -> impl IntoResponse {
    if state.health.is_ready() {
        (StatusCode::OK, Json(json!({"status": "ok"})))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"status": "not-ready"})))
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    CallTool { name: String, #[serde(default)] arguments: JsonValue },
    ReadResource { uri: String },
}

/// `POST /cp/messages`: invokes a tool or reads a resource. Tool-call
/// lifecycle events are broadcast to `/cp/events` subscribers alongside the
/// synchronous JSON response returned here.
pub async fn post_messages(State(state): State<GatewayState>, Json(message): Json<ClientMessage>) -> Response {
    match message {
        ClientMessage::CallTool { name, arguments } => call_tool(&state, name, arguments).await,
        ClientMessage::ReadResource { uri } => read_resource(&state, uri).await,
    }
}

async fn call_tool(state: &GatewayState, name: String, arguments: JsonValue) -> Response {
    let tool_call_id = ToolCallId::random();
    state.publish(Event::ToolCallStart(cp_protocol::event::ToolCallStartEvent {
        tool_call_id,
        tool_name: name.clone(),
    }));
    state.publish(Event::ToolCallArgs(cp_protocol::event::ToolCallArgsEvent {
        tool_call_id,
        arguments: arguments.clone(),
    }));

    let result = state.tools.call(&name, arguments).await;
    let request_id = RequestId::random();

    let response = match result {
        Ok(value) => {
            state.publish(Event::ToolCallResult(cp_protocol::event::ToolCallResultEvent {
                tool_call_id,
                result: value.clone(),
                degraded: value.get("degraded").and_then(|v| v.as_bool()).unwrap_or(false),
            }));
            (StatusCode::OK, Json(value)).into_response()
        }
        Err(err) => {
            let envelope: ErrorEnvelope = (&err).into();
            state.publish(Event::ToolCallError(cp_protocol::event::ToolCallErrorEvent {
                tool_call_id,
                kind: envelope.error.kind.to_string(),
                message: envelope.error.message.clone(),
            }));
            (StatusCode::OK, Json(envelope)).into_response()
        }
    };

    state.publish(Event::RequestFinished(cp_protocol::event::RequestFinishedEvent { request_id }));
    response
}

async fn read_resource(state: &GatewayState, uri: String) -> Response {
    match state.resources.read(&uri).await {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(err) => {
            let envelope: ErrorEnvelope = (&err).into();
            (StatusCode::OK, Json(envelope)).into_response()
        }
    }
}

/// `GET /cp/events`: SSE stream of tool-call lifecycle events, fanned out
/// from the shared broadcast channel into a per-connection bounded mpsc
/// channel that [`cp_transport::SseHandler`] turns into the response.
pub async fn events(State(state): State<GatewayState>) -> impl IntoResponse {
    let mut broadcast_rx = BroadcastStream::new(state.event_tx.subscribe());
    let (sender, handler) = cp_transport::channel(32);

    tokio::spawn(async move {
        while let Some(Ok(event)) = broadcast_rx.next().await {
            if sender.is_closed() || sender.send(event).await.is_err() {
                break;
            }
        }
    });

    handler_into_sse(handler)
}

fn handler_into_sse(handler: SseHandler) -> impl IntoResponse {
    handler.into_response()
}
