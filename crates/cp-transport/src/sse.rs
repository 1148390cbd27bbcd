//! Server-Sent Events transport for streaming Context Protocol events.
//!
//! Channel-based design lifted directly from the teacher's
//! `ag_ui_server::transport::sse`: a [`SseSender`] used by tool handlers to
//! push progress events, and a [`SseHandler`] converted into an axum SSE
//! response for the `/cp/events` endpoint.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::response::sse::{Event as AxumSseEvent, KeepAlive, Sse};
use axum::response::IntoResponse;
use cp_protocol::Event;
use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::TransportError;

/// Sender half of an SSE channel. Cloneable so every concurrent tool call
/// handler can hold its own handle onto the same stream.
#[derive(Debug, Clone)]
pub struct SseSender {
    sender: mpsc::Sender<Event>,
}

impl SseSender {
    pub async fn send(&self, event: Event) -> Result<(), TransportError> {
        self.sender.send(event).await.map_err(|_| TransportError::Channel)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Receiver half of an SSE channel, consumed into an axum response.
pub struct SseHandler {
    receiver: mpsc::Receiver<Event>,
}

impl SseHandler {
    pub fn into_response(self) -> impl IntoResponse {
        let stream = SseEventStream {
            inner: ReceiverStream::new(self.receiver),
        };
        Sse::new(stream).keep_alive(KeepAlive::default())
    }
}

struct SseEventStream {
    inner: ReceiverStream<Event>,
}

impl Stream for SseEventStream {
    type Item = Result<AxumSseEvent, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Ready(Some(event)) => {
                let json = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(e) => format!(r#"{{"type":"TOOL_CALL_ERROR","message":"serialization error: {}"}}"#, e),
                };
                let sse_event = AxumSseEvent::default()
                    .event(event.event_type().as_str())
                    .data(json);
                Poll::Ready(Some(Ok(sse_event)))
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Creates a new SSE channel pair. `buffer` bounds how many events may be
/// queued before `send` blocks.
pub fn channel(buffer: usize) -> (SseSender, SseHandler) {
    let (tx, rx) = mpsc::channel(buffer);
    (SseSender { sender: tx }, SseHandler { receiver: rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cp_protocol::event::{RequestFinishedEvent};
    use cp_protocol::RequestId;

    #[tokio::test]
    async fn send_then_receive_preserves_event() {
        let (sender, mut handler) = channel(4);
        let event = Event::RequestFinished(RequestFinishedEvent {
            request_id: RequestId::random(),
        });
        sender.send(event.clone()).await.unwrap();
        let received = handler.receiver.recv().await.unwrap();
        assert_eq!(received, event);
    }

    #[tokio::test]
    async fn closed_receiver_is_detected() {
        let (sender, handler) = channel(4);
        drop(handler);
        assert!(sender.is_closed());
    }
}
