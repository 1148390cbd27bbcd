//! Server-side transport for the Context Protocol.
//!
//! Provides the SSE transport used by `/cp/events`. The message endpoint
//! itself (`/cp/messages`) is plain JSON over POST and lives in the gateway
//! binary's router, since it needs access to the tool registry.

pub mod error;
pub mod sse;

pub use error::{Result, TransportError};
pub use sse::{channel, SseHandler, SseSender};
