//! Context Protocol (CP) core types.
//!
//! This crate provides the core type definitions for the Context Protocol:
//! the tool/resource descriptors an agent discovers, the structural schema
//! used to validate tool arguments, and the event types streamed back over
//! SSE while a tool call executes.
//!
//! Generalized from the teacher's AG-UI core type library, trimmed to the
//! tool/resource surface this gateway needs (no chat messages, no thinking
//! steps, no agent state snapshots).

pub mod error;
pub mod event;
pub mod ids;
pub mod schema;
pub mod tool;

pub use error::{ProtocolError, Result};
pub use event::{Event, EventType};
pub use ids::{RequestId, ToolCallId};
pub use schema::{Schema, SchemaType};
pub use tool::{ResourceDescriptor, ToolDescriptor};

/// Re-export serde_json::Value for consistent JSON handling across the crate.
pub use serde_json::Value as JsonValue;
