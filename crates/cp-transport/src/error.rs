//! Transport-level errors, separate from `cp_protocol::ProtocolError` the
//! same way the teacher separates `ag_ui_server::ServerError` from
//! `ag_ui_core::AgUiError`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("channel closed")]
    Channel,

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;
