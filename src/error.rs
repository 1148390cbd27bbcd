//! Gateway-wide error taxonomy.
//!
//! One `thiserror` enum carries every error kind the tool/resource dispatch
//! layer can surface, the way `PlatformApiError` carries every Platform API
//! failure mode. Unlike the teacher's error type, variants here map 1:1 onto
//! the wire-visible `kind` string in `ErrorEnvelope` rather than onto a
//! human-facing `suggestion()`.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("service disabled: {0}")]
    ServiceDisabled(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("circuit breaker open for {0}")]
    BreakerOpen(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("decode error: {0}")]
    DecodeError(String),

    #[error("confirmation required for {0}")]
    ConfirmationRequired(String),

    #[error("deprecated: {0}")]
    Deprecated(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("unknown resource: {0}")]
    UnknownResource(String),
}

impl GatewayError {
    /// The wire-visible `kind` tag, per the error taxonomy.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::InvalidArgument(_) => "invalid-argument",
            GatewayError::ServiceDisabled(_) => "service-disabled",
            GatewayError::NotFound(_) => "not-found",
            GatewayError::DeadlineExceeded => "deadline-exceeded",
            GatewayError::BreakerOpen(_) => "breaker-open",
            GatewayError::UpstreamUnavailable(_) => "upstream-unavailable",
            GatewayError::DecodeError(_) => "decode-error",
            GatewayError::ConfirmationRequired(_) => "confirmation-required",
            GatewayError::Deprecated(_) => "deprecated",
            GatewayError::Internal(_) => "internal",
            GatewayError::UnknownTool(_) => "not-found",
            GatewayError::UnknownResource(_) => "not-found",
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

/// The `{"error":{"kind","message"}}` body returned for tool-call failures.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
}

impl From<&GatewayError> for ErrorEnvelope {
    fn from(err: &GatewayError) -> Self {
        ErrorEnvelope {
            error: ErrorBody {
                kind: err.kind(),
                message: err.to_string(),
            },
        }
    }
}

impl From<GatewayError> for ErrorEnvelope {
    fn from(err: GatewayError) -> Self {
        ErrorEnvelope::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_carries_kind_and_message() {
        let err = GatewayError::BreakerOpen("cluster-client".to_string());
        let envelope: ErrorEnvelope = (&err).into();
        assert_eq!(envelope.error.kind, "breaker-open");
        assert!(envelope.error.message.contains("cluster-client"));
    }

    #[test]
    fn unknown_tool_maps_to_not_found_kind() {
        let err = GatewayError::UnknownTool("frobnicate".to_string());
        assert_eq!(err.kind(), "not-found");
    }
}
