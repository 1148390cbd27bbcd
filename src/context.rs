//! The gateway's explicit collaborator set.
//!
//! Per the "global-like singletons" redesign note, every integration client
//! and its breaker is constructed once during server composition and
//! injected here rather than reached for as process-wide state.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::breaker::CircuitBreaker;
use crate::cache::TtlCache;
use crate::clients::cluster::ClusterClient;
use crate::clients::coordination::CoordinationClient;
use crate::clients::inference::InferenceClient;
use crate::clients::metrics::MetricsClient;

pub struct GatewayContext {
    pub cache: Arc<TtlCache<JsonValue>>,
    pub cluster: ClusterClient,
    pub metrics: MetricsClient,
    pub coordination: CoordinationClient,
    pub inference: InferenceClient,
    pub cluster_breaker: Arc<CircuitBreaker>,
    pub metrics_breaker: Arc<CircuitBreaker>,
    pub coordination_breaker: Arc<CircuitBreaker>,
    pub inference_breaker: Arc<CircuitBreaker>,
    pub anomaly_threshold: f64,
}
