//! Server composition.
//!
//! Generalizes the teacher's `server::AgUiConfig`/`ServerState` shape
//! (collaborators built once, cloned into axum's `with_state`) to the
//! cache/cluster/metrics/coordination/inference/breaker/registry
//! collaborator set named in the design notes' "no process-wide state"
//! flag. Shutdown is driven by a [`tokio_util::sync::CancellationToken`]
//! instead of the teacher's one-shot channel handoff, since this gateway
//! has more than one long-lived background task (the cache sweeper) to
//! notify.

pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use serde_json::Value as JsonValue;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::breaker::CircuitBreaker;
use crate::cache::TtlCache;
use crate::clients::cluster::ClusterClient;
use crate::clients::coordination::CoordinationClient;
use crate::clients::inference::InferenceClient;
use crate::clients::metrics::{MetricsAuth, MetricsClient};
use crate::config::GatewayConfig;
use crate::context::GatewayContext;
use crate::error::GatewayError;
use crate::health::HealthProbe;
use crate::registry::resource::ResourceRegistry;
use crate::registry::tool::ToolRegistry;
use crate::tools;

const BREAKER_MAX_FAILURES: u32 = 5;
const BREAKER_RESET_TIMEOUT: Duration = Duration::from_secs(30);
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Shared, `Clone`-able state handed to axum via `with_state`.
#[derive(Clone)]
pub struct GatewayState {
    pub tools: Arc<ToolRegistry>,
    pub resources: Arc<ResourceRegistry>,
    pub health: Arc<HealthProbe>,
    pub event_tx: broadcast::Sender<cp_protocol::Event>,
}

impl GatewayState {
    pub fn publish(&self, event: cp_protocol::Event) {
        let _ = self.event_tx.send(event);
    }
}

pub struct GatewayServer {
    config: GatewayConfig,
    state: GatewayState,
    cache: Arc<TtlCache<JsonValue>>,
    shutdown: CancellationToken,
}

impl GatewayServer {
    /// Startup sequence: build configuration-ordered integration clients
    /// {cache, cluster, metrics?, coordination?, inference?}, construct
    /// breakers, register tools and resources, then mark the health probe
    /// ready. The cache sweeper is started by [`Self::serve`].
    pub async fn build(config: GatewayConfig) -> Result<Self, GatewayError> {
        let cache = Arc::new(TtlCache::<JsonValue>::new(config.cache_ttl));

        let cluster = ClusterClient::new(config.kubeconfig.as_deref()).await?;

        let metrics = if config.enable_prometheus {
            let url = config
                .prometheus_url
                .clone()
                .ok_or_else(|| GatewayError::Internal("ENABLE_PROMETHEUS set without PROMETHEUS_URL".to_string()))?;
            MetricsClient::new(url, MetricsAuth::None)?
        } else {
            MetricsClient::disabled()
        };

        let coordination = if config.enable_coordination_engine {
            let url = config.coordination_engine_url.clone().ok_or_else(|| {
                GatewayError::Internal("ENABLE_COORDINATION_ENGINE set without COORDINATION_ENGINE_URL".to_string())
            })?;
            CoordinationClient::new(url, None)?
        } else {
            CoordinationClient::disabled()
        };

        let inference = if config.enable_kserve {
            let namespace = config
                .kserve_namespace
                .clone()
                .ok_or_else(|| GatewayError::Internal("ENABLE_KSERVE set without KSERVE_NAMESPACE".to_string()))?;
            InferenceClient::new(namespace, config.kserve_predictor_port)?
        } else {
            InferenceClient::disabled(config.kserve_namespace.clone().unwrap_or_default())
        };

        let ctx = Arc::new(GatewayContext {
            cache: cache.clone(),
            cluster,
            metrics,
            coordination,
            inference,
            cluster_breaker: Arc::new(CircuitBreaker::new("cluster-client", BREAKER_MAX_FAILURES, BREAKER_RESET_TIMEOUT)),
            metrics_breaker: Arc::new(CircuitBreaker::new("metrics-client", BREAKER_MAX_FAILURES, BREAKER_RESET_TIMEOUT)),
            coordination_breaker: Arc::new(CircuitBreaker::new(
                "coordination-client",
                BREAKER_MAX_FAILURES,
                BREAKER_RESET_TIMEOUT,
            )),
            inference_breaker: Arc::new(CircuitBreaker::new("inference-client", BREAKER_MAX_FAILURES, BREAKER_RESET_TIMEOUT)),
            anomaly_threshold: config.anomaly_threshold,
        });

        let tool_registry = Arc::new(ToolRegistry::new(config.request_timeout));
        let resource_registry = Arc::new(ResourceRegistry::new());
        tools::register_all(ctx, &tool_registry, &resource_registry).await?;

        let health = Arc::new(HealthProbe::new());
        health.mark_ready();

        let (event_tx, _) = broadcast::channel(1024);

        Ok(GatewayServer {
            config,
            state: GatewayState { tools: tool_registry, resources: resource_registry, health, event_tx },
            cache,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.config.http_host, self.config.http_port)
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/health", get(routes::health))
            .route("/ready", get(routes::ready))
            .route("/cp/messages", post(routes::post_messages))
            .route("/cp/events", get(routes::events))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Serves until the cancellation token fires (via `Ctrl+C` or an
    /// explicit [`Self::shutdown_handle`] caller). The cache sweeper runs
    /// as an independently schedulable task observing the same token.
    pub async fn serve(self) -> Result<(), GatewayError> {
        let addr: SocketAddr = self
            .addr()
            .parse()
            .map_err(|e| GatewayError::Internal(format!("invalid listen address: {e}")))?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Internal(format!("failed to bind {addr}: {e}")))?;

        let shutdown = self.shutdown.clone();
        let app = self.router();

        let ctrlc_shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("received ctrl-c, shutting down");
                ctrlc_shutdown.cancel();
            }
        });

        let sweeper_cache = self.cache.clone();
        let sweeper_shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let purged = sweeper_cache.sweep().await;
                        if purged > 0 {
                            tracing::debug!(purged, "cache sweep purged expired entries");
                        }
                    }
                    _ = sweeper_shutdown.cancelled() => break,
                }
            }
        });

        tracing::info!(%addr, "cluster-health-gateway listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
            })
            .await
            .map_err(|e| GatewayError::Internal(format!("server error: {e}")))
    }

    pub fn shutdown_handle(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}
