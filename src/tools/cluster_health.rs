//! `cluster-health` tool: cluster-wide node/pod health summary, cached for
//! 10 s per the gateway's cluster-health TTL guidance.

use std::sync::Arc;

use cp_protocol::{Schema, ToolDescriptor};
use serde_json::Value as JsonValue;

use crate::context::GatewayContext;
use crate::error::GatewayError;
use crate::registry::tool::ToolHandler;

const CACHE_KEY: &str = "cluster-health";
const CACHE_TTL_SECS: u64 = 10;

pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        "cluster-health",
        "Summarize cluster-wide node and pod health",
        Schema::object([], vec![]),
    )
}

pub fn handler(ctx: Arc<GatewayContext>) -> ToolHandler {
    Arc::new(move |_args: JsonValue| {
        let ctx = ctx.clone();
        Box::pin(async move {
            let value = ctx
                .cache
                .get_or_compute(CACHE_KEY, std::time::Duration::from_secs(CACHE_TTL_SECS), || {
                    let ctx = ctx.clone();
                    async move {
                        let cluster = &ctx.cluster;
                        let health = ctx
                            .cluster_breaker
                            .call(|| cluster.get_cluster_health())
                            .await?;
                        serde_json::to_value(&health).map_err(|e| GatewayError::Internal(e.to_string()))
                    }
                })
                .await?;
            Ok(value)
        })
    })
}
