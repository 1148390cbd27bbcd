//! `list-pods` tool: lists pods in a namespace (or cluster-wide), with
//! optional owner-kind/phase filters applied after the cluster read.

use std::sync::Arc;

use cp_protocol::{Schema, ToolDescriptor};
use serde_json::{json, Value as JsonValue};

use crate::context::GatewayContext;
use crate::error::GatewayError;
use crate::registry::tool::ToolHandler;

pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        "list-pods",
        "List pods, optionally scoped to a namespace and filtered by phase",
        Schema::object(
            [
                ("namespace".to_string(), Schema::string().describe("target namespace; omitted lists all namespaces")),
                (
                    "phase".to_string(),
                    Schema::string()
                        .describe("filter to a specific pod phase")
                        .with_enum(vec![json!("Running"), json!("Pending"), json!("Failed"), json!("Succeeded"), json!("Unknown")]),
                ),
            ],
            vec![],
        ),
    )
}

pub fn handler(ctx: Arc<GatewayContext>) -> ToolHandler {
    Arc::new(move |args: JsonValue| {
        let ctx = ctx.clone();
        Box::pin(async move {
            let namespace = args.get("namespace").and_then(|v| v.as_str());
            let phase_filter = args.get("phase").and_then(|v| v.as_str());

            let cluster = &ctx.cluster;
            let pods = ctx
                .cluster_breaker
                .call(|| cluster.list_pods(namespace))
                .await?;

            let filtered: Vec<_> = pods
                .into_iter()
                .filter(|pod| phase_filter.is_none_or(|phase| pod.phase == phase))
                .collect();

            serde_json::to_value(&filtered).map_err(|e| GatewayError::Internal(e.to_string()))
        })
    })
}
