//! `scaling-impact` tool: projects the quota/infrastructure impact of
//! scaling a workload from its current replica count to a target.

use std::sync::Arc;

use cp_protocol::{Schema, ToolDescriptor};
use serde_json::Value as JsonValue;

use crate::capacity::scaling::{self, RepresentativePodMetrics, ScalingImpactInput};
use crate::context::GatewayContext;
use crate::error::GatewayError;
use crate::registry::tool::ToolHandler;

pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        "scaling-impact",
        "Project the quota and infrastructure impact of scaling a workload's replica count",
        Schema::object(
            [
                ("namespace".to_string(), Schema::string()),
                ("currentReplicas".to_string(), Schema::integer().with_range(Some(0.0), None)),
                ("targetReplicas".to_string(), Schema::integer().with_range(Some(0.0), None)),
                ("perPodCpuMillicores".to_string(), Schema::integer().with_range(Some(0.0), None)),
                ("perPodMemoryBytes".to_string(), Schema::integer().with_range(Some(0.0), None)),
                (
                    "growthCoefficient".to_string(),
                    Schema::number().with_range(Some(1.0), Some(2.0)),
                ),
            ],
            vec![
                "namespace",
                "currentReplicas",
                "targetReplicas",
                "perPodCpuMillicores",
                "perPodMemoryBytes",
            ],
        ),
    )
}

pub fn handler(ctx: Arc<GatewayContext>) -> ToolHandler {
    Arc::new(move |args: JsonValue| {
        let ctx = ctx.clone();
        Box::pin(async move {
            let namespace = required_str(&args, "namespace")?;
            let current_replicas = required_u64(&args, "currentReplicas")? as u32;
            let target_replicas = required_u64(&args, "targetReplicas")? as u32;
            let per_pod_cpu = required_u64(&args, "perPodCpuMillicores")?;
            let per_pod_memory = required_u64(&args, "perPodMemoryBytes")?;
            let growth_coefficient = args.get("growthCoefficient").and_then(|v| v.as_f64());

            let cluster = &ctx.cluster;
            let quota = ctx.cluster_breaker.call(|| cluster.get_resource_quota(&namespace)).await?;

            let result = scaling::analyze(ScalingImpactInput {
                namespace: &namespace,
                current_replicas,
                target_replicas,
                per_pod: RepresentativePodMetrics { cpu_millicores: per_pod_cpu, memory_bytes: per_pod_memory },
                quota,
                growth_coefficient,
                analyzed_at: chrono::Utc::now().to_rfc3339(),
            });

            serde_json::to_value(&result).map_err(|e| GatewayError::Internal(e.to_string()))
        })
    })
}

fn required_str(args: &JsonValue, field: &str) -> Result<String, GatewayError> {
    args.get(field)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| GatewayError::InvalidArgument(format!("{field} is required")))
}

fn required_u64(args: &JsonValue, field: &str) -> Result<u64, GatewayError> {
    args.get(field)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| GatewayError::InvalidArgument(format!("{field} is required")))
}
