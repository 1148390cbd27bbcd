//! Composed tools and resources (spec component M), wired against a shared
//! [`GatewayContext`] during server composition.

mod analyze_anomalies;
mod cluster_health;
mod list_pods;
mod pod_capacity;
mod scaling_impact;
mod trigger_remediation;

use std::sync::Arc;

use cp_protocol::ResourceDescriptor;

use crate::context::GatewayContext;
use crate::error::GatewayError;
use crate::registry::resource::{not_available, ResourceRegistry};
use crate::registry::tool::ToolRegistry;

pub async fn register_all(
    ctx: Arc<GatewayContext>,
    tools: &ToolRegistry,
    resources: &ResourceRegistry,
) -> Result<(), GatewayError> {
    tools.register(cluster_health::descriptor(), cluster_health::handler(ctx.clone())).await?;
    tools.register(list_pods::descriptor(), list_pods::handler(ctx.clone())).await?;
    tools.register(analyze_anomalies::descriptor(), analyze_anomalies::handler(ctx.clone())).await?;
    tools.register(pod_capacity::descriptor(), pod_capacity::handler(ctx.clone())).await?;
    tools.register(scaling_impact::descriptor(), scaling_impact::handler(ctx.clone())).await?;
    tools.register(trigger_remediation::descriptor(), trigger_remediation::handler(ctx.clone())).await?;

    register_resources(ctx, resources).await?;
    Ok(())
}

async fn register_resources(ctx: Arc<GatewayContext>, resources: &ResourceRegistry) -> Result<(), GatewayError> {
    {
        let ctx = ctx.clone();
        resources
            .register(
                ResourceDescriptor::new("cluster://health", "cluster-health-snapshot", "Last known cluster health"),
                Arc::new(move || {
                    let ctx = ctx.clone();
                    Box::pin(async move {
                        let cluster = &ctx.cluster;
                        match ctx.cluster_breaker.call(|| cluster.get_cluster_health()).await {
                            Ok(health) => {
                                let value =
                                    serde_json::to_value(&health).map_err(|e| GatewayError::Internal(e.to_string()))?;
                                Ok((value, "kubernetes-api"))
                            }
                            Err(_) => Ok(not_available()),
                        }
                    })
                }),
            )
            .await?;
    }

    {
        let ctx = ctx.clone();
        resources
            .register(
                ResourceDescriptor::new("cluster://nodes", "cluster-nodes", "Live node inventory"),
                Arc::new(move || {
                    let ctx = ctx.clone();
                    Box::pin(async move {
                        let cluster = &ctx.cluster;
                        match ctx.cluster_breaker.call(|| cluster.list_nodes()).await {
                            Ok(nodes) => {
                                let value =
                                    serde_json::to_value(&nodes).map_err(|e| GatewayError::Internal(e.to_string()))?;
                                Ok((value, "kubernetes-api"))
                            }
                            Err(_) => Ok(not_available()),
                        }
                    })
                }),
            )
            .await?;
    }

    {
        let ctx = ctx.clone();
        resources
            .register(
                ResourceDescriptor::new("cluster://incidents", "open-incidents", "Open incidents tracked by the coordination service"),
                Arc::new(move || {
                    let ctx = ctx.clone();
                    Box::pin(async move {
                        if !ctx.coordination.is_enabled() {
                            return Ok(not_available());
                        }
                        let coordination = &ctx.coordination;
                        match ctx
                            .coordination_breaker
                            .call(|| coordination.list_incidents(None, None, 50, 0))
                            .await
                        {
                            Ok(list) => {
                                let value =
                                    serde_json::to_value(&list).map_err(|e| GatewayError::Internal(e.to_string()))?;
                                Ok((value, "coordination-engine"))
                            }
                            Err(_) => Ok(not_available()),
                        }
                    })
                }),
            )
            .await?;
    }

    {
        let ctx = ctx.clone();
        resources
            .register(
                ResourceDescriptor::new(
                    "cluster://remediation-history",
                    "remediation-history",
                    "Completed and in-flight remediation workflows",
                ),
                Arc::new(move || {
                    let ctx = ctx.clone();
                    Box::pin(async move {
                        if !ctx.coordination.is_enabled() {
                            return Ok(not_available());
                        }
                        let coordination = &ctx.coordination;
                        match ctx
                            .coordination_breaker
                            .call(|| coordination.list_incidents(Some(crate::model::IncidentStatus::Completed), None, 50, 0))
                            .await
                        {
                            Ok(list) => {
                                let value =
                                    serde_json::to_value(&list).map_err(|e| GatewayError::Internal(e.to_string()))?;
                                Ok((value, "coordination-engine"))
                            }
                            Err(_) => Ok(not_available()),
                        }
                    })
                }),
            )
            .await?;
    }

    Ok(())
}
