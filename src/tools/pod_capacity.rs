//! `pod-capacity` tool: quota-driven max/safe pod-count estimation across
//! one or more named pod profiles, with usage trending.

use std::sync::Arc;

use cp_protocol::{Schema, ToolDescriptor};
use serde_json::{json, Value as JsonValue};

use crate::capacity::calculator;
use crate::capacity::trending::DailyUsageSample;
use crate::context::GatewayContext;
use crate::error::GatewayError;
use crate::model::PodProfile;
use crate::registry::tool::ToolHandler;

const DEFAULT_SAFETY_MARGIN: f64 = 0.15;

pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        "pod-capacity",
        "Estimate how many additional pods of a given profile a namespace can schedule safely",
        Schema::object(
            [
                ("namespace".to_string(), Schema::string()),
                (
                    "profiles".to_string(),
                    Schema::array(Schema::string().with_enum(vec![json!("small"), json!("medium"), json!("large")]))
                        .with_default(json!(["small", "medium", "large"])),
                ),
                (
                    "safetyMargin".to_string(),
                    Schema::number().with_range(Some(0.0), Some(0.5)).with_default(json!(DEFAULT_SAFETY_MARGIN)),
                ),
                (
                    "history".to_string(),
                    Schema::array(Schema::object(
                        [
                            ("cpuPercent".to_string(), Schema::number()),
                            ("memoryPercent".to_string(), Schema::number()),
                        ],
                        vec!["cpuPercent", "memoryPercent"],
                    )),
                ),
            ],
            vec!["namespace"],
        ),
    )
}

pub fn handler(ctx: Arc<GatewayContext>) -> ToolHandler {
    Arc::new(move |args: JsonValue| {
        let ctx = ctx.clone();
        Box::pin(async move {
            let namespace = args
                .get("namespace")
                .and_then(|v| v.as_str())
                .ok_or_else(|| GatewayError::InvalidArgument("namespace is required".to_string()))?
                .to_string();

            let profile_names: Vec<String> = args
                .get("profiles")
                .and_then(|v| v.as_array())
                .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                .unwrap_or_else(|| vec!["small".to_string(), "medium".to_string(), "large".to_string()]);

            let profiles: Vec<(String, PodProfile)> = profile_names
                .iter()
                .filter_map(|name| PodProfile::named(name).map(|p| (name.clone(), p)))
                .collect();
            let profile_refs: Vec<(&str, PodProfile)> = profiles.iter().map(|(name, p)| (name.as_str(), *p)).collect();

            let safety_margin = args.get("safetyMargin").and_then(|v| v.as_f64()).unwrap_or(DEFAULT_SAFETY_MARGIN);

            let history: Vec<DailyUsageSample> = args
                .get("history")
                .and_then(|v| v.as_array())
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| {
                            let cpu = item.get("cpuPercent")?.as_f64()?;
                            let memory = item.get("memoryPercent")?.as_f64()?;
                            Some(DailyUsageSample { cpu_percent: cpu, memory_percent: memory })
                        })
                        .collect()
                })
                .unwrap_or_default();

            let cluster = &ctx.cluster;
            let quota = ctx.cluster_breaker.call(|| cluster.get_resource_quota(&namespace)).await?;

            let result = calculator::calculate(&quota, &profile_refs, safety_margin, &history);
            serde_json::to_value(&result).map_err(|e| GatewayError::Internal(e.to_string()))
        })
    })
}
