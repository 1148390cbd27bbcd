//! `analyze-anomalies` tool.
//!
//! Primary path is the coordination service's pattern analysis; its
//! `anomaly_score`/`confidence` fields are forwarded bit-identically (see
//! the regression test on [`crate::clients::coordination::AnomalyPattern`]
//! deserialization — the historical `score` defect this guards against).
//! Falls back to the inference client, then to the rule-based scan, when
//! coordination is disabled or unavailable.

use std::sync::Arc;

use cp_protocol::{Schema, ToolDescriptor};
use serde_json::{json, Value as JsonValue};

use crate::clients::coordination::AnomalyAnalysisRequest;
use crate::clients::inference::rule_based_anomaly_scan;
use crate::context::GatewayContext;
use crate::error::GatewayError;
use crate::registry::tool::ToolHandler;

pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        "analyze-anomalies",
        "Analyze a namespace (or raw metric series) for anomalous behavior",
        Schema::object(
            [
                ("namespace".to_string(), Schema::string()),
                (
                    "timeRange".to_string(),
                    Schema::string().with_default(json!("1h")),
                ),
                (
                    "threshold".to_string(),
                    Schema::number().with_range(Some(0.0), Some(1.0)),
                ),
                (
                    "metrics".to_string(),
                    Schema::array(Schema::number())
                        .describe("raw metric series used only by the rule-based fallback"),
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
            let namespace = args.get("namespace").and_then(|v| v.as_str()).map(str::to_string);
            let time_range = args.get("timeRange").and_then(|v| v.as_str()).unwrap_or("1h").to_string();
            let threshold = args.get("threshold").and_then(|v| v.as_f64()).unwrap_or(ctx.anomaly_threshold);
            let metrics: Vec<f64> = args
                .get("metrics")
                .and_then(|v| v.as_array())
                .map(|items| items.iter().filter_map(|v| v.as_f64()).collect())
                .unwrap_or_default();

            if ctx.coordination.is_enabled() {
                let request = AnomalyAnalysisRequest { namespace, time_range: time_range.clone(), threshold };
                let coordination = &ctx.coordination;
                let result = ctx.coordination_breaker.call(|| coordination.analyze_anomalies(&request)).await;
                if let Ok(response) = result {
                    let max_score = response.patterns.iter().map(|p| p.anomaly_score).fold(0.0_f64, f64::max);
                    let mut value = serde_json::to_value(&response).map_err(|e| GatewayError::Internal(e.to_string()))?;
                    if let Some(object) = value.as_object_mut() {
                        object.insert("anomalies".to_string(), object.get("patterns").cloned().unwrap_or(json!([])));
                        object.insert("max_score".to_string(), json!(max_score));
                        object.insert("degraded".to_string(), json!(false));
                    }
                    return Ok(value);
                }
            }

            let fallback = rule_based_anomaly_scan(&metrics, threshold);
            Ok(json!({
                "status": "degraded",
                "time_range": time_range,
                "threshold": threshold,
                "anomalies": [{
                    "metric_name": "raw-series",
                    "anomaly_score": fallback.anomaly_score,
                    "confidence": 0.5,
                    "is_anomaly": fallback.is_anomaly,
                }],
                "max_score": fallback.anomaly_score,
                "degraded": true,
            }))
        })
    })
}
