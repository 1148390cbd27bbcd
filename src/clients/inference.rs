//! ML inference client (KServe v2 inference protocol) with a rule-based
//! fallback detector.
//!
//! Follows the same enabled/disabled-client shape as
//! [`crate::clients::metrics::MetricsClient`]; the rule-based threshold
//! fallback is a plain function grounded on the heuristic scoring style of
//! the teacher's `cost_calculator::calculate_from_live` (deterministic
//! per-sample arithmetic, no external call).

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

pub struct InferenceClient {
    inner: Option<Inner>,
    namespace: String,
}

struct Inner {
    base_url: String,
    http_client: Client,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub ready: bool,
    pub url: String,
    pub runtime: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyDetection {
    pub anomaly_score: f64,
    pub is_anomaly: bool,
    /// Present and `true` only when the rule-based fallback produced this
    /// result rather than the inference service.
    pub degraded: bool,
}

impl InferenceClient {
    pub fn disabled(namespace: impl Into<String>) -> Self {
        InferenceClient { inner: None, namespace: namespace.into() }
    }

    pub fn new(namespace: impl Into<String>, predictor_port: u16) -> Result<Self, GatewayError> {
        let namespace = namespace.into();
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| GatewayError::Internal(e.to_string()))?;
        Ok(InferenceClient {
            inner: Some(Inner {
                base_url: format!("http://kserve.{namespace}.svc.cluster.local:{predictor_port}"),
                http_client,
            }),
            namespace,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn inner(&self) -> Result<&Inner, GatewayError> {
        self.inner
            .as_ref()
            .ok_or_else(|| GatewayError::ServiceDisabled("inference".to_string()))
    }

    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, GatewayError> {
        let inner = self.inner()?;
        let url = format!("{}/v2/models", inner.base_url);
        let response = inner
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| GatewayError::UpstreamUnavailable(format!("http-transport: {e}")))?;
        let body: ListModelsResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::DecodeError(e.to_string()))?;
        Ok(body
            .models
            .into_iter()
            .map(|name| ModelInfo {
                url: format!("{}/v2/models/{}/infer", inner.base_url, name),
                runtime: "kserve".to_string(),
                ready: true,
                name,
            })
            .collect())
    }

    /// Calls the upstream `POST /v2/models/{name}/infer`. Callers should
    /// fall back to [`rule_based_anomaly_scan`] when this is disabled or
    /// fails.
    pub async fn detect_anomalies(
        &self,
        model_name: &str,
        metrics: &[f64],
    ) -> Result<AnomalyDetection, GatewayError> {
        let inner = self.inner()?;
        let url = format!("{}/v2/models/{}/infer", inner.base_url, model_name);
        let request_body = InferRequest {
            inputs: vec![InferInput {
                name: "metrics".to_string(),
                shape: vec![metrics.len()],
                datatype: "FP64".to_string(),
                data: metrics.to_vec(),
            }],
        };
        let response = inner
            .http_client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| GatewayError::UpstreamUnavailable(format!("http-transport: {e}")))?;
        if !response.status().is_success() {
            return Err(GatewayError::UpstreamUnavailable(format!(
                "inference service returned {}",
                response.status()
            )));
        }
        let body: InferResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::DecodeError(e.to_string()))?;
        let score = body
            .outputs
            .first()
            .and_then(|o| o.data.first())
            .copied()
            .unwrap_or(0.0);
        Ok(AnomalyDetection {
            anomaly_score: score,
            is_anomaly: score >= 0.5,
            degraded: false,
        })
    }
}

/// Threshold-based fallback used when the inference client is disabled or
/// its call fails. Flags the maximum observed deviation from the series
/// mean, normalized to [0, 1], against `threshold` (default 0.3).
pub fn rule_based_anomaly_scan(metrics: &[f64], threshold: f64) -> AnomalyDetection {
    if metrics.is_empty() {
        return AnomalyDetection { anomaly_score: 0.0, is_anomaly: false, degraded: true };
    }
    let mean = metrics.iter().sum::<f64>() / metrics.len() as f64;
    let max_abs_deviation = metrics
        .iter()
        .map(|v| (v - mean).abs())
        .fold(0.0_f64, f64::max);
    let normalizer = mean.abs().max(1.0);
    let score = (max_abs_deviation / normalizer).min(1.0);
    AnomalyDetection {
        anomaly_score: score,
        is_anomaly: score >= threshold,
        degraded: true,
    }
}

#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<String>,
}

#[derive(Debug, Serialize)]
struct InferRequest {
    inputs: Vec<InferInput>,
}

#[derive(Debug, Serialize)]
struct InferInput {
    name: String,
    shape: Vec<usize>,
    datatype: String,
    data: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct InferResponse {
    outputs: Vec<InferOutput>,
}

#[derive(Debug, Deserialize)]
struct InferOutput {
    data: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_client_reports_not_enabled() {
        let client = InferenceClient::disabled("default");
        assert!(!client.is_enabled());
        assert_eq!(client.namespace(), "default");
    }

    #[test]
    fn rule_based_fallback_flags_deviation_above_threshold() {
        let metrics = vec![10.0, 10.0, 10.0, 95.0];
        let result = rule_based_anomaly_scan(&metrics, 0.3);
        assert!(result.degraded);
        assert!(result.is_anomaly);
    }

    #[test]
    fn rule_based_fallback_stays_quiet_on_stable_series() {
        let metrics = vec![10.0, 10.2, 9.8, 10.1];
        let result = rule_based_anomaly_scan(&metrics, 0.3);
        assert!(!result.is_anomaly);
    }

    #[test]
    fn rule_based_fallback_handles_empty_series() {
        let result = rule_based_anomaly_scan(&[], 0.3);
        assert_eq!(result.anomaly_score, 0.0);
        assert!(!result.is_anomaly);
    }
}
