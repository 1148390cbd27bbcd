//! Bearer-authenticated Prometheus-compatible metrics client.
//!
//! Generalizes the teacher's `analyzer::k8s_optimize::prometheus_client`
//! (`PrometheusAuth` enum, `reqwest::Client`, instant + range query against
//! `/api/v1/query*`) from workload right-sizing into the
//! query/range_query/list_alerts contract this gateway exposes, with an
//! explicit enabled/disabled variant per the redesign notes rather than an
//! `Option<Client>`.

use reqwest::{Client, RequestBuilder};
use serde::Deserialize;

use crate::error::GatewayError;

#[derive(Debug, Clone)]
pub enum MetricsAuth {
    None,
    Basic { username: String, password: String },
    Bearer(String),
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricSample {
    pub labels: std::collections::BTreeMap<String, String>,
    pub value: f64,
    pub timestamp: f64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RangeSample {
    pub labels: std::collections::BTreeMap<String, String>,
    pub values: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Alert {
    pub name: String,
    pub state: String,
    pub severity: String,
    pub summary: String,
    pub labels: std::collections::BTreeMap<String, String>,
}

pub struct MetricsClient {
    inner: Option<Inner>,
}

struct Inner {
    base_url: String,
    http_client: Client,
    auth: MetricsAuth,
}

impl MetricsClient {
    pub fn disabled() -> Self {
        MetricsClient { inner: None }
    }

    pub fn new(base_url: impl Into<String>, auth: MetricsAuth) -> Result<Self, GatewayError> {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(GatewayError::InvalidArgument(
                "PROMETHEUS_URL must start with http:// or https://".to_string(),
            ));
        }
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| GatewayError::Internal(e.to_string()))?;
        Ok(MetricsClient {
            inner: Some(Inner { base_url, http_client, auth }),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    fn inner(&self) -> Result<&Inner, GatewayError> {
        self.inner
            .as_ref()
            .ok_or_else(|| GatewayError::ServiceDisabled("metrics".to_string()))
    }

    fn add_auth(&self, inner: &Inner, req: RequestBuilder) -> RequestBuilder {
        let _ = self;
        match &inner.auth {
            MetricsAuth::None => req,
            MetricsAuth::Basic { username, password } => req.basic_auth(username, Some(password)),
            MetricsAuth::Bearer(token) => req.bearer_auth(token),
        }
    }

    pub async fn query(&self, expr: &str) -> Result<Vec<MetricSample>, GatewayError> {
        let inner = self.inner()?;
        let url = format!("{}/api/v1/query?query={}", inner.base_url, urlencoding::encode(expr));
        let req = self.add_auth(inner, inner.http_client.get(&url));
        let response = req
            .send()
            .await
            .map_err(|e| GatewayError::UpstreamUnavailable(format!("metrics-unavailable: {e}")))?;
        let body: PrometheusResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::DecodeError(e.to_string()))?;
        if body.status != "success" {
            return Err(GatewayError::UpstreamUnavailable(format!(
                "metrics-unavailable: {}",
                body.error.unwrap_or_default()
            )));
        }
        Ok(body
            .data
            .result
            .unwrap_or_default()
            .into_iter()
            .filter_map(|series| {
                let (ts, value) = series.value?;
                Some(MetricSample {
                    labels: series.metric,
                    value: value.parse().unwrap_or(0.0),
                    timestamp: ts,
                })
            })
            .collect())
    }

    pub async fn range_query(
        &self,
        expr: &str,
        start_unix: u64,
        end_unix: u64,
        step: &str,
    ) -> Result<Vec<RangeSample>, GatewayError> {
        let inner = self.inner()?;
        let url = format!(
            "{}/api/v1/query_range?query={}&start={}&end={}&step={}",
            inner.base_url,
            urlencoding::encode(expr),
            start_unix,
            end_unix,
            step
        );
        let req = self.add_auth(inner, inner.http_client.get(&url));
        let response = req
            .send()
            .await
            .map_err(|e| GatewayError::UpstreamUnavailable(format!("metrics-unavailable: {e}")))?;
        let body: PrometheusResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::DecodeError(e.to_string()))?;
        if body.status != "success" {
            return Err(GatewayError::UpstreamUnavailable(format!(
                "metrics-unavailable: {}",
                body.error.unwrap_or_default()
            )));
        }
        Ok(body
            .data
            .result
            .unwrap_or_default()
            .into_iter()
            .map(|series| RangeSample {
                labels: series.metric,
                values: series
                    .values
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|(ts, v)| v.parse::<f64>().ok().map(|v| (ts, v)))
                    .collect(),
            })
            .collect())
    }

    pub async fn list_alerts(&self) -> Result<Vec<Alert>, GatewayError> {
        let inner = self.inner()?;
        let url = format!("{}/api/v1/alerts", inner.base_url);
        let req = self.add_auth(inner, inner.http_client.get(&url));
        let response = req
            .send()
            .await
            .map_err(|e| GatewayError::UpstreamUnavailable(format!("metrics-unavailable: {e}")))?;
        let body: AlertsResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::DecodeError(e.to_string()))?;
        Ok(body
            .data
            .alerts
            .into_iter()
            .map(|a| Alert {
                name: a.labels.get("alertname").cloned().unwrap_or_default(),
                state: a.state,
                severity: a.labels.get("severity").cloned().unwrap_or_else(|| "unknown".to_string()),
                summary: a.annotations.get("summary").cloned().unwrap_or_default(),
                labels: a.labels,
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct PrometheusResponse {
    status: String,
    error: Option<String>,
    data: PrometheusData,
}

#[derive(Debug, Deserialize)]
struct PrometheusData {
    result: Option<Vec<PrometheusResult>>,
}

#[derive(Debug, Deserialize)]
struct PrometheusResult {
    metric: std::collections::BTreeMap<String, String>,
    #[serde(default)]
    value: Option<(f64, String)>,
    #[serde(default)]
    values: Option<Vec<(f64, String)>>,
}

#[derive(Debug, Deserialize)]
struct AlertsResponse {
    data: AlertsData,
}

#[derive(Debug, Deserialize)]
struct AlertsData {
    alerts: Vec<RawAlert>,
}

#[derive(Debug, Deserialize)]
struct RawAlert {
    labels: std::collections::BTreeMap<String, String>,
    annotations: std::collections::BTreeMap<String, String>,
    state: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_client_short_circuits_all_operations() {
        let client = MetricsClient::disabled();
        assert!(!client.is_enabled());
        let result = client.query("up").await;
        assert!(matches!(result, Err(GatewayError::ServiceDisabled(_))));
    }

    #[test]
    fn rejects_url_without_scheme() {
        let result = MetricsClient::new("prometheus.internal:9090", MetricsAuth::None);
        assert!(result.is_err());
    }

    #[test]
    fn enabled_client_reports_is_enabled() {
        let client = MetricsClient::new("http://localhost:9090", MetricsAuth::None).unwrap();
        assert!(client.is_enabled());
    }
}
