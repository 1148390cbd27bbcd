//! Typed HTTP client for the external remediation coordination service (v2).
//!
//! Generalizes `platform::api::client::PlatformApiClient` (bearer auth, JSON
//! (de)serialization, `is_retryable_error`, exponential backoff) from the
//! Syncable platform API to the incident/remediation/anomaly-analysis wire
//! contract. All v1 fields are absent; this client only ever speaks v2.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::model::{AnomalyPattern, Incident, IncidentStatus, Severity};

use super::with_retry;

fn is_retryable(err: &GatewayError) -> bool {
    matches!(err, GatewayError::UpstreamUnavailable(_))
}

pub struct CoordinationClient {
    inner: Option<Inner>,
}

struct Inner {
    base_url: String,
    http_client: Client,
    token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RemediationRequest {
    pub incident_id: String,
    pub namespace: String,
    pub resource: ResourceRef,
    pub issue: IssueRef,
    pub dry_run: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ResourceRef {
    pub kind: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct IssueRef {
    #[serde(rename = "type")]
    pub issue_type: String,
    pub description: String,
    pub severity: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemediationResponse {
    pub workflow_id: String,
    pub status: String,
    pub deployment_method: String,
    pub estimated_duration: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct IncidentListResponse {
    pub incidents: Vec<Incident>,
    pub summary: IncidentSummary,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct IncidentSummary {
    #[serde(default)]
    pub by_severity: std::collections::BTreeMap<String, u64>,
    #[serde(default)]
    pub by_status: std::collections::BTreeMap<String, u64>,
}

#[derive(Debug, Serialize)]
pub struct AnomalyAnalysisRequest {
    pub namespace: Option<String>,
    pub time_range: String,
    pub threshold: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnomalyResponse {
    pub status: String,
    pub count: usize,
    pub time_range: String,
    pub threshold: f64,
    pub patterns: Vec<AnomalyPattern>,
    pub recommendations: Vec<String>,
    pub alerts: Vec<String>,
    pub summary: String,
}

impl CoordinationClient {
    pub fn disabled() -> Self {
        CoordinationClient { inner: None }
    }

    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, GatewayError> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| GatewayError::Internal(e.to_string()))?;
        Ok(CoordinationClient {
            inner: Some(Inner {
                base_url: base_url.into().trim_end_matches('/').to_string(),
                http_client,
                token,
            }),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    fn inner(&self) -> Result<&Inner, GatewayError> {
        self.inner
            .as_ref()
            .ok_or_else(|| GatewayError::ServiceDisabled("coordination".to_string()))
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, GatewayError> {
        let inner = self.inner()?;
        with_retry(
            || async {
                let mut req = inner.http_client.get(format!("{}{}", inner.base_url, path));
                if let Some(token) = &inner.token {
                    req = req.bearer_auth(token);
                }
                let response = req.send().await.map_err(classify_transport_error)?;
                decode_success(response).await
            },
            is_retryable,
        )
        .await
    }

    async fn post<T: for<'de> Deserialize<'de>, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        accept: &[StatusCode],
    ) -> Result<T, GatewayError> {
        let inner = self.inner()?;
        let mut req = inner.http_client.post(format!("{}{}", inner.base_url, path)).json(body);
        if let Some(token) = &inner.token {
            req = req.bearer_auth(token);
        }
        let response = req.send().await.map_err(classify_transport_error)?;
        let status = response.status();
        if !accept.contains(&status) {
            return Err(GatewayError::UpstreamUnavailable(format!(
                "protocol-violation: unexpected status {status}"
            )));
        }
        response
            .json()
            .await
            .map_err(|e| GatewayError::DecodeError(e.to_string()))
    }

    pub async fn list_incidents(
        &self,
        status: Option<IncidentStatus>,
        severity: Option<Severity>,
        limit: u32,
        offset: u32,
    ) -> Result<IncidentListResponse, GatewayError> {
        let mut query = format!("limit={limit}&offset={offset}");
        if let Some(status) = status {
            query.push_str(&format!("&status={}", serialized_enum_value(&status)?));
        }
        if let Some(severity) = severity {
            query.push_str(&format!("&severity={}", serialized_enum_value(&severity)?));
        }
        self.get(&format!("/v2/incidents?{query}")).await
    }

    pub async fn create_incident(&self, incident: &Incident) -> Result<Incident, GatewayError> {
        self.post("/v2/incidents", incident, &[StatusCode::CREATED]).await
    }

    pub async fn trigger_remediation(
        &self,
        request: &RemediationRequest,
    ) -> Result<RemediationResponse, GatewayError> {
        self.post(
            "/v2/remediation",
            request,
            &[StatusCode::OK, StatusCode::ACCEPTED],
        )
        .await
    }

    /// Preserves `anomaly_score` and `confidence` bit-identically through to
    /// the caller. The historical defect mapped `score` instead of
    /// `anomaly_score`, zeroing severities; `AnomalyPattern` only ever
    /// deserializes the `anomaly_score` field name, so that defect cannot
    /// recur here.
    pub async fn analyze_anomalies(
        &self,
        request: &AnomalyAnalysisRequest,
    ) -> Result<AnomalyResponse, GatewayError> {
        self.post("/v2/anomalies/analyze", request, &[StatusCode::OK]).await
    }

    pub async fn get_cluster_status(&self) -> Result<serde_json::Value, GatewayError> {
        self.get("/v2/cluster/status").await
    }

    pub async fn health_check(&self) -> Result<bool, GatewayError> {
        match self.get::<serde_json::Value>("/v2/health").await {
            Ok(_) => Ok(true),
            Err(GatewayError::ServiceDisabled(_)) => Err(GatewayError::ServiceDisabled("coordination".to_string())),
            Err(_) => Ok(false),
        }
    }
}

fn serialized_enum_value<T: Serialize>(value: &T) -> Result<String, GatewayError> {
    match serde_json::to_value(value).map_err(|e| GatewayError::Internal(e.to_string()))? {
        serde_json::Value::String(s) => Ok(s),
        other => Err(GatewayError::Internal(format!("expected string enum value, got {other}"))),
    }
}

fn classify_transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::UpstreamUnavailable(format!("http-timeout: {err}"))
    } else {
        GatewayError::UpstreamUnavailable(format!("http-transport: {err}"))
    }
}

async fn decode_success<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        return Err(GatewayError::UpstreamUnavailable(format!(
            "protocol-violation: unexpected status {status}"
        )));
    }
    response
        .json()
        .await
        .map_err(|e| GatewayError::DecodeError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_client_short_circuits() {
        let client = CoordinationClient::disabled();
        assert!(!client.is_enabled());
        let result = client.get_cluster_status().await;
        assert!(matches!(result, Err(GatewayError::ServiceDisabled(_))));
    }

    #[test]
    fn anomaly_pattern_deserializes_anomaly_score_not_score() {
        let json = serde_json::json!({
            "metric_name": "cpu_usage",
            "severity": "critical",
            "anomaly_score": 1.0,
            "confidence": 0.87,
            "timestamp": "2026-07-31T00:00:00Z",
            "value": 99.0,
            "expected_min": 0.0,
            "expected_max": 80.0,
            "detecting_model": "isolation-forest",
            "metrics": {},
            "explanation": "cpu spike",
            "recommended_action": "scale up"
        });
        let pattern: AnomalyPattern = serde_json::from_value(json).unwrap();
        assert_eq!(pattern.anomaly_score, 1.0);
        assert_eq!(pattern.confidence, 0.87);
        assert_eq!(pattern.severity, Severity::Critical);
    }
}
