//! Core data-model entities shared across clients, the capacity engine, and
//! the deployment router.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub name: String,
    pub roles: Vec<String>,
    pub kubelet_version: String,
    pub capacity_cpu_millicores: u64,
    pub capacity_memory_bytes: u64,
    pub allocatable_cpu_millicores: u64,
    pub allocatable_memory_bytes: u64,
    pub allocatable_pods: u64,
    pub ready: bool,
    pub conditions: Vec<String>,
    pub labels: std::collections::BTreeMap<String, String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRequest {
    pub name: String,
    pub cpu_millicores: Option<u64>,
    pub memory_bytes: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodInfo {
    pub name: String,
    pub namespace: String,
    pub phase: String,
    pub labels: std::collections::BTreeMap<String, String>,
    pub annotations: std::collections::BTreeMap<String, String>,
    pub owner_kind: Option<String>,
    pub owner_name: Option<String>,
    pub containers: Vec<ContainerRequest>,
    pub restart_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceInfo {
    pub name: String,
    pub phase: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterEvent {
    pub namespace: String,
    pub reason: String,
    pub message: String,
    pub involved_object: String,
    pub event_type: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterHealthStatus {
    Healthy,
    Degraded,
    Critical,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeHealth {
    pub total: u64,
    pub ready: u64,
    pub not_ready: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodHealth {
    pub total: u64,
    pub running: u64,
    pub pending: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterHealth {
    pub status: ClusterHealthStatus,
    pub node_health: NodeHealth,
    pub pod_health: PodHealth,
}

/// `safe(q,p) <= max(q,p)`, both nonnegative — see [`crate::capacity::calculator`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quota {
    pub cpu_limit_millicores: u64,
    pub memory_limit_bytes: u64,
    pub pod_count_limit: u64,
    pub cpu_used_millicores: u64,
    pub memory_used_bytes: u64,
    pub pods_used: u64,
    pub is_real: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodProfile {
    pub cpu_millicores: u64,
    pub memory_mb: u64,
}

impl PodProfile {
    pub const SMALL: PodProfile = PodProfile { cpu_millicores: 100, memory_mb: 128 };
    pub const MEDIUM: PodProfile = PodProfile { cpu_millicores: 200, memory_mb: 128 };
    pub const LARGE: PodProfile = PodProfile { cpu_millicores: 500, memory_mb: 512 };

    pub fn named(name: &str) -> Option<PodProfile> {
        match name {
            "small" => Some(PodProfile::SMALL),
            "medium" => Some(PodProfile::MEDIUM),
            "large" => Some(PodProfile::LARGE),
            _ => None,
        }
    }

    pub fn memory_bytes(&self) -> u64 {
        self.memory_mb * 1024 * 1024
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitingFactor {
    Cpu,
    Memory,
    PodCount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileEstimate {
    pub profile: String,
    pub max_pods: u64,
    pub safe_pods: u64,
    pub limiting_factor: LimitingFactor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUsage {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub pods_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableCapacity {
    pub cpu_millicores: u64,
    pub memory_bytes: u64,
    pub pod_slots: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendProjection {
    pub cpu_percent_per_day: f64,
    pub memory_percent_per_day: f64,
    pub days_until_85_percent: u32,
    pub insufficient_data: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityResult {
    pub quota: Quota,
    pub current_usage: CurrentUsage,
    pub available: AvailableCapacity,
    pub profile_estimates: Vec<ProfileEstimate>,
    pub recommended_limit: ProfileEstimate,
    pub explanation: String,
    pub trending: TrendProjection,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalingImpactResult {
    pub current_replicas: u32,
    pub target_replicas: u32,
    pub projected_cpu_millicores: u64,
    pub projected_memory_bytes: u64,
    pub quota_exceeded: bool,
    pub projected_usage_percent: f64,
    pub limiting_factor: LimitingFactor,
    pub infrastructure_impact: InfraImpact,
    pub warnings: Vec<String>,
    pub recommendation: String,
    pub alternatives: Vec<AlternativeScenario>,
    pub analyzed_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfraImpact {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeScenario {
    pub replicas: u32,
    pub projected_usage_percent: f64,
    pub safe: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentClassification {
    Argocd,
    Helm,
    Operator,
    Manual,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentInfo {
    pub classification: DeploymentClassification,
    pub managed: bool,
    pub source: Option<String>,
    pub managing_entity: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub status: IncidentStatus,
    pub action_type: String,
    pub target: String,
    pub created_at: String,
    pub updated_at: String,
    pub duration_seconds: Option<u64>,
}

/// Field names MUST be `anomaly_score`/`confidence`, never the historical
/// `score` alias — see the regression test in
/// [`crate::clients::coordination`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyPattern {
    pub metric_name: String,
    pub severity: Severity,
    pub anomaly_score: f64,
    pub confidence: f64,
    pub timestamp: String,
    pub value: f64,
    pub expected_min: f64,
    pub expected_max: f64,
    pub detecting_model: String,
    pub metrics: std::collections::BTreeMap<String, f64>,
    pub explanation: String,
    pub recommended_action: String,
}
