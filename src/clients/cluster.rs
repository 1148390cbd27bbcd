//! Read-only Kubernetes cluster client.
//!
//! Generalizes the teacher's `analyzer::k8s_optimize::metrics_client`
//! (`kube::Client` construction via `Config::infer()`, `Api::all`/
//! `Api::namespaced`) from a single "read pod resources" purpose into the
//! full node/pod/namespace/quota/event read surface this gateway needs.

use k8s_openapi::api::core::v1::{Event, Namespace, Node, Pod, ResourceQuota};
use kube::api::{Api, ListParams};
use kube::{Client, Config};

use crate::error::GatewayError;
use crate::model::{
    ClusterEvent, ClusterHealth, ClusterHealthStatus, NamespaceInfo, NodeHealth, NodeInfo,
    PodHealth, PodInfo, Quota,
};

use super::{with_retry, MAX_RETRIES};

pub struct ClusterClient {
    client: Client,
}

impl ClusterClient {
    /// Constructs a client preferring in-cluster credentials, falling back
    /// to a user-provided credential file (`KUBECONFIG`). Fails with
    /// `upstream-unavailable` when neither is viable.
    pub async fn new(kubeconfig: Option<&str>) -> Result<Self, GatewayError> {
        let config = match kubeconfig {
            Some(path) => {
                let kubeconfig = kube::config::Kubeconfig::read_from(path)
                    .map_err(|e| GatewayError::UpstreamUnavailable(format!("kube-unavailable: {e}")))?;
                Config::from_custom_kubeconfig(kubeconfig, &Default::default())
                    .await
                    .map_err(|e| GatewayError::UpstreamUnavailable(format!("kube-unavailable: {e}")))?
            }
            None => Config::infer()
                .await
                .map_err(|e| GatewayError::UpstreamUnavailable(format!("kube-unavailable: {e}")))?,
        };
        let client = Client::try_from(config)
            .map_err(|e| GatewayError::UpstreamUnavailable(format!("kube-unavailable: {e}")))?;
        Ok(ClusterClient { client })
    }

    fn is_transient(err: &kube::Error) -> bool {
        match err {
            kube::Error::Api(resp) => resp.code >= 500 || resp.code == 408 || resp.code == 429,
            kube::Error::Service(_) | kube::Error::HyperError(_) => true,
            _ => false,
        }
    }

    async fn with_retry_kube<T, F, Fut>(op: F) -> Result<T, GatewayError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, kube::Error>>,
    {
        with_retry(op, Self::is_transient)
            .await
            .map_err(|e| GatewayError::UpstreamUnavailable(format!("cluster API error after {} attempts: {e}", MAX_RETRIES + 1)))
    }

    pub async fn list_nodes(&self) -> Result<Vec<NodeInfo>, GatewayError> {
        let api: Api<Node> = Api::all(self.client.clone());
        let list_params = ListParams::default();
        let nodes = Self::with_retry_kube(|| api.list(&list_params)).await?;

        Ok(nodes
            .items
            .into_iter()
            .map(|node| {
                let status = node.status.unwrap_or_default();
                let spec_roles = node
                    .metadata
                    .labels
                    .as_ref()
                    .map(|labels| {
                        labels
                            .keys()
                            .filter_map(|k| k.strip_prefix("node-role.kubernetes.io/"))
                            .map(str::to_string)
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();

                let ready = status
                    .conditions
                    .as_ref()
                    .map(|conds| {
                        conds
                            .iter()
                            .any(|c| c.type_ == "Ready" && c.status == "True")
                    })
                    .unwrap_or(false);

                let conditions = status
                    .conditions
                    .as_ref()
                    .map(|conds| conds.iter().map(|c| c.type_.clone()).collect())
                    .unwrap_or_default();

                let allocatable = status.allocatable.unwrap_or_default();
                let capacity = status.capacity.unwrap_or_default();

                NodeInfo {
                    name: node.metadata.name.unwrap_or_default(),
                    roles: spec_roles,
                    kubelet_version: status
                        .node_info
                        .map(|i| i.kubelet_version)
                        .unwrap_or_default(),
                    capacity_cpu_millicores: quantity_to_millicores(capacity.get("cpu")),
                    capacity_memory_bytes: quantity_to_bytes(capacity.get("memory")),
                    allocatable_cpu_millicores: quantity_to_millicores(allocatable.get("cpu")),
                    allocatable_memory_bytes: quantity_to_bytes(allocatable.get("memory")),
                    allocatable_pods: allocatable
                        .get("pods")
                        .and_then(|q| q.0.parse::<u64>().ok())
                        .unwrap_or(0),
                    ready,
                    conditions,
                    labels: node.metadata.labels.unwrap_or_default().into_iter().collect(),
                    created_at: node
                        .metadata
                        .creation_timestamp
                        .map(|t| t.0.to_rfc3339())
                        .unwrap_or_default(),
                }
            })
            .collect())
    }

    pub async fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<PodInfo>, GatewayError> {
        let api: Api<Pod> = match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };
        let list_params = ListParams::default();
        let pods = Self::with_retry_kube(|| api.list(&list_params)).await?;

        Ok(pods.items.into_iter().map(pod_to_info).collect())
    }

    pub async fn list_namespaces(&self) -> Result<Vec<NamespaceInfo>, GatewayError> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let list_params = ListParams::default();
        let namespaces = Self::with_retry_kube(|| api.list(&list_params)).await?;
        Ok(namespaces
            .items
            .into_iter()
            .map(|ns| NamespaceInfo {
                name: ns.metadata.name.unwrap_or_default(),
                phase: ns
                    .status
                    .and_then(|s| s.phase)
                    .unwrap_or_else(|| "Unknown".to_string()),
            })
            .collect())
    }

    pub async fn get_resource_quota(&self, namespace: &str) -> Result<Quota, GatewayError> {
        let api: Api<ResourceQuota> = Api::namespaced(self.client.clone(), namespace);
        let list_params = ListParams::default();
        let quotas = Self::with_retry_kube(|| api.list(&list_params)).await?;

        let Some(quota) = quotas.items.into_iter().next() else {
            return Ok(estimated_quota(&self.list_pods(Some(namespace)).await?));
        };

        let status = quota.status.unwrap_or_default();
        let hard = status.hard.unwrap_or_default();
        let used = status.used.unwrap_or_default();

        Ok(Quota {
            cpu_limit_millicores: quantity_to_millicores(hard.get("limits.cpu").or_else(|| hard.get("cpu"))),
            memory_limit_bytes: quantity_to_bytes(hard.get("limits.memory").or_else(|| hard.get("memory"))),
            pod_count_limit: hard
                .get("pods")
                .and_then(|q| q.0.parse::<u64>().ok())
                .unwrap_or(0),
            cpu_used_millicores: quantity_to_millicores(used.get("limits.cpu").or_else(|| used.get("cpu"))),
            memory_used_bytes: quantity_to_bytes(used.get("limits.memory").or_else(|| used.get("memory"))),
            pods_used: used.get("pods").and_then(|q| q.0.parse::<u64>().ok()).unwrap_or(0),
            is_real: true,
        })
    }

    pub async fn list_events(&self, namespace: Option<&str>) -> Result<Vec<ClusterEvent>, GatewayError> {
        let api: Api<Event> = match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };
        let list_params = ListParams::default();
        let events = Self::with_retry_kube(|| api.list(&list_params)).await?;
        Ok(events
            .items
            .into_iter()
            .map(|e| ClusterEvent {
                namespace: e.metadata.namespace.unwrap_or_default(),
                reason: e.reason.unwrap_or_default(),
                message: e.message.unwrap_or_default(),
                involved_object: e.involved_object.name.unwrap_or_default(),
                event_type: e.type_.unwrap_or_default(),
                timestamp: e
                    .last_timestamp
                    .map(|t| t.0.to_rfc3339())
                    .unwrap_or_default(),
            })
            .collect())
    }

    pub async fn get_server_version(&self) -> Result<String, GatewayError> {
        let version = self
            .client
            .apiserver_version()
            .await
            .map_err(|e| GatewayError::UpstreamUnavailable(format!("cluster API error: {e}")))?;
        Ok(version.git_version)
    }

    pub fn close(&self) {}

    pub async fn get_cluster_health(&self) -> Result<ClusterHealth, GatewayError> {
        let nodes = match self.list_nodes().await {
            Ok(nodes) => nodes,
            Err(_) => {
                return Ok(ClusterHealth {
                    status: ClusterHealthStatus::Unknown,
                    node_health: NodeHealth { total: 0, ready: 0, not_ready: 0 },
                    pod_health: PodHealth { total: 0, running: 0, pending: 0, failed: 0 },
                })
            }
        };
        let pods = self.list_pods(None).await.unwrap_or_default();

        let total_nodes = nodes.len() as u64;
        let ready_nodes = nodes.iter().filter(|n| n.ready).count() as u64;
        let not_ready_nodes = total_nodes - ready_nodes;

        let total_pods = pods.len() as u64;
        let running_pods = pods.iter().filter(|p| p.phase == "Running").count() as u64;
        let pending_pods = pods.iter().filter(|p| p.phase == "Pending").count() as u64;
        let failed_pods = pods.iter().filter(|p| p.phase == "Failed").count() as u64;

        let status = classify_health(total_nodes, not_ready_nodes, total_pods, failed_pods);

        Ok(ClusterHealth {
            status,
            node_health: NodeHealth { total: total_nodes, ready: ready_nodes, not_ready: not_ready_nodes },
            pod_health: PodHealth { total: total_pods, running: running_pods, pending: pending_pods, failed: failed_pods },
        })
    }
}

/// `healthy` when all nodes are ready and no pods are failed; `degraded`
/// when >=1 node is not ready OR >=1 pod failed but the majority are
/// healthy; `critical` when >25% of nodes not ready or >10% of pods failed;
/// `unknown` with zero nodes.
fn classify_health(total_nodes: u64, not_ready_nodes: u64, total_pods: u64, failed_pods: u64) -> ClusterHealthStatus {
    if total_nodes == 0 {
        return ClusterHealthStatus::Unknown;
    }
    let not_ready_ratio = not_ready_nodes as f64 / total_nodes as f64;
    let failed_ratio = if total_pods == 0 { 0.0 } else { failed_pods as f64 / total_pods as f64 };

    if not_ready_ratio > 0.25 || failed_ratio > 0.10 {
        ClusterHealthStatus::Critical
    } else if not_ready_nodes >= 1 || failed_pods >= 1 {
        ClusterHealthStatus::Degraded
    } else {
        ClusterHealthStatus::Healthy
    }
}

fn pod_to_info(pod: Pod) -> PodInfo {
    let metadata = pod.metadata;
    let spec = pod.spec.unwrap_or_default();
    let status = pod.status.unwrap_or_default();

    let (owner_kind, owner_name) = metadata
        .owner_references
        .unwrap_or_default()
        .into_iter()
        .next()
        .map(|o| (Some(o.kind), Some(o.name)))
        .unwrap_or((None, None));

    let containers = spec
        .containers
        .iter()
        .map(|c| {
            let resources = c.resources.as_ref();
            crate::model::ContainerRequest {
                name: c.name.clone(),
                cpu_millicores: resources
                    .and_then(|r| r.requests.as_ref())
                    .and_then(|req| req.get("cpu"))
                    .map(|q| quantity_to_millicores(Some(q))),
                memory_bytes: resources
                    .and_then(|r| r.requests.as_ref())
                    .and_then(|req| req.get("memory"))
                    .map(|q| quantity_to_bytes(Some(q))),
            }
        })
        .collect();

    let restart_count = status
        .container_statuses
        .as_ref()
        .map(|statuses| statuses.iter().map(|s| s.restart_count).sum())
        .unwrap_or(0);

    PodInfo {
        name: metadata.name.unwrap_or_default(),
        namespace: metadata.namespace.unwrap_or_else(|| "default".to_string()),
        phase: status.phase.unwrap_or_else(|| "Unknown".to_string()),
        labels: metadata.labels.unwrap_or_default().into_iter().collect(),
        annotations: metadata.annotations.unwrap_or_default().into_iter().collect(),
        owner_kind,
        owner_name,
        containers,
        restart_count,
    }
}

fn estimated_quota(pods: &[PodInfo]) -> Quota {
    let cpu_used: u64 = pods.iter().flat_map(|p| &p.containers).filter_map(|c| c.cpu_millicores).sum();
    let memory_used: u64 = pods.iter().flat_map(|p| &p.containers).filter_map(|c| c.memory_bytes).sum();
    Quota {
        cpu_limit_millicores: cpu_used.max(1000) * 4,
        memory_limit_bytes: memory_used.max(256 * 1024 * 1024) * 4,
        pod_count_limit: (pods.len() as u64).max(10) * 10,
        cpu_used_millicores: cpu_used,
        memory_used_bytes: memory_used,
        pods_used: pods.len() as u64,
        is_real: false,
    }
}

fn quantity_to_millicores(q: Option<&k8s_openapi::apimachinery::pkg::api::resource::Quantity>) -> u64 {
    let Some(q) = q else { return 0 };
    let s = q.0.trim();
    if let Some(v) = s.strip_suffix('m') {
        v.parse::<u64>().unwrap_or(0)
    } else {
        s.parse::<f64>().map(|c| (c * 1000.0) as u64).unwrap_or(0)
    }
}

fn quantity_to_bytes(q: Option<&k8s_openapi::apimachinery::pkg::api::resource::Quantity>) -> u64 {
    let Some(q) = q else { return 0 };
    let s = q.0.trim();
    let suffixes: &[(&str, u64)] = &[
        ("Ki", 1024),
        ("Mi", 1024 * 1024),
        ("Gi", 1024 * 1024 * 1024),
        ("Ti", 1024 * 1024 * 1024 * 1024),
        ("K", 1000),
        ("M", 1_000_000),
        ("G", 1_000_000_000),
    ];
    for (suffix, multiplier) in suffixes {
        if let Some(v) = s.strip_suffix(suffix) {
            return v.parse::<u64>().map(|n| n * multiplier).unwrap_or(0);
        }
    }
    s.parse::<u64>().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_healthy_cluster() {
        assert_eq!(classify_health(3, 0, 30, 0), ClusterHealthStatus::Healthy);
    }

    #[test]
    fn classifies_degraded_on_single_not_ready_node() {
        assert_eq!(classify_health(4, 1, 40, 0), ClusterHealthStatus::Degraded);
    }

    #[test]
    fn classifies_critical_above_quarter_not_ready() {
        assert_eq!(classify_health(4, 2, 40, 0), ClusterHealthStatus::Critical);
    }

    #[test]
    fn classifies_critical_above_tenth_pods_failed() {
        assert_eq!(classify_health(4, 0, 100, 15), ClusterHealthStatus::Critical);
    }

    #[test]
    fn classifies_unknown_with_zero_nodes() {
        assert_eq!(classify_health(0, 0, 0, 0), ClusterHealthStatus::Unknown);
    }

    #[test]
    fn parses_cpu_quantities() {
        assert_eq!(quantity_to_millicores(Some(&k8s_openapi::apimachinery::pkg::api::resource::Quantity("500m".into()))), 500);
        assert_eq!(quantity_to_millicores(Some(&k8s_openapi::apimachinery::pkg::api::resource::Quantity("2".into()))), 2000);
    }

    #[test]
    fn parses_memory_quantities() {
        assert_eq!(
            quantity_to_bytes(Some(&k8s_openapi::apimachinery::pkg::api::resource::Quantity("128Mi".into()))),
            128 * 1024 * 1024
        );
    }
}
