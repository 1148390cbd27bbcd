//! Remediation routing table.
//!
//! Maps a [`DeploymentInfo`] classification plus a requested remediation
//! action to the action the gateway is actually permitted to take, applying
//! the safety gating (`confirmation-required`, `dry_run`) around risky
//! operations. Grounded on the coordination client's typed-request shape in
//! [`crate::clients::coordination`] — the router decides *what* request to
//! build, the client sends it.

use crate::error::GatewayError;
use crate::model::DeploymentClassification;

/// A symptom-level remediation action a caller is asking the gateway to
/// perform against a workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestedAction {
    RestartPod,
    RolloutRestart,
    Scale,
    ScaleToZero,
    DeleteResource,
    UpdateImage,
    ReportDrift,
}

impl RequestedAction {
    fn is_risky(self) -> bool {
        matches!(self, RequestedAction::ScaleToZero | RequestedAction::DeleteResource | RequestedAction::UpdateImage)
    }
}

#[derive(Debug, Clone)]
pub struct OperatorState {
    pub reconciling: bool,
    pub degraded_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct RoutingDecision {
    pub action: String,
    pub target: String,
    pub direct_write: bool,
    pub gitops_adoption_recommended: bool,
    pub plan_only: bool,
}

const OPERATOR_STUCK_THRESHOLD_SECONDS: u64 = 10 * 60;

pub struct RoutingRequest<'a> {
    pub classification: DeploymentClassification,
    pub managing_entity: Option<&'a str>,
    pub requested_action: RequestedAction,
    pub target: &'a str,
    pub operator_state: Option<OperatorState>,
    pub confirmed: bool,
    pub dry_run: bool,
}

/// Routes a requested remediation per the classification rules. Risky
/// actions without `confirmed` are refused with
/// [`GatewayError::ConfirmationRequired`] before the classification is even
/// consulted.
pub fn route(request: RoutingRequest<'_>) -> Result<RoutingDecision, GatewayError> {
    if request.requested_action.is_risky() && !request.confirmed {
        return Err(GatewayError::ConfirmationRequired(format!(
            "{:?} against {} requires explicit confirmation",
            request.requested_action, request.target
        )));
    }

    let decision = match request.classification {
        DeploymentClassification::Argocd => RoutingDecision {
            action: "trigger-sync".to_string(),
            target: request.managing_entity.unwrap_or(request.target).to_string(),
            direct_write: false,
            gitops_adoption_recommended: false,
            plan_only: request.dry_run,
        },
        DeploymentClassification::Helm => match request.requested_action {
            RequestedAction::RestartPod | RequestedAction::RolloutRestart => RoutingDecision {
                action: "restart-pod".to_string(),
                target: request.target.to_string(),
                direct_write: true,
                gitops_adoption_recommended: false,
                plan_only: request.dry_run,
            },
            _ => RoutingDecision {
                action: "recommend-helm-upgrade".to_string(),
                target: request.target.to_string(),
                direct_write: false,
                gitops_adoption_recommended: false,
                plan_only: true,
            },
        },
        DeploymentClassification::Operator => {
            let state = request.operator_state.unwrap_or(OperatorState { reconciling: false, degraded_seconds: 0 });
            if state.reconciling {
                RoutingDecision {
                    action: "wait-for-reconcile".to_string(),
                    target: request.target.to_string(),
                    direct_write: false,
                    gitops_adoption_recommended: false,
                    plan_only: true,
                }
            } else if state.degraded_seconds >= OPERATOR_STUCK_THRESHOLD_SECONDS {
                RoutingDecision {
                    action: "operator-stuck".to_string(),
                    target: request.target.to_string(),
                    direct_write: false,
                    gitops_adoption_recommended: false,
                    plan_only: true,
                }
            } else {
                RoutingDecision {
                    action: "monitor-operator".to_string(),
                    target: request.target.to_string(),
                    direct_write: false,
                    gitops_adoption_recommended: false,
                    plan_only: true,
                }
            }
        }
        DeploymentClassification::Manual => RoutingDecision {
            action: action_name(request.requested_action).to_string(),
            target: request.target.to_string(),
            direct_write: true,
            gitops_adoption_recommended: true,
            plan_only: request.dry_run,
        },
        DeploymentClassification::Unknown => RoutingDecision {
            action: "diagnostic-only".to_string(),
            target: request.target.to_string(),
            direct_write: false,
            gitops_adoption_recommended: false,
            plan_only: true,
        },
    };

    Ok(decision)
}

fn action_name(action: RequestedAction) -> &'static str {
    match action {
        RequestedAction::RestartPod => "restart-pod",
        RequestedAction::RolloutRestart => "rollout-restart",
        RequestedAction::Scale => "scale",
        RequestedAction::ScaleToZero => "scale-to-zero",
        RequestedAction::DeleteResource => "delete-resource",
        RequestedAction::UpdateImage => "update-image",
        RequestedAction::ReportDrift => "report-drift",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request(classification: DeploymentClassification, action: RequestedAction) -> RoutingRequest<'static> {
        RoutingRequest {
            classification,
            managing_entity: None,
            requested_action: action,
            target: "payments/api",
            operator_state: None,
            confirmed: false,
            dry_run: false,
        }
    }

    #[test]
    fn argocd_never_edits_the_workload_directly() {
        let decision = route(base_request(DeploymentClassification::Argocd, RequestedAction::RestartPod)).unwrap();
        assert_eq!(decision.action, "trigger-sync");
        assert!(!decision.direct_write);
    }

    #[test]
    fn helm_pod_symptom_restarts_safely() {
        let decision = route(base_request(DeploymentClassification::Helm, RequestedAction::RestartPod)).unwrap();
        assert_eq!(decision.action, "restart-pod");
        assert!(decision.direct_write);
    }

    #[test]
    fn helm_drift_only_recommends_upgrade() {
        let decision = route(base_request(DeploymentClassification::Helm, RequestedAction::ReportDrift)).unwrap();
        assert_eq!(decision.action, "recommend-helm-upgrade");
        assert!(!decision.direct_write);
    }

    #[test]
    fn operator_degraded_past_threshold_reports_stuck() {
        let mut request = base_request(DeploymentClassification::Operator, RequestedAction::RestartPod);
        request.operator_state = Some(OperatorState { reconciling: false, degraded_seconds: 700 });
        let decision = route(request).unwrap();
        assert_eq!(decision.action, "operator-stuck");
    }

    #[test]
    fn manual_permits_direct_remediation_with_gitops_recommendation() {
        let mut request = base_request(DeploymentClassification::Manual, RequestedAction::RestartPod);
        request.confirmed = true;
        let decision = route(request).unwrap();
        assert!(decision.direct_write);
        assert!(decision.gitops_adoption_recommended);
    }

    #[test]
    fn unknown_classification_is_diagnostic_only() {
        let decision = route(base_request(DeploymentClassification::Unknown, RequestedAction::RestartPod)).unwrap();
        assert_eq!(decision.action, "diagnostic-only");
        assert!(!decision.direct_write);
    }

    #[test]
    fn risky_action_without_confirmation_is_refused() {
        let request = base_request(DeploymentClassification::Manual, RequestedAction::DeleteResource);
        let result = route(request);
        assert!(matches!(result, Err(GatewayError::ConfirmationRequired(_))));
    }

    #[test]
    fn risky_action_with_confirmation_is_permitted() {
        let mut request = base_request(DeploymentClassification::Manual, RequestedAction::DeleteResource);
        request.confirmed = true;
        let decision = route(request).unwrap();
        assert_eq!(decision.action, "delete-resource");
    }

    #[test]
    fn dry_run_plans_without_effecting_change() {
        let mut request = base_request(DeploymentClassification::Manual, RequestedAction::RestartPod);
        request.confirmed = true;
        request.dry_run = true;
        let decision = route(request).unwrap();
        assert!(decision.plan_only);
    }
}
