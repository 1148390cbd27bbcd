//! `trigger-remediation` tool: classifies a workload's deployment method
//! from its labels/annotations, routes the requested action accordingly,
//! and — for routes that call out to the coordination service — submits
//! the remediation request.

use std::collections::BTreeMap;
use std::sync::Arc;

use cp_protocol::{Schema, ToolDescriptor};
use serde_json::{json, Value as JsonValue};

use crate::clients::coordination::{IssueRef, RemediationRequest, ResourceRef};
use crate::context::GatewayContext;
use crate::deployment::detector;
use crate::deployment::router::{self, RequestedAction, RoutingRequest};
use crate::error::GatewayError;
use crate::registry::tool::ToolHandler;

pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        "trigger-remediation",
        "Classify a workload's deployment method and route the requested remediation action",
        input_schema(),
    )
}

fn input_schema() -> Schema {
    Schema::object(
        [
            ("namespace".to_string(), Schema::string()),
            ("resourceKind".to_string(), Schema::string().with_default(json!("Pod"))),
            ("resourceName".to_string(), Schema::string()),
            ("incidentId".to_string(), Schema::string()),
            ("issueType".to_string(), Schema::string().with_default(json!("symptom"))),
            ("issueDescription".to_string(), Schema::string()),
            (
                "severity".to_string(),
                Schema::string().with_enum(vec![json!("low"), json!("medium"), json!("high"), json!("critical")]),
            ),
            (
                "action".to_string(),
                Schema::string().with_enum(vec![
                    json!("restart-pod"),
                    json!("rollout-restart"),
                    json!("scale"),
                    json!("scale-to-zero"),
                    json!("delete-resource"),
                    json!("update-image"),
                    json!("report-drift"),
                ]),
            ),
            ("labels".to_string(), Schema::object([], vec![])),
            ("annotations".to_string(), Schema::object([], vec![])),
            ("confirm".to_string(), Schema::boolean().with_default(json!(false))),
            ("dryRun".to_string(), Schema::boolean().with_default(json!(false))),
        ],
        vec!["namespace", "resourceName", "incidentId", "issueDescription", "severity", "action"],
    )
}

pub fn handler(ctx: Arc<GatewayContext>) -> ToolHandler {
    Arc::new(move |args: JsonValue| {
        let ctx = ctx.clone();
        Box::pin(async move {
            let namespace = required_str(&args, "namespace")?;
            let resource_kind = args.get("resourceKind").and_then(|v| v.as_str()).unwrap_or("Pod").to_string();
            let resource_name = required_str(&args, "resourceName")?;
            let incident_id = required_str(&args, "incidentId")?;
            let issue_type = args.get("issueType").and_then(|v| v.as_str()).unwrap_or("symptom").to_string();
            let issue_description = required_str(&args, "issueDescription")?;
            let severity = required_str(&args, "severity")?;
            let action = parse_action(&required_str(&args, "action")?)?;
            let confirm = args.get("confirm").and_then(|v| v.as_bool()).unwrap_or(false);
            let dry_run = args.get("dryRun").and_then(|v| v.as_bool()).unwrap_or(false);

            let labels = string_map(args.get("labels"));
            let annotations = string_map(args.get("annotations"));

            let target = format!("{namespace}/{resource_name}");
            let deployment_info = detector::detect(&labels, &annotations);

            let decision = router::route(RoutingRequest {
                classification: deployment_info.classification,
                managing_entity: deployment_info.managing_entity.as_deref(),
                requested_action: action,
                target: &target,
                operator_state: None,
                confirmed: confirm,
                dry_run,
            })?;

            let mut response = json!({
                "deploymentInfo": deployment_info,
                "routing": {
                    "action": decision.action,
                    "target": decision.target,
                    "directWrite": decision.direct_write,
                    "gitopsAdoptionRecommended": decision.gitops_adoption_recommended,
                    "planOnly": decision.plan_only,
                },
            });

            if !decision.plan_only && ctx.coordination.is_enabled() {
                let request = RemediationRequest {
                    incident_id,
                    namespace,
                    resource: ResourceRef { kind: resource_kind, name: resource_name },
                    issue: IssueRef { issue_type, description: issue_description, severity },
                    dry_run: Some(dry_run),
                };
                let coordination = &ctx.coordination;
                let remediation = ctx.coordination_breaker.call(|| coordination.trigger_remediation(&request)).await?;
                if let Some(object) = response.as_object_mut() {
                    object.insert(
                        "remediation".to_string(),
                        serde_json::to_value(&remediation).map_err(|e| GatewayError::Internal(e.to_string()))?,
                    );
                }
            }

            Ok(response)
        })
    })
}

fn parse_action(value: &str) -> Result<RequestedAction, GatewayError> {
    match value {
        "restart-pod" => Ok(RequestedAction::RestartPod),
        "rollout-restart" => Ok(RequestedAction::RolloutRestart),
        "scale" => Ok(RequestedAction::Scale),
        "scale-to-zero" => Ok(RequestedAction::ScaleToZero),
        "delete-resource" => Ok(RequestedAction::DeleteResource),
        "update-image" => Ok(RequestedAction::UpdateImage),
        "report-drift" => Ok(RequestedAction::ReportDrift),
        other => Err(GatewayError::InvalidArgument(format!("unknown action '{other}'"))),
    }
}

fn string_map(value: Option<&JsonValue>) -> BTreeMap<String, String> {
    value
        .and_then(|v| v.as_object())
        .map(|object| {
            object
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

fn required_str(args: &JsonValue, field: &str) -> Result<String, GatewayError> {
    args.get(field)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| GatewayError::InvalidArgument(format!("{field} is required")))
}
