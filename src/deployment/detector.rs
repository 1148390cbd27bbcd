//! Deployment-method classifier.
//!
//! Reads a resource's labels/annotations the same way the teacher's
//! `metrics_client::get_pod_resources` pulls `owner_references` straight off
//! pod metadata maps, applying the detection rules in a fixed evaluation
//! order instead of a single field lookup.

use std::collections::BTreeMap;

use crate::model::{DeploymentClassification, DeploymentInfo};

const ARGOCD_TRACKING_ANNOTATION: &str = "argocd.argoproj.io/tracking-id";
const ARGOCD_INSTANCE_LABEL: &str = "app.kubernetes.io/instance";
const ARGOCD_APP_LABEL: &str = "argocd.argoproj.io/instance";
const HELM_RELEASE_ANNOTATION: &str = "meta.helm.sh/release-name";
const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

const KNOWN_OPERATORS: &[&str] = &["olm", "operator-lifecycle-manager", "operator-sdk"];

/// Evaluates the detection rules, in order, against a resource's labels and
/// annotations. Pure function of its inputs: identical labels/annotations
/// always classify identically.
pub fn detect(labels: &BTreeMap<String, String>, annotations: &BTreeMap<String, String>) -> DeploymentInfo {
    if let Some(app_name) = annotations.get(ARGOCD_TRACKING_ANNOTATION) {
        let app_name = app_name.split(':').next().unwrap_or(app_name).to_string();
        return DeploymentInfo {
            classification: DeploymentClassification::Argocd,
            managed: true,
            source: annotations.get("argocd.argoproj.io/source-repo-url").cloned(),
            managing_entity: Some(app_name),
        };
    }

    if labels.contains_key(ARGOCD_APP_LABEL) {
        return DeploymentInfo {
            classification: DeploymentClassification::Argocd,
            managed: true,
            source: None,
            managing_entity: labels.get(ARGOCD_APP_LABEL).cloned(),
        };
    }

    if let Some(release) = annotations.get(HELM_RELEASE_ANNOTATION) {
        let gitops_wrapped = labels.contains_key(ARGOCD_INSTANCE_LABEL);
        return DeploymentInfo {
            classification: DeploymentClassification::Helm,
            managed: gitops_wrapped,
            source: None,
            managing_entity: Some(release.clone()),
        };
    }

    if let Some(manager) = labels.get(MANAGED_BY_LABEL)
        && is_operator(manager)
    {
        return DeploymentInfo {
            classification: DeploymentClassification::Operator,
            managed: true,
            source: None,
            managing_entity: Some(manager.clone()),
        };
    }

    DeploymentInfo {
        classification: DeploymentClassification::Manual,
        managed: false,
        source: None,
        managing_entity: None,
    }
}

fn is_operator(manager: &str) -> bool {
    KNOWN_OPERATORS.contains(&manager) || manager.ends_with("-operator") || manager.contains("operator")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn gitops_tracking_annotation_wins_over_everything() {
        let labels = map(&[(MANAGED_BY_LABEL, "some-operator")]);
        let annotations = map(&[(ARGOCD_TRACKING_ANNOTATION, "payments:Deployment:payments/api")]);
        let info = detect(&labels, &annotations);
        assert_eq!(info.classification, DeploymentClassification::Argocd);
        assert!(info.managed);
        assert_eq!(info.managing_entity.as_deref(), Some("payments"));
    }

    #[test]
    fn gitops_instance_label_alone_classifies_argocd() {
        let labels = map(&[(ARGOCD_APP_LABEL, "payments-app")]);
        let info = detect(&labels, &BTreeMap::new());
        assert_eq!(info.classification, DeploymentClassification::Argocd);
        assert!(info.managed);
    }

    #[test]
    fn helm_release_without_gitops_wrapping_is_not_managed() {
        let annotations = map(&[(HELM_RELEASE_ANNOTATION, "payments-release")]);
        let info = detect(&BTreeMap::new(), &annotations);
        assert_eq!(info.classification, DeploymentClassification::Helm);
        assert!(!info.managed);
    }

    #[test]
    fn helm_release_wrapped_by_gitops_is_managed() {
        let labels = map(&[(ARGOCD_INSTANCE_LABEL, "payments")]);
        let annotations = map(&[(HELM_RELEASE_ANNOTATION, "payments-release")]);
        let info = detect(&labels, &annotations);
        assert_eq!(info.classification, DeploymentClassification::Helm);
        assert!(info.managed);
    }

    #[test]
    fn managed_by_operator_label_classifies_operator() {
        let labels = map(&[(MANAGED_BY_LABEL, "postgres-operator")]);
        let info = detect(&labels, &BTreeMap::new());
        assert_eq!(info.classification, DeploymentClassification::Operator);
        assert!(info.managed);
    }

    #[test]
    fn no_recognized_markers_classifies_manual() {
        let labels = map(&[("app", "payments")]);
        let info = detect(&labels, &BTreeMap::new());
        assert_eq!(info.classification, DeploymentClassification::Manual);
        assert!(!info.managed);
    }

    #[test]
    fn same_input_classifies_identically_every_time() {
        let labels = map(&[(ARGOCD_APP_LABEL, "payments-app")]);
        let first = detect(&labels, &BTreeMap::new());
        let second = detect(&labels, &BTreeMap::new());
        assert_eq!(first.classification, second.classification);
        assert_eq!(first.managed, second.managed);
    }
}
