//! Scaling-impact analyzer.
//!
//! Generalizes the waste/warning composition style of the teacher's
//! `trend_analyzer::analyze_trends_from_live` (threshold-driven warning
//! labels derived from a waste percentage) into the replica-scaling impact
//! classification named in the spec.

use crate::model::{AlternativeScenario, InfraImpact, LimitingFactor, Quota, ScalingImpactResult};

const DEFAULT_GROWTH_COEFFICIENT: f64 = 1.05;
const CRITICAL_USAGE_PERCENT: f64 = 95.0;
const LOW_HEADROOM_PERCENT: f64 = 10.0;
const ALTERNATIVE_SAFE_CEILING: f64 = 85.0;

const INFRA_NAMESPACES: &[&str] = &["monitoring", "etcd", "apiserver", "scheduler"];

#[derive(Debug, Clone, Copy)]
pub struct RepresentativePodMetrics {
    pub cpu_millicores: u64,
    pub memory_bytes: u64,
}

pub struct ScalingImpactInput<'a> {
    pub namespace: &'a str,
    pub current_replicas: u32,
    pub target_replicas: u32,
    pub per_pod: RepresentativePodMetrics,
    pub quota: Quota,
    pub growth_coefficient: Option<f64>,
    pub analyzed_at: String,
}

pub fn analyze(input: ScalingImpactInput<'_>) -> ScalingImpactResult {
    let growth = input.growth_coefficient.unwrap_or(DEFAULT_GROWTH_COEFFICIENT);
    let delta = input.target_replicas as i64 - input.current_replicas as i64;

    let (projected_cpu, projected_memory) = project_usage(&input.per_pod, input.target_replicas, growth, delta);
    let (precise_cpu, precise_memory) = project_usage_precise(&input.per_pod, input.target_replicas, growth, delta);

    // Percentages are derived from the unrounded projection so that two axes
    // scaled by the same growth factor from proportionally equal quota
    // shares compare as a true tie rather than an artifact of millicore/byte
    // rounding.
    let cpu_percent = precise_percent(precise_cpu, input.quota.cpu_limit_millicores);
    let memory_percent = precise_percent(precise_memory, input.quota.memory_limit_bytes);
    let (projected_usage_percent, limiting_factor) = if cpu_percent >= memory_percent {
        (cpu_percent, LimitingFactor::Cpu)
    } else {
        (memory_percent, LimitingFactor::Memory)
    };

    let quota_exceeded =
        projected_cpu > input.quota.cpu_limit_millicores || projected_memory > input.quota.memory_limit_bytes;

    let infra_impact = classify_infra_impact(delta, input.namespace);

    let mut warnings = Vec::new();
    if projected_usage_percent >= CRITICAL_USAGE_PERCENT {
        warnings.push(format!("CRITICAL: projected usage at {:.1}%", projected_usage_percent));
    }
    if 100.0 - projected_usage_percent < LOW_HEADROOM_PERCENT {
        warnings.push(format!(
            "low headroom: only {:.1}% remaining",
            (100.0 - projected_usage_percent).max(0.0)
        ));
    }
    if quota_exceeded {
        warnings.push(format!("quota exceeded on {:?}", limiting_factor));
    }
    if infra_impact == InfraImpact::High {
        for keyword in ["etcd", "apiserver", "scheduler"] {
            if input.namespace.contains(keyword) {
                warnings.push(format!("infra-high-{keyword}"));
            }
        }
    }

    let recommendation = recommend(quota_exceeded, projected_usage_percent, &limiting_factor, &warnings, input.target_replicas);

    let alternatives = if quota_exceeded || projected_usage_percent >= CRITICAL_USAGE_PERCENT {
        find_alternatives(&input.per_pod, &input.quota, growth, input.current_replicas, input.target_replicas)
    } else {
        Vec::new()
    };

    ScalingImpactResult {
        current_replicas: input.current_replicas,
        target_replicas: input.target_replicas,
        projected_cpu_millicores: projected_cpu,
        projected_memory_bytes: projected_memory,
        quota_exceeded,
        projected_usage_percent,
        limiting_factor,
        infrastructure_impact: infra_impact,
        warnings,
        recommendation,
        alternatives,
        analyzed_at: input.analyzed_at,
    }
}

fn project_usage(per_pod: &RepresentativePodMetrics, target_replicas: u32, growth: f64, delta: i64) -> (u64, u64) {
    let growth_factor = if delta > 0 { growth.powi(delta as i32) } else { 1.0 };
    let per_pod_cpu = per_pod.cpu_millicores as f64 * growth_factor;
    let per_pod_memory = per_pod.memory_bytes as f64 * growth_factor;
    (
        (per_pod_cpu * target_replicas as f64).round() as u64,
        (per_pod_memory * target_replicas as f64).round() as u64,
    )
}

fn percent(used: u64, limit: u64) -> f64 {
    if limit == 0 {
        0.0
    } else {
        (used as f64 / limit as f64) * 100.0
    }
}

fn project_usage_precise(per_pod: &RepresentativePodMetrics, target_replicas: u32, growth: f64, delta: i64) -> (f64, f64) {
    let growth_factor = if delta > 0 { growth.powi(delta as i32) } else { 1.0 };
    let per_pod_cpu = per_pod.cpu_millicores as f64 * growth_factor;
    let per_pod_memory = per_pod.memory_bytes as f64 * growth_factor;
    (per_pod_cpu * target_replicas as f64, per_pod_memory * target_replicas as f64)
}

fn precise_percent(used: f64, limit: u64) -> f64 {
    if limit == 0 {
        0.0
    } else {
        (used / limit as f64) * 100.0
    }
}

/// `high` when delta replicas >= 10; `medium` when delta >= 5 or the
/// namespace is in the infrastructure set; otherwise `low`.
fn classify_infra_impact(delta: i64, namespace: &str) -> InfraImpact {
    let delta_abs = delta.unsigned_abs();
    if delta_abs >= 10 {
        InfraImpact::High
    } else if delta_abs >= 5 || INFRA_NAMESPACES.iter().any(|ns| namespace.contains(ns)) {
        InfraImpact::Medium
    } else {
        InfraImpact::Low
    }
}

fn recommend(
    quota_exceeded: bool,
    projected_usage_percent: f64,
    limiting_factor: &LimitingFactor,
    warnings: &[String],
    target_replicas: u32,
) -> String {
    if quota_exceeded {
        format!(
            "scaling to {target_replicas} replicas will exceed quota (limiting factor: {limiting_factor:?}); reduce the target replica count or raise the quota"
        )
    } else if projected_usage_percent >= CRITICAL_USAGE_PERCENT {
        format!("scaling to {target_replicas} replicas is critical at {projected_usage_percent:.1}% projected usage")
    } else if !warnings.is_empty() {
        format!("scaling to {target_replicas} replicas is possible but should be monitored closely")
    } else {
        format!("scaling to {target_replicas} replicas is safe")
    }
}

fn find_alternatives(
    per_pod: &RepresentativePodMetrics,
    quota: &Quota,
    growth: f64,
    current_replicas: u32,
    target_replicas: u32,
) -> Vec<AlternativeScenario> {
    let (low, high) = if current_replicas < target_replicas {
        (current_replicas, target_replicas)
    } else {
        (target_replicas, current_replicas)
    };

    let mut alternatives = Vec::new();
    for replicas in (low..=high).rev() {
        if replicas == target_replicas {
            continue;
        }
        let delta = replicas as i64 - current_replicas as i64;
        let (cpu, memory) = project_usage(per_pod, replicas, growth, delta);
        let cpu_pct = percent(cpu, quota.cpu_limit_millicores);
        let mem_pct = percent(memory, quota.memory_limit_bytes);
        let usage_pct = cpu_pct.max(mem_pct);
        if usage_pct <= ALTERNATIVE_SAFE_CEILING {
            alternatives.push(AlternativeScenario {
                replicas,
                projected_usage_percent: usage_pct,
                safe: true,
            });
        }
        if alternatives.len() >= 3 {
            break;
        }
    }
    alternatives
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quota() -> Quota {
        Quota {
            cpu_limit_millicores: 4000,
            memory_limit_bytes: 4 * 1024 * 1024 * 1024,
            pod_count_limit: 100,
            cpu_used_millicores: 2500,
            memory_used_bytes: 2560 * 1024 * 1024,
            pods_used: 5,
            is_real: true,
        }
    }

    #[test]
    fn quota_exceeded_scenario() {
        let input = ScalingImpactInput {
            namespace: "payments",
            current_replicas: 5,
            target_replicas: 20,
            per_pod: RepresentativePodMetrics { cpu_millicores: 500, memory_bytes: 512 * 1024 * 1024 },
            quota: quota(),
            growth_coefficient: Some(1.05),
            analyzed_at: "2026-07-31T00:00:00Z".to_string(),
        };
        let result = analyze(input);
        assert!(result.quota_exceeded);
        assert_eq!(result.limiting_factor, LimitingFactor::Cpu);
        assert!(result.projected_usage_percent >= 250.0);
        assert!(result.warnings.iter().any(|w| w.contains("CRITICAL")));
        assert!(result.warnings.iter().any(|w| w.to_lowercase().contains("quota")));
        assert!(result.recommendation.contains("exceed quota"));
        assert!(result.recommendation.contains("Cpu") || result.recommendation.contains("cpu"));
    }

    #[test]
    fn no_change_when_target_equals_current() {
        let input = ScalingImpactInput {
            namespace: "payments",
            current_replicas: 5,
            target_replicas: 5,
            per_pod: RepresentativePodMetrics { cpu_millicores: 100, memory_bytes: 128 * 1024 * 1024 },
            quota: quota(),
            growth_coefficient: None,
            analyzed_at: "2026-07-31T00:00:00Z".to_string(),
        };
        let result = analyze(input);
        assert!(!result.quota_exceeded);
        assert!(result.warnings.is_empty());
        assert!(result.recommendation.contains("safe"));
    }

    #[test]
    fn high_infra_impact_at_large_delta() {
        assert_eq!(classify_infra_impact(12, "payments"), InfraImpact::High);
        assert_eq!(classify_infra_impact(6, "payments"), InfraImpact::Medium);
        assert_eq!(classify_infra_impact(1, "monitoring"), InfraImpact::Medium);
        assert_eq!(classify_infra_impact(1, "payments"), InfraImpact::Low);
    }
}
