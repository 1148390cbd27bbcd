//! Pod-capacity calculator.
//!
//! Generalizes the percentile-based right-sizing arithmetic of the
//! teacher's `analyzer::k8s_optimize::types` (`ResourceUsage`) and the
//! deterministic explanation-string construction of `cost_calculator.rs`
//! into the quota-driven max/safe-pod-count computation named in the spec.

use crate::model::{
    AvailableCapacity, CapacityResult, CurrentUsage, LimitingFactor, PodProfile, ProfileEstimate, Quota,
};

use super::trending::{self, DailyUsageSample};

/// `safe_margin` in [0, 0.5] (fraction withheld from `max` to yield `safe`).
pub fn calculate(
    quota: &Quota,
    profiles: &[(&str, PodProfile)],
    safety_margin: f64,
    history: &[DailyUsageSample],
) -> CapacityResult {
    let available = available_capacity(quota);

    let profile_estimates: Vec<ProfileEstimate> = profiles
        .iter()
        .map(|(name, profile)| estimate_for_profile(name, *profile, &available, safety_margin))
        .collect();

    // Highest safe pod count wins; ties broken by lower memory footprint,
    // then lower CPU footprint, so the recommendation favors the cheaper
    // profile when two profiles fit the quota equally well.
    let recommended_limit = profiles
        .iter()
        .zip(profile_estimates.iter())
        .max_by(|(a_profile, a_estimate), (b_profile, b_estimate)| {
            a_estimate
                .safe_pods
                .cmp(&b_estimate.safe_pods)
                .then(b_profile.1.memory_mb.cmp(&a_profile.1.memory_mb))
                .then(b_profile.1.cpu_millicores.cmp(&a_profile.1.cpu_millicores))
        })
        .map(|(_, estimate)| estimate.clone())
        .unwrap_or(ProfileEstimate {
            profile: "custom".to_string(),
            max_pods: 0,
            safe_pods: 0,
            limiting_factor: LimitingFactor::PodCount,
        });

    let current_usage = CurrentUsage {
        cpu_percent: percent(quota.cpu_used_millicores, quota.cpu_limit_millicores),
        memory_percent: percent(quota.memory_used_bytes, quota.memory_limit_bytes),
        pods_percent: percent(quota.pods_used, quota.pod_count_limit),
    };

    let trending = trending::project(history);

    let explanation = explain(&recommended_limit, &current_usage);
    let recommendation = recommend(&recommended_limit, &current_usage);

    CapacityResult {
        quota: *quota,
        current_usage,
        available,
        profile_estimates,
        recommended_limit,
        explanation,
        trending,
        recommendation,
    }
}

fn available_capacity(quota: &Quota) -> AvailableCapacity {
    AvailableCapacity {
        cpu_millicores: quota.cpu_limit_millicores.saturating_sub(quota.cpu_used_millicores),
        memory_bytes: quota.memory_limit_bytes.saturating_sub(quota.memory_used_bytes),
        pod_slots: quota.pod_count_limit.saturating_sub(quota.pods_used),
    }
}

fn estimate_for_profile(
    name: &str,
    profile: PodProfile,
    available: &AvailableCapacity,
    safety_margin: f64,
) -> ProfileEstimate {
    let pods_by_cpu = if profile.cpu_millicores == 0 {
        available.pod_slots
    } else {
        available.cpu_millicores / profile.cpu_millicores
    };
    let pods_by_memory = if profile.memory_bytes() == 0 {
        available.pod_slots
    } else {
        available.memory_bytes / profile.memory_bytes()
    };
    let pods_by_slots = available.pod_slots;

    let (max_pods, limiting_factor) = min_with_tie_break(pods_by_cpu, pods_by_memory, pods_by_slots);
    let safe_pods = (max_pods as f64 * (1.0 - safety_margin)).floor() as u64;

    ProfileEstimate {
        profile: name.to_string(),
        max_pods,
        safe_pods,
        limiting_factor,
    }
}

/// `max = min(pods_by_cpu, pods_by_memory, pods_by_slots)`; ties broken in
/// order `{pod_count, memory, cpu}` per the spec's pinned tie-break.
fn min_with_tie_break(pods_by_cpu: u64, pods_by_memory: u64, pods_by_slots: u64) -> (u64, LimitingFactor) {
    let candidates = [
        (pods_by_slots, LimitingFactor::PodCount),
        (pods_by_memory, LimitingFactor::Memory),
        (pods_by_cpu, LimitingFactor::Cpu),
    ];
    let min_value = candidates.iter().map(|(v, _)| *v).min().unwrap_or(0);
    let limiting_factor = candidates
        .into_iter()
        .find(|(v, _)| *v == min_value)
        .map(|(_, factor)| factor)
        .unwrap_or(LimitingFactor::PodCount);
    (min_value, limiting_factor)
}

fn percent(used: u64, limit: u64) -> f64 {
    if limit == 0 {
        0.0
    } else {
        (used as f64 / limit as f64) * 100.0
    }
}

fn explain(estimate: &ProfileEstimate, usage: &CurrentUsage) -> String {
    format!(
        "profile {} fits {} pods at max capacity (limited by {:?}), {} after the safety margin; current usage is {:.1}% CPU / {:.1}% memory",
        estimate.profile, estimate.max_pods, estimate.limiting_factor, estimate.safe_pods, usage.cpu_percent, usage.memory_percent
    )
}

fn recommend(estimate: &ProfileEstimate, usage: &CurrentUsage) -> String {
    if usage.cpu_percent >= 90.0 || usage.memory_percent >= 90.0 {
        format!(
            "namespace is near capacity ({:.1}% CPU / {:.1}% memory); avoid scaling beyond {} additional {} pods",
            usage.cpu_percent, usage.memory_percent, estimate.safe_pods, estimate.profile
        )
    } else {
        format!(
            "up to {} additional {} pods can be scheduled safely",
            estimate.safe_pods, estimate.profile
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn medium_pods_cpu_bound_example() {
        let quota = Quota {
            cpu_limit_millicores: 4000,
            cpu_used_millicores: 1000,
            memory_limit_bytes: 8 * 1024 * 1024 * 1024,
            memory_used_bytes: 2 * 1024 * 1024 * 1024,
            pod_count_limit: 100,
            pods_used: 10,
            is_real: true,
        };
        let profiles = [("medium", PodProfile { cpu_millicores: 200, memory_mb: 128 })];
        let result = calculate(&quota, &profiles, 0.15, &[]);
        let estimate = &result.profile_estimates[0];
        assert_eq!(estimate.max_pods, 15);
        assert_eq!(estimate.safe_pods, 12);
        assert_eq!(estimate.limiting_factor, LimitingFactor::Cpu);
    }

    #[test]
    fn safety_margin_zero_yields_safe_equals_max() {
        let quota = Quota {
            cpu_limit_millicores: 4000,
            cpu_used_millicores: 0,
            memory_limit_bytes: 8 * 1024 * 1024 * 1024,
            memory_used_bytes: 0,
            pod_count_limit: 100,
            pods_used: 0,
            is_real: true,
        };
        let profiles = [("medium", PodProfile::MEDIUM)];
        let result = calculate(&quota, &profiles, 0.0, &[]);
        assert_eq!(result.profile_estimates[0].safe_pods, result.profile_estimates[0].max_pods);
    }

    #[test]
    fn safety_margin_half_halves_max() {
        let quota = Quota {
            cpu_limit_millicores: 4000,
            cpu_used_millicores: 0,
            memory_limit_bytes: 80 * 1024 * 1024 * 1024,
            memory_used_bytes: 0,
            pod_count_limit: 1000,
            pods_used: 0,
            is_real: true,
        };
        let profiles = [("medium", PodProfile::MEDIUM)];
        let result = calculate(&quota, &profiles, 0.5, &[]);
        let estimate = &result.profile_estimates[0];
        assert_eq!(estimate.safe_pods, estimate.max_pods / 2);
    }

    #[test]
    fn available_capacity_is_clamped_to_zero_when_over_used() {
        let quota = Quota {
            cpu_limit_millicores: 1000,
            cpu_used_millicores: 2000,
            memory_limit_bytes: 1024,
            memory_used_bytes: 2048,
            pod_count_limit: 5,
            pods_used: 10,
            is_real: true,
        };
        let available = available_capacity(&quota);
        assert_eq!(available.cpu_millicores, 0);
        assert_eq!(available.memory_bytes, 0);
        assert_eq!(available.pod_slots, 0);
    }

    #[test]
    fn tie_break_order_is_pod_count_memory_cpu() {
        let (value, factor) = min_with_tie_break(5, 5, 5);
        assert_eq!(value, 5);
        assert_eq!(factor, LimitingFactor::PodCount);

        let (_, factor) = min_with_tie_break(10, 5, 5);
        assert_eq!(factor, LimitingFactor::PodCount);

        let (_, factor) = min_with_tie_break(10, 5, 10);
        assert_eq!(factor, LimitingFactor::Memory);
    }
}
