//! Resource-usage trend projection.
//!
//! Generalizes the teacher's `analyzer::k8s_optimize::trend_analyzer`
//! (`analyze_trends_from_live`, which reports only a current-state
//! direction label) into a data-driven ordinary-least-squares slope
//! projection over historical daily usage samples.

use crate::model::TrendProjection;

#[derive(Debug, Clone, Copy)]
pub struct DailyUsageSample {
    pub cpu_percent: f64,
    pub memory_percent: f64,
}

const CONSERVATIVE_CPU_PER_DAY: f64 = 1.0;
const CONSERVATIVE_MEMORY_PER_DAY: f64 = 1.5;
const TARGET_PERCENT: f64 = 85.0;
const MAX_DAYS: u32 = 365;

/// Trending with fewer than 2 samples is undefined in the source this was
/// distilled from; treated here as "insufficient data" with conservative
/// defaults per the open-question resolution.
pub fn project(history: &[DailyUsageSample]) -> TrendProjection {
    if history.len() < 2 {
        return TrendProjection {
            cpu_percent_per_day: CONSERVATIVE_CPU_PER_DAY,
            memory_percent_per_day: CONSERVATIVE_MEMORY_PER_DAY,
            days_until_85_percent: days_until_target(
                history.last().map(|s| s.cpu_percent).unwrap_or(0.0).max(
                    history.last().map(|s| s.memory_percent).unwrap_or(0.0),
                ),
                CONSERVATIVE_CPU_PER_DAY.max(CONSERVATIVE_MEMORY_PER_DAY),
            ),
            insufficient_data: true,
        };
    }

    let cpu: Vec<f64> = history.iter().map(|s| s.cpu_percent).collect();
    let memory: Vec<f64> = history.iter().map(|s| s.memory_percent).collect();

    let cpu_slope = round_to_hundredths(ols_slope(&cpu));
    let memory_slope = round_to_hundredths(ols_slope(&memory));

    let latest_cpu = *cpu.last().unwrap();
    let latest_memory = *memory.last().unwrap();

    let cpu_days = days_until_target(latest_cpu, cpu_slope);
    let memory_days = days_until_target(latest_memory, memory_slope);

    TrendProjection {
        cpu_percent_per_day: cpu_slope,
        memory_percent_per_day: memory_slope,
        days_until_85_percent: cpu_days.min(memory_days),
        insufficient_data: false,
    }
}

/// Ordinary-least-squares slope of `y` against the sample index `0..n`.
fn ols_slope(y: &[f64]) -> f64 {
    let n = y.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = y.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, &yi) in y.iter().enumerate() {
        let xi = i as f64;
        numerator += (xi - x_mean) * (yi - y_mean);
        denominator += (xi - x_mean).powi(2);
    }
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn days_until_target(current: f64, slope_per_day: f64) -> u32 {
    if slope_per_day <= 0.0 || current >= TARGET_PERCENT {
        return if current >= TARGET_PERCENT { 0 } else { MAX_DAYS };
    }
    let days = (TARGET_PERCENT - current) / slope_per_day;
    if days.is_finite() {
        (days.round() as u32).min(MAX_DAYS)
    } else {
        MAX_DAYS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_history_uses_conservative_defaults() {
        let result = project(&[]);
        assert!(result.insufficient_data);
        assert_eq!(result.cpu_percent_per_day, CONSERVATIVE_CPU_PER_DAY);
        assert_eq!(result.memory_percent_per_day, CONSERVATIVE_MEMORY_PER_DAY);

        let single = project(&[DailyUsageSample { cpu_percent: 50.0, memory_percent: 40.0 }]);
        assert!(single.insufficient_data);
    }

    #[test]
    fn steady_linear_growth_projects_days_until_85_percent() {
        let history: Vec<DailyUsageSample> = (0..10)
            .map(|i| DailyUsageSample { cpu_percent: 50.0 + i as f64, memory_percent: 40.0 })
            .collect();
        let result = project(&history);
        assert!(!result.insufficient_data);
        assert!((result.cpu_percent_per_day - 1.0).abs() < 0.01);
        // latest cpu = 59%, slope 1%/day -> 26 days to 85%
        assert_eq!(result.days_until_85_percent, 26);
    }

    #[test]
    fn flat_history_projects_max_days() {
        let history = vec![
            DailyUsageSample { cpu_percent: 30.0, memory_percent: 30.0 },
            DailyUsageSample { cpu_percent: 30.0, memory_percent: 30.0 },
        ];
        let result = project(&history);
        assert_eq!(result.days_until_85_percent, MAX_DAYS);
    }
}
