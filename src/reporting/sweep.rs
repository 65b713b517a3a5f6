// src/reporting/sweep.rs
use std::collections::HashSet;

use crate::matching::manager::MatcherRun;
use crate::models::matching::MatchCandidate;

/// 0.50, 0.55, ... 0.95
pub fn default_tiers() -> Vec<f64> {
    (0..10).map(|i| (50 + 5 * i) as f64 / 100.0).collect()
}

#[derive(Debug, Clone)]
pub struct ThresholdTier {
    pub threshold: f64,
    /// Unique transaction names with at least one candidate at or above the threshold.
    pub accepted_names: usize,
    /// Candidates scoring in `[threshold, next tier)`.
    pub samples: Vec<MatchCandidate>,
}

pub fn sweep_tiers(run: &MatcherRun, tiers: &[f64], sample_size: usize) -> Vec<ThresholdTier> {
    tiers
        .iter()
        .enumerate()
        .map(|(i, &threshold)| {
            let upper = tiers.get(i + 1).copied().unwrap_or(f64::INFINITY);
            let accepted_names = run
                .candidates
                .iter()
                .filter(|c| c.score >= threshold)
                .map(|c| c.left_index)
                .collect::<HashSet<_>>()
                .len();
            let samples = run
                .candidates
                .iter()
                .filter(|c| c.score >= threshold && c.score < upper)
                .take(sample_size)
                .cloned()
                .collect();
            ThresholdTier {
                threshold,
                accepted_names,
                samples,
            }
        })
        .collect()
}
