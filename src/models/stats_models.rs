// src/models/stats_models.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::models::matching::MatchMethodType;
use crate::normalization::SuffixAnchoring;

#[derive(Debug, Clone, Serialize)]
pub struct MatchMethodStats {
    pub method_type: MatchMethodType,
    pub threshold: f64,
    pub candidates_found: usize,
    pub candidates_accepted: usize,
    /// Unique transaction names this method won in the merge.
    pub matches_contributed: usize,
    pub avg_accepted_score: f64,
    pub processing_time_secs: f64,
}

impl MatchMethodStats {
    pub fn new(method_type: MatchMethodType, threshold: f64) -> Self {
        Self {
            method_type,
            threshold,
            candidates_found: 0,
            candidates_accepted: 0,
            matches_contributed: 0,
            avg_accepted_score: 0.0,
            processing_time_secs: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OverrideStats {
    pub false_positives_removed: usize,
    pub manual_matches_added: usize,
    /// Originals removed as false positives and then reinstated manually.
    pub reinstated: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputSignature {
    pub path: String,
    pub sha256: String,
    pub rows: usize,
}

/// Persisted as the optional JSON run summary.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub suffix_anchoring: SuffixAnchoring,
    pub inputs: Vec<InputSignature>,
    pub registry_entities: usize,
    pub transactions_total: usize,
    pub transactions_unique: usize,
    pub method_stats: Vec<MatchMethodStats>,
    pub overrides: OverrideStats,
    pub matched_unique: usize,
    pub unmatched_unique: usize,
    pub identification_rate_all: f64,
    pub identification_rate_unique: f64,
    pub phase_times_secs: BTreeMap<String, f64>,
    pub total_processing_time_secs: f64,
}
