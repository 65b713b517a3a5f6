// src/utils/logging.rs - Logging helpers shared by the matchers
use log::{debug, info, warn};
use std::time::Instant;

use crate::models::matching::MatchMethodType;

#[derive(Clone)]
pub struct MatchingLogger {
    method_name: &'static str,
    method_emoji: &'static str,
    start_time: Instant,
}

impl MatchingLogger {
    pub fn new(method_type: MatchMethodType) -> Self {
        let (method_name, method_emoji) = match method_type {
            MatchMethodType::FuzzyJoin => ("FUZZY_JOIN", "🔗"),
            MatchMethodType::StringGrouper => ("STRING_GROUPER", "🧮"),
            MatchMethodType::NearestNeighbor => ("NEAREST_NEIGHBOR", "⚙️"),
        };

        Self {
            method_name,
            method_emoji,
            start_time: Instant::now(),
        }
    }

    pub fn log_start(&self, transactions: usize, registry: usize) {
        info!(
            "[{}] {} 🚀 Starting {} matching: {} unique transaction names against {} registry names",
            self.method_name,
            self.method_emoji,
            self.method_name.to_lowercase(),
            transactions,
            registry
        );
    }

    pub fn log_disabled(&self) {
        info!(
            "[{}] {} ⏭️  Matcher is not wired into the pipeline, producing no candidates",
            self.method_name, self.method_emoji
        );
    }

    pub fn log_phase(&self, phase: &str, details: Option<&str>) {
        let elapsed = self.start_time.elapsed();
        let msg = if let Some(details) = details {
            format!(
                "[{}] {} 🔄 Phase: {} - {} [+{:.1}s]",
                self.method_name, self.method_emoji, phase, details, elapsed.as_secs_f32()
            )
        } else {
            format!(
                "[{}] {} 🔄 Phase: {} [+{:.1}s]",
                self.method_name, self.method_emoji, phase, elapsed.as_secs_f32()
            )
        };
        info!("{}", msg);
    }

    pub fn log_index_built(&self, features: usize, postings: usize) {
        info!(
            "[{}] {} 📊 Index built: {} distinct features, {} postings",
            self.method_name, self.method_emoji, features, postings
        );
    }

    pub fn log_null_keys_skipped(&self, left: usize, right: usize) {
        if left + right > 0 {
            warn!(
                "[{}] {} 🚫 Skipped {} transaction and {} registry names that normalized to nothing",
                self.method_name, self.method_emoji, left, right
            );
        }
    }

    pub fn log_candidates(&self, candidates: usize, rows_with_candidates: usize, rows: usize) {
        let coverage = if rows > 0 {
            (rows_with_candidates as f64 / rows as f64) * 100.0
        } else {
            0.0
        };
        info!(
            "[{}] {} 📈 {} candidates for {}/{} transaction names ({:.1}% coverage)",
            self.method_name, self.method_emoji, candidates, rows_with_candidates, rows, coverage
        );
    }

    pub fn log_threshold_results(&self, threshold: f64, found: usize, accepted: usize) {
        info!(
            "[{}] {} 🎯 Threshold {:.2}: {} of {} candidates accepted",
            self.method_name, self.method_emoji, threshold, accepted, found
        );
    }

    pub fn log_completion(&self, candidates: usize, avg_score: f64) {
        let duration = self.start_time.elapsed();
        info!(
            "[{}] {} 🎉 COMPLETED: {} candidates in {:.2?} (avg score: {:.3})",
            self.method_name, self.method_emoji, candidates, duration, avg_score
        );
    }

    pub fn log_debug(&self, message: &str) {
        debug!("[{}] {} {}", self.method_name, self.method_emoji, message);
    }
}
