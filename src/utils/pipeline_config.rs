// src/utils/pipeline_config.rs
use log::{debug, info, warn};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::PipelineError;
use crate::normalization::SuffixAnchoring;
use crate::utils::constants::{
    DEFAULT_DISCOVERY_FLOOR, DEFAULT_MAX_MATCHES_PER_ROW, DEFAULT_NGRAM_SIZE,
};
use crate::utils::progress_config::ProgressConfig;

#[derive(Debug, Clone)]
pub struct InputPaths {
    pub registry: PathBuf,
    pub transactions: PathBuf,
    pub manual_matches: Option<PathBuf>,
    pub false_positives: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub matched_unique: PathBuf,
    pub unmatched: PathBuf,
    pub matched_all: Option<PathBuf>,
    pub summary: Option<PathBuf>,
    pub candidates_dir: Option<PathBuf>,
}

impl OutputPaths {
    /// Table outputs without an extension are written as `.csv`.
    pub fn new(
        matched_unique: PathBuf,
        unmatched: PathBuf,
        matched_all: Option<PathBuf>,
        summary: Option<PathBuf>,
        candidates_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            matched_unique: with_csv_extension(&matched_unique),
            unmatched: with_csv_extension(&unmatched),
            matched_all: matched_all.as_deref().map(with_csv_extension),
            summary,
            candidates_dir,
        }
    }
}

pub fn with_csv_extension(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension("csv")
    }
}

/// Acceptance thresholds, both strictly inside (0, 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub fuzzy_join: f64,
    pub string_grouper: f64,
}

impl Thresholds {
    pub fn new(fuzzy_join: f64, string_grouper: f64) -> Result<Self, PipelineError> {
        validate_threshold("threshold_1", fuzzy_join)?;
        validate_threshold("threshold_2", string_grouper)?;
        Ok(Self {
            fuzzy_join,
            string_grouper,
        })
    }
}

fn validate_threshold(name: &str, value: f64) -> Result<(), PipelineError> {
    if value.is_finite() && value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(PipelineError::InvalidConfig(format!(
            "{} must be strictly between 0 and 1, got {}",
            name, value
        )))
    }
}

/// Internal knobs for the string grouper. Not exposed on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct MatcherTuning {
    pub ngram_size: usize,
    pub discovery_floor: f64,
    pub max_matches_per_row: usize,
}

impl Default for MatcherTuning {
    fn default() -> Self {
        Self {
            ngram_size: DEFAULT_NGRAM_SIZE,
            discovery_floor: DEFAULT_DISCOVERY_FLOOR,
            max_matches_per_row: DEFAULT_MAX_MATCHES_PER_ROW,
        }
    }
}

impl MatcherTuning {
    /// Create tuning from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let ngram_size = env_or("GROUPER_NGRAM_SIZE", defaults.ngram_size).max(1);
        let discovery_floor = env_or("GROUPER_DISCOVERY_FLOOR", defaults.discovery_floor);
        let discovery_floor = if (0.0..1.0).contains(&discovery_floor) {
            discovery_floor
        } else {
            warn!(
                "GROUPER_DISCOVERY_FLOOR={} is outside [0, 1), using {}",
                discovery_floor, defaults.discovery_floor
            );
            defaults.discovery_floor
        };
        let max_matches_per_row =
            env_or("GROUPER_MAX_MATCHES_PER_ROW", defaults.max_matches_per_row).max(1);

        let tuning = Self {
            ngram_size,
            discovery_floor,
            max_matches_per_row,
        };
        debug!("Matcher tuning: {:?}", tuning);
        tuning
    }
}

fn env_or<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Could not parse {}='{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub inputs: InputPaths,
    pub outputs: OutputPaths,
    pub thresholds: Thresholds,
    pub suffix_anchoring: SuffixAnchoring,
    pub tuning: MatcherTuning,
    pub progress: ProgressConfig,
}

impl PipelineConfig {
    pub fn log_config(&self) {
        info!("🔍 Registry: {}", self.inputs.registry.display());
        info!("🔍 Transactions: {}", self.inputs.transactions.display());
        match &self.inputs.manual_matches {
            Some(path) => info!("🔍 Manual matches: {}", path.display()),
            None => info!("🔍 Manual matches: none"),
        }
        match &self.inputs.false_positives {
            Some(path) => info!("🔍 False positives: {}", path.display()),
            None => info!("🔍 False positives: none"),
        }
        info!(
            "⚙️  Thresholds: fuzzy_join={:.2}, string_grouper={:.2}; suffix anchoring: {:?}",
            self.thresholds.fuzzy_join, self.thresholds.string_grouper, self.suffix_anchoring
        );
    }
}
