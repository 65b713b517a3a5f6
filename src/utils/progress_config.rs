// src/utils/progress_config.rs

use indicatif::{ProgressBar, ProgressStyle};
use std::env;

const BAR_TEMPLATE: &str =
    "  {prefix} [{elapsed_precise}] {bar:30.cyan/blue} {pos}/{len} {msg}";

/// Configuration for progress tracking throughout the pipeline
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Whether to show progress bars at all
    pub enabled: bool,
    /// Whether to show per-matcher row progress
    pub detailed: bool,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            detailed: true,
        }
    }
}

impl ProgressConfig {
    /// Create progress configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            enabled: env::var("PROGRESS_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            detailed: env::var("PROGRESS_DETAILED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            detailed: false,
        }
    }

    pub fn should_show_detailed(&self) -> bool {
        self.enabled && self.detailed
    }

    /// A row-level bar for a matcher loop, or `None` when detailed progress is off.
    pub fn matcher_bar(&self, prefix: &str, len: usize) -> Option<ProgressBar> {
        if !self.should_show_detailed() {
            return None;
        }
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        pb.set_prefix(prefix.to_string());
        Some(pb)
    }
}
