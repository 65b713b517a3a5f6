// src/matching/disabled.rs
use crate::matching::Matcher;
use crate::models::matching::{KeyedName, MatchCandidate, MatchMethodType};
use crate::utils::logging::MatchingLogger;
use crate::utils::progress_config::ProgressConfig;

/// Placeholder for an algorithm that has a configured threshold but is not
/// part of the pipeline. Always yields nothing.
#[derive(Debug, Clone)]
pub struct DisabledMatcher {
    method: MatchMethodType,
}

impl DisabledMatcher {
    pub fn new(method: MatchMethodType) -> Self {
        Self { method }
    }
}

impl Matcher for DisabledMatcher {
    fn method_type(&self) -> MatchMethodType {
        self.method
    }

    fn is_enabled(&self) -> bool {
        false
    }

    fn find_candidates(
        &self,
        _transactions: &[KeyedName],
        _registry: &[KeyedName],
        _progress: &ProgressConfig,
    ) -> Vec<MatchCandidate> {
        MatchingLogger::new(self.method).log_disabled();
        Vec::new()
    }
}
