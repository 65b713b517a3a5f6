// src/matching/manager.rs
//
// Runs every configured matcher over the same keys, applies each matcher's own
// acceptance threshold and merges the accepted pairs. Matchers are merged in
// configuration order and the first accepted pair for a transaction name wins,
// so the fuzzy join takes precedence over the string grouper.

use log::info;
use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::matching::disabled::DisabledMatcher;
use crate::matching::fuzzy_join::FuzzyJoinMatcher;
use crate::matching::string_grouper::StringGrouperMatcher;
use crate::matching::Matcher;
use crate::models::core::RegistryNameIndex;
use crate::models::matching::{
    AcceptedMatch, KeyedName, MatchCandidate, MatchMethodType, MatchSource,
};
use crate::models::stats_models::MatchMethodStats;
use crate::utils::constants::DEFAULT_NEAREST_NEIGHBOR_THRESHOLD;
use crate::utils::logging::MatchingLogger;
use crate::utils::pipeline_config::{MatcherTuning, Thresholds};
use crate::utils::progress_config::ProgressConfig;

pub struct ConfiguredMatcher {
    pub matcher: Box<dyn Matcher>,
    pub threshold: f64,
}

/// Fuzzy join, then string grouper, then the disabled third algorithm.
pub fn default_matchers(thresholds: &Thresholds, tuning: &MatcherTuning) -> Vec<ConfiguredMatcher> {
    vec![
        ConfiguredMatcher {
            matcher: Box::new(FuzzyJoinMatcher::new()),
            threshold: thresholds.fuzzy_join,
        },
        ConfiguredMatcher {
            matcher: Box::new(StringGrouperMatcher::new(tuning)),
            threshold: thresholds.string_grouper,
        },
        ConfiguredMatcher {
            matcher: Box::new(DisabledMatcher::new(MatchMethodType::NearestNeighbor)),
            threshold: DEFAULT_NEAREST_NEIGHBOR_THRESHOLD,
        },
    ]
}

#[derive(Debug, Clone)]
pub struct MatcherRun {
    pub method: MatchMethodType,
    pub enabled: bool,
    pub threshold: f64,
    pub candidates: Vec<MatchCandidate>,
    pub elapsed: Duration,
}

impl MatcherRun {
    pub fn accepted(&self) -> impl Iterator<Item = &MatchCandidate> {
        let threshold = self.threshold;
        self.candidates.iter().filter(move |c| c.score >= threshold)
    }
}

pub fn run_matchers(
    matchers: &[ConfiguredMatcher],
    transactions: &[KeyedName],
    registry: &[KeyedName],
    progress: &ProgressConfig,
) -> Vec<MatcherRun> {
    matchers
        .iter()
        .map(|configured| {
            let start = Instant::now();
            let candidates = configured
                .matcher
                .find_candidates(transactions, registry, progress);
            MatcherRun {
                method: configured.matcher.method_type(),
                enabled: configured.matcher.is_enabled(),
                threshold: configured.threshold,
                candidates,
                elapsed: start.elapsed(),
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub accepted: Vec<AcceptedMatch>,
    pub method_stats: Vec<MatchMethodStats>,
}

/// Filters each run by its threshold, concatenates runs in order, keeps the
/// first pair per transaction name and attaches the entity id by company name.
pub fn threshold_and_merge(runs: &[MatcherRun], name_index: &RegistryNameIndex) -> MergeOutcome {
    let mut accepted: Vec<AcceptedMatch> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut method_stats = Vec::with_capacity(runs.len());

    for run in runs {
        let logger = MatchingLogger::new(run.method);
        let mut stats = MatchMethodStats::new(run.method, run.threshold);
        stats.candidates_found = run.candidates.len();
        stats.processing_time_secs = run.elapsed.as_secs_f64();

        let mut score_sum = 0.0;
        for candidate in run.accepted() {
            stats.candidates_accepted += 1;
            score_sum += candidate.score;
            if !seen.insert(candidate.transaction_original.clone()) {
                continue;
            }
            stats.matches_contributed += 1;
            accepted.push(AcceptedMatch {
                original: candidate.transaction_original.clone(),
                company_name: candidate.company_name.clone(),
                entity_id: name_index.entity_id(&candidate.company_name).cloned(),
                source: MatchSource::Algorithm(run.method),
            });
        }
        if stats.candidates_accepted > 0 {
            stats.avg_accepted_score = score_sum / stats.candidates_accepted as f64;
        }

        logger.log_threshold_results(run.threshold, stats.candidates_found, stats.candidates_accepted);
        logger.log_debug(&format!(
            "{} transaction names newly matched after merge",
            stats.matches_contributed
        ));
        method_stats.push(stats);
    }

    info!(
        "🔀 Merged automated matches: {} unique transaction names accepted",
        accepted.len()
    );
    MergeOutcome {
        accepted,
        method_stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::core::{EntityId, RegistryEntity};

    fn candidate(original: &str, company: &str, score: f64, method: MatchMethodType) -> MatchCandidate {
        MatchCandidate {
            left_index: 0,
            right_index: 0,
            transaction_original: original.to_string(),
            company_name: company.to_string(),
            score,
            method,
        }
    }

    fn run(method: MatchMethodType, threshold: f64, candidates: Vec<MatchCandidate>) -> MatcherRun {
        MatcherRun {
            method,
            enabled: true,
            threshold,
            candidates,
            elapsed: Duration::from_millis(1),
        }
    }

    fn index() -> RegistryNameIndex {
        RegistryNameIndex::build(&[
            RegistryEntity { id: Some(EntityId::from("1")), company_name: "Acme Inc".to_string() },
            RegistryEntity { id: Some(EntityId::from("2")), company_name: "Acme Incorporated".to_string() },
            RegistryEntity { id: Some(EntityId::from("3")), company_name: "Uber".to_string() },
            RegistryEntity { id: Some(EntityId::from("4")), company_name: "Uber".to_string() },
        ])
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let a = run(
            MatchMethodType::FuzzyJoin,
            0.8,
            vec![
                candidate("ACME 1", "Acme Inc", 0.8, MatchMethodType::FuzzyJoin),
                candidate("ACME 2", "Acme Inc", 0.79, MatchMethodType::FuzzyJoin),
            ],
        );
        let outcome = threshold_and_merge(&[a], &index());
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.accepted[0].original, "ACME 1");
        assert_eq!(outcome.method_stats[0].candidates_found, 2);
        assert_eq!(outcome.method_stats[0].candidates_accepted, 1);
    }

    #[test]
    fn test_fuzzy_join_wins_overlap() {
        let a = run(
            MatchMethodType::FuzzyJoin,
            0.5,
            vec![candidate("ACME", "Acme Inc", 0.6, MatchMethodType::FuzzyJoin)],
        );
        let b = run(
            MatchMethodType::StringGrouper,
            0.5,
            vec![
                candidate("ACME", "Acme Incorporated", 0.99, MatchMethodType::StringGrouper),
                candidate("UBER EATS", "Uber", 0.95, MatchMethodType::StringGrouper),
                candidate("UBER EATS", "Acme Inc", 0.90, MatchMethodType::StringGrouper),
            ],
        );
        let outcome = threshold_and_merge(&[a, b], &index());
        assert_eq!(outcome.accepted.len(), 2);
        assert_eq!(outcome.accepted[0].company_name, "Acme Inc");
        assert_eq!(outcome.accepted[0].source, MatchSource::Algorithm(MatchMethodType::FuzzyJoin));
        assert_eq!(outcome.accepted[1].company_name, "Uber");
        assert_eq!(outcome.method_stats[1].matches_contributed, 1);
    }

    #[test]
    fn test_entity_id_uses_first_registry_row_for_name() {
        let b = run(
            MatchMethodType::StringGrouper,
            0.5,
            vec![candidate("UBER", "Uber", 1.0, MatchMethodType::StringGrouper)],
        );
        let outcome = threshold_and_merge(&[b], &index());
        assert_eq!(outcome.accepted[0].entity_id, Some(EntityId::from("3")));
    }

    #[test]
    fn test_default_matchers_order() {
        let thresholds = Thresholds::new(0.8, 0.9).unwrap();
        let methods: Vec<MatchMethodType> = default_matchers(&thresholds, &MatcherTuning::default())
            .iter()
            .map(|m| m.matcher.method_type())
            .collect();
        assert_eq!(
            methods,
            vec![
                MatchMethodType::FuzzyJoin,
                MatchMethodType::StringGrouper,
                MatchMethodType::NearestNeighbor
            ]
        );
    }

    #[test]
    fn test_disabled_matcher_contributes_nothing() {
        let matchers = vec![ConfiguredMatcher {
            matcher: Box::new(DisabledMatcher::new(MatchMethodType::NearestNeighbor)),
            threshold: 0.61,
        }];
        let runs = run_matchers(&matchers, &[], &[], &ProgressConfig::disabled());
        assert!(runs[0].candidates.is_empty());
        assert!(!runs[0].enabled);
        let outcome = threshold_and_merge(&runs, &index());
        assert!(outcome.accepted.is_empty());
    }
}
