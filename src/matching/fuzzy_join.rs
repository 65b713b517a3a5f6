// src/matching/fuzzy_join.rs
//
// Matcher A: for every transaction key, the single best registry key by blended
// token/edit-distance similarity. Registry rows sharing a token or a character
// n-gram with the transaction key are scored first; when there are none, every
// registry row is scored so a pair carried by edit distance alone is not lost.

use std::collections::{HashMap, HashSet};

use crate::matching::similarity::{blended_similarity, tokenize};
use crate::matching::string_grouper::ngrams;
use crate::matching::{make_candidate, Matcher};
use crate::models::matching::{KeyedName, MatchCandidate, MatchMethodType};
use crate::utils::constants::DEFAULT_NGRAM_SIZE;
use crate::utils::logging::MatchingLogger;
use crate::utils::progress_config::ProgressConfig;

#[derive(Debug, Clone, Default)]
pub struct FuzzyJoinMatcher;

impl FuzzyJoinMatcher {
    pub fn new() -> Self {
        Self
    }
}

/// Token -> registry row indices (ascending, deduplicated).
fn build_token_index(registry: &[KeyedName]) -> HashMap<&str, Vec<usize>> {
    let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, entry) in registry.iter().enumerate() {
        let Some(key) = entry.key.value() else {
            continue;
        };
        let mut seen = HashSet::new();
        for token in tokenize(key) {
            if seen.insert(token) {
                index.entry(token).or_default().push(idx);
            }
        }
    }
    index
}

/// Character n-gram -> registry row indices (ascending, deduplicated).
fn build_gram_index(registry: &[KeyedName]) -> HashMap<String, Vec<usize>> {
    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, entry) in registry.iter().enumerate() {
        let Some(key) = entry.key.value() else {
            continue;
        };
        let grams: HashSet<String> = ngrams(key, DEFAULT_NGRAM_SIZE).into_iter().collect();
        for gram in grams {
            index.entry(gram).or_default().push(idx);
        }
    }
    for rows in index.values_mut() {
        rows.sort_unstable();
    }
    index
}

struct RegistryIndex<'a> {
    exact: HashMap<&'a str, usize>,
    tokens: HashMap<&'a str, Vec<usize>>,
    grams: HashMap<String, Vec<usize>>,
}

/// Best registry row for one key. Ties go to the earliest registry row.
fn best_match(key: &str, registry: &[KeyedName], index: &RegistryIndex<'_>) -> Option<(usize, f64)> {
    if let Some(&idx) = index.exact.get(key) {
        return Some((idx, 1.0));
    }

    let mut candidates: Vec<usize> = tokenize(key)
        .into_iter()
        .filter_map(|token| index.tokens.get(token))
        .flatten()
        .chain(
            ngrams(key, DEFAULT_NGRAM_SIZE)
                .iter()
                .filter_map(|gram| index.grams.get(gram))
                .flatten(),
        )
        .copied()
        .collect();
    if candidates.is_empty() {
        candidates = (0..registry.len())
            .filter(|&idx| !registry[idx].key.is_null())
            .collect();
    }
    candidates.sort_unstable();
    candidates.dedup();

    let mut best: Option<(usize, f64)> = None;
    for idx in candidates {
        let right_key = registry[idx].key.as_str();
        let score = blended_similarity(key, right_key);
        if score <= 0.0 {
            continue;
        }
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((idx, score)),
        }
    }
    best
}

impl Matcher for FuzzyJoinMatcher {
    fn method_type(&self) -> MatchMethodType {
        MatchMethodType::FuzzyJoin
    }

    fn find_candidates(
        &self,
        transactions: &[KeyedName],
        registry: &[KeyedName],
        progress: &ProgressConfig,
    ) -> Vec<MatchCandidate> {
        let logger = MatchingLogger::new(self.method_type());
        logger.log_start(transactions.len(), registry.len());

        logger.log_phase("Indexing registry", Some("building token index"));
        let mut exact: HashMap<&str, usize> = HashMap::new();
        for (idx, entry) in registry.iter().enumerate() {
            if let Some(key) = entry.key.value() {
                exact.entry(key).or_insert(idx);
            }
        }
        let index = RegistryIndex {
            exact,
            tokens: build_token_index(registry),
            grams: build_gram_index(registry),
        };
        logger.log_index_built(
            index.tokens.len() + index.grams.len(),
            index.tokens.values().map(Vec::len).sum::<usize>()
                + index.grams.values().map(Vec::len).sum::<usize>(),
        );
        logger.log_null_keys_skipped(
            transactions.iter().filter(|t| t.key.is_null()).count(),
            registry.iter().filter(|r| r.key.is_null()).count(),
        );

        logger.log_phase("Scoring", Some("best registry match per transaction name"));
        let pb = progress.matcher_bar("🔗", transactions.len());
        let mut candidates = Vec::new();
        for (left_idx, entry) in transactions.iter().enumerate() {
            if let Some(pb) = &pb {
                pb.inc(1);
            }
            let Some(key) = entry.key.value() else {
                continue;
            };
            if let Some((right_idx, score)) = best_match(key, registry, &index) {
                candidates.push(make_candidate(
                    transactions,
                    registry,
                    left_idx,
                    right_idx,
                    score,
                    MatchMethodType::FuzzyJoin,
                ));
            }
        }
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        logger.log_candidates(candidates.len(), candidates.len(), transactions.len());
        let avg = if candidates.is_empty() {
            0.0
        } else {
            candidates.iter().map(|c| c.score).sum::<f64>() / candidates.len() as f64
        };
        logger.log_completion(candidates.len(), avg);
        candidates
    }
}
