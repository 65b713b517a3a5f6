// src/matching/string_grouper.rs
//
// Matcher B: cosine similarity of TF-IDF weighted character n-gram vectors.
// The vectorizer is fitted on transaction and registry keys together. Only
// registry rows sharing at least one n-gram with a query are ever touched, via
// an inverted index over registry vectors, so the work is a sparse product and
// not a full pairwise scan.

use log::debug;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::matching::{make_candidate, Matcher};
use crate::models::matching::{KeyedName, MatchCandidate, MatchMethodType};
use crate::utils::logging::MatchingLogger;
use crate::utils::pipeline_config::MatcherTuning;
use crate::utils::progress_config::ProgressConfig;

static NGRAM_CLEANUP: Lazy<Option<Regex>> = Lazy::new(|| match Regex::new(r"[,\-./]|\s") {
    Ok(re) => Some(re),
    Err(e) => {
        log::warn!("Invalid n-gram cleanup regex: {}", e);
        None
    }
});

/// Sparse l2-normalised vector, sorted by feature id.
type SparseVector = Vec<(usize, f64)>;

#[derive(Debug, Clone)]
pub struct StringGrouperMatcher {
    ngram_size: usize,
    discovery_floor: f64,
    max_matches_per_row: usize,
}

impl StringGrouperMatcher {
    pub fn new(tuning: &MatcherTuning) -> Self {
        Self {
            ngram_size: tuning.ngram_size.max(1),
            discovery_floor: tuning.discovery_floor,
            max_matches_per_row: tuning.max_matches_per_row.max(1),
        }
    }
}

/// Character n-grams of a key with separators removed. Keys shorter than the
/// n-gram size yield themselves as a single gram.
pub fn ngrams(key: &str, n: usize) -> Vec<String> {
    let cleaned = match NGRAM_CLEANUP.as_ref() {
        Some(re) => re.replace_all(key, "").into_owned(),
        None => key.split_whitespace().collect(),
    };
    let chars: Vec<char> = cleaned.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }
    if chars.len() < n {
        return vec![cleaned];
    }
    chars.windows(n).map(|w| w.iter().collect()).collect()
}

struct TfIdfModel {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfIdfModel {
    /// Smoothed idf: ln((1 + n) / (1 + df)) + 1.
    fn fit(documents: &[Vec<String>]) -> Self {
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut document_frequency: Vec<usize> = Vec::new();
        for grams in documents {
            let mut seen: Vec<usize> = Vec::with_capacity(grams.len());
            for gram in grams {
                let next_id = vocabulary.len();
                let id = *vocabulary.entry(gram.clone()).or_insert(next_id);
                if id == document_frequency.len() {
                    document_frequency.push(0);
                }
                seen.push(id);
            }
            seen.sort_unstable();
            seen.dedup();
            for id in seen {
                document_frequency[id] += 1;
            }
        }

        let n = documents.len() as f64;
        let idf = document_frequency
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();
        Self { vocabulary, idf }
    }

    fn transform(&self, grams: &[String]) -> SparseVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for gram in grams {
            if let Some(&id) = self.vocabulary.get(gram) {
                *counts.entry(id).or_insert(0.0) += 1.0;
            }
        }
        let mut vector: SparseVector = counts
            .into_iter()
            .map(|(id, tf)| (id, tf * self.idf[id]))
            .collect();
        let norm = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in vector.iter_mut() {
                *w /= norm;
            }
        }
        vector.sort_unstable_by_key(|(id, _)| *id);
        vector
    }
}

/// Feature id -> (registry row, weight).
fn build_inverted_index(vectors: &[SparseVector]) -> HashMap<usize, Vec<(usize, f64)>> {
    let mut index: HashMap<usize, Vec<(usize, f64)>> = HashMap::new();
    for (row, vector) in vectors.iter().enumerate() {
        for &(feature, weight) in vector {
            index.entry(feature).or_default().push((row, weight));
        }
    }
    index
}

impl StringGrouperMatcher {
    /// Registry rows whose cosine similarity with `query` clears the discovery
    /// floor, best first, ties by registry order, capped per row.
    fn query(
        &self,
        query: &SparseVector,
        index: &HashMap<usize, Vec<(usize, f64)>>,
    ) -> Vec<(usize, f64)> {
        let mut scores: HashMap<usize, f64> = HashMap::new();
        for &(feature, weight) in query {
            if let Some(postings) = index.get(&feature) {
                for &(row, other) in postings {
                    *scores.entry(row).or_insert(0.0) += weight * other;
                }
            }
        }
        let mut hits: Vec<(usize, f64)> = scores
            .into_iter()
            .map(|(row, score)| (row, score.clamp(0.0, 1.0)))
            .filter(|&(_, score)| score >= self.discovery_floor)
            .collect();
        hits.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        hits.truncate(self.max_matches_per_row);
        hits
    }
}

impl Matcher for StringGrouperMatcher {
    fn method_type(&self) -> MatchMethodType {
        MatchMethodType::StringGrouper
    }

    fn find_candidates(
        &self,
        transactions: &[KeyedName],
        registry: &[KeyedName],
        progress: &ProgressConfig,
    ) -> Vec<MatchCandidate> {
        let logger = MatchingLogger::new(self.method_type());
        logger.log_start(transactions.len(), registry.len());
        logger.log_null_keys_skipped(
            transactions.iter().filter(|t| t.key.is_null()).count(),
            registry.iter().filter(|r| r.key.is_null()).count(),
        );

        logger.log_phase(
            "Vectorizing",
            Some(&format!("TF-IDF over {}-grams", self.ngram_size)),
        );
        let grams_for = |entry: &KeyedName| -> Vec<String> {
            entry
                .key
                .value()
                .map(|key| ngrams(key, self.ngram_size))
                .unwrap_or_default()
        };
        let left_grams: Vec<Vec<String>> = transactions.iter().map(grams_for).collect();
        let right_grams: Vec<Vec<String>> = registry.iter().map(grams_for).collect();

        let documents: Vec<Vec<String>> = left_grams
            .iter()
            .chain(right_grams.iter())
            .filter(|g| !g.is_empty())
            .cloned()
            .collect();
        let model = TfIdfModel::fit(&documents);
        let right_vectors: Vec<SparseVector> =
            right_grams.iter().map(|g| model.transform(g)).collect();
        let index = build_inverted_index(&right_vectors);
        logger.log_index_built(model.vocabulary.len(), index.values().map(Vec::len).sum());

        logger.log_phase(
            "Querying",
            Some(&format!(
                "nearest registry names above {:.2}, at most {} per row",
                self.discovery_floor, self.max_matches_per_row
            )),
        );
        let pb = progress.matcher_bar("🧮", transactions.len());
        let per_row: Vec<Vec<MatchCandidate>> = left_grams
            .par_iter()
            .enumerate()
            .map(|(left_idx, grams)| {
                if let Some(pb) = &pb {
                    pb.inc(1);
                }
                if grams.is_empty() {
                    return Vec::new();
                }
                let query = model.transform(grams);
                self.query(&query, &index)
                    .into_iter()
                    .map(|(right_idx, score)| {
                        make_candidate(
                            transactions,
                            registry,
                            left_idx,
                            right_idx,
                            score,
                            MatchMethodType::StringGrouper,
                        )
                    })
                    .collect()
            })
            .collect();
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        let rows_with_candidates = per_row.iter().filter(|c| !c.is_empty()).count();
        let candidates: Vec<MatchCandidate> = per_row.into_iter().flatten().collect();
        debug!(
            "String grouper produced {} candidates for {} rows",
            candidates.len(),
            rows_with_candidates
        );
        logger.log_candidates(candidates.len(), rows_with_candidates, transactions.len());
        let avg = if candidates.is_empty() {
            0.0
        } else {
            candidates.iter().map(|c| c.score).sum::<f64>() / candidates.len() as f64
        };
        logger.log_completion(candidates.len(), avg);
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::key_names;
    use crate::normalization::Normalizer;

    fn run(transactions: &[&str], registry: &[&str]) -> Vec<MatchCandidate> {
        let normalizer = Normalizer::default();
        let left = key_names(transactions.iter().copied(), &normalizer);
        let right = key_names(registry.iter().copied(), &normalizer);
        StringGrouperMatcher::new(&MatcherTuning::default()).find_candidates(
            &left,
            &right,
            &ProgressConfig::disabled(),
        )
    }

    #[test]
    fn test_ngrams_strip_separators() {
        assert_eq!(ngrams("UBER EATS", 3), vec!["UBE", "BER", "ERE", "REA", "EAT", "ATS"]);
        assert_eq!(ngrams("AT", 3), vec!["AT"]);
        assert!(ngrams("  ", 3).is_empty());
    }

    #[test]
    fn test_identical_keys_score_one() {
        let candidates = run(&["ACME INC #4471"], &["Acme Inc"]);
        assert_eq!(candidates.len(), 1);
        assert!((candidates[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_multiple_candidates_sorted_best_first() {
        let candidates = run(
            &["STARBUCKS RESERVE"],
            &["Starbucks Reserve", "Starbucks Reserves", "Walgreens"],
        );
        assert!(candidates.len() >= 2);
        assert_eq!(candidates[0].company_name, "Starbucks Reserve");
        assert!(candidates[0].score >= candidates[1].score);
        assert!(candidates.iter().all(|c| c.company_name != "Walgreens"));
    }

    #[test]
    fn test_typo_is_found_without_shared_tokens() {
        let candidates = run(&["WALGREENS"], &["Walgreen"]);
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].score > 0.8);
        assert!(candidates[0].score < 1.0);
    }

    #[test]
    fn test_null_keys_and_empty_inputs() {
        assert!(run(&["#1234"], &["365"]).is_empty());
        assert!(run(&[], &["Acme"]).is_empty());
        assert!(run(&["Acme"], &[]).is_empty());
    }

    #[test]
    fn test_candidates_capped_per_row() {
        let tuning = MatcherTuning {
            max_matches_per_row: 1,
            ..MatcherTuning::default()
        };
        let normalizer = Normalizer::default();
        let left = key_names(["ACME"], &normalizer);
        let right = key_names(["Acme", "Acme Inc", "ACME LLC"], &normalizer);
        let candidates = StringGrouperMatcher::new(&tuning).find_candidates(
            &left,
            &right,
            &ProgressConfig::disabled(),
        );
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].right_index, 0);
    }
}
