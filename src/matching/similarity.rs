// src/matching/similarity.rs
use std::collections::HashSet;
use strsim::normalized_levenshtein;

use crate::utils::constants::{EDIT_DISTANCE_WEIGHT, TOKEN_SET_WEIGHT};

pub fn tokenize(key: &str) -> Vec<&str> {
    key.split_whitespace().collect()
}

/// Tokens sorted and rejoined with single spaces, so word order and spacing
/// differences do not count as edits.
pub fn sorted_token_string(key: &str) -> String {
    let mut tokens = tokenize(key);
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Jaccard overlap of the distinct tokens of both keys.
pub fn token_set_similarity(a: &str, b: &str) -> f64 {
    let set_a: HashSet<&str> = a.split_whitespace().collect();
    let set_b: HashSet<&str> = b.split_whitespace().collect();
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    intersection as f64 / union as f64
}

pub fn edit_similarity(a: &str, b: &str) -> f64 {
    normalized_levenshtein(&sorted_token_string(a), &sorted_token_string(b))
}

/// Blended token/character similarity in [0, 1]. Identical keys score 1.0.
pub fn blended_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.trim().is_empty() || b.trim().is_empty() {
        return 0.0;
    }
    let score =
        token_set_similarity(a, b) * TOKEN_SET_WEIGHT + edit_similarity(a, b) * EDIT_DISTANCE_WEIGHT;
    score.clamp(0.0, 1.0)
}
