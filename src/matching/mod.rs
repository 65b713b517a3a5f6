// src/matching/mod.rs
pub mod disabled;
pub mod fuzzy_join;
pub mod manager;
pub mod similarity;
pub mod string_grouper;

use crate::models::matching::{KeyedName, MatchCandidate, MatchMethodType};
use crate::normalization::Normalizer;
use crate::utils::progress_config::ProgressConfig;

/// A matching algorithm joining transaction keys (left) to registry keys
/// (right). Implementations must tolerate null keys and must not fail.
pub trait Matcher: Send + Sync {
    fn method_type(&self) -> MatchMethodType;

    /// Disabled matchers still run but are left out of candidate dumps.
    fn is_enabled(&self) -> bool {
        true
    }

    fn find_candidates(
        &self,
        transactions: &[KeyedName],
        registry: &[KeyedName],
        progress: &ProgressConfig,
    ) -> Vec<MatchCandidate>;
}

/// Pairs each original string with its normalized key, preserving order so
/// candidate indices map back to the input slices.
pub fn key_names<'a, I>(originals: I, normalizer: &Normalizer) -> Vec<KeyedName>
where
    I: IntoIterator<Item = &'a str>,
{
    originals
        .into_iter()
        .map(|original| KeyedName {
            original: original.to_string(),
            key: normalizer.normalize(original),
        })
        .collect()
}

pub(crate) fn make_candidate(
    transactions: &[KeyedName],
    registry: &[KeyedName],
    left_index: usize,
    right_index: usize,
    score: f64,
    method: MatchMethodType,
) -> MatchCandidate {
    MatchCandidate {
        left_index,
        right_index,
        transaction_original: transactions[left_index].original.clone(),
        company_name: registry[right_index].original.clone(),
        score,
        method,
    }
}
