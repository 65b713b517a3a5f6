// src/models/matching.rs
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::core::EntityId;
use crate::normalization::NormalizedKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchMethodType {
    /// Matcher A: blended token/edit-distance best match per row.
    FuzzyJoin,
    /// Matcher B: TF-IDF character n-gram cosine grouping.
    StringGrouper,
    /// Third algorithm named in configuration; never wired in.
    NearestNeighbor,
}

impl MatchMethodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethodType::FuzzyJoin => "fuzzy_join",
            MatchMethodType::StringGrouper => "string_grouper",
            MatchMethodType::NearestNeighbor => "nearest_neighbor",
        }
    }
}

impl fmt::Display for MatchMethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where an accepted match came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchSource {
    Algorithm(MatchMethodType),
    Manual,
}

/// A raw string paired with its comparison key. Used for both sides of a join.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedName {
    pub original: String,
    pub key: NormalizedKey,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCandidate {
    pub left_index: usize,
    pub right_index: usize,
    pub transaction_original: String,
    pub company_name: String,
    pub score: f64,
    pub method: MatchMethodType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptedMatch {
    pub original: String,
    pub company_name: String,
    pub entity_id: Option<EntityId>,
    #[serde(skip)]
    pub source: MatchSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmatchedSummary {
    pub original: String,
    pub count: usize,
}

/// One row of a manually curated match list.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualMatch {
    pub original: String,
    pub company_name: String,
    pub entity_id: Option<EntityId>,
}
