// src/overrides/mod.rs
//
// Manual review layer applied after automated matching. Runs as three ordered
// steps: drop automated matches listed as false positives, recompute the set of
// unmatched transaction names, then inject curated matches for names in that
// set only. A false positive can therefore be reinstated by a manual match.

use log::{info, warn};
use std::collections::{HashMap, HashSet};

use crate::models::core::{RegistryNameIndex, ResolvedTransaction};
use crate::models::matching::{AcceptedMatch, ManualMatch, MatchSource};
use crate::models::stats_models::OverrideStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionState {
    Unresolved,
    AutoMatched,
    FalsePositiveRemoved,
    ManuallyMatched,
    FinallyUnmatched,
}

impl ResolutionState {
    fn can_advance_to(self, next: ResolutionState) -> bool {
        use ResolutionState::*;
        matches!(
            (self, next),
            (Unresolved, AutoMatched)
                | (AutoMatched, FalsePositiveRemoved)
                | (Unresolved, ManuallyMatched)
                | (FalsePositiveRemoved, ManuallyMatched)
                | (Unresolved, FinallyUnmatched)
                | (FalsePositiveRemoved, FinallyUnmatched)
        )
    }

    pub fn is_matched(self) -> bool {
        matches!(self, ResolutionState::AutoMatched | ResolutionState::ManuallyMatched)
    }
}

/// State of every unique transaction name, in first-seen order.
#[derive(Debug, Clone)]
pub struct ResolutionTracker {
    order: Vec<String>,
    states: HashMap<String, ResolutionState>,
}

impl ResolutionTracker {
    pub fn new(unique: &[ResolvedTransaction]) -> Self {
        let mut order = Vec::with_capacity(unique.len());
        let mut states = HashMap::with_capacity(unique.len());
        for transaction in unique {
            if states
                .insert(transaction.original.clone(), ResolutionState::Unresolved)
                .is_none()
            {
                order.push(transaction.original.clone());
            }
        }
        Self { order, states }
    }

    pub fn state(&self, original: &str) -> Option<ResolutionState> {
        self.states.get(original).copied()
    }

    fn advance(&mut self, original: &str, next: ResolutionState) {
        match self.states.get_mut(original) {
            Some(state) if state.can_advance_to(next) => *state = next,
            Some(state) => warn!(
                "Ignoring transition {:?} -> {:?} for '{}'",
                state, next, original
            ),
            None => warn!("'{}' is not a known transaction name", original),
        }
    }

    fn originals_in(&self, wanted: &[ResolutionState]) -> Vec<&str> {
        self.order
            .iter()
            .filter(|o| self.states.get(*o).map_or(false, |s| wanted.contains(s)))
            .map(String::as_str)
            .collect()
    }

    pub fn unmatched(&self) -> Vec<&str> {
        self.originals_in(&[
            ResolutionState::Unresolved,
            ResolutionState::FalsePositiveRemoved,
            ResolutionState::FinallyUnmatched,
        ])
    }
}

#[derive(Debug, Clone)]
pub struct OverrideOutcome {
    pub accepted: Vec<AcceptedMatch>,
    pub tracker: ResolutionTracker,
    pub stats: OverrideStats,
}

pub fn apply_overrides(
    automated: Vec<AcceptedMatch>,
    unique: &[ResolvedTransaction],
    false_positives: &[String],
    manual_matches: &[ManualMatch],
    name_index: &RegistryNameIndex,
) -> OverrideOutcome {
    let mut tracker = ResolutionTracker::new(unique);
    let mut stats = OverrideStats::default();
    for m in &automated {
        tracker.advance(&m.original, ResolutionState::AutoMatched);
    }

    // Step 1: suppress false positives.
    let false_positive_set: HashSet<&str> = false_positives.iter().map(String::as_str).collect();
    let mut accepted: Vec<AcceptedMatch> = Vec::with_capacity(automated.len());
    for m in automated {
        if false_positive_set.contains(m.original.as_str()) {
            tracker.advance(&m.original, ResolutionState::FalsePositiveRemoved);
            stats.false_positives_removed += 1;
        } else {
            accepted.push(m);
        }
    }

    // Step 2: unmatched names after suppression.
    let unmatched: Vec<String> = tracker.unmatched().into_iter().map(str::to_string).collect();

    // Step 3: inner join unmatched names with the manual list.
    let mut manual_by_original: HashMap<&str, &ManualMatch> = HashMap::new();
    for manual in manual_matches {
        manual_by_original.entry(manual.original.as_str()).or_insert(manual);
    }
    for original in &unmatched {
        let Some(manual) = manual_by_original.get(original.as_str()) else {
            continue;
        };
        if tracker.state(original) == Some(ResolutionState::FalsePositiveRemoved) {
            stats.reinstated += 1;
        }
        tracker.advance(original, ResolutionState::ManuallyMatched);
        stats.manual_matches_added += 1;
        accepted.push(AcceptedMatch {
            original: original.clone(),
            company_name: manual.company_name.clone(),
            entity_id: manual
                .entity_id
                .clone()
                .or_else(|| name_index.entity_id(&manual.company_name).cloned()),
            source: MatchSource::Manual,
        });
    }

    let remaining: Vec<String> = tracker.unmatched().into_iter().map(str::to_string).collect();
    for original in &remaining {
        tracker.advance(original, ResolutionState::FinallyUnmatched);
    }

    info!(
        "✋ Overrides: {} false positives removed, {} manual matches added ({} reinstated after removal)",
        stats.false_positives_removed, stats.manual_matches_added, stats.reinstated
    );
    OverrideOutcome {
        accepted,
        tracker,
        stats,
    }
}
