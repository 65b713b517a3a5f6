// src/reporting/report.rs
use log::info;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::models::core::ResolvedTransaction;
use crate::models::matching::{AcceptedMatch, UnmatchedSummary};

/// One transaction occurrence joined to its matched company.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpandedMatch {
    pub original: String,
    #[serde(rename = "companyName")]
    pub company_name: String,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub matched_all: Vec<ExpandedMatch>,
    pub unmatched: Vec<UnmatchedSummary>,
    pub total_all: usize,
    pub total_unique: usize,
    pub matched_unique: usize,
    pub identification_rate_all: f64,
    pub identification_rate_unique: f64,
}

/// `matched / total`, or 0 when there is nothing to match.
pub fn identification_rate(matched: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        matched as f64 / total as f64
    }
}

pub fn build_report(
    all: &[ResolvedTransaction],
    unique: &[ResolvedTransaction],
    accepted: &[AcceptedMatch],
) -> Report {
    let by_original: HashMap<&str, &AcceptedMatch> =
        accepted.iter().map(|m| (m.original.as_str(), m)).collect();

    let matched_all: Vec<ExpandedMatch> = all
        .iter()
        .filter_map(|t| {
            by_original.get(t.original.as_str()).map(|m| ExpandedMatch {
                original: t.original.clone(),
                company_name: m.company_name.clone(),
            })
        })
        .collect();

    // Counts in first-occurrence order; the stable sort keeps that order on ties.
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for t in all {
        if by_original.contains_key(t.original.as_str()) {
            continue;
        }
        let count = counts.entry(t.original.as_str()).or_insert_with(|| {
            order.push(t.original.as_str());
            0
        });
        *count += 1;
    }
    let mut unmatched: Vec<UnmatchedSummary> = order
        .into_iter()
        .map(|original| UnmatchedSummary {
            original: original.to_string(),
            count: counts.get(original).copied().unwrap_or(0),
        })
        .collect();
    unmatched.sort_by(|a, b| b.count.cmp(&a.count));

    let unique_names: HashSet<&str> = unique.iter().map(|t| t.original.as_str()).collect();
    let matched_unique = accepted
        .iter()
        .filter(|m| unique_names.contains(m.original.as_str()))
        .count();

    Report {
        identification_rate_all: identification_rate(matched_all.len(), all.len()),
        identification_rate_unique: identification_rate(matched_unique, unique.len()),
        matched_all,
        unmatched,
        total_all: all.len(),
        total_unique: unique.len(),
        matched_unique,
    }
}

impl Report {
    pub fn log_summary(&self) {
        info!(
            "📈 Identification rate (all transactions): {:.2}% ({}/{})",
            self.identification_rate_all * 100.0,
            self.matched_all.len(),
            self.total_all
        );
        info!(
            "📈 Identification rate (unique names): {:.2}% ({}/{})",
            self.identification_rate_unique * 100.0,
            self.matched_unique,
            self.total_unique
        );
        info!("📉 {} unique transaction names left unmatched", self.unmatched.len());
        for top in self.unmatched.iter().take(10) {
            info!("   {:>6} × {}", top.count, top.original);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::matching::MatchSource;

    fn transactions(names: &[&str]) -> Vec<ResolvedTransaction> {
        names
            .iter()
            .map(|n| ResolvedTransaction { original: n.to_string() })
            .collect()
    }

    fn unique_of(all: &[ResolvedTransaction]) -> Vec<ResolvedTransaction> {
        let mut seen = HashSet::new();
        all.iter()
            .filter(|t| seen.insert(t.original.clone()))
            .cloned()
            .collect()
    }

    fn accepted(original: &str, company: &str) -> AcceptedMatch {
        AcceptedMatch {
            original: original.to_string(),
            company_name: company.to_string(),
            entity_id: None,
            source: MatchSource::Manual,
        }
    }

    #[test]
    fn test_rates_and_expansion() {
        let all = transactions(&["UBER EATS", "TARGET", "UBER EATS", "MYSTERY"]);
        let unique = unique_of(&all);
        let report = build_report(&all, &unique, &[accepted("UBER EATS", "Uber Technologies")]);

        assert_eq!(report.matched_all.len(), 2);
        assert!(report.matched_all.iter().all(|m| m.company_name == "Uber Technologies"));
        assert!((report.identification_rate_all - 0.5).abs() < 1e-12);
        assert!((report.identification_rate_unique - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_unmatched_sorted_by_count_with_stable_ties() {
        let all = transactions(&["B", "A", "C", "A", "C", "A", "D"]);
        let unique = unique_of(&all);
        let report = build_report(&all, &unique, &[accepted("D", "Delta")]);

        let rows: Vec<(&str, usize)> = report
            .unmatched
            .iter()
            .map(|u| (u.original.as_str(), u.count))
            .collect();
        assert_eq!(rows, vec![("A", 3), ("C", 2), ("B", 1)]);
    }

    #[test]
    fn test_unmatched_counts_match_occurrences() {
        let all = transactions(&["X", "Y", "X", "X", "Z", "Y"]);
        let unique = unique_of(&all);
        let report = build_report(&all, &unique, &[]);
        for summary in &report.unmatched {
            let occurrences = all.iter().filter(|t| t.original == summary.original).count();
            assert_eq!(summary.count, occurrences);
        }
        assert_eq!(report.unmatched.len(), unique.len());
    }

    #[test]
    fn test_empty_inputs_give_zero_rates() {
        let report = build_report(&[], &[], &[]);
        assert_eq!(report.identification_rate_all, 0.0);
        assert_eq!(report.identification_rate_unique, 0.0);
        assert!(report.matched_all.is_empty());
        assert!(report.unmatched.is_empty());
    }
}
