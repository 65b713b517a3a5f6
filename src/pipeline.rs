// src/pipeline.rs
//
// One-shot batch run: load, normalize, match, threshold and merge, apply
// overrides, report, write. Each stage consumes the previous stage's output and
// nothing is written until every stage has succeeded.

use anyhow::{Context, Result};
use chrono::Utc;
use log::info;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

use crate::ingest::loader::{
    load_false_positives, load_manual_matches, load_registry, load_transactions,
};
use crate::ingest::{resolve_transactions, warn_on_empty_inputs, ResolvedTransactions};
use crate::matching::key_names;
use crate::matching::manager::{default_matchers, run_matchers, threshold_and_merge, MatcherRun};
use crate::models::core::{RegistryEntity, RegistryNameIndex, TransactionRecord};
use crate::models::matching::{AcceptedMatch, KeyedName, ManualMatch};
use crate::models::stats_models::{InputSignature, PipelineRunSummary};
use crate::normalization::Normalizer;
use crate::overrides::apply_overrides;
use crate::reporting::report::{build_report, Report};
use crate::reporting::writer::{
    write_candidate_dumps, write_matched_all, write_unique_matches, write_unmatched,
    StagedOutputs,
};
use crate::utils::pipeline_config::{InputPaths, OutputPaths, PipelineConfig};
use crate::utils::signature::file_signature;

/// Everything read from disk for one run.
#[derive(Debug, Clone)]
pub struct LoadedInputs {
    pub registry: Vec<RegistryEntity>,
    pub transactions: Vec<TransactionRecord>,
    pub false_positives: Vec<String>,
    pub manual_matches: Vec<ManualMatch>,
    pub signatures: Vec<InputSignature>,
}

fn signature(path: &Path, rows: usize) -> Result<InputSignature> {
    let sha256 = file_signature(path)
        .with_context(|| format!("Failed to hash input {}", path.display()))?;
    Ok(InputSignature {
        path: path.display().to_string(),
        sha256,
        rows,
    })
}

pub fn load_inputs(inputs: &InputPaths) -> Result<LoadedInputs> {
    let registry = load_registry(&inputs.registry).context("Failed to load registry dataset")?;
    let transactions =
        load_transactions(&inputs.transactions).context("Failed to load transaction dataset")?;
    let false_positives = match &inputs.false_positives {
        Some(path) => load_false_positives(path).context("Failed to load false-positive list")?,
        None => Vec::new(),
    };
    let manual_matches = match &inputs.manual_matches {
        Some(path) => load_manual_matches(path).context("Failed to load manual-match list")?,
        None => Vec::new(),
    };

    let mut signatures = vec![
        signature(&inputs.registry, registry.len())?,
        signature(&inputs.transactions, transactions.len())?,
    ];
    if let Some(path) = &inputs.false_positives {
        signatures.push(signature(path, false_positives.len())?);
    }
    if let Some(path) = &inputs.manual_matches {
        signatures.push(signature(path, manual_matches.len())?);
    }

    info!(
        "📥 Loaded {} registry entities, {} transaction rows, {} false positives, {} manual matches",
        registry.len(),
        transactions.len(),
        false_positives.len(),
        manual_matches.len()
    );
    Ok(LoadedInputs {
        registry,
        transactions,
        false_positives,
        manual_matches,
        signatures,
    })
}

/// Comparison keys for unique transaction names (left) and registry names (right).
pub fn key_inputs(
    registry: &[RegistryEntity],
    transactions: &ResolvedTransactions,
    normalizer: &Normalizer,
) -> (Vec<KeyedName>, Vec<KeyedName>) {
    let left = key_names(transactions.unique.iter().map(|t| t.original.as_str()), normalizer);
    let right = key_names(registry.iter().map(|e| e.company_name.as_str()), normalizer);
    (left, right)
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub accepted: Vec<AcceptedMatch>,
    pub report: Report,
    pub summary: PipelineRunSummary,
    pub written: Vec<PathBuf>,
}

fn record_phase(phase_times: &mut BTreeMap<String, f64>, name: &str, start: Instant) {
    let elapsed = start.elapsed();
    info!("⏱️  {} finished in {:.2?}", name, elapsed);
    phase_times.insert(name.to_string(), elapsed.as_secs_f64());
}

pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineOutput> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let run_start = Instant::now();
    let mut phase_times = BTreeMap::new();
    info!("🚀 Starting merchant matching run {}", run_id);
    config.log_config();

    let phase_start = Instant::now();
    let inputs = load_inputs(&config.inputs)?;
    let transactions = resolve_transactions(&inputs.transactions);
    warn_on_empty_inputs(&inputs.registry, &transactions);
    record_phase(&mut phase_times, "load", phase_start);

    let phase_start = Instant::now();
    let normalizer = Normalizer::from_anchoring(config.suffix_anchoring);
    let (left, right) = key_inputs(&inputs.registry, &transactions, &normalizer);
    record_phase(&mut phase_times, "normalize", phase_start);

    let phase_start = Instant::now();
    let matchers = default_matchers(&config.thresholds, &config.tuning);
    let runs = run_matchers(&matchers, &left, &right, &config.progress);
    record_phase(&mut phase_times, "match", phase_start);

    let phase_start = Instant::now();
    let name_index = RegistryNameIndex::build(&inputs.registry);
    let merged = threshold_and_merge(&runs, &name_index);
    record_phase(&mut phase_times, "merge", phase_start);

    let phase_start = Instant::now();
    let outcome = apply_overrides(
        merged.accepted,
        &transactions.unique,
        &inputs.false_positives,
        &inputs.manual_matches,
        &name_index,
    );
    record_phase(&mut phase_times, "overrides", phase_start);

    let phase_start = Instant::now();
    let report = build_report(&transactions.all, &transactions.unique, &outcome.accepted);
    report.log_summary();
    record_phase(&mut phase_times, "report", phase_start);

    let summary = PipelineRunSummary {
        run_id,
        started_at,
        suffix_anchoring: config.suffix_anchoring,
        inputs: inputs.signatures,
        registry_entities: inputs.registry.len(),
        transactions_total: transactions.all.len(),
        transactions_unique: transactions.unique.len(),
        method_stats: merged.method_stats,
        overrides: outcome.stats,
        matched_unique: report.matched_unique,
        unmatched_unique: report.unmatched.len(),
        identification_rate_all: report.identification_rate_all,
        identification_rate_unique: report.identification_rate_unique,
        phase_times_secs: phase_times,
        total_processing_time_secs: run_start.elapsed().as_secs_f64(),
    };

    let written = write_outputs(&config.outputs, &outcome.accepted, &report, &runs, &summary)
        .context("Failed to write outputs")?;

    info!(
        "✅ Run {} complete: {} of {} unique transaction names matched in {:.2?}",
        run_id,
        report.matched_unique,
        report.total_unique,
        run_start.elapsed()
    );
    Ok(PipelineOutput {
        accepted: outcome.accepted,
        report,
        summary,
        written,
    })
}

fn write_outputs(
    paths: &OutputPaths,
    accepted: &[AcceptedMatch],
    report: &Report,
    runs: &[MatcherRun],
    summary: &PipelineRunSummary,
) -> Result<Vec<PathBuf>> {
    let mut outputs = StagedOutputs::new();
    write_unique_matches(&mut outputs, &paths.matched_unique, accepted)?;
    write_unmatched(&mut outputs, &paths.unmatched, &report.unmatched)?;
    if let Some(path) = &paths.matched_all {
        write_matched_all(&mut outputs, path, &report.matched_all)?;
    }
    if let Some(dir) = &paths.candidates_dir {
        write_candidate_dumps(&mut outputs, dir, runs)?;
    }
    if let Some(path) = &paths.summary {
        outputs.write_json(path, summary)?;
    }
    Ok(outputs.commit()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PipelineError;
    use crate::models::core::EntityId;
    use crate::normalization::SuffixAnchoring;
    use crate::utils::constants::{DEFAULT_FUZZY_JOIN_THRESHOLD, DEFAULT_STRING_GROUPER_THRESHOLD};
    use crate::utils::pipeline_config::{MatcherTuning, Thresholds};
    use crate::utils::progress_config::ProgressConfig;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::TempDir;

    const REGISTRY: &str = "id,companyName,industry\n\
        1,Acme Inc,retail\n\
        2,Starbucks Corporation,food\n\
        3,Uber Eats,delivery\n\
        4,XYZ Widgets LLC,manufacturing\n";

    const TRANSACTIONS: &str = "merchant_name,name,amount\n\
        ,ACME INC #4471,10.00\n\
        ,STARBUCKS 123,3.50\n\
        ,Uber Eats,12.00\n\
        UBER EATS,UBER EATS 8005921234,9.25\n\
        ,SQ *WDGT SHOP,5.00\n\
        ,ZZQX,1.00\n\
        ,ZZQX,1.00\n";

    const FALSE_POSITIVES: &str = "original\nSTARBUCKS 123\n";

    const MANUAL_MATCHES: &str = "original,companyName\nSQ *WDGT SHOP,XYZ Widgets LLC\n";

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn config(dir: &Path, inputs: InputPaths) -> PipelineConfig {
        let out = dir.join("out");
        PipelineConfig {
            inputs,
            outputs: OutputPaths::new(
                out.join("matches"),
                out.join("unmatched"),
                Some(out.join("matched_all")),
                Some(out.join("summary.json")),
                Some(out.join("candidates")),
            ),
            thresholds: Thresholds::new(
                DEFAULT_FUZZY_JOIN_THRESHOLD,
                DEFAULT_STRING_GROUPER_THRESHOLD,
            )
            .unwrap(),
            suffix_anchoring: SuffixAnchoring::default(),
            tuning: MatcherTuning::default(),
            progress: ProgressConfig::disabled(),
        }
    }

    fn full_inputs(dir: &Path) -> InputPaths {
        InputPaths {
            registry: write(dir, "registry.csv", REGISTRY),
            transactions: write(dir, "transactions.csv", TRANSACTIONS),
            manual_matches: Some(write(dir, "manual.csv", MANUAL_MATCHES)),
            false_positives: Some(write(dir, "false_positives.csv", FALSE_POSITIVES)),
        }
    }

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        let mut rdr = csv::Reader::from_path(path).unwrap();
        rdr.records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_end_to_end_scenarios() {
        let dir = TempDir::new().unwrap();
        let output = run_pipeline(&config(dir.path(), full_inputs(dir.path()))).unwrap();

        let acme = output
            .accepted
            .iter()
            .find(|m| m.original == "ACME INC #4471")
            .unwrap();
        assert_eq!(acme.company_name, "Acme Inc");
        assert_eq!(acme.entity_id, Some(EntityId::from("1")));

        let manual = output
            .accepted
            .iter()
            .find(|m| m.original == "SQ *WDGT SHOP")
            .unwrap();
        assert_eq!(manual.company_name, "XYZ Widgets LLC");
        assert_eq!(manual.entity_id, Some(EntityId::from("4")));

        assert!(output.accepted.iter().all(|m| m.original != "STARBUCKS 123"));
        let unmatched: Vec<(&str, usize)> = output
            .report
            .unmatched
            .iter()
            .map(|u| (u.original.as_str(), u.count))
            .collect();
        assert_eq!(unmatched, vec![("ZZQX", 2), ("STARBUCKS 123", 1)]);

        let uber_unique = output.accepted.iter().filter(|m| m.original == "UBER EATS").count();
        let uber_all = output
            .report
            .matched_all
            .iter()
            .filter(|m| m.original == "UBER EATS")
            .count();
        assert_eq!(uber_unique, 1);
        assert_eq!(uber_all, 2);

        assert!((output.report.identification_rate_all - 4.0 / 7.0).abs() < 1e-12);
        assert!((output.report.identification_rate_unique - 3.0 / 5.0).abs() < 1e-12);
        assert_eq!(output.summary.overrides.false_positives_removed, 1);
        assert_eq!(output.summary.overrides.manual_matches_added, 1);
    }

    #[test]
    fn test_outputs_written_with_expected_shape() {
        let dir = TempDir::new().unwrap();
        let output = run_pipeline(&config(dir.path(), full_inputs(dir.path()))).unwrap();
        let out = dir.path().join("out");

        let matches = read_rows(&out.join("matches.csv"));
        assert_eq!(
            matches,
            vec![
                vec!["ACME INC #4471", "Acme Inc", "1"],
                vec!["UBER EATS", "Uber Eats", "3"],
                vec!["SQ *WDGT SHOP", "XYZ Widgets LLC", "4"],
            ]
        );
        let unmatched = read_rows(&out.join("unmatched.csv"));
        assert_eq!(unmatched, vec![vec!["ZZQX", "2"], vec!["STARBUCKS 123", "1"]]);
        assert_eq!(read_rows(&out.join("matched_all.csv")).len(), 4);
        assert!(out.join("candidates/candidates_fuzzy_join.csv").exists());
        assert!(out.join("candidates/candidates_string_grouper.csv").exists());
        assert!(!out.join("candidates/candidates_nearest_neighbor.csv").exists());

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("summary.json")).unwrap()).unwrap();
        assert_eq!(summary["run_id"], output.summary.run_id.to_string());
        assert_eq!(summary["inputs"].as_array().unwrap().len(), 4);
        assert_eq!(summary["transactions_total"], 7);
        assert_eq!(output.written.len(), 6);
    }

    #[test]
    fn test_accepted_and_unmatched_partition_unique_names() {
        let dir = TempDir::new().unwrap();
        let output = run_pipeline(&config(dir.path(), full_inputs(dir.path()))).unwrap();
        let accepted: HashSet<&str> = output.accepted.iter().map(|m| m.original.as_str()).collect();
        let unmatched: HashSet<&str> =
            output.report.unmatched.iter().map(|u| u.original.as_str()).collect();
        assert!(accepted.is_disjoint(&unmatched));
        assert_eq!(accepted.len() + unmatched.len(), output.summary.transactions_unique);
    }

    #[test]
    fn test_optional_lists_and_empty_transactions() {
        let dir = TempDir::new().unwrap();
        let inputs = InputPaths {
            registry: write(dir.path(), "registry.csv", REGISTRY),
            transactions: write(dir.path(), "transactions.csv", "merchant_name,name\n"),
            manual_matches: None,
            false_positives: None,
        };
        let output = run_pipeline(&config(dir.path(), inputs)).unwrap();
        assert!(output.accepted.is_empty());
        assert_eq!(output.report.identification_rate_all, 0.0);
        assert_eq!(output.report.identification_rate_unique, 0.0);
        assert_eq!(
            fs::read_to_string(dir.path().join("out/unmatched.csv")).unwrap(),
            "original,count\n"
        );
    }

    #[test]
    fn test_missing_column_fails_without_outputs() {
        let dir = TempDir::new().unwrap();
        let inputs = InputPaths {
            registry: write(dir.path(), "registry.csv", "id,name\n1,Acme Inc\n"),
            transactions: write(dir.path(), "transactions.csv", TRANSACTIONS),
            manual_matches: None,
            false_positives: None,
        };
        let err = run_pipeline(&config(dir.path(), inputs)).unwrap_err();
        assert!(err.to_string().contains("registry"));
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::InputFormat { .. })
        ));
        assert!(!dir.path().join("out").exists());
    }
}
