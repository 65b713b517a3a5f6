// src/bin/threshold_sweep.rs
//
// Prints how many unique transaction names each matcher would accept at a range
// of thresholds, with a few sample pairs per tier, to help pick --threshold-1
// and --threshold-2.

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use merchant_match_lib::ingest::resolve_transactions;
use merchant_match_lib::matching::manager::{default_matchers, run_matchers};
use merchant_match_lib::normalization::{Normalizer, SuffixAnchoring};
use merchant_match_lib::pipeline::{key_inputs, load_inputs};
use merchant_match_lib::reporting::identification_rate;
use merchant_match_lib::reporting::sweep::{default_tiers, sweep_tiers};
use merchant_match_lib::utils::constants::{
    DEFAULT_FUZZY_JOIN_THRESHOLD, DEFAULT_STRING_GROUPER_THRESHOLD,
};
use merchant_match_lib::utils::env::load_env;
use merchant_match_lib::utils::pipeline_config::{InputPaths, MatcherTuning, Thresholds};
use merchant_match_lib::utils::progress_config::ProgressConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct SweepArgs {
    #[arg(long, env = "BRAND_DB")]
    brand_db: PathBuf,

    #[arg(long, env = "TRANSACTION_DB")]
    transaction_db: PathBuf,

    #[arg(long, env = "SUFFIX_ANCHORING", value_enum, default_value_t = SuffixAnchoring::Anywhere)]
    suffix_anchoring: SuffixAnchoring,

    /// Sample pairs shown per tier
    #[arg(long, default_value_t = 3)]
    samples: usize,
}

fn main() -> Result<()> {
    load_env();
    let args = SweepArgs::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let inputs = load_inputs(&InputPaths {
        registry: args.brand_db,
        transactions: args.transaction_db,
        manual_matches: None,
        false_positives: None,
    })?;
    let transactions = resolve_transactions(&inputs.transactions);
    let normalizer = Normalizer::from_anchoring(args.suffix_anchoring);
    let (left, right) = key_inputs(&inputs.registry, &transactions, &normalizer);

    let thresholds = Thresholds::new(DEFAULT_FUZZY_JOIN_THRESHOLD, DEFAULT_STRING_GROUPER_THRESHOLD)?;
    let matchers = default_matchers(&thresholds, &MatcherTuning::from_env());
    let runs = run_matchers(&matchers, &left, &right, &ProgressConfig::from_env());

    let tiers = default_tiers();
    for run in runs.iter().filter(|r| r.enabled) {
        info!("=== {} (configured threshold {:.2}) ===", run.method, run.threshold);
        for tier in sweep_tiers(run, &tiers, args.samples) {
            info!(
                "  ≥ {:.2}: {:>6} names ({:.1}% of {})",
                tier.threshold,
                tier.accepted_names,
                identification_rate(tier.accepted_names, left.len()) * 100.0,
                left.len()
            );
            for sample in &tier.samples {
                info!(
                    "        {:.3}  {}  ->  {}",
                    sample.score, sample.transaction_original, sample.company_name
                );
            }
        }
    }
    Ok(())
}
