// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use merchant_match_lib::normalization::SuffixAnchoring;
use merchant_match_lib::run_pipeline;
use merchant_match_lib::utils::constants::{
    DEFAULT_FUZZY_JOIN_THRESHOLD, DEFAULT_STRING_GROUPER_THRESHOLD,
};
use merchant_match_lib::utils::env::load_env;
use merchant_match_lib::utils::pipeline_config::{
    InputPaths, MatcherTuning, OutputPaths, PipelineConfig, Thresholds,
};
use merchant_match_lib::utils::progress_config::ProgressConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Company registry CSV (`id`, `companyName`)
    #[arg(long, env = "BRAND_DB")]
    brand_db: PathBuf,

    /// Transaction CSV (`merchant_name`, `name`)
    #[arg(long, env = "TRANSACTION_DB")]
    transaction_db: PathBuf,

    /// Manual matches CSV (`original`, `companyName`, optional `entityId`)
    #[arg(long, env = "MANUAL_MATCH")]
    manual_match: Option<PathBuf>,

    /// False positives CSV (`original`)
    #[arg(long, env = "FALSE_POS")]
    false_pos: Option<PathBuf>,

    #[arg(long, env = "MATCHED_UNIQUE", default_value = "matched_unique.csv")]
    matched_unique: PathBuf,

    #[arg(long, env = "UNMATCHED", default_value = "unmatched.csv")]
    unmatched: PathBuf,

    /// Every transaction row joined to its company
    #[arg(long, env = "MATCHED_ALL")]
    matched_all: Option<PathBuf>,

    /// JSON run summary
    #[arg(long, env = "SUMMARY_OUT")]
    summary_out: Option<PathBuf>,

    /// Directory for raw per-matcher candidate dumps
    #[arg(long, env = "CANDIDATES_DIR")]
    candidates_dir: Option<PathBuf>,

    /// Acceptance threshold for the fuzzy join
    #[arg(long = "threshold-1", env = "THRESHOLD_1", default_value_t = DEFAULT_FUZZY_JOIN_THRESHOLD)]
    threshold_1: f64,

    /// Acceptance threshold for the string grouper
    #[arg(long = "threshold-2", env = "THRESHOLD_2", default_value_t = DEFAULT_STRING_GROUPER_THRESHOLD)]
    threshold_2: f64,

    #[arg(long, env = "SUFFIX_ANCHORING", value_enum, default_value_t = SuffixAnchoring::Anywhere)]
    suffix_anchoring: SuffixAnchoring,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    load_env();
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();
    info!("Starting merchant name reconciliation");

    let config = PipelineConfig {
        inputs: InputPaths {
            registry: args.brand_db,
            transactions: args.transaction_db,
            manual_matches: args.manual_match,
            false_positives: args.false_pos,
        },
        outputs: OutputPaths::new(
            args.matched_unique,
            args.unmatched,
            args.matched_all,
            args.summary_out,
            args.candidates_dir,
        ),
        thresholds: Thresholds::new(args.threshold_1, args.threshold_2)
            .context("Invalid acceptance thresholds")?,
        suffix_anchoring: args.suffix_anchoring,
        tuning: MatcherTuning::from_env(),
        progress: ProgressConfig::from_env(),
    };

    let output = run_pipeline(&config).context("Merchant matching run failed")?;
    for path in &output.written {
        info!("  {}", path.display());
    }
    Ok(())
}
