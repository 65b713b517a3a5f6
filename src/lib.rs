pub mod errors;
pub mod ingest;
pub mod matching;
pub mod models;
pub mod normalization;
pub mod overrides;
pub mod pipeline;
pub mod reporting;
pub mod utils;

pub use errors::PipelineError;
pub use models::core::{EntityId, RegistryEntity, ResolvedTransaction, TransactionRecord};
pub use models::matching::{AcceptedMatch, MatchCandidate, MatchMethodType, UnmatchedSummary};
pub use normalization::{NormalizedKey, Normalizer, SuffixAnchoring};
pub use pipeline::{run_pipeline, PipelineOutput};
