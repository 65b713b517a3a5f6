// src/ingest/mod.rs
pub mod canonical;
pub mod loader;

use log::{info, warn};
use std::collections::HashSet;

use crate::models::core::{RegistryEntity, ResolvedTransaction, TransactionRecord};

/// Transactions resolved to their `original` name, with and without duplicates.
#[derive(Debug, Clone, Default)]
pub struct ResolvedTransactions {
    /// One entry per input row, in input order.
    pub all: Vec<ResolvedTransaction>,
    /// First occurrence of each distinct `original`, in input order.
    pub unique: Vec<ResolvedTransaction>,
}

pub fn resolve_transactions(records: &[TransactionRecord]) -> ResolvedTransactions {
    let all: Vec<ResolvedTransaction> = records.iter().map(TransactionRecord::resolve).collect();

    let mut seen: HashSet<&str> = HashSet::with_capacity(all.len());
    let mut unique = Vec::new();
    for resolved in &all {
        if seen.insert(resolved.original.as_str()) {
            unique.push(resolved.clone());
        }
    }

    info!(
        "📊 Resolved {} transaction rows into {} unique transaction names",
        all.len(),
        unique.len()
    );
    ResolvedTransactions { all, unique }
}

/// Empty inputs are not fatal; later stages produce empty outputs.
pub fn warn_on_empty_inputs(registry: &[RegistryEntity], transactions: &ResolvedTransactions) {
    if registry.is_empty() {
        warn!("⚠️  Registry is empty, no transaction can be matched automatically");
    }
    if transactions.all.is_empty() {
        warn!("⚠️  Transaction set is empty, all outputs will be empty");
    }
}
