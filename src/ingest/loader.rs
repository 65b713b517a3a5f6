// src/ingest/loader.rs
use csv::{ReaderBuilder, StringRecord};
use log::{debug, warn};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::errors::PipelineError;
use crate::ingest::canonical::canonicalize_cell;
use crate::models::core::{EntityId, RegistryEntity, TransactionRecord};
use crate::models::matching::ManualMatch;

pub const REGISTRY_DATASET: &str = "registry";
pub const TRANSACTION_DATASET: &str = "transactions";
pub const FALSE_POSITIVE_DATASET: &str = "false positives";
pub const MANUAL_MATCH_DATASET: &str = "manual matches";

const ID_COLUMNS: [&str; 2] = ["id", "_id"];
const ENTITY_ID_COLUMNS: [&str; 3] = ["entityId", "id", "_id"];

/// Header lookup for one dataset.
struct Columns {
    dataset: &'static str,
    headers: StringRecord,
}

impl Columns {
    fn find(&self, candidates: &[&str]) -> Option<usize> {
        candidates
            .iter()
            .find_map(|name| self.headers.iter().position(|h| h.trim() == *name))
    }

    fn require(&self, candidates: &[&str]) -> Result<usize, PipelineError> {
        self.find(candidates)
            .ok_or_else(|| PipelineError::missing_column(self.dataset, candidates[0]))
    }
}

fn open(path: &Path) -> Result<File, PipelineError> {
    File::open(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_rows<R: Read>(
    reader: R,
    dataset: &'static str,
) -> Result<(Columns, Vec<StringRecord>), PipelineError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let csv_err = |source| record_error(dataset, source);
    let headers = rdr.headers().map_err(csv_err)?.clone();
    let mut rows = Vec::new();
    for record in rdr.records() {
        rows.push(record.map_err(csv_err)?);
    }
    debug!("Read {} rows from {} dataset", rows.len(), dataset);
    Ok((Columns { dataset, headers }, rows))
}

/// A cell that cannot be decoded as text is a parse error on its row; anything
/// else the reader reports is passed through.
fn record_error(dataset: &'static str, source: csv::Error) -> PipelineError {
    if let csv::ErrorKind::Utf8 { pos, err } = source.kind() {
        let row = pos.as_ref().map_or(0, |p| p.line() as usize);
        return PipelineError::parse(
            dataset,
            row,
            format!("field {} is not valid UTF-8", err.field() + 1),
        );
    }
    PipelineError::Csv {
        path: dataset.into(),
        source,
    }
}

/// Reads registry rows. `id` (or `_id`) and `companyName` are required columns.
/// A row with a blank id is kept without one; a missing company name becomes empty.
pub fn read_registry<R: Read>(reader: R) -> Result<Vec<RegistryEntity>, PipelineError> {
    let (columns, rows) = read_rows(reader, REGISTRY_DATASET)?;
    let id_idx = columns.require(&ID_COLUMNS)?;
    let name_idx = columns.require(&["companyName"])?;

    let mut entities = Vec::with_capacity(rows.len());
    let mut missing_ids = 0;
    for row in &rows {
        let id = canonicalize_cell(row.get(id_idx)).map(EntityId);
        if id.is_none() {
            missing_ids += 1;
        }
        let company_name = canonicalize_cell(row.get(name_idx)).unwrap_or_default();
        entities.push(RegistryEntity { id, company_name });
    }
    if missing_ids > 0 {
        warn!(
            "{} registry rows have no id; their matches are written with an empty entityId",
            missing_ids
        );
    }
    Ok(entities)
}

pub fn read_transactions<R: Read>(reader: R) -> Result<Vec<TransactionRecord>, PipelineError> {
    let (columns, rows) = read_rows(reader, TRANSACTION_DATASET)?;
    let merchant_idx = columns.require(&["merchant_name"])?;
    let name_idx = columns.require(&["name"])?;

    Ok(rows
        .iter()
        .map(|row| TransactionRecord {
            merchant_name: canonicalize_cell(row.get(merchant_idx)),
            name: canonicalize_cell(row.get(name_idx)),
        })
        .collect())
}

/// Originals judged to be wrong automated matches. Blank rows are skipped.
pub fn read_false_positives<R: Read>(reader: R) -> Result<Vec<String>, PipelineError> {
    let (columns, rows) = read_rows(reader, FALSE_POSITIVE_DATASET)?;
    let original_idx = columns.require(&["original"])?;

    Ok(rows
        .iter()
        .filter_map(|row| canonicalize_cell(row.get(original_idx)))
        .collect())
}

/// Curated matches. The entity id column is optional; when present it may be
/// named `entityId`, `id` or `_id`.
pub fn read_manual_matches<R: Read>(reader: R) -> Result<Vec<ManualMatch>, PipelineError> {
    let (columns, rows) = read_rows(reader, MANUAL_MATCH_DATASET)?;
    let original_idx = columns.require(&["original"])?;
    let name_idx = columns.require(&["companyName"])?;
    let entity_idx = columns.find(&ENTITY_ID_COLUMNS);

    let mut matches = Vec::with_capacity(rows.len());
    for row in &rows {
        let Some(original) = canonicalize_cell(row.get(original_idx)) else {
            continue;
        };
        matches.push(ManualMatch {
            original,
            company_name: canonicalize_cell(row.get(name_idx)).unwrap_or_default(),
            entity_id: entity_idx
                .and_then(|idx| canonicalize_cell(row.get(idx)))
                .map(EntityId),
        });
    }
    Ok(matches)
}

pub fn load_registry(path: &Path) -> Result<Vec<RegistryEntity>, PipelineError> {
    read_registry(open(path)?).map_err(|e| with_path(e, path))
}

pub fn load_transactions(path: &Path) -> Result<Vec<TransactionRecord>, PipelineError> {
    read_transactions(open(path)?).map_err(|e| with_path(e, path))
}

pub fn load_false_positives(path: &Path) -> Result<Vec<String>, PipelineError> {
    read_false_positives(open(path)?).map_err(|e| with_path(e, path))
}

pub fn load_manual_matches(path: &Path) -> Result<Vec<ManualMatch>, PipelineError> {
    read_manual_matches(open(path)?).map_err(|e| with_path(e, path))
}

/// CSV errors are raised against the dataset name; swap in the real path.
fn with_path(err: PipelineError, path: &Path) -> PipelineError {
    match err {
        PipelineError::Csv { source, .. } => PipelineError::Csv {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    }
}
