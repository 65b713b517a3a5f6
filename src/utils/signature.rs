// src/utils/signature.rs
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::Path;

use crate::errors::PipelineError;

/// Hex SHA-256 of a file's bytes, recorded in the run summary so a report can
/// be tied back to the exact inputs that produced it.
pub fn file_signature(path: &Path) -> Result<String, PipelineError> {
    let mut file = File::open(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(hex::encode(hasher.finalize()))
}
