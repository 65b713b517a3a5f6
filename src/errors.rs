// src/errors.rs
use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures. Any of these aborts the run before outputs are written.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{dataset}: missing required column '{column}'")]
    InputFormat { dataset: String, column: String },

    #[error("{dataset}: row {row}: {detail}")]
    Parse {
        dataset: String,
        row: usize,
        detail: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl PipelineError {
    pub fn missing_column(dataset: &str, column: &str) -> Self {
        Self::InputFormat {
            dataset: dataset.to_string(),
            column: column.to_string(),
        }
    }

    pub fn parse(dataset: &str, row: usize, detail: impl Into<String>) -> Self {
        Self::Parse {
            dataset: dataset.to_string(),
            row,
            detail: detail.into(),
        }
    }
}
