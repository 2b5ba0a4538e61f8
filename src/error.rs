//! Error type shared by every stage of the design pipeline.
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DesignError>;

/// Everything that can stop a library design.
#[derive(Debug, Error)]
pub enum DesignError {
    #[error("{what}: sequence is empty")]
    EmptySequence { what: String },

    #[error("{what}: invalid base {base:?} at position {position} (only A/C/G/T allowed)")]
    InvalidBase { what: String, position: usize, base: char },

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("not enough barcodes: needed {needed}, only {available} passed the filters")]
    InsufficientBarcodes { needed: usize, available: usize },

    #[error("no valid {which} primer within radius {radius} of the seed prefix")]
    NoPrimerFound { which: String, radius: usize },

    #[error("oligo {name} is {len} nt before padding, longer than pad_to={max}")]
    OligoTooLong { name: String, len: usize, max: usize },

    #[error("reference {0:?} not found in the reference file")]
    UnknownReference(String),

    #[error("library validation failed with {0} violation(s)")]
    ValidationFailed(usize),

    #[error("could not parse sequence file: {0}")]
    Fastx(String),

    #[error("could not build motif index: {0}")]
    MotifIndex(#[from] aho_corasick::BuildError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Table(#[from] polars::prelude::PolarsError),

    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl From<needletail::errors::ParseError> for DesignError {
    fn from(e: needletail::errors::ParseError) -> Self {
        DesignError::Fastx(e.to_string())
    }
}
