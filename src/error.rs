use std::io;

use thiserror::Error;

/// Reasons a set of merge groups is rejected at load time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeRuleError {
    #[error("merge group #{index} has an empty canonical name")]
    EmptyCanonical { index: usize },
    #[error("canonical name '{canonical}' is declared more than once")]
    DuplicateCanonical { canonical: String },
    #[error("source '{source_token}' is claimed by both '{first}' and '{second}'")]
    OverlappingSource {
        source_token: String,
        first: String,
        second: String,
    },
    #[error("canonical name '{canonical}' is also listed as a source of '{claimed_by}'")]
    CanonicalClaimed {
        canonical: String,
        claimed_by: String,
    },
}

/// Error type for loading, transforming and exporting incident tables.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("input has no header row")]
    EmptyInput,
    #[error("line {line}: row has {found} fields but the header has {expected}")]
    ExtraFields {
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("input is missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("invalid merge rules in {origin}: {source}")]
    MergeRules {
        origin: String,
        #[source]
        source: MergeRuleError,
    },
    #[error("configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
