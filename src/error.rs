// ⚠️ Import Errors
// Row-level errors skip a row and are counted. Batch-level errors abort the run.

use serde::Serialize;
use thiserror::Error;

// ============================================================================
// ROW-LEVEL ERRORS (skip, count, continue)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("line {line}: missing required field '{field}'")]
    MissingField { line: usize, field: &'static str },

    #[error("line {line}: cannot parse date '{value}'")]
    DateParse { line: usize, value: String },

    #[error("line {line}: cannot parse amount '{value}'")]
    AmountParse { line: usize, value: String },

    #[error("line {line}: unknown account '{name}'")]
    UnknownAccount { line: usize, name: String },

    #[error("line {line}: unknown category '{name}'")]
    UnknownCategory { line: usize, name: String },
}

impl RowError {
    /// Bucket used by the run summary
    pub fn reason(&self) -> SkipReason {
        match self {
            RowError::MissingField { .. } => SkipReason::MissingField,
            RowError::DateParse { .. } | RowError::AmountParse { .. } => SkipReason::ParseError,
            RowError::UnknownAccount { .. } | RowError::UnknownCategory { .. } => {
                SkipReason::ReferenceNotFound
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingField,
    ParseError,
    ReferenceNotFound,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::MissingField => "missing field",
            SkipReason::ParseError => "parse error",
            SkipReason::ReferenceNotFound => "reference not found",
        }
    }
}

// ============================================================================
// BATCH-LEVEL ERRORS (fatal, nothing committed)
// ============================================================================

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("config error: {0}")]
    Config(String),

    #[error("source error: {0}")]
    Source(String),

    #[error("no free unique time slot above {nominal_time}")]
    UniquenessExhaustion { nominal_time: i64 },

    #[error("persistence failure: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("cannot serialize import summary: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("identifier {0} does not fit the store's signed 64-bit column")]
    IdentifierRange(u64),
}

pub type ImportResult<T> = std::result::Result<T, ImportError>;
