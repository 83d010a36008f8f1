use thiserror::Error;

/// Validation and contract errors exposed by `vstock-data`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid interval '{value}', expected one of D, W, M")]
    InvalidInterval { value: String },
    #[error("invalid source '{value}', expected one of tcbs, yfinance, bigquery")]
    InvalidSource { value: String },

    #[error("invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate { value: String },
    #[error("start date {start} is after end date {end}")]
    InvertedDateRange { start: String, end: String },

    #[error("source '{source_id}' requires a credential")]
    MissingCredential { source_id: &'static str },
    #[error("{field} '{value}' is not a valid identifier")]
    InvalidIdentifier { field: &'static str, value: String },
}

/// Top-level error type for configuration parsing.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
