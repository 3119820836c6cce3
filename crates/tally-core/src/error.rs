//! Error types for Tally

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid dataset: {0}")]
    Validation(#[from] ValidationError),

    #[error("Person not found: {0}")]
    NotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Narrative generation failed: {0}")]
    Narrative(String),
}

impl Error {
    /// Whether a batch caller may skip this failure and keep going.
    ///
    /// Unknown-person lookups are recoverable per record; structural
    /// validation failures reject the whole dataset.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::Narrative(_))
    }
}

/// A structural defect found while validating a dataset.
///
/// Carries enough position information (record index, transaction index)
/// to localize the defect in the source document. Any single defect
/// rejects the dataset wholesale.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("dataset has no records collection")]
    MissingRecords,

    #[error("record {record}: missing or empty field `{field}`")]
    Record { record: usize, field: &'static str },

    #[error("record {record}: duplicate id `{id}`")]
    DuplicateId { record: usize, id: String },

    #[error("record {record}: invalid value for `{field}`: {value}")]
    RecordValue {
        record: usize,
        field: &'static str,
        value: String,
    },

    #[error("record {record}, transaction {transaction}: missing or empty field `{field}`")]
    Transaction {
        record: usize,
        transaction: usize,
        field: &'static str,
    },

    #[error("record {record}, transaction {transaction}: invalid value for `{field}`: {value}")]
    TransactionValue {
        record: usize,
        transaction: usize,
        field: &'static str,
        value: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
