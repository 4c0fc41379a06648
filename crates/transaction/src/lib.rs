//! Transaction Model
//!
//! Transaction records as submitted for fraud scoring, and the two ingestion
//! paths the service accepts: `key=value` queries and CSV batches.

mod reader;
mod record;

pub use reader::TransactionReader;
pub use record::{Transaction, AMOUNT_FIELD, ID_FIELD, TIME_FIELD};

use thiserror::Error;

/// Errors while building or reading transactions
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Invalid pair '{0}': expected key=value")]
    InvalidPair(String),
    #[error("Field '{field}' has non-numeric value '{value}'")]
    NonNumeric { field: String, value: String },
    #[error("Empty field name")]
    EmptyField,
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
