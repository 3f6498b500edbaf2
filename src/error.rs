use thiserror::Error;

use crate::models::Field;

#[derive(Error, Debug)]
pub enum MonthbookError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Xlsx(String),

    #[error("No header row containing {0} found in the upload")]
    MissingHeader(String),

    #[error("Could not resolve a {0} column in the upload header")]
    MissingColumn(Field),

    #[error("Rule source unavailable: {0}")]
    RuleSource(String),

    #[error("Failed to save period {period}: {reason}")]
    StoreWrite { period: String, reason: String },

    #[error("Invalid period key: {0} (expected YYYYMM)")]
    InvalidPeriod(String),

    #[error("No transactions stored for period {0}. Run `monthbook import <file> --period {0}` first.")]
    PeriodEmpty(String),

    #[error("Invalid edit: {0}")]
    InvalidEdit(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, MonthbookError>;
