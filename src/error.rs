use thiserror::Error;

/// Problems with the shape of the chart of accounts or with postings that
/// cannot be placed in it. Any of these aborts the report run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("Account '{account}' appears more than once in the account metadata")]
    DuplicateAccount { account: String },

    #[error("Account '{account}' references missing parent '{parent}'")]
    DanglingParent { account: String, parent: String },

    #[error("Account '{account}' is part of a parent cycle")]
    Cycle { account: String },

    #[error("Posting references unknown account '{account}'")]
    UnknownAccount { account: String },

    #[error("Group account '{account}' has direct postings")]
    PostingToGroup { account: String },

    #[error("Account '{account}' total for '{key}' is {actual}, children sum to {expected}")]
    TotalMismatch {
        account: String,
        key: String,
        actual: String,
        expected: String,
    },
}

#[derive(Error, Debug)]
pub enum FinancialReportError {
    #[error("Integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    #[error("Failed to fetch ledger data: {0}")]
    DataFetch(String),

    #[error("Duplicate period key: {0}")]
    DuplicatePeriodKey(String),

    #[error("Invalid date range '{label}': {details}")]
    InvalidDateRange { label: String, details: String },

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FinancialReportError>;
