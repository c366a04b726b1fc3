use thiserror::Error;

#[derive(Error, Debug)]
pub enum TallyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid glob pattern {pattern}: {source}")]
    GlobPattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("Failed to read glob match: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("line {line}: unparseable journal date {value:?}")]
    JournalDate { line: usize, value: String },

    #[error("line {line}: unparseable posting amount {value:?}")]
    JournalAmount { line: usize, value: String },

    #[error("line {line}: posting outside of a transaction")]
    JournalOrphanPosting { line: usize },

    #[error("line {line}: more than two postings in one transaction")]
    JournalExtraPosting { line: usize },

    #[error("line {line}: incomplete transaction: {reason}")]
    JournalIncomplete { line: usize, reason: String },

    #[error("{file}: no column found for transaction field {field}")]
    CsvColumnMissing { file: String, field: &'static str },

    #[error("row {row}: too short, no cell for field {field}")]
    CsvRowShort { row: usize, field: &'static str },

    #[error("row {row}: unrecognized {field} value {value:?}")]
    CsvValue {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("row {row}: {value:?} matches none of the configured date formats")]
    CsvDate { row: usize, value: String },

    #[error("row {row}: invalid transaction: {reason}")]
    CsvInvalidRow { row: usize, reason: String },

    #[error("Invalid account-type fallback pattern {pattern:?}: {source}")]
    BadFallbackPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("No ledger tool found (tried: {0})")]
    LedgerToolNotFound(String),

    #[error("{tool} exited with {status}")]
    LedgerToolFailed { tool: String, status: String },

    #[error("No data source configured: pass --csv or --ledger (or set LEDGER_FILE)")]
    NoDataSource,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TallyError>;
