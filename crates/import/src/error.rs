use thiserror::Error;

/// Failure while turning raw statement content into canonical entries.
/// Always fixable on the file side; never retried automatically.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("empty input")]
    EmptyInput,
    #[error("unrecognized layout: {0}")]
    UnrecognizedLayout(String),
    #[error("record {record} is structurally short: {reason}")]
    ShortRecord { record: usize, reason: String },
    #[error("invalid date '{value}' in record {record}")]
    InvalidDate { record: usize, value: String },
    #[error("invalid amount '{value}' in record {record}")]
    InvalidAmount { record: usize, value: String },
    #[error("malformed document: {0}")]
    Malformed(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("no transactions found in input")]
    NoTransactions,
}

/// Caller-side mistake, reported distinctly from decode failures so the
/// request gets fixed rather than the file.
#[derive(Debug, Error)]
pub enum UsageError {
    #[error("unknown statement format '{0}' (expected one of: ofx, csv, xml, cnab)")]
    UnknownFormat(String),
}
