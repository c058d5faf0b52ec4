use thiserror::Error;

#[derive(Error, Debug)]
pub enum BudgetError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid period {year}-{month}: month must be between 1 and 12")]
    InvalidPeriod { year: i32, month: u32 },

    #[error("Could not find month columns. Use a header like \"Jan 2025\" or \"2025-01\"")]
    NoPeriodColumnsFound,

    #[error("Spreadsheet must have at least a header row and one data row (found {rows} rows)")]
    EmptySheet { rows: usize },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BudgetError>;
