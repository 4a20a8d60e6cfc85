use polars::error::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Column `{0}` not found in table")]
    ColumnNotFound(String),
    #[error("Unable to read CSV file `{0}`:\n\t{1}")]
    CsvReadError(String, PolarsError),
    #[error("Column `{0}` must have exactly two levels, got {1}")]
    GroupCountMismatch(String, usize),
    #[error("Error in table operation:\n\t{0}")]
    PolarsError(#[from] PolarsError),
}
