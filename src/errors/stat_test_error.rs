use thiserror::Error;

use super::{
    data_error::DataError, distribution_error::DistributionError, profile_error::ProfileError,
    statistics_error::StatisticsError,
};

/// Merges all errors of a test runner into a single error type
///
#[derive(Error, Debug)]
pub enum StatTestError {
    #[error("Profile error: {0}")]
    ProfileError(#[from] ProfileError),
    #[error("Data error: {0}")]
    DataError(#[from] DataError),
    #[error("Reference distribution error: {0}")]
    DistributionError(#[from] DistributionError),
    #[error("Statistics error: {0}")]
    StatisticsError(#[from] StatisticsError),
    #[error("Significance level must lie in (0, 1), got {0}")]
    InvalidAlpha(f64),
    #[error("P-value must lie in [0, 1], got {0}")]
    InvalidPValue(f64),
    #[error("Decision {0} does not follow from p-value {1} at significance level {2}")]
    InconsistentDecision(String, f64, f64),
}
