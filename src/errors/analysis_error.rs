use thiserror::Error;

use super::{
    data_error::DataError, distribution_error::DistributionError, plot_error::PlotError,
    stat_test_error::StatTestError, statistics_error::StatisticsError,
};

/// Errors of the exploratory analyzers
///
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Data error: {0}")]
    DataError(#[from] DataError),
    #[error("Statistics error: {0}")]
    StatisticsError(#[from] StatisticsError),
    #[error("Distribution error: {0}")]
    DistributionError(#[from] DistributionError),
    #[error("Test error: {0}")]
    StatTestError(#[from] StatTestError),
    #[error("Plot error: {0}")]
    PlotError(#[from] PlotError),
    #[error("Levels of the observed ({0:?}) and expected ({1:?}) frequencies differ")]
    CategoryMismatch(Vec<String>, Vec<String>),
}
