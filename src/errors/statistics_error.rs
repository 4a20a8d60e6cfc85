use statrs::StatsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatisticsError {
    #[error("At least {0} observations are required, got {1}")]
    TooFewObservations(usize, usize),
    #[error("Samples must have the same length, got {0} and {1}")]
    LengthMismatch(usize, usize),
    #[error("Sum of observed frequencies ({0}) differs from sum of expected frequencies ({1})")]
    FrequencySumMismatch(f64, f64),
    #[error("Expected frequency table contains a zero element")]
    ZeroExpectedFrequency,
    #[error("Input contains values which are not finite")]
    NonFiniteInput,
    #[error("Sample has zero variance")]
    ZeroVariance,
    #[error("Invalid distribution parameters:\n\t{0}")]
    DistributionError(#[from] StatsError),
}
