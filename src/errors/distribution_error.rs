use statrs::StatsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DistributionError {
    /// Name of the distribution is not supported by the generator
    #[error("Distribution `{0}` is not supported.")]
    NotImplemented(String),
    /// Fitting requires data the estimator can not handle, with a hint to the reason
    #[error("Unable to fit `{0}` to the data: {1}")]
    FitError(String, &'static str),
    #[error("Invalid parameters for `{0}`:\n\t{1}")]
    ParameterError(String, StatsError),
}
