/// Errors of the univariate and bivariate analyzers
pub mod analysis_error;
/// Errors related to reading the identity store
pub mod id_error;
/// Errors related to tabular data access
pub mod data_error;
/// Errors raised when fitting or sampling theoretical distributions
pub mod distribution_error;
/// Errors raised while drawing plots
pub mod plot_error;
/// Errors related to the statistical test profiles
pub mod profile_error;
/// Errors of the statistic computations
pub mod statistics_error;
/// Merges all errors a test runner may return
pub mod stat_test_error;
