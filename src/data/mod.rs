/// Column access on polars data frames
pub mod dataset;
/// Descriptive statistics of a sample
pub mod descriptive;
/// Fitting of theoretical distributions and random variate generation
pub mod generation;
