// Include readme in doc
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Readme.md"))]

/// Univariate and bivariate exploratory analysis
pub mod analysis;
/// Constants used throughout the crate
pub mod constants;
/// Data loading, descriptive statistics and distribution fitting
pub mod data;
/// Error types
pub mod errors;
/// Convenience functions
pub mod functions;
/// Statistical test runners and their result records
pub mod inference;
/// Statistical test profiles
pub mod profile;
/// Id generators
pub mod service;
/// Test statistics and their distributions
pub mod statistics;
/// Plot configuration and rendering
pub mod visual;
