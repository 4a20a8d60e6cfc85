/// Common result record, decision rule and the test runner trait
pub mod base;
/// Chi-square goodness of fit test
pub mod chisquare_gof;
/// Chi-square test of independence
pub mod chisquare_independence;
/// Pearson and Spearman correlation tests
pub mod correlation;
/// One and two sample Kolmogorov-Smirnov tests
pub mod kstest;
/// Independent samples t test
pub mod ttest;
