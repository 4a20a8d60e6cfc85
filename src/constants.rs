/// Default location of the statistical test profiles
///
pub const STAT_CONFIG: &'static str = "config/stats.yml";

/// Default significance level
///
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Name for the first sample when the data is not taken from a table
///
pub const FIRST_SAMPLE_NAME: &'static str = "Sample 1";

/// Name for the second sample when the data is not taken from a table
///
pub const SECOND_SAMPLE_NAME: &'static str = "Sample 2";

/// Symbol of the chi-square statistic
///
pub const CHI_SQUARE_SYMBOL: &'static str = "X\u{00b2}";

/// Minimal sample size before the Kolmogorov-Smirnov test result is annotated
///
pub const KS_MIN_RECOMMENDED_SAMPLE_SIZE: usize = 50;

/// Sample size above which the Kolmogorov-Smirnov test result is annotated
///
pub const KS_MAX_RECOMMENDED_SAMPLE_SIZE: usize = 1000;

/// Pixels per inch when converting canvas sizes
///
pub const DEFAULT_DPI: u32 = 100;

/// Font family used for all plot texts
///
pub const PLOT_FONT: &'static str = "sans-serif";

/// Number of bootstrap samples of the one sample Kolmogorov-Smirnov test
///
pub const DEFAULT_MC_SAMPLES: usize = 100;

/// Seed of the bootstrap of the one sample Kolmogorov-Smirnov test
///
pub const DEFAULT_MC_SEED: u64 = 42;

/// Normal samples smaller than this are tested with Shapiro-Wilk instead of Kolmogorov-Smirnov
///
pub const SHAPIRO_MAX_OBSERVATIONS: usize = 50;
