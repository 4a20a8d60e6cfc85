// std imports
use std::fmt;

// 3rd party imports
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};

// internal imports
use crate::errors::statistics_error::StatisticsError;
use crate::statistics::{check_sample, sorted};

/// Quantile of a sorted sample, interpolating linearly between the closest ranks.
/// `NaN` for an empty sample.
///
/// # Arguments
/// * `sorted` - Sample in ascending order
/// * `q` - Probability in [0, 1]
///
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Descriptive statistics of a numeric sample
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation, `NaN` for a single observation
    pub std: f64,
    pub min: f64,
    /// First quartile
    pub q1: f64,
    pub median: f64,
    /// Third quartile
    pub q3: f64,
    pub max: f64,
}

impl QuantStats {
    /// Computes the statistics of a non empty sample
    ///
    /// # Arguments
    /// * `data` - Sample
    ///
    pub fn compute(data: &[f64]) -> Result<Self, StatisticsError> {
        check_sample(data, 1)?;
        let ascending = sorted(data);
        Ok(Self {
            count: data.len(),
            mean: data.iter().mean(),
            std: data.iter().std_dev(),
            min: Statistics::min(data.iter()),
            q1: quantile(&ascending, 0.25),
            median: Data::new(data.to_vec()).median(),
            q3: quantile(&ascending, 0.75),
            max: Statistics::max(data.iter()),
        })
    }
}

impl fmt::Display for QuantStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{:>16} | {}", "count", self.count)?;
        writeln!(f, "{:>16} | {:.4}", "mean", self.mean)?;
        writeln!(f, "{:>16} | {:.4}", "std", self.std)?;
        writeln!(f, "{:>16} | {:.4}", "min", self.min)?;
        writeln!(f, "{:>16} | {:.4}", "25%", self.q1)?;
        writeln!(f, "{:>16} | {:.4}", "median", self.median)?;
        writeln!(f, "{:>16} | {:.4}", "75%", self.q3)?;
        writeln!(f, "{:>16} | {:.4}", "max", self.max)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_compute() {
        let stats = QuantStats::compute(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        assert_eq!(stats.q1, 1.75);
        assert_eq!(stats.q3, 3.25);
        assert!((stats.std - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_quantile() {
        let data = [1.0, 2.0, 3.0, 4.0, 10.0];
        assert_eq!(quantile(&data, 0.0), 1.0);
        assert_eq!(quantile(&data, 0.5), 3.0);
        assert!((quantile(&data, 0.9) - 7.6).abs() < 1e-12);
        assert_eq!(quantile(&data, 1.0), 10.0);
        assert_eq!(quantile(&[5.0], 0.3), 5.0);
        assert!(quantile(&[], 0.5).is_nan());
    }

    #[test]
    fn test_empty_sample() {
        assert!(matches!(
            QuantStats::compute(&[]),
            Err(StatisticsError::TooFewObservations(1, 0))
        ));
    }
}
