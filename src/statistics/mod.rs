/// One-way analysis of variance
pub mod anova;
/// Chi-square goodness of fit and contingency table statistics
pub mod chisquare;
/// Pearson and Spearman correlation coefficients
pub mod correlation;
/// Distribution of the Kolmogorov-Smirnov statistic
pub mod kolmogorov;
/// One and two sample Kolmogorov-Smirnov statistics
pub mod kstest;
/// Shapiro-Wilk and D'Agostino-Pearson tests for normality
pub mod normality;
/// Independent samples t statistic
pub mod ttest;

use crate::errors::statistics_error::StatisticsError;

/// Checks that the sample has at least `min` elements and contains only finite values.
///
/// # Arguments
/// * `data` - Sample
/// * `min` - Minimal number of elements
///
pub(crate) fn check_sample(data: &[f64], min: usize) -> Result<(), StatisticsError> {
    if data.len() < min {
        return Err(StatisticsError::TooFewObservations(min, data.len()));
    }
    if data.iter().any(|value| !value.is_finite()) {
        return Err(StatisticsError::NonFiniteInput);
    }
    Ok(())
}

/// Returns a sorted copy of the sample. Values must be finite.
///
pub(crate) fn sorted(data: &[f64]) -> Vec<f64> {
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Returns `points` evenly spaced values from `start` to `stop` (both included).
///
pub fn linspace(start: f64, stop: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (points - 1) as f64;
            (0..points).map(|idx| start + step * idx as f64).collect()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_linspace() {
        let values = linspace(0.0, 1.0, 5);
        assert_eq!(values, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
    }

    #[test]
    fn test_check_sample() {
        assert!(check_sample(&[1.0, 2.0], 2).is_ok());
        assert!(matches!(
            check_sample(&[1.0], 2),
            Err(StatisticsError::TooFewObservations(2, 1))
        ));
        assert!(matches!(
            check_sample(&[1.0, f64::NAN], 2),
            Err(StatisticsError::NonFiniteInput)
        ));
    }
}
