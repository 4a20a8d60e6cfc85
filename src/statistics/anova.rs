// 3rd party imports
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

// internal imports
use super::check_sample;
use crate::errors::statistics_error::StatisticsError;

/// Outcome of a one-way analysis of variance
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaOutcome {
    /// F statistic
    pub statistic: f64,
    pub pvalue: f64,
    pub df_between: usize,
    pub df_within: usize,
    pub group_means: Vec<f64>,
}

/// One-way ANOVA of the null hypothesis that all groups have the same mean.
///
/// # Arguments
/// * `groups` - At least two groups with at least one observation each and at least one group with two
///
pub fn f_oneway(groups: &[&[f64]]) -> Result<AnovaOutcome, StatisticsError> {
    if groups.len() < 2 {
        return Err(StatisticsError::TooFewObservations(2, groups.len()));
    }
    for group in groups.iter() {
        check_sample(group, 1)?;
    }
    let total: usize = groups.iter().map(|group| group.len()).sum();
    let df_between = groups.len() - 1;
    let df_within = total - groups.len();
    if df_within == 0 {
        return Err(StatisticsError::TooFewObservations(groups.len() + 1, total));
    }

    let grand_mean = groups.iter().flat_map(|group| group.iter()).sum::<f64>() / total as f64;
    let group_means: Vec<f64> = groups
        .iter()
        .map(|group| group.iter().sum::<f64>() / group.len() as f64)
        .collect();
    let ss_between: f64 = groups
        .iter()
        .zip(group_means.iter())
        .map(|(group, mean)| group.len() as f64 * (mean - grand_mean).powi(2))
        .sum();
    let ss_within: f64 = groups
        .iter()
        .zip(group_means.iter())
        .map(|(group, mean)| group.iter().map(|value| (value - mean).powi(2)).sum::<f64>())
        .sum();
    if ss_within <= 0.0 {
        return Err(StatisticsError::ZeroVariance);
    }

    let statistic = (ss_between / df_between as f64) / (ss_within / df_within as f64);
    let pvalue = FisherSnedecor::new(df_between as f64, df_within as f64)?.sf(statistic);
    Ok(AnovaOutcome {
        statistic,
        pvalue,
        df_between,
        df_within,
        group_means,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_f_oneway() {
        let a = [6.0, 8.0, 4.0, 5.0, 3.0, 4.0];
        let b = [8.0, 12.0, 9.0, 11.0, 6.0, 8.0];
        let c = [13.0, 9.0, 11.0, 8.0, 7.0, 12.0];
        let outcome = f_oneway(&[&a, &b, &c]).unwrap();
        assert_eq!(outcome.df_between, 2);
        assert_eq!(outcome.df_within, 15);
        assert!((outcome.statistic - 9.264705882).abs() < 1e-8);
        assert!((outcome.pvalue - 0.002398).abs() < 1e-5);
        assert_eq!(outcome.group_means, vec![5.0, 9.0, 10.0]);
    }

    #[test]
    fn test_equal_means() {
        let outcome = f_oneway(&[&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]]).unwrap();
        assert_eq!(outcome.statistic, 0.0);
        assert!((outcome.pvalue - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_groups() {
        assert!(matches!(
            f_oneway(&[&[1.0, 2.0]]),
            Err(StatisticsError::TooFewObservations(2, 1))
        ));
        assert!(matches!(
            f_oneway(&[&[1.0], &[2.0]]),
            Err(StatisticsError::TooFewObservations(3, 2))
        ));
        assert!(matches!(
            f_oneway(&[&[1.0, 1.0], &[2.0, 2.0]]),
            Err(StatisticsError::ZeroVariance)
        ));
    }
}
