// 3rd party imports
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::Statistics;

// internal imports
use super::check_sample;
use crate::errors::statistics_error::StatisticsError;

/// Outcome of an independent samples t test
///
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TTestOutcome {
    pub statistic: f64,
    pub pvalue: f64,
    /// Degrees of freedom of the reference t distribution, Welch-Satterthwaite if variances are not assumed equal
    pub dof: f64,
}

/// Two-sided t test for the means of two independent samples.
///
/// # Arguments
/// * `a` - First sample
/// * `b` - Second sample
/// * `equal_var` - Assume equal population variances (Student), otherwise Welch's test
///
pub fn ttest_ind(a: &[f64], b: &[f64], equal_var: bool) -> Result<TTestOutcome, StatisticsError> {
    check_sample(a, 2)?;
    check_sample(b, 2)?;
    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let mean1 = a.iter().mean();
    let mean2 = b.iter().mean();
    let var1 = a.iter().variance();
    let var2 = b.iter().variance();

    let (standard_error, dof) = if equal_var {
        let dof = n1 + n2 - 2.0;
        let pooled = ((n1 - 1.0) * var1 + (n2 - 1.0) * var2) / dof;
        ((pooled * (1.0 / n1 + 1.0 / n2)).sqrt(), dof)
    } else {
        let v1 = var1 / n1;
        let v2 = var2 / n2;
        let dof = (v1 + v2).powi(2) / (v1.powi(2) / (n1 - 1.0) + v2.powi(2) / (n2 - 1.0));
        ((v1 + v2).sqrt(), dof)
    };
    if standard_error == 0.0 {
        return Err(StatisticsError::ZeroVariance);
    }

    let statistic = (mean1 - mean2) / standard_error;
    let pvalue = 2.0 * StudentsT::new(0.0, 1.0, dof)?.sf(statistic.abs());
    Ok(TTestOutcome {
        statistic,
        pvalue: pvalue.clamp(0.0, 1.0),
        dof,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    const A: [f64; 6] = [19.7, 20.4, 21.0, 18.9, 20.1, 19.5];
    const B: [f64; 6] = [22.1, 21.4, 23.0, 22.8, 21.9, 22.4];

    #[test]
    fn test_ttest_pooled() {
        let outcome = ttest_ind(&A, &B, true).unwrap();
        assert_eq!(outcome.dof, 10.0);
        assert!(outcome.statistic < 0.0);
        assert!(outcome.pvalue < 0.001);
    }

    #[test]
    fn test_ttest_equal_sizes_same_statistic() {
        // With equal sample sizes Student and Welch share the statistic
        let pooled = ttest_ind(&A, &B, true).unwrap();
        let welch = ttest_ind(&A, &B, false).unwrap();
        assert!((pooled.statistic - welch.statistic).abs() < 1e-12);
        assert!(welch.dof <= pooled.dof);
    }

    #[test]
    fn test_ttest_identical_samples() {
        let outcome = ttest_ind(&A, &A, false).unwrap();
        assert_eq!(outcome.statistic, 0.0);
        assert!((outcome.pvalue - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ttest_zero_variance() {
        assert!(matches!(
            ttest_ind(&[1.0, 1.0], &[1.0, 1.0], true),
            Err(StatisticsError::ZeroVariance)
        ));
    }
}
