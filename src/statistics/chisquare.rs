// 3rd party imports
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

// internal imports
use super::check_sample;
use crate::errors::statistics_error::StatisticsError;

/// Relative tolerance when comparing the sums of observed and expected frequencies
///
const FREQUENCY_SUM_TOLERANCE: f64 = 1e-8;

/// Outcome of a chi-square test on a contingency table
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContingencyOutcome {
    pub statistic: f64,
    pub pvalue: f64,
    pub dof: usize,
    /// Expected frequencies under independence, same shape as the observed table
    pub expected: Vec<Vec<f64>>,
}

/// Survival function of the chi-square distribution, `1.0` for zero degrees of freedom.
///
fn chi2_sf(statistic: f64, dof: usize) -> Result<f64, StatisticsError> {
    if dof == 0 {
        return Ok(1.0);
    }
    Ok(ChiSquared::new(dof as f64)?.sf(statistic))
}

/// One-way chi-square test. Returns the statistic and p-value.
///
/// # Arguments
/// * `observed` - Observed frequencies by category
/// * `expected` - Expected frequencies by category, defaults to equally likely categories
///
pub fn chisquare(
    observed: &[f64],
    expected: Option<&[f64]>,
) -> Result<(f64, f64), StatisticsError> {
    check_sample(observed, 2)?;
    let observed_sum: f64 = observed.iter().sum();

    let expected: Vec<f64> = match expected {
        Some(expected) => {
            if expected.len() != observed.len() {
                return Err(StatisticsError::LengthMismatch(
                    observed.len(),
                    expected.len(),
                ));
            }
            check_sample(expected, 2)?;
            let expected_sum: f64 = expected.iter().sum();
            let tolerance = FREQUENCY_SUM_TOLERANCE * observed_sum.abs().max(expected_sum.abs());
            if (observed_sum - expected_sum).abs() > tolerance {
                return Err(StatisticsError::FrequencySumMismatch(
                    observed_sum,
                    expected_sum,
                ));
            }
            expected.to_vec()
        }
        None => vec![observed_sum / observed.len() as f64; observed.len()],
    };

    if expected.iter().any(|value| *value == 0.0) {
        return Err(StatisticsError::ZeroExpectedFrequency);
    }

    let statistic: f64 = observed
        .iter()
        .zip(expected.iter())
        .map(|(obs, exp)| (obs - exp).powi(2) / exp)
        .sum();
    let pvalue = chi2_sf(statistic, observed.len() - 1)?;
    Ok((statistic, pvalue))
}

/// Chi-square test of independence of the variables in a contingency table.
/// Yates' correction for continuity is applied when `correction` is set and the table has one degree of freedom.
///
/// # Arguments
/// * `observed` - Contingency table, one vector per row
/// * `correction` - Apply Yates' correction
///
pub fn chi2_contingency(
    observed: &[Vec<f64>],
    correction: bool,
) -> Result<ContingencyOutcome, StatisticsError> {
    let nrows = observed.len();
    if nrows == 0 {
        return Err(StatisticsError::TooFewObservations(1, 0));
    }
    let ncols = observed[0].len();
    for row in observed.iter() {
        if row.len() != ncols {
            return Err(StatisticsError::LengthMismatch(ncols, row.len()));
        }
        check_sample(row, 1)?;
    }

    let row_sums: Vec<f64> = observed.iter().map(|row| row.iter().sum()).collect();
    let col_sums: Vec<f64> = (0..ncols)
        .map(|col| observed.iter().map(|row| row[col]).sum())
        .collect();
    let total: f64 = row_sums.iter().sum();

    let expected: Vec<Vec<f64>> = row_sums
        .iter()
        .map(|row_sum| col_sums.iter().map(|col_sum| row_sum * col_sum / total).collect())
        .collect();
    if expected.iter().flatten().any(|value| *value == 0.0 || !value.is_finite()) {
        return Err(StatisticsError::ZeroExpectedFrequency);
    }

    let dof = (nrows - 1) * (ncols - 1);
    if dof == 0 {
        return Ok(ContingencyOutcome {
            statistic: 0.0,
            pvalue: 1.0,
            dof,
            expected,
        });
    }

    let mut statistic = 0.0;
    for (obs_row, exp_row) in observed.iter().zip(expected.iter()) {
        for (obs, exp) in obs_row.iter().zip(exp_row.iter()) {
            let mut obs = *obs;
            if dof == 1 && correction {
                let diff = exp - obs;
                obs += diff.signum() * diff.abs().min(0.5);
            }
            statistic += (obs - exp).powi(2) / exp;
        }
    }

    Ok(ContingencyOutcome {
        statistic,
        pvalue: chi2_sf(statistic, dof)?,
        dof,
        expected,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_chisquare_equal_frequencies() {
        let (statistic, pvalue) = chisquare(&[10.0, 20.0, 30.0, 40.0], None).unwrap();
        assert!((statistic - 20.0).abs() < 1e-12);
        assert_eq!(pvalue, ChiSquared::new(3.0).unwrap().sf(20.0));
        assert!(pvalue < 0.001);
    }

    #[test]
    fn test_chisquare_expected_frequencies() {
        let observed = [16.0, 18.0, 16.0, 14.0, 12.0, 12.0];
        let expected = [16.0, 16.0, 16.0, 16.0, 16.0, 8.0];
        let (statistic, pvalue) = chisquare(&observed, Some(&expected)).unwrap();
        // scipy.stats.chisquare: statistic=3.5, pvalue=0.62338762774958223
        assert!((statistic - 3.5).abs() < 1e-12);
        assert!((pvalue - 0.623_387_627_749_582_2).abs() < 1e-9);
    }

    #[test]
    fn test_chisquare_invalid_input() {
        assert!(matches!(
            chisquare(&[10.0, 20.0], Some(&[10.0, 10.0])),
            Err(StatisticsError::FrequencySumMismatch(_, _))
        ));
        assert!(matches!(
            chisquare(&[10.0, 20.0], Some(&[30.0])),
            Err(StatisticsError::LengthMismatch(2, 1))
        ));
        assert!(matches!(
            chisquare(&[10.0], None),
            Err(StatisticsError::TooFewObservations(2, 1))
        ));
    }

    #[test]
    fn test_chi2_contingency() {
        // scipy.stats.chi2_contingency([[10, 10, 20], [20, 20, 20]])
        let observed = vec![vec![10.0, 10.0, 20.0], vec![20.0, 20.0, 20.0]];
        let outcome = chi2_contingency(&observed, true).unwrap();
        assert_eq!(outcome.dof, 2);
        assert!((outcome.statistic - 2.777_777_777_777_778).abs() < 1e-9);
        assert!((outcome.pvalue - 0.249_352_208_777_296_2).abs() < 1e-9);
        assert!((outcome.expected[0][0] - 12.0).abs() < 1e-12);
        assert!((outcome.expected[1][2] - 24.0).abs() < 1e-12);
    }

    #[test]
    fn test_chi2_contingency_yates_correction() {
        // scipy.stats.chi2_contingency([[12, 3], [9, 7]])
        let observed = vec![vec![12.0, 3.0], vec![9.0, 7.0]];
        let corrected = chi2_contingency(&observed, true).unwrap();
        let uncorrected = chi2_contingency(&observed, false).unwrap();
        assert_eq!(corrected.dof, 1);
        assert!(corrected.statistic < uncorrected.statistic);
        assert!(corrected.pvalue > uncorrected.pvalue);
    }

    #[test]
    fn test_chi2_contingency_single_row() {
        let outcome = chi2_contingency(&[vec![3.0, 4.0]], true).unwrap();
        assert_eq!(outcome.dof, 0);
        assert_eq!(outcome.statistic, 0.0);
        assert_eq!(outcome.pvalue, 1.0);
    }
}
