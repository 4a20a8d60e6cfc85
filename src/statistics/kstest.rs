// 3rd party imports
use serde::{Deserialize, Serialize};

// internal imports
use super::kolmogorov::KolmogorovSmirnov;
use super::{check_sample, sorted};
use crate::errors::statistics_error::StatisticsError;

/// Outcome of a two-sided Kolmogorov-Smirnov test
///
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KsOutcome {
    /// Maximal distance between the distribution functions
    pub statistic: f64,
    pub pvalue: f64,
    /// Observation at which the maximal distance occurs
    pub location: f64,
    /// `1` if the empirical distribution function lies above the reference at `location`, `-1` otherwise
    pub sign: i8,
}

/// Maximal distance between the empirical distribution function of a sorted sample and `cdf`.
/// The p-value is left at 1.
///
fn ks_distance<F>(sorted: &[f64], cdf: F) -> KsOutcome
where
    F: Fn(f64) -> f64,
{
    let nf = sorted.len() as f64;
    let mut outcome = KsOutcome {
        statistic: -1.0,
        pvalue: 1.0,
        location: sorted[0],
        sign: 1,
    };
    for (idx, value) in sorted.iter().enumerate() {
        let reference = cdf(*value);
        let d_plus = (idx + 1) as f64 / nf - reference;
        let d_minus = reference - idx as f64 / nf;
        if d_plus > outcome.statistic {
            outcome.statistic = d_plus;
            outcome.location = *value;
            outcome.sign = 1;
        }
        if d_minus > outcome.statistic {
            outcome.statistic = d_minus;
            outcome.location = *value;
            outcome.sign = -1;
        }
    }
    outcome.statistic = outcome.statistic.clamp(0.0, 1.0);
    outcome
}

/// One sample Kolmogorov-Smirnov statistic without a p-value
///
/// # Arguments
/// * `data` - Sample
/// * `cdf` - Reference cumulative distribution function
///
pub fn ks_statistic<F>(data: &[f64], cdf: F) -> Result<f64, StatisticsError>
where
    F: Fn(f64) -> f64,
{
    check_sample(data, 1)?;
    Ok(ks_distance(&sorted(data), cdf).statistic)
}

/// One sample two-sided Kolmogorov-Smirnov test against a fully specified reference distribution function.
/// The p-value is taken from the exact distribution of the statistic.
///
/// # Arguments
/// * `data` - Sample
/// * `cdf` - Reference cumulative distribution function
///
pub fn kstest<F>(data: &[f64], cdf: F) -> Result<KsOutcome, StatisticsError>
where
    F: Fn(f64) -> f64,
{
    check_sample(data, 1)?;
    let sorted = sorted(data);
    let mut outcome = ks_distance(&sorted, cdf);
    outcome.pvalue = KsNullDistribution::Kolmogorov { n: sorted.len() }.sf(outcome.statistic);
    Ok(outcome)
}

/// Sample size product below which the two sample p-value is computed exactly
///
pub const MAX_EXACT_TWO_SAMPLE_PRODUCT: usize = 10_000;

/// Distribution of the Kolmogorov-Smirnov statistic under the null hypothesis.
/// The p-value of a test and its rejection region are both derived from it.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KsNullDistribution {
    /// One sample statistic against a fully specified distribution
    Kolmogorov { n: usize },
    /// Two sample statistic, evaluated by counting lattice paths
    TwoSampleExact { n1: usize, n2: usize },
    /// Two sample statistic, one sample distribution at the effective sample size `n1 * n2 / (n1 + n2)`
    TwoSampleAsymptotic { n1: usize, n2: usize },
    /// Statistics of samples drawn from the fitted distribution and tested against their own refit
    Bootstrap { statistics: Vec<f64> },
}

impl KsNullDistribution {
    /// Exact distribution for small samples, asymptotic distribution otherwise
    ///
    /// # Arguments
    /// * `n1` - Size of the first sample
    /// * `n2` - Size of the second sample
    ///
    pub fn two_sample(n1: usize, n2: usize) -> Self {
        if n1.saturating_mul(n2) < MAX_EXACT_TWO_SAMPLE_PRODUCT {
            Self::TwoSampleExact { n1, n2 }
        } else {
            Self::TwoSampleAsymptotic { n1, n2 }
        }
    }

    /// Sample size of the one sample distribution approximating this distribution
    ///
    pub fn effective_n(&self) -> usize {
        match self {
            Self::Kolmogorov { n } => *n,
            Self::TwoSampleExact { n1, n2 } | Self::TwoSampleAsymptotic { n1, n2 } => {
                let (n1, n2) = (*n1 as f64, *n2 as f64);
                ((n1 * n2 / (n1 + n2)).round() as usize).max(1)
            }
            Self::Bootstrap { .. } => 1,
        }
    }

    /// Two-sided p-value of the statistic
    ///
    pub fn sf(&self, d: f64) -> f64 {
        match self {
            Self::Kolmogorov { .. } | Self::TwoSampleAsymptotic { .. } => {
                KolmogorovSmirnov::new(self.effective_n()).sf(d)
            }
            Self::TwoSampleExact { n1, n2 } => {
                let lattice = Lattice::new(*n1, *n2);
                lattice.sf(lattice.steps(d))
            }
            Self::Bootstrap { statistics } => {
                let exceeding = statistics.iter().filter(|value| **value >= d).count();
                (1 + exceeding) as f64 / (statistics.len() + 1) as f64
            }
        }
    }

    /// Boundary of the rejection region, statistics greater than the returned value have
    /// a p-value of at most `alpha`. `None` if no attainable statistic is rejected.
    ///
    /// # Arguments
    /// * `alpha` - Significance level
    ///
    pub fn critical_value(&self, alpha: f64) -> Option<f64> {
        match self {
            Self::Kolmogorov { .. } | Self::TwoSampleAsymptotic { .. } => {
                Some(KolmogorovSmirnov::new(self.effective_n()).inverse_cdf(1.0 - alpha))
            }
            Self::TwoSampleExact { n1, n2 } => {
                let lattice = Lattice::new(*n1, *n2);
                if lattice.sf(lattice.lcm) > alpha {
                    return None;
                }
                // p-values do not increase with the number of lattice steps
                let (mut lower, mut upper) = (0, lattice.lcm);
                while upper - lower > 1 {
                    let mid = (lower + upper) / 2;
                    if lattice.sf(mid) <= alpha {
                        upper = mid;
                    } else {
                        lower = mid;
                    }
                }
                Some((upper as f64 - 0.5) / lattice.lcm as f64)
            }
            Self::Bootstrap { statistics } => {
                let total = (statistics.len() + 1) as f64;
                // Largest number of exceeding statistics which still rejects
                let allowed = (0..statistics.len())
                    .take_while(|exceeding| (1 + exceeding) as f64 / total <= alpha)
                    .count();
                if allowed == 0 {
                    return None;
                }
                let mut descending = sorted(statistics);
                descending.reverse();
                descending.get(allowed - 1).copied()
            }
        }
    }
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// Grid of the paths from `(0, 0)` to `(n1, n2)` which two merged samples can take
///
struct Lattice {
    n1: usize,
    n2: usize,
    /// Distance of one step in the first sample, in units of `1 / lcm`
    step1: usize,
    step2: usize,
    lcm: usize,
}

impl Lattice {
    fn new(n1: usize, n2: usize) -> Self {
        let (n1, n2) = (n1.max(1), n2.max(1));
        let divisor = gcd(n1, n2);
        Self {
            n1,
            n2,
            step1: n2 / divisor,
            step2: n1 / divisor,
            lcm: n1 / divisor * n2,
        }
    }

    /// Statistic in units of `1 / lcm`
    ///
    fn steps(&self, d: f64) -> usize {
        (d * self.lcm as f64).round().max(0.0) as usize
    }

    /// Probability that a random path reaches a distance of at least `h` steps
    ///
    fn sf(&self, h: usize) -> f64 {
        if h == 0 {
            return 1.0;
        }
        let inside = |i: usize, j: usize| (i * self.step1).abs_diff(j * self.step2) < h;
        // Number of paths staying inside and of all paths, one row at a time
        let mut staying: Vec<f64> = vec![0.0; self.n2 + 1];
        let mut all: Vec<f64> = vec![0.0; self.n2 + 1];
        for i in 0..=self.n1 {
            for j in 0..=self.n2 {
                if i == 0 && j == 0 {
                    staying[0] = 1.0;
                    all[0] = 1.0;
                    continue;
                }
                let left_staying = if j > 0 { staying[j - 1] } else { 0.0 };
                let left_all = if j > 0 { all[j - 1] } else { 0.0 };
                all[j] += left_all;
                staying[j] = if inside(i, j) {
                    staying[j] + left_staying
                } else {
                    0.0
                };
            }
        }
        (1.0 - staying[self.n2] / all[self.n2]).clamp(0.0, 1.0)
    }
}

/// Two sample two-sided Kolmogorov-Smirnov test.
/// The p-value is exact for small samples, see [KsNullDistribution::two_sample].
///
/// # Arguments
/// * `a` - First sample
/// * `b` - Second sample
///
pub fn ks_2samp(a: &[f64], b: &[f64]) -> Result<KsOutcome, StatisticsError> {
    check_sample(a, 1)?;
    check_sample(b, 1)?;
    let a = sorted(a);
    let b = sorted(b);
    let n1 = a.len() as f64;
    let n2 = b.len() as f64;

    let mut outcome = KsOutcome {
        statistic: 0.0,
        pvalue: 1.0,
        location: a[0],
        sign: 1,
    };
    for value in a.iter().chain(b.iter()) {
        let cdf1 = a.partition_point(|x| x <= value) as f64 / n1;
        let cdf2 = b.partition_point(|x| x <= value) as f64 / n2;
        let distance = (cdf1 - cdf2).abs();
        if distance > outcome.statistic {
            outcome.statistic = distance;
            outcome.location = *value;
            outcome.sign = if cdf1 >= cdf2 { 1 } else { -1 };
        }
    }
    outcome.pvalue = KsNullDistribution::two_sample(a.len(), b.len()).sf(outcome.statistic);
    Ok(outcome)
}

#[cfg(test)]
mod test {
    use statrs::distribution::{ContinuousCDF, Normal};

    use super::*;

    #[test]
    fn test_kstest_uniform_grid() {
        // Evenly spread sample on [0, 1] fits the standard uniform distribution
        let data: Vec<f64> = (0..20).map(|idx| (idx as f64 + 0.5) / 20.0).collect();
        let outcome = kstest(&data, |x| x.clamp(0.0, 1.0)).unwrap();
        assert!((outcome.statistic - 0.025).abs() < 1e-12);
        assert!(outcome.pvalue > 0.99);
    }

    #[test]
    fn test_kstest_shifted_sample() {
        let normal = Normal::new(0.0, 1.0).unwrap();
        let data: Vec<f64> = (1..=30).map(|idx| 2.0 + idx as f64 / 10.0).collect();
        let outcome = kstest(&data, |x| normal.cdf(x)).unwrap();
        assert!(outcome.statistic > 0.9);
        assert!(outcome.pvalue < 1e-6);
        assert_eq!(outcome.sign, -1);
    }

    #[test]
    fn test_ks_2samp() {
        let a: Vec<f64> = (0..50).map(|idx| idx as f64).collect();
        let same = ks_2samp(&a, &a).unwrap();
        assert_eq!(same.statistic, 0.0);
        assert_eq!(same.pvalue, 1.0);

        let b: Vec<f64> = (0..50).map(|idx| idx as f64 + 100.0).collect();
        let disjoint = ks_2samp(&a, &b).unwrap();
        assert_eq!(disjoint.statistic, 1.0);
        assert!(disjoint.pvalue < 1e-10);
        assert_eq!(disjoint.sign, 1);
    }

    #[test]
    fn test_ks_2samp_exact_small_samples() {
        let a: Vec<f64> = (1..=5).map(|x| x as f64).collect();
        let b: Vec<f64> = (6..=10).map(|x| x as f64).collect();
        let disjoint = ks_2samp(&a, &b).unwrap();
        assert_eq!(disjoint.statistic, 1.0);
        // 2 of the 252 paths reach the corners
        assert!((disjoint.pvalue - 2.0 / 252.0).abs() < 1e-12);

        let a: Vec<f64> = (0..8).map(|x| x as f64).collect();
        let b: Vec<f64> = a.iter().map(|x| x + 4.5).collect();
        let shifted = ks_2samp(&a, &b).unwrap();
        assert_eq!(shifted.statistic, 0.625);
        assert!((shifted.pvalue - 0.087024087).abs() < 1e-8);
        assert!(shifted.pvalue > 0.05);
    }

    #[test]
    fn test_ks_2samp_exact_unequal_sizes() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = [2.5, 3.5, 7.0, 8.0, 9.0, 10.0, 11.0];
        let outcome = ks_2samp(&a, &b).unwrap();
        assert!((outcome.statistic - 5.0 / 7.0).abs() < 1e-12);
        assert!((outcome.pvalue - 0.038461538).abs() < 1e-8);
    }

    #[test]
    fn test_two_sample_null_selection() {
        assert_eq!(
            KsNullDistribution::two_sample(99, 100),
            KsNullDistribution::TwoSampleExact { n1: 99, n2: 100 }
        );
        let large = KsNullDistribution::two_sample(100, 100);
        assert_eq!(large, KsNullDistribution::TwoSampleAsymptotic { n1: 100, n2: 100 });
        assert_eq!(large.effective_n(), 50);
        assert_eq!(large.sf(0.2), KolmogorovSmirnov::new(50).sf(0.2));
    }

    #[test]
    fn test_critical_value_matches_pvalue() {
        let alpha = 0.05;
        let exact = KsNullDistribution::TwoSampleExact { n1: 8, n2: 8 };
        let critical = exact.critical_value(alpha).unwrap();
        // D = 5/8 has p = 0.087, D = 6/8 is rejected
        assert!(0.625 < critical && critical < 0.75);
        assert!(exact.sf(0.75) <= alpha);
        assert!(exact.sf(0.625) > alpha);

        // Smallest p-value of two samples of size 2 is 1/3
        assert!(KsNullDistribution::TwoSampleExact { n1: 2, n2: 2 }
            .critical_value(alpha)
            .is_none());

        let one_sample = KsNullDistribution::Kolmogorov { n: 20 };
        let critical = one_sample.critical_value(alpha).unwrap();
        assert!((one_sample.sf(critical) - alpha).abs() < 1e-6);
    }

    #[test]
    fn test_bootstrap_null() {
        let statistics: Vec<f64> = (1..=99).map(|idx| idx as f64 / 100.0).collect();
        let null = KsNullDistribution::Bootstrap { statistics };
        assert_eq!(null.sf(0.0), 1.0);
        assert!((null.sf(0.955) - 5.0 / 100.0).abs() < 1e-12);
        // 4 exceeding statistics still reject at 5%
        let critical = null.critical_value(0.05).unwrap();
        assert_eq!(critical, 0.95);
        assert!(null.sf(0.951) <= 0.05);
        assert!(null.sf(0.95) > 0.05);
        assert!(null.critical_value(0.005).is_none());
    }

    #[test]
    fn test_empty_sample() {
        assert!(matches!(
            ks_2samp(&[], &[1.0]),
            Err(StatisticsError::TooFewObservations(1, 0))
        ));
    }
}
