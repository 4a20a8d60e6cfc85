// 3rd party imports
use statrs::distribution::{ContinuousCDF, StudentsT};

// internal imports
use super::check_sample;
use crate::errors::statistics_error::StatisticsError;

/// Two-sided p-value of a correlation coefficient from `n` pairs,
/// using the t-transformed coefficient on `n - 2` degrees of freedom.
///
pub fn correlation_pvalue(r: f64, n: usize) -> Result<f64, StatisticsError> {
    if n <= 2 {
        return Ok(1.0);
    }
    let dof = (n - 2) as f64;
    let residual = 1.0 - r * r;
    if residual <= 0.0 {
        return Ok(0.0);
    }
    let t = r * (dof / residual).sqrt();
    let pvalue = 2.0 * StudentsT::new(0.0, 1.0, dof)?.sf(t.abs());
    Ok(pvalue.clamp(0.0, 1.0))
}

/// t-transformed correlation coefficient, infinite for perfect correlation
///
pub fn correlation_t_statistic(r: f64, n: usize) -> f64 {
    let dof = n.saturating_sub(2) as f64;
    let residual = 1.0 - r * r;
    if residual <= 0.0 {
        return f64::INFINITY.copysign(r);
    }
    r * (dof / residual).sqrt()
}

/// Pearson correlation coefficient with the two-sided p-value for testing non-correlation.
///
/// # Arguments
/// * `x` - First sample
/// * `y` - Second sample, same length as `x`
///
pub fn pearsonr(x: &[f64], y: &[f64]) -> Result<(f64, f64), StatisticsError> {
    if x.len() != y.len() {
        return Err(StatisticsError::LengthMismatch(x.len(), y.len()));
    }
    check_sample(x, 2)?;
    check_sample(y, 2)?;
    let n = x.len() as f64;
    let x_mean = x.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut x_squares = 0.0;
    let mut y_squares = 0.0;
    for (xi, yi) in x.iter().zip(y.iter()) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        covariance += dx * dy;
        x_squares += dx * dx;
        y_squares += dy * dy;
    }
    if x_squares == 0.0 || y_squares == 0.0 {
        return Err(StatisticsError::ZeroVariance);
    }
    let r = (covariance / (x_squares.sqrt() * y_squares.sqrt())).clamp(-1.0, 1.0);
    Ok((r, correlation_pvalue(r, x.len())?))
}

/// Ranks of the sample starting at 1, ties get their average rank.
///
pub fn rankdata(data: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..data.len()).collect();
    order.sort_by(|a, b| data[*a].total_cmp(&data[*b]));

    let mut ranks = vec![0.0; data.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && data[order[end + 1]] == data[order[start]] {
            end += 1;
        }
        // ranks are 1 based, average of start + 1 ..= end + 1
        let rank = (start + end) as f64 / 2.0 + 1.0;
        for idx in order[start..=end].iter() {
            ranks[*idx] = rank;
        }
        start = end + 1;
    }
    ranks
}

/// Spearman rank correlation coefficient with the two-sided p-value for testing non-correlation.
///
/// # Arguments
/// * `x` - First sample
/// * `y` - Second sample, same length as `x`
///
pub fn spearmanr(x: &[f64], y: &[f64]) -> Result<(f64, f64), StatisticsError> {
    if x.len() != y.len() {
        return Err(StatisticsError::LengthMismatch(x.len(), y.len()));
    }
    check_sample(x, 2)?;
    check_sample(y, 2)?;
    pearsonr(&rankdata(x), &rankdata(y))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_pearsonr_linear() {
        let (r, pvalue) =
            pearsonr(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 4.0, 6.0, 8.0, 10.0]).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
        assert!(pvalue < 1e-6);

        let (r, _) = pearsonr(&[1.0, 2.0, 3.0, 4.0, 5.0], &[5.0, 4.0, 3.0, 2.0, 1.0]).unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearsonr_reference() {
        // scipy.stats.pearsonr([1, 2, 3, 4, 5, 6, 7], [10, 9, 2.5, 6, 4, 3, 2])
        let (r, pvalue) = pearsonr(
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0],
            &[10.0, 9.0, 2.5, 6.0, 4.0, 3.0, 2.0],
        )
        .unwrap();
        assert!((r + 0.828_503_883_588_428_5).abs() < 1e-9);
        assert!((pvalue - 0.021_280_260_007_523_26).abs() < 1e-6);
    }

    #[test]
    fn test_pearsonr_invalid() {
        assert!(matches!(
            pearsonr(&[1.0, 2.0], &[1.0]),
            Err(StatisticsError::LengthMismatch(2, 1))
        ));
        assert!(matches!(
            pearsonr(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]),
            Err(StatisticsError::ZeroVariance)
        ));
    }

    #[test]
    fn test_rankdata_ties() {
        assert_eq!(rankdata(&[0.0, 2.0, 3.0, 2.0]), vec![1.0, 2.5, 4.0, 2.5]);
        assert_eq!(rankdata(&[3.0, 1.0, 2.0]), vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_spearmanr_monotonic() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y: Vec<f64> = x.iter().map(|v: &f64| v.powi(3)).collect();
        let (rho, _) = spearmanr(&x, &y).unwrap();
        assert!((rho - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_correlation_t_statistic() {
        assert!(correlation_t_statistic(1.0, 10).is_infinite());
        assert!((correlation_t_statistic(0.5, 14) - 0.5 * (12.0f64 / 0.75).sqrt()).abs() < 1e-12);
    }
}
