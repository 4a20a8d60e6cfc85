// std imports
use std::f64::consts::PI;

// 3rd party imports
use statrs::distribution::{ContinuousCDF, Normal};

// internal imports
use super::{check_sample, sorted};
use crate::errors::statistics_error::StatisticsError;

/// Polynomial approximations of Royston (1995), algorithm AS R94
const SW_C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const SW_C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const SW_C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const SW_C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const SW_C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const SW_C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const SW_G: [f64; 2] = [-2.273, 0.459];

/// Evaluates `c[0] + c[1] * x + c[2] * x^2 + ...`
///
fn poly(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, coefficient| acc * x + coefficient)
}

fn standard_normal() -> Result<Normal, StatisticsError> {
    Ok(Normal::new(0.0, 1.0)?)
}

/// Sum of squared deviations from the mean
///
fn sum_of_squares(data: &[f64]) -> f64 {
    let mean = data.iter().sum::<f64>() / data.len() as f64;
    data.iter().map(|value| (value - mean).powi(2)).sum()
}

/// Coefficients of the lower half of the order statistics, largest first
///
fn sw_coefficients(n: usize, normal: &Normal) -> Result<Vec<f64>, StatisticsError> {
    let half = n / 2;
    let nf = n as f64;
    // Expected normal order statistics following Blom, all negative
    let m: Vec<f64> = (0..half)
        .map(|idx| normal.inverse_cdf((idx as f64 + 1.0 - 0.375) / (nf + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|value| value * value).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / nf.sqrt();

    let mut a: Vec<f64> = vec![0.0; half];
    a[0] = poly(&SW_C1, rsn) - m[0] / ssumm2;
    let corrected = if n > 5 {
        a[1] = -m[1] / ssumm2 + poly(&SW_C2, rsn);
        2
    } else {
        1
    };
    let fac_sq = summ2 - 2.0 * m[..corrected].iter().map(|value| value * value).sum::<f64>();
    let one_minus = 1.0 - 2.0 * a[..corrected].iter().map(|value| value * value).sum::<f64>();
    if fac_sq <= 0.0 || one_minus <= 0.0 {
        return Err(StatisticsError::ZeroVariance);
    }
    let fac = (fac_sq / one_minus).sqrt();
    for idx in corrected..half {
        a[idx] = -m[idx] / fac;
    }
    Ok(a)
}

/// Shapiro-Wilk test for normality. Returns the statistic W and the p-value.
/// The p-value follows the normalizing transformation of Royston, exact for three observations.
///
/// # Arguments
/// * `data` - Sample with at least three observations
///
pub fn shapiro(data: &[f64]) -> Result<(f64, f64), StatisticsError> {
    check_sample(data, 3)?;
    let x = sorted(data);
    let n = x.len();
    let ss = sum_of_squares(&x);
    if ss <= 0.0 {
        return Err(StatisticsError::ZeroVariance);
    }

    if n == 3 {
        let w = (0.5 * (x[2] - x[0]).powi(2) / ss).clamp(0.75, 1.0);
        let pvalue = 6.0 / PI * (w.sqrt().asin() - 0.75f64.sqrt().asin());
        return Ok((w, pvalue.clamp(0.0, 1.0)));
    }

    let normal = standard_normal()?;
    let a = sw_coefficients(n, &normal)?;
    let sa: f64 = a
        .iter()
        .enumerate()
        .map(|(idx, coefficient)| coefficient * (x[n - 1 - idx] - x[idx]))
        .sum();
    let w = (sa * sa / ss).min(1.0);

    let w1 = 1.0 - w;
    if w1 <= 0.0 {
        return Ok((w, 1.0));
    }
    let nf = n as f64;
    let y = w1.ln();
    let z = if n <= 11 {
        let gamma = poly(&SW_G, nf);
        if y >= gamma {
            return Ok((w, 0.0));
        }
        (-(gamma - y).ln() - poly(&SW_C3, nf)) / poly(&SW_C4, nf).exp()
    } else {
        let ln_n = nf.ln();
        (y - poly(&SW_C5, ln_n)) / poly(&SW_C6, ln_n).exp()
    };
    Ok((w, normal.sf(z).clamp(0.0, 1.0)))
}

/// Central moments two to four of the sample
///
fn central_moments(data: &[f64]) -> (f64, f64, f64) {
    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    let moment = |power: i32| data.iter().map(|value| (value - mean).powi(power)).sum::<f64>() / n;
    (moment(2), moment(3), moment(4))
}

/// Z-score of the sample skewness (D'Agostino).
///
/// # Arguments
/// * `data` - Sample with at least eight observations
///
pub fn skewtest(data: &[f64]) -> Result<f64, StatisticsError> {
    check_sample(data, 8)?;
    let (m2, m3, _) = central_moments(data);
    if m2 <= 0.0 {
        return Err(StatisticsError::ZeroVariance);
    }
    let n = data.len() as f64;
    let b2 = m3 / m2.powf(1.5);
    let y = b2 * ((n + 1.0) * (n + 3.0) / (6.0 * (n - 2.0))).sqrt();
    let beta2 = 3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0)
        / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    let delta = 1.0 / (0.5 * w2.ln()).sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();
    let y = if y == 0.0 { 1.0 } else { y };
    Ok(delta * (y / alpha + ((y / alpha).powi(2) + 1.0).sqrt()).ln())
}

/// Z-score of the sample kurtosis (Anscombe and Glynn).
///
/// # Arguments
/// * `data` - Sample with at least five observations
///
pub fn kurtosistest(data: &[f64]) -> Result<f64, StatisticsError> {
    check_sample(data, 5)?;
    let (m2, _, m4) = central_moments(data);
    if m2 <= 0.0 {
        return Err(StatisticsError::ZeroVariance);
    }
    let n = data.len() as f64;
    let b2 = m4 / (m2 * m2);
    let expected = 3.0 * (n - 1.0) / (n + 1.0);
    let variance = 24.0 * n * (n - 2.0) * (n - 3.0) / ((n + 1.0).powi(2) * (n + 3.0) * (n + 5.0));
    let x = (b2 - expected) / variance.sqrt();
    let sqrt_beta1 = 6.0 * (n * n - 5.0 * n + 2.0) / ((n + 7.0) * (n + 9.0))
        * (6.0 * (n + 3.0) * (n + 5.0) / (n * (n - 2.0) * (n - 3.0))).sqrt();
    let a = 6.0
        + 8.0 / sqrt_beta1 * (2.0 / sqrt_beta1 + (1.0 + 4.0 / (sqrt_beta1 * sqrt_beta1)).sqrt());
    let term1 = 1.0 - 2.0 / (9.0 * a);
    let denom = 1.0 + x * (2.0 / (a - 4.0)).sqrt();
    if denom == 0.0 {
        return Err(StatisticsError::NonFiniteInput);
    }
    let term2 = denom.signum() * ((1.0 - 2.0 / a) / denom.abs()).cbrt();
    Ok((term1 - term2) / (2.0 / (9.0 * a)).sqrt())
}

/// D'Agostino and Pearson's omnibus test for normality combining skewness and kurtosis.
/// Returns the statistic K² and the p-value of the chi-square distribution with two degrees of freedom.
///
/// # Arguments
/// * `data` - Sample with at least eight observations
///
pub fn normaltest(data: &[f64]) -> Result<(f64, f64), StatisticsError> {
    let z_skew = skewtest(data)?;
    let z_kurtosis = kurtosistest(data)?;
    let statistic = z_skew * z_skew + z_kurtosis * z_kurtosis;
    Ok((statistic, (-statistic / 2.0).exp()))
}
