/// Largest sample size for which the exact distribution is evaluated
///
const MAX_EXACT_SAMPLE_SIZE: usize = 140;

/// Scaling used to keep the matrix power within floating point range
///
const EXPONENT_SCALE: f64 = 1e140;
const EXPONENT_STEP: i32 = 140;

/// Survival function of the limiting Kolmogorov distribution, `P(K > lambda)`
///
/// # Arguments
/// * `lambda` - Scaled statistic, e.g. `sqrt(n) * D`
///
pub fn kolmogorov_sf(lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 1.0;
    }
    if lambda < 1.18 {
        // Faster converging series for small values
        let factor = std::f64::consts::PI.powi(2) / (8.0 * lambda * lambda);
        let sum: f64 = (1..=100)
            .map(|k| (-((2 * k - 1) as f64).powi(2) * factor).exp())
            .sum();
        let cdf = (2.0 * std::f64::consts::PI).sqrt() / lambda * sum;
        return (1.0 - cdf).clamp(0.0, 1.0);
    }
    let mut sf = 0.0;
    for k in 1..=100 {
        let kf = k as f64;
        let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
        let term = sign * (-2.0 * kf * kf * lambda * lambda).exp();
        sf += term;
        if term.abs() < 1e-16 {
            break;
        }
    }
    (2.0 * sf).clamp(0.0, 1.0)
}

/// Multiplies two square matrices of size `m` stored row major
///
fn matrix_multiply(a: &[f64], b: &[f64], m: usize) -> Vec<f64> {
    let mut product = vec![0.0; m * m];
    for i in 0..m {
        for k in 0..m {
            let a_ik = a[i * m + k];
            if a_ik == 0.0 {
                continue;
            }
            for j in 0..m {
                product[i * m + j] += a_ik * b[k * m + j];
            }
        }
    }
    product
}

/// Raises the matrix to the power `n`, returning the scaled matrix and its decimal exponent
///
fn matrix_power(a: &[f64], m: usize, n: usize) -> (Vec<f64>, i32) {
    if n == 1 {
        return (a.to_vec(), 0);
    }
    let (half, half_exponent) = matrix_power(a, m, n / 2);
    let squared = matrix_multiply(&half, &half, m);
    let mut power = if n % 2 == 1 {
        matrix_multiply(a, &squared, m)
    } else {
        squared
    };
    let mut exponent = 2 * half_exponent;
    if power[(m / 2) * m + m / 2] > EXPONENT_SCALE {
        power.iter_mut().for_each(|value| *value /= EXPONENT_SCALE);
        exponent += EXPONENT_STEP;
    }
    (power, exponent)
}

/// Exact `P(D_n < d)` after Marsaglia, Tsang & Wang (2003)
///
fn exact_cdf(n: usize, d: f64) -> f64 {
    let nf = n as f64;
    let k = (nf * d) as usize + 1;
    let m = 2 * k - 1;
    let h = k as f64 - nf * d;

    let mut hm = vec![0.0; m * m];
    for i in 0..m {
        for j in 0..m {
            if i + 1 >= j {
                hm[i * m + j] = 1.0;
            }
        }
    }
    for i in 0..m {
        hm[i * m] -= h.powi(i as i32 + 1);
        hm[(m - 1) * m + i] -= h.powi((m - i) as i32);
    }
    if 2.0 * h - 1.0 > 0.0 {
        hm[(m - 1) * m] += (2.0 * h - 1.0).powi(m as i32);
    }
    for i in 0..m {
        for j in 0..m {
            if i + 1 > j {
                for g in 1..=(i + 1 - j) {
                    hm[i * m + j] /= g as f64;
                }
            }
        }
    }

    let (power, mut exponent) = matrix_power(&hm, m, n);
    let mut s = power[(k - 1) * m + (k - 1)];
    for i in 1..=n {
        s = s * i as f64 / nf;
        if s < 1.0 / EXPONENT_SCALE {
            s *= EXPONENT_SCALE;
            exponent -= EXPONENT_STEP;
        }
    }
    (s * 10f64.powi(exponent)).clamp(0.0, 1.0)
}

/// Distribution of the two-sided one sample Kolmogorov-Smirnov statistic `D_n`
/// for a sample of size `n`.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KolmogorovSmirnov {
    n: usize,
}

impl KolmogorovSmirnov {
    /// Creates a new distribution, `n` is clamped to at least one.
    ///
    pub fn new(n: usize) -> Self {
        Self { n: n.max(1) }
    }

    pub fn get_n(&self) -> usize {
        self.n
    }

    /// `P(D_n <= d)`
    ///
    pub fn cdf(&self, d: f64) -> f64 {
        let nf = self.n as f64;
        if d <= 0.5 / nf {
            return 0.0;
        }
        if d >= 1.0 {
            return 1.0;
        }
        if self.n > MAX_EXACT_SAMPLE_SIZE {
            let sqrt_n = nf.sqrt();
            return 1.0 - kolmogorov_sf((sqrt_n + 0.12 + 0.11 / sqrt_n) * d);
        }
        // Right tail is indistinguishable from 1 with 7 digits
        if nf * d * d > 18.0 {
            return 1.0;
        }
        exact_cdf(self.n, d)
    }

    /// `P(D_n > d)`
    ///
    pub fn sf(&self, d: f64) -> f64 {
        (1.0 - self.cdf(d)).clamp(0.0, 1.0)
    }

    /// Density approximated by a central difference of the distribution function
    ///
    pub fn pdf(&self, d: f64) -> f64 {
        let step = 1e-5;
        ((self.cdf(d + step) - self.cdf(d - step)) / (2.0 * step)).max(0.0)
    }

    /// Quantile function evaluated by bisection
    ///
    pub fn inverse_cdf(&self, p: f64) -> f64 {
        let mut lower = 0.5 / self.n as f64;
        let mut upper = 1.0;
        if p <= 0.0 {
            return lower;
        }
        if p >= 1.0 {
            return upper;
        }
        for _ in 0..100 {
            let mid = 0.5 * (lower + upper);
            if self.cdf(mid) < p {
                lower = mid;
            } else {
                upper = mid;
            }
            if upper - lower < 1e-12 {
                break;
            }
        }
        0.5 * (lower + upper)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_exact_critical_values() {
        // Tabulated two-sided critical values at alpha = 0.05
        assert!((KolmogorovSmirnov::new(10).sf(0.40925) - 0.05).abs() < 1e-4);
        assert!((KolmogorovSmirnov::new(5).sf(0.56328) - 0.05).abs() < 1e-4);
        assert!((KolmogorovSmirnov::new(100).sf(0.134) - 0.05).abs() < 1e-3);
    }

    #[test]
    fn test_single_observation() {
        // D_1 is uniform on [0.5, 1]
        let ks = KolmogorovSmirnov::new(1);
        assert!((ks.cdf(0.75) - 0.5).abs() < 1e-12);
        assert_eq!(ks.cdf(0.4), 0.0);
        assert_eq!(ks.cdf(1.0), 1.0);
    }

    #[test]
    fn test_asymptotic_sample_size() {
        let ks = KolmogorovSmirnov::new(1000);
        let critical = 1.358 / 1000f64.sqrt();
        assert!((ks.sf(critical) - 0.05).abs() < 2e-3);
    }

    #[test]
    fn test_kolmogorov_sf() {
        assert_eq!(kolmogorov_sf(0.0), 1.0);
        assert!((kolmogorov_sf(1.36) - 0.0495).abs() < 1e-3);
        // Both series agree around the switch
        assert!((kolmogorov_sf(1.179999) - kolmogorov_sf(1.180001)).abs() < 1e-5);
    }

    #[test]
    fn test_inverse_cdf_and_pdf() {
        let ks = KolmogorovSmirnov::new(20);
        let quantile = ks.inverse_cdf(0.95);
        assert!((ks.cdf(quantile) - 0.95).abs() < 1e-6);
        assert!(ks.pdf(quantile) > 0.0);
        assert_eq!(ks.pdf(0.001), 0.0);
    }
}
