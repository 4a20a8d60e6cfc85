// std imports
use std::fmt;

// 3rd party imports
use plotters::coord::Shift;
use plotters::prelude::{DrawingArea, DrawingBackend};
use rand::distributions::Distribution;
use rand::Rng;
use serde::{Deserialize, Serialize};
use statrs::distribution::{
    Beta, ChiSquared, Continuous, ContinuousCDF, Exp, Gamma, LogNormal, Normal, Pareto, Uniform,
    Weibull,
};
use statrs::statistics::Statistics;
use statrs::StatsError;
use tracing::{debug, error};

// internal imports
use crate::errors::distribution_error::DistributionError;
use crate::errors::plot_error::PlotError;
use crate::statistics::linspace;
use crate::visual::canvas::{Canvas, HistStat};
use crate::visual::charts::{draw_curves, draw_histograms, ecdf};
use crate::visual::{panel, Plot};

/// Names of the distributions which can be fitted
///
pub const SUPPORTED_DISTRIBUTIONS: [&str; 9] = [
    "normal",
    "exponential",
    "uniform",
    "gamma",
    "lognorm",
    "chi2",
    "beta",
    "weibull_min",
    "pareto",
];

/// Euler-Mascheroni constant
///
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Relative padding of the sample range when fitting the beta distribution
///
const BETA_RANGE_PADDING: f64 = 1e-3;

/// Theoretical distribution with parameters estimated from a sample
///
#[derive(Debug, Clone, PartialEq)]
pub enum FittedDistribution {
    Normal { mean: f64, std: f64, dist: Normal },
    /// Exponential distribution shifted by `loc`
    Exponential { loc: f64, dist: Exp },
    Uniform { min: f64, max: f64, dist: Uniform },
    Gamma(Gamma),
    /// Log-normal distribution with `location` and `scale` of the underlying normal distribution
    LogNormal {
        location: f64,
        scale: f64,
        dist: LogNormal,
    },
    ChiSquared(ChiSquared),
    /// Beta distribution on `[loc, loc + scale]`
    Beta { loc: f64, scale: f64, dist: Beta },
    Weibull(Weibull),
    Pareto(Pareto),
}

fn param_error(name: &str) -> impl FnOnce(StatsError) -> DistributionError + '_ {
    move |err| DistributionError::ParameterError(name.to_string(), err)
}

/// Population mean and standard deviation
///
fn mean_and_std(data: &[f64]) -> (f64, f64) {
    let mean = data.iter().mean();
    (mean, data.iter().population_std_dev())
}

impl FittedDistribution {
    /// Estimates the parameters of the named distribution from the sample.
    /// Closed form maximum likelihood estimates are used where they exist,
    /// the method of moments otherwise.
    ///
    /// # Arguments
    /// * `name` - Distribution name, see [SUPPORTED_DISTRIBUTIONS]
    /// * `data` - Sample
    ///
    pub fn fit(name: &str, data: &[f64]) -> Result<Self, DistributionError> {
        if !SUPPORTED_DISTRIBUTIONS.contains(&name) {
            error!("Distribution `{}` is not supported", name);
            return Err(DistributionError::NotImplemented(name.to_string()));
        }
        if data.len() < 2 || data.iter().any(|value| !value.is_finite()) {
            return Err(DistributionError::FitError(
                name.to_string(),
                "at least two finite observations are required",
            ));
        }
        let positive = data.iter().all(|value| *value > 0.0);
        let min = Statistics::min(data.iter());
        let max = Statistics::max(data.iter());
        let fit_error = |reason| DistributionError::FitError(name.to_string(), reason);
        if max <= min {
            return Err(fit_error("sample has zero range"));
        }

        let fitted = match name {
            "normal" => {
                let (mean, std) = mean_and_std(data);
                Self::Normal {
                    mean,
                    std,
                    dist: Normal::new(mean, std).map_err(param_error(name))?,
                }
            }
            "exponential" => {
                let scale = data.iter().mean() - min;
                Self::Exponential {
                    loc: min,
                    dist: Exp::new(1.0 / scale).map_err(param_error(name))?,
                }
            }
            "uniform" => {
                Self::Uniform {
                    min,
                    max,
                    dist: Uniform::new(min, max).map_err(param_error(name))?,
                }
            }
            "gamma" => {
                if !positive {
                    return Err(fit_error("all observations must be positive"));
                }
                let (mean, std) = mean_and_std(data);
                let variance = std * std;
                Self::Gamma(
                    Gamma::new(mean * mean / variance, mean / variance)
                        .map_err(param_error(name))?,
                )
            }
            "lognorm" => {
                if !positive {
                    return Err(fit_error("all observations must be positive"));
                }
                let logs: Vec<f64> = data.iter().map(|value| value.ln()).collect();
                let (location, scale) = mean_and_std(&logs);
                Self::LogNormal {
                    location,
                    scale,
                    dist: LogNormal::new(location, scale).map_err(param_error(name))?,
                }
            }
            "chi2" => {
                if !positive {
                    return Err(fit_error("all observations must be positive"));
                }
                Self::ChiSquared(ChiSquared::new(data.iter().mean()).map_err(param_error(name))?)
            }
            "beta" => {
                let padding = (max - min) * BETA_RANGE_PADDING;
                let loc = min - padding;
                let scale = max - min + 2.0 * padding;
                let scaled: Vec<f64> = data.iter().map(|value| (value - loc) / scale).collect();
                let (mean, std) = mean_and_std(&scaled);
                let common = mean * (1.0 - mean) / (std * std) - 1.0;
                Self::Beta {
                    loc,
                    scale,
                    dist: Beta::new(mean * common, (1.0 - mean) * common)
                        .map_err(param_error(name))?,
                }
            }
            "weibull_min" => {
                if !positive {
                    return Err(fit_error("all observations must be positive"));
                }
                // Menon's estimator on the log sample
                let logs: Vec<f64> = data.iter().map(|value| value.ln()).collect();
                let (mean, std) = mean_and_std(&logs);
                let shape = std::f64::consts::PI / (6f64.sqrt() * std);
                Self::Weibull(
                    Weibull::new(shape, (mean + EULER_GAMMA / shape).exp())
                        .map_err(param_error(name))?,
                )
            }
            "pareto" => {
                if !positive {
                    return Err(fit_error("all observations must be positive"));
                }
                let log_sum: f64 = data.iter().map(|value| (value / min).ln()).sum();
                Self::Pareto(
                    Pareto::new(min, data.len() as f64 / log_sum).map_err(param_error(name))?,
                )
            }
            _ => return Err(DistributionError::NotImplemented(name.to_string())),
        };
        debug!("Fitted {}", fitted);
        Ok(fitted)
    }

    /// Name of the distribution as accepted by [FittedDistribution::fit]
    ///
    pub fn name(&self) -> &'static str {
        match self {
            Self::Normal { .. } => "normal",
            Self::Exponential { .. } => "exponential",
            Self::Uniform { .. } => "uniform",
            Self::Gamma(_) => "gamma",
            Self::LogNormal { .. } => "lognorm",
            Self::ChiSquared(_) => "chi2",
            Self::Beta { .. } => "beta",
            Self::Weibull(_) => "weibull_min",
            Self::Pareto(_) => "pareto",
        }
    }

    /// Estimated parameters as name/value pairs
    ///
    pub fn parameters(&self) -> Vec<(&'static str, f64)> {
        match self {
            Self::Normal { mean, std, .. } => vec![("mean", *mean), ("std", *std)],
            Self::Exponential { loc, dist } => vec![("loc", *loc), ("scale", 1.0 / dist.rate())],
            Self::Uniform { min, max, .. } => vec![("min", *min), ("max", *max)],
            Self::Gamma(dist) => vec![("shape", dist.shape()), ("rate", dist.rate())],
            Self::LogNormal {
                location, scale, ..
            } => vec![("location", *location), ("scale", *scale)],
            Self::ChiSquared(dist) => vec![("df", dist.freedom())],
            Self::Beta { loc, scale, dist } => vec![
                ("a", dist.shape_a()),
                ("b", dist.shape_b()),
                ("loc", *loc),
                ("scale", *scale),
            ],
            Self::Weibull(dist) => vec![("shape", dist.shape()), ("scale", dist.scale())],
            Self::Pareto(dist) => vec![("scale", dist.scale()), ("shape", dist.shape())],
        }
    }

    pub fn cdf(&self, x: f64) -> f64 {
        match self {
            Self::Normal { dist, .. } => dist.cdf(x),
            Self::Exponential { loc, dist } => dist.cdf((x - loc).max(0.0)),
            Self::Uniform { dist, .. } => dist.cdf(x),
            Self::Gamma(dist) => dist.cdf(x),
            Self::LogNormal { dist, .. } => dist.cdf(x),
            Self::ChiSquared(dist) => dist.cdf(x),
            Self::Beta { loc, scale, dist } => dist.cdf(((x - loc) / scale).clamp(0.0, 1.0)),
            Self::Weibull(dist) => dist.cdf(x),
            Self::Pareto(dist) => dist.cdf(x),
        }
    }

    pub fn pdf(&self, x: f64) -> f64 {
        match self {
            Self::Normal { dist, .. } => dist.pdf(x),
            Self::Exponential { loc, dist } => {
                if x < *loc {
                    0.0
                } else {
                    dist.pdf(x - loc)
                }
            }
            Self::Uniform { dist, .. } => dist.pdf(x),
            Self::Gamma(dist) => dist.pdf(x),
            Self::LogNormal { dist, .. } => dist.pdf(x),
            Self::ChiSquared(dist) => dist.pdf(x),
            Self::Beta { loc, scale, dist } => {
                let scaled = (x - loc) / scale;
                if (0.0..=1.0).contains(&scaled) {
                    dist.pdf(scaled) / scale
                } else {
                    0.0
                }
            }
            Self::Weibull(dist) => dist.pdf(x),
            Self::Pareto(dist) => dist.pdf(x),
        }
    }

    /// Percent point function
    ///
    pub fn inverse_cdf(&self, p: f64) -> f64 {
        match self {
            Self::Normal { dist, .. } => dist.inverse_cdf(p),
            Self::Exponential { loc, dist } => loc + dist.inverse_cdf(p),
            Self::Uniform { dist, .. } => dist.inverse_cdf(p),
            Self::Gamma(dist) => dist.inverse_cdf(p),
            Self::LogNormal { dist, .. } => dist.inverse_cdf(p),
            Self::ChiSquared(dist) => dist.inverse_cdf(p),
            Self::Beta { loc, scale, dist } => loc + scale * dist.inverse_cdf(p),
            Self::Weibull(dist) => dist.inverse_cdf(p),
            Self::Pareto(dist) => dist.inverse_cdf(p),
        }
    }

    /// Draws `n` random variates
    ///
    /// # Arguments
    /// * `rng` - Random number generator
    /// * `n` - Number of variates
    ///
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<f64> {
        let mut variates = Vec::with_capacity(n);
        for _ in 0..n {
            let variate = match self {
                Self::Normal { dist, .. } => dist.sample(&mut *rng),
                Self::Exponential { loc, dist } => loc + dist.sample(&mut *rng),
                Self::Uniform { dist, .. } => dist.sample(&mut *rng),
                Self::Gamma(dist) => dist.sample(&mut *rng),
                Self::LogNormal { dist, .. } => dist.sample(&mut *rng),
                Self::ChiSquared(dist) => dist.sample(&mut *rng),
                Self::Beta { loc, scale, dist } => loc + scale * dist.sample(&mut *rng),
                Self::Weibull(dist) => dist.sample(&mut *rng),
                Self::Pareto(dist) => dist.sample(&mut *rng),
            };
            variates.push(variate);
        }
        variates
    }
}

impl fmt::Display for FittedDistribution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let parameters: Vec<String> = self
            .parameters()
            .iter()
            .map(|(name, value)| format!("{}={:.4}", name, value))
            .collect();
        write!(f, "{}({})", self.name(), parameters.join(", "))
    }
}

/// Points of a curve
///
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Curve {
    /// Evaluates the function on `points` evenly spaced values from `start` to `stop`
    ///
    pub fn sample<F: Fn(f64) -> f64>(function: F, start: f64, stop: f64, points: usize) -> Self {
        let x = linspace(start, stop, points);
        let y = x.iter().map(|value| function(*value)).collect();
        Self { x, y }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Returns the points as pairs
    ///
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    /// Linear interpolation at `x`, `None` outside of the curve's domain
    ///
    pub fn interpolate(&self, x: f64) -> Option<f64> {
        let upper = self.x.iter().position(|value| *value >= x)?;
        if upper == 0 {
            return (self.x[0] == x).then_some(self.y[0]);
        }
        let (x0, x1) = (self.x[upper - 1], self.x[upper]);
        let (y0, y1) = (self.y[upper - 1], self.y[upper]);
        Some(y0 + (y1 - y0) * (x - x0) / (x1 - x0))
    }

    /// Smallest and largest x value
    ///
    pub fn x_range(&self) -> Option<(f64, f64)> {
        Some((*self.x.first()?, *self.x.last()?))
    }

    /// Largest finite y value
    ///
    pub fn y_max(&self) -> Option<f64> {
        self.y
            .iter()
            .copied()
            .filter(|value| value.is_finite())
            .reduce(f64::max)
    }
}

/// Random variates and density curves of a distribution fitted to a sample
///
#[derive(Debug, Clone)]
pub struct RvsOutcome {
    pub distribution: FittedDistribution,
    /// Sample the distribution was fitted to
    pub data: Vec<f64>,
    /// Random variates, as many as observations in the sample
    pub rvs: Vec<f64>,
    /// Density between the 1% and 99% quantiles
    pub pdf: Curve,
    /// Cumulative distribution between the 1% and 99% quantiles
    pub cdf: Curve,
}

impl Plot for RvsOutcome {
    fn panel_count(&self) -> usize {
        2
    }

    fn draw_panels<DB: DrawingBackend>(
        &self,
        canvas: &Canvas,
        panels: &[DrawingArea<DB, Shift>],
    ) -> Result<(), PlotError> {
        let colors = &canvas.colors;
        let name = self.distribution.to_string();
        draw_histograms(
            canvas,
            panel(panels, 0)?,
            &format!("Data and Random Variates of {}", name),
            "Value",
            &[
                ("Data", self.data.as_slice(), colors.dark_blue.as_str()),
                ("Random Variates", self.rvs.as_slice(), colors.teal_blue.as_str()),
            ],
            Some(("Probability Density", &self.pdf, colors.orange.as_str())),
            HistStat::Density,
        )?;
        let empirical = ecdf(&self.data);
        draw_curves(
            canvas,
            panel(panels, 1)?,
            &format!("Cumulative Distribution of {}", name),
            ("Value", "Proportion"),
            &[
                ("Empirical", &empirical, colors.dark_blue.as_str()),
                ("Theoretical", &self.cdf, colors.orange.as_str()),
            ],
        )
    }
}

/// Fits distributions to samples and draws random variates from them.
/// Nothing is kept between calls.
///
pub struct RvsDistribution;

impl RvsDistribution {
    /// Fits the distribution to the data and generates variates using the thread local generator
    ///
    /// # Arguments
    /// * `data` - Sample
    /// * `name` - Distribution name, see [SUPPORTED_DISTRIBUTIONS]
    ///
    pub fn generate(data: &[f64], name: &str) -> Result<RvsOutcome, DistributionError> {
        Self::generate_with_rng(data, name, &mut rand::thread_rng())
    }

    /// Fits the distribution to the data and generates variates with the given generator
    ///
    /// # Arguments
    /// * `data` - Sample
    /// * `name` - Distribution name, see [SUPPORTED_DISTRIBUTIONS]
    /// * `rng` - Random number generator
    ///
    pub fn generate_with_rng<R: Rng + ?Sized>(
        data: &[f64],
        name: &str,
        rng: &mut R,
    ) -> Result<RvsOutcome, DistributionError> {
        let distribution = FittedDistribution::fit(name, data)?;
        let rvs = distribution.sample(rng, data.len());
        let lower = distribution.inverse_cdf(0.01);
        let upper = distribution.inverse_cdf(0.99);
        let pdf = Curve::sample(|x| distribution.pdf(x), lower, upper, data.len());
        let cdf = Curve::sample(|x| distribution.cdf(x), lower, upper, data.len());
        Ok(RvsOutcome {
            distribution,
            data: data.to_vec(),
            rvs,
            pdf,
            cdf,
        })
    }
}

#[cfg(test)]
mod test {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::visual::render_svg;

    fn sample() -> Vec<f64> {
        (1..=40)
            .map(|idx| 1.0 + (idx as f64 * 0.37).sin().abs() * 4.0 + idx as f64 / 10.0)
            .collect()
    }

    #[test]
    fn test_fit_normal() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        let fitted = FittedDistribution::fit("normal", &data).unwrap();
        let parameters = fitted.parameters();
        assert_eq!(parameters[0], ("mean", 3.0));
        assert!((parameters[1].1 - 2f64.sqrt()).abs() < 1e-12);
        assert!((fitted.cdf(3.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_fit_all_supported() {
        let data = sample();
        for name in SUPPORTED_DISTRIBUTIONS {
            let fitted = FittedDistribution::fit(name, &data).unwrap();
            assert_eq!(fitted.name(), name);
            let median = fitted.inverse_cdf(0.5);
            assert!((fitted.cdf(median) - 0.5).abs() < 1e-3, "{}", name);
            assert!(fitted.pdf(median) > 0.0, "{}", name);
        }
    }

    #[test]
    fn test_fit_errors() {
        assert!(matches!(
            FittedDistribution::fit("logistic", &[1.0, 2.0]),
            Err(DistributionError::NotImplemented(name)) if name == "logistic"
        ));
        assert!(matches!(
            FittedDistribution::fit("gamma", &[-1.0, 2.0]),
            Err(DistributionError::FitError(_, _))
        ));
        assert!(matches!(
            FittedDistribution::fit("uniform", &[2.0, 2.0]),
            Err(DistributionError::FitError(_, _))
        ));
        assert!(matches!(
            FittedDistribution::fit("normal", &[1.0]),
            Err(DistributionError::FitError(_, _))
        ));
    }

    #[test]
    fn test_generate() {
        let data = sample();
        let mut rng = StdRng::seed_from_u64(42);
        let outcome = RvsDistribution::generate_with_rng(&data, "normal", &mut rng).unwrap();
        assert_eq!(outcome.rvs.len(), data.len());
        assert_eq!(outcome.data, data);
        assert_eq!(outcome.pdf.len(), data.len());
        assert_eq!(outcome.cdf.len(), data.len());
        assert!((outcome.cdf.y[0] - 0.01).abs() < 1e-4);
        assert!((outcome.cdf.y[data.len() - 1] - 0.99).abs() < 1e-4);

        // Same seed, same variates
        let mut rng = StdRng::seed_from_u64(42);
        let again = RvsDistribution::generate_with_rng(&data, "normal", &mut rng).unwrap();
        assert_eq!(outcome.rvs, again.rvs);
    }

    #[test]
    fn test_curve_interpolate() {
        let curve = Curve::sample(|x| 2.0 * x, 0.0, 1.0, 11);
        assert!((curve.interpolate(0.55).unwrap() - 1.1).abs() < 1e-12);
        assert_eq!(curve.interpolate(0.0), Some(0.0));
        assert_eq!(curve.interpolate(1.5), None);
        assert_eq!(curve.interpolate(-0.5), None);
    }

    #[test]
    fn test_render() {
        let mut rng = StdRng::seed_from_u64(42);
        let outcome = RvsDistribution::generate_with_rng(&sample(), "normal", &mut rng).unwrap();
        assert_eq!(outcome.panel_count(), 2);
        let svg = render_svg(&outcome, &Canvas::default()).unwrap();
        assert!(svg.contains("Data and Random Variates of normal("));
        assert!(svg.contains("Cumulative Distribution of normal("));
        assert!(svg.contains("Random Variates"));
    }
}

