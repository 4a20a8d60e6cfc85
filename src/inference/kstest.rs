// std imports
use std::fmt;
use std::ops::Deref;

// 3rd party imports
use plotters::coord::Shift;
use plotters::prelude::{DrawingArea, DrawingBackend};
use polars::frame::DataFrame;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// internal imports
use super::base::{
    decision_sentence, load_test_profile, log_error, validate_alpha, write_row, Decision,
    StatTestResult, StatisticalTest,
};
use crate::constants::{
    DEFAULT_MC_SAMPLES, DEFAULT_MC_SEED, FIRST_SAMPLE_NAME, KS_MAX_RECOMMENDED_SAMPLE_SIZE,
    KS_MIN_RECOMMENDED_SAMPLE_SIZE, SECOND_SAMPLE_NAME,
};
use crate::data::dataset::column_as_f64;
use crate::data::generation::{Curve, FittedDistribution};
use crate::errors::plot_error::PlotError;
use crate::errors::stat_test_error::StatTestError;
use crate::profile::{ProfileRegistry, StatTestProfile};
use crate::statistics::kolmogorov::KolmogorovSmirnov;
use crate::statistics::kstest::{ks_2samp, ks_statistic, kstest, KsNullDistribution, KsOutcome};
use crate::visual::canvas::{Canvas, HistStat};
use crate::visual::charts::{draw_curves, draw_histograms, ecdf, GaussianKde};
use crate::visual::sampling_plot::SamplingDistributionPlot;
use crate::visual::{panel, Plot};

/// Reference the sample is compared with
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KsReference {
    /// Named distribution fitted to the sample
    Distribution(String),
    /// Second sample
    Sample(Vec<f64>),
}

/// Result of a one or two sample Kolmogorov-Smirnov test
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KsTestResult {
    #[serde(flatten)]
    general: StatTestResult,
    /// Size of the (first) sample
    pub n: usize,
    /// Name of the (first) sample
    pub a: String,
    /// Name of the second sample or the reference distribution
    pub b: String,
    pub data: Vec<f64>,
    pub reference: KsReference,
    /// Observation at which the maximal distance occurs
    pub location: f64,
    pub sign: i8,
    /// Fitted reference distribution with its parameters
    pub fitted: Option<String>,
    /// Distribution of the statistic the p-value was taken from
    pub null: KsNullDistribution,
    #[serde(skip)]
    distribution: Option<FittedDistribution>,
}

impl Deref for KsTestResult {
    type Target = StatTestResult;

    fn deref(&self) -> &StatTestResult {
        &self.general
    }
}

impl fmt::Display for KsTestResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.general)?;
        write_row(f, "N", self.n)?;
        write_row(f, "sample", &self.a)?;
        write_row(f, "reference", &self.b)?;
        if let Some(fitted) = &self.fitted {
            write_row(f, "fitted", fitted)?;
        }
        write_row(f, "location", self.location)?;
        write_row(f, "sign", self.sign)?;
        Ok(())
    }
}

impl KsTestResult {
    /// Distribution of the statistic under the null hypothesis with the rejection region at `alpha`.
    /// The region is derived from the same distribution as the p-value.
    ///
    pub fn sampling_plot(&self) -> SamplingDistributionPlot {
        let title = format!("Kolmogorov-Smirnov Test\n{}", self.get_result());
        let plot = match &self.null {
            KsNullDistribution::Bootstrap { statistics } => {
                match GaussianKde::new(statistics) {
                    Some(kde) => {
                        let (lower, upper) = kde.support();
                        SamplingDistributionPlot::new(
                            &title,
                            "D",
                            "Probability Density",
                            |x| kde.pdf(x),
                            lower.max(0.0),
                            upper.min(1.0),
                            500,
                        )
                    }
                    None => SamplingDistributionPlot::new(
                        &title,
                        "D",
                        "Probability Density",
                        |_| 0.0,
                        0.0,
                        1.0,
                        2,
                    ),
                }
            }
            null => {
                let dist = KolmogorovSmirnov::new(null.effective_n());
                SamplingDistributionPlot::new(
                    &title,
                    "D",
                    "Probability Density",
                    |x| dist.pdf(x),
                    dist.inverse_cdf(0.001),
                    dist.inverse_cdf(0.999),
                    500,
                )
            }
        };
        let plot = match self.null.critical_value(self.get_alpha()) {
            Some(critical) => plot.with_upper_tail(critical),
            None => plot,
        };
        plot.locate_statistic(self.get_value(), &format!("D = {:.4}", self.get_value()))
    }

    /// Fitted distribution function between its 1% and 99% quantiles
    ///
    fn reference_curve<F>(&self, function: F) -> Option<Curve>
    where
        F: Fn(&FittedDistribution, f64) -> f64,
    {
        self.distribution.as_ref().map(|dist| {
            Curve::sample(
                |x| function(dist, x),
                dist.inverse_cdf(0.01),
                dist.inverse_cdf(0.99),
                self.n.max(2),
            )
        })
    }

    fn draw_cdf<DB: DrawingBackend>(
        &self,
        canvas: &Canvas,
        area: &DrawingArea<DB, Shift>,
    ) -> Result<(), PlotError> {
        let colors = &canvas.colors;
        let empirical = ecdf(&self.data);
        match &self.reference {
            KsReference::Distribution(_) => {
                let theoretical = self
                    .reference_curve(|dist, x| dist.cdf(x))
                    .ok_or(PlotError::EmptyPlot("reference distribution"))?;
                draw_curves(
                    canvas,
                    area,
                    "Theoretical and Empirical Cumulative Distribution Function",
                    (&self.a, "Proportion"),
                    &[
                        ("Empirical", &empirical, colors.dark_blue.as_str()),
                        ("Theoretical", &theoretical, colors.orange.as_str()),
                    ],
                )
            }
            KsReference::Sample(sample) => {
                let second = ecdf(sample);
                draw_curves(
                    canvas,
                    area,
                    "Two Sample Cumulative Distribution Function",
                    ("Value", "Proportion"),
                    &[
                        (self.a.as_str(), &empirical, colors.dark_blue.as_str()),
                        (self.b.as_str(), &second, colors.orange.as_str()),
                    ],
                )
            }
        }
    }

    fn draw_pdf<DB: DrawingBackend>(
        &self,
        canvas: &Canvas,
        area: &DrawingArea<DB, Shift>,
    ) -> Result<(), PlotError> {
        let colors = &canvas.colors;
        match &self.reference {
            KsReference::Distribution(_) => {
                let theoretical = self
                    .reference_curve(|dist, x| dist.pdf(x))
                    .ok_or(PlotError::EmptyPlot("reference distribution"))?;
                draw_histograms(
                    canvas,
                    area,
                    "Theoretical and Empirical Probability Density Function",
                    &self.a,
                    &[(self.a.as_str(), self.data.as_slice(), colors.dark_blue.as_str())],
                    Some(("Theoretical", &theoretical, colors.orange.as_str())),
                    HistStat::Density,
                )
            }
            KsReference::Sample(sample) => draw_histograms(
                canvas,
                area,
                "Two Sample Probability Density Function",
                "Value",
                &[
                    (self.a.as_str(), self.data.as_slice(), colors.dark_blue.as_str()),
                    (self.b.as_str(), sample.as_slice(), colors.orange.as_str()),
                ],
                None,
                HistStat::Density,
            ),
        }
    }
}

impl Plot for KsTestResult {
    fn panel_count(&self) -> usize {
        3
    }

    fn draw_panels<DB: DrawingBackend>(
        &self,
        canvas: &Canvas,
        panels: &[DrawingArea<DB, Shift>],
    ) -> Result<(), PlotError> {
        self.sampling_plot().draw(canvas, panel(panels, 0)?)?;
        self.draw_cdf(canvas, panel(panels, 1)?)?;
        self.draw_pdf(canvas, panel(panels, 2)?)
    }
}

/// Note on the validity of the test for the sample size
///
fn sample_size_note(n: usize) -> Option<String> {
    if n < KS_MIN_RECOMMENDED_SAMPLE_SIZE {
        Some(format!(
            "Note: The Kolmogorov-Smirnov Test requires a sample size N > {}. For smaller sample sizes, the Shapiro-Wilk test should be considered.",
            KS_MIN_RECOMMENDED_SAMPLE_SIZE
        ))
    } else if n > KS_MAX_RECOMMENDED_SAMPLE_SIZE {
        Some("Note: The Kolmogorov-Smirnov Test on large sample sizes may lead to rejections of the null hypothesis that are statistically significant, yet practically insignificant.".to_string())
    } else {
        None
    }
}

/// Builds the common record of both KS tests
///
/// # Arguments
/// * `profile` - Test profile
/// * `outcome` - Statistic and p-value
/// * `n` - Size of the (first) sample
/// * `alpha` - Significance level
/// * `against` - Object of the evidence clause
///
fn ks_general(
    profile: &StatTestProfile,
    outcome: &KsOutcome,
    n: usize,
    alpha: f64,
    against: &str,
) -> StatTestResult {
    let pvalue = outcome.pvalue;
    let report = format!("D({})={:.4}, p={:.3}", n, outcome.statistic, pvalue);
    StatTestResult::new(
        profile,
        "D",
        outcome.statistic,
        pvalue,
        alpha,
        report,
        |decision| {
            let evidence = match decision {
                Decision::FailToReject => "is not significant",
                Decision::Reject => "is significant",
            };
            format!(
                "{} The evidence against the data being drawn from {} {}.",
                decision_sentence(pvalue, alpha, decision),
                against,
                evidence
            )
        },
    )
    .with_interpretation(sample_size_note(n))
}

/// Statistics of `mc_samples` samples of size `n` drawn from the fitted distribution,
/// each tested against the distribution refitted to it.
///
/// # Arguments
/// * `distribution` - Distribution fitted to the observed sample
/// * `name` - Name the distribution is refitted by
/// * `n` - Size of the observed sample
/// * `mc_samples` - Number of bootstrap samples
/// * `seed` - Seed of the generator
///
pub(crate) fn bootstrap_null(
    distribution: &FittedDistribution,
    name: &str,
    n: usize,
    mc_samples: usize,
    seed: u64,
) -> Result<KsNullDistribution, StatTestError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut statistics = Vec::with_capacity(mc_samples);
    for _ in 0..mc_samples.max(1) {
        let variates = distribution.sample(&mut rng, n);
        let refit = FittedDistribution::fit(name, &variates)?;
        statistics.push(ks_statistic(&variates, |x| refit.cdf(x))?);
    }
    Ok(KsNullDistribution::Bootstrap { statistics })
}

/// One sample Kolmogorov-Smirnov test of the null hypothesis that the data
/// was drawn from the named distribution.
/// The parameters are estimated from the sample, so the p-value is taken from a parametric
/// bootstrap: samples drawn from the fitted distribution are tested against their own refit.
///
pub struct KsTest {
    profile: StatTestProfile,
    data: Vec<f64>,
    name: String,
    distribution: String,
    alpha: f64,
    mc_samples: usize,
    seed: u64,
    result: Option<KsTestResult>,
}

impl KsTest {
    /// Creates a new test
    ///
    /// # Arguments
    /// * `registry` - Profile registry
    /// * `data` - Sample
    /// * `distribution` - Name of the reference distribution, see [crate::data::generation::SUPPORTED_DISTRIBUTIONS]
    /// * `alpha` - Significance level
    ///
    pub fn new(
        registry: &ProfileRegistry,
        data: Vec<f64>,
        distribution: &str,
        alpha: f64,
    ) -> Result<Self, StatTestError> {
        Ok(Self {
            alpha: validate_alpha(alpha)?,
            profile: load_test_profile(registry, Self::ID)?,
            data,
            name: FIRST_SAMPLE_NAME.to_string(),
            distribution: distribution.to_string(),
            mc_samples: DEFAULT_MC_SAMPLES,
            seed: DEFAULT_MC_SEED,
            result: None,
        })
    }

    /// Sets the number of bootstrap samples, at least one
    ///
    pub fn with_mc_samples(mut self, mc_samples: usize) -> Self {
        self.mc_samples = mc_samples.max(1);
        self
    }

    /// Sets the seed of the bootstrap, runs with the same seed give the same p-value
    ///
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Creates a new test on a numeric column, nulls are dropped.
    ///
    /// # Arguments
    /// * `registry` - Profile registry
    /// * `df` - Data frame
    /// * `column` - Numeric column
    /// * `distribution` - Name of the reference distribution
    /// * `alpha` - Significance level
    ///
    pub fn from_frame(
        registry: &ProfileRegistry,
        df: &DataFrame,
        column: &str,
        distribution: &str,
        alpha: f64,
    ) -> Result<Self, StatTestError> {
        let data = column_as_f64(df, column).map_err(log_error(Self::ID))?;
        let mut test = Self::new(registry, data, distribution, alpha)?;
        test.name = column.to_string();
        Ok(test)
    }
}

impl StatisticalTest for KsTest {
    type Output = KsTestResult;
    const ID: &'static str = "ks1";

    fn profile(&self) -> &StatTestProfile {
        &self.profile
    }

    fn result(&self) -> Option<&KsTestResult> {
        self.result.as_ref()
    }

    fn run(&mut self) -> Result<&KsTestResult, StatTestError> {
        debug!(
            "[{}] Testing {} observations against {}",
            Self::ID,
            self.data.len(),
            self.distribution
        );
        let distribution =
            FittedDistribution::fit(&self.distribution, &self.data).map_err(log_error(Self::ID))?;
        let outcome = kstest(&self.data, |x| distribution.cdf(x)).map_err(log_error(Self::ID))?;
        let null = bootstrap_null(
            &distribution,
            &self.distribution,
            self.data.len(),
            self.mc_samples,
            self.seed,
        )
        .map_err(log_error(Self::ID))?;
        let outcome = KsOutcome {
            pvalue: null.sf(outcome.statistic),
            ..outcome
        };
        let n = self.data.len();
        let general = ks_general(
            &self.profile,
            &outcome,
            n,
            self.alpha,
            &format!("the {} distribution", self.distribution),
        );
        info!("[{}] {}", Self::ID, general.get_result());

        let result = self.result.insert(KsTestResult {
            general,
            n,
            a: self.name.clone(),
            b: self.distribution.clone(),
            data: self.data.clone(),
            reference: KsReference::Distribution(self.distribution.clone()),
            location: outcome.location,
            sign: outcome.sign,
            fitted: Some(distribution.to_string()),
            null,
            distribution: Some(distribution),
        });
        Ok(result)
    }
}

/// Two sample Kolmogorov-Smirnov test of the null hypothesis that both samples
/// were drawn from the same distribution.
///
pub struct KsTwoSampleTest {
    profile: StatTestProfile,
    a: Vec<f64>,
    b: Vec<f64>,
    a_name: String,
    b_name: String,
    alpha: f64,
    result: Option<KsTestResult>,
}

impl KsTwoSampleTest {
    /// Creates a new test
    ///
    /// # Arguments
    /// * `registry` - Profile registry
    /// * `a` - First sample
    /// * `b` - Second sample
    /// * `alpha` - Significance level
    ///
    pub fn new(
        registry: &ProfileRegistry,
        a: Vec<f64>,
        b: Vec<f64>,
        alpha: f64,
    ) -> Result<Self, StatTestError> {
        Ok(Self {
            alpha: validate_alpha(alpha)?,
            profile: load_test_profile(registry, Self::ID)?,
            a,
            b,
            a_name: FIRST_SAMPLE_NAME.to_string(),
            b_name: SECOND_SAMPLE_NAME.to_string(),
            result: None,
        })
    }

    /// Creates a new test on two numeric columns, nulls are dropped per column.
    ///
    /// # Arguments
    /// * `registry` - Profile registry
    /// * `df` - Data frame
    /// * `a` - First numeric column
    /// * `b` - Second numeric column
    /// * `alpha` - Significance level
    ///
    pub fn from_frame(
        registry: &ProfileRegistry,
        df: &DataFrame,
        a: &str,
        b: &str,
        alpha: f64,
    ) -> Result<Self, StatTestError> {
        let a_data = column_as_f64(df, a).map_err(log_error(Self::ID))?;
        let b_data = column_as_f64(df, b).map_err(log_error(Self::ID))?;
        let mut test = Self::new(registry, a_data, b_data, alpha)?;
        test.a_name = a.to_string();
        test.b_name = b.to_string();
        Ok(test)
    }
}

impl StatisticalTest for KsTwoSampleTest {
    type Output = KsTestResult;
    const ID: &'static str = "ks2";

    fn profile(&self) -> &StatTestProfile {
        &self.profile
    }

    fn result(&self) -> Option<&KsTestResult> {
        self.result.as_ref()
    }

    fn run(&mut self) -> Result<&KsTestResult, StatTestError> {
        debug!(
            "[{}] Testing samples of size {} and {}",
            Self::ID,
            self.a.len(),
            self.b.len()
        );
        let outcome = ks_2samp(&self.a, &self.b).map_err(log_error(Self::ID))?;
        let n = self.a.len();
        let general = ks_general(&self.profile, &outcome, n, self.alpha, "the same distribution");
        info!("[{}] {}", Self::ID, general.get_result());

        let result = self.result.insert(KsTestResult {
            general,
            n,
            a: self.a_name.clone(),
            b: self.b_name.clone(),
            data: self.a.clone(),
            reference: KsReference::Sample(self.b.clone()),
            location: outcome.location,
            sign: outcome.sign,
            fitted: None,
            null: KsNullDistribution::two_sample(self.a.len(), self.b.len()),
            distribution: None,
        });
        Ok(result)
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use rand::distributions::Distribution;
    use statrs::distribution::Normal;

    use super::*;
    use crate::data::dataset::read_csv;
    use crate::errors::distribution_error::DistributionError;
    use crate::visual::render_svg;

    fn uniform_grid(n: usize) -> Vec<f64> {
        (0..n).map(|idx| (idx as f64 + 0.5) / n as f64).collect()
    }

    #[test]
    fn test_one_sample_uniform() {
        let registry = ProfileRegistry::default();
        let mut test = KsTest::new(&registry, uniform_grid(100), "uniform", 0.05).unwrap();
        let result = test.run().unwrap();
        assert_eq!(result.n, 100);
        assert_eq!(result.get_decision(), Decision::FailToReject);
        assert!(result.get_result().starts_with("D(100)="));
        assert!(result
            .get_inference()
            .ends_with("The evidence against the data being drawn from the uniform distribution is not significant."));
        assert!(result.get_interpretation().is_none());
        assert!(result.fitted.as_deref().unwrap().starts_with("uniform("));
        assert_eq!(test.profile().id, "ks1");
    }

    #[test]
    fn test_small_sample_note() {
        let registry = ProfileRegistry::default();
        let mut test = KsTest::new(&registry, uniform_grid(20), "normal", 0.05).unwrap();
        let result = test.run().unwrap();
        assert!(result.get_interpretation().unwrap().contains("Shapiro-Wilk"));
    }

    #[test]
    fn test_large_sample_note() {
        assert!(sample_size_note(1001).unwrap().contains("practically insignificant"));
        assert!(sample_size_note(KS_MIN_RECOMMENDED_SAMPLE_SIZE).is_none());
        assert!(sample_size_note(KS_MAX_RECOMMENDED_SAMPLE_SIZE).is_none());
    }

    #[test]
    fn test_unsupported_distribution() {
        let registry = ProfileRegistry::default();
        let mut test = KsTest::new(&registry, uniform_grid(60), "cauchy", 0.05).unwrap();
        assert!(matches!(
            test.run(),
            Err(StatTestError::DistributionError(
                DistributionError::NotImplemented(_)
            ))
        ));
        assert!(test.result().is_none());
    }

    #[test]
    fn test_two_sample_shifted() {
        let registry = ProfileRegistry::default();
        let a = uniform_grid(60);
        let b: Vec<f64> = a.iter().map(|x| x + 0.8).collect();
        let mut test = KsTwoSampleTest::new(&registry, a, b, 0.05).unwrap();
        let result = test.run().unwrap();
        assert!(result.get_decision().is_rejected());
        assert_eq!(result.a, FIRST_SAMPLE_NAME);
        assert_eq!(result.b, SECOND_SAMPLE_NAME);
        assert!(result
            .get_inference()
            .ends_with("The evidence against the data being drawn from the same distribution is significant."));
        assert!(result.fitted.is_none());
    }

    #[test]
    fn test_two_sample_exact_pvalue_drives_decision() {
        let registry = ProfileRegistry::default();
        let a: Vec<f64> = (0..8).map(|x| x as f64).collect();
        let b: Vec<f64> = a.iter().map(|x| x + 4.5).collect();
        let mut test = KsTwoSampleTest::new(&registry, a, b, 0.05).unwrap();
        let result = test.run().unwrap();
        assert_eq!(result.get_value(), 0.625);
        assert!((result.get_pvalue() - 0.087024087).abs() < 1e-8);
        assert_eq!(result.get_decision(), Decision::FailToReject);
        assert_eq!(result.null, KsNullDistribution::TwoSampleExact { n1: 8, n2: 8 });
    }

    #[test]
    fn test_rejection_region_agrees_with_decision() {
        let registry = ProfileRegistry::default();
        let a: Vec<f64> = (0..8).map(|x| x as f64).collect();
        for shift in [0.5, 2.5, 4.5, 5.5, 7.5] {
            let b: Vec<f64> = a.iter().map(|x| x + shift).collect();
            let mut test = KsTwoSampleTest::new(&registry, a.clone(), b, 0.05).unwrap();
            let result = test.run().unwrap();
            let critical = result.null.critical_value(0.05).unwrap();
            assert_eq!(
                result.get_value() > critical,
                result.get_decision().is_rejected(),
                "shift {}",
                shift
            );
            let plot = result.sampling_plot();
            assert_eq!(plot.reject_regions.len(), 1);
            assert_eq!(plot.critical_values[0].x, critical);
        }

        let mut test = KsTest::new(&registry, uniform_grid(40), "normal", 0.05).unwrap();
        let result = test.run().unwrap();
        let critical = result.null.critical_value(0.05).unwrap();
        assert_eq!(
            result.get_value() > critical,
            result.get_decision().is_rejected()
        );
        assert_eq!(result.sampling_plot().critical_values[0].x, critical);
    }

    #[test]
    fn test_bootstrap_rejection_rate_under_null() {
        let registry = ProfileRegistry::default();
        let normal = Normal::new(10.0, 2.0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let repetitions = 200;
        let mut rejected = 0;
        for seed in 0..repetitions {
            let data: Vec<f64> = (0..30).map(|_| normal.sample(&mut rng)).collect();
            let mut test = KsTest::new(&registry, data, "normal", 0.05)
                .unwrap()
                .with_seed(seed);
            if test.run().unwrap().get_decision().is_rejected() {
                rejected += 1;
            }
        }
        let rate = rejected as f64 / repetitions as f64;
        assert!(rate > 0.01 && rate < 0.11, "rejection rate {}", rate);
    }

    #[test]
    fn test_bootstrap_is_reproducible() {
        let registry = ProfileRegistry::default();
        let data: Vec<f64> = (1..=40)
            .map(|idx| (idx as f64 * 0.7).sin() + idx as f64 / 20.0)
            .collect();
        let mut test = KsTest::new(&registry, data.clone(), "normal", 0.05)
            .unwrap()
            .with_mc_samples(50);
        let first = test.run().unwrap().get_pvalue();
        let second = test.run().unwrap().get_pvalue();
        assert_eq!(first, second);
        match &test.result().unwrap().null {
            KsNullDistribution::Bootstrap { statistics } => assert_eq!(statistics.len(), 50),
            other => panic!("unexpected null distribution {:?}", other),
        }
        // p-values of a bootstrap with 50 samples are multiples of 1/51
        assert!(((first * 51.0).round() - first * 51.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_frame() {
        let registry = ProfileRegistry::default();
        let df = read_csv(Path::new("test_files/dataset.csv")).unwrap();
        let mut test = KsTest::from_frame(&registry, &df, "Score", "normal", 0.05).unwrap();
        let result = test.run().unwrap();
        assert_eq!(result.a, "Score");
        assert_eq!(result.n, 120);
        assert!(result.get_value() > 0.0 && result.get_value() < 1.0);

        let mut test = KsTwoSampleTest::from_frame(&registry, &df, "Age", "Score", 0.05).unwrap();
        assert!(test.run().unwrap().get_decision().is_rejected());
    }

    #[test]
    fn test_render_one_sample() {
        let registry = ProfileRegistry::default();
        let mut test = KsTest::new(&registry, uniform_grid(60), "normal", 0.05)
            .unwrap()
            .with_mc_samples(30);
        let result = test.run().unwrap();
        assert_eq!(result.panel_count(), 3);
        let svg = render_svg(result, &Canvas::default()).unwrap();
        assert!(svg.contains("Critical Value"));
        assert!(svg.contains("Theoretical and Empirical Cumulative Distribution Function"));
        assert!(svg.contains("Theoretical and Empirical Probability Density Function"));
    }

    #[test]
    fn test_render_two_sample() {
        let registry = ProfileRegistry::default();
        let a = uniform_grid(30);
        let b: Vec<f64> = a.iter().map(|x| x * 2.0).collect();
        let mut test = KsTwoSampleTest::new(&registry, a, b, 0.05).unwrap();
        let result = test.run().unwrap();
        let svg = render_svg(result, &Canvas::default()).unwrap();
        assert!(svg.contains("Critical Value"));
        assert!(svg.contains("Two Sample Cumulative Distribution Function"));
        assert!(svg.contains("Two Sample Probability Density Function"));
    }
}
