// std imports
use std::fmt;
use std::ops::Deref;

// 3rd party imports
use plotters::coord::Shift;
use plotters::prelude::{DrawingArea, DrawingBackend};
use polars::frame::DataFrame;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, ContinuousCDF, StudentsT};
use tracing::{debug, info};

// internal imports
use super::base::{
    alpha_percent, load_test_profile, log_error, report_pvalue, validate_alpha, write_row,
    Decision, StatTestResult, StatisticalTest,
};
use crate::constants::{FIRST_SAMPLE_NAME, SECOND_SAMPLE_NAME};
use crate::data::dataset::paired_columns;
use crate::errors::plot_error::PlotError;
use crate::errors::stat_test_error::StatTestError;
use crate::profile::{ProfileRegistry, StatTestProfile};
use crate::statistics::correlation::{correlation_t_statistic, pearsonr, spearmanr};
use crate::visual::canvas::Canvas;
use crate::visual::charts::draw_regression;
use crate::visual::sampling_plot::SamplingDistributionPlot;
use crate::visual::{panel, Plot};

/// Correlation coefficient
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrelationMethod {
    Pearson,
    Spearman,
}

impl CorrelationMethod {
    /// Symbol of the coefficient
    ///
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Pearson => "r",
            Self::Spearman => "rs",
        }
    }
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Pearson => write!(f, "Pearson"),
            Self::Spearman => write!(f, "Spearman"),
        }
    }
}

/// Strength and direction of a correlation coefficient
///
/// # Arguments
/// * `r` - Correlation coefficient
///
pub fn interpret_r(r: f64) -> String {
    let direction = if r < 0.0 { "negative" } else { "positive" };
    let strength = match r.abs() {
        abs if abs >= 0.9 => "very high",
        abs if abs >= 0.7 => "high",
        abs if abs >= 0.5 => "moderate",
        abs if abs >= 0.3 => "low",
        _ => return "negligible correlation".to_string(),
    };
    format!("{} {} correlation", strength, direction)
}

/// Result of a correlation test
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    #[serde(flatten)]
    general: StatTestResult,
    pub method: CorrelationMethod,
    pub dof: usize,
    /// Name of the first variable
    pub a: String,
    /// Name of the second variable
    pub b: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Deref for CorrelationResult {
    type Target = StatTestResult;

    fn deref(&self) -> &StatTestResult {
        &self.general
    }
}

impl fmt::Display for CorrelationResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.general)?;
        write_row(f, "method", self.method)?;
        write_row(f, "variables", format!("{} x {}", self.a, self.b))?;
        write_row(f, "dof", self.dof)
    }
}

impl CorrelationResult {
    /// Student's t distribution of the t-transformed coefficient with both rejection regions
    ///
    pub fn sampling_plot(&self) -> Result<SamplingDistributionPlot, PlotError> {
        let dist = StudentsT::new(0.0, 1.0, self.dof as f64)?;
        let alpha = self.get_alpha();
        let t = correlation_t_statistic(self.get_value(), self.x.len());
        Ok(SamplingDistributionPlot::new(
            &format!("{} Correlation Coefficient", self.method),
            "t",
            "Probability Density",
            |x| dist.pdf(x),
            dist.inverse_cdf(0.001),
            dist.inverse_cdf(0.999),
            500,
        )
        .with_lower_tail(dist.inverse_cdf(alpha / 2.0))
        .with_upper_tail(dist.inverse_cdf(1.0 - alpha / 2.0))
        .locate_statistic(t, &format!("t = {:.4}", t)))
    }
}

impl Plot for CorrelationResult {
    /// Two pairs leave no degrees of freedom for the sampling distribution
    ///
    fn panel_count(&self) -> usize {
        if self.dof > 0 {
            2
        } else {
            1
        }
    }

    fn draw_panels<DB: DrawingBackend>(
        &self,
        canvas: &Canvas,
        panels: &[DrawingArea<DB, Shift>],
    ) -> Result<(), PlotError> {
        draw_regression(
            canvas,
            panel(panels, 0)?,
            self.get_result(),
            (self.a.as_str(), self.b.as_str()),
            &self.x,
            &self.y,
        )?;
        if self.dof == 0 {
            return Ok(());
        }
        self.sampling_plot()?.draw(canvas, panel(panels, 1)?)
    }
}

/// Paired samples shared by both correlation tests
///
struct CorrelationInput {
    x: Vec<f64>,
    y: Vec<f64>,
    a: String,
    b: String,
    alpha: f64,
}

impl CorrelationInput {
    fn new(x: Vec<f64>, y: Vec<f64>, alpha: f64) -> Result<Self, StatTestError> {
        Ok(Self {
            x,
            y,
            a: FIRST_SAMPLE_NAME.to_string(),
            b: SECOND_SAMPLE_NAME.to_string(),
            alpha: validate_alpha(alpha)?,
        })
    }

    fn from_frame(
        id: &'static str,
        df: &DataFrame,
        a: &str,
        b: &str,
        alpha: f64,
    ) -> Result<Self, StatTestError> {
        let (x, y) = paired_columns(df, a, b).map_err(log_error(id))?;
        let mut input = Self::new(x, y, alpha)?;
        input.a = a.to_string();
        input.b = b.to_string();
        Ok(input)
    }

    /// Computes the coefficient and builds the result
    ///
    /// # Arguments
    /// * `id` - Test id used in logs
    /// * `profile` - Test profile
    /// * `method` - Correlation coefficient
    ///
    fn evaluate(
        &self,
        id: &'static str,
        profile: &StatTestProfile,
        method: CorrelationMethod,
    ) -> Result<CorrelationResult, StatTestError> {
        debug!("[{}] Correlating {} pairs", id, self.x.len());
        let coefficient = match method {
            CorrelationMethod::Pearson => pearsonr(&self.x, &self.y),
            CorrelationMethod::Spearman => spearmanr(&self.x, &self.y),
        };
        let (r, pvalue) = coefficient.map_err(log_error(id))?;
        let dof = self.x.len() - 2;
        let alpha = self.alpha;
        let symbol = method.symbol();
        let interpretation = interpret_r(r);

        let report = format!(
            "{} Correlation Test\n{}({})={:.2}, {}\n{}",
            method,
            symbol,
            dof,
            r,
            report_pvalue(pvalue),
            capitalize(&interpretation)
        );
        let general = StatTestResult::new(profile, symbol, r, pvalue, alpha, report, |decision| {
            let significance = match decision {
                Decision::FailToReject => format!(
                    "However, the pvalue, {:.2} is greater than level of significance {}% indicating that the correlation coefficient is not statistically significant.",
                    pvalue,
                    alpha_percent(alpha)
                ),
                Decision::Reject => format!(
                    "Further, the pvalue, {:.2} is lower than level of significance {}% indicating that the correlation coefficient is statistically significant.",
                    pvalue,
                    alpha_percent(alpha)
                ),
            };
            format!(
                "The two variables had a {}, {}({})={:.2}, {}.\n{}",
                interpretation,
                symbol,
                dof,
                r,
                report_pvalue(pvalue),
                significance
            )
        });
        info!("[{}] {}", id, general.get_result().replace('\n', "; "));

        Ok(CorrelationResult {
            general,
            method,
            dof,
            a: self.a.clone(),
            b: self.b.clone(),
            x: self.x.clone(),
            y: self.y.clone(),
        })
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Pearson correlation test of the null hypothesis that two variables are uncorrelated.
///
pub struct PearsonCorrelationTest {
    profile: StatTestProfile,
    input: CorrelationInput,
    result: Option<CorrelationResult>,
}

impl PearsonCorrelationTest {
    /// Creates a new test
    ///
    /// # Arguments
    /// * `registry` - Profile registry
    /// * `x` - First sample
    /// * `y` - Second sample, same length as `x`
    /// * `alpha` - Significance level
    ///
    pub fn new(
        registry: &ProfileRegistry,
        x: Vec<f64>,
        y: Vec<f64>,
        alpha: f64,
    ) -> Result<Self, StatTestError> {
        Ok(Self {
            input: CorrelationInput::new(x, y, alpha)?,
            profile: load_test_profile(registry, Self::ID)?,
            result: None,
        })
    }

    /// Creates a new test on two numeric columns, rows where either value is missing are dropped.
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
        Ok(Self {
            input: CorrelationInput::from_frame(Self::ID, df, a, b, alpha)?,
            profile: load_test_profile(registry, Self::ID)?,
            result: None,
        })
    }
}

impl StatisticalTest for PearsonCorrelationTest {
    type Output = CorrelationResult;
    const ID: &'static str = "pearson";

    fn profile(&self) -> &StatTestProfile {
        &self.profile
    }

    fn result(&self) -> Option<&CorrelationResult> {
        self.result.as_ref()
    }

    fn run(&mut self) -> Result<&CorrelationResult, StatTestError> {
        let result = self
            .input
            .evaluate(Self::ID, &self.profile, CorrelationMethod::Pearson)?;
        Ok(self.result.insert(result))
    }
}

/// Spearman rank correlation test of the null hypothesis that two variables
/// are not monotonically related.
///
pub struct SpearmanCorrelationTest {
    profile: StatTestProfile,
    input: CorrelationInput,
    result: Option<CorrelationResult>,
}

impl SpearmanCorrelationTest {
    /// Creates a new test
    ///
    /// # Arguments
    /// * `registry` - Profile registry
    /// * `x` - First sample
    /// * `y` - Second sample, same length as `x`
    /// * `alpha` - Significance level
    ///
    pub fn new(
        registry: &ProfileRegistry,
        x: Vec<f64>,
        y: Vec<f64>,
        alpha: f64,
    ) -> Result<Self, StatTestError> {
        Ok(Self {
            input: CorrelationInput::new(x, y, alpha)?,
            profile: load_test_profile(registry, Self::ID)?,
            result: None,
        })
    }

    pub fn from_frame(
        registry: &ProfileRegistry,
        df: &DataFrame,
        a: &str,
        b: &str,
        alpha: f64,
    ) -> Result<Self, StatTestError> {
        Ok(Self {
            input: CorrelationInput::from_frame(Self::ID, df, a, b, alpha)?,
            profile: load_test_profile(registry, Self::ID)?,
            result: None,
        })
    }
}

impl StatisticalTest for SpearmanCorrelationTest {
    type Output = CorrelationResult;
    const ID: &'static str = "spearman";

    fn profile(&self) -> &StatTestProfile {
        &self.profile
    }

    fn result(&self) -> Option<&CorrelationResult> {
        self.result.as_ref()
    }

    fn run(&mut self) -> Result<&CorrelationResult, StatTestError> {
        let result = self
            .input
            .evaluate(Self::ID, &self.profile, CorrelationMethod::Spearman)?;
        Ok(self.result.insert(result))
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;


    use super::*;
    use crate::data::dataset::read_csv;
    use crate::visual::render_svg;
    use crate::errors::statistics_error::StatisticsError;

    #[test]
    fn test_interpret_r() {
        assert_eq!(interpret_r(0.95), "very high positive correlation");
        assert_eq!(interpret_r(-0.75), "high negative correlation");
        assert_eq!(interpret_r(0.5), "moderate positive correlation");
        assert_eq!(interpret_r(-0.3), "low negative correlation");
        assert_eq!(interpret_r(0.1), "negligible correlation");
        assert_eq!(interpret_r(-0.29), "negligible correlation");
    }

    #[test]
    fn test_perfect_pearson_correlation() {
        let registry = ProfileRegistry::default();
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![2.0, 4.0, 6.0, 8.0, 10.0];
        let mut test = PearsonCorrelationTest::new(&registry, x, y, 0.05).unwrap();
        let result = test.run().unwrap().clone();
        assert!((result.get_value() - 1.0).abs() < 1e-12);
        assert_eq!(result.dof, 3);
        assert_eq!(result.method, CorrelationMethod::Pearson);
        assert!(result.get_decision().is_rejected());
        assert!(result
            .get_inference()
            .starts_with("The two variables had a very high positive correlation, r(3)=1.00, p<.001."));
        assert!(result.get_inference().contains("is statistically significant."));
        assert_eq!(
            result.get_result(),
            "Pearson Correlation Test\nr(3)=1.00, p<.001\nVery high positive correlation"
        );

        // t-transformed coefficient is infinite
        let plot = result.sampling_plot().unwrap();
        assert!(plot.observed.is_none());
        assert_eq!(plot.critical_values.len(), 2);
    }

    #[test]
    fn test_two_pairs() {
        let registry = ProfileRegistry::default();
        let mut test =
            PearsonCorrelationTest::new(&registry, vec![1.0, 2.0], vec![3.0, 1.0], 0.05).unwrap();
        let result = test.run().unwrap();
        assert!((result.get_value() + 1.0).abs() < 1e-12);
        assert_eq!(result.get_pvalue(), 1.0);
        assert_eq!(result.dof, 0);
        assert_eq!(result.get_decision(), Decision::FailToReject);
        assert_eq!(result.panel_count(), 1);

        assert!(render_svg(result, &Canvas::default()).unwrap().contains("<svg"));

        let mut test =
            PearsonCorrelationTest::new(&registry, vec![1.0], vec![3.0], 0.05).unwrap();
        assert!(matches!(
            test.run(),
            Err(StatTestError::StatisticsError(
                StatisticsError::TooFewObservations(2, 1)
            ))
        ));
    }

    #[test]
    fn test_render() {
        let registry = ProfileRegistry::default();
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let y = vec![10.0, 9.0, 2.5, 6.0, 4.0, 3.0, 2.0];
        let mut pearson =
            PearsonCorrelationTest::new(&registry, x.clone(), y.clone(), 0.05).unwrap();
        let mut spearman = SpearmanCorrelationTest::new(&registry, x, y, 0.05).unwrap();
        for result in [pearson.run().unwrap().clone(), spearman.run().unwrap().clone()] {
            let svg = render_svg(&result, &Canvas::default()).unwrap();
            assert!(svg.contains(&format!("{} Correlation Coefficient", result.method)));
        }
    }

    #[test]
    fn test_spearman_report() {
        let registry = ProfileRegistry::default();
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let y = vec![10.0, 9.0, 2.5, 6.0, 4.0, 3.0, 2.0];
        let mut test = SpearmanCorrelationTest::new(&registry, x.clone(), y.clone(), 0.05).unwrap();
        let result = test.run().unwrap();
        let (rs, pvalue) = spearmanr(&x, &y).unwrap();
        assert_eq!(result.get_value(), rs);
        assert_eq!(result.get_pvalue(), pvalue);
        assert_eq!(result.get_statistic(), "rs");
        assert!(result.get_result().starts_with("Spearman Correlation Test\nrs(5)="));
        assert!(result.get_inference().contains("negative correlation"));
    }

    #[test]
    fn test_not_significant() {
        let registry = ProfileRegistry::default();
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = vec![3.0, 1.0, 4.0, 1.0, 5.0, 2.0];
        let mut test = PearsonCorrelationTest::new(&registry, x, y, 0.05).unwrap();
        let result = test.run().unwrap();
        assert_eq!(result.get_decision(), Decision::FailToReject);
        assert!(result
            .get_inference()
            .contains("is not statistically significant."));
    }

    #[test]
    fn test_length_mismatch() {
        let registry = ProfileRegistry::default();
        let mut test =
            PearsonCorrelationTest::new(&registry, vec![1.0, 2.0, 3.0], vec![1.0, 2.0], 0.05)
                .unwrap();
        assert!(matches!(
            test.run(),
            Err(StatTestError::StatisticsError(
                StatisticsError::LengthMismatch(3, 2)
            ))
        ));
    }

    #[test]
    fn test_from_frame() {
        let registry = ProfileRegistry::default();
        let df = read_csv(Path::new("test_files/dataset.csv")).unwrap();
        let mut test = PearsonCorrelationTest::from_frame(&registry, &df, "Age", "Income", 0.05)
            .unwrap();
        let result = test.run().unwrap();
        assert_eq!(result.a, "Age");
        assert_eq!(result.b, "Income");
        assert_eq!(result.dof, 118);
        assert!(result.get_value().abs() <= 1.0);
        assert!(result.sampling_plot().is_ok());
    }
}
