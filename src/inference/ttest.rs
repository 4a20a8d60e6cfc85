// std imports
use std::fmt;
use std::ops::Deref;

// 3rd party imports
use plotters::coord::Shift;
use plotters::prelude::{DrawingArea, DrawingBackend};
use polars::frame::DataFrame;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, ContinuousCDF, StudentsT};
use tracing::{debug, error, info};

// internal imports
use super::base::{
    decision_sentence, load_test_profile, log_error, report_alpha, report_pvalue, validate_alpha,
    write_row, Decision, StatTestResult, StatisticalTest,
};
use crate::constants::{FIRST_SAMPLE_NAME, SECOND_SAMPLE_NAME};
use crate::data::dataset::{column_as_f64, grouped_column};
use crate::data::descriptive::QuantStats;
use crate::errors::data_error::DataError;
use crate::errors::plot_error::PlotError;
use crate::errors::stat_test_error::StatTestError;
use crate::profile::{ProfileRegistry, StatTestProfile};
use crate::statistics::ttest::ttest_ind;
use crate::visual::canvas::Canvas;
use crate::visual::sampling_plot::SamplingDistributionPlot;
use crate::visual::{panel, Plot};

/// Result of the independent samples t test
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TTestResult {
    #[serde(flatten)]
    general: StatTestResult,
    /// Signed statistic, negative when the mean of x is below the mean of y.
    /// The general record holds its magnitude.
    pub t: f64,
    /// `n1 + n2 - 2`
    pub dof: usize,
    /// Degrees of freedom of the distribution the p-value was taken from
    pub reference_dof: f64,
    /// Equal population variances assumed
    pub homoscedastic: bool,
    /// Name of the first sample
    pub x: String,
    /// Name of the second sample
    pub y: String,
    pub x_stats: QuantStats,
    pub y_stats: QuantStats,
}

impl Deref for TTestResult {
    type Target = StatTestResult;

    fn deref(&self) -> &StatTestResult {
        &self.general
    }
}

impl fmt::Display for TTestResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.general)?;
        write_row(f, "t", self.t)?;
        write_row(f, "dof", self.dof)?;
        write_row(f, "homoscedastic", self.homoscedastic)?;
        write_row(f, "x", &self.x)?;
        write!(f, "{}", self.x_stats)?;
        write_row(f, "y", &self.y)?;
        write!(f, "{}", self.y_stats)
    }
}

impl TTestResult {
    /// Student's t distribution with both rejection regions at `alpha / 2` and `|t|` located
    ///
    pub fn sampling_plot(&self) -> Result<SamplingDistributionPlot, PlotError> {
        let dist = StudentsT::new(0.0, 1.0, self.reference_dof)?;
        let alpha = self.get_alpha();
        let t = self.get_value();
        Ok(SamplingDistributionPlot::new(
            &self.get_result().replace('\n', "; "),
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

impl Plot for TTestResult {
    fn draw_panels<DB: DrawingBackend>(
        &self,
        canvas: &Canvas,
        panels: &[DrawingArea<DB, Shift>],
    ) -> Result<(), PlotError> {
        self.sampling_plot()?.draw(canvas, panel(panels, 0)?)
    }
}

/// Two-sided t test of the null hypothesis that two independent samples have identical means.
/// Welch's test is used unless equal variances are assumed.
///
pub struct TTest {
    profile: StatTestProfile,
    x: Vec<f64>,
    y: Vec<f64>,
    x_name: String,
    y_name: String,
    alpha: f64,
    homoscedastic: bool,
    result: Option<TTestResult>,
}

impl TTest {
    /// Creates a new test
    ///
    /// # Arguments
    /// * `registry` - Profile registry
    /// * `x` - First sample
    /// * `y` - Second sample
    /// * `alpha` - Significance level
    /// * `homoscedastic` - Assume equal population variances
    ///
    pub fn new(
        registry: &ProfileRegistry,
        x: Vec<f64>,
        y: Vec<f64>,
        alpha: f64,
        homoscedastic: bool,
    ) -> Result<Self, StatTestError> {
        Ok(Self {
            alpha: validate_alpha(alpha)?,
            profile: load_test_profile(registry, Self::ID)?,
            x,
            y,
            x_name: FIRST_SAMPLE_NAME.to_string(),
            y_name: SECOND_SAMPLE_NAME.to_string(),
            homoscedastic,
            result: None,
        })
    }

    /// Creates a new test on two numeric columns, nulls are dropped per column.
    ///
    /// # Arguments
    /// * `registry` - Profile registry
    /// * `df` - Data frame
    /// * `x` - First numeric column
    /// * `y` - Second numeric column
    /// * `alpha` - Significance level
    /// * `homoscedastic` - Assume equal population variances
    ///
    pub fn from_frame(
        registry: &ProfileRegistry,
        df: &DataFrame,
        x: &str,
        y: &str,
        alpha: f64,
        homoscedastic: bool,
    ) -> Result<Self, StatTestError> {
        let x_data = column_as_f64(df, x).map_err(log_error(Self::ID))?;
        let y_data = column_as_f64(df, y).map_err(log_error(Self::ID))?;
        let mut test = Self::new(registry, x_data, y_data, alpha, homoscedastic)?;
        test.x_name = x.to_string();
        test.y_name = y.to_string();
        Ok(test)
    }

    /// Creates a new test comparing a numeric column between the two levels of a categorical column.
    /// Levels are sorted lexically, the first level becomes `x`.
    ///
    /// # Arguments
    /// * `registry` - Profile registry
    /// * `df` - Data frame
    /// * `value` - Numeric column
    /// * `group` - Categorical column with exactly two levels
    /// * `alpha` - Significance level
    /// * `homoscedastic` - Assume equal population variances
    ///
    pub fn from_groups(
        registry: &ProfileRegistry,
        df: &DataFrame,
        value: &str,
        group: &str,
        alpha: f64,
        homoscedastic: bool,
    ) -> Result<Self, StatTestError> {
        let mut groups = grouped_column(df, value, group).map_err(log_error(Self::ID))?;
        if groups.len() != 2 {
            error!(
                "[{}] Column `{}` has {} levels, two are required",
                Self::ID,
                group,
                groups.len()
            );
            return Err(DataError::GroupCountMismatch(group.to_string(), groups.len()).into());
        }
        let (y_name, y_data) = groups.remove(1);
        let (x_name, x_data) = groups.remove(0);
        let mut test = Self::new(registry, x_data, y_data, alpha, homoscedastic)?;
        test.x_name = x_name;
        test.y_name = y_name;
        Ok(test)
    }
}

impl StatisticalTest for TTest {
    type Output = TTestResult;
    const ID: &'static str = "t2";

    fn profile(&self) -> &StatTestProfile {
        &self.profile
    }

    fn result(&self) -> Option<&TTestResult> {
        self.result.as_ref()
    }

    fn run(&mut self) -> Result<&TTestResult, StatTestError> {
        debug!(
            "[{}] Comparing {} and {}, homoscedastic: {}",
            Self::ID,
            self.x_name,
            self.y_name,
            self.homoscedastic
        );
        let outcome =
            ttest_ind(&self.x, &self.y, self.homoscedastic).map_err(log_error(Self::ID))?;
        let x_stats = QuantStats::compute(&self.x).map_err(log_error(Self::ID))?;
        let y_stats = QuantStats::compute(&self.y).map_err(log_error(Self::ID))?;
        let dof = x_stats.count + y_stats.count - 2;
        let alpha = self.alpha;
        let pvalue = outcome.pvalue;

        let report = format!(
            "Independent Samples t Test\nX: (N = {}, M = {:.2}, SD = {:.2})\nY: (N = {}, M = {:.2}, SD = {:.2})\nt({}) = {:.2}, {} {}",
            x_stats.count,
            x_stats.mean,
            x_stats.std,
            y_stats.count,
            y_stats.mean,
            y_stats.std,
            dof,
            outcome.statistic,
            report_pvalue(pvalue),
            report_alpha(alpha)
        );
        let general = StatTestResult::new(
            &self.profile,
            "t",
            outcome.statistic.abs(),
            pvalue,
            alpha,
            report,
            |decision| {
                let evidence = match decision {
                    Decision::FailToReject => "is not significant",
                    Decision::Reject => "is significant",
                };
                format!(
                    "{} The evidence against identical centers for x and y {}.",
                    decision_sentence(pvalue, alpha, decision),
                    evidence
                )
            },
        );
        info!("[{}] t({}) = {:.2}, {}", Self::ID, dof, outcome.statistic, report_pvalue(pvalue));

        let result = self.result.insert(TTestResult {
            general,
            t: outcome.statistic,
            dof,
            reference_dof: outcome.dof,
            homoscedastic: self.homoscedastic,
            x: self.x_name.clone(),
            y: self.y_name.clone(),
            x_stats,
            y_stats,
        });
        Ok(result)
    }
}
