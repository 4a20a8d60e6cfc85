// std imports
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;

// 3rd party imports
use plotters::coord::Shift;
use plotters::prelude::{DrawingArea, DrawingBackend};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, Continuous, ContinuousCDF};
use tracing::{debug, info};

// internal imports
use super::base::{
    decision_sentence, load_test_profile, log_error, report_alpha, report_pvalue, validate_alpha,
    write_row, Decision, StatTestResult, StatisticalTest,
};
use crate::constants::{CHI_SQUARE_SYMBOL, FIRST_SAMPLE_NAME, SECOND_SAMPLE_NAME};
use crate::data::dataset::paired_str_columns;
use crate::errors::plot_error::PlotError;
use crate::errors::stat_test_error::StatTestError;
use crate::profile::{ProfileRegistry, StatTestProfile};
use crate::statistics::chisquare::chi2_contingency;
use crate::visual::canvas::Canvas;
use crate::visual::charts::draw_grouped_bars;
use crate::visual::sampling_plot::SamplingDistributionPlot;
use crate::visual::{panel, Plot};

/// Cross tabulation of two categorical variables
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContingencyTable {
    /// Levels of the first variable
    pub rows: Vec<String>,
    /// Levels of the second variable
    pub columns: Vec<String>,
    /// One vector of counts per row
    pub counts: Vec<Vec<f64>>,
}

impl ContingencyTable {
    /// Counts the co-occurrence of each pair of levels. Levels are sorted lexically.
    ///
    /// # Arguments
    /// * `pairs` - One (a, b) pair per observation
    ///
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut rows: BTreeMap<&str, usize> = BTreeMap::new();
        let mut columns: BTreeMap<&str, usize> = BTreeMap::new();
        for (a, b) in pairs.iter() {
            rows.insert(a, 0);
            columns.insert(b, 0);
        }
        for (idx, value) in rows.values_mut().enumerate() {
            *value = idx;
        }
        for (idx, value) in columns.values_mut().enumerate() {
            *value = idx;
        }
        let mut counts = vec![vec![0.0; columns.len()]; rows.len()];
        for (a, b) in pairs.iter() {
            counts[rows[a.as_str()]][columns[b.as_str()]] += 1.0;
        }
        Self {
            rows: rows.keys().map(|row| row.to_string()).collect(),
            columns: columns.keys().map(|col| col.to_string()).collect(),
            counts,
        }
    }

    /// Table with generic level names
    ///
    pub fn from_counts(counts: Vec<Vec<f64>>) -> Self {
        let ncols = counts.first().map(|row| row.len()).unwrap_or(0);
        Self {
            rows: (0..counts.len()).map(|idx| format!("{}", idx)).collect(),
            columns: (0..ncols).map(|idx| format!("{}", idx)).collect(),
            counts,
        }
    }

    /// Total number of observations
    ///
    pub fn total(&self) -> f64 {
        self.counts.iter().flatten().sum()
    }
}

/// Result of the chi-square test of independence
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareIndependenceResult {
    #[serde(flatten)]
    general: StatTestResult,
    pub dof: usize,
    pub n: f64,
    /// Name of the first variable
    pub a: String,
    /// Name of the second variable
    pub b: String,
    pub observed: ContingencyTable,
    /// Expected frequencies under independence
    pub expected: Vec<Vec<f64>>,
}

impl Deref for ChiSquareIndependenceResult {
    type Target = StatTestResult;

    fn deref(&self) -> &StatTestResult {
        &self.general
    }
}

impl fmt::Display for ChiSquareIndependenceResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.general)?;
        write_row(f, "variables", format!("{} x {}", self.a, self.b))?;
        write_row(f, "dof", self.dof)?;
        write_row(f, "N", self.n)?;
        for (level, counts) in self.observed.rows.iter().zip(self.observed.counts.iter()) {
            write_row(f, level, format!("{:?}", counts))?;
        }
        Ok(())
    }
}

impl ChiSquareIndependenceResult {
    /// Chi-square distribution on the test's degrees of freedom with the upper rejection region
    ///
    pub fn sampling_plot(&self) -> Result<SamplingDistributionPlot, PlotError> {
        let dist = ChiSquared::new(self.dof as f64)?;
        Ok(SamplingDistributionPlot::new(
            self.get_result(),
            CHI_SQUARE_SYMBOL,
            "Probability Density",
            |x| dist.pdf(x),
            dist.inverse_cdf(0.01),
            dist.inverse_cdf(0.999),
            100,
        )
        .with_upper_tail(dist.inverse_cdf(1.0 - self.get_alpha()))
        .locate_statistic(
            self.get_value(),
            &format!("{} = {:.4}", CHI_SQUARE_SYMBOL, self.get_value()),
        ))
    }

    /// Observed and expected frequency per cell in long format
    ///
    pub fn obs_exp_frame(&self) -> Result<DataFrame, PolarsError> {
        let mut cells: Vec<String> = Vec::new();
        let mut observed: Vec<f64> = Vec::new();
        let mut expected: Vec<f64> = Vec::new();
        for (row_idx, row) in self.observed.rows.iter().enumerate() {
            for (col_idx, col) in self.observed.columns.iter().enumerate() {
                cells.push(format!("{} / {}", row, col));
                observed.push(self.observed.counts[row_idx][col_idx]);
                expected.push(self.expected[row_idx][col_idx]);
            }
        }
        df!(
            "Cell" => cells,
            "Observed" => observed,
            "Expected" => expected,
        )
    }

    /// Draws observed next to expected frequencies per cell and returns the plotted frame
    ///
    /// # Arguments
    /// * `canvas` - Visual configuration
    /// * `area` - Drawing area
    ///
    pub fn plot_obs_exp<DB: DrawingBackend>(
        &self,
        canvas: &Canvas,
        area: &DrawingArea<DB, Shift>,
    ) -> Result<DataFrame, PlotError> {
        let frame = self
            .obs_exp_frame()
            .map_err(|err| PlotError::DrawingError("frequency table", err.to_string()))?;
        let cells: Vec<String> = self
            .observed
            .rows
            .iter()
            .flat_map(|row| {
                self.observed
                    .columns
                    .iter()
                    .map(move |col| format!("{} / {}", row, col))
            })
            .collect();
        let observed: Vec<f64> = self.observed.counts.iter().flatten().copied().collect();
        let expected: Vec<f64> = self.expected.iter().flatten().copied().collect();
        draw_grouped_bars(
            canvas,
            area,
            &format!("Observed and Expected Frequencies of {} and {}", self.a, self.b),
            "Frequency",
            &cells,
            &[
                ("Observed", observed.as_slice(), canvas.colors.dark_blue.as_str()),
                ("Expected", expected.as_slice(), canvas.colors.orange.as_str()),
            ],
            canvas.countplot_config.saturation,
            false,
        )?;
        Ok(frame)
    }
}

impl Plot for ChiSquareIndependenceResult {
    fn panel_count(&self) -> usize {
        2
    }

    fn draw_panels<DB: DrawingBackend>(
        &self,
        canvas: &Canvas,
        panels: &[DrawingArea<DB, Shift>],
    ) -> Result<(), PlotError> {
        self.sampling_plot()?.draw(canvas, panel(panels, 0)?)?;
        self.plot_obs_exp(canvas, panel(panels, 1)?)?;
        Ok(())
    }
}

/// Chi-square test of the null hypothesis that two categorical variables are independent.
///
pub struct ChiSquareIndependenceTest {
    profile: StatTestProfile,
    table: ContingencyTable,
    a: String,
    b: String,
    alpha: f64,
    result: Option<ChiSquareIndependenceResult>,
}

impl ChiSquareIndependenceTest {
    /// Creates a new test on a contingency table
    ///
    /// # Arguments
    /// * `registry` - Profile registry
    /// * `table` - Contingency table
    /// * `alpha` - Significance level
    ///
    pub fn new(
        registry: &ProfileRegistry,
        table: ContingencyTable,
        alpha: f64,
    ) -> Result<Self, StatTestError> {
        Ok(Self {
            alpha: validate_alpha(alpha)?,
            profile: load_test_profile(registry, Self::ID)?,
            table,
            a: FIRST_SAMPLE_NAME.to_string(),
            b: SECOND_SAMPLE_NAME.to_string(),
            result: None,
        })
    }

    /// Creates a new test cross tabulating two categorical columns,
    /// rows where either value is missing are dropped.
    ///
    /// # Arguments
    /// * `registry` - Profile registry
    /// * `df` - Data frame
    /// * `a` - First categorical column
    /// * `b` - Second categorical column
    /// * `alpha` - Significance level
    ///
    pub fn from_frame(
        registry: &ProfileRegistry,
        df: &DataFrame,
        a: &str,
        b: &str,
        alpha: f64,
    ) -> Result<Self, StatTestError> {
        let pairs = paired_str_columns(df, a, b).map_err(log_error(Self::ID))?;
        let mut test = Self::new(registry, ContingencyTable::from_pairs(&pairs), alpha)?;
        test.a = a.to_string();
        test.b = b.to_string();
        Ok(test)
    }
}

impl StatisticalTest for ChiSquareIndependenceTest {
    type Output = ChiSquareIndependenceResult;
    const ID: &'static str = "x2ind";

    fn profile(&self) -> &StatTestProfile {
        &self.profile
    }

    fn result(&self) -> Option<&ChiSquareIndependenceResult> {
        self.result.as_ref()
    }

    fn run(&mut self) -> Result<&ChiSquareIndependenceResult, StatTestError> {
        debug!(
            "[{}] Testing {}x{} contingency table",
            Self::ID,
            self.table.rows.len(),
            self.table.columns.len()
        );
        let outcome = chi2_contingency(&self.table.counts, true).map_err(log_error(Self::ID))?;
        let n = self.table.total();
        let alpha = self.alpha;
        let pvalue = outcome.pvalue;

        let report = format!(
            "{}({}, N={})={:.2}, {} {}",
            CHI_SQUARE_SYMBOL,
            outcome.dof,
            n,
            outcome.statistic,
            report_pvalue(pvalue),
            report_alpha(alpha)
        );
        let (a, b) = (&self.a, &self.b);
        let general = StatTestResult::new(
            &self.profile,
            CHI_SQUARE_SYMBOL,
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
                    "{} The evidence against independence of {} and {} {}.",
                    decision_sentence(pvalue, alpha, decision),
                    a,
                    b,
                    evidence
                )
            },
        );
        info!("[{}] {}", Self::ID, general.get_result());

        let result = self.result.insert(ChiSquareIndependenceResult {
            general,
            dof: outcome.dof,
            n,
            a: self.a.clone(),
            b: self.b.clone(),
            observed: self.table.clone(),
            expected: outcome.expected,
        });
        Ok(result)
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use super::*;
    use crate::data::dataset::read_csv;
    use crate::visual::render_svg;

    #[test]
    fn test_from_pairs() {
        let pairs: Vec<(String, String)> = [("b", "y"), ("a", "x"), ("a", "y"), ("a", "x")]
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();
        let table = ContingencyTable::from_pairs(&pairs);
        assert_eq!(table.rows, vec!["a", "b"]);
        assert_eq!(table.columns, vec!["x", "y"]);
        assert_eq!(table.counts, vec![vec![2.0, 1.0], vec![0.0, 1.0]]);
        assert_eq!(table.total(), 4.0);
    }

    #[test]
    fn test_two_by_three_table() {
        let registry = ProfileRegistry::default();
        let counts = vec![vec![10.0, 20.0, 30.0], vec![20.0, 20.0, 20.0]];
        let mut test = ChiSquareIndependenceTest::new(
            &registry,
            ContingencyTable::from_counts(counts.clone()),
            0.05,
        )
        .unwrap();
        let result = test.run().unwrap();
        let outcome = chi2_contingency(&counts, true).unwrap();
        assert_eq!(result.dof, 2);
        assert_eq!(result.n, 120.0);
        assert_eq!(result.get_value(), outcome.statistic);
        assert_eq!(result.get_pvalue(), outcome.pvalue);
        assert_eq!(result.expected, outcome.expected);
        assert!(result.get_result().starts_with("X²(2, N=120)="));
        assert!(result.get_inference().contains(&format!(
            "independence of {} and {}",
            FIRST_SAMPLE_NAME, SECOND_SAMPLE_NAME
        )));
    }

    #[test]
    fn test_yates_correction_on_two_by_two() {
        let registry = ProfileRegistry::default();
        let counts = vec![vec![12.0, 5.0], vec![7.0, 9.0]];
        let mut test = ChiSquareIndependenceTest::new(
            &registry,
            ContingencyTable::from_counts(counts.clone()),
            0.05,
        )
        .unwrap();
        let corrected = chi2_contingency(&counts, true).unwrap();
        let uncorrected = chi2_contingency(&counts, false).unwrap();
        let result = test.run().unwrap();
        assert_eq!(result.get_value(), corrected.statistic);
        assert!(result.get_value() < uncorrected.statistic);
    }

    #[test]
    fn test_from_frame() {
        let registry = ProfileRegistry::default();
        let df = read_csv(Path::new("test_files/dataset.csv")).unwrap();
        let mut test =
            ChiSquareIndependenceTest::from_frame(&registry, &df, "Gender", "Education", 0.05)
                .unwrap();
        let result = test.run().unwrap();
        assert_eq!(result.observed.rows, vec!["Female", "Male"]);
        assert_eq!(
            result.observed.columns,
            vec!["Primary", "Secondary", "Tertiary"]
        );
        assert_eq!(result.n, 120.0);
        assert_eq!(result.dof, 2);
        assert!(result
            .get_inference()
            .contains("independence of Gender and Education"));

        let frame = result.obs_exp_frame().unwrap();
        assert_eq!(frame.height(), 6);
        assert_eq!(
            frame.get_column_names(),
            vec!["Cell", "Observed", "Expected"]
        );
    }

    #[test]
    fn test_missing_column() {
        let registry = ProfileRegistry::default();
        let df = read_csv(Path::new("test_files/dataset.csv")).unwrap();
        assert!(matches!(
            ChiSquareIndependenceTest::from_frame(&registry, &df, "Gender", "Region", 0.05),
            Err(StatTestError::DataError(_))
        ));
    }

    #[test]
    fn test_render() {
        let registry = ProfileRegistry::default();
        let df = read_csv(Path::new("test_files/dataset.csv")).unwrap();
        let mut test =
            ChiSquareIndependenceTest::from_frame(&registry, &df, "Gender", "Education", 0.05)
                .unwrap();
        let result = test.run().unwrap();
        assert_eq!(result.panel_count(), 2);
        let svg = render_svg(result, &Canvas::default()).unwrap();
        assert!(svg.contains("Critical Value"));
        assert!(svg.contains("Observed and Expected Frequencies of Gender and Education"));
        assert!(svg.contains("Expected"));
    }
}
