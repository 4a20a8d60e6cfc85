// std imports
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;

// 3rd party imports
use plotters::coord::Shift;
use plotters::prelude::{DrawingArea, DrawingBackend};
use polars::frame::DataFrame;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, Continuous, ContinuousCDF};
use tracing::{debug, info};

// internal imports
use super::base::{
    decision_sentence, load_test_profile, log_error, report_alpha, report_pvalue, validate_alpha,
    write_row, Decision, StatTestResult, StatisticalTest,
};
use crate::constants::CHI_SQUARE_SYMBOL;
use crate::data::dataset::column_as_str;
use crate::errors::plot_error::PlotError;
use crate::errors::stat_test_error::StatTestError;
use crate::profile::{ProfileRegistry, StatTestProfile};
use crate::statistics::chisquare::chisquare;
use crate::visual::canvas::Canvas;
use crate::visual::sampling_plot::SamplingDistributionPlot;
use crate::visual::{panel, Plot};

/// Expected frequencies of a goodness of fit test
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExpectedFrequencies {
    /// All categories are equally likely
    Equal,
    Given(Vec<f64>),
}

impl fmt::Display for ExpectedFrequencies {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "Equal Frequencies among Groups"),
            Self::Given(expected) => write!(f, "{:?}", expected),
        }
    }
}

/// Result of the chi-square goodness of fit test
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareGofResult {
    #[serde(flatten)]
    general: StatTestResult,
    pub dof: usize,
    /// Total number of observations
    pub n: f64,
    pub observed: Vec<f64>,
    pub expected: ExpectedFrequencies,
    /// Category labels if the frequencies were counted from a column
    pub categories: Option<Vec<String>>,
}

impl Deref for ChiSquareGofResult {
    type Target = StatTestResult;

    fn deref(&self) -> &StatTestResult {
        &self.general
    }
}

impl fmt::Display for ChiSquareGofResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.general)?;
        write_row(f, "dof", self.dof)?;
        write_row(f, "N", self.n)?;
        write_row(f, "observed", format!("{:?}", self.observed))?;
        write_row(f, "expected", &self.expected)?;
        if let Some(categories) = &self.categories {
            write_row(f, "categories", categories.join(", "))?;
        }
        Ok(())
    }
}

impl ChiSquareGofResult {
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
            dist.inverse_cdf(0.99),
            100,
        )
        .with_upper_tail(dist.inverse_cdf(1.0 - self.get_alpha()))
        .locate_statistic(
            self.get_value(),
            &format!("{} = {:.4}", CHI_SQUARE_SYMBOL, self.get_value()),
        ))
    }
}

impl Plot for ChiSquareGofResult {
    fn draw_panels<DB: DrawingBackend>(
        &self,
        canvas: &Canvas,
        panels: &[DrawingArea<DB, Shift>],
    ) -> Result<(), PlotError> {
        self.sampling_plot()?.draw(canvas, panel(panels, 0)?)
    }
}

/// One-way chi-square test of the null hypothesis that categorical data has the given frequencies.
///
pub struct ChiSquareGofTest {
    profile: StatTestProfile,
    observed: Vec<f64>,
    expected: Option<Vec<f64>>,
    categories: Option<Vec<String>>,
    alpha: f64,
    result: Option<ChiSquareGofResult>,
}

impl ChiSquareGofTest {
    /// Creates a new test
    ///
    /// # Arguments
    /// * `registry` - Profile registry
    /// * `observed` - Observed frequencies by category
    /// * `expected` - Expected frequencies by category, categories are equally likely if `None`
    /// * `alpha` - Significance level
    ///
    pub fn new(
        registry: &ProfileRegistry,
        observed: Vec<f64>,
        expected: Option<Vec<f64>>,
        alpha: f64,
    ) -> Result<Self, StatTestError> {
        Ok(Self {
            alpha: validate_alpha(alpha)?,
            profile: load_test_profile(registry, Self::ID)?,
            observed,
            expected,
            categories: None,
            result: None,
        })
    }

    /// Creates a new test on the value counts of a categorical column.
    /// Categories are sorted lexically.
    ///
    /// # Arguments
    /// * `registry` - Profile registry
    /// * `df` - Data frame
    /// * `column` - Categorical column
    /// * `proportions` - Expected proportion per category, scaled to the number of observations. Categories are equally likely if `None`.
    /// * `alpha` - Significance level
    ///
    pub fn from_frame(
        registry: &ProfileRegistry,
        df: &DataFrame,
        column: &str,
        proportions: Option<&BTreeMap<String, f64>>,
        alpha: f64,
    ) -> Result<Self, StatTestError> {
        let mut counts: BTreeMap<String, f64> = BTreeMap::new();
        for value in column_as_str(df, column).map_err(log_error(Self::ID))? {
            *counts.entry(value).or_default() += 1.0;
        }
        let n: f64 = counts.values().sum();
        let expected = proportions.map(|proportions| {
            let total: f64 = counts
                .keys()
                .map(|category| proportions.get(category).copied().unwrap_or(0.0))
                .sum();
            counts
                .keys()
                .map(|category| proportions.get(category).copied().unwrap_or(0.0) / total * n)
                .collect()
        });
        let mut test = Self::new(registry, counts.values().copied().collect(), expected, alpha)?;
        test.categories = Some(counts.into_keys().collect());
        Ok(test)
    }
}

impl StatisticalTest for ChiSquareGofTest {
    type Output = ChiSquareGofResult;
    const ID: &'static str = "x2gof";

    fn profile(&self) -> &StatTestProfile {
        &self.profile
    }

    fn result(&self) -> Option<&ChiSquareGofResult> {
        self.result.as_ref()
    }

    fn run(&mut self) -> Result<&ChiSquareGofResult, StatTestError> {
        debug!("[{}] Testing {} categories", Self::ID, self.observed.len());
        let (statistic, pvalue) =
            chisquare(&self.observed, self.expected.as_deref()).map_err(log_error(Self::ID))?;
        let dof = self.observed.len() - 1;
        let n: f64 = self.observed.iter().sum();
        let alpha = self.alpha;

        let report = format!(
            "{}({}, N={})={:.2}, {} {}",
            CHI_SQUARE_SYMBOL,
            dof,
            n,
            statistic,
            report_pvalue(pvalue),
            report_alpha(alpha)
        );
        let general = StatTestResult::new(
            &self.profile,
            CHI_SQUARE_SYMBOL,
            statistic,
            pvalue,
            alpha,
            report,
            |decision| {
                let evidence = match decision {
                    Decision::FailToReject => "was not significant",
                    Decision::Reject => "is significant",
                };
                format!(
                    "{} The evidence against a common distribution {}.",
                    decision_sentence(pvalue, alpha, decision),
                    evidence
                )
            },
        );
        info!("[{}] {}", Self::ID, general.get_result());

        let result = self.result.insert(ChiSquareGofResult {
            general,
            dof,
            n,
            observed: self.observed.clone(),
            expected: match &self.expected {
                Some(expected) => ExpectedFrequencies::Given(expected.clone()),
                None => ExpectedFrequencies::Equal,
            },
            categories: self.categories.clone(),
        });
        Ok(result)
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use super::*;
    use crate::data::dataset::read_csv;
    use crate::errors::statistics_error::StatisticsError;
    use crate::visual::render_svg;

    #[test]
    fn test_equal_frequencies() {
        let registry = ProfileRegistry::default();
        let observed = vec![10.0, 20.0, 30.0, 40.0];
        let mut test = ChiSquareGofTest::new(&registry, observed.clone(), None, 0.05).unwrap();
        assert!(test.result().is_none());
        let result = test.run().unwrap().clone();

        let (statistic, pvalue) = chisquare(&observed, None).unwrap();
        assert_eq!(result.dof, 3);
        assert_eq!(result.get_value(), statistic);
        assert_eq!(result.get_pvalue(), pvalue);
        assert_eq!(result.expected, ExpectedFrequencies::Equal);
        assert_eq!(result.get_statistic(), CHI_SQUARE_SYMBOL);
        assert_eq!(result.get_result(), "X²(3, N=100)=20.00, p<.001 significant at 5%.");
        assert!(result
            .get_inference()
            .ends_with("The evidence against a common distribution is significant."));
        assert_eq!(test.profile().id, "x2gof");
    }

    #[test]
    fn test_run_is_idempotent() {
        let registry = ProfileRegistry::default();
        let mut test =
            ChiSquareGofTest::new(&registry, vec![16.0, 18.0, 16.0, 14.0, 12.0, 12.0], None, 0.05)
                .unwrap();
        let first = test.run().unwrap().clone();
        let second = test.run().unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(first.get_decision(), Decision::FailToReject);
        assert!(first.get_inference().contains("is greater than level of significance 5%"));
    }

    #[test]
    fn test_expected_frequencies_mismatch() {
        let registry = ProfileRegistry::default();
        let mut test =
            ChiSquareGofTest::new(&registry, vec![10.0, 20.0], Some(vec![10.0, 10.0]), 0.05)
                .unwrap();
        assert!(matches!(
            test.run(),
            Err(StatTestError::StatisticsError(
                StatisticsError::FrequencySumMismatch(_, _)
            ))
        ));
        assert!(test.result().is_none());
    }

    #[test]
    fn test_invalid_alpha() {
        let registry = ProfileRegistry::default();
        assert!(matches!(
            ChiSquareGofTest::new(&registry, vec![1.0, 2.0], None, 1.5),
            Err(StatTestError::InvalidAlpha(_))
        ));
    }

    #[test]
    fn test_from_frame() {
        let registry = ProfileRegistry::default();
        let df = read_csv(Path::new("test_files/dataset.csv")).unwrap();
        let proportions = BTreeMap::from([
            ("Primary".to_string(), 1.0),
            ("Secondary".to_string(), 2.0),
            ("Tertiary".to_string(), 1.0),
        ]);
        let mut test =
            ChiSquareGofTest::from_frame(&registry, &df, "Education", Some(&proportions), 0.05)
                .unwrap();
        let result = test.run().unwrap();
        assert_eq!(result.n, 120.0);
        assert_eq!(
            result.categories,
            Some(vec![
                "Primary".to_string(),
                "Secondary".to_string(),
                "Tertiary".to_string()
            ])
        );
        assert_eq!(
            result.expected,
            ExpectedFrequencies::Given(vec![30.0, 60.0, 30.0])
        );
        assert_eq!(result.dof, 2);
    }

    #[test]
    fn test_plot_statistic_beyond_domain() {
        let registry = ProfileRegistry::default();
        let mut test =
            ChiSquareGofTest::new(&registry, vec![1000.0, 1.0, 1.0, 1.0], None, 0.05).unwrap();
        let plot = test.run().unwrap().sampling_plot().unwrap();
        assert!(plot.observed.is_none());
        assert_eq!(plot.critical_values.len(), 1);
        assert!(!plot.reject_regions[0].is_empty());

        // the figure is still drawn, only the marker of the statistic is missing
        let svg = render_svg(test.result().unwrap(), &Canvas::default()).unwrap();
        assert!(svg.contains("Critical Value"));
        assert!(!svg.contains("X² = "));
    }

    #[test]
    fn test_render() {
        let registry = ProfileRegistry::default();
        let mut test =
            ChiSquareGofTest::new(&registry, vec![18.0, 22.0, 20.0], None, 0.05).unwrap();
        let result = test.run().unwrap();
        assert!(result.sampling_plot().unwrap().observed.is_some());
        let svg = render_svg(result, &Canvas::default()).unwrap();
        assert!(svg.contains("Critical Value"));
    }
}
