// std imports
use std::collections::BTreeMap;

// 3rd party imports
use polars::prelude::DataFrame;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

// internal imports
use super::plots::{CountPlot, GroupPlot, GroupPlotKind, QqPlot};
use super::{log_error, AnalysisTestResult, CategoricalSummary, FrequencyTable};
use crate::constants::{DEFAULT_MC_SAMPLES, DEFAULT_MC_SEED, SHAPIRO_MAX_OBSERVATIONS};
use crate::data::dataset::{column_as_f64, column_as_str};
use crate::data::descriptive::{quantile, QuantStats};
use crate::data::generation::{FittedDistribution, RvsDistribution};
use crate::errors::analysis_error::AnalysisError;
use crate::inference::kstest::bootstrap_null;
use crate::statistics::chisquare::chisquare;
use crate::statistics::kstest::ks_statistic;
use crate::statistics::normality::{normaltest, shapiro};
use crate::statistics::{linspace, sorted};

/// Label of the observed data in comparison plots
///
const SAMPLE_LABEL: &str = "Sample";

/// Label of the random variates in comparison plots
///
const THEORETICAL_LABEL: &str = "Theoretical";

/// `normal` -> `Normal`
///
fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Analysis of a single categorical variable
///
pub struct QualitativeOne<'a> {
    df: &'a DataFrame,
}

impl<'a> QualitativeOne<'a> {
    const ID: &'static str = "QualitativeOne";

    pub fn new(df: &'a DataFrame) -> Self {
        Self { df }
    }

    fn values(&self, name: &str) -> Result<Vec<String>, AnalysisError> {
        column_as_str(self.df, name).map_err(log_error(Self::ID))
    }

    /// Count, number of levels and most frequent level
    ///
    /// # Arguments
    /// * `name` - Column name
    ///
    pub fn describe(&self, name: &str) -> Result<CategoricalSummary, AnalysisError> {
        CategoricalSummary::compute(&self.values(name)?).map_err(log_error(Self::ID))
    }

    /// Count, percentage and cumulative percentage of each level
    ///
    /// # Arguments
    /// * `name` - Column name
    ///
    pub fn frequency(&self, name: &str) -> Result<FrequencyTable, AnalysisError> {
        Ok(FrequencyTable::from_values(&self.values(name)?))
    }

    /// Chi-square goodness of fit of the level counts against uniform or expected frequencies
    ///
    /// # Arguments
    /// * `name` - Column name
    /// * `expected` - Expected frequency per level, must name exactly the observed levels
    ///
    pub fn test_distribution(
        &self,
        name: &str,
        expected: Option<&BTreeMap<String, f64>>,
    ) -> Result<AnalysisTestResult, AnalysisError> {
        let mut observed: BTreeMap<String, f64> = BTreeMap::new();
        for value in self.values(name)? {
            *observed.entry(value).or_default() += 1.0;
        }
        let counts: Vec<f64> = observed.values().copied().collect();
        let (statistic, pvalue) = match expected {
            Some(expected) => {
                if !observed.keys().eq(expected.keys()) {
                    return Err(log_error(Self::ID)(AnalysisError::CategoryMismatch(
                        observed.keys().cloned().collect(),
                        expected.keys().cloned().collect(),
                    )));
                }
                let expected: Vec<f64> = expected.values().copied().collect();
                chisquare(&counts, Some(expected.as_slice()))
            }
            None => chisquare(&counts, None),
        }
        .map_err(log_error(Self::ID))?;
        info!("[{}] Chi-square of `{}`: {} (p={})", Self::ID, name, statistic, pvalue);
        Ok(AnalysisTestResult {
            analyzer: Self::ID.to_string(),
            test: "Chi-Square Goodness of Fit".to_string(),
            a: name.to_string(),
            b: None,
            distribution: None,
            method: None,
            statistic,
            pvalue,
        })
    }

    /// Counts of the levels, most frequent level first
    ///
    /// # Arguments
    /// * `name` - Column name
    ///
    pub fn countplot(&self, name: &str) -> Result<CountPlot, AnalysisError> {
        let table = self.frequency(name)?;
        Ok(CountPlot {
            title: format!("Frequencies of {}", name),
            categories: table.rows.iter().map(|(level, _)| level.clone()).collect(),
            series: vec![(
                name.to_string(),
                table.rows.iter().map(|(_, count)| *count as f64).collect(),
            )],
        })
    }
}

/// Analysis of a single numeric variable.
/// Random variates of fitted distributions are drawn with a fixed seed, so plots are reproducible.
///
pub struct QuantitativeOne<'a> {
    df: &'a DataFrame,
}

impl<'a> QuantitativeOne<'a> {
    const ID: &'static str = "QuantitativeOne";

    pub fn new(df: &'a DataFrame) -> Self {
        Self { df }
    }

    fn values(&self, name: &str) -> Result<Vec<f64>, AnalysisError> {
        column_as_f64(self.df, name).map_err(log_error(Self::ID))
    }

    /// Sample and random variates of the distribution fitted to it
    ///
    fn with_variates(
        &self,
        name: &str,
        distribution: &str,
    ) -> Result<(Vec<f64>, Vec<f64>), AnalysisError> {
        let data = self.values(name)?;
        let mut rng = StdRng::seed_from_u64(DEFAULT_MC_SEED);
        let outcome = RvsDistribution::generate_with_rng(&data, distribution, &mut rng)
            .map_err(log_error(Self::ID))?;
        Ok((data, outcome.rvs))
    }

    fn gof_result(
        &self,
        test: &str,
        name: &str,
        distribution: &str,
        method: Option<&str>,
        (statistic, pvalue): (f64, f64),
    ) -> AnalysisTestResult {
        info!("[{}] {} of `{}`: {} (p={})", Self::ID, test, name, statistic, pvalue);
        AnalysisTestResult {
            analyzer: Self::ID.to_string(),
            test: test.to_string(),
            a: name.to_string(),
            b: None,
            distribution: Some(distribution.to_string()),
            method: method.map(|method| method.to_string()),
            statistic,
            pvalue,
        }
    }

    /// Count, mean, standard deviation and quantiles
    ///
    /// # Arguments
    /// * `name` - Column name
    ///
    pub fn describe(&self, name: &str) -> Result<QuantStats, AnalysisError> {
        QuantStats::compute(&self.values(name)?).map_err(log_error(Self::ID))
    }

    /// Goodness of fit to the named distribution. Small samples are tested for normality with
    /// Shapiro-Wilk, everything else with Kolmogorov-Smirnov.
    ///
    /// # Arguments
    /// * `name` - Column name
    /// * `distribution` - Name of the reference distribution
    ///
    pub fn test_distribution(
        &self,
        name: &str,
        distribution: &str,
    ) -> Result<AnalysisTestResult, AnalysisError> {
        let n = self.values(name)?.len();
        if distribution == "normal" && n < SHAPIRO_MAX_OBSERVATIONS {
            debug!("[{}] {} observations, using Shapiro-Wilk", Self::ID, n);
            self.shapiro_wilk(name)
        } else {
            self.kstest(name, distribution)
        }
    }

    /// D'Agostino and Pearson's omnibus test for normality
    ///
    /// # Arguments
    /// * `name` - Column name
    ///
    pub fn normaltest(&self, name: &str) -> Result<AnalysisTestResult, AnalysisError> {
        let outcome = normaltest(&self.values(name)?).map_err(log_error(Self::ID))?;
        Ok(self.gof_result(
            "D'Agostino and Pearson's Test for Normality",
            name,
            "normal",
            None,
            outcome,
        ))
    }

    /// Shapiro-Wilk test for normality
    ///
    /// # Arguments
    /// * `name` - Column name
    ///
    pub fn shapiro_wilk(&self, name: &str) -> Result<AnalysisTestResult, AnalysisError> {
        let outcome = shapiro(&self.values(name)?).map_err(log_error(Self::ID))?;
        Ok(self.gof_result("Shapiro-Wilk Test for Normality", name, "normal", None, outcome))
    }

    /// Kolmogorov-Smirnov goodness of fit to the distribution fitted to the sample,
    /// the p-value is taken from a parametric bootstrap
    ///
    /// # Arguments
    /// * `name` - Column name
    /// * `distribution` - Name of the reference distribution
    ///
    pub fn kstest(
        &self,
        name: &str,
        distribution: &str,
    ) -> Result<AnalysisTestResult, AnalysisError> {
        let data = self.values(name)?;
        let fitted = FittedDistribution::fit(distribution, &data).map_err(log_error(Self::ID))?;
        let statistic = ks_statistic(&data, |x| fitted.cdf(x)).map_err(log_error(Self::ID))?;
        let null = bootstrap_null(
            &fitted,
            distribution,
            data.len(),
            DEFAULT_MC_SAMPLES,
            DEFAULT_MC_SEED,
        )
        .map_err(log_error(Self::ID))?;
        Ok(self.gof_result(
            "Kolmogorov-Smirnov Goodness of Fit",
            name,
            distribution,
            Some("parametric bootstrap"),
            (statistic, null.sf(statistic)),
        ))
    }

    /// Histograms of the sample and of random variates of the fitted distribution
    ///
    /// # Arguments
    /// * `name` - Column name
    /// * `distribution` - Name of the reference distribution
    ///
    pub fn gofplot(&self, name: &str, distribution: &str) -> Result<GroupPlot, AnalysisError> {
        let title = format!(
            "{} Distribution Goodness of Fit to the {} Distribution",
            name,
            capitalize(distribution)
        );
        self.comparison(name, distribution, title, GroupPlotKind::Hist)
    }

    /// Cumulative kernel density estimates of the sample and of random variates
    ///
    /// # Arguments
    /// * `name` - Column name
    /// * `distribution` - Name of the reference distribution
    ///
    pub fn cdfplot(&self, name: &str, distribution: &str) -> Result<GroupPlot, AnalysisError> {
        let title = format!(
            "{} Empirical vs Theoretical {} Cumulative Distribution",
            name,
            capitalize(distribution)
        );
        self.comparison(name, distribution, title, GroupPlotKind::Cdf)
    }

    /// Box plots of the sample and of random variates
    ///
    /// # Arguments
    /// * `name` - Column name
    /// * `distribution` - Name of the reference distribution
    ///
    pub fn boxplot(&self, name: &str, distribution: &str) -> Result<GroupPlot, AnalysisError> {
        let title = format!(
            "Sample and Theoretical {} Distribution of {}",
            capitalize(distribution),
            name
        );
        self.comparison(name, distribution, title, GroupPlotKind::Box)
    }

    /// Violin plots of the sample and of random variates of the fitted distribution
    ///
    pub fn violinplot(&self, name: &str, distribution: &str) -> Result<GroupPlot, AnalysisError> {
        let title = format!(
            "Sample and Theoretical {} Density of {}",
            capitalize(distribution),
            name
        );
        self.comparison(name, distribution, title, GroupPlotKind::Violin)
    }

    fn comparison(
        &self,
        name: &str,
        distribution: &str,
        title: String,
        kind: GroupPlotKind,
    ) -> Result<GroupPlot, AnalysisError> {
        let (data, rvs) = self.with_variates(name, distribution)?;
        Ok(GroupPlot {
            title,
            group: "Distribution".to_string(),
            value: name.to_string(),
            groups: vec![
                (SAMPLE_LABEL.to_string(), data),
                (THEORETICAL_LABEL.to_string(), rvs),
            ],
            kind,
        })
    }

    /// Quantiles of the sample against the quantiles of random variates at `n + 1`
    /// evenly spaced probabilities
    ///
    /// # Arguments
    /// * `name` - Column name
    /// * `distribution` - Name of the reference distribution
    ///
    pub fn qqplot(&self, name: &str, distribution: &str) -> Result<QqPlot, AnalysisError> {
        let (data, rvs) = self.with_variates(name, distribution)?;
        let probabilities = linspace(0.0, 1.0, rvs.len() + 1);
        let (data, rvs) = (sorted(&data), sorted(&rvs));
        Ok(QqPlot {
            title: format!("{} QQ Plot - {} Distribution", name, capitalize(distribution)),
            theoretical: probabilities.iter().map(|q| quantile(&rvs, *q)).collect(),
            sample: probabilities.iter().map(|q| quantile(&data, *q)).collect(),
        })
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use polars::prelude::*;

    use super::*;
    use crate::data::dataset::read_csv;
    use crate::errors::distribution_error::DistributionError;
    use crate::visual::canvas::Canvas;
    use crate::visual::render_svg;

    fn dataset() -> DataFrame {
        read_csv(Path::new("test_files/dataset.csv")).unwrap()
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("normal"), "Normal");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_qualitative_describe_and_frequency() {
        let df = dataset();
        let analysis = QualitativeOne::new(&df);
        let summary = analysis.describe("Gender").unwrap();
        assert_eq!(summary.count, 120);
        assert_eq!(summary.unique, 2);
        let table = analysis.frequency("Education").unwrap();
        assert_eq!(table.total(), 120);
        assert_eq!(table.rows.len(), 3);
        assert!(table.rows.windows(2).all(|pair| pair[0].1 >= pair[1].1));
        assert!((table.cumulative_percent()[2] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_qualitative_distribution() {
        let df = df!("level" => &["a", "a", "b", "b", "b", "c"]).unwrap();
        let analysis = QualitativeOne::new(&df);
        // (2-2)^2/2 + (3-2)^2/2 + (1-2)^2/2 = 1
        let uniform = analysis.test_distribution("level", None).unwrap();
        assert!((uniform.statistic - 1.0).abs() < 1e-12);
        assert!((uniform.pvalue - (-0.5f64).exp()).abs() < 1e-9);

        let expected: BTreeMap<String, f64> =
            [("a", 2.0), ("b", 3.0), ("c", 1.0)].map(|(k, v)| (k.to_string(), v)).into();
        let exact = analysis.test_distribution("level", Some(&expected)).unwrap();
        assert_eq!(exact.statistic, 0.0);
        assert!((exact.pvalue - 1.0).abs() < 1e-12);

        let partial: BTreeMap<String, f64> =
            [("a", 3.0), ("b", 3.0)].map(|(k, v)| (k.to_string(), v)).into();
        assert!(matches!(
            analysis.test_distribution("level", Some(&partial)),
            Err(AnalysisError::CategoryMismatch(observed, expected))
                if observed.len() == 3 && expected.len() == 2
        ));
    }

    #[test]
    fn test_countplot() {
        let df = df!("level" => &["a", "b", "b"]).unwrap();
        let plot = QualitativeOne::new(&df).countplot("level").unwrap();
        assert_eq!(plot.categories, vec!["b".to_string(), "a".to_string()]);
        assert_eq!(plot.series[0].1, vec![2.0, 1.0]);
    }

    #[test]
    fn test_small_normal_sample_uses_shapiro_wilk() {
        let values: Vec<f64> = (1..=20).map(f64::from).collect();
        let df = df!("x" => &values).unwrap();
        let result = QuantitativeOne::new(&df).test_distribution("x", "normal").unwrap();
        assert_eq!(result.test, "Shapiro-Wilk Test for Normality");
        assert!((result.statistic - 0.960375).abs() < 1e-5);
        assert!((result.pvalue - 0.551372).abs() < 1e-3);
    }

    #[test]
    fn test_normaltest() {
        let values: Vec<f64> = (1..=20).map(f64::from).collect();
        let df = df!("x" => &values).unwrap();
        let result = QuantitativeOne::new(&df).normaltest("x").unwrap();
        assert!((result.statistic - 3.992116).abs() < 1e-4);
        assert!((result.pvalue - 0.135870).abs() < 1e-4);
    }

    #[test]
    fn test_large_sample_uses_kstest() {
        let df = dataset();
        let analysis = QuantitativeOne::new(&df);
        let result = analysis.test_distribution("Age", "normal").unwrap();
        assert_eq!(result.test, "Kolmogorov-Smirnov Goodness of Fit");
        assert_eq!(result.method.as_deref(), Some("parametric bootstrap"));
        assert!(result.statistic > 0.0 && result.statistic < 1.0);
        assert!((0.0..=1.0).contains(&result.pvalue));
        // seeded bootstrap
        assert_eq!(analysis.kstest("Age", "normal").unwrap(), result);
    }

    #[test]
    fn test_unsupported_distribution() {
        let df = dataset();
        assert!(matches!(
            QuantitativeOne::new(&df).qqplot("Age", "cauchy"),
            Err(AnalysisError::DistributionError(DistributionError::NotImplemented(name)))
                if name == "cauchy"
        ));
    }

    #[test]
    fn test_qqplot() {
        let df = dataset();
        let plot = QuantitativeOne::new(&df).qqplot("Age", "normal").unwrap();
        assert_eq!(plot.sample.len(), 121);
        assert_eq!(plot.theoretical.len(), 121);
        let ages = sorted(&column_as_f64(&df, "Age").unwrap());
        assert_eq!(plot.sample[0], ages[0]);
        assert_eq!(plot.sample[120], ages[119]);
        assert!(plot.theoretical.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_comparison_plots_render() {
        let df = dataset();
        let analysis = QuantitativeOne::new(&df);
        let canvas = Canvas::default();
        let plots = [
            analysis.gofplot("Score", "normal").unwrap(),
            analysis.cdfplot("Score", "normal").unwrap(),
            analysis.boxplot("Score", "normal").unwrap(),
            analysis.violinplot("Score", "normal").unwrap(),
        ];
        for plot in plots.iter() {
            assert_eq!(plot.groups[0].0, SAMPLE_LABEL);
            assert_eq!(plot.groups[1].1.len(), 120);
            assert!(render_svg(plot, &canvas).unwrap().contains(&plot.title));
        }
    }
}
