// std imports
use std::fmt;

// 3rd party imports
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// internal imports
use super::plots::{CountPlot, GroupPlot, GroupPlotKind, HeatmapPlot, ScatterPlot};
use super::{log_error, AnalysisTestResult, CategoricalSummary};
use crate::data::dataset::{grouped_column, is_numeric_column, paired_columns, paired_str_columns};
use crate::data::descriptive::QuantStats;
use crate::errors::analysis_error::AnalysisError;
use crate::inference::chisquare_independence::ContingencyTable;
use crate::statistics::anova::f_oneway;
use crate::statistics::chisquare::chi2_contingency;
use crate::statistics::correlation::pearsonr;

/// Summary of the second variable per level of the first
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GroupedSummary {
    Numeric(Vec<(String, QuantStats)>),
    Categorical(Vec<(String, CategoricalSummary)>),
}

impl fmt::Display for GroupedSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Numeric(groups) => {
                for (level, stats) in groups.iter() {
                    writeln!(f, "{}", level)?;
                    write!(f, "{}", stats)?;
                }
            }
            Self::Categorical(groups) => {
                for (level, summary) in groups.iter() {
                    writeln!(f, "{}", level)?;
                    write!(f, "{}", summary)?;
                }
            }
        }
        Ok(())
    }
}

/// Analysis of a categorical variable `a` together with a categorical or numeric variable `b`
///
pub struct QualitativeTwo<'a> {
    df: &'a DataFrame,
}

impl<'a> QualitativeTwo<'a> {
    const ID: &'static str = "QualitativeTwo";

    pub fn new(df: &'a DataFrame) -> Self {
        Self { df }
    }

    fn is_numeric(&self, name: &str) -> Result<bool, AnalysisError> {
        is_numeric_column(self.df, name).map_err(log_error(Self::ID))
    }

    fn groups(&self, a: &str, b: &str) -> Result<Vec<(String, Vec<f64>)>, AnalysisError> {
        grouped_column(self.df, b, a).map_err(log_error(Self::ID))
    }

    fn group_plot(
        &self,
        a: &str,
        b: &str,
        title: String,
        kind: GroupPlotKind,
    ) -> Result<GroupPlot, AnalysisError> {
        Ok(GroupPlot {
            title,
            group: a.to_string(),
            value: b.to_string(),
            groups: self.groups(a, b)?,
            kind,
        })
    }

    /// Statistics of `b` per level of `a`, levels are sorted lexically
    ///
    /// # Arguments
    /// * `a` - Categorical column
    /// * `b` - Categorical or numeric column
    ///
    pub fn describe(&self, a: &str, b: &str) -> Result<GroupedSummary, AnalysisError> {
        if self.is_numeric(b)? {
            let groups = self
                .groups(a, b)?
                .into_iter()
                .map(|(level, data)| Ok((level, QuantStats::compute(&data)?)))
                .collect::<Result<Vec<_>, AnalysisError>>()
                .map_err(log_error(Self::ID))?;
            return Ok(GroupedSummary::Numeric(groups));
        }
        let table = self.frequency(a, b)?;
        let groups = table
            .rows
            .iter()
            .zip(table.counts.iter())
            .map(|(level, counts)| {
                let values: Vec<String> = table
                    .columns
                    .iter()
                    .zip(counts.iter())
                    .flat_map(|(column, count)| {
                        std::iter::repeat(column.clone()).take(*count as usize)
                    })
                    .collect();
                Ok((level.clone(), CategoricalSummary::compute(&values)?))
            })
            .collect::<Result<Vec<_>, AnalysisError>>()
            .map_err(log_error(Self::ID))?;
        Ok(GroupedSummary::Categorical(groups))
    }

    /// Cross tabulation of two categorical variables
    ///
    /// # Arguments
    /// * `a` - Categorical column, rows of the table
    /// * `b` - Categorical column, columns of the table
    ///
    pub fn frequency(&self, a: &str, b: &str) -> Result<ContingencyTable, AnalysisError> {
        let pairs = paired_str_columns(self.df, a, b).map_err(log_error(Self::ID))?;
        Ok(ContingencyTable::from_pairs(&pairs))
    }

    /// Chi-square test of independence if `b` is categorical, one-way ANOVA of the means
    /// of `b` across the levels of `a` if it is numeric
    ///
    /// # Arguments
    /// * `a` - Categorical column
    /// * `b` - Categorical or numeric column
    ///
    pub fn test_independence(
        &self,
        a: &str,
        b: &str,
    ) -> Result<AnalysisTestResult, AnalysisError> {
        let (test, statistic, pvalue) = if self.is_numeric(b)? {
            let groups = self.groups(a, b)?;
            debug!("[{}] ANOVA of `{}` over {} levels of `{}`", Self::ID, b, groups.len(), a);
            let samples: Vec<&[f64]> = groups.iter().map(|(_, data)| data.as_slice()).collect();
            let outcome = f_oneway(&samples).map_err(log_error(Self::ID))?;
            ("One-Way ANOVA Test of Independence", outcome.statistic, outcome.pvalue)
        } else {
            let table = self.frequency(a, b)?;
            let outcome = chi2_contingency(&table.counts, true).map_err(log_error(Self::ID))?;
            ("Chi-Square Test of Independence", outcome.statistic, outcome.pvalue)
        };
        info!("[{}] {} of `{}` and `{}`: {} (p={})", Self::ID, test, a, b, statistic, pvalue);
        Ok(AnalysisTestResult {
            analyzer: Self::ID.to_string(),
            test: test.to_string(),
            a: a.to_string(),
            b: Some(b.to_string()),
            distribution: None,
            method: None,
            statistic,
            pvalue,
        })
    }

    /// Counts of the levels of `a`, one bar per level of `b`
    ///
    /// # Arguments
    /// * `a` - Categorical column along the x axis
    /// * `b` - Categorical column
    ///
    pub fn countplot(&self, a: &str, b: &str) -> Result<CountPlot, AnalysisError> {
        let table = self.frequency(a, b)?;
        let series = table
            .columns
            .iter()
            .enumerate()
            .map(|(idx, level)| {
                (level.clone(), table.counts.iter().map(|row| row[idx]).collect())
            })
            .collect();
        Ok(CountPlot {
            title: format!("Frequency Distribution of {} and {}", a, b),
            categories: table.rows,
            series,
        })
    }

    /// Heat map of the cross tabulation
    ///
    /// # Arguments
    /// * `a` - Categorical column along the y axis
    /// * `b` - Categorical column along the x axis
    ///
    pub fn heatmap(&self, a: &str, b: &str) -> Result<HeatmapPlot, AnalysisError> {
        Ok(HeatmapPlot {
            title: format!("Frequencies of {} and {}", a, b),
            a: a.to_string(),
            b: b.to_string(),
            table: self.frequency(a, b)?,
        })
    }

    /// Estimate of the numeric `b` per level of `a`
    ///
    pub fn barplot(&self, a: &str, b: &str) -> Result<GroupPlot, AnalysisError> {
        self.group_plot(a, b, format!("Distribution of {} by {}", b, a), GroupPlotKind::Bar)
    }

    /// Box plot of the numeric `b` per level of `a`
    ///
    pub fn boxplot(&self, a: &str, b: &str) -> Result<GroupPlot, AnalysisError> {
        self.group_plot(a, b, format!("Distribution of {} by {}", b, a), GroupPlotKind::Box)
    }

    /// Estimate with error bar of the numeric `b` per level of `a`
    ///
    pub fn pointplot(&self, a: &str, b: &str) -> Result<GroupPlot, AnalysisError> {
        self.group_plot(a, b, format!("Central Tendency of {} by {}", b, a), GroupPlotKind::Point)
    }

    /// Histograms of the numeric `b`, one per level of `a`
    ///
    pub fn histplot(&self, a: &str, b: &str) -> Result<GroupPlot, AnalysisError> {
        self.group_plot(a, b, format!("Distribution of {} by {}", b, a), GroupPlotKind::Hist)
    }

    /// Kernel density estimates of the numeric `b`, one per level of `a`
    ///
    pub fn kdeplot(&self, a: &str, b: &str) -> Result<GroupPlot, AnalysisError> {
        self.group_plot(a, b, format!("Density of {} by {}", b, a), GroupPlotKind::Kde)
    }

    /// Violin plot of the numeric `b` per level of `a`
    ///
    pub fn violinplot(&self, a: &str, b: &str) -> Result<GroupPlot, AnalysisError> {
        self.group_plot(a, b, format!("Density of {} by {}", b, a), GroupPlotKind::Violin)
    }
}

/// Analysis of two numeric variables, rows where either value is missing are dropped
///
pub struct QuantitativeTwo<'a> {
    df: &'a DataFrame,
}

impl<'a> QuantitativeTwo<'a> {
    const ID: &'static str = "QuantitativeTwo";

    pub fn new(df: &'a DataFrame) -> Self {
        Self { df }
    }

    fn pairs(&self, a: &str, b: &str) -> Result<(Vec<f64>, Vec<f64>), AnalysisError> {
        paired_columns(self.df, a, b).map_err(log_error(Self::ID))
    }

    /// Statistics of both variables
    ///
    pub fn describe(&self, a: &str, b: &str) -> Result<(QuantStats, QuantStats), AnalysisError> {
        let (x, y) = self.pairs(a, b)?;
        Ok((
            QuantStats::compute(&x).map_err(log_error(Self::ID))?,
            QuantStats::compute(&y).map_err(log_error(Self::ID))?,
        ))
    }

    /// Pearson correlation of the two variables
    ///
    pub fn test_association(
        &self,
        a: &str,
        b: &str,
    ) -> Result<AnalysisTestResult, AnalysisError> {
        let (x, y) = self.pairs(a, b)?;
        let (statistic, pvalue) = pearsonr(&x, &y).map_err(log_error(Self::ID))?;
        info!("[{}] Pearson of `{}` and `{}`: {} (p={})", Self::ID, a, b, statistic, pvalue);
        Ok(AnalysisTestResult {
            analyzer: Self::ID.to_string(),
            test: "Pearson Correlation Test".to_string(),
            a: a.to_string(),
            b: Some(b.to_string()),
            distribution: None,
            method: None,
            statistic,
            pvalue,
        })
    }

    /// Scatter plot with regression line
    ///
    pub fn scatterplot(&self, a: &str, b: &str) -> Result<ScatterPlot, AnalysisError> {
        let (x, y) = self.pairs(a, b)?;
        Ok(ScatterPlot {
            title: format!("Relationship between {} and {}", a, b),
            x_name: a.to_string(),
            y_name: b.to_string(),
            x,
            y,
        })
    }
}
