/// Analyzers of two variables
pub mod bivariate;
/// Plots built by the analyzers
pub mod plots;
/// Analyzers of a single variable
pub mod univariate;

// std imports
use std::collections::BTreeMap;
use std::fmt;

// 3rd party imports
use serde::{Deserialize, Serialize};
use tracing::error;

// internal imports
use crate::errors::analysis_error::AnalysisError;
use crate::errors::statistics_error::StatisticsError;
use crate::inference::base::write_row;

/// Logs the error under the analyzer id before it is returned
///
pub(crate) fn log_error<E: Into<AnalysisError>>(
    id: &'static str,
) -> impl FnOnce(E) -> AnalysisError {
    move |err| {
        let err = err.into();
        error!("[{}] {}", id, err);
        err
    }
}

/// Statistic and p-value of a test run by an analyzer.
/// Unlike the results of [crate::inference] no decision is attached.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisTestResult {
    pub analyzer: String,
    pub test: String,
    /// Name of the (first) variable
    pub a: String,
    /// Name of the second variable
    pub b: Option<String>,
    /// Reference distribution of a goodness of fit test
    pub distribution: Option<String>,
    /// How the p-value was obtained
    pub method: Option<String>,
    pub statistic: f64,
    pub pvalue: f64,
}

impl fmt::Display for AnalysisTestResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{:^64}", self.test)?;
        write_row(f, "analyzer", &self.analyzer)?;
        write_row(f, "a", &self.a)?;
        if let Some(b) = &self.b {
            write_row(f, "b", b)?;
        }
        if let Some(distribution) = &self.distribution {
            write_row(f, "distribution", distribution)?;
        }
        if let Some(method) = &self.method {
            write_row(f, "method", method)?;
        }
        write_row(f, "statistic", self.statistic)?;
        write_row(f, "pvalue", self.pvalue)
    }
}

/// Count, number of levels and the most frequent level of a categorical variable
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalSummary {
    pub count: usize,
    pub unique: usize,
    /// Most frequent level, the lexically first on ties
    pub top: String,
    /// Count of `top`
    pub freq: usize,
}

impl CategoricalSummary {
    /// Summary of a non empty set of observations
    ///
    pub fn compute(values: &[String]) -> Result<Self, StatisticsError> {
        let table = FrequencyTable::from_values(values);
        let (top, freq) = table
            .rows
            .first()
            .cloned()
            .ok_or(StatisticsError::TooFewObservations(1, 0))?;
        Ok(Self {
            count: values.len(),
            unique: table.rows.len(),
            top,
            freq,
        })
    }
}

impl fmt::Display for CategoricalSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{:>16} | {}", "count", self.count)?;
        writeln!(f, "{:>16} | {}", "unique", self.unique)?;
        writeln!(f, "{:>16} | {}", "top", self.top)?;
        writeln!(f, "{:>16} | {}", "freq", self.freq)
    }
}

/// Counts per level, most frequent level first
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyTable {
    pub rows: Vec<(String, usize)>,
}

impl FrequencyTable {
    /// Counts each level. Levels with equal counts are ordered lexically.
    ///
    pub fn from_values(values: &[String]) -> Self {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for value in values.iter() {
            *counts.entry(value).or_default() += 1;
        }
        let mut rows: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(level, count)| (level.to_string(), count))
            .collect();
        // stable sort keeps the lexical order of ties
        rows.sort_by(|a, b| b.1.cmp(&a.1));
        Self { rows }
    }

    pub fn total(&self) -> usize {
        self.rows.iter().map(|(_, count)| count).sum()
    }

    /// Share of each level in percent
    ///
    pub fn percent(&self) -> Vec<f64> {
        let total = self.total() as f64;
        self.rows
            .iter()
            .map(|(_, count)| *count as f64 / total * 100.0)
            .collect()
    }

    /// Running sum of [FrequencyTable::percent]
    ///
    pub fn cumulative_percent(&self) -> Vec<f64> {
        self.percent()
            .into_iter()
            .scan(0.0, |acc, percent| {
                *acc += percent;
                Some(*acc)
            })
            .collect()
    }
}

impl fmt::Display for FrequencyTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{:>16} | {:>8} | {:>8} | {:>8}", "", "Count", "%", "Cum %")?;
        for (((level, count), percent), cumulative) in self
            .rows
            .iter()
            .zip(self.percent())
            .zip(self.cumulative_percent())
        {
            writeln!(
                f,
                "{:>16} | {:>8} | {:>8.2} | {:>8.2}",
                level, count, percent, cumulative
            )?;
        }
        Ok(())
    }
}
