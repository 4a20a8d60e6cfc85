// 3rd party imports
use plotters::coord::Shift;
use plotters::prelude::{DrawingArea, DrawingBackend};
use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::Statistics;

// internal imports
use crate::data::descriptive::quantile;
use crate::errors::plot_error::PlotError;
use crate::inference::chisquare_independence::ContingencyTable;
use crate::statistics::sorted;
use crate::visual::canvas::{Canvas, ErrorBar, Estimator};
use crate::visual::charts::{
    draw_boxplots, draw_grouped_bars, draw_heatmap, draw_histograms, draw_kde, draw_points,
    draw_qq, draw_regression, draw_violins, BoxSummary, PointEstimate,
};
use crate::visual::{panel, Plot};

/// Central tendency of a non empty sample, `NaN` for an empty one
///
/// # Arguments
/// * `estimator` - Estimator
/// * `data` - Sample
///
pub fn estimate(estimator: Estimator, data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    match estimator {
        Estimator::Mean => data.iter().mean(),
        Estimator::Median => quantile(&sorted(data), 0.5),
        Estimator::Sum => data.iter().sum(),
    }
}

/// Error bar around `value`, `None` if the sample is too small to show any spread
///
/// # Arguments
/// * `errorbar` - Kind of the error bar
/// * `data` - Sample
/// * `value` - Estimate the bar is centered on
///
pub fn error_interval(errorbar: ErrorBar, data: &[f64], value: f64) -> Option<(f64, f64)> {
    if data.len() < 2 {
        return None;
    }
    let n = data.len() as f64;
    let std = data.iter().std_dev();
    let half_width = match errorbar {
        ErrorBar::Ci => {
            StudentsT::new(0.0, 1.0, n - 1.0).ok()?.inverse_cdf(0.975) * std / n.sqrt()
        }
        ErrorBar::Sd => std,
        ErrorBar::Se => std / n.sqrt(),
        ErrorBar::None => return None,
    };
    Some((value - half_width, value + half_width))
}

/// Bar chart of counts, one series per level of the hue variable
///
#[derive(Debug, Clone, PartialEq)]
pub struct CountPlot {
    pub title: String,
    /// Levels along the x axis
    pub categories: Vec<String>,
    /// Count per category, one series per hue level
    pub series: Vec<(String, Vec<f64>)>,
}

impl Plot for CountPlot {
    fn draw_panels<DB: DrawingBackend>(
        &self,
        canvas: &Canvas,
        panels: &[DrawingArea<DB, Shift>],
    ) -> Result<(), PlotError> {
        let series = self
            .series
            .iter()
            .enumerate()
            .map(|(idx, (label, counts))| {
                Ok((label.as_str(), counts.as_slice(), canvas.palette_hex(idx)?))
            })
            .collect::<Result<Vec<_>, PlotError>>()?;
        draw_grouped_bars(
            canvas,
            panel(panels, 0)?,
            &self.title,
            "Count",
            &self.categories,
            &series,
            canvas.countplot_config.saturation,
            canvas.countplot_config.show_counts,
        )
    }
}

/// How [GroupPlot] shows the groups
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupPlotKind {
    /// Bar of the estimate per group
    Bar,
    /// Box plot per group
    Box,
    /// Estimate with error bar per group
    Point,
    /// Overlaid histograms
    Hist,
    /// Overlaid kernel density estimates
    Kde,
    /// Overlaid cumulative kernel density estimates
    Cdf,
    /// Mirrored kernel density estimate per group
    Violin,
}

/// Numeric variable split by the levels of a categorical variable.
/// Estimators, error bars and bins are taken from the canvas when drawn.
///
#[derive(Debug, Clone, PartialEq)]
pub struct GroupPlot {
    pub title: String,
    /// Name of the grouping variable
    pub group: String,
    /// Name of the numeric variable
    pub value: String,
    pub groups: Vec<(String, Vec<f64>)>,
    pub kind: GroupPlotKind,
}

impl GroupPlot {
    fn categories(&self) -> Vec<String> {
        self.groups.iter().map(|(level, _)| level.clone()).collect()
    }

    /// Groups with their palette color
    ///
    fn samples<'a>(
        &'a self,
        canvas: &'a Canvas,
    ) -> Result<Vec<(&'a str, &'a [f64], &'a str)>, PlotError> {
        self.groups
            .iter()
            .enumerate()
            .map(|(idx, (level, data))| {
                Ok((level.as_str(), data.as_slice(), canvas.palette_hex(idx)?))
            })
            .collect()
    }
}

impl Plot for GroupPlot {
    fn draw_panels<DB: DrawingBackend>(
        &self,
        canvas: &Canvas,
        panels: &[DrawingArea<DB, Shift>],
    ) -> Result<(), PlotError> {
        let area = panel(panels, 0)?;
        match self.kind {
            GroupPlotKind::Bar => {
                let config = &canvas.barplot_config;
                let estimates: Vec<f64> = self
                    .groups
                    .iter()
                    .map(|(_, data)| estimate(config.estimator, data))
                    .collect();
                draw_grouped_bars(
                    canvas,
                    area,
                    &self.title,
                    &self.value,
                    &self.categories(),
                    &[(self.value.as_str(), estimates.as_slice(), canvas.palette_hex(0)?)],
                    config.saturation,
                    false,
                )
            }
            GroupPlotKind::Box => {
                let whis = canvas.boxplot_config.whis;
                let summaries = self
                    .groups
                    .iter()
                    .filter_map(|(level, data)| {
                        Some((level.as_str(), BoxSummary::compute(data, whis)?))
                    })
                    .collect::<Vec<_>>();
                let groups = summaries
                    .iter()
                    .enumerate()
                    .map(|(idx, (level, summary))| {
                        Ok((*level, summary, canvas.palette_hex(idx)?))
                    })
                    .collect::<Result<Vec<_>, PlotError>>()?;
                draw_boxplots(canvas, area, &self.title, &self.value, &groups)
            }
            GroupPlotKind::Point => {
                let config = &canvas.pointplot_config;
                let estimates: Vec<PointEstimate> = self
                    .groups
                    .iter()
                    .map(|(_, data)| {
                        let value = estimate(config.estimator, data);
                        PointEstimate {
                            value,
                            interval: error_interval(config.errorbar, data, value),
                        }
                    })
                    .collect();
                draw_points(
                    canvas,
                    area,
                    &self.title,
                    (self.group.as_str(), self.value.as_str()),
                    &self.categories(),
                    &estimates,
                )
            }
            GroupPlotKind::Hist => draw_histograms(
                canvas,
                area,
                &self.title,
                &self.value,
                &self.samples(canvas)?,
                None,
                canvas.histplot_config.stat,
            ),
            GroupPlotKind::Kde => {
                draw_kde(canvas, area, &self.title, &self.value, &self.samples(canvas)?)
            }
            GroupPlotKind::Cdf => {
                let mut cumulative = canvas.clone();
                cumulative.kdeplot_config.cumulative = true;
                draw_kde(
                    &cumulative,
                    area,
                    &self.title,
                    &self.value,
                    &self.samples(canvas)?,
                )
            }
            GroupPlotKind::Violin => {
                draw_violins(canvas, area, &self.title, &self.value, &self.samples(canvas)?)
            }
        }
    }
}

/// Sample quantiles against the quantiles of variates of a theoretical distribution
///
#[derive(Debug, Clone, PartialEq)]
pub struct QqPlot {
    pub title: String,
    pub theoretical: Vec<f64>,
    pub sample: Vec<f64>,
}

impl Plot for QqPlot {
    fn draw_panels<DB: DrawingBackend>(
        &self,
        canvas: &Canvas,
        panels: &[DrawingArea<DB, Shift>],
    ) -> Result<(), PlotError> {
        draw_qq(canvas, panel(panels, 0)?, &self.title, &self.theoretical, &self.sample)
    }
}

/// Heat map of a cross tabulation
///
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapPlot {
    pub title: String,
    /// Name of the variable along the rows
    pub a: String,
    /// Name of the variable along the columns
    pub b: String,
    pub table: ContingencyTable,
}

impl Plot for HeatmapPlot {
    fn draw_panels<DB: DrawingBackend>(
        &self,
        canvas: &Canvas,
        panels: &[DrawingArea<DB, Shift>],
    ) -> Result<(), PlotError> {
        draw_heatmap(
            canvas,
            panel(panels, 0)?,
            &self.title,
            (self.b.as_str(), self.a.as_str()),
            &self.table.rows,
            &self.table.columns,
            &self.table.counts,
        )
    }
}

/// Scatter plot of two numeric variables with their regression line
///
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPlot {
    pub title: String,
    pub x_name: String,
    pub y_name: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Plot for ScatterPlot {
    fn draw_panels<DB: DrawingBackend>(
        &self,
        canvas: &Canvas,
        panels: &[DrawingArea<DB, Shift>],
    ) -> Result<(), PlotError> {
        draw_regression(
            canvas,
            panel(panels, 0)?,
            &self.title,
            (self.x_name.as_str(), self.y_name.as_str()),
            &self.x,
            &self.y,
        )
    }
}
