// std imports
use std::f64::consts::{PI, SQRT_2};
use std::ops::Range;

// 3rd party imports
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use statrs::function::erf::erfc;
use statrs::statistics::Statistics;

// internal imports
use super::canvas::{parse_hex_color, Canvas, HistStat};
use super::drawing_error;
use crate::data::descriptive::quantile;
use crate::data::generation::Curve;
use crate::errors::plot_error::PlotError;
use crate::statistics::sorted;

/// Chart with numeric axes, categorical axes map category `i` to `i as f64`
///
type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Points at which kernel density estimates are evaluated
const KDE_POINTS: usize = 200;

/// Bin of a histogram
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub left: f64,
    pub right: f64,
    /// Fraction of observations divided by bin width
    pub density: f64,
}

/// Density histogram with `bins` bins of equal width between `lower` and `upper`.
/// Observations outside of the range are ignored, the last bin includes `upper`.
///
pub fn histogram_density(data: &[f64], lower: f64, upper: f64, bins: usize) -> Vec<HistogramBin> {
    if data.is_empty() || bins == 0 || upper <= lower {
        return Vec::new();
    }
    let width = (upper - lower) / bins as f64;
    let mut counts = vec![0usize; bins];
    for value in data.iter() {
        if *value < lower || *value > upper {
            continue;
        }
        let idx = (((value - lower) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    let total = data.len() as f64;
    counts
        .iter()
        .enumerate()
        .map(|(idx, count)| HistogramBin {
            left: lower + idx as f64 * width,
            right: lower + (idx + 1) as f64 * width,
            density: *count as f64 / (total * width),
        })
        .collect()
}

/// Empirical cumulative distribution function as step points
///
pub fn ecdf(data: &[f64]) -> Curve {
    let x = sorted(data);
    let n = x.len() as f64;
    let y = (1..=x.len()).map(|idx| idx as f64 / n).collect();
    Curve { x, y }
}

/// Least squares fit `y = slope * x + intercept`, `None` if `x` has no spread
///
pub fn linear_fit(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    if x.is_empty() || x.len() != y.len() {
        return None;
    }
    let n = x.len() as f64;
    let x_mean = x.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;
    let mut covariance = 0.0;
    let mut x_squares = 0.0;
    for (xi, yi) in x.iter().zip(y.iter()) {
        covariance += (xi - x_mean) * (yi - y_mean);
        x_squares += (xi - x_mean).powi(2);
    }
    if x_squares == 0.0 {
        return None;
    }
    let slope = covariance / x_squares;
    Some((slope, y_mean - slope * x_mean))
}

/// Smallest and largest value of all given samples
///
fn bounds<'a, I: IntoIterator<Item = &'a f64>>(values: I) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|value| value.is_finite())
        .fold(None, |acc, value| match acc {
            None => Some((*value, *value)),
            Some((min, max)) => Some((min.min(*value), max.max(*value))),
        })
}

/// Gaussian kernel density estimate with the bandwidth of Scott's rule
///
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianKde {
    data: Vec<f64>,
    bandwidth: f64,
}

impl GaussianKde {
    /// `None` for less than two finite observations or a sample without spread
    ///
    pub fn new(data: &[f64]) -> Option<Self> {
        Self::with_adjust(data, 1.0)
    }

    /// Estimate with the bandwidth of Scott's rule multiplied by `adjust`
    ///
    /// # Arguments
    /// * `data` - Sample
    /// * `adjust` - Bandwidth factor
    ///
    pub fn with_adjust(data: &[f64], adjust: f64) -> Option<Self> {
        let data: Vec<f64> = data.iter().copied().filter(|value| value.is_finite()).collect();
        if data.len() < 2 || !(adjust > 0.0) {
            return None;
        }
        let std = data.iter().std_dev();
        if !(std > 0.0) {
            return None;
        }
        let bandwidth = adjust * std * (data.len() as f64).powf(-0.2);
        Some(Self { data, bandwidth })
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn pdf(&self, x: f64) -> f64 {
        let norm = self.data.len() as f64 * self.bandwidth * (2.0 * PI).sqrt();
        self.data
            .iter()
            .map(|xi| (-0.5 * ((x - xi) / self.bandwidth).powi(2)).exp())
            .sum::<f64>()
            / norm
    }

    pub fn cdf(&self, x: f64) -> f64 {
        self.data
            .iter()
            .map(|xi| 0.5 * erfc(-(x - xi) / (self.bandwidth * SQRT_2)))
            .sum::<f64>()
            / self.data.len() as f64
    }

    /// Range of the sample extended by three bandwidths
    ///
    pub fn support(&self) -> (f64, f64) {
        let (min, max) = bounds(self.data.iter()).unwrap_or((0.0, 0.0));
        (min - 3.0 * self.bandwidth, max + 3.0 * self.bandwidth)
    }

    /// Density or cumulative distribution sampled over the support
    ///
    pub fn curve(&self, points: usize, cumulative: bool) -> Curve {
        let (lower, upper) = self.support();
        if cumulative {
            Curve::sample(|x| self.cdf(x), lower, upper, points)
        } else {
            Curve::sample(|x| self.pdf(x), lower, upper, points)
        }
    }
}

/// Five number summary of a box plot with the observations beyond the whiskers
///
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSummary {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Smallest observation within `whis` interquartile ranges below `q1`
    pub lower_whisker: f64,
    /// Largest observation within `whis` interquartile ranges above `q3`
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl BoxSummary {
    /// `None` for an empty sample
    ///
    /// # Arguments
    /// * `data` - Sample
    /// * `whis` - Whisker length as multiple of the interquartile range
    ///
    pub fn compute(data: &[f64], whis: f64) -> Option<Self> {
        let ascending: Vec<f64> =
            sorted(data).into_iter().filter(|value| value.is_finite()).collect();
        if ascending.is_empty() {
            return None;
        }
        let q1 = quantile(&ascending, 0.25);
        let q3 = quantile(&ascending, 0.75);
        let reach = whis * (q3 - q1);
        let (low, high) = (q1 - reach, q3 + reach);
        let within = || ascending.iter().copied().filter(|value| *value >= low && *value <= high);
        Some(Self {
            q1,
            median: quantile(&ascending, 0.5),
            q3,
            lower_whisker: within().next().unwrap_or(q1),
            upper_whisker: within().last().unwrap_or(q3),
            outliers: ascending
                .iter()
                .copied()
                .filter(|value| *value < low || *value > high)
                .collect(),
        })
    }
}

/// Estimate of the central tendency with its error bar
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointEstimate {
    pub value: f64,
    /// Error bar, `None` if not drawn
    pub interval: Option<(f64, f64)>,
}

/// Pads a range which would otherwise be empty
///
fn padded(min: f64, max: f64) -> (f64, f64) {
    if max > min {
        let padding = (max - min) * 0.05;
        (min - padding, max + padding)
    } else {
        (min - 0.5, max + 0.5)
    }
}

/// Label of the category at `x`, empty between categories
///
fn category_label(categories: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() < 1e-6 && idx >= 0.0 {
        categories.get(idx as usize).cloned().unwrap_or_default()
    } else {
        String::new()
    }
}

/// Axis range placing `count` categories at `0..count`
///
fn category_range(count: usize) -> Range<f64> {
    -0.5..count as f64 - 0.5
}

/// Builds a chart on the area and fills its plotting area with the style's background
///
fn build_chart<'a, DB: DrawingBackend + 'a>(
    canvas: &Canvas,
    area: &'a DrawingArea<DB, Shift>,
    title: &str,
    x: Range<f64>,
    y: Range<f64>,
) -> Result<Chart<'a, DB>, PlotError> {
    let chart = ChartBuilder::on(area)
        .caption(title, canvas.title_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x, y)
        .map_err(drawing_error("chart"))?;
    chart
        .plotting_area()
        .fill(&canvas.background())
        .map_err(drawing_error("background"))?;
    Ok(chart)
}

/// Draws axes and, for the grid styles, grid lines.
/// Categorical axes get one label per category and no grid lines.
///
/// # Arguments
/// * `canvas` - Visual configuration
/// * `chart` - Chart
/// * `labels` - Axis labels (x, y)
/// * `x_categories` - Categories of a categorical x axis
/// * `y_categories` - Categories of a categorical y axis
///
fn draw_mesh<'a, DB: DrawingBackend + 'a>(
    canvas: &Canvas,
    chart: &mut Chart<'a, DB>,
    labels: (&str, &str),
    x_categories: Option<&[String]>,
    y_categories: Option<&[String]>,
) -> Result<(), PlotError> {
    let x_formatter = |x: &f64| category_label(x_categories.unwrap_or(&[]), *x);
    let y_formatter = |y: &f64| category_label(y_categories.unwrap_or(&[]), *y);
    let mut mesh = chart.configure_mesh();
    mesh.x_desc(labels.0)
        .y_desc(labels.1)
        .label_style(canvas.font());
    if let Some(categories) = x_categories {
        mesh.disable_x_mesh()
            .x_labels(categories.len())
            .x_label_formatter(&x_formatter);
    }
    if let Some(categories) = y_categories {
        mesh.disable_y_mesh()
            .y_labels(categories.len())
            .y_label_formatter(&y_formatter);
    }
    if !canvas.show_grid() {
        mesh.disable_mesh();
    }
    mesh.draw().map_err(drawing_error("mesh"))
}

/// Draws the labels of all labeled series following the legend configuration
///
fn draw_legend<'a, DB: DrawingBackend + 'a>(
    canvas: &Canvas,
    chart: &mut Chart<'a, DB>,
) -> Result<(), PlotError> {
    let config = &canvas.legend_config;
    let mut legend = chart.configure_series_labels();
    legend
        .position(config.position())
        .label_font(canvas.legend_font());
    if config.frameon {
        legend
            .background_style(WHITE.mix(config.framealpha))
            .border_style(BLACK);
    }
    legend.draw().map_err(drawing_error("legend"))
}

/// Draws labeled curves, filling the area below each curve if `fill` is set
///
fn draw_lines<'a, DB: DrawingBackend + 'a>(
    canvas: &Canvas,
    chart: &mut Chart<'a, DB>,
    curves: &[(&str, &Curve, &str)],
    fill: bool,
) -> Result<(), PlotError> {
    for (label, curve, color) in curves.iter() {
        let color = parse_hex_color(color)?;
        if fill {
            chart
                .draw_series(AreaSeries::new(
                    curve.points(),
                    0.0,
                    color.mix(canvas.saturation),
                ))
                .map_err(drawing_error("area"))?;
        }
        chart
            .draw_series(LineSeries::new(
                curve.points(),
                color.stroke_width(canvas.lineplot_config.stroke_width),
            ))
            .map_err(drawing_error("curve"))?
            .label(*label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }
    Ok(())
}

/// Line plot of labeled curves
///
/// # Arguments
/// * `canvas` - Visual configuration
/// * `area` - Drawing area
/// * `title` - Plot title
/// * `labels` - Axis labels (x, y)
/// * `curves` - Curves with their legend label and hex color
///
pub fn draw_curves<DB: DrawingBackend>(
    canvas: &Canvas,
    area: &DrawingArea<DB, Shift>,
    title: &str,
    labels: (&str, &str),
    curves: &[(&str, &Curve, &str)],
) -> Result<(), PlotError> {
    let (x_min, x_max) = bounds(curves.iter().flat_map(|(_, curve, _)| curve.x.iter()))
        .ok_or(PlotError::EmptyPlot("curves"))?;
    let (y_min, y_max) = bounds(curves.iter().flat_map(|(_, curve, _)| curve.y.iter()))
        .ok_or(PlotError::EmptyPlot("curves"))?;
    let (x_min, x_max) = padded(x_min, x_max);
    let (y_min, y_max) = padded(y_min.min(0.0), y_max);

    let mut chart = build_chart(canvas, area, title, x_min..x_max, y_min..y_max)?;
    draw_mesh(canvas, &mut chart, labels, None, None)?;
    draw_lines(canvas, &mut chart, curves, false)?;
    draw_legend(canvas, &mut chart)
}

/// Histograms of the samples normalized by `stat`, optionally overlaid with a density curve.
/// The density curve and the kernel density estimates of the histogram configuration are
/// scaled to the bar heights.
///
/// # Arguments
/// * `canvas` - Visual configuration
/// * `area` - Drawing area
/// * `title` - Plot title
/// * `x_label` - Label of the x axis
/// * `samples` - Samples with their legend label and hex color
/// * `density` - Optional density curve with legend label and hex color
/// * `stat` - Normalization of the bars
///
pub fn draw_histograms<DB: DrawingBackend>(
    canvas: &Canvas,
    area: &DrawingArea<DB, Shift>,
    title: &str,
    x_label: &str,
    samples: &[(&str, &[f64], &str)],
    density: Option<(&str, &Curve, &str)>,
    stat: HistStat,
) -> Result<(), PlotError> {
    let config = &canvas.histplot_config;
    let (x_min, x_max) = bounds(
        samples
            .iter()
            .flat_map(|(_, sample, _)| sample.iter())
            .chain(density.iter().flat_map(|(_, curve, _)| curve.x.iter())),
    )
    .ok_or(PlotError::EmptyPlot("histogram"))?;
    let (x_min, x_max) = padded(x_min, x_max);
    let bins = config.bins.max(1);
    let width = (x_max - x_min) / bins as f64;
    let histograms: Vec<Vec<(f64, f64, f64)>> = samples
        .iter()
        .map(|(_, sample, _)| {
            let scale = stat.scale(sample.len(), width);
            histogram_density(sample, x_min, x_max, bins)
                .iter()
                .map(|bin| (bin.left, bin.right, bin.density * scale))
                .collect()
        })
        .collect();
    let kde_curves: Vec<Option<Curve>> = samples
        .iter()
        .map(|(_, sample, _)| {
            let kde = GaussianKde::new(sample).filter(|_| config.kde)?;
            let scale = stat.scale(sample.len(), width);
            let mut curve = kde.curve(200, false);
            curve.y.iter_mut().for_each(|y| *y *= scale);
            Some(curve)
        })
        .collect();
    let density = density.map(|(label, curve, color)| {
        // Density curves are given per unit, the first sample sets the scale
        let scale = stat.scale(samples.first().map_or(0, |(_, sample, _)| sample.len()), width);
        let scaled = Curve {
            x: curve.x.clone(),
            y: curve.y.iter().map(|y| y * scale).collect(),
        };
        (label, scaled, color)
    });
    let y_max = histograms
        .iter()
        .flatten()
        .map(|(_, _, height)| *height)
        .chain(kde_curves.iter().flatten().flat_map(|curve| curve.y_max()))
        .chain(density.iter().flat_map(|(_, curve, _)| curve.y_max()))
        .fold(0.0, f64::max)
        .max(f64::EPSILON)
        * 1.1;

    let mut chart = build_chart(canvas, area, title, x_min..x_max, 0.0..y_max)?;
    draw_mesh(canvas, &mut chart, (x_label, stat.label()), None, None)?;

    for (((label, _, color), histogram), kde) in
        samples.iter().zip(histograms.iter()).zip(kde_curves.iter())
    {
        let color = parse_hex_color(color)?;
        let style = if config.fill {
            color.mix(canvas.saturation).filled()
        } else {
            color.stroke_width(1)
        };
        chart
            .draw_series(histogram.iter().map(|(left, right, height)| {
                Rectangle::new([(*left, 0.0), (*right, *height)], style)
            }))
            .map_err(drawing_error("histogram"))?
            .label(*label)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], style));
        if let Some(kde) = kde {
            chart
                .draw_series(LineSeries::new(
                    kde.points(),
                    color.stroke_width(canvas.lineplot_config.stroke_width),
                ))
                .map_err(drawing_error("kernel density estimate"))?;
        }
    }
    if let Some((label, curve, color)) = &density {
        draw_lines(canvas, &mut chart, &[(*label, curve, *color)], false)?;
    }
    if config.legend {
        draw_legend(canvas, &mut chart)?;
    }
    Ok(())
}

/// Kernel density estimates of the samples following the KDE configuration
///
/// # Arguments
/// * `canvas` - Visual configuration
/// * `area` - Drawing area
/// * `title` - Plot title
/// * `x_label` - Label of the x axis
/// * `samples` - Samples with their legend label and hex color
///
pub fn draw_kde<DB: DrawingBackend>(
    canvas: &Canvas,
    area: &DrawingArea<DB, Shift>,
    title: &str,
    x_label: &str,
    samples: &[(&str, &[f64], &str)],
) -> Result<(), PlotError> {
    let config = &canvas.kdeplot_config;
    let estimates: Vec<(&str, Curve, &str)> = samples
        .iter()
        .filter_map(|(label, sample, color)| {
            let kde = GaussianKde::with_adjust(sample, config.bw_adjust)?;
            Some((*label, kde.curve(KDE_POINTS, config.cumulative), *color))
        })
        .collect();
    if estimates.is_empty() {
        return Err(PlotError::EmptyPlot("kernel density estimate"));
    }
    let curves: Vec<(&str, &Curve, &str)> = estimates
        .iter()
        .map(|(label, curve, color)| (*label, curve, *color))
        .collect();
    let (x_min, x_max) = bounds(curves.iter().flat_map(|(_, curve, _)| curve.x.iter()))
        .ok_or(PlotError::EmptyPlot("kernel density estimate"))?;
    let y_max = curves
        .iter()
        .flat_map(|(_, curve, _)| curve.y_max())
        .fold(0.0, f64::max)
        .max(f64::EPSILON)
        * 1.1;
    let y_label = if config.cumulative { "Proportion" } else { "Density" };

    let mut chart = build_chart(canvas, area, title, x_min..x_max, 0.0..y_max)?;
    draw_mesh(canvas, &mut chart, (x_label, y_label), None, None)?;
    draw_lines(canvas, &mut chart, &curves, config.fill)?;
    if config.legend {
        draw_legend(canvas, &mut chart)?;
    }
    Ok(())
}

/// Scatter plot with the least squares regression line
///
/// # Arguments
/// * `canvas` - Visual configuration
/// * `area` - Drawing area
/// * `title` - Plot title
/// * `labels` - Axis labels (x, y)
/// * `x` - First variable
/// * `y` - Second variable
///
pub fn draw_regression<DB: DrawingBackend>(
    canvas: &Canvas,
    area: &DrawingArea<DB, Shift>,
    title: &str,
    labels: (&str, &str),
    x: &[f64],
    y: &[f64],
) -> Result<(), PlotError> {
    let (x_min, x_max) = bounds(x.iter()).ok_or(PlotError::EmptyPlot("scatter plot"))?;
    let (y_min, y_max) = bounds(y.iter()).ok_or(PlotError::EmptyPlot("scatter plot"))?;
    let (x_min, x_max) = padded(x_min, x_max);
    let (y_min, y_max) = padded(y_min, y_max);
    let point_color = parse_hex_color(&canvas.colors.blue)?;
    let line_color = parse_hex_color(&canvas.colors.orange)?;

    let mut chart = build_chart(canvas, area, title, x_min..x_max, y_min..y_max)?;
    draw_mesh(canvas, &mut chart, labels, None, None)?;

    let config = &canvas.scatterplot_config;
    chart
        .draw_series(x.iter().zip(y.iter()).map(|(x, y)| {
            Circle::new(
                (*x, *y),
                config.marker_size,
                point_color.mix(config.alpha).filled(),
            )
        }))
        .map_err(drawing_error("scatter points"))?;
    if let Some((slope, intercept)) = linear_fit(x, y) {
        chart
            .draw_series(LineSeries::new(
                [x_min, x_max].map(|x| (x, slope * x + intercept)),
                line_color.stroke_width(canvas.lineplot_config.stroke_width),
            ))
            .map_err(drawing_error("regression line"))?;
    }
    Ok(())
}

/// Quantile-quantile plot with the identity line
///
/// # Arguments
/// * `canvas` - Visual configuration
/// * `area` - Drawing area
/// * `title` - Plot title
/// * `theoretical` - Quantiles of the theoretical distribution
/// * `sample` - Quantiles of the sample at the same probabilities
///
pub fn draw_qq<DB: DrawingBackend>(
    canvas: &Canvas,
    area: &DrawingArea<DB, Shift>,
    title: &str,
    theoretical: &[f64],
    sample: &[f64],
) -> Result<(), PlotError> {
    let (min, max) = bounds(theoretical.iter().chain(sample.iter()))
        .ok_or(PlotError::EmptyPlot("QQ plot"))?;
    let (lower, upper) = padded(min, max);
    let point_color = parse_hex_color(&canvas.colors.blue)?;
    let line_color = parse_hex_color(&canvas.colors.orange)?;

    let mut chart = build_chart(canvas, area, title, lower..upper, lower..upper)?;
    draw_mesh(
        canvas,
        &mut chart,
        ("Theoretical Quantiles", "Sample Quantiles"),
        None,
        None,
    )?;
    let config = &canvas.scatterplot_config;
    chart
        .draw_series(theoretical.iter().zip(sample.iter()).map(|(x, y)| {
            Circle::new(
                (*x, *y),
                config.marker_size,
                point_color.mix(config.alpha).filled(),
            )
        }))
        .map_err(drawing_error("quantiles"))?;
    chart
        .draw_series(LineSeries::new(
            [(min, min), (max, max)],
            line_color.stroke_width(canvas.lineplot_config.stroke_width),
        ))
        .map_err(drawing_error("identity line"))?;
    Ok(())
}

/// Grouped bar chart, one group per category and one bar per series
///
/// # Arguments
/// * `canvas` - Visual configuration
/// * `area` - Drawing area
/// * `title` - Plot title
/// * `y_label` - Label of the value axis
/// * `categories` - Category labels
/// * `series` - Values per category with legend label and hex color
/// * `saturation` - Opacity of the bars
/// * `show_values` - Print each value above its bar
///
pub fn draw_grouped_bars<DB: DrawingBackend>(
    canvas: &Canvas,
    area: &DrawingArea<DB, Shift>,
    title: &str,
    y_label: &str,
    categories: &[String],
    series: &[(&str, &[f64], &str)],
    saturation: f64,
    show_values: bool,
) -> Result<(), PlotError> {
    if categories.is_empty() || series.is_empty() {
        return Err(PlotError::EmptyPlot("bar chart"));
    }
    let y_max = series
        .iter()
        .flat_map(|(_, values, _)| values.iter())
        .copied()
        .fold(0.0, f64::max)
        .max(f64::EPSILON)
        * 1.15;
    let group_width = 0.8 / series.len() as f64;

    let mut chart = build_chart(
        canvas,
        area,
        title,
        category_range(categories.len()),
        0.0..y_max,
    )?;
    draw_mesh(canvas, &mut chart, ("", y_label), Some(categories), None)?;

    for (series_idx, (label, values, color)) in series.iter().enumerate() {
        let style = parse_hex_color(color)?.mix(saturation).filled();
        let offset = -0.4 + series_idx as f64 * group_width;
        chart
            .draw_series(values.iter().enumerate().map(|(idx, value)| {
                let left = idx as f64 + offset;
                Rectangle::new([(left, 0.0), (left + group_width, *value)], style)
            }))
            .map_err(drawing_error("bars"))?
            .label(*label)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], style));
        if show_values {
            chart
                .draw_series(values.iter().enumerate().map(|(idx, value)| {
                    let center = idx as f64 + offset + group_width / 2.0;
                    Text::new(format!("{}", value), (center, *value), canvas.font())
                }))
                .map_err(drawing_error("bar labels"))?;
        }
    }
    if series.len() > 1 {
        draw_legend(canvas, &mut chart)?;
    }
    Ok(())
}

/// Horizontal box plots, one row per group
///
/// # Arguments
/// * `canvas` - Visual configuration
/// * `area` - Drawing area
/// * `title` - Plot title
/// * `x_label` - Label of the value axis
/// * `groups` - Group label, summary and hex color
///
pub fn draw_boxplots<DB: DrawingBackend>(
    canvas: &Canvas,
    area: &DrawingArea<DB, Shift>,
    title: &str,
    x_label: &str,
    groups: &[(&str, &BoxSummary, &str)],
) -> Result<(), PlotError> {
    let config = &canvas.boxplot_config;
    let (x_min, x_max) = bounds(groups.iter().flat_map(|(_, summary, _)| {
        let outliers = if config.show_outliers {
            summary.outliers.as_slice()
        } else {
            &[]
        };
        [&summary.lower_whisker, &summary.upper_whisker]
            .into_iter()
            .chain(outliers.iter())
    }))
    .ok_or(PlotError::EmptyPlot("box plot"))?;
    let (x_min, x_max) = padded(x_min, x_max);
    let categories: Vec<String> = groups.iter().map(|(label, _, _)| label.to_string()).collect();

    let mut chart = build_chart(
        canvas,
        area,
        title,
        x_min..x_max,
        category_range(groups.len()),
    )?;
    draw_mesh(canvas, &mut chart, (x_label, ""), None, Some(&categories))?;

    let half = 0.3;
    for (idx, (_, summary, color)) in groups.iter().enumerate() {
        let color = parse_hex_color(color)?;
        let y = idx as f64;
        let line = BLACK.stroke_width(1);
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(summary.q1, y - half), (summary.q3, y + half)],
                color.mix(config.saturation).filled(),
            )))
            .map_err(drawing_error("box"))?;
        let (bottom, top) = (y - half, y + half);
        let cap = half / 2.0;
        let outline = [
            vec![
                (summary.q1, bottom),
                (summary.q3, bottom),
                (summary.q3, top),
                (summary.q1, top),
                (summary.q1, bottom),
            ],
            vec![(summary.median, bottom), (summary.median, top)],
            vec![(summary.lower_whisker, y), (summary.q1, y)],
            vec![(summary.q3, y), (summary.upper_whisker, y)],
            vec![(summary.lower_whisker, y - cap), (summary.lower_whisker, y + cap)],
            vec![(summary.upper_whisker, y - cap), (summary.upper_whisker, y + cap)],
        ];
        chart
            .draw_series(outline.into_iter().map(|points| PathElement::new(points, line)))
            .map_err(drawing_error("whiskers"))?;
        if config.show_outliers {
            chart
                .draw_series(
                    summary
                        .outliers
                        .iter()
                        .map(|x| Circle::new((*x, y), 3, color.stroke_width(1))),
                )
                .map_err(drawing_error("outliers"))?;
        }
    }
    Ok(())
}

/// Horizontal violin plots, one row per group. Each violin is the mirrored kernel density
/// estimate of its group scaled to the row height, with the quartile range and the median
/// marked inside.
///
/// # Arguments
/// * `canvas` - Visual configuration
/// * `area` - Drawing area
/// * `title` - Plot title
/// * `x_label` - Label of the value axis
/// * `groups` - Group label, sample and hex color
///
pub fn draw_violins<DB: DrawingBackend>(
    canvas: &Canvas,
    area: &DrawingArea<DB, Shift>,
    title: &str,
    x_label: &str,
    groups: &[(&str, &[f64], &str)],
) -> Result<(), PlotError> {
    let bw_adjust = canvas.kdeplot_config.bw_adjust;
    let violins: Vec<(&str, Curve, BoxSummary, &str)> = groups
        .iter()
        .filter_map(|(label, data, color)| {
            let kde = GaussianKde::with_adjust(data, bw_adjust)?;
            let summary = BoxSummary::compute(data, canvas.boxplot_config.whis)?;
            Some((*label, kde.curve(KDE_POINTS, false), summary, *color))
        })
        .collect();
    let (x_min, x_max) = bounds(violins.iter().flat_map(|(_, curve, _, _)| curve.x.iter()))
        .ok_or(PlotError::EmptyPlot("violin plot"))?;
    let categories: Vec<String> = violins.iter().map(|(label, ..)| label.to_string()).collect();

    let mut chart = build_chart(
        canvas,
        area,
        title,
        x_min..x_max,
        category_range(violins.len()),
    )?;
    draw_mesh(canvas, &mut chart, (x_label, ""), None, Some(&categories))?;

    let half = 0.4;
    for (idx, (_, curve, summary, color)) in violins.iter().enumerate() {
        let color = parse_hex_color(color)?;
        let y = idx as f64;
        let scale = half / curve.y_max().unwrap_or(1.0).max(f64::EPSILON);
        let upper: Vec<(f64, f64)> = curve
            .points()
            .map(|(x, density)| (x, y + density * scale))
            .collect();
        let outline: Vec<(f64, f64)> = upper
            .iter()
            .copied()
            .chain(upper.iter().rev().map(|(x, top)| (*x, 2.0 * y - top)))
            .collect();
        chart
            .draw_series(std::iter::once(Polygon::new(
                outline.clone(),
                color.mix(canvas.boxplot_config.saturation).filled(),
            )))
            .map_err(drawing_error("violin"))?;
        let line = BLACK.stroke_width(1);
        let marks = [
            outline,
            vec![(summary.q1, y), (summary.q3, y)],
            vec![(summary.median, y - half / 4.0), (summary.median, y + half / 4.0)],
        ];
        chart
            .draw_series(marks.into_iter().map(|points| PathElement::new(points, line)))
            .map_err(drawing_error("violin outline"))?;
    }
    Ok(())
}

/// Point estimates per category with error bars, neighbouring estimates are joined
/// if the point plot configuration says so.
///
/// # Arguments
/// * `canvas` - Visual configuration
/// * `area` - Drawing area
/// * `title` - Plot title
/// * `labels` - Axis labels (x, y)
/// * `categories` - Category labels
/// * `estimates` - Estimate per category
///
pub fn draw_points<DB: DrawingBackend>(
    canvas: &Canvas,
    area: &DrawingArea<DB, Shift>,
    title: &str,
    labels: (&str, &str),
    categories: &[String],
    estimates: &[PointEstimate],
) -> Result<(), PlotError> {
    let extent: Vec<f64> = estimates
        .iter()
        .flat_map(|estimate| {
            let (lower, upper) = estimate.interval.unwrap_or((estimate.value, estimate.value));
            [estimate.value, lower, upper]
        })
        .collect();
    let (y_min, y_max) = bounds(extent.iter()).ok_or(PlotError::EmptyPlot("point plot"))?;
    let (y_min, y_max) = padded(y_min, y_max);
    let color = parse_hex_color(&canvas.colors.blue)?;

    let mut chart = build_chart(
        canvas,
        area,
        title,
        category_range(categories.len()),
        y_min..y_max,
    )?;
    draw_mesh(canvas, &mut chart, labels, Some(categories), None)?;

    let points = || {
        estimates
            .iter()
            .enumerate()
            .filter(|(_, estimate)| estimate.value.is_finite())
            .map(|(idx, estimate)| (idx as f64, estimate.value))
    };
    if canvas.pointplot_config.join {
        chart
            .draw_series(LineSeries::new(
                points(),
                color.stroke_width(canvas.lineplot_config.stroke_width),
            ))
            .map_err(drawing_error("joining line"))?;
    }
    chart
        .draw_series(estimates.iter().enumerate().filter_map(|(idx, estimate)| {
            let (lower, upper) = estimate.interval?;
            let x = idx as f64;
            Some(PathElement::new(
                vec![(x, lower), (x, upper)],
                color.stroke_width(canvas.lineplot_config.stroke_width),
            ))
        }))
        .map_err(drawing_error("error bars"))?;
    chart
        .draw_series(points().map(|point| Circle::new(point, 4, color.filled())))
        .map_err(drawing_error("estimates"))?;
    Ok(())
}

/// Heat map of a table, cell colors interpolate between the low and high color of the
/// heat map configuration.
///
/// # Arguments
/// * `canvas` - Visual configuration
/// * `area` - Drawing area
/// * `title` - Plot title
/// * `labels` - Axis labels (x, y)
/// * `rows` - Row labels, drawn along the y axis
/// * `columns` - Column labels, drawn along the x axis
/// * `values` - Cell values row by row
///
pub fn draw_heatmap<DB: DrawingBackend>(
    canvas: &Canvas,
    area: &DrawingArea<DB, Shift>,
    title: &str,
    labels: (&str, &str),
    rows: &[String],
    columns: &[String],
    values: &[Vec<f64>],
) -> Result<(), PlotError> {
    let config = &canvas.heatmap_config;
    let (min, max) = bounds(values.iter().flatten()).ok_or(PlotError::EmptyPlot("heat map"))?;
    let vmin = config.vmin.unwrap_or(min);
    let vmax = config.vmax.unwrap_or(max);
    let low = parse_hex_color(&config.low_color)?;
    let high = parse_hex_color(&config.high_color)?;
    let level = |value: f64| {
        if vmax > vmin {
            ((value - vmin) / (vmax - vmin)).clamp(0.0, 1.0)
        } else {
            0.5
        }
    };
    let shade = |value: f64| {
        let t = level(value);
        let channel =
            |from: u8, to: u8| (from as f64 + (to as f64 - from as f64) * t).round() as u8;
        RGBColor(channel(low.0, high.0), channel(low.1, high.1), channel(low.2, high.2))
    };

    let mut chart = build_chart(
        canvas,
        area,
        title,
        category_range(columns.len()),
        category_range(rows.len()),
    )?;
    draw_mesh(canvas, &mut chart, labels, Some(columns), Some(rows))?;

    for (row_idx, row) in values.iter().enumerate() {
        let y = row_idx as f64;
        chart
            .draw_series(row.iter().enumerate().map(|(col_idx, value)| {
                let x = col_idx as f64;
                Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], shade(*value).filled())
            }))
            .map_err(drawing_error("heat map cells"))?;
        if config.annot {
            chart
                .draw_series(row.iter().enumerate().map(|(col_idx, value)| {
                    let color = if level(*value) > 0.5 { WHITE } else { BLACK };
                    Text::new(
                        format!("{}", value),
                        (col_idx as f64, y),
                        canvas.font().color(&color),
                    )
                }))
                .map_err(drawing_error("heat map annotations"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_histogram_density_integrates_to_one() {
        let data = [0.1, 0.2, 0.25, 0.6, 0.9, 1.0];
        let histogram = histogram_density(&data, 0.0, 1.0, 4);
        assert_eq!(histogram.len(), 4);
        let area: f64 = histogram
            .iter()
            .map(|bin| bin.density * (bin.right - bin.left))
            .sum();
        assert!((area - 1.0).abs() < 1e-12);
        // 0.9 and 1.0 share the last bin
        assert!((histogram[3].density - 2.0 / 6.0 / 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_ecdf() {
        let curve = ecdf(&[3.0, 1.0, 2.0, 4.0]);
        assert_eq!(curve.x, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(curve.y, vec![0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_linear_fit() {
        let (slope, intercept) = linear_fit(&[1.0, 2.0, 3.0], &[3.0, 5.0, 7.0]).unwrap();
        assert!((slope - 2.0).abs() < 1e-12);
        assert!((intercept - 1.0).abs() < 1e-12);
        assert!(linear_fit(&[1.0, 1.0], &[1.0, 2.0]).is_none());
    }

    #[test]
    fn test_gaussian_kde() {
        let kde = GaussianKde::new(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!((kde.bandwidth() - 1.145977269).abs() < 1e-8);
        assert!((kde.cdf(3.0) - 0.5).abs() < 1e-12);
        assert!((kde.pdf(2.0) - kde.pdf(4.0)).abs() < 1e-12);

        let step = 0.01;
        let area: f64 = (0..5000).map(|idx| kde.pdf(-22.0 + idx as f64 * step) * step).sum();
        assert!((area - 1.0).abs() < 1e-6);

        let cdf = kde.curve(200, true);
        assert!(cdf.y.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(cdf.y.iter().all(|y| (0.0..=1.0).contains(y)));
        let (lower, upper) = kde.support();
        let (first, last) = cdf.x_range().unwrap();
        assert_eq!(first, lower);
        assert!((last - upper).abs() < 1e-9);

        let wide = GaussianKde::with_adjust(&[1.0, 2.0, 3.0, 4.0, 5.0], 2.0).unwrap();
        assert!((wide.bandwidth() - 2.0 * kde.bandwidth()).abs() < 1e-12);
    }

    #[test]
    fn test_gaussian_kde_degenerate() {
        assert!(GaussianKde::new(&[1.0]).is_none());
        assert!(GaussianKde::new(&[2.0, 2.0, 2.0]).is_none());
        assert!(GaussianKde::new(&[1.0, f64::NAN]).is_none());
        assert!(GaussianKde::with_adjust(&[1.0, 2.0], 0.0).is_none());
    }

    #[test]
    fn test_box_summary() {
        let summary = BoxSummary::compute(&[4.0, 100.0, 1.0, 3.0, 2.0], 1.5).unwrap();
        assert_eq!(summary.q1, 2.0);
        assert_eq!(summary.median, 3.0);
        assert_eq!(summary.q3, 4.0);
        assert_eq!(summary.lower_whisker, 1.0);
        assert_eq!(summary.upper_whisker, 4.0);
        assert_eq!(summary.outliers, vec![100.0]);

        // long whiskers reach every observation
        let summary = BoxSummary::compute(&[4.0, 100.0, 1.0, 3.0, 2.0], 100.0).unwrap();
        assert_eq!(summary.upper_whisker, 100.0);
        assert!(summary.outliers.is_empty());

        assert!(BoxSummary::compute(&[], 1.5).is_none());
    }
}

