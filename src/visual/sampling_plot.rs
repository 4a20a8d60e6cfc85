// 3rd party imports
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::debug;

// internal imports
use super::canvas::{parse_hex_color, Canvas};
use super::drawing_error;
use crate::data::generation::Curve;
use crate::errors::plot_error::PlotError;

/// Annotated point on the density curve
///
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub x: f64,
    pub y: f64,
    pub label: String,
}

/// Geometry of a sampling distribution plot: the theoretical density of the test statistic,
/// shaded rejection regions with their critical values and the observed statistic.
///
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingDistributionPlot {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub curve: Curve,
    pub reject_regions: Vec<Curve>,
    pub critical_values: Vec<Annotation>,
    /// `None` if the statistic lies beyond the plotted domain
    pub observed: Option<Annotation>,
}

impl SamplingDistributionPlot {
    /// Samples the density on `points` evenly spaced values between `lower` and `upper`
    ///
    /// # Arguments
    /// * `title` - Plot title
    /// * `x_label` - Label of the x axis
    /// * `y_label` - Label of the y axis
    /// * `pdf` - Density of the test statistic
    /// * `lower` - Lower end of the plotted domain
    /// * `upper` - Upper end of the plotted domain
    /// * `points` - Number of points
    ///
    pub fn new<F: Fn(f64) -> f64>(
        title: &str,
        x_label: &str,
        y_label: &str,
        pdf: F,
        lower: f64,
        upper: f64,
        points: usize,
    ) -> Self {
        Self {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            curve: Curve::sample(pdf, lower, upper, points),
            reject_regions: Vec::new(),
            critical_values: Vec::new(),
            observed: None,
        }
    }

    /// Curve points within `[from, to]`, including the interpolated boundaries
    ///
    fn region(&self, from: f64, to: f64) -> Curve {
        let mut region = Curve::default();
        if let Some(y) = self.curve.interpolate(from) {
            region.x.push(from);
            region.y.push(y);
        }
        for (x, y) in self.curve.points() {
            if x > from && x < to {
                region.x.push(x);
                region.y.push(y);
            }
        }
        if let Some(y) = self.curve.interpolate(to) {
            region.x.push(to);
            region.y.push(y);
        }
        region
    }

    fn add_critical_value(&mut self, critical: f64) {
        self.critical_values.push(Annotation {
            x: critical,
            y: 0.0,
            label: "Critical Value".to_string(),
        });
    }

    /// Shades the region right of the critical value
    ///
    pub fn with_upper_tail(mut self, critical: f64) -> Self {
        if let Some((_, upper)) = self.curve.x_range() {
            let region = self.region(critical, upper);
            self.reject_regions.push(region);
        }
        self.add_critical_value(critical);
        self
    }

    /// Shades the region left of the critical value
    ///
    pub fn with_lower_tail(mut self, critical: f64) -> Self {
        if let Some((lower, _)) = self.curve.x_range() {
            let region = self.region(lower, critical);
            self.reject_regions.push(region);
        }
        self.add_critical_value(critical);
        self
    }

    /// Marks the statistic at the first plotted point greater than its value.
    /// Without such a point the marker is omitted.
    ///
    /// # Arguments
    /// * `value` - Observed test statistic
    /// * `label` - Annotation text
    ///
    pub fn locate_statistic(mut self, value: f64, label: &str) -> Self {
        self.observed = self
            .curve
            .points()
            .find(|(x, _)| *x > value)
            .map(|(x, y)| Annotation {
                x,
                y,
                label: label.to_string(),
            });
        if self.observed.is_none() {
            debug!("Statistic {} lies beyond the plotted domain", value);
        }
        self
    }

    /// Draws the plot on the area
    ///
    /// # Arguments
    /// * `canvas` - Visual configuration
    /// * `area` - Drawing area
    ///
    pub fn draw<DB: DrawingBackend>(
        &self,
        canvas: &Canvas,
        area: &DrawingArea<DB, Shift>,
    ) -> Result<(), PlotError> {
        let (x_min, x_max) = self
            .curve
            .x_range()
            .ok_or(PlotError::EmptyPlot("sampling distribution"))?;
        let y_max = self.curve.y_max().unwrap_or(1.0).max(f64::EPSILON) * 1.15;
        let line_color = parse_hex_color(&canvas.colors.dark_blue)?;
        let region_color = parse_hex_color(&canvas.colors.orange)?;
        let marker_color = parse_hex_color(&canvas.colors.crimson)?;

        let mut chart = ChartBuilder::on(area)
            .caption(&self.title, canvas.title_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(x_min..x_max, 0.0..y_max)
            .map_err(drawing_error("chart"))?;
        chart
            .configure_mesh()
            .x_desc(self.x_label.as_str())
            .y_desc(self.y_label.as_str())
            .label_style(canvas.font())
            .draw()
            .map_err(drawing_error("mesh"))?;

        for region in self.reject_regions.iter() {
            chart
                .draw_series(AreaSeries::new(
                    region.points(),
                    0.0,
                    region_color.mix(canvas.saturation),
                ))
                .map_err(drawing_error("rejection region"))?;
        }
        chart
            .draw_series(LineSeries::new(
                self.curve.points(),
                line_color.stroke_width(canvas.lineplot_config.stroke_width),
            ))
            .map_err(drawing_error("density curve"))?;

        let text_offset = (canvas.fontsize * 2) as i32;
        for critical in self.critical_values.iter() {
            chart
                .draw_series(std::iter::once(
                    EmptyElement::at((critical.x, critical.y))
                        + TriangleMarker::new((0, 0), 5, marker_color.filled())
                        + Text::new(critical.label.clone(), (0, -text_offset), canvas.font()),
                ))
                .map_err(drawing_error("critical value"))?;
        }
        if let Some(observed) = &self.observed {
            chart
                .draw_series(std::iter::once(
                    EmptyElement::at((observed.x, observed.y))
                        + Circle::new((0, 0), 5, line_color.filled())
                        + Text::new(observed.label.clone(), (5, -text_offset), canvas.font()),
                ))
                .map_err(drawing_error("observed statistic"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use statrs::distribution::{ChiSquared, Continuous, ContinuousCDF};

    use super::*;

    fn chi_square_plot() -> SamplingDistributionPlot {
        let dist = ChiSquared::new(3.0).unwrap();
        SamplingDistributionPlot::new(
            "X² Test",
            "X²",
            "Probability Density",
            |x| dist.pdf(x),
            dist.inverse_cdf(0.01),
            dist.inverse_cdf(0.99),
            100,
        )
        .with_upper_tail(dist.inverse_cdf(0.95))
    }

    #[test]
    fn test_statistic_within_domain() {
        let plot = chi_square_plot().locate_statistic(5.0, "X² = 5.0000");
        let observed = plot.observed.unwrap();
        assert!(observed.x > 5.0);
        assert!(plot.curve.x.iter().filter(|x| **x > 5.0).all(|x| *x >= observed.x));
        assert!(observed.y > 0.0);
    }

    #[test]
    fn test_statistic_beyond_domain() {
        let plot = chi_square_plot().locate_statistic(1000.0, "X² = 1000.0000");
        assert!(plot.observed.is_none());
        assert_eq!(plot.critical_values.len(), 1);
        assert_eq!(plot.reject_regions.len(), 1);
    }

    #[test]
    fn test_rejection_region_bounds() {
        let dist = ChiSquared::new(3.0).unwrap();
        let critical = dist.inverse_cdf(0.95);
        let plot = chi_square_plot();
        let region = &plot.reject_regions[0];
        assert_eq!(region.x[0], critical);
        assert_eq!(region.x.last().copied(), plot.curve.x.last().copied());
        assert!(region.x.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(plot.critical_values[0].x, critical);
    }

    #[test]
    fn test_two_tails() {
        let density = |x: f64| (-x * x / 2.0).exp();
        let plot = SamplingDistributionPlot::new("t", "t", "Density", density, -3.0, 3.0, 61)
            .with_lower_tail(-2.0)
            .with_upper_tail(2.0);
        assert_eq!(plot.reject_regions.len(), 2);
        assert!(plot.reject_regions[0].x.iter().all(|x| *x <= -2.0));
        assert!(plot.reject_regions[1].x.iter().all(|x| *x >= 2.0));
        assert_eq!(plot.critical_values.len(), 2);
    }

    fn render(plot: &SamplingDistributionPlot) -> Result<String, PlotError> {
        let mut svg = String::new();
        {
            let area = SVGBackend::with_string(&mut svg, (640, 480)).into_drawing_area();
            plot.draw(&Canvas::default(), &area)?;
            area.present().map_err(drawing_error("svg"))?;
        }
        Ok(svg)
    }

    #[test]
    fn test_draw() {
        let svg = render(&chi_square_plot().locate_statistic(5.0, "X² = 5.0000")).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Critical Value"));
        assert!(svg.contains("X² = 5.0000"));
        assert!(svg.contains("Probability Density"));

        let svg = render(&chi_square_plot().locate_statistic(1000.0, "X² = 1000.0000")).unwrap();
        assert!(svg.contains("Critical Value"));
        assert!(!svg.contains("X² = 1000.0000"));
    }

    #[test]
    fn test_draw_empty_curve() {
        let plot = SamplingDistributionPlot::new("empty", "x", "y", |x| x, 0.0, 1.0, 0);
        assert!(matches!(render(&plot), Err(PlotError::EmptyPlot(_))));
    }
}

