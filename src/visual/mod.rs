/// Visual configuration shared by all plots
pub mod canvas;
/// Histograms, curves, scatter and bar charts
pub mod charts;
/// Sampling distribution of a test statistic with rejection regions
pub mod sampling_plot;

// std imports
use std::fmt::Display;
use std::path::Path;

// 3rd party imports
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::debug;

// internal imports
use crate::errors::plot_error::PlotError;
use canvas::Canvas;

/// Maps a plotting backend error to `PlotError::DrawingError`
///
/// # Arguments
/// * `element` - Element which was drawn when the error occurred
///
pub(crate) fn drawing_error<E: Display>(element: &'static str) -> impl FnOnce(E) -> PlotError {
    move |err| PlotError::DrawingError(element, err.to_string())
}

/// Returns the panel at `idx`
///
pub(crate) fn panel<DB: DrawingBackend>(
    panels: &[DrawingArea<DB, Shift>],
    idx: usize,
) -> Result<&DrawingArea<DB, Shift>, PlotError> {
    panels.get(idx).ok_or(PlotError::EmptyPlot("missing panel"))
}

/// Diagnostic plot of a result.
/// The figure is split into one panel per plot following the canvas grid.
///
pub trait Plot {
    /// Number of panels drawn
    ///
    fn panel_count(&self) -> usize {
        1
    }

    /// Draws each panel
    ///
    /// # Arguments
    /// * `canvas` - Visual configuration
    /// * `panels` - One drawing area per panel
    ///
    fn draw_panels<DB: DrawingBackend>(
        &self,
        canvas: &Canvas,
        panels: &[DrawingArea<DB, Shift>],
    ) -> Result<(), PlotError>;

    /// Draws the plot onto a caller supplied surface
    ///
    /// # Arguments
    /// * `canvas` - Visual configuration
    /// * `area` - Drawing area of the whole figure
    ///
    fn plot<DB: DrawingBackend>(
        &self,
        canvas: &Canvas,
        area: &DrawingArea<DB, Shift>,
    ) -> Result<(), PlotError> {
        let panels = canvas.panels(area, self.panel_count());
        self.draw_panels(canvas, &panels)
    }

    /// Draws the plot into an SVG file sized by the canvas
    ///
    /// # Arguments
    /// * `canvas` - Visual configuration
    /// * `path` - Path of the SVG file
    ///
    fn save_plot(&self, canvas: &Canvas, path: &Path) -> Result<(), PlotError> {
        let grid = canvas.grid(self.panel_count());
        let root = SVGBackend::new(path, (grid.width, grid.height)).into_drawing_area();
        root.fill(&WHITE).map_err(drawing_error("background"))?;
        self.plot(canvas, &root)?;
        root.present().map_err(drawing_error("figure"))?;
        debug!("Plot written to `{}`", path.display());
        Ok(())
    }
}

/// Renders the plot into an SVG document held in memory, sized like [Plot::save_plot]
///
#[cfg(test)]
pub(crate) fn render_svg<P: Plot>(plot: &P, canvas: &Canvas) -> Result<String, PlotError> {
    let grid = canvas.grid(plot.panel_count());
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (grid.width, grid.height)).into_drawing_area();
        root.fill(&WHITE).map_err(drawing_error("background"))?;
        plot.plot(canvas, &root)?;
        root.present().map_err(drawing_error("figure"))?;
    }
    Ok(svg)
}
