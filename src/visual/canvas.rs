// std imports
use std::collections::BTreeMap;
use std::fs::read_to_string;
use std::path::Path;

// 3rd party imports
use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::{DrawingArea, DrawingBackend, RGBColor, SeriesLabelPosition, WHITE};
use plotters::style::{FontDesc, FontFamily, FontStyle};
use serde::{Deserialize, Serialize};

// internal imports
use crate::constants::{DEFAULT_DPI, PLOT_FONT};
use crate::errors::plot_error::PlotError;

/// Named colors as hex strings
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Colors {
    pub cool_black: String,
    pub police_blue: String,
    pub teal_blue: String,
    pub pale_robin_egg_blue: String,
    pub russian_violet: String,
    pub dark_cornflower_blue: String,
    pub meat_brown: String,
    pub peach: String,
    pub dark_blue: String,
    pub blue: String,
    pub orange: String,
    pub crimson: String,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            cool_black: "#002B5B".to_string(),
            police_blue: "#2B4865".to_string(),
            teal_blue: "#256D85".to_string(),
            pale_robin_egg_blue: "#8FE3CF".to_string(),
            russian_violet: "#231955".to_string(),
            dark_cornflower_blue: "#1F4690".to_string(),
            meat_brown: "#E8AA42".to_string(),
            peach: "#FFE5B4".to_string(),
            dark_blue: "#002B5B".to_string(),
            blue: "#1F4690".to_string(),
            orange: "#E8AA42".to_string(),
            crimson: "#BA0020".to_string(),
        }
    }
}

/// Default palettes given as lists of hex colors
///
fn default_palettes(colors: &Colors) -> BTreeMap<String, Vec<String>> {
    let blues: Vec<String> = ["#DBE9F6", "#BAD6EB", "#89BEDC", "#539ECD", "#2B7BBA", "#0B559F"]
        .iter()
        .map(|hex| hex.to_string())
        .collect();
    let mut blues_r = blues.clone();
    blues_r.reverse();
    let colorblind = [
        "#0173B2", "#DE8F05", "#029E73", "#D55E00", "#CC78BC", "#CA9161", "#FBAFE4", "#949494",
        "#ECE133", "#56B4E9",
    ]
    .iter()
    .map(|hex| hex.to_string())
    .collect();
    BTreeMap::from([
        ("Blues".to_string(), blues),
        ("Blues_r".to_string(), blues_r),
        ("colorblind".to_string(), colorblind),
        (
            "winter_blue".to_string(),
            vec![
                colors.cool_black.clone(),
                colors.police_blue.clone(),
                colors.teal_blue.clone(),
                colors.pale_robin_egg_blue.clone(),
            ],
        ),
        (
            "blue_orange".to_string(),
            vec![
                colors.russian_violet.clone(),
                colors.dark_cornflower_blue.clone(),
                colors.meat_brown.clone(),
                colors.peach.clone(),
            ],
        ),
    ])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendConfig {
    /// `best`, `upper right`, `upper left`, `lower left`, `lower right`, `center`,
    /// `center left`, `center right`, `upper center` or `lower center`
    pub loc: String,
    pub fontsize: u32,
    /// Draw a frame and background behind the legend
    pub frameon: bool,
    /// Opacity of the legend background
    pub framealpha: f64,
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self {
            loc: "best".to_string(),
            fontsize: 8,
            frameon: false,
            framealpha: 0.3,
        }
    }
}

impl LegendConfig {
    /// Position of the legend within the plotting area, unknown locations fall back to the upper right corner
    ///
    pub fn position(&self) -> SeriesLabelPosition {
        match self.loc.as_str() {
            "upper left" => SeriesLabelPosition::UpperLeft,
            "lower left" => SeriesLabelPosition::LowerLeft,
            "lower right" => SeriesLabelPosition::LowerRight,
            "center" => SeriesLabelPosition::MiddleMiddle,
            "center left" => SeriesLabelPosition::MiddleLeft,
            "center right" => SeriesLabelPosition::MiddleRight,
            "upper center" => SeriesLabelPosition::UpperMiddle,
            "lower center" => SeriesLabelPosition::LowerMiddle,
            _ => SeriesLabelPosition::UpperRight,
        }
    }
}

/// Normalization of histogram bars
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistStat {
    /// Number of observations per bin
    Count,
    /// Fraction of observations per bin
    Probability,
    Percent,
    /// Fraction of observations divided by bin width
    Density,
}

impl HistStat {
    /// Factor turning a density into the bar height of a bin with the given width
    ///
    /// # Arguments
    /// * `n` - Number of observations
    /// * `width` - Bin width
    ///
    pub fn scale(&self, n: usize, width: f64) -> f64 {
        match self {
            Self::Count => n as f64 * width,
            Self::Probability => width,
            Self::Percent => 100.0 * width,
            Self::Density => 1.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Count => "Count",
            Self::Probability => "Probability",
            Self::Percent => "Percent",
            Self::Density => "Density",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistplotConfig {
    pub stat: HistStat,
    /// Number of bins
    pub bins: usize,
    /// Filled bars, outlines otherwise
    pub fill: bool,
    /// Overlay a kernel density estimate per sample
    pub kde: bool,
    pub legend: bool,
}

impl Default for HistplotConfig {
    fn default() -> Self {
        Self {
            stat: HistStat::Count,
            bins: 20,
            fill: false,
            kde: true,
            legend: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdeplotConfig {
    /// Draw the cumulative distribution of the estimate
    pub cumulative: bool,
    /// Shade the area under each curve
    pub fill: bool,
    /// Factor applied to the bandwidth of Scott's rule
    pub bw_adjust: f64,
    pub legend: bool,
}

impl Default for KdeplotConfig {
    fn default() -> Self {
        Self {
            cumulative: false,
            fill: false,
            bw_adjust: 1.0,
            legend: true,
        }
    }
}

/// Estimator of the central tendency shown by bar and point plots
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Estimator {
    Mean,
    Median,
    Sum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarplotConfig {
    pub estimator: Estimator,
    /// Opacity of the bars
    pub saturation: f64,
}

impl Default for BarplotConfig {
    fn default() -> Self {
        Self {
            estimator: Estimator::Mean,
            saturation: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountplotConfig {
    /// Opacity of the bars
    pub saturation: f64,
    /// Print the count above each bar
    pub show_counts: bool,
}

impl Default for CountplotConfig {
    fn default() -> Self {
        Self {
            saturation: 0.7,
            show_counts: true,
        }
    }
}

/// Error bars of a point plot
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorBar {
    /// 95% confidence interval of the mean
    Ci,
    /// One standard deviation
    Sd,
    /// One standard error of the mean
    Se,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointplotConfig {
    pub estimator: Estimator,
    /// Connect the estimates of neighbouring categories
    pub join: bool,
    pub errorbar: ErrorBar,
}

impl Default for PointplotConfig {
    fn default() -> Self {
        Self {
            estimator: Estimator::Mean,
            join: true,
            errorbar: ErrorBar::Ci,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxplotConfig {
    /// Opacity of the boxes
    pub saturation: f64,
    /// Whisker length as multiple of the interquartile range
    pub whis: f64,
    pub show_outliers: bool,
}

impl Default for BoxplotConfig {
    fn default() -> Self {
        Self {
            saturation: 0.7,
            whis: 1.5,
            show_outliers: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterplotConfig {
    /// Marker radius in pixels
    pub marker_size: u32,
    /// Opacity of the markers
    pub alpha: f64,
}

impl Default for ScatterplotConfig {
    fn default() -> Self {
        Self {
            marker_size: 3,
            alpha: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineplotConfig {
    /// Line width in pixels
    pub stroke_width: u32,
}

impl Default for LineplotConfig {
    fn default() -> Self {
        Self { stroke_width: 2 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapConfig {
    /// Print the value of each cell
    pub annot: bool,
    /// Value mapped to `low_color`, the smallest value if `None`
    pub vmin: Option<f64>,
    /// Value mapped to `high_color`, the largest value if `None`
    pub vmax: Option<f64>,
    pub low_color: String,
    pub high_color: String,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            annot: true,
            vmin: None,
            vmax: None,
            low_color: "#F7FBFF".to_string(),
            high_color: "#08306B".to_string(),
        }
    }
}

/// Layout of a figure with several plots
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasGrid {
    pub nrows: usize,
    pub ncols: usize,
    /// Figure width in pixels
    pub width: u32,
    /// Figure height in pixels
    pub height: u32,
}

/// Figure level configuration shared by all plots.
/// Missing values fall back to the defaults when read from TOML.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Canvas {
    /// Width of the figure in inches
    pub width: u32,
    /// Height of a single row in inches
    pub height: u32,
    /// Pixels per inch
    pub dpi: u32,
    /// Maximum number of plots in a row
    pub maxcols: usize,
    /// Name of the palette in `palettes` used for grouped plots
    pub palette: String,
    /// `whitegrid`, `darkgrid`, `white`, `dark` or `ticks`
    pub style: String,
    /// Opacity of shaded areas
    pub saturation: f64,
    pub fontsize: u32,
    pub fontsize_title: u32,
    pub colors: Colors,
    pub palettes: BTreeMap<String, Vec<String>>,
    pub legend_config: LegendConfig,
    pub histplot_config: HistplotConfig,
    pub kdeplot_config: KdeplotConfig,
    pub heatmap_config: HeatmapConfig,
    pub lineplot_config: LineplotConfig,
    pub scatterplot_config: ScatterplotConfig,
    pub boxplot_config: BoxplotConfig,
    pub pointplot_config: PointplotConfig,
    pub countplot_config: CountplotConfig,
    pub barplot_config: BarplotConfig,
}

impl Default for Canvas {
    fn default() -> Self {
        let colors = Colors::default();
        Self {
            width: 12,
            height: 4,
            dpi: DEFAULT_DPI,
            maxcols: 2,
            palette: "Blues_r".to_string(),
            style: "whitegrid".to_string(),
            saturation: 0.5,
            fontsize: 10,
            fontsize_title: 10,
            palettes: default_palettes(&colors),
            colors,
            legend_config: LegendConfig::default(),
            histplot_config: HistplotConfig::default(),
            kdeplot_config: KdeplotConfig::default(),
            heatmap_config: HeatmapConfig::default(),
            lineplot_config: LineplotConfig::default(),
            scatterplot_config: ScatterplotConfig::default(),
            boxplot_config: BoxplotConfig::default(),
            pointplot_config: PointplotConfig::default(),
            countplot_config: CountplotConfig::default(),
            barplot_config: BarplotConfig::default(),
        }
    }
}

impl Canvas {
    /// Reads a canvas from a TOML file, missing values are taken from the default canvas
    ///
    /// # Arguments
    /// * `path` - Path to the TOML file
    ///
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = read_to_string(path)
            .with_context(|| format!("Reading canvas configuration `{}`", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Parsing canvas configuration `{}`", path.display()))
    }

    /// Returns the canvas as TOML
    ///
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).context("Serializing canvas configuration")
    }

    /// Returns the layout for the given number of plots, one row per `maxcols` plots.
    ///
    /// # Arguments
    /// * `nplots` - Number of plots
    ///
    pub fn grid(&self, nplots: usize) -> CanvasGrid {
        let nplots = nplots.max(1);
        let maxcols = self.maxcols.max(1);
        let nrows = (nplots + maxcols - 1) / maxcols;
        CanvasGrid {
            nrows,
            ncols: nplots.min(maxcols),
            width: self.width * self.dpi,
            height: self.height * self.dpi * nrows as u32,
        }
    }

    /// Splits the drawing area into one panel per plot, row by row.
    ///
    /// # Arguments
    /// * `area` - Drawing area of the figure
    /// * `nplots` - Number of plots
    ///
    pub fn panels<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        nplots: usize,
    ) -> Vec<DrawingArea<DB, Shift>> {
        let grid = self.grid(nplots);
        area.split_evenly((grid.nrows, grid.ncols))
            .into_iter()
            .take(nplots.max(1))
            .collect()
    }

    /// Font for axis labels and annotations
    ///
    pub fn font(&self) -> FontDesc<'static> {
        FontDesc::new(FontFamily::from(PLOT_FONT), self.fontsize as f64, FontStyle::Normal)
    }

    /// Font of legend entries
    ///
    pub fn legend_font(&self) -> FontDesc<'static> {
        FontDesc::new(
            FontFamily::from(PLOT_FONT),
            self.legend_config.fontsize as f64,
            FontStyle::Normal,
        )
    }

    /// Colors of the selected palette
    ///
    pub fn palette_colors(&self) -> Result<Vec<RGBColor>, PlotError> {
        let palette = self
            .palettes
            .get(&self.palette)
            .filter(|colors| !colors.is_empty())
            .ok_or_else(|| PlotError::UnknownPalette(self.palette.clone()))?;
        palette.iter().map(|hex| parse_hex_color(hex)).collect()
    }

    /// Hex color of the `idx`-th group, the palette is repeated if there are more groups than colors
    ///
    pub fn palette_hex(&self, idx: usize) -> Result<&str, PlotError> {
        let colors = self.palette_colors()?;
        let hex = &self.palettes[&self.palette];
        Ok(hex[idx % colors.len()].as_str())
    }

    /// Grid lines are drawn for the `*grid` styles
    ///
    pub fn show_grid(&self) -> bool {
        self.style.ends_with("grid")
    }

    /// Background of the plotting area, grey for the `dark*` styles
    ///
    pub fn background(&self) -> RGBColor {
        if self.style.starts_with("dark") {
            RGBColor(0xEA, 0xEA, 0xF2)
        } else {
            WHITE
        }
    }

    /// Font for plot titles
    ///
    pub fn title_font(&self) -> FontDesc<'static> {
        FontDesc::new(
            FontFamily::from(PLOT_FONT),
            self.fontsize_title as f64,
            FontStyle::Normal,
        )
    }
}

/// Parses a color given as `#RRGGBB`
///
/// # Arguments
/// * `hex` - Hex color
///
pub fn parse_hex_color(hex: &str) -> Result<RGBColor, PlotError> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(PlotError::InvalidColor(hex.to_string()));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16).map_err(|_| PlotError::InvalidColor(hex.to_string()))
    };
    Ok(RGBColor(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_canvas() {
        let canvas = Canvas::default();
        assert_eq!(canvas.width, 12);
        assert_eq!(canvas.height, 4);
        assert_eq!(canvas.maxcols, 2);
        assert_eq!(canvas.palette, "Blues_r");
        assert_eq!(canvas.style, "whitegrid");
        assert_eq!(canvas.saturation, 0.5);
        assert_eq!(canvas.colors.orange, "#E8AA42");
        assert_eq!(canvas.histplot_config.stat, HistStat::Count);
        assert_eq!(canvas.pointplot_config.errorbar, ErrorBar::Ci);
        assert_eq!(canvas.boxplot_config.whis, 1.5);
    }

    #[test]
    fn test_palette_colors() {
        let mut canvas = Canvas::default();
        let blues_r = canvas.palette_colors().unwrap();
        assert_eq!(blues_r.len(), 6);
        assert_eq!(blues_r[0], RGBColor(0x0B, 0x55, 0x9F));
        assert_eq!(parse_hex_color(canvas.palette_hex(7).unwrap()).unwrap(), blues_r[1]);

        canvas.palette = "winter_blue".to_string();
        assert_eq!(canvas.palette_hex(0).unwrap(), "#002B5B");

        canvas.palette = "viridis".to_string();
        assert!(matches!(
            canvas.palette_colors(),
            Err(PlotError::UnknownPalette(name)) if name == "viridis"
        ));
    }

    #[test]
    fn test_style() {
        let mut canvas = Canvas::default();
        assert!(canvas.show_grid());
        assert_eq!(canvas.background(), WHITE);
        canvas.style = "dark".to_string();
        assert!(!canvas.show_grid());
        assert_ne!(canvas.background(), WHITE);
        canvas.style = "darkgrid".to_string();
        assert!(canvas.show_grid());
    }

    #[test]
    fn test_config_from_toml() {
        let canvas: Canvas = toml::from_str(
            "palette = \"colorblind\"\n[histplot_config]\nstat = \"density\"\n[legend_config]\nloc = \"lower left\"\n[pointplot_config]\nestimator = \"median\"\nerrorbar = \"sd\"\n",
        )
        .unwrap();
        assert_eq!(canvas.histplot_config.stat, HistStat::Density);
        assert_eq!(canvas.histplot_config.bins, 20);
        assert_eq!(canvas.legend_config.position(), SeriesLabelPosition::LowerLeft);
        assert_eq!(canvas.pointplot_config.estimator, Estimator::Median);
        assert_eq!(canvas.pointplot_config.errorbar, ErrorBar::Sd);
        assert_eq!(canvas.palette_hex(1).unwrap(), "#DE8F05");
        assert!(toml::from_str::<Canvas>("[histplot_config]\nstat = \"frequency\"\n").is_err());
    }

    #[test]
    fn test_hist_stat_scale() {
        assert_eq!(HistStat::Density.scale(50, 0.5), 1.0);
        assert_eq!(HistStat::Count.scale(50, 0.5), 25.0);
        assert_eq!(HistStat::Probability.scale(50, 0.5), 0.5);
        assert_eq!(HistStat::Percent.scale(50, 0.5), 50.0);
    }

    #[test]
    fn test_toml_round_trip_and_partial_file() {
        let canvas = Canvas::default();
        let toml_str = canvas.to_toml().unwrap();
        let parsed: Canvas = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, canvas);

        let partial: Canvas =
            toml::from_str("maxcols = 3\n[colors]\norange = \"#FF8800\"\n").unwrap();
        assert_eq!(partial.maxcols, 3);
        assert_eq!(partial.colors.orange, "#FF8800");
        assert_eq!(partial.colors.crimson, "#BA0020");
        assert_eq!(partial.width, 12);
    }

    #[test]
    fn test_grid() {
        let canvas = Canvas::default();
        let single = canvas.grid(1);
        assert_eq!((single.nrows, single.ncols), (1, 1));
        assert_eq!((single.width, single.height), (1200, 400));

        let three = canvas.grid(3);
        assert_eq!((three.nrows, three.ncols), (2, 2));
        assert_eq!(three.height, 800);
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#E8AA42").unwrap(), RGBColor(0xE8, 0xAA, 0x42));
        assert_eq!(parse_hex_color("002B5B").unwrap(), RGBColor(0x00, 0x2B, 0x5B));
        assert!(matches!(
            parse_hex_color("#12345"),
            Err(PlotError::InvalidColor(_))
        ));
        assert!(matches!(
            parse_hex_color("#GG0000"),
            Err(PlotError::InvalidColor(_))
        ));
    }
}
