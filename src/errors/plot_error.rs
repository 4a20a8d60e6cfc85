use statrs::StatsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlotError {
    /// Drawing error of the plotting backend, with a hint to the element being drawn
    #[error("Unable to draw {0}:\n\t{1}")]
    DrawingError(&'static str, String),
    #[error("Invalid color `{0}`")]
    InvalidColor(String),
    #[error("Palette `{0}` is not defined or empty")]
    UnknownPalette(String),
    #[error("Nothing to plot: {0}")]
    EmptyPlot(&'static str),
    #[error("Invalid sampling distribution:\n\t{0}")]
    DistributionError(#[from] StatsError),
}
