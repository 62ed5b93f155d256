use plotters::drawing::DrawingAreaErrorKind;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while turning a csv file into a figure.
#[derive(Debug, Error)]
pub enum PlotError {
    #[error("could not access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed yaml configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("could not read csv {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("unknown column '{name}', available columns: {available}")]
    UnknownColumn { name: String, available: String },
    #[error("column index {index} out of range, {count} data columns available")]
    ColumnIndexOutOfRange { index: usize, count: usize },
    #[error("could not parse time '{value}' at row {row}: {reason}")]
    TimeParse {
        row: usize,
        value: String,
        reason: String,
    },
    #[error("time window [{start}, {end}) selects no rows")]
    EmptyWindow { start: f64, end: f64 },
    #[error("no data to plot: {0}")]
    NoData(String),
    #[error("{failed} of {total} input files could not be plotted")]
    Failed { failed: usize, total: usize },
    #[error("drawing failed: {0}")]
    Render(String),
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("pdf generation failed: {0}")]
    Pdf(#[from] lopdf::Error),
}

impl PlotError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> PlotError {
        PlotError::Io {
            path: path.into(),
            source,
        }
    }
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for PlotError {
    fn from(e: DrawingAreaErrorKind<E>) -> PlotError {
        PlotError::Render(e.to_string())
    }
}
