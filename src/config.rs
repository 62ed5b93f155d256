use crate::error::PlotError;
use crate::export::OutputFormat;
use crate::style::{AxisLabels, FigureSize, FontSizes, PlotFormat};
use crate::table::{ColumnRef, ValueFormat};
use crate::timeaxis::{TimeSource, TimeWindow};
use crate::DT_FORMAT;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// What every tool needs from its configuration file.
pub trait PlotConfig: DeserializeOwned {
    /// Moves the top-level styling keys of older files into `plot_format`.
    fn resolve(&mut self) -> Result<(), PlotError>;

    fn validate(&self) -> Result<(), PlotError>;

    /// `input_files` takes priority over `input_file`
    fn input_paths(&self) -> Result<Vec<PathBuf>, PlotError>;
}

/// Reads, parses and validates a yaml configuration file.
pub fn load_config<C: PlotConfig>(path: &Path) -> Result<C, PlotError> {
    let contents = std::fs::read_to_string(path).map_err(|e| PlotError::io(path, e))?;
    let config = parse_config(&contents)?;
    debug!("loaded configuration from {}", path.display());
    Ok(config)
}

pub fn parse_config<C: PlotConfig>(yaml: &str) -> Result<C, PlotError> {
    let mut config: C = serde_yaml::from_str(yaml)?;
    config.resolve()?;
    config.validate()?;
    Ok(config)
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_formats() -> Vec<OutputFormat> {
    vec![OutputFormat::Jpeg]
}

fn default_sampling_rate_ms() -> f64 {
    100.
}

fn default_datetime_format() -> String {
    DT_FORMAT.to_string()
}

fn default_value_format() -> ValueFormat {
    ValueFormat::Hex
}

fn default_bins() -> usize {
    30
}

fn default_true() -> bool {
    true
}

fn input_paths(
    input_file: &Option<PathBuf>,
    input_files: &Option<Vec<PathBuf>>,
) -> Result<Vec<PathBuf>, PlotError> {
    match (input_files, input_file) {
        (Some(files), _) if !files.is_empty() => Ok(files.clone()),
        (_, Some(file)) => Ok(vec![file.clone()]),
        _ => Err(PlotError::Config(
            "no input, set input_file or input_files".into(),
        )),
    }
}

/// Styling keys that older configuration files place at the top level.
/// `plot_format` wins where it sets the same thing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopLevelStyle {
    /// `[width, height]` in inches
    pub plot_size: Option<Vec<f64>>,
    pub plot_title: Option<String>,
    pub axis_labels: Option<AxisLabels>,
    pub font_sizes: Option<FontSizes>,
}

impl TopLevelStyle {
    pub fn merge_into(&self, pf: &mut PlotFormat) -> Result<(), PlotError> {
        let defaults = PlotFormat::default();
        if let Some(size) = &self.plot_size {
            let size = match size.as_slice() {
                &[width, height] => FigureSize { width, height },
                _ => {
                    return Err(PlotError::Config(format!(
                        "plot_size needs two values [width, height], got {}",
                        size.len()
                    )))
                }
            };
            merge("plot_size", "size", size, &mut pf.size, &defaults.size);
        }
        if let Some(title) = &self.plot_title {
            merge("plot_title", "plot_title", Some(title.clone()), &mut pf.plot_title, &None);
        }
        if let Some(labels) = &self.axis_labels {
            merge("axis_labels", "axis_labels", labels.clone(), &mut pf.axis_labels, &defaults.axis_labels);
        }
        if let Some(fonts) = self.font_sizes {
            merge("font_sizes", "font_sizes", fonts, &mut pf.font_sizes, &defaults.font_sizes);
        }
        Ok(())
    }
}

fn merge<T: PartialEq>(key: &str, field: &str, value: T, target: &mut T, default: &T) {
    if *target == *default {
        warn!("top-level {} is deprecated, use plot_format.{}", key, field);
        *target = value;
    } else {
        warn!("top-level {} ignored, plot_format.{} is set", key, field);
    }
}

/// Configuration of the single time series plot.
#[derive(Debug, Clone, Deserialize)]
pub struct SingleConfig {
    pub input_file: Option<PathBuf>,
    pub input_files: Option<Vec<PathBuf>>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub header_cleanup: Vec<String>,
    #[serde(default)]
    pub columns_to_plot: Vec<ColumnRef>,
    #[serde(default = "default_formats")]
    pub save_formats: Vec<OutputFormat>,
    #[serde(default = "default_sampling_rate_ms")]
    pub sampling_rate_ms: f64,
    #[serde(default)]
    pub time_source: TimeSource,
    #[serde(default = "default_datetime_format")]
    pub datetime_format: String,
    /// `[start_s, end_s]`, empty or missing for the whole series
    pub time_window: Option<Vec<f64>>,
    #[serde(default)]
    pub show_stats: bool,
    #[serde(default)]
    pub plot_format: PlotFormat,
    #[serde(flatten)]
    pub top_level_style: TopLevelStyle,
}

impl SingleConfig {
    pub fn window(&self) -> Result<Option<TimeWindow>, PlotError> {
        match self.time_window.as_deref() {
            None | Some([]) => Ok(None),
            Some(&[start, end]) => TimeWindow::new(start, end).map(Some),
            Some(other) => Err(PlotError::Config(format!(
                "time_window needs two values [start_s, end_s], got {}",
                other.len()
            ))),
        }
    }
}

impl PlotConfig for SingleConfig {
    fn resolve(&mut self) -> Result<(), PlotError> {
        self.top_level_style.merge_into(&mut self.plot_format)
    }

    fn validate(&self) -> Result<(), PlotError> {
        self.input_paths()?;
        if !(self.sampling_rate_ms.is_finite() && self.sampling_rate_ms > 0.) {
            return Err(PlotError::Config(format!(
                "sampling_rate_ms must be > 0, got {}",
                self.sampling_rate_ms
            )));
        }
        if self.time_source == TimeSource::Datetime && self.datetime_format.trim().is_empty() {
            return Err(PlotError::Config("datetime_format is empty".into()));
        }
        self.window()?;
        self.plot_format.validate()
    }

    fn input_paths(&self) -> Result<Vec<PathBuf>, PlotError> {
        input_paths(&self.input_file, &self.input_files)
    }
}

/// Configuration of the histogram plots.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoConfig {
    pub input_file: Option<PathBuf>,
    pub input_files: Option<Vec<PathBuf>>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub header_cleanup: Vec<String>,
    #[serde(default)]
    pub columns_to_plot: Vec<ColumnRef>,
    #[serde(default = "default_formats")]
    pub save_formats: Vec<OutputFormat>,
    #[serde(default = "default_value_format")]
    pub value_format: ValueFormat,
    #[serde(default = "default_bins")]
    pub bins: usize,
    /// one extra figure per column
    #[serde(default = "default_true")]
    pub separate: bool,
    #[serde(default)]
    pub plot_format: PlotFormat,
    #[serde(flatten)]
    pub top_level_style: TopLevelStyle,
}

impl PlotConfig for HistoConfig {
    fn resolve(&mut self) -> Result<(), PlotError> {
        self.top_level_style.merge_into(&mut self.plot_format)
    }

    fn validate(&self) -> Result<(), PlotError> {
        self.input_paths()?;
        if self.bins == 0 {
            return Err(PlotError::Config("bins must be > 0".into()));
        }
        self.plot_format.validate()
    }

    fn input_paths(&self) -> Result<Vec<PathBuf>, PlotError> {
        input_paths(&self.input_file, &self.input_files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(yaml: &str) -> Result<SingleConfig, PlotError> {
        parse_config(yaml)
    }

    #[test]
    fn single_defaults() {
        let c = single("input_file: input/data.csv\n").unwrap();
        assert_eq!(c.input_paths().unwrap(), vec![PathBuf::from("input/data.csv")]);
        assert_eq!(c.output_dir, PathBuf::from("output"));
        assert_eq!(c.save_formats, vec![OutputFormat::Jpeg]);
        assert_eq!(c.sampling_rate_ms, 100.);
        assert_eq!(c.time_source, TimeSource::Sampled);
        assert!(c.window().unwrap().is_none());
        assert!(!c.show_stats);
    }

    #[test]
    fn single_full() {
        let yaml = r##"
input_file: ignored.csv
input_files: [a.csv, b.csv]
output_dir: out
header_cleanup: ["Ave. (C)", "(C)"]
columns_to_plot: [0, "T3"]
save_formats: [JPEG, pdf]
sampling_rate_ms: 250
time_window: [1, 2.5]
show_stats: true
show_plot: true
plot_format:
  size: {width: 10, height: 6}
  plot_title: Temperatures
  grid:
    major: {color: "#00000000"}
"##;
        let c = single(yaml).unwrap();
        assert_eq!(c.input_paths().unwrap().len(), 2);
        assert_eq!(
            c.columns_to_plot,
            vec![ColumnRef::Index(0), ColumnRef::Name("T3".into())]
        );
        assert_eq!(c.save_formats, vec![OutputFormat::Jpeg, OutputFormat::Pdf]);
        assert_eq!(c.sampling_rate_ms, 250.);
        assert_eq!(c.window().unwrap(), Some(TimeWindow { start: 1., end: 2.5 }));
        assert_eq!(c.plot_format.title_or("x"), "Temperatures");
        assert_eq!(c.plot_format.grid.major.linewidth, 0.8);
    }

    #[test]
    fn invalid_configs() {
        assert!(matches!(single("output_dir: out\n"), Err(PlotError::Config(_))));
        assert!(matches!(
            single("input_file: a.csv\ntime_window: [1]\n"),
            Err(PlotError::Config(_))
        ));
        assert!(matches!(
            single("input_file: a.csv\ntime_window: [3, 1]\n"),
            Err(PlotError::Config(_))
        ));
        assert!(matches!(
            single("input_file: a.csv\nsampling_rate_ms: 0\n"),
            Err(PlotError::Config(_))
        ));
        assert!(matches!(
            single("input_file: a.csv\nsave_formats: [gif]\n"),
            Err(PlotError::Yaml(_))
        ));
        assert!(matches!(single("input_file: [a.csv\n"), Err(PlotError::Yaml(_))));
    }

    #[test]
    fn empty_window_means_everything() {
        let c = single("input_file: a.csv\ntime_window: []\n").unwrap();
        assert!(c.window().unwrap().is_none());
    }

    #[test]
    fn shipped_configs_are_valid() {
        let c = single(include_str!("../configs/single.yaml")).unwrap();
        assert_eq!(c.save_formats, vec![OutputFormat::Jpeg, OutputFormat::Pdf]);
        let h: HistoConfig = parse_config(include_str!("../configs/histo.yaml")).unwrap();
        assert_eq!(h.input_paths().unwrap().len(), 2);
        assert!(h.plot_format.grid.minor.is_hidden());
    }

    #[test]
    fn top_level_style_keys() {
        let c = single(
            "input_file: a.csv\nplot_size: [4, 3]\nplot_title: Mine\nfont_sizes: {title: 40}\naxis_labels: {y: \"Load [kg]\"}\n",
        )
        .unwrap();
        let pf = &c.plot_format;
        assert_eq!(pf.size, FigureSize { width: 4., height: 3. });
        assert_eq!(pf.title_or("CSV Plot"), "Mine");
        assert_eq!(pf.font_sizes.title, 40.);
        assert_eq!(pf.font_sizes.axis, 14.);
        assert_eq!(pf.y_label_or("Value"), "Load [kg]");
        assert_eq!(pf.x_label_or("Time [s]"), "Time [s]");

        let c = single(
            "input_file: a.csv\nplot_title: Old\nplot_format: {plot_title: New}\nplot_size: [4, 3]\n",
        )
        .unwrap();
        assert_eq!(c.plot_format.title_or("x"), "New");
        assert_eq!(c.plot_format.size.width, 4.);

        let h: HistoConfig = parse_config("input_file: adc.csv\nplot_size: [5, 4]\n").unwrap();
        assert_eq!(h.plot_format.pixel_size(), (500, 400));
        assert!(matches!(
            single("input_file: a.csv\nplot_size: [4]\n"),
            Err(PlotError::Config(_))
        ));
    }

    #[test]
    fn histo_defaults() {
        let c: HistoConfig = serde_yaml::from_str("input_files: [adc.csv]\nbins: 12\n").unwrap();
        c.validate().unwrap();
        assert_eq!(c.bins, 12);
        assert_eq!(c.value_format, ValueFormat::Hex);
        assert!(c.separate);
        let c: HistoConfig =
            serde_yaml::from_str("input_file: adc.csv\nbins: 0\nvalue_format: decimal\n").unwrap();
        assert_eq!(c.value_format, ValueFormat::Decimal);
        assert!(c.validate().is_err());
    }
}
