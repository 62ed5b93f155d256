use super::VERSION;
use crate::config::{HistoConfig, PlotConfig};
use crate::error::PlotError;
use crate::export::{file_stem, sanitize, save_figure};
use crate::histogram::{common_range, Histogram};
use crate::render::{HistogramFigure, HistogramSeries};
use crate::stats::ColumnStats;
use crate::table::DataTable;
use clap::{App, Arg};
use log::{error, info, warn};
use std::path::{Path, PathBuf};

const CONFIG_HELP: &str = "CONFIGURATION (yaml):
    input_file:          path to a single csv file, e.g. input/adc.csv
    input_files:         list of csv files, takes priority over input_file
    output_dir:          directory for the figures, default output
    header_cleanup:      substrings removed from the column headers
    columns_to_plot:     column indices (counting from the first column) or names, [] for all
    value_format:        hex (default) or decimal
    bins:                number of histogram bins, default 30
    separate:            also save one figure per column with its statistics, default true
    save_formats:        any of jpeg, pdf, png, svg; default [jpeg], [] to skip saving
    plot_format:
        size:            {width, height} in inches, default 12 x 7.5
        dpi:             pixels per inch, default 100
        plot_title:      title of the figure
        axis_labels:     {x, y}
        font_sizes:      {title, legend, axis, ticks} in points
        grid:            {major, minor} each with color, linestyle and linewidth

The figures are saved as <output_dir>/<csv base name>_all.<format> and,
with separate, as <output_dir>/<csv base name>_<column>.<format>";

pub fn cli_app() -> App<'static, 'static> {
    let arg_config = Arg::with_name("config")
        .help("yaml configuration file")
        .required(true)
        .index(1);
    App::new("csvplot_histo")
        .version(VERSION.unwrap_or("unknown"))
        .author("Luca Peruzzo")
        .about("cli app to plot the histograms of csv columns")
        .after_help(CONFIG_HELP)
        .arg(arg_config)
}

/// Takes the path of the yaml configuration from the CLI arguments.
pub fn parse_cli() -> PathBuf {
    let cli_args = cli_app().get_matches();
    PathBuf::from(cli_args.value_of("config").unwrap_or_default())
}

/// The overlay of all the columns, named `all`,
/// followed by one figure per column when `separate` is set.
/// Each figure comes with the suffix of its file name.
pub fn histogram_figures(
    config: &HistoConfig,
    table: &DataTable,
) -> Result<Vec<(String, HistogramFigure)>, PlotError> {
    let columns = table.resolve_columns(&config.columns_to_plot, 0)?;
    let values: Vec<Vec<f64>> = columns
        .iter()
        .map(|&c| table.numeric_column(c, config.value_format))
        .collect();
    let slices: Vec<&[f64]> = values.iter().map(|v| v.as_slice()).collect();
    let range = common_range(&slices)
        .ok_or_else(|| PlotError::NoData("no valid values in the selected columns".into()))?;

    let pf = &config.plot_format;
    let title = pf.title_or("Histogram");
    let x_label = pf.x_label_or("Integer [LSB]").to_string();
    let y_label = pf.y_label_or("Frequency [#]").to_string();

    let stats: Vec<Option<ColumnStats>> = values.iter().map(|v| ColumnStats::from_values(v)).collect();
    for (&c, s) in columns.iter().zip(stats.iter()) {
        match s {
            Some(s) => info!("{}: {}", table.headers[c], s),
            None => warn!("{}: no valid values", table.headers[c]),
        }
    }

    let overlay = HistogramFigure {
        title: title.to_string(),
        x_label: x_label.clone(),
        y_label: y_label.clone(),
        series: columns
            .iter()
            .zip(values.iter())
            .zip(stats.iter())
            .map(|((&c, v), s)| HistogramSeries {
                label: table.headers[c].clone(),
                histogram: Histogram::with_range(v, config.bins, range),
                stats: *s,
            })
            .collect(),
        alpha: 0.6,
        markers: false,
    };
    let mut figures = vec![("all".to_string(), overlay)];
    if !config.separate {
        return Ok(figures);
    }

    for ((&c, v), s) in columns.iter().zip(values.iter()).zip(stats.iter()) {
        let (histogram, stats) = match (Histogram::new(v, config.bins), s) {
            (Some(h), Some(s)) => (h, *s),
            _ => continue,
        };
        let column = &table.headers[c];
        let base = sanitize(column);
        let mut suffix = base.clone();
        let mut n = 0;
        while suffix == "all" || figures.iter().any(|(s, _)| *s == suffix) {
            suffix = match n {
                0 => format!("{}_{}", base, c),
                _ => format!("{}_{}_{}", base, c, n),
            };
            n += 1;
        }
        let figure = HistogramFigure {
            title: format!("{} of {}", title, column),
            x_label: x_label.clone(),
            y_label: y_label.clone(),
            series: vec![HistogramSeries {
                label: format!("{} ({})", column, stats),
                histogram,
                stats: Some(stats),
            }],
            alpha: 0.75,
            markers: true,
        };
        figures.push((suffix, figure));
    }
    Ok(figures)
}

/// Plots the histograms of one csv file, returning the written figures.
pub fn plot_file(config: &HistoConfig, csvin: &Path) -> Result<Vec<PathBuf>, PlotError> {
    info!("processing {}", csvin.display());
    let table = DataTable::from_csv(csvin, &config.header_cleanup)?;
    let stem = file_stem(csvin);
    let mut written: Vec<PathBuf> = Vec::new();
    for (suffix, figure) in histogram_figures(config, &table)? {
        let mut paths = save_figure(
            &figure,
            &config.plot_format,
            &config.output_dir,
            &format!("{}_{}", stem, suffix),
            &config.save_formats,
        )?;
        written.append(&mut paths);
    }
    Ok(written)
}

/// Plots every input file, going on after a failed one.
pub fn run(config: &HistoConfig) -> Result<Vec<PathBuf>, PlotError> {
    let inputs = config.input_paths()?;
    let mut written: Vec<PathBuf> = Vec::new();
    let mut errors: Vec<PlotError> = Vec::new();
    for csvin in inputs.iter() {
        match plot_file(config, csvin) {
            Ok(mut paths) => written.append(&mut paths),
            Err(e) => {
                error!("{}: {}", csvin.display(), e);
                errors.push(e);
            }
        }
    }
    match (errors.len(), inputs.len()) {
        (0, _) => Ok(written),
        (1, 1) => Err(errors.remove(0)),
        (failed, total) => Err(PlotError::Failed { failed, total }),
    }
}
