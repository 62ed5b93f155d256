use super::VERSION;
use crate::config::{PlotConfig, SingleConfig};
use crate::error::PlotError;
use crate::export::{file_stem, save_figure};
use crate::render::{LineFigure, Series};
use crate::stats::ColumnStats;
use crate::table::{DataTable, ValueFormat};
use crate::timeaxis::{build_time_axis, select_window};
use clap::{App, Arg};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};

const CONFIG_HELP: &str = "CONFIGURATION (yaml):
    input_file:          path to a single csv file, e.g. input/data.csv
    input_files:         list of csv files, takes priority over input_file
    output_dir:          directory for the figures, default output
    header_cleanup:      substrings removed from the column headers, e.g. [\"Ave. (C)\", \"(C)\"]
    columns_to_plot:     column indices (the first column is not counted) or names, [] for all
    sampling_rate_ms:    sampling interval in milliseconds, default 100
    time_source:         sampled (default), seconds or datetime; the time of each row
    datetime_format:     format of the datetime column, default %Y-%m-%d %H:%M:%S
    time_window:         [start_s, end_s] to plot, [] or omitted for the whole series
    show_stats:          add mean, min, max and delta of each column to the legend
    save_formats:        any of jpeg, pdf, png, svg; default [jpeg], [] to skip saving
    plot_format:
        size:            {width, height} in inches, default 12 x 7.5
        dpi:             pixels per inch, default 100
        plot_title:      title of the figure
        axis_labels:     {x, y}
        font_sizes:      {title, legend, axis, ticks} in points
        grid:            {major, minor} each with color, linestyle and linewidth

The figures are saved as <output_dir>/<csv base name>.<format>";

pub fn cli_app() -> App<'static, 'static> {
    let arg_config = Arg::with_name("config")
        .help("yaml configuration file")
        .required(true)
        .index(1);
    App::new("csvplot_single")
        .version(VERSION.unwrap_or("unknown"))
        .author("Luca Peruzzo")
        .about("cli app to plot csv columns as time series")
        .after_help(CONFIG_HELP)
        .arg(arg_config)
}

/// Takes the path of the yaml configuration from the CLI arguments.
pub fn parse_cli() -> PathBuf {
    let cli_args = cli_app().get_matches();
    PathBuf::from(cli_args.value_of("config").unwrap_or_default())
}

/// Selects, windows and labels the columns of the table.
pub fn line_figure(config: &SingleConfig, table: &DataTable) -> Result<LineFigure, PlotError> {
    let columns = table.resolve_columns(&config.columns_to_plot, 1)?;
    if columns.is_empty() {
        return Err(PlotError::NoData(
            "no data columns besides the first (time) column".into(),
        ));
    }
    let time = build_time_axis(
        table,
        config.time_source,
        config.sampling_rate_ms,
        &config.datetime_format,
    )?;
    let rows = select_window(&time, config.window()?)?;
    debug!(
        "plotting rows {} to {} of {}",
        rows[0],
        rows[rows.len() - 1],
        time.len()
    );

    let series = columns
        .iter()
        .map(|&c| {
            let values = table.numeric_column(c, ValueFormat::Decimal);
            let windowed: Vec<f64> = rows.iter().map(|&r| values[r]).collect();
            let mut label = table.headers[c].clone();
            if config.show_stats {
                match ColumnStats::from_values(&windowed) {
                    Some(stats) => {
                        info!("{}: {}", label, stats);
                        label = format!("{} ({})", label, stats.summary());
                    }
                    None => warn!("{}: no valid values for the statistics", label),
                }
            }
            Series {
                label,
                values: windowed,
            }
        })
        .collect();

    let pf = &config.plot_format;
    Ok(LineFigure {
        title: pf.title_or("CSV Plot").to_string(),
        x_label: pf.x_label_or("Time [s]").to_string(),
        y_label: pf.y_label_or("Value").to_string(),
        time: rows.iter().map(|&r| time[r]).collect(),
        series,
    })
}

/// Plots one csv file, returning the written figures.
pub fn plot_file(config: &SingleConfig, csvin: &Path) -> Result<Vec<PathBuf>, PlotError> {
    info!("processing {}", csvin.display());
    let table = DataTable::from_csv(csvin, &config.header_cleanup)?;
    let figure = line_figure(config, &table)?;
    save_figure(
        &figure,
        &config.plot_format,
        &config.output_dir,
        &file_stem(csvin),
        &config.save_formats,
    )
}

/// Plots every input file, going on after a failed one.
pub fn run(config: &SingleConfig) -> Result<Vec<PathBuf>, PlotError> {
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
