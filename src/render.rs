use crate::error::PlotError;
use crate::histogram::Histogram;
use crate::min_and_max;
use crate::stats::ColumnStats;
use crate::style::PlotFormat;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontDesc;
use std::ops::Range;

/// Something that can be drawn on any plotters backend.
pub trait Figure {
    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        style: &PlotFormat,
    ) -> Result<(), PlotError>;
}

type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// One line of a time series plot.
#[derive(Debug, Clone)]
pub struct Series {
    pub label: String,
    pub values: Vec<f64>,
}

/// Time series plot, all the series share the time axis.
#[derive(Debug, Clone)]
pub struct LineFigure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub time: Vec<f64>,
    pub series: Vec<Series>,
}

/// One column of a histogram plot.
#[derive(Debug, Clone)]
pub struct HistogramSeries {
    pub label: String,
    pub histogram: Histogram,
    pub stats: Option<ColumnStats>,
}

/// Histogram plot, several series are overlaid with transparency.
#[derive(Debug, Clone)]
pub struct HistogramFigure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<HistogramSeries>,
    pub alpha: f64,
    /// vertical lines at the mean and at mean +- std
    pub markers: bool,
}

/// contiguous index ranges without NAN values
pub fn finite_runs(values: &[f64]) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;
    for (i, v) in values.iter().enumerate() {
        match (v.is_nan(), start) {
            (false, None) => start = Some(i),
            (true, Some(s)) => {
                runs.push(s..i);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(s..values.len());
    }
    runs
}

/// adds a tenth of the span on both sides, a unit margin for flat data
pub fn padded(lo: f64, hi: f64) -> (f64, f64) {
    let span = hi - lo;
    if span > 0. {
        (lo - span / 10., hi + span / 10.)
    } else {
        let d = if lo == 0. { 1. } else { lo.abs() / 10. };
        (lo - d, hi + d)
    }
}

fn font(style: &PlotFormat, points: f64) -> FontDesc<'static> {
    ("sans-serif", style.px(points)).into_font()
}

fn series_color(i: usize) -> RGBAColor {
    Palette99::pick(i).to_rgba()
}

fn build_chart<'a, DB: DrawingBackend>(
    root: &'a DrawingArea<DB, Shift>,
    style: &PlotFormat,
    title: &str,
    x: Range<f64>,
    y: Range<f64>,
) -> Result<Chart<'a, DB>, PlotError> {
    let fonts = &style.font_sizes;
    let x_area = (style.px(fonts.ticks) + style.px(fonts.axis)) * 1.8;
    let y_area = style.px(fonts.ticks) * 4. + style.px(fonts.axis) * 1.8;
    root.fill(&WHITE)?;
    let chart = ChartBuilder::on(root)
        .margin(20)
        .caption(title, font(style, fonts.title))
        .x_label_area_size(x_area as u32)
        .y_label_area_size(y_area as u32)
        .build_cartesian_2d(x, y)?;
    Ok(chart)
}

fn draw_mesh<'a, DB: DrawingBackend + 'a>(
    chart: &mut Chart<'a, DB>,
    style: &PlotFormat,
    x_desc: &str,
    y_desc: &str,
) -> Result<(), PlotError> {
    let hidden = TRANSPARENT.stroke_width(1);
    let major = style.grid_style(&style.grid.major)?.unwrap_or(hidden);
    let minor = style.grid_style(&style.grid.minor)?.unwrap_or(hidden);
    chart
        .configure_mesh()
        .bold_line_style(major)
        .light_line_style(minor)
        .max_light_lines(4)
        .set_all_tick_mark_size(4)
        .x_labels(12)
        .y_labels(10)
        .label_style(font(style, style.font_sizes.ticks))
        .axis_desc_style(font(style, style.font_sizes.axis))
        .x_desc(x_desc)
        .y_desc(y_desc)
        .draw()?;
    Ok(())
}

fn draw_legend<'a, DB: DrawingBackend + 'a>(
    chart: &mut Chart<'a, DB>,
    style: &PlotFormat,
) -> Result<(), PlotError> {
    chart
        .configure_series_labels()
        .label_font(font(style, style.font_sizes.legend))
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;
    Ok(())
}

impl Figure for LineFigure {
    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        style: &PlotFormat,
    ) -> Result<(), PlotError> {
        let (xmin, xmax) = min_and_max(&self.time)
            .ok_or_else(|| PlotError::NoData("empty time axis".into()))?;
        let (xmin, xmax) = if xmin < xmax {
            (xmin, xmax)
        } else {
            (xmin - 0.5, xmax + 0.5)
        };
        let finite: Vec<f64> = self
            .series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .filter(|v| v.is_finite())
            .collect();
        let (ymin, ymax) = min_and_max(&finite)
            .ok_or_else(|| PlotError::NoData("no valid values in the selected columns".into()))?;
        let (ymin, ymax) = padded(ymin, ymax);

        let mut chart = build_chart(root, style, &self.title, xmin..xmax, ymin..ymax)?;
        draw_mesh(&mut chart, style, &self.x_label, &self.y_label)?;

        for (i, s) in self.series.iter().enumerate() {
            let line = series_color(i).stroke_width(2);
            let mut labelled = false;
            for run in finite_runs(&s.values) {
                let points = self.time[run.clone()]
                    .iter()
                    .copied()
                    .zip(s.values[run].iter().copied());
                let anno = chart.draw_series(LineSeries::new(points, line))?;
                if !labelled {
                    anno.label(s.label.as_str()).legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], line)
                    });
                    labelled = true;
                }
            }
        }
        draw_legend(&mut chart, style)?;
        Ok(())
    }
}

impl Figure for HistogramFigure {
    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        style: &PlotFormat,
    ) -> Result<(), PlotError> {
        let edges: Vec<f64> = self
            .series
            .iter()
            .flat_map(|s| {
                let (lo, hi) = s.histogram.range();
                vec![lo, hi]
            })
            .collect();
        let (xmin, xmax) =
            min_and_max(&edges).ok_or_else(|| PlotError::NoData("no histogram to draw".into()))?;
        let top = self
            .series
            .iter()
            .map(|s| s.histogram.max_count())
            .max()
            .unwrap_or(0)
            .max(1) as f64
            * 1.1;

        let mut chart = build_chart(root, style, &self.title, xmin..xmax, 0f64..top)?;
        draw_mesh(&mut chart, style, &self.x_label, &self.y_label)?;

        for (i, s) in self.series.iter().enumerate() {
            let color = series_color(i);
            let fill = color.mix(self.alpha).filled();
            chart
                .draw_series(
                    s.histogram
                        .bars()
                        .map(|(x0, x1, c)| Rectangle::new([(x0, 0.), (x1, c as f64)], fill)),
                )?
                .label(s.label.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], fill));
            chart.draw_series(
                s.histogram
                    .bars()
                    .filter(|&(_, _, c)| c > 0)
                    .map(|(x0, x1, c)| {
                        Rectangle::new([(x0, 0.), (x1, c as f64)], BLACK.stroke_width(1))
                    }),
            )?;

            let stats = match (self.markers, s.stats) {
                (true, Some(stats)) => stats,
                _ => continue,
            };
            let mean_style = RED.stroke_width(2);
            chart
                .draw_series(LineSeries::new(
                    vec![(stats.mean, 0.), (stats.mean, top)],
                    mean_style,
                ))?
                .label(format!("Mean: {:.2}", stats.mean))
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], mean_style));
            if stats.std.is_finite() {
                let std_style = GREEN.stroke_width(2);
                for (k, sign) in [1., -1.].iter().enumerate() {
                    let at = stats.mean + sign * stats.std;
                    let anno = chart
                        .draw_series(LineSeries::new(vec![(at, 0.), (at, top)], std_style))?;
                    if k == 0 {
                        anno.label(format!("+-1 Std: {:.2}", stats.std)).legend(move |(x, y)| {
                            PathElement::new(vec![(x, y), (x + 20, y)], std_style)
                        });
                    }
                }
            }
        }
        draw_legend(&mut chart, style)?;
        Ok(())
    }
}
