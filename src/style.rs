use crate::error::PlotError;
use plotters::style::{Color, RGBAColor, ShapeStyle};
use serde::Deserialize;

/// largest figure side in pixels
pub const MAX_PIXELS: u32 = 20000;

/// Figure size in inches.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FigureSize {
    pub width: f64,
    pub height: f64,
}

impl Default for FigureSize {
    fn default() -> Self {
        FigureSize {
            width: 12.,
            height: 7.5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AxisLabels {
    pub x: Option<String>,
    pub y: Option<String>,
}

/// Font sizes in points.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FontSizes {
    pub title: f64,
    pub legend: f64,
    pub axis: f64,
    pub ticks: f64,
}

impl Default for FontSizes {
    fn default() -> Self {
        FontSizes {
            title: 16.,
            legend: 12.,
            axis: 14.,
            ticks: 12.,
        }
    }
}

/// One level (major or minor) of the background grid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GridLine {
    pub color: String,
    pub linestyle: String,
    pub linewidth: f64,
}

impl GridLine {
    pub fn major() -> GridLine {
        GridLine {
            color: "#B0B0B0".to_string(),
            linestyle: "-".to_string(),
            linewidth: 0.8,
        }
    }

    pub fn minor() -> GridLine {
        GridLine {
            color: "#E5E5E5".to_string(),
            linestyle: ":".to_string(),
            linewidth: 0.5,
        }
    }

    pub fn is_hidden(&self) -> bool {
        let ls = self.linestyle.trim();
        ls.is_empty() || ls.eq_ignore_ascii_case("none") || self.linewidth <= 0.
    }
}

impl Default for GridLine {
    fn default() -> Self {
        GridLine::major()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Grid {
    pub major: GridLine,
    pub minor: GridLine,
}

impl Default for Grid {
    fn default() -> Self {
        Grid {
            major: GridLine::major(),
            minor: GridLine::minor(),
        }
    }
}

/// The `plot_format` section shared by all the tools.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlotFormat {
    pub size: FigureSize,
    pub dpi: u32,
    pub plot_title: Option<String>,
    pub axis_labels: AxisLabels,
    pub font_sizes: FontSizes,
    pub grid: Grid,
}

impl Default for PlotFormat {
    fn default() -> Self {
        PlotFormat {
            size: FigureSize::default(),
            dpi: 100,
            plot_title: None,
            axis_labels: AxisLabels::default(),
            font_sizes: FontSizes::default(),
            grid: Grid::default(),
        }
    }
}

impl PlotFormat {
    pub fn validate(&self) -> Result<(), PlotError> {
        if self.dpi == 0 {
            return Err(PlotError::Config("plot_format.dpi must be > 0".into()));
        }
        if !(self.size.width > 0. && self.size.height > 0.) {
            return Err(PlotError::Config(format!(
                "plot_format.size must be positive, got {} x {}",
                self.size.width, self.size.height
            )));
        }
        let (w, h) = self.pixel_size();
        if w < 64 || h < 64 {
            return Err(PlotError::Config(format!(
                "figure of {} x {} pixels is too small to draw",
                w, h
            )));
        }
        if w > MAX_PIXELS || h > MAX_PIXELS {
            return Err(PlotError::Config(format!(
                "figure of {} x {} pixels is too large, at most {} per side",
                w, h, MAX_PIXELS
            )));
        }
        parse_color(&self.grid.major.color)?;
        parse_color(&self.grid.minor.color)?;
        Ok(())
    }

    /// figure size in pixels
    pub fn pixel_size(&self) -> (u32, u32) {
        let dpi = self.dpi as f64;
        (
            (self.size.width * dpi).round() as u32,
            (self.size.height * dpi).round() as u32,
        )
    }

    /// converts a size in points to pixels
    pub fn px(&self, points: f64) -> f64 {
        points * self.dpi as f64 / 72.
    }

    pub fn title_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.plot_title.as_deref().unwrap_or(default)
    }

    pub fn x_label_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.axis_labels.x.as_deref().unwrap_or(default)
    }

    pub fn y_label_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.axis_labels.y.as_deref().unwrap_or(default)
    }

    /// stroke style of a grid level, None when the level is hidden
    pub fn grid_style(&self, line: &GridLine) -> Result<Option<ShapeStyle>, PlotError> {
        if line.is_hidden() {
            return Ok(None);
        }
        let color = parse_color(&line.color)?;
        if color.3 == 0. {
            return Ok(None);
        }
        let width = self.px(line.linewidth).round().max(1.) as u32;
        Ok(Some(color.stroke_width(width)))
    }
}

/// Parses `#RRGGBB`, `#RRGGBBAA` or a few color names.
pub fn parse_color(s: &str) -> Result<RGBAColor, PlotError> {
    let s = s.trim();
    let named = match s.to_ascii_lowercase().as_str() {
        "black" | "k" => Some(RGBAColor(0, 0, 0, 1.)),
        "white" | "w" => Some(RGBAColor(255, 255, 255, 1.)),
        "red" | "r" => Some(RGBAColor(255, 0, 0, 1.)),
        "green" | "g" => Some(RGBAColor(0, 128, 0, 1.)),
        "blue" | "b" => Some(RGBAColor(0, 0, 255, 1.)),
        "gray" | "grey" => Some(RGBAColor(128, 128, 128, 1.)),
        "lightgray" | "lightgrey" => Some(RGBAColor(211, 211, 211, 1.)),
        "none" | "transparent" => Some(RGBAColor(0, 0, 0, 0.)),
        _ => None,
    };
    if let Some(c) = named {
        return Ok(c);
    }
    let invalid = || PlotError::Config(format!("invalid color '{}'", s));
    let hex = s.strip_prefix('#').ok_or_else(invalid)?;
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    let alpha = if hex.len() == 8 {
        channel(6)? as f64 / 255.
    } else {
        1.
    };
    Ok(RGBAColor(channel(0)?, channel(2)?, channel(4)?, alpha))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors() {
        let c = parse_color("#FF8000").unwrap();
        assert_eq!((c.0, c.1, c.2), (255, 128, 0));
        assert_eq!(c.3, 1.);
        let c = parse_color("#00000000").unwrap();
        assert_eq!(c.3, 0.);
        assert_eq!(parse_color("Grey").unwrap().0, 128);
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("teal").is_err());
    }

    #[test]
    fn transparent_or_none_grid_is_hidden() {
        let mut pf = PlotFormat::default();
        assert!(pf.grid_style(&pf.grid.major).unwrap().is_some());
        pf.grid.major.color = "#00000000".into();
        assert!(pf.grid_style(&pf.grid.major).unwrap().is_none());
        pf.grid.minor.linestyle = "None".into();
        assert!(pf.grid_style(&pf.grid.minor).unwrap().is_none());
    }

    #[test]
    fn sizes_follow_dpi() {
        let pf = PlotFormat::default();
        assert_eq!(pf.pixel_size(), (1200, 750));
        assert!((pf.px(72.) - 100.).abs() < 1e-12);
    }

    #[test]
    fn figure_size_is_bounded() {
        let huge: PlotFormat = serde_yaml::from_str("size: {width: 1.0e9, height: 1.0e9}\n").unwrap();
        assert!(matches!(huge.validate(), Err(PlotError::Config(_))));
        let wide: PlotFormat = serde_yaml::from_str("size: {width: 201, height: 5}\n").unwrap();
        assert!(wide.validate().is_err());
        let tiny = PlotFormat {
            dpi: 5,
            ..PlotFormat::default()
        };
        assert!(tiny.validate().is_err());
        assert!(PlotFormat::default().validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let pf: PlotFormat =
            serde_yaml::from_str("size: {width: 8}\nfont_sizes: {title: 20}\n").unwrap();
        assert_eq!(pf.size.width, 8.);
        assert_eq!(pf.size.height, 7.5);
        assert_eq!(pf.font_sizes.title, 20.);
        assert_eq!(pf.font_sizes.legend, 12.);
        assert_eq!(pf.dpi, 100);
        assert_eq!(pf.title_or("CSV Plot"), "CSV Plot");
    }
}
