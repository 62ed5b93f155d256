use crate::error::PlotError;
use crate::render::Figure;
use crate::style::PlotFormat;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use log::{info, warn};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use plotters::prelude::*;
use serde::Deserialize;
use std::convert::TryFrom;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub const JPEG_QUALITY: u8 = 90;

/// File formats a figure can be saved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum OutputFormat {
    Jpeg,
    Png,
    Pdf,
    Svg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Svg => "svg",
        }
    }

    /// formats written from the rendered bitmap
    pub fn is_raster(&self) -> bool {
        !matches!(self, OutputFormat::Svg)
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "pdf" => Ok(OutputFormat::Pdf),
            "svg" => Ok(OutputFormat::Svg),
            _ => Err(format!(
                "unsupported save format '{}', expected jpeg, pdf, png or svg",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// `<dir>/<name>.<ext>`
pub fn output_path(dir: &Path, name: &str, format: OutputFormat) -> PathBuf {
    dir.join(format!("{}.{}", name, format.extension()))
}

/// base name of the input file, without extension
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "plot".to_string())
}

/// makes a column name usable as part of a file name
pub fn sanitize(name: &str) -> String {
    let s: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let s = s.trim_matches('_').to_string();
    if s.is_empty() {
        "column".to_string()
    } else {
        s
    }
}

/// Draws the figure once to an RGB buffer of the figure size.
pub fn render_rgb<F: Figure>(figure: &F, style: &PlotFormat) -> Result<Vec<u8>, PlotError> {
    let (w, h) = style.pixel_size();
    let bytes = (w as usize)
        .checked_mul(h as usize)
        .and_then(|n| n.checked_mul(3))
        .ok_or_else(|| PlotError::Config(format!("figure of {} x {} pixels is too large", w, h)))?;
    let mut buf = vec![0u8; bytes];
    {
        let root = BitMapBackend::with_buffer(&mut buf, (w, h)).into_drawing_area();
        figure.draw(&root, style)?;
        root.present()?;
    }
    Ok(buf)
}

/// Saves the figure as `<dir>/<name>.<ext>` for every format, returning the written paths.
pub fn save_figure<F: Figure>(
    figure: &F,
    style: &PlotFormat,
    dir: &Path,
    name: &str,
    formats: &[OutputFormat],
) -> Result<Vec<PathBuf>, PlotError> {
    if formats.is_empty() {
        warn!("save_formats is empty, {} not saved", name);
        return Ok(Vec::new());
    }
    fs::create_dir_all(dir).map_err(|e| PlotError::io(dir, e))?;
    let (w, h) = style.pixel_size();
    let rgb = if formats.iter().any(|f| f.is_raster()) {
        render_rgb(figure, style)?
    } else {
        Vec::new()
    };
    let mut written: Vec<PathBuf> = Vec::with_capacity(formats.len());
    for (i, &format) in formats.iter().enumerate() {
        if formats[..i].contains(&format) {
            continue;
        }
        let path = output_path(dir, name, format);
        match format {
            OutputFormat::Jpeg => write_jpeg(&path, &rgb, w, h)?,
            OutputFormat::Png => write_png(&path, &rgb, w, h)?,
            OutputFormat::Pdf => write_pdf(&path, &rgb, w, h, style.dpi)?,
            OutputFormat::Svg => {
                let root = SVGBackend::new(&path, (w, h)).into_drawing_area();
                figure.draw(&root, style)?;
                root.present()?;
            }
        }
        info!("saved {}", path.display());
        written.push(path);
    }
    Ok(written)
}

pub fn jpeg_bytes(rgb: &[u8], w: u32, h: u32) -> Result<Vec<u8>, PlotError> {
    let mut bytes: Vec<u8> = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY).write_image(
        rgb,
        w,
        h,
        ExtendedColorType::Rgb8,
    )?;
    Ok(bytes)
}

pub fn write_jpeg(fout: &Path, rgb: &[u8], w: u32, h: u32) -> Result<(), PlotError> {
    let bytes = jpeg_bytes(rgb, w, h)?;
    fs::write(fout, bytes).map_err(|e| PlotError::io(fout, e))
}

pub fn write_png(fout: &Path, rgb: &[u8], w: u32, h: u32) -> Result<(), PlotError> {
    let file = fs::File::create(fout).map_err(|e| PlotError::io(fout, e))?;
    PngEncoder::new(BufWriter::new(file)).write_image(rgb, w, h, ExtendedColorType::Rgb8)?;
    Ok(())
}

/// Single page pdf holding the figure as a jpeg image.
/// The page size matches the figure size at the given dpi.
pub fn pdf_bytes(rgb: &[u8], w: u32, h: u32, dpi: u32) -> Result<Vec<u8>, PlotError> {
    let jpeg = jpeg_bytes(rgb, w, h)?;
    let w_pt = (w as f64 * 72. / dpi as f64).round() as i64;
    let h_pt = (h as f64 * 72. / dpi as f64).round() as i64;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => w as i64,
            "Height" => h as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg,
    ));
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    w_pt.into(),
                    0.into(),
                    0.into(),
                    h_pt.into(),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), content.encode()?));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "MediaBox" => vec![0.into(), 0.into(), w_pt.into(), h_pt.into()],
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                "Im0" => image_id,
            },
        },
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes: Vec<u8> = Vec::new();
    doc.save_to(&mut bytes).map_err(lopdf::Error::from)?;
    Ok(bytes)
}

pub fn write_pdf(fout: &Path, rgb: &[u8], w: u32, h: u32, dpi: u32) -> Result<(), PlotError> {
    let bytes = pdf_bytes(rgb, w, h, dpi)?;
    fs::write(fout, bytes).map_err(|e| PlotError::io(fout, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> Vec<u8> {
        let mut rgb = Vec::with_capacity((w * h * 3) as usize);
        for y in 0..h {
            for x in 0..w {
                rgb.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 128]);
            }
        }
        rgb
    }

    #[test]
    fn format_names() {
        assert_eq!(OutputFormat::try_from("JPG".to_string()), Ok(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::try_from(" pdf ".to_string()), Ok(OutputFormat::Pdf));
        assert!(OutputFormat::try_from("tiff".to_string()).is_err());
        assert!(!OutputFormat::Svg.is_raster());
    }

    #[test]
    fn names_derive_from_input() {
        assert_eq!(file_stem(Path::new("input/run_01.csv")), "run_01");
        assert_eq!(
            output_path(Path::new("output"), "run_01", OutputFormat::Pdf),
            PathBuf::from("output/run_01.pdf")
        );
        assert_eq!(sanitize("T1 [°C]"), "T1___C");
        assert_eq!(sanitize("//"), "column");
    }

    #[test]
    fn jpeg_has_markers() {
        let bytes = jpeg_bytes(&gradient(64, 32), 64, 32).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(&bytes[bytes.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn pdf_has_one_page() {
        let bytes = pdf_bytes(&gradient(100, 50), 100, 50, 100).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    struct Blank;

    impl Figure for Blank {
        fn draw<DB: DrawingBackend>(
            &self,
            root: &DrawingArea<DB, plotters::coord::Shift>,
            _style: &PlotFormat,
        ) -> Result<(), PlotError> {
            root.fill(&WHITE)?;
            Ok(())
        }
    }

    #[test]
    fn oversized_figure_is_an_error() {
        let style = PlotFormat {
            size: crate::style::FigureSize {
                width: 1.0e9,
                height: 1.0e9,
            },
            ..PlotFormat::default()
        };
        assert!(matches!(render_rgb(&Blank, &style), Err(PlotError::Config(_))));
        let small = PlotFormat {
            dpi: 10,
            ..PlotFormat::default()
        };
        assert_eq!(render_rgb(&Blank, &small).unwrap().len(), 120 * 75 * 3);
    }

    #[test]
    fn writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let rgb = gradient(80, 40);
        let jpeg = dir.path().join("a.jpeg");
        let png = dir.path().join("a.png");
        let pdf = dir.path().join("a.pdf");
        write_jpeg(&jpeg, &rgb, 80, 40).unwrap();
        write_png(&png, &rgb, 80, 40).unwrap();
        write_pdf(&pdf, &rgb, 80, 40, 100).unwrap();
        let decoded = image::open(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (80, 40));
        assert!(fs::metadata(&jpeg).unwrap().len() > 0);
        assert!(fs::metadata(&pdf).unwrap().len() > 0);
    }
}
