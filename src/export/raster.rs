//! Rasterization adapter: `Surface` → RGB bitmap.
//!
//! The [`SurfaceRasterizer`] trait is the seam between the pure surface tree
//! and pixel output. [`BitmapRasterizer`] paints rectangles and 8×8 bitmap
//! text; tests substitute their own implementations.

use printpdf::image_crate::{Rgb, RgbImage};

use super::glyphs::{self, GLYPH_SIZE};
use super::ExportError;
use crate::viewer::surface::{Color, Node, Rect, Surface, CHAR_ADVANCE, LINE_HEIGHT};

/// Largest raster edge, in pixels. Taller sheets are painted at a lower
/// pixel ratio.
pub const MAX_DIMENSION: u32 = 16_384;

pub trait SurfaceRasterizer: Send + Sync {
    fn rasterize(&self, surface: &Surface) -> Result<RgbImage, ExportError>;
}

#[derive(Debug, Clone, Copy)]
pub struct BitmapRasterizer {
    /// Device pixels per surface pixel.
    pub pixel_ratio: f64,
}

impl Default for BitmapRasterizer {
    fn default() -> Self {
        Self { pixel_ratio: 2.0 }
    }
}

impl BitmapRasterizer {
    pub fn new(pixel_ratio: f64) -> Self {
        Self { pixel_ratio }
    }

    /// Pixel ratio actually used for `surface`: the configured one, lowered
    /// so the longest edge stays within [`MAX_DIMENSION`].
    pub fn effective_ratio(&self, surface: &Surface) -> Result<f64, ExportError> {
        let (w, h, ratio) = (surface.width, surface.height, self.pixel_ratio);
        if [w, h, ratio].iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(ExportError::RasterizationFailed(format!(
                "degenerate surface: {w}x{h} at pixel ratio {ratio}"
            )));
        }
        Ok(ratio.min(f64::from(MAX_DIMENSION) / w.max(h)))
    }
}

fn dimension(logical: f64, ratio: f64) -> u32 {
    ((logical * ratio).ceil() as u32).clamp(1, MAX_DIMENSION)
}

impl SurfaceRasterizer for BitmapRasterizer {
    fn rasterize(&self, surface: &Surface) -> Result<RgbImage, ExportError> {
        let ratio = self.effective_ratio(surface)?;
        if ratio < self.pixel_ratio {
            tracing::warn!(
                height = surface.height,
                requested = self.pixel_ratio,
                ratio,
                "Sheet exceeds raster limit, lowering pixel ratio"
            );
        }
        let width = dimension(surface.width, ratio);
        let height = dimension(surface.height, ratio);
        let mut canvas = Canvas {
            image: RgbImage::from_pixel(width, height, Rgb([255, 255, 255])),
            ratio,
        };

        for node in &surface.nodes {
            match node {
                Node::Rect { rect, fill, stroke } => {
                    if let Some(fill) = fill {
                        canvas.fill(*rect, *fill);
                    }
                    if let Some(stroke) = stroke {
                        canvas.outline(*rect, stroke.width, stroke.color);
                    }
                }
                Node::Text {
                    x,
                    y,
                    size,
                    content,
                    color,
                    bold,
                } => canvas.text(*x, *y, *size, content, *color, *bold),
            }
        }

        tracing::debug!(width, height, nodes = surface.nodes.len(), "Surface rasterized");
        Ok(canvas.image)
    }
}

struct Canvas {
    image: RgbImage,
    ratio: f64,
}

impl Canvas {
    /// Fill a rectangle given in surface coordinates, clipped to the image.
    fn fill(&mut self, rect: Rect, color: Color) {
        let (w, h) = self.image.dimensions();
        let x0 = (rect.x * self.ratio).round().max(0.0) as u32;
        let y0 = (rect.y * self.ratio).round().max(0.0) as u32;
        let x1 = (((rect.x + rect.w) * self.ratio).round().max(0.0) as u32).min(w);
        let y1 = (((rect.y + rect.h) * self.ratio).round().max(0.0) as u32).min(h);
        let pixel = Rgb([color.r, color.g, color.b]);
        for y in y0..y1 {
            for x in x0..x1 {
                self.image.put_pixel(x, y, pixel);
            }
        }
    }

    fn outline(&mut self, rect: Rect, width: f64, color: Color) {
        // At least one device pixel.
        let t = width.max(1.0 / self.ratio);
        let Rect { x, y, w, h } = rect;
        self.fill(Rect { x, y, w, h: t }, color);
        self.fill(Rect { x, y: y + h - t, w, h: t }, color);
        self.fill(Rect { x, y, w: t, h }, color);
        self.fill(Rect { x: x + w - t, y, w: t, h }, color);
    }

    fn text(&mut self, x: f64, y: f64, size: f64, content: &str, color: Color, bold: bool) {
        let advance = size * CHAR_ADVANCE;
        // The 8×8 cell carries its own spacing column.
        let unit = advance / GLYPH_SIZE as f64;
        let top = y + (size * LINE_HEIGHT - GLYPH_SIZE as f64 * unit) / 2.0;

        for (i, c) in content.chars().enumerate() {
            let left = x + i as f64 * advance;
            for (row, bits) in glyphs::glyph(c).iter().enumerate() {
                for col in 0..GLYPH_SIZE {
                    if (bits >> col) & 1 == 0 {
                        continue;
                    }
                    let dot = Rect {
                        x: left + col as f64 * unit,
                        y: top + row as f64 * unit,
                        w: if bold { unit * 1.6 } else { unit },
                        h: unit,
                    };
                    self.fill(dot, color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::surface::Stroke;

    fn blank(width: f64, height: f64) -> Surface {
        Surface {
            width,
            height,
            scale: 1.0,
            nodes: Vec::new(),
        }
    }

    #[test]
    fn dimensions_follow_pixel_ratio() {
        let image = BitmapRasterizer::new(2.0).rasterize(&blank(100.0, 50.0)).unwrap();
        assert_eq!(image.dimensions(), (200, 100));
    }

    #[test]
    fn background_is_white() {
        let image = BitmapRasterizer::new(1.0).rasterize(&blank(4.0, 4.0)).unwrap();
        assert!(image.pixels().all(|p| *p == Rgb([255, 255, 255])));
    }

    #[test]
    fn fills_and_strokes_paint() {
        let mut surface = blank(20.0, 20.0);
        surface.nodes.push(Node::Rect {
            rect: Rect { x: 5.0, y: 5.0, w: 10.0, h: 10.0 },
            fill: Some(Color::rgb(0, 255, 0)),
            stroke: Some(Stroke {
                color: Color::rgb(255, 0, 0),
                width: 1.0,
            }),
        });
        let image = BitmapRasterizer::new(1.0).rasterize(&surface).unwrap();
        assert_eq!(*image.get_pixel(10, 10), Rgb([0, 255, 0]));
        assert_eq!(*image.get_pixel(5, 10), Rgb([255, 0, 0]));
        assert_eq!(*image.get_pixel(2, 2), Rgb([255, 255, 255]));
    }

    #[test]
    fn text_leaves_ink() {
        let mut surface = blank(100.0, 30.0);
        surface.nodes.push(Node::Text {
            x: 0.0,
            y: 0.0,
            size: 16.0,
            content: "H".into(),
            color: Color::rgb(0, 0, 0),
            bold: false,
        });
        let image = BitmapRasterizer::new(2.0).rasterize(&surface).unwrap();
        assert!(image.pixels().any(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn shapes_outside_are_clipped() {
        let mut surface = blank(10.0, 10.0);
        surface.nodes.push(Node::Rect {
            rect: Rect { x: -5.0, y: 8.0, w: 50.0, h: 50.0 },
            fill: Some(Color::rgb(1, 2, 3)),
            stroke: None,
        });
        let image = BitmapRasterizer::new(1.0).rasterize(&surface).unwrap();
        assert_eq!(*image.get_pixel(0, 9), Rgb([1, 2, 3]));
    }

    fn text_surface(content: &str) -> Surface {
        let mut surface = blank(200.0, 30.0);
        surface.nodes.push(Node::Text {
            x: 0.0,
            y: 0.0,
            size: 16.0,
            content: content.into(),
            color: Color::rgb(0, 0, 0),
            bold: false,
        });
        surface
    }

    #[test]
    fn accented_text_is_not_replaced() {
        let r = BitmapRasterizer::default();
        let accented = r.rasterize(&text_surface("José Müller")).unwrap();
        let replaced = r.rasterize(&text_surface("Jos? M?ller")).unwrap();
        assert_ne!(accented, replaced);
    }

    #[test]
    fn degenerate_surfaces_fail() {
        let r = BitmapRasterizer::default();
        for (w, h) in [(0.0, 10.0), (10.0, f64::NAN), (f64::INFINITY, 10.0), (10.0, -4.0)] {
            assert!(matches!(
                r.rasterize(&blank(w, h)),
                Err(ExportError::RasterizationFailed(_))
            ));
        }
        assert!(BitmapRasterizer::new(0.0).rasterize(&blank(10.0, 10.0)).is_err());
    }

    #[test]
    fn oversized_surface_lowers_ratio() {
        let r = BitmapRasterizer::new(2.0);
        let tall = blank(794.0, 20_000.0);
        let ratio = r.effective_ratio(&tall).unwrap();
        assert!(ratio < 2.0);

        let image = r.rasterize(&tall).unwrap();
        let (w, h) = image.dimensions();
        assert_eq!(h, MAX_DIMENSION);
        assert!(w < 794 * 2);
    }

    #[test]
    fn long_lab_report_still_rasterizes() {
        use crate::models::{LabReport, LabResult, Record};
        use crate::viewer::surface::layout;

        let results = (0..320)
            .map(|i| LabResult {
                parameter: Some(format!("Parameter {i}")),
                value: Some("5.0".into()),
                unit: Some("mg/dL".into()),
                range: Some("4 - 6".into()),
                ..Default::default()
            })
            .collect();
        let record = Record::from(LabReport {
            results,
            ..Default::default()
        });
        let today = chrono::NaiveDate::from_ymd_opt(2025, 12, 20).unwrap();
        let sheet = layout(&crate::template::compile(&record, today));
        assert!(sheet.height * 2.0 > f64::from(MAX_DIMENSION));

        let image = BitmapRasterizer::default().rasterize(&sheet).unwrap();
        assert_eq!(image.height(), MAX_DIMENSION);
        assert!(image.width() > 0);
    }
}
