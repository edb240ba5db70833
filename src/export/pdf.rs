//! Page assembly via `printpdf`.
//!
//! The raster is placed on a single portrait page (A4 by default) with zero margin,
//! pinned to the top edge and centered horizontally. Its resolution is
//! chosen so the image spans the full page width, shrinking further only
//! when it would otherwise run past the bottom edge.

use std::io::BufWriter;

use printpdf::image_crate::{DynamicImage, RgbImage};
use printpdf::{Image, ImageTransform, Mm, PdfDocument};
use serde::{Deserialize, Serialize};

use super::ExportError;

pub const A4_WIDTH_MM: f64 = 210.0;
pub const A4_HEIGHT_MM: f64 = 297.0;
const MM_PER_INCH: f64 = 25.4;

/// Physical page size in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl PageSize {
    pub const A4: PageSize = PageSize {
        width_mm: A4_WIDTH_MM,
        height_mm: A4_HEIGHT_MM,
    };
}

/// Placement of a raster on the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub dpi: f64,
    pub translate_x: f64,
    pub translate_y: f64,
    pub width_mm: f64,
    pub height_mm: f64,
}

/// Fit a `width_px × height_px` raster onto the page, top-aligned.
pub fn placement(page: PageSize, width_px: u32, height_px: u32) -> Placement {
    let fit_width = f64::from(width_px) / (page.width_mm / MM_PER_INCH);
    let fit_height = f64::from(height_px) / (page.height_mm / MM_PER_INCH);
    let dpi = fit_width.max(fit_height);

    let width_mm = f64::from(width_px) / dpi * MM_PER_INCH;
    let height_mm = f64::from(height_px) / dpi * MM_PER_INCH;
    Placement {
        dpi,
        translate_x: (page.width_mm - width_mm) / 2.0,
        // PDF origin is bottom-left.
        translate_y: page.height_mm - height_mm,
        width_mm,
        height_mm,
    }
}

/// Build a one-page PDF holding `raster`. Returns PDF bytes.
pub fn assemble(title: &str, raster: RgbImage, page: PageSize) -> Result<Vec<u8>, ExportError> {
    let (width_px, height_px) = raster.dimensions();
    if width_px == 0 || height_px == 0 {
        return Err(ExportError::RasterizationFailed("empty raster".into()));
    }
    let fit = placement(page, width_px, height_px);

    let (doc, page1, layer1) = PdfDocument::new(
        title,
        Mm(page.width_mm as f32),
        Mm(page.height_mm as f32),
        "Layer 1",
    );
    let layer = doc.get_page(page1).get_layer(layer1);

    let image = Image::from_dynamic_image(&DynamicImage::ImageRgb8(raster));
    image.add_to_layer(
        layer,
        ImageTransform {
            translate_x: Some(Mm(fit.translate_x as f32)),
            translate_y: Some(Mm(fit.translate_y as f32)),
            dpi: Some(fit.dpi as f32),
            ..Default::default()
        },
    );

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ExportError::RasterizationFailed(format!("PDF save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| ExportError::RasterizationFailed(format!("PDF buffer error: {e}")))
}
