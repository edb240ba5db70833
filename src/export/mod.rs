//! Export pipeline: painted document → one-page PDF download.
//!
//! One `ExportPipeline` exists per open viewer. Each `export` call is a job:
//! it claims the pipeline's busy flag (a second call while one is pending is
//! rejected, not queued), lays the document out again at scale 1.0 so the
//! output never depends on the viewer zoom, rasterizes it off the async
//! runtime, and assembles the page. The busy flag is released on every exit
//! path. The blocking work owns it, so a job whose caller dropped the future
//! keeps the pipeline busy until that work ends.

pub mod glyphs;
pub mod pdf;
pub mod raster;
pub mod sink;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::Document;
use crate::viewer::surface;
use crate::viewer::SurfaceRef;
pub use pdf::PageSize;
pub use raster::{BitmapRasterizer, SurfaceRasterizer};
pub use sink::{DeliveryError, DirectorySink, DownloadSink};

pub const PDF_MIME: &str = "application/pdf";

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum ExportError {
    #[error("Document surface is not ready for export")]
    SurfaceNotReady,

    #[error("Rasterization failed: {0}")]
    RasterizationFailed(String),

    #[error("An export is already in progress")]
    AlreadyInProgress,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Device pixels per surface pixel in the raster.
    pub pixel_ratio: f64,
    pub page: PageSize,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            pixel_ratio: 2.0,
            page: PageSize::A4,
        }
    }
}

/// A finished export, ready for a download sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveredFile {
    pub name: String,
    pub mime: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

pub struct ExportPipeline {
    busy: Arc<AtomicBool>,
    rasterizer: Arc<dyn SurfaceRasterizer>,
    settings: ExportSettings,
}

/// Holds the busy flag for the lifetime of one job.
struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ExportPipeline {
    pub fn new(settings: ExportSettings) -> Self {
        Self::with_rasterizer(Arc::new(BitmapRasterizer::new(settings.pixel_ratio)), settings)
    }

    pub fn with_rasterizer(rasterizer: Arc<dyn SurfaceRasterizer>, settings: ExportSettings) -> Self {
        Self {
            busy: Arc::new(AtomicBool::new(false)),
            rasterizer,
            settings,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn settings(&self) -> ExportSettings {
        self.settings
    }

    /// Export `document`, which must be the document behind `surface`.
    pub async fn export(
        &self,
        document: &Arc<Document>,
        surface: Option<&SurfaceRef>,
    ) -> Result<DeliveredFile, ExportError> {
        let Some(busy) = BusyGuard::acquire(&self.busy) else {
            tracing::warn!(kind = %document.kind, "Export rejected: already in progress");
            return Err(ExportError::AlreadyInProgress);
        };

        let surface = surface
            .filter(|s| Arc::ptr_eq(&s.document, document) || s.document == *document)
            .ok_or(ExportError::SurfaceNotReady)?;

        let job_id = Uuid::new_v4();
        tracing::info!(%job_id, viewer_id = %surface.viewer_id, kind = %document.kind, "Export started");

        let doc = Arc::clone(document);
        let rasterizer = Arc::clone(&self.rasterizer);
        let page = self.settings.page;
        let result = tokio::task::spawn_blocking(move || {
            let _busy = busy;
            // Always scale 1.0, whatever the viewer shows.
            let sheet = surface::layout(&doc);
            let raster = rasterizer.rasterize(&sheet)?;
            pdf::assemble(&doc.title, raster, page)
        })
        .await
        .map_err(|e| ExportError::RasterizationFailed(format!("export task failed: {e}")))
        .and_then(|r| r);

        match result {
            Ok(bytes) => {
                let file = DeliveredFile {
                    name: export_filename(document),
                    mime: PDF_MIME.into(),
                    bytes,
                };
                tracing::info!(%job_id, bytes = file.bytes.len(), "Export finished");
                Ok(file)
            }
            Err(e) => {
                tracing::error!(%job_id, error = %e, "Export failed");
                Err(e)
            }
        }
    }
}

/// Deterministic download name for a document.
///
/// `Prescription_<id>.pdf` / `LabReport_<id>.pdf` for issued identifiers,
/// otherwise `prescription-<ordinal>.pdf` / `lab-report-<ordinal>.pdf`.
pub fn export_filename(document: &Document) -> String {
    let name = if document.identifier.issued {
        format!("{}_{}.pdf", document.kind.label(), document.identifier.value)
    } else {
        let ordinal = document
            .ordinal
            .map(|id| id.to_string())
            .unwrap_or_else(|| "unnumbered".into());
        format!("{}-{ordinal}.pdf", document.kind.slug())
    };
    sanitize_filename(&name)
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}
