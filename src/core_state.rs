//! Engine state shared with the command layer.
//!
//! `EngineState` holds at most one open viewer session. Each session owns its
//! viewer (and so its `ViewState`) plus the export pipeline scoped to that
//! viewer instance. The lock is never held across an `.await`: export clones
//! what it needs out of the session and runs unlocked, so the viewer stays
//! interactive while a job is pending and closing the viewer does not cancel it.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;

use crate::export::{
    BitmapRasterizer, DeliveredFile, ExportError, ExportPipeline, ExportSettings,
    SurfaceRasterizer,
};
use crate::models::{Document, Record};
use crate::template;
use crate::viewer::{Surface, TouchPoint, Viewer, ViewerSnapshot};

struct ViewerSession {
    viewer: Viewer,
    exporter: Arc<ExportPipeline>,
    /// Date the document was compiled against (age derivation).
    reference_date: NaiveDate,
}

pub struct EngineState {
    session: Mutex<Option<ViewerSession>>,
    rasterizer: Arc<dyn SurfaceRasterizer>,
    settings: ExportSettings,
}

impl EngineState {
    pub fn new() -> Self {
        let settings = ExportSettings::default();
        Self::with_rasterizer(Arc::new(BitmapRasterizer::new(settings.pixel_ratio)), settings)
    }

    pub fn with_rasterizer(rasterizer: Arc<dyn SurfaceRasterizer>, settings: ExportSettings) -> Self {
        Self {
            session: Mutex::new(None),
            rasterizer,
            settings,
        }
    }

    fn lock_session(&self) -> Result<MutexGuard<'_, Option<ViewerSession>>, EngineError> {
        self.session.lock().map_err(|_| EngineError::LockPoisoned)
    }

    // ── Open / close ────────────────────────────────────────

    /// Compile `record` as of today, mount a fresh viewer and paint it.
    pub fn open_viewer(&self, record: &Record) -> Result<Surface, EngineError> {
        self.open_viewer_on(record, chrono::Local::now().date_naive())
    }

    /// Same as [`open_viewer`](Self::open_viewer) with an explicit reference date.
    pub fn open_viewer_on(&self, record: &Record, today: NaiveDate) -> Result<Surface, EngineError> {
        let document = template::compile(record, today);
        let mut viewer = Viewer::mount(document);
        let surface = viewer.render();

        let session = ViewerSession {
            viewer,
            exporter: Arc::new(ExportPipeline::with_rasterizer(
                Arc::clone(&self.rasterizer),
                self.settings,
            )),
            reference_date: today,
        };

        let mut guard = self.lock_session()?;
        if guard.is_some() {
            tracing::debug!("Replacing open viewer");
        }
        *guard = Some(session);
        Ok(surface)
    }

    /// Discard the open viewer. Returns whether one was open.
    pub fn close_viewer(&self) -> Result<bool, EngineError> {
        let closed = self.lock_session()?.take();
        Ok(closed.is_some())
    }

    pub fn is_open(&self) -> bool {
        self.session.lock().map(|g| g.is_some()).unwrap_or(false)
    }

    // ── Viewer passthroughs ─────────────────────────────────

    fn with_viewer<T>(&self, f: impl FnOnce(&mut Viewer) -> T) -> Result<T, EngineError> {
        let mut guard = self.lock_session()?;
        let session = guard.as_mut().ok_or(EngineError::NoOpenViewer)?;
        Ok(f(&mut session.viewer))
    }

    pub fn zoom_in(&self) -> Result<f64, EngineError> {
        self.with_viewer(Viewer::zoom_in)
    }

    pub fn zoom_out(&self) -> Result<f64, EngineError> {
        self.with_viewer(Viewer::zoom_out)
    }

    pub fn reset_zoom(&self) -> Result<f64, EngineError> {
        self.with_viewer(Viewer::reset_zoom)
    }

    pub fn gesture_start(&self, points: &[TouchPoint]) -> Result<f64, EngineError> {
        self.with_viewer(|v| v.gesture_start(points))
    }

    pub fn gesture_update(&self, points: &[TouchPoint]) -> Result<f64, EngineError> {
        self.with_viewer(|v| v.gesture_update(points))
    }

    pub fn gesture_end(&self, remaining: &[TouchPoint]) -> Result<f64, EngineError> {
        self.with_viewer(|v| v.gesture_end(remaining))
    }

    pub fn render(&self) -> Result<Surface, EngineError> {
        self.with_viewer(Viewer::render)
    }

    pub fn snapshot(&self) -> Result<ViewerSnapshot, EngineError> {
        self.with_viewer(Viewer::snapshot)
    }

    pub fn scale(&self) -> Result<f64, EngineError> {
        self.with_viewer(|v| v.scale())
    }

    pub fn document(&self) -> Result<Arc<Document>, EngineError> {
        self.with_viewer(|v| Arc::clone(v.document()))
    }

    // ── Export ──────────────────────────────────────────────

    /// Export `record` from the open viewer.
    ///
    /// The record is compiled again through the same path the viewer used;
    /// `SurfaceNotReady` unless it matches the painted document.
    pub async fn request_export(&self, record: &Record) -> Result<DeliveredFile, ExportError> {
        let (exporter, document, surface) = {
            let guard = self.session.lock().map_err(|_| {
                tracing::error!("Engine state lock poisoned");
                ExportError::SurfaceNotReady
            })?;
            let Some(session) = guard.as_ref() else {
                tracing::warn!(kind = %record.kind(), "Export requested with no open viewer");
                return Err(ExportError::SurfaceNotReady);
            };

            let compiled = template::compile(record, session.reference_date);
            if compiled != **session.viewer.document() {
                tracing::warn!(kind = %record.kind(), "Export record does not match open viewer");
                return Err(ExportError::SurfaceNotReady);
            }
            (
                Arc::clone(&session.exporter),
                Arc::clone(session.viewer.document()),
                session.viewer.surface_ref(),
            )
        };

        exporter.export(&document, surface.as_ref()).await
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors from EngineState operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("No document is open")]
    NoOpenViewer,
}
