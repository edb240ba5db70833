//! Interactive viewer: one open document plus its zoom state.
//!
//! A `Viewer` is created per open, owns its `ViewState` exclusively, and is
//! dropped on close. The export pipeline never sees the `ViewState`; it gets a
//! [`SurfaceRef`] that only says "this document has been painted".

pub mod state;
pub mod surface;

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::models::Document;
pub use state::{ButtonStep, InputMode, ScaleBounds, TouchPoint, ViewState};
pub use surface::Surface;

/// Handle to a painted surface, handed to the export pipeline.
///
/// Carries no scale: export always lays the document out again at 1.0.
#[derive(Debug, Clone)]
pub struct SurfaceRef {
    pub viewer_id: Uuid,
    pub document: Arc<Document>,
}

#[derive(Debug)]
pub struct Viewer {
    id: Uuid,
    document: Arc<Document>,
    state: ViewState,
    painted: bool,
}

/// What the shell needs to redraw after an interaction.
#[derive(Debug, Clone, Serialize)]
pub struct ViewerSnapshot {
    pub scale: f64,
    pub zoom_label: String,
    pub surface: Surface,
}

impl Viewer {
    pub fn mount(document: Document) -> Self {
        let viewer = Self {
            id: Uuid::new_v4(),
            document: Arc::new(document),
            state: ViewState::default(),
            painted: false,
        };
        tracing::info!(
            viewer_id = %viewer.id,
            kind = %viewer.document.kind,
            sections = viewer.document.sections.len(),
            "Viewer mounted"
        );
        viewer
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn scale(&self) -> f64 {
        self.state.scale
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.state = self.state.apply_button_step(ButtonStep::In);
        self.state.scale
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.state = self.state.apply_button_step(ButtonStep::Out);
        self.state.scale
    }

    pub fn reset_zoom(&mut self) -> f64 {
        self.state = self.state.reset();
        self.state.scale
    }

    pub fn gesture_start(&mut self, points: &[TouchPoint]) -> f64 {
        self.state = self.state.gesture_start(points);
        self.state.scale
    }

    pub fn gesture_update(&mut self, points: &[TouchPoint]) -> f64 {
        self.state = self.state.apply_gesture_update(points);
        self.state.scale
    }

    pub fn gesture_end(&mut self, remaining: &[TouchPoint]) -> f64 {
        self.state = self.state.gesture_end(remaining);
        self.state.scale
    }

    /// Paint the document at the current zoom.
    pub fn render(&mut self) -> Surface {
        self.painted = true;
        surface::render(&self.document, self.state.scale)
    }

    pub fn snapshot(&mut self) -> ViewerSnapshot {
        ViewerSnapshot {
            scale: self.state.scale,
            zoom_label: self.state.zoom_label(),
            surface: self.render(),
        }
    }

    /// `None` until the first paint.
    pub fn surface_ref(&self) -> Option<SurfaceRef> {
        self.painted.then(|| SurfaceRef {
            viewer_id: self.id,
            document: Arc::clone(&self.document),
        })
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        if self.state.is_gesturing() {
            tracing::debug!(viewer_id = %self.id, "Gesture aborted on unmount");
        }
        tracing::info!(viewer_id = %self.id, "Viewer unmounted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Prescription, Record};
    use crate::template;
    use chrono::NaiveDate;

    fn viewer() -> Viewer {
        let today = NaiveDate::from_ymd_opt(2025, 12, 20).unwrap();
        Viewer::mount(template::compile(&Record::from(Prescription::default()), today))
    }

    fn pair(d: f64) -> [TouchPoint; 2] {
        [TouchPoint::new(10.0, 10.0), TouchPoint::new(10.0, 10.0 + d)]
    }

    #[test]
    fn mounts_at_unit_scale() {
        let v = viewer();
        assert_eq!(v.scale(), 1.0);
        assert_eq!(v.state().mode, InputMode::Idle);
    }

    #[test]
    fn no_surface_ref_before_first_paint() {
        let mut v = viewer();
        assert!(v.surface_ref().is_none());
        v.render();
        let r = v.surface_ref().unwrap();
        assert_eq!(r.viewer_id, v.id());
        assert!(Arc::ptr_eq(&r.document, v.document()));
    }

    #[test]
    fn render_follows_zoom() {
        let mut v = viewer();
        let base = v.render().width;
        v.zoom_in();
        v.zoom_in();
        let zoomed = v.render();
        assert!((zoomed.width - base * 1.2).abs() < 1e-9);
        assert_eq!(v.snapshot().zoom_label, "120%");
    }

    #[test]
    fn pinch_then_buttons() {
        let mut v = viewer();
        v.gesture_start(&pair(100.0));
        assert!((v.gesture_update(&pair(190.0)) - 1.9).abs() < 1e-9);
        v.gesture_end(&[]);
        assert_eq!(v.state().mode, InputMode::Idle);
        assert_eq!(v.zoom_out(), 1.5);
        assert_eq!(v.reset_zoom(), 1.0);
    }

    #[test]
    fn each_mount_gets_fresh_state_and_id() {
        let mut a = viewer();
        a.zoom_in();
        let b = viewer();
        assert_ne!(a.id(), b.id());
        assert_eq!(b.scale(), 1.0);
    }
}
