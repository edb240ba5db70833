//! Viewer commands.
//!
//! - `open_viewer`: compile a record and paint it at 100%
//! - `close_viewer`: discard the viewer and its zoom state
//! - `zoom_in` / `zoom_out` / `reset_zoom`: button controls
//! - `gesture_start` / `gesture_update` / `gesture_end`: pinch input

use serde_json::Value;

use crate::core_state::EngineState;
use crate::models::{Record, RecordKind};
use crate::viewer::{TouchPoint, ViewerSnapshot};

pub fn open_viewer(
    state: &EngineState,
    record: Value,
    kind: RecordKind,
) -> Result<ViewerSnapshot, String> {
    let record = Record::from_value(record, kind);
    state.open_viewer(&record).map_err(|e| e.to_string())?;
    state.snapshot().map_err(|e| e.to_string())
}

pub fn close_viewer(state: &EngineState) -> Result<(), String> {
    state.close_viewer().map_err(|e| e.to_string())?;
    Ok(())
}

pub fn zoom_in(state: &EngineState) -> Result<ViewerSnapshot, String> {
    state.zoom_in().map_err(|e| e.to_string())?;
    state.snapshot().map_err(|e| e.to_string())
}

pub fn zoom_out(state: &EngineState) -> Result<ViewerSnapshot, String> {
    state.zoom_out().map_err(|e| e.to_string())?;
    state.snapshot().map_err(|e| e.to_string())
}

pub fn reset_zoom(state: &EngineState) -> Result<ViewerSnapshot, String> {
    state.reset_zoom().map_err(|e| e.to_string())?;
    state.snapshot().map_err(|e| e.to_string())
}

pub fn gesture_start(
    state: &EngineState,
    points: Vec<TouchPoint>,
) -> Result<ViewerSnapshot, String> {
    state.gesture_start(&points).map_err(|e| e.to_string())?;
    state.snapshot().map_err(|e| e.to_string())
}

pub fn gesture_update(
    state: &EngineState,
    points: Vec<TouchPoint>,
) -> Result<ViewerSnapshot, String> {
    state.gesture_update(&points).map_err(|e| e.to_string())?;
    state.snapshot().map_err(|e| e.to_string())
}

pub fn gesture_end(
    state: &EngineState,
    remaining: Vec<TouchPoint>,
) -> Result<ViewerSnapshot, String> {
    state.gesture_end(&remaining).map_err(|e| e.to_string())?;
    state.snapshot().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pts(distance: f64) -> Vec<TouchPoint> {
        vec![TouchPoint::new(0.0, 0.0), TouchPoint::new(0.0, distance)]
    }

    #[test]
    fn open_then_zoom() {
        let state = EngineState::new();
        let snap = open_viewer(
            &state,
            json!({"prescriptionId": "RX-1", "patientName": "Asha"}),
            RecordKind::Prescription,
        )
        .unwrap();
        assert_eq!(snap.zoom_label, "100%");

        let snap = zoom_in(&state).unwrap();
        assert_eq!(snap.zoom_label, "110%");
        assert_eq!(snap.surface.scale, 1.1);

        let snap = reset_zoom(&state).unwrap();
        assert_eq!(snap.scale, 1.0);
    }

    #[test]
    fn pinch_through_commands() {
        let state = EngineState::new();
        open_viewer(&state, json!({}), RecordKind::LabReport).unwrap();
        gesture_start(&state, pts(100.0)).unwrap();
        let snap = gesture_update(&state, pts(50.0)).unwrap();
        assert_eq!(snap.scale, 0.5);
        let snap = gesture_end(&state, vec![]).unwrap();
        assert_eq!(snap.scale, 0.5);
        let snap = zoom_out(&state).unwrap();
        assert_eq!(snap.scale, 0.7);
    }

    #[test]
    fn commands_without_viewer_report_error() {
        let state = EngineState::new();
        let err = zoom_in(&state).unwrap_err();
        assert_eq!(err, "No document is open");
    }

    #[test]
    fn close_is_idempotent() {
        let state = EngineState::new();
        open_viewer(&state, json!({}), RecordKind::Prescription).unwrap();
        close_viewer(&state).unwrap();
        close_viewer(&state).unwrap();
        assert!(!state.is_open());
    }
}
