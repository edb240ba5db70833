//! Export command: `export_document` produces the PDF for the open viewer
//! and hands it to a download sink.

use serde::Serialize;
use serde_json::Value;

use crate::core_state::EngineState;
use crate::export::DownloadSink;
use crate::models::{Record, RecordKind};

#[derive(Debug, Clone, Serialize)]
pub struct ExportOutcome {
    pub name: String,
    pub path: String,
    pub bytes: usize,
}

/// Export the record shown in the open viewer.
///
/// Safe to call again after any failure; a call while another export is
/// pending fails with "already in progress".
pub async fn export_document(
    state: &EngineState,
    sink: &dyn DownloadSink,
    record: Value,
    kind: RecordKind,
) -> Result<ExportOutcome, String> {
    let record = Record::from_value(record, kind);
    let file = state
        .request_export(&record)
        .await
        .map_err(|e| e.to_string())?;
    let path = sink.deliver(&file).map_err(|e| e.to_string())?;

    Ok(ExportOutcome {
        name: file.name,
        path: path.to_string_lossy().into_owned(),
        bytes: file.bytes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::viewer::open_viewer;
    use crate::export::DirectorySink;
    use serde_json::json;

    #[tokio::test]
    async fn exports_into_sink_directory() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());
        let state = EngineState::new();
        let record = json!({
            "id": 4,
            "patientName": "Ravi",
            "results": [{"parameter": "Glucose", "value": 93, "range": "70 - 110"}]
        });

        open_viewer(&state, record.clone(), RecordKind::LabReport).unwrap();
        let outcome = export_document(&state, &sink, record, RecordKind::LabReport)
            .await
            .unwrap();

        assert_eq!(outcome.name, "lab-report-4.pdf");
        assert!(outcome.bytes > 0);
        assert!(dir.path().join("lab-report-4.pdf").exists());
    }

    #[tokio::test]
    async fn export_without_viewer_fails_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());
        let state = EngineState::new();

        let err = export_document(&state, &sink, json!({}), RecordKind::Prescription)
            .await
            .unwrap_err();
        assert_eq!(err, "Document surface is not ready for export");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
