//! Input records as the portal's collaborators hand them over.
//!
//! Every field is optional and deserialized leniently (see [`super::lenient`]);
//! alternate wire names used by different parts of the portal are kept as
//! separate fields and resolved by the template compiler's fallback chains.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::enums::RecordKind;
use super::lenient;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    #[serde(default, deserialize_with = "lenient::text")]
    pub drug: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub dosage: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub timing: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub frequency: Option<String>,
    /// Duration in days.
    #[serde(default, deserialize_with = "lenient::days")]
    pub duration: Option<u32>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    #[serde(default, deserialize_with = "lenient::ordinal")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub prescription_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub created_at: Option<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub doctor_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub doctor_specialization: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub doctor_degree: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub doctor_registration: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub clinic_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub clinic_address: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub clinic_phone: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub emergency_contact: Option<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub patient_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub patient_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub date_of_birth: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub age: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub allergies: Option<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub diagnosis: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub symptoms: Option<String>,
    /// Order-significant.
    #[serde(default, deserialize_with = "lenient::rows")]
    pub medications: Vec<Medication>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub instructions: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub additional_notes: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub diet_to_follow: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub diet: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub history: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub follow_up_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub follow_up: Option<String>,
    /// Linked lab-report references.
    #[serde(default, deserialize_with = "lenient::tags")]
    pub lab_reports: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabResult {
    #[serde(default, deserialize_with = "lenient::text")]
    pub parameter: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub test_name: Option<String>,
    /// Numeric or categorical; numbers arrive stringified.
    #[serde(default, deserialize_with = "lenient::text")]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub range: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabReport {
    #[serde(default, deserialize_with = "lenient::ordinal")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub report_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub reported_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub sample_collected_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub test_name: Option<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub lab_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub laboratory_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub lab_address: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub lab_phone: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub reg_no: Option<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub doctor_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub doctor_specialization: Option<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub patient_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub patient_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub date_of_birth: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub age: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub referred_by: Option<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub sample_type: Option<String>,
    /// Order-significant.
    #[serde(default, deserialize_with = "lenient::rows")]
    pub results: Vec<LabResult>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub doctor_notes: Option<String>,
}

/// A clinical record handed to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum Record {
    Prescription(Prescription),
    LabReport(LabReport),
}

impl Record {
    /// Shape a raw collaborator object into a record of the given kind.
    ///
    /// Never fails: a value that is not an object yields an all-default
    /// record, which the compiler turns into a fully placeholdered document.
    pub fn from_value(value: Value, kind: RecordKind) -> Self {
        match kind {
            RecordKind::Prescription => Self::Prescription(
                serde_json::from_value(value).unwrap_or_else(|e| {
                    tracing::warn!(kind = %kind, "Record shape rejected, using defaults: {e}");
                    Prescription::default()
                }),
            ),
            RecordKind::LabReport => Self::LabReport(
                serde_json::from_value(value).unwrap_or_else(|e| {
                    tracing::warn!(kind = %kind, "Record shape rejected, using defaults: {e}");
                    LabReport::default()
                }),
            ),
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Prescription(_) => RecordKind::Prescription,
            Self::LabReport(_) => RecordKind::LabReport,
        }
    }

    /// Backend ordinal id, when the record carries one.
    pub fn ordinal(&self) -> Option<i64> {
        match self {
            Self::Prescription(p) => p.id,
            Self::LabReport(r) => r.id,
        }
    }
}

impl From<Prescription> for Record {
    fn from(p: Prescription) -> Self {
        Self::Prescription(p)
    }
}

impl From<LabReport> for Record {
    fn from(r: LabReport) -> Self {
        Self::LabReport(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prescription_from_portal_json() {
        let value = json!({
            "id": 12,
            "prescriptionId": "RX-2025-0012",
            "date": "2025-12-20",
            "doctorName": "Dr. Rajesh Kumar",
            "diagnosis": "Viral fever",
            "medications": [
                {"drug": "Paracetamol", "unit": "Tablet", "dosage": "1-0-1", "duration": 5},
                {"name": "ORS", "unit": "Sachet", "timing": "After meals"}
            ],
            "labReports": "CBC, Dengue NS1"
        });
        let record = Record::from_value(value, RecordKind::Prescription);
        let Record::Prescription(p) = record else { panic!("wrong kind") };

        assert_eq!(p.id, Some(12));
        assert_eq!(p.prescription_id.as_deref(), Some("RX-2025-0012"));
        assert_eq!(p.medications.len(), 2);
        assert_eq!(p.medications[0].drug.as_deref(), Some("Paracetamol"));
        assert_eq!(p.medications[0].duration, Some(5));
        assert_eq!(p.medications[1].name.as_deref(), Some("ORS"));
        assert_eq!(p.lab_reports, vec!["CBC", "Dengue NS1"]);
    }

    #[test]
    fn lab_report_with_numeric_values_and_string_results() {
        let value = json!({
            "id": "3",
            "testName": "Lipid Profile",
            "laboratoryName": "Max Lab",
            "results": "[{\"parameter\": \"HDL\", \"value\": 45, \"unit\": \"mg/dL\", \"range\": \">40\"}]"
        });
        let Record::LabReport(r) = Record::from_value(value, RecordKind::LabReport) else {
            panic!("wrong kind")
        };
        assert_eq!(r.id, Some(3));
        assert_eq!(r.laboratory_name.as_deref(), Some("Max Lab"));
        assert_eq!(r.results.len(), 1);
        assert_eq!(r.results[0].value.as_deref(), Some("45"));
    }

    #[test]
    fn deviating_fields_become_absent() {
        let value = json!({
            "diagnosis": ["not", "a", "string"],
            "medications": {"drug": "x"},
            "date": true
        });
        let Record::Prescription(p) = Record::from_value(value, RecordKind::Prescription) else {
            panic!("wrong kind")
        };
        assert!(p.diagnosis.is_none());
        assert!(p.medications.is_empty());
        assert!(p.date.is_none());
    }

    #[test]
    fn non_object_yields_default_record() {
        let record = Record::from_value(json!("garbage"), RecordKind::LabReport);
        assert_eq!(record, Record::LabReport(LabReport::default()));
        assert_eq!(record.kind(), RecordKind::LabReport);
        assert_eq!(record.ordinal(), None);
    }
}
