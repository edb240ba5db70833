//! Document template compiler — record → canonical [`Document`].
//!
//! One fixed schema per record kind. Every schema field is always present in
//! the output: values missing from the record resolve through documented
//! fallback chains and finally to a placeholder, never to an error. Derived
//! fields (age, formatted dates, padded medication rows, placeholder
//! identifiers, lab markers) are computed here once so the viewer and the
//! export pipeline show exactly the same content.
//!
//! Compilation is a pure function of `(record, reference date)`.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde_json::Value;
use uuid::Uuid;

use crate::annotator;
use crate::models::{
    Column, Document, DocumentIdentifier, LabReport, LabResult, Medication, Prescription, Record,
    RecordKind, Row, Section, SectionLayout,
};

/// Generic placeholder for any field the record does not supply.
pub const PLACEHOLDER: &str = "N/A";

/// Placeholder for a missing or unparseable date.
pub const DATE_PLACEHOLDER: &str = "--/--/----";

/// The on-screen medication table always shows at least this many rows.
pub const MIN_MEDICATION_ROWS: usize = 5;

/// Section titles, shared with the viewer layout and tests.
pub mod titles {
    pub const CLINIC: &str = "Clinic";
    pub const PRESCRIPTION_DETAILS: &str = "Prescription Details";
    pub const PATIENT_DETAILS: &str = "Patient Details";
    pub const DIAGNOSIS: &str = "Diagnosis";
    pub const MEDICATIONS: &str = "Medications";
    pub const LAB_REPORTS: &str = "Lab Reports Recommended";
    pub const DIET: &str = "Diet to Follow";
    pub const INSTRUCTIONS: &str = "Instructions";
    pub const HISTORY: &str = "History";
    pub const FOLLOW_UP: &str = "Next Follow-up";
    pub const FOOTER: &str = "Footer";

    pub const LABORATORY_HEADER: &str = "Laboratory Header";
    pub const REPORT: &str = "Report Details";
    pub const TEST_DETAILS: &str = "Test Details";
    pub const LABORATORY: &str = "Laboratory";
    pub const RESULTS: &str = "Results";
    pub const NOTES: &str = "Interpretation / Clinical Notes";
}

// Namespace for placeholder identifiers (UUID v5 of kind + ordinal).
const PLACEHOLDER_NAMESPACE: Uuid = Uuid::from_u128(0x6c1f_4d2e_9a57_4b0c_8e21_d3f0_a9b4_7e15);

// ─── Entry points ─────────────────────────────────────────────────────────────

/// Compile a record as of `today` (the reference date for age derivation).
pub fn compile(record: &Record, today: NaiveDate) -> Document {
    match record {
        Record::Prescription(p) => compile_prescription(p, today),
        Record::LabReport(r) => compile_lab_report(r, today),
    }
}

/// Compile a raw collaborator object of the given kind.
pub fn compile_value(value: Value, kind: RecordKind, today: NaiveDate) -> Document {
    compile(&Record::from_value(value, kind), today)
}

/// Compile as of the local calendar date.
pub fn compile_today(record: &Record) -> Document {
    compile(record, chrono::Local::now().date_naive())
}

// ─── Prescription ─────────────────────────────────────────────────────────────

fn compile_prescription(p: &Prescription, today: NaiveDate) -> Document {
    let identifier = resolve_identifier(
        p.prescription_id.as_deref(),
        RecordKind::Prescription,
        p.id,
        || serde_json::to_vec(p).unwrap_or_default(),
    );

    let doctor = or_placeholder(&p.doctor_name);
    let degree = or_placeholder(&p.doctor_degree);
    let registration = or_placeholder(&p.doctor_registration);

    let header = Section {
        title: titles::CLINIC.into(),
        layout: SectionLayout::Header,
        rows: vec![
            Row::line(p.clinic_name.as_deref().unwrap_or("Medical Clinic")),
            Row::line(format!("{doctor}, {degree}")),
            Row::line(or_placeholder(&p.clinic_address)),
            Row::line(format!(
                "Phone: {} | Reg. No.: {}",
                or_placeholder(&p.clinic_phone),
                registration
            )),
        ],
    };

    let details = fields(
        titles::PRESCRIPTION_DETAILS,
        vec![
            Row::field("Prescription ID", identifier.value.clone()),
            Row::field("Date", short_date(first(&[&p.date, &p.created_at]))),
            Row::field("Doctor", doctor.clone()),
            Row::field("Specialization", or_placeholder(&p.doctor_specialization)),
        ],
    );

    let patient = fields(
        titles::PATIENT_DETAILS,
        vec![
            Row::field("Patient Name", or_placeholder(&p.patient_name)),
            Row::field("Patient ID", or_placeholder(&p.patient_id)),
            Row::field("Age", display_age(&p.date_of_birth, &p.age, today)),
            Row::field("Gender", or_placeholder(&p.gender)),
            Row::field("Allergies", p.allergies.as_deref().unwrap_or("None")),
        ],
    );

    let diagnosis = fields(
        titles::DIAGNOSIS,
        vec![
            Row::field("Diagnosis", or_placeholder(&p.diagnosis)),
            Row::field("Symptoms", or_placeholder(&p.symptoms)),
        ],
    );

    let medications = Section {
        title: titles::MEDICATIONS.into(),
        layout: SectionLayout::Table {
            columns: vec![
                Column::new("S.No", 8),
                Column::new("Medicine", 34),
                Column::new("Unit (Tablet/Syrup)", 18),
                Column::new("Dosage (Per Day)", 24),
                Column::new("Duration", 16),
            ],
        },
        rows: medication_rows(&p.medications),
    };

    let lab_tags: Vec<Row> = if p.lab_reports.is_empty() {
        vec![Row::line("None")]
    } else {
        p.lab_reports.iter().map(|l| Row::line(l.as_str())).collect()
    };
    let lab_reports = Section {
        title: titles::LAB_REPORTS.into(),
        layout: SectionLayout::Tags,
        rows: lab_tags,
    };

    let diet = text(
        titles::DIET,
        first(&[&p.diet_to_follow, &p.diet]).unwrap_or("Maintain a balanced diet"),
    );
    let instructions = text(
        titles::INSTRUCTIONS,
        first(&[&p.instructions, &p.additional_notes])
            .unwrap_or("Take all medications as prescribed by the doctor."),
    );
    let history = text(
        titles::HISTORY,
        p.history.as_deref().unwrap_or("No significant medical history"),
    );
    let follow_up = text(titles::FOLLOW_UP, &follow_up_label(p));

    let contact = first(&[&p.emergency_contact, &p.clinic_phone]).unwrap_or("Clinic Number");
    let footer = Section {
        title: titles::FOOTER.into(),
        layout: SectionLayout::Footer {
            signature: vec![doctor, degree, format!("Reg. No: {registration}")],
        },
        rows: vec![
            Row::line("* This is a digitally generated prescription"),
            Row::line("* Please bring this prescription for follow-up visits"),
            Row::line(format!("* In case of emergency, contact: {contact}")),
        ],
    };

    Document {
        kind: RecordKind::Prescription,
        title: "Prescription".into(),
        identifier,
        ordinal: p.id,
        sections: vec![
            header,
            details,
            patient,
            diagnosis,
            medications,
            lab_reports,
            diet,
            instructions,
            history,
            follow_up,
            footer,
        ],
    }
}

/// Medication table rows in record order, padded with blank rows up to
/// [`MIN_MEDICATION_ROWS`].
fn medication_rows(medications: &[Medication]) -> Vec<Row> {
    let mut rows: Vec<Row> = medications
        .iter()
        .enumerate()
        .map(|(i, m)| {
            Row::cells(vec![
                (i + 1).to_string(),
                first(&[&m.drug, &m.name]).unwrap_or(PLACEHOLDER).to_string(),
                m.unit.clone().unwrap_or_else(|| "-".into()),
                first(&[&m.dosage, &m.timing, &m.frequency])
                    .unwrap_or("-")
                    .to_string(),
                m.duration
                    .map(|d| format!("{d} days"))
                    .unwrap_or_else(|| "-".into()),
            ])
        })
        .collect();

    while rows.len() < MIN_MEDICATION_ROWS {
        rows.push(Row::cells(vec![String::new(); 5]));
    }
    rows
}

fn follow_up_label(p: &Prescription) -> String {
    if let Some(date) = p.follow_up_date.as_deref() {
        return short_date(Some(date));
    }
    match p.follow_up.as_deref() {
        Some(label) => parse_date(label)
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|| label.to_string()),
        None => PLACEHOLDER.into(),
    }
}

// ─── Lab report ───────────────────────────────────────────────────────────────

fn compile_lab_report(r: &LabReport, today: NaiveDate) -> Document {
    let identifier = resolve_identifier(
        r.report_id.as_deref(),
        RecordKind::LabReport,
        r.id,
        || serde_json::to_vec(r).unwrap_or_default(),
    );

    let lab_name = first(&[&r.lab_name, &r.laboratory_name])
        .unwrap_or("Diagnostic Laboratory")
        .to_string();
    let reg_no = or_placeholder(&r.reg_no);
    let doctor = r
        .doctor_name
        .as_deref()
        .map(with_doctor_prefix)
        .unwrap_or_else(|| "Pathologist".into());
    let specialization = r
        .doctor_specialization
        .clone()
        .unwrap_or_else(|| "MD Pathology".into());

    let header = Section {
        title: titles::LABORATORY_HEADER.into(),
        layout: SectionLayout::Header,
        rows: vec![
            Row::line(lab_name.clone()),
            Row::line("Comprehensive Pathology & Diagnostics"),
            Row::line(or_placeholder(&r.lab_address)),
            Row::line(format!(
                "Phone: {} | Reg. No.: {}",
                or_placeholder(&r.lab_phone),
                reg_no
            )),
        ],
    };

    let report = fields(
        titles::REPORT,
        vec![
            Row::field("Report ID", identifier.value.clone()),
            Row::field("Report Date", long_date(r.date.as_deref())),
        ],
    );

    let age = display_age(&r.date_of_birth, &r.age, today);
    let patient = fields(
        titles::PATIENT_DETAILS,
        vec![
            Row::field("Patient Name", or_placeholder(&r.patient_name)),
            Row::field("Patient ID", or_placeholder(&r.patient_id)),
            Row::field("Age / Gender", format!("{age} / {}", or_placeholder(&r.gender))),
            Row::field("Ref. By", r.referred_by.as_deref().unwrap_or("SELF")),
        ],
    );

    let test = fields(
        titles::TEST_DETAILS,
        vec![
            Row::field("Test Name", r.test_name.as_deref().unwrap_or("Laboratory Test")),
            Row::field("Sample Type", or_placeholder(&r.sample_type)),
            Row::field(
                "Sample Collected",
                short_date(first(&[&r.sample_collected_at, &r.date])),
            ),
            Row::field("Reported On", short_date(first(&[&r.reported_at, &r.date]))),
        ],
    );

    let laboratory = fields(
        titles::LABORATORY,
        vec![
            Row::field("Lab Name", lab_name),
            Row::field("Reg. No", reg_no.clone()),
            Row::field("Doctor", doctor.clone()),
            Row::field("Specialization", specialization.clone()),
        ],
    );

    let results = Section {
        title: titles::RESULTS.into(),
        layout: SectionLayout::Table {
            columns: vec![
                Column::new("Test Name", 40),
                Column::new("Result", 18),
                Column::new("Units", 18),
                Column::new("Reference Range", 24),
            ],
        },
        rows: result_rows(&r.results),
    };

    let notes = text(
        titles::NOTES,
        first(&[&r.notes, &r.doctor_notes]).unwrap_or("No additional notes"),
    );

    let footer = Section {
        title: titles::FOOTER.into(),
        layout: SectionLayout::Footer {
            signature: vec![doctor, specialization, format!("Reg. No: {reg_no}")],
        },
        rows: vec![
            Row::line("This is a computer generated report."),
            Row::line("Results are for clinician use; correlate clinically."),
            Row::line("In case of emergency, contact the laboratory immediately."),
        ],
    };

    Document {
        kind: RecordKind::LabReport,
        title: "Patient Report".into(),
        identifier,
        ordinal: r.id,
        sections: vec![header, report, patient, test, laboratory, results, notes, footer],
    }
}

/// Result rows, each annotated against its reference range.
fn result_rows(results: &[LabResult]) -> Vec<Row> {
    if results.is_empty() {
        return vec![Row::cells(vec![
            "No results available".into(),
            String::new(),
            String::new(),
            String::new(),
        ])];
    }

    results
        .iter()
        .map(|res| {
            let value = res.value.as_deref().unwrap_or(PLACEHOLDER);
            let range = res.range.as_deref().unwrap_or(PLACEHOLDER);
            let marker = annotator::annotate(value, range);
            Row::cells(vec![
                first(&[&res.parameter, &res.test_name]).unwrap_or("Test").to_string(),
                value.to_string(),
                res.unit.clone().unwrap_or_default(),
                range.to_string(),
            ])
            .with_marker(marker)
        })
        .collect()
}

fn with_doctor_prefix(name: &str) -> String {
    if name.starts_with("Dr.") || name.starts_with("Dr ") {
        name.to_string()
    } else {
        format!("Dr. {name}")
    }
}

// ─── Shared derivations ──────────────────────────────────────────────────────

/// Display identifier. A record without one gets a placeholder derived from
/// its kind and ordinal id (or, lacking that, its content), flagged as not
/// issued.
fn resolve_identifier(
    issued: Option<&str>,
    kind: RecordKind,
    ordinal: Option<i64>,
    content: impl FnOnce() -> Vec<u8>,
) -> DocumentIdentifier {
    if let Some(value) = issued {
        return DocumentIdentifier {
            value: value.to_string(),
            issued: true,
        };
    }

    let name = match ordinal {
        Some(id) => format!("{}:{id}", kind.as_str()).into_bytes(),
        None => {
            let mut name = format!("{}:", kind.as_str()).into_bytes();
            name.extend(content());
            name
        }
    };
    let digest = Uuid::new_v5(&PLACEHOLDER_NAMESPACE, &name).simple().to_string();
    let prefix = match kind {
        RecordKind::Prescription => "RX",
        RecordKind::LabReport => "LR",
    };
    DocumentIdentifier {
        value: format!("{prefix}-{}", digest[..8].to_uppercase()),
        issued: false,
    }
}

/// Whole years between `dob` and `today`, counting a year only once the
/// birthday has occurred. `None` for a birth date in the future.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> Option<u32> {
    if dob > today {
        return None;
    }
    let mut years = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

fn display_age(dob: &Option<String>, age: &Option<String>, today: NaiveDate) -> String {
    dob.as_deref()
        .and_then(parse_date)
        .and_then(|d| age_on(d, today))
        .map(|years| format!("{years} years"))
        .or_else(|| age.clone())
        .unwrap_or_else(|| PLACEHOLDER.into())
}

/// Lenient date parsing for the formats the portal emits.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    ["%d/%m/%Y", "%d-%m-%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// `dd/mm/yyyy`; unparseable input renders verbatim.
fn short_date(raw: Option<&str>) -> String {
    match raw {
        Some(raw) => parse_date(raw)
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|| raw.to_string()),
        None => DATE_PLACEHOLDER.into(),
    }
}

/// `dd Mon yyyy`, used on the lab report heading.
fn long_date(raw: Option<&str>) -> String {
    match raw {
        Some(raw) => parse_date(raw)
            .map(|d| d.format("%d %b %Y").to_string())
            .unwrap_or_else(|| raw.to_string()),
        None => DATE_PLACEHOLDER.into(),
    }
}

fn first<'a>(candidates: &[&'a Option<String>]) -> Option<&'a str> {
    candidates.iter().find_map(|c| c.as_deref())
}

fn or_placeholder(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| PLACEHOLDER.into())
}

fn fields(title: &str, rows: Vec<Row>) -> Section {
    Section {
        title: title.into(),
        layout: SectionLayout::Fields,
        rows,
    }
}

fn text(title: &str, body: &str) -> Section {
    Section {
        title: title.into(),
        layout: SectionLayout::Text,
        rows: vec![Row::line(body)],
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
