//! Canonical, display-ready document produced by the template compiler.
//!
//! A `Document` owns plain strings only. It never points back at the record
//! it was compiled from, so a record edited after compilation cannot change
//! what an open viewer or an in-flight export shows.

use serde::{Deserialize, Serialize};

use super::enums::{Marker, RecordKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub kind: RecordKind,
    pub title: String,
    pub identifier: DocumentIdentifier,
    /// Backend ordinal id, used for fallback filenames.
    pub ordinal: Option<i64>,
    pub sections: Vec<Section>,
}

/// Identifier shown on the sheet.
///
/// `issued == false` marks a display placeholder synthesized because the
/// record carried no identifier; it must not be treated as a real one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentIdentifier {
    pub value: String,
    pub issued: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub layout: SectionLayout,
    pub rows: Vec<Row>,
}

/// Fixed visual template a section maps onto.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SectionLayout {
    /// Letterhead band: first row is the heading, the rest are sub-lines.
    Header,
    /// Label/value pairs.
    Fields,
    /// Column table; every row has one cell per column.
    Table { columns: Vec<Column> },
    /// A boxed free-text paragraph (single row, single cell).
    Text,
    /// Inline tags, one per row.
    Tags,
    /// Notes on the left, signature block on the right.
    Footer { signature: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub heading: String,
    /// Relative width in percent of the table width.
    pub width_pct: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub cells: Vec<String>,
    #[serde(default)]
    pub marker: Marker,
}

impl Row {
    pub fn field(label: &str, value: impl Into<String>) -> Self {
        Self {
            cells: vec![label.to_string(), value.into()],
            marker: Marker::None,
        }
    }

    pub fn line(text: impl Into<String>) -> Self {
        Self {
            cells: vec![text.into()],
            marker: Marker::None,
        }
    }

    pub fn cells(cells: Vec<String>) -> Self {
        Self {
            cells,
            marker: Marker::None,
        }
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.marker = marker;
        self
    }
}

impl Column {
    pub fn new(heading: &str, width_pct: u8) -> Self {
        Self {
            heading: heading.to_string(),
            width_pct,
        }
    }
}

impl Document {
    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.title == title)
    }
}

impl Section {
    /// Value of a label/value row, for `Fields` sections.
    pub fn field(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| r.cells.first().map(String::as_str) == Some(label))
            .and_then(|r| r.cells.get(1))
            .map(String::as_str)
    }
}
