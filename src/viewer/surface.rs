//! Surface layout: `(Document, scale)` → in-memory node tree.
//!
//! The surface is the single drawing description shared by the on-screen
//! viewer and the export rasterizer. Layout always happens at scale 1.0 on a
//! fixed-width sheet; [`Surface::scaled`] applies the viewer zoom afterwards
//! with the transform anchored at the top-center of the sheet.

use serde::{Deserialize, Serialize};

use crate::models::{Column, Document, Marker, Row, Section, SectionLayout};

/// Sheet width in CSS pixels (A4 at 96 dpi).
pub const SHEET_WIDTH: f64 = 794.0;
/// Minimum sheet height (A4 at 96 dpi).
pub const SHEET_MIN_HEIGHT: f64 = 1123.0;
pub const MARGIN: f64 = 40.0;

const CONTENT_WIDTH: f64 = SHEET_WIDTH - 2.0 * MARGIN;
const CELL_PAD: f64 = 6.0;

/// Horizontal advance of one character, as a fraction of the font size.
pub const CHAR_ADVANCE: f64 = 0.75;
/// Line height as a multiple of the font size.
pub const LINE_HEIGHT: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

pub mod palette {
    use super::Color;

    pub const PAPER: Color = Color::rgb(255, 255, 255);
    pub const INK: Color = Color::rgb(31, 41, 55);
    pub const MUTED: Color = Color::rgb(107, 114, 128);
    pub const ACCENT: Color = Color::rgb(15, 118, 110);
    pub const BORDER: Color = Color::rgb(209, 213, 219);
    pub const BAND: Color = Color::rgb(243, 244, 246);
    pub const TAG: Color = Color::rgb(204, 251, 241);
    pub const HIGH: Color = Color::rgb(220, 38, 38);
    pub const LOW: Color = Color::rgb(37, 99, 235);
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Rect {
        rect: Rect,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    /// `(x, y)` is the top-left of the text line box.
    Text {
        x: f64,
        y: f64,
        size: f64,
        content: String,
        color: Color,
        bold: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub width: f64,
    pub height: f64,
    pub scale: f64,
    pub nodes: Vec<Node>,
}

impl Surface {
    /// Copy of this surface with every coordinate multiplied by `scale`.
    pub fn scaled(&self, scale: f64) -> Surface {
        let nodes = self
            .nodes
            .iter()
            .map(|node| match node {
                Node::Rect { rect, fill, stroke } => Node::Rect {
                    rect: Rect {
                        x: rect.x * scale,
                        y: rect.y * scale,
                        w: rect.w * scale,
                        h: rect.h * scale,
                    },
                    fill: *fill,
                    stroke: stroke.map(|s| Stroke {
                        color: s.color,
                        width: s.width * scale,
                    }),
                },
                Node::Text {
                    x,
                    y,
                    size,
                    content,
                    color,
                    bold,
                } => Node::Text {
                    x: x * scale,
                    y: y * scale,
                    size: size * scale,
                    content: content.clone(),
                    color: *color,
                    bold: *bold,
                },
            })
            .collect();

        Surface {
            width: self.width * scale,
            height: self.height * scale,
            scale: self.scale * scale,
            nodes,
        }
    }

    /// Top-left of the sheet inside a viewport of the given width. The sheet
    /// is centered horizontally and pinned to the top, so zoom grows it
    /// around the top-center point.
    pub fn origin_in_viewport(&self, viewport_width: f64) -> (f64, f64) {
        ((viewport_width - self.width) / 2.0, 0.0)
    }

    /// All text content in paint order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Text { content, .. } => Some(content.as_str()),
            Node::Rect { .. } => None,
        })
    }
}

/// Render a document at the given zoom.
pub fn render(document: &Document, scale: f64) -> Surface {
    let surface = layout(document);
    if scale == 1.0 {
        surface
    } else {
        surface.scaled(scale)
    }
}

/// Lay a document out at scale 1.0.
pub fn layout(document: &Document) -> Surface {
    let mut pen = Pen {
        nodes: Vec::new(),
        y: MARGIN,
    };

    for (i, section) in document.sections.iter().enumerate() {
        match &section.layout {
            SectionLayout::Header => {
                pen.header(section);
                if i == 0 {
                    pen.title(&document.title);
                }
            }
            SectionLayout::Fields => pen.fields(section),
            SectionLayout::Table { columns } => pen.table(section, columns),
            SectionLayout::Text => pen.text_box(section),
            SectionLayout::Tags => pen.tags(section),
            SectionLayout::Footer { signature } => pen.footer(section, signature),
        }
    }

    let height = (pen.y + MARGIN).max(SHEET_MIN_HEIGHT);
    let mut nodes = Vec::with_capacity(pen.nodes.len() + 1);
    nodes.push(Node::Rect {
        rect: Rect {
            x: 0.0,
            y: 0.0,
            w: SHEET_WIDTH,
            h: height,
        },
        fill: Some(palette::PAPER),
        stroke: Some(Stroke {
            color: palette::BORDER,
            width: 1.0,
        }),
    });
    nodes.extend(pen.nodes);

    Surface {
        width: SHEET_WIDTH,
        height,
        scale: 1.0,
        nodes,
    }
}

// ─── Layout pen ───────────────────────────────────────────────────────────────

struct Pen {
    nodes: Vec<Node>,
    y: f64,
}

impl Pen {
    fn text(&mut self, x: f64, y: f64, size: f64, content: &str, color: Color, bold: bool) {
        if content.is_empty() {
            return;
        }
        self.nodes.push(Node::Text {
            x,
            y,
            size,
            content: content.to_string(),
            color,
            bold,
        });
    }

    fn rect(&mut self, rect: Rect, fill: Option<Color>, stroke: Option<Color>) {
        self.nodes.push(Node::Rect {
            rect,
            fill,
            stroke: stroke.map(|color| Stroke { color, width: 1.0 }),
        });
    }

    fn rule(&mut self, thickness: f64, color: Color) {
        self.rect(
            Rect {
                x: MARGIN,
                y: self.y,
                w: CONTENT_WIDTH,
                h: thickness,
            },
            Some(color),
            None,
        );
        self.y += thickness;
    }

    fn centered(&mut self, size: f64, content: &str, color: Color, bold: bool) {
        let x = ((SHEET_WIDTH - text_width(content, size)) / 2.0).max(MARGIN);
        self.text(x, self.y, size, content, color, bold);
        self.y += size * LINE_HEIGHT;
    }

    fn section_title(&mut self, title: &str) {
        self.y += 10.0;
        self.text(MARGIN, self.y, 13.0, title, palette::ACCENT, true);
        self.y += 13.0 * LINE_HEIGHT;
        self.rule(1.0, palette::BORDER);
        self.y += 6.0;
    }

    fn header(&mut self, section: &Section) {
        let mut rows = section.rows.iter();
        if let Some(first) = rows.next() {
            self.centered(22.0, cell(first, 0), palette::ACCENT, true);
        }
        for row in rows {
            self.centered(11.0, cell(row, 0), palette::MUTED, false);
        }
        self.y += 6.0;
        self.rule(2.0, palette::ACCENT);
    }

    fn title(&mut self, title: &str) {
        self.y += 10.0;
        self.centered(16.0, &title.to_uppercase(), palette::INK, true);
    }

    /// Label/value pairs, two per line.
    fn fields(&mut self, section: &Section) {
        const SIZE: f64 = 11.0;
        let column_width = CONTENT_WIDTH / 2.0;
        self.section_title(&section.title);

        for pair in section.rows.chunks(2) {
            let mut line_count = 1;
            for (col, row) in pair.iter().enumerate() {
                let x = MARGIN + col as f64 * column_width;
                let label = format!("{}:", cell(row, 0));
                let label_width = text_width(&label, SIZE) + SIZE * CHAR_ADVANCE;
                self.text(x, self.y, SIZE, &label, palette::INK, true);

                let value_width = column_width - label_width - CELL_PAD;
                let lines = wrap_text(cell(row, 1), chars_fitting(value_width, SIZE));
                for (i, line) in lines.iter().enumerate() {
                    let y = self.y + i as f64 * SIZE * LINE_HEIGHT;
                    self.text(x + label_width, y, SIZE, line, palette::INK, false);
                }
                line_count = line_count.max(lines.len());
            }
            self.y += line_count as f64 * SIZE * LINE_HEIGHT;
        }
    }

    fn table(&mut self, section: &Section, columns: &[Column]) {
        const SIZE: f64 = 10.0;
        self.section_title(&section.title);

        let total_pct: f64 = columns.iter().map(|c| f64::from(c.width_pct)).sum::<f64>().max(1.0);
        let widths: Vec<f64> = columns
            .iter()
            .map(|c| CONTENT_WIDTH * f64::from(c.width_pct) / total_pct)
            .collect();

        let headings: Vec<String> = columns.iter().map(|c| c.heading.clone()).collect();
        self.table_row(&headings, &widths, SIZE, Marker::None, Some(palette::BAND), true);
        for row in &section.rows {
            self.table_row(&row.cells, &widths, SIZE, row.marker, None, false);
        }
    }

    fn table_row(
        &mut self,
        cells: &[String],
        widths: &[f64],
        size: f64,
        marker: Marker,
        fill: Option<Color>,
        bold: bool,
    ) {
        let wrapped: Vec<Vec<String>> = widths
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let content = cells.get(i).map(String::as_str).unwrap_or_default();
                wrap_text(content, chars_fitting(w - 2.0 * CELL_PAD, size))
            })
            .collect();
        let lines = wrapped.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let height = lines as f64 * size * LINE_HEIGHT + 2.0 * CELL_PAD;

        let marker_color = match marker {
            Marker::High => Some(palette::HIGH),
            Marker::Low => Some(palette::LOW),
            Marker::None => None,
        };

        let mut x = MARGIN;
        for (i, (width, cell_lines)) in widths.iter().zip(&wrapped).enumerate() {
            self.rect(
                Rect {
                    x,
                    y: self.y,
                    w: *width,
                    h: height,
                },
                fill,
                Some(palette::BORDER),
            );
            // Markers decorate the value column.
            let flagged = i == 1 && marker_color.is_some();
            let color = if flagged {
                marker_color.unwrap_or(palette::INK)
            } else {
                palette::INK
            };
            for (l, line) in cell_lines.iter().enumerate() {
                let y = self.y + CELL_PAD + l as f64 * size * LINE_HEIGHT;
                self.text(x + CELL_PAD, y, size, line, color, bold || flagged);
            }
            if flagged {
                let symbol = marker.symbol();
                let sx = x + width - CELL_PAD - text_width(symbol, size);
                self.text(sx, self.y + CELL_PAD, size, symbol, color, true);
            }
            x += width;
        }
        self.y += height;
    }

    fn text_box(&mut self, section: &Section) {
        const SIZE: f64 = 11.0;
        self.section_title(&section.title);

        let body = section.rows.first().map(|r| cell(r, 0)).unwrap_or_default();
        let lines = wrap_text(body, chars_fitting(CONTENT_WIDTH - 2.0 * CELL_PAD, SIZE));
        let height = lines.len() as f64 * SIZE * LINE_HEIGHT + 2.0 * CELL_PAD;
        self.rect(
            Rect {
                x: MARGIN,
                y: self.y,
                w: CONTENT_WIDTH,
                h: height,
            },
            Some(palette::BAND),
            Some(palette::BORDER),
        );
        for (i, line) in lines.iter().enumerate() {
            let y = self.y + CELL_PAD + i as f64 * SIZE * LINE_HEIGHT;
            self.text(MARGIN + CELL_PAD, y, SIZE, line, palette::INK, false);
        }
        self.y += height;
    }

    fn tags(&mut self, section: &Section) {
        const SIZE: f64 = 10.0;
        const GAP: f64 = 8.0;
        self.section_title(&section.title);

        let height = SIZE * LINE_HEIGHT + CELL_PAD;
        let mut x = MARGIN;
        for row in &section.rows {
            let label = cell(row, 0);
            let width = (text_width(label, SIZE) + 2.0 * CELL_PAD).min(CONTENT_WIDTH);
            if x > MARGIN && x + width > MARGIN + CONTENT_WIDTH {
                x = MARGIN;
                self.y += height + GAP / 2.0;
            }
            self.rect(
                Rect {
                    x,
                    y: self.y,
                    w: width,
                    h: height,
                },
                Some(palette::TAG),
                None,
            );
            self.text(x + CELL_PAD, self.y + CELL_PAD / 2.0, SIZE, label, palette::ACCENT, false);
            x += width + GAP;
        }
        self.y += height;
    }

    /// Notes on the left, signature block on the right.
    fn footer(&mut self, section: &Section, signature: &[String]) {
        const SIZE: f64 = 9.0;
        let signature_width = CONTENT_WIDTH * 0.35;
        let notes_width = CONTENT_WIDTH - signature_width - CELL_PAD;

        self.y += 24.0;
        self.rule(1.0, palette::BORDER);
        self.y += 10.0;
        let top = self.y;

        let mut notes_y = top;
        for row in &section.rows {
            for line in wrap_text(cell(row, 0), chars_fitting(notes_width, SIZE)) {
                self.text(MARGIN, notes_y, SIZE, &line, palette::MUTED, false);
                notes_y += SIZE * LINE_HEIGHT;
            }
        }

        let sx = MARGIN + CONTENT_WIDTH - signature_width;
        let mut sig_y = top + 28.0;
        self.rect(
            Rect {
                x: sx,
                y: sig_y,
                w: signature_width,
                h: 1.0,
            },
            Some(palette::INK),
            None,
        );
        sig_y += 6.0;
        for (i, line) in signature.iter().enumerate() {
            let size = if i == 0 { 11.0 } else { SIZE };
            self.text(sx, sig_y, size, line, palette::INK, i == 0);
            sig_y += size * LINE_HEIGHT;
        }

        self.y = notes_y.max(sig_y);
    }
}

fn cell(row: &Row, index: usize) -> &str {
    row.cells.get(index).map(String::as_str).unwrap_or_default()
}

pub fn text_width(content: &str, size: f64) -> f64 {
    content.chars().count() as f64 * size * CHAR_ADVANCE
}

fn chars_fitting(width: f64, size: f64) -> usize {
    ((width / (size * CHAR_ADVANCE)).floor() as usize).max(1)
}

/// Greedy word wrap. Words longer than a line are split.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        if current_len + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current_len += word.len();
        current.extend(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
