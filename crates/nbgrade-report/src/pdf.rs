//! PDF writer.
//!
//! Places [`Block`]s on US Letter pages using the standard Type1 fonts.
//! Line breaking uses an average glyph width per font, which is close
//! enough for feedback prose and exact for the monospace code lines.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::document::{Block, ReportDocument};
use crate::sanitize::{filename_token, pdf_safe};

const PAGE_WIDTH: f64 = 612.0;
const PAGE_HEIGHT: f64 = 792.0;
const MARGIN_X: f64 = 54.0;
const MARGIN_TOP: f64 = 36.0;
const MARGIN_BOTTOM: f64 = 54.0;
const CONTENT_WIDTH: f64 = PAGE_WIDTH - 2.0 * MARGIN_X;

const LABEL_COLUMN: f64 = 144.0;
const VALUE_COLUMN: f64 = 288.0;
const CELL_PADDING: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Font {
    Regular,
    Bold,
    Mono,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Mono => "F3",
        }
    }

    /// Average advance width as a fraction of the font size.
    fn width_factor(self) -> f64 {
        match self {
            Font::Regular => 0.52,
            Font::Bold => 0.57,
            Font::Mono => 0.6,
        }
    }

    fn chars_per_line(self, size: f64, width: f64) -> usize {
        ((width / (size * self.width_factor())).floor() as usize).max(1)
    }
}

/// Greedy word wrap to at most `max_chars` per line. Words longer than a
/// line are split.
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Accumulates content operations page by page.
struct Layout {
    pages: Vec<Vec<Operation>>,
    ops: Vec<Operation>,
    /// Current baseline position, measured from the page bottom.
    y: f64,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            ops: Vec::new(),
            y: PAGE_HEIGHT - MARGIN_TOP,
        }
    }

    fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.ops));
        self.y = PAGE_HEIGHT - MARGIN_TOP;
    }

    /// Start a new page unless `height` still fits above the bottom margin.
    fn ensure(&mut self, height: f64) {
        if self.y - height < MARGIN_BOTTOM && !self.ops.is_empty() {
            self.new_page();
        }
    }

    fn skip(&mut self, height: f64) {
        self.y -= height;
    }

    fn text_at(&mut self, font: Font, size: f64, x: f64, y: f64, text: &str) {
        self.ops.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![
                    Object::Name(font.resource().as_bytes().to_vec()),
                    Object::Integer(size.round() as i64),
                ],
            ),
            Operation::new(
                "Td",
                vec![Object::Integer(x.round() as i64), Object::Integer(y.round() as i64)],
            ),
            Operation::new("Tj", vec![Object::string_literal(pdf_safe(text))]),
            Operation::new("ET", vec![]),
        ]);
    }

    /// Write wrapped text, one line per `leading`, starting at the next
    /// baseline. Continuation lines use `hang` instead of `indent`.
    fn lines(&mut self, font: Font, size: f64, leading: f64, indent: f64, hang: f64, text: &str) {
        let width = CONTENT_WIDTH - hang.max(indent);
        for (i, line) in wrap(text, font.chars_per_line(size, width))
            .iter()
            .enumerate()
        {
            self.ensure(leading);
            self.y -= leading;
            let x = MARGIN_X + if i == 0 { indent } else { hang };
            let y = self.y;
            self.text_at(font, size, x, y, line);
        }
    }

    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.ops.extend([
            Operation::new(
                "re",
                vec![
                    Object::Integer(x.round() as i64),
                    Object::Integer(y.round() as i64),
                    Object::Integer(w.round() as i64),
                    Object::Integer(h.round() as i64),
                ],
            ),
            Operation::new("S", vec![]),
        ]);
    }

    fn table(&mut self, rows: &[(String, String)]) {
        const SIZE: f64 = 10.0;
        const LEADING: f64 = 13.0;
        let value_chars = Font::Regular.chars_per_line(SIZE, VALUE_COLUMN - 2.0 * CELL_PADDING);

        for (label, value) in rows {
            let value_lines = wrap(value, value_chars);
            let height = LEADING * value_lines.len().max(1) as f64 + CELL_PADDING;
            self.ensure(height);
            let top = self.y;
            let bottom = top - height;

            self.stroke_rect(MARGIN_X, bottom, LABEL_COLUMN, height);
            self.stroke_rect(MARGIN_X + LABEL_COLUMN, bottom, VALUE_COLUMN, height);

            let first_baseline = top - LEADING + 2.0;
            self.text_at(Font::Bold, SIZE, MARGIN_X + CELL_PADDING, first_baseline, label);
            for (i, line) in value_lines.iter().enumerate() {
                self.text_at(
                    Font::Regular,
                    SIZE,
                    MARGIN_X + LABEL_COLUMN + CELL_PADDING,
                    first_baseline - LEADING * i as f64,
                    line,
                );
            }
            self.y = bottom;
        }
    }

    fn block(&mut self, block: &Block) {
        match block {
            Block::Title(text) => {
                let size = 18.0;
                let width = text.chars().count() as f64 * size * Font::Bold.width_factor();
                self.y -= 24.0;
                let y = self.y;
                self.text_at(Font::Bold, size, (PAGE_WIDTH - width) / 2.0, y, text);
                self.skip(20.0);
            }
            Block::Heading(text) => {
                // Keep a heading together with at least two following lines.
                self.ensure(18.0 + 8.0 + 26.0);
                self.skip(8.0);
                self.lines(Font::Bold, 14.0, 18.0, 0.0, 0.0, text);
                self.skip(4.0);
            }
            Block::Subheading(text) => {
                self.ensure(15.0 + 4.0 + 13.0);
                self.skip(4.0);
                self.lines(Font::Bold, 11.0, 15.0, 0.0, 0.0, text);
            }
            Block::Paragraph(text) => self.lines(Font::Regular, 10.0, 13.0, 0.0, 0.0, text),
            Block::Bullet(text) => {
                self.lines(Font::Regular, 10.0, 13.0, 12.0, 22.0, &format!("- {text}"))
            }
            Block::Code(line) => {
                // Code keeps its leading spaces; wrap only what overflows.
                let indent = line.len() - line.trim_start().len();
                let text = format!("{}{}", " ".repeat(indent), line.trim_start());
                let max = Font::Mono.chars_per_line(9.0, CONTENT_WIDTH - 20.0);
                let chars: Vec<char> = text.chars().collect();
                for chunk in chars.chunks(max) {
                    self.ensure(11.0);
                    self.y -= 11.0;
                    let y = self.y;
                    let chunk: String = chunk.iter().collect();
                    self.text_at(Font::Mono, 9.0, MARGIN_X + 20.0, y, &chunk);
                }
            }
            Block::Table(rows) => self.table(rows),
            Block::Spacer => self.skip(10.0),
        }
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        if !self.ops.is_empty() || self.pages.is_empty() {
            self.new_page();
        }
        let total = self.pages.len();
        for (i, ops) in self.pages.iter_mut().enumerate() {
            let label = format!("Page {} of {total}", i + 1);
            ops.extend([
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(b"F1".to_vec()), Object::Integer(8)],
                ),
                Operation::new(
                    "Td",
                    vec![
                        Object::Integer((PAGE_WIDTH - MARGIN_X - 50.0) as i64),
                        Object::Integer((MARGIN_BOTTOM / 2.0) as i64),
                    ],
                ),
                Operation::new("Tj", vec![Object::string_literal(label)]),
                Operation::new("ET", vec![]),
            ]);
        }
        self.pages
    }
}

fn layout(report: &ReportDocument) -> Vec<Vec<Operation>> {
    let mut layout = Layout::new();
    for block in &report.blocks {
        layout.block(block);
    }
    layout.finish()
}

fn font(base: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Build the PDF document for a report.
pub fn render_pdf(report: &ReportDocument, title: &str) -> Result<Document> {
    let pages = layout(report);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular = doc.add_object(font("Helvetica"));
    let bold = doc.add_object(font("Helvetica-Bold"));
    let mono = doc.add_object(font("Courier"));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
            "F3" => mono,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let encoded = content.encode().context("failed to encode page content")?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH as i64),
                Object::Integer(PAGE_HEIGHT as i64),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(pdf_safe(title)),
        "Producer" => Object::string_literal("nbgrade"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    Ok(doc)
}

/// Render `report` and save it to `path`, creating parent directories.
pub fn write_pdf(report: &ReportDocument, title: &str, path: &Path) -> Result<()> {
    let mut doc = render_pdf(report, title)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    doc.save(path)
        .with_context(|| format!("failed to write PDF to {}", path.display()))?;
    Ok(())
}

/// `<reports_dir>/<assignment>/<student>_report_<YYYYmmdd_HHMMSS>.pdf`
pub fn report_path(
    reports_dir: &Path,
    student: &str,
    assignment: &str,
    at: NaiveDateTime,
) -> PathBuf {
    reports_dir
        .join(filename_token(assignment, "Unknown_Assignment"))
        .join(format!(
            "{}_report_{}.pdf",
            filename_token(student, "Unknown_Student"),
            at.format("%Y%m%d_%H%M%S")
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 9, 15)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap()
    }

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(
            wrap("the quick brown fox jumps", 10),
            vec!["the quick", "brown fox", "jumps"]
        );
        assert_eq!(wrap("", 10), Vec::<String>::new());
        assert_eq!(wrap("abcdefghijkl", 5), vec!["abcde", "fghij", "kl"]);
    }

    #[test]
    fn report_path_layout() {
        let path = report_path(Path::new("reports"), "Ada Lovelace", "HW 1", at());
        assert_eq!(
            path,
            PathBuf::from("reports/HW_1/Ada_Lovelace_report_20240915_090507.pdf")
        );
        let path = report_path(Path::new("reports"), "", "HW1", at());
        assert!(path.ends_with("HW1/Unknown_Student_report_20240915_090507.pdf"));
    }

    #[test]
    fn long_documents_paginate() {
        let blocks = (0..200)
            .map(|i| Block::Paragraph(format!("Paragraph number {i} with some text")))
            .collect();
        let pages = layout(&ReportDocument { blocks });
        assert!(pages.len() > 1);
    }

    #[test]
    fn writes_pdf_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.pdf");
        let report = ReportDocument {
            blocks: vec![
                Block::Title("Homework Grading Report".into()),
                Block::Table(vec![("Student Name:".into(), "Ada (Lovelace)".into())]),
                Block::Heading("Score Summary".into()),
                Block::Bullet("Working Directory: 2.0 points".into()),
                Block::Code("sales_df <- read_csv(\"data/sales_data.csv\")".into()),
            ],
        };
        write_pdf(&report, "Ada - HW1", &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        let loaded = Document::load(&path).unwrap();
        assert_eq!(loaded.get_pages().len(), 1);
    }
}
