//! Core data model types for nbgrade.
//!
//! A notebook is reduced to an ordered list of [`Cell`]s. Cells are immutable
//! once loaded and every analyzer reads them through the helpers below.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a notebook cell. Raw cells are dropped by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Code,
    Markdown,
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellKind::Code => write!(f, "code"),
            CellKind::Markdown => write!(f, "markdown"),
        }
    }
}

/// The kind of a recorded cell output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// `execute_result` or `display_data`.
    Result,
    /// An `error` record raised by the kernel.
    Error,
    /// Text written to stdout or stderr.
    Stream,
}

/// One recorded output of a code cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub kind: OutputKind,
    /// Stream name (`stdout` / `stderr`) for stream records.
    #[serde(default)]
    pub name: Option<String>,
    /// Exception class name for error records.
    #[serde(default)]
    pub error_name: Option<String>,
    /// Exception message for error records.
    #[serde(default)]
    pub error_detail: Option<String>,
    /// Plain text payload, if any.
    #[serde(default)]
    pub text: Option<String>,
}

impl OutputRecord {
    pub fn result(text: impl Into<String>) -> Self {
        Self {
            kind: OutputKind::Result,
            name: None,
            error_name: None,
            error_detail: None,
            text: Some(text.into()),
        }
    }

    pub fn stream(name: &str, text: impl Into<String>) -> Self {
        Self {
            kind: OutputKind::Stream,
            name: Some(name.to_string()),
            error_name: None,
            error_detail: None,
            text: Some(text.into()),
        }
    }

    pub fn error(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind: OutputKind::Error,
            name: None,
            error_name: Some(name.into()),
            error_detail: Some(detail.into()),
            text: None,
        }
    }

    /// Returns the text of a stderr stream record.
    pub fn stderr_text(&self) -> Option<&str> {
        match (self.kind, self.name.as_deref()) {
            (OutputKind::Stream, Some("stderr")) => self.text.as_deref(),
            _ => None,
        }
    }
}

/// A single notebook cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub kind: CellKind,
    pub source: String,
    #[serde(default)]
    pub outputs: Vec<OutputRecord>,
    /// Kernel execution counter, when it was recorded as a number.
    #[serde(default)]
    pub execution_index: Option<i64>,
}

impl Cell {
    pub fn code(source: impl Into<String>) -> Self {
        Self {
            kind: CellKind::Code,
            source: source.into(),
            outputs: Vec::new(),
            execution_index: None,
        }
    }

    pub fn markdown(source: impl Into<String>) -> Self {
        Self {
            kind: CellKind::Markdown,
            source: source.into(),
            outputs: Vec::new(),
            execution_index: None,
        }
    }

    pub fn with_output(mut self, output: OutputRecord) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn with_execution_index(mut self, index: i64) -> Self {
        self.execution_index = Some(index);
        self
    }

    pub fn is_code(&self) -> bool {
        self.kind == CellKind::Code
    }

    pub fn has_output(&self) -> bool {
        !self.outputs.is_empty()
    }

    /// A cell counts as executed when it shows output or carries a counter.
    pub fn was_executed(&self) -> bool {
        self.has_output() || self.execution_index.is_some()
    }

    /// Returns true if any output is an explicit error record.
    pub fn has_error_record(&self) -> bool {
        self.outputs.iter().any(|o| o.kind == OutputKind::Error)
    }
}

/// Student identity scraped from the notebook header cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentInfo {
    pub name: String,
    pub id: String,
    pub submission_date: String,
}

pub const UNKNOWN: &str = "Unknown";

impl Default for StudentInfo {
    fn default() -> Self {
        Self {
            name: UNKNOWN.to_string(),
            id: UNKNOWN.to_string(),
            submission_date: UNKNOWN.to_string(),
        }
    }
}

impl StudentInfo {
    /// Returns the student name unless it was never found.
    pub fn known_name(&self) -> Option<&str> {
        (self.name != UNKNOWN).then_some(self.name.as_str())
    }
}

/// A loaded notebook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    pub cells: Vec<Cell>,
}

impl Notebook {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn code_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| c.kind == CellKind::Code)
    }

    pub fn markdown_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| c.kind == CellKind::Markdown)
    }

    /// All markdown sources joined by newlines, in cell order.
    pub fn markdown_text(&self) -> String {
        self.markdown_cells()
            .map(|c| c.source.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// All code sources joined by newlines, in cell order.
    pub fn code_text(&self) -> String {
        self.code_cells()
            .map(|c| c.source.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executed_detection() {
        let bare = Cell::code("getwd()");
        assert!(!bare.was_executed());

        let counted = Cell::code("getwd()").with_execution_index(3);
        assert!(counted.was_executed());
        assert!(!counted.has_output());

        let shown = Cell::code("getwd()").with_output(OutputRecord::result("/home"));
        assert!(shown.was_executed());
    }

    #[test]
    fn stderr_text_only_for_stderr_streams() {
        assert_eq!(
            OutputRecord::stream("stderr", "boom").stderr_text(),
            Some("boom")
        );
        assert_eq!(OutputRecord::stream("stdout", "hi").stderr_text(), None);
        assert_eq!(OutputRecord::result("x").stderr_text(), None);
    }

    #[test]
    fn markdown_text_joins_in_order() {
        let nb = Notebook::new(vec![
            Cell::markdown("# Title"),
            Cell::code("x <- 1"),
            Cell::markdown("Body"),
        ]);
        assert_eq!(nb.markdown_text(), "# Title\nBody");
        assert_eq!(nb.code_text(), "x <- 1");
    }

    #[test]
    fn cell_serde_roundtrip() {
        let cell = Cell::code("head(sales_df)")
            .with_output(OutputRecord::error("simpleError", "object not found"))
            .with_execution_index(2);
        let json = serde_json::to_string(&cell).unwrap();
        let back: Cell = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cell);
        assert!(back.has_error_record());
    }
}
