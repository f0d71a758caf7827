//! Notebook document loader.
//!
//! Reads nbformat-4 JSON into a [`Notebook`]. The reader is deliberately
//! lenient: missing output lists, null or string execution counters, and
//! sources split into line arrays are all accepted.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::LoadError;
use crate::model::{Cell, CellKind, Notebook, OutputKind, OutputRecord, StudentInfo};

/// Number of leading cells searched for student identity.
const HEADER_CELLS: usize = 5;

/// Read and parse a notebook file.
pub fn load_notebook(path: &Path) -> Result<Notebook, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_notebook_str(&content)
}

/// Parse a notebook document held in memory.
pub fn parse_notebook_str(content: &str) -> Result<Notebook, LoadError> {
    let doc: Value = serde_json::from_str(content)?;
    let cells = doc
        .get("cells")
        .and_then(Value::as_array)
        .ok_or_else(|| LoadError::Malformed("missing `cells` array".into()))?;

    let cells = cells.iter().filter_map(parse_cell).collect();
    Ok(Notebook { cells })
}

fn parse_cell(raw: &Value) -> Option<Cell> {
    let kind = match raw.get("cell_type").and_then(Value::as_str) {
        Some("code") => CellKind::Code,
        Some("markdown") => CellKind::Markdown,
        other => {
            tracing::debug!("skipping cell of type {:?}", other);
            return None;
        }
    };

    let source = raw.get("source").map(join_text).unwrap_or_default();

    let outputs = raw
        .get("outputs")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().map(parse_output).collect())
        .unwrap_or_default();

    let execution_index = raw.get("execution_count").and_then(parse_counter);

    Some(Cell {
        kind,
        source,
        outputs,
        execution_index,
    })
}

fn parse_output(raw: &Value) -> OutputRecord {
    let output_type = raw.get("output_type").and_then(Value::as_str);
    let kind = match output_type {
        Some("error") => OutputKind::Error,
        Some("stream") => OutputKind::Stream,
        _ => OutputKind::Result,
    };

    let text = match kind {
        OutputKind::Stream => raw.get("text").map(join_text),
        OutputKind::Result => raw
            .get("data")
            .and_then(|d| d.get("text/plain"))
            .map(join_text),
        OutputKind::Error => None,
    };

    OutputRecord {
        kind,
        name: raw.get("name").and_then(Value::as_str).map(String::from),
        error_name: raw.get("ename").and_then(Value::as_str).map(String::from),
        error_detail: raw.get("evalue").and_then(Value::as_str).map(String::from),
        text,
    }
}

/// nbformat allows multiline strings to be stored as a list of lines.
fn join_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts.iter().filter_map(Value::as_str).collect(),
        _ => String::new(),
    }
}

fn parse_counter(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) => {
            s.parse().ok()
        }
        _ => None,
    }
}

static NAME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(?i)\*\*Student Name:\*\*\s*\[?([^\]\n]+)\]?",
        r"(?i)Student Name:\s*\[?([^\]\n]+)\]?",
        r"(?i)\*\*Name:\*\*\s*\[?([^\]\n]+)\]?",
        r"(?i)Name:\s*\[?([^\]\n]+)\]?",
        r"(?i)student[:\s]+([^\n\]]+)",
        r"(?i)name[:\s]+([^\n\]]+)",
    ])
});

static DATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(?i)\*\*Date:\*\*\s*\[?([^\]\n]+)\]?",
        r"(?i)Date:\s*\[?([^\]\n]+)\]?",
    ])
});

static ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(?i)\*\*Student ID:\*\*\s*\[?([^\]\n]+)\]?",
        r"(?i)Student ID:\s*\[?([^\]\n]+)\]?",
        r"(?i)ID:\s*\[?([^\]\n]+)\]?",
    ])
});

fn compile_all(sources: &[&str]) -> Vec<Regex> {
    sources
        .iter()
        .map(|s| Regex::new(s).expect("static student-info pattern"))
        .collect()
}

const NAME_PLACEHOLDERS: &[&str] = &[
    "your name here",
    "name",
    "student name",
    "[your name here]",
    "unknown",
];
const DATE_PLACEHOLDERS: &[&str] = &["today's date", "date", "[today's date]", "unknown"];
const ID_PLACEHOLDERS: &[&str] = &["your id here", "id", "student id", "[your id here]", "unknown"];

/// Scrape student name, id and submission date from the first markdown cells.
///
/// The first non-placeholder value found for each field wins.
pub fn extract_student_info(notebook: &Notebook) -> StudentInfo {
    let mut info = StudentInfo::default();
    let mut name = None;
    let mut id = None;
    let mut date = None;

    for cell in notebook
        .cells
        .iter()
        .take(HEADER_CELLS)
        .filter(|c| c.kind == CellKind::Markdown)
    {
        if name.is_none() {
            name = first_capture(&NAME_PATTERNS, &cell.source, NAME_PLACEHOLDERS);
        }
        if date.is_none() {
            date = first_capture(&DATE_PATTERNS, &cell.source, DATE_PLACEHOLDERS);
        }
        if id.is_none() {
            id = first_capture(&ID_PATTERNS, &cell.source, ID_PLACEHOLDERS);
        }
    }

    if let Some(n) = name {
        info.name = n;
    }
    if let Some(i) = id {
        info.id = i;
    }
    if let Some(d) = date {
        info.submission_date = d;
    }
    info
}

/// The first pattern that yields a value decides the field. A placeholder
/// there leaves the field unknown; the looser patterns are not tried.
fn first_capture(patterns: &[Regex], text: &str, placeholders: &[&str]) -> Option<String> {
    for re in patterns {
        let Some(raw) = re.captures(text).and_then(|c| c.get(1)) else {
            continue;
        };
        let value = clean_capture(raw.as_str());
        if value.is_empty() {
            continue;
        }
        let lower = value.to_lowercase();
        return (!placeholders.contains(&lower.as_str())).then(|| value.to_string());
    }
    None
}

fn clean_capture(raw: &str) -> &str {
    raw.trim_matches(|c: char| c == '*' || c == '[' || c == ']' || c.is_whitespace())
}
