//! Report content, laid out as a flat list of blocks.
//!
//! Building the document is a pure function of the analysis, the names
//! and the grading time; `pdf` only places the blocks on pages.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use nbgrade_core::aggregate::AnalysisResult;
use nbgrade_core::rubric::fmt_points;

use crate::sanitize::clean_text;

/// Feedback items shown under "Detailed Analysis".
const MAX_FEEDBACK_ITEMS: usize = 8;
/// Code issues listed under "Issues Found".
const MAX_ISSUES: usize = 5;
/// Feedback longer than this is split at its "What I'm looking for" part.
const LONG_FEEDBACK: usize = 1000;

const LOOKING_FOR: &str = "What I'm looking for:";

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("valid fence regex"));

/// One unit of report content.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Title(String),
    /// Section heading.
    Heading(String),
    Subheading(String),
    Paragraph(String),
    Bullet(String),
    /// One line of R code, printed in a monospace font.
    Code(String),
    /// Two-column table with bold labels.
    Table(Vec<(String, String)>),
    Spacer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub blocks: Vec<Block>,
}

impl ReportDocument {
    /// All headings, in order.
    pub fn headings(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Heading(h) => Some(h.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Build the report for one graded notebook.
pub fn build_document(
    analysis: &AnalysisResult,
    student: &str,
    assignment: &str,
    graded_on: NaiveDateTime,
) -> ReportDocument {
    let mut blocks = Vec::new();
    header(&mut blocks, analysis, student, assignment, graded_on);
    score_summary(&mut blocks, analysis);
    by_category(&mut blocks, analysis);
    if !analysis.code_issues.is_empty() {
        code_fixes(&mut blocks, analysis);
    }
    if !analysis.question_analysis.is_empty() {
        reflection(&mut blocks, analysis);
    }
    next_steps(&mut blocks, analysis);
    ReportDocument { blocks }
}

fn header(
    blocks: &mut Vec<Block>,
    analysis: &AnalysisResult,
    student: &str,
    assignment: &str,
    graded_on: NaiveDateTime,
) {
    blocks.push(Block::Title("Homework Grading Report".into()));
    blocks.push(Block::Table(vec![
        ("Student Name:".into(), clean_text(student)),
        ("Assignment:".into(), clean_text(assignment)),
        (
            "Graded On:".into(),
            graded_on.format("%B %d, %Y at %I:%M %p").to_string(),
        ),
        (
            "Final Score:".into(),
            format!(
                "{:.1} / {} points ({:.1}%)",
                analysis.total_score,
                fmt_points(analysis.max_score),
                analysis.percentage()
            ),
        ),
    ]));
    blocks.push(Block::Spacer);
}

fn score_summary(blocks: &mut Vec<Block>, analysis: &AnalysisResult) {
    blocks.push(Block::Heading("Score Summary".into()));
    blocks.push(Block::Paragraph(format!(
        "Overall Performance: {} ({:.1}%)",
        analysis.band(),
        analysis.percentage()
    )));

    if !analysis.element_scores.is_empty() {
        blocks.push(Block::Subheading("Component Scores:".into()));
        for (key, score) in &analysis.element_scores {
            blocks.push(Block::Bullet(format!(
                "{}: {score:.1} points",
                key.element().title
            )));
        }
    }
    blocks.push(Block::Spacer);
}

fn category_status(pct: f64) -> &'static str {
    if pct >= 90.0 {
        "Excellent"
    } else if pct >= 80.0 {
        "Good"
    } else if pct >= 70.0 {
        "Satisfactory"
    } else {
        "Needs Work"
    }
}

fn by_category(blocks: &mut Vec<Block>, analysis: &AnalysisResult) {
    blocks.push(Block::Heading("Performance by Category".into()));

    for (key, score) in &analysis.element_scores {
        let element = key.element();
        let pct = if element.max_points > 0.0 {
            score / element.max_points * 100.0
        } else {
            0.0
        };
        blocks.push(Block::Paragraph(format!(
            "[{}] {}: {score:.1}/{} points ({pct:.0}%)",
            category_status(pct),
            element.title,
            fmt_points(element.max_points)
        )));
    }

    let items: Vec<String> = analysis
        .detailed_feedback
        .iter()
        .take(MAX_FEEDBACK_ITEMS)
        .filter(|f| f.trim().chars().count() >= 10)
        .map(|f| clean_text(f))
        .filter(|f| f.chars().count() > 10)
        .collect();

    if !items.is_empty() {
        blocks.push(Block::Subheading("Detailed Analysis:".into()));
        for item in items {
            if item.chars().count() > LONG_FEEDBACK {
                let mut parts = item.split(LOOKING_FOR).map(str::trim);
                if let Some(first) = parts.next() {
                    blocks.push(Block::Bullet(first.to_string()));
                }
                for part in parts.filter(|p| p.chars().count() > 20) {
                    blocks.push(Block::Paragraph(part.to_string()));
                }
            } else {
                blocks.push(Block::Bullet(item));
            }
        }
    }
    blocks.push(Block::Spacer);
}

fn code_fixes(blocks: &mut Vec<Block>, analysis: &AnalysisResult) {
    blocks.push(Block::Heading("Code Issues & Fixes".into()));
    blocks.push(Block::Subheading("Issues Found:".into()));
    for issue in analysis.code_issues.iter().take(MAX_ISSUES) {
        blocks.push(Block::Bullet(
            clean_text(issue).replace("ERROR: ERROR:", "ERROR:"),
        ));
    }

    let fixes: Vec<_> = analysis
        .code_fixes
        .iter()
        .filter(|f| !f.code.is_empty())
        .collect();
    if !fixes.is_empty() {
        blocks.push(Block::Spacer);
        blocks.push(Block::Subheading("Specific Code Solutions:".into()));
        for fix in fixes {
            blocks.push(Block::Subheading(clean_text(&fix.title)));
            let explanation = without_code(&fix.explanation);
            if !explanation.is_empty() {
                blocks.push(Block::Paragraph(explanation));
            }
            if fix.title.contains("File Not Found") {
                working_directory_guidance(blocks);
            }
            blocks.extend(
                fix.code
                    .lines()
                    .filter(|l| !l.trim().is_empty())
                    .map(|l| Block::Code(l.to_string())),
            );
            blocks.push(Block::Spacer);
        }
    }
    blocks.push(Block::Spacer);
}

fn working_directory_guidance(blocks: &mut Vec<Block>) {
    blocks.push(Block::Paragraph(
        "Working Directory Solutions: run getwd() to see where you are, then adjust your file paths."
            .into(),
    ));
    blocks.push(Block::Bullet(
        "If your working directory is the data folder, use read_csv(\"sales_data.csv\")".into(),
    ));
    blocks.push(Block::Bullet(
        "If your working directory is the project root, use read_csv(\"data/sales_data.csv\")"
            .into(),
    ));
}

fn reflection(blocks: &mut Vec<Block>, analysis: &AnalysisResult) {
    blocks.push(Block::Heading("Reflection Questions Feedback".into()));
    for (key, q) in &analysis.question_analysis {
        blocks.push(Block::Subheading(format!(
            "{}: {:.1}/{} points ({})",
            key.label(),
            q.score,
            fmt_points(q.max_score),
            q.quality
        )));
        // Tier remarks only; the fixed "looking for" text is left out.
        let remarks = clean_text(&q.remarks.join(" "));
        if !remarks.is_empty() {
            blocks.push(Block::Paragraph(remarks));
        }
    }
    blocks.push(Block::Spacer);
}

/// Markdown text with fenced code removed, cleaned into one paragraph.
pub fn without_code(text: &str) -> String {
    let prose = CODE_FENCE.replace_all(text, "");
    prose
        .lines()
        .map(clean_text)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Study tips for a score percentage.
pub fn study_tips(pct: f64) -> &'static [&'static str] {
    if pct < 70.0 {
        &[
            "Review the lecture notebook and practice running the examples yourself",
            "Make sure to execute all code cells and check for outputs",
            "Focus on understanding the fundamental concepts before moving to advanced topics",
        ]
    } else if pct < 85.0 {
        &[
            "Good foundation! Focus on providing more detailed explanations in reflection questions",
            "Practice connecting technical concepts to business applications",
        ]
    } else {
        &[
            "Excellent work! Consider exploring additional data analysis techniques",
            "Try applying these concepts to your own datasets",
        ]
    }
}

fn next_steps(blocks: &mut Vec<Block>, analysis: &AnalysisResult) {
    blocks.push(Block::Heading("Next Steps".into()));
    let summary = without_code(&analysis.overall_assessment);
    if !summary.is_empty() {
        blocks.push(Block::Paragraph(summary));
        blocks.push(Block::Spacer);
    }
    blocks.push(Block::Subheading("Study Tips:".into()));
    for tip in study_tips(analysis.percentage()) {
        blocks.push(Block::Bullet(tip.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use nbgrade_core::aggregate::{analyze_notebook, ExecutionStatus};
    use nbgrade_core::model::{Cell, Notebook, OutputRecord};

    fn graded_on() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 9, 15)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap()
    }

    fn with_errors() -> AnalysisResult {
        let nb = Notebook::new(vec![
            Cell::code("getwd()").with_output(OutputRecord::result("/home")),
            Cell::code("sales_df <- read_csv(\"data/sales_data.csv\")").with_output(
                OutputRecord::error("simpleError", "'data/sales_data.csv' does not exist"),
            ),
        ]);
        analyze_notebook(&nb, ExecutionStatus::NotAttempted)
    }

    #[test]
    fn header_table() {
        let doc = build_document(&with_errors(), "Ada ✅ Lovelace", "HW1", graded_on());
        let Block::Table(rows) = &doc.blocks[1] else {
            panic!("expected header table");
        };
        assert_eq!(rows[0], ("Student Name:".into(), "Ada Lovelace".into()));
        assert_eq!(rows[2].1, "September 15, 2024 at 02:30 PM");
        assert!(rows[3].1.contains(" / 37.5 points ("));
    }

    #[test]
    fn sections_with_issues() {
        let doc = build_document(&with_errors(), "Ada", "HW1", graded_on());
        assert_eq!(
            doc.headings(),
            vec![
                "Score Summary",
                "Performance by Category",
                "Code Issues & Fixes",
                "Next Steps",
            ]
        );
        assert!(doc
            .blocks
            .iter()
            .any(|b| matches!(b, Block::Code(line) if line.contains("read_csv"))));
    }

    #[test]
    fn no_fixes_section_without_issues() {
        let analysis = AnalysisResult::default();
        let doc = build_document(&analysis, "Ada", "HW1", graded_on());
        assert!(!doc.headings().contains(&"Code Issues & Fixes"));
        assert!(!doc.headings().contains(&"Reflection Questions Feedback"));
    }

    #[test]
    fn category_status_thresholds() {
        assert_eq!(category_status(95.0), "Excellent");
        assert_eq!(category_status(80.0), "Good");
        assert_eq!(category_status(70.0), "Satisfactory");
        assert_eq!(category_status(69.9), "Needs Work");
    }

    #[test]
    fn assessment_drops_code_blocks() {
        let text = "👍 **Nice Progress!**\n\nFix this:\n```r\nsetwd(\"x\")\n```\nKeep going.";
        assert_eq!(without_code(text), "Nice Progress! Fix this: Keep going.");
    }

    #[test]
    fn study_tips_by_band() {
        assert_eq!(study_tips(50.0).len(), 3);
        assert!(study_tips(75.0)[0].starts_with("Good foundation"));
        assert!(study_tips(90.0)[0].starts_with("Excellent work"));
    }

    #[test]
    fn feedback_items_are_capped() {
        let analysis = AnalysisResult {
            detailed_feedback: (0..12).map(|i| format!("✅ **Item {i}** long enough")).collect(),
            ..AnalysisResult::default()
        };
        let doc = build_document(&analysis, "Ada", "HW1", graded_on());
        let bullets = doc
            .blocks
            .iter()
            .filter(|b| matches!(b, Block::Bullet(t) if t.starts_with("Item")))
            .count();
        assert_eq!(bullets, MAX_FEEDBACK_ITEMS);
    }
}
