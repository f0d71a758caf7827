//! Grading records with JSON persistence, and the flat feedback form.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::AnalysisResult;

/// A persisted grading outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingRecord {
    /// Unique record identifier.
    pub id: Uuid,
    /// When the notebook was graded.
    pub created_at: DateTime<Utc>,
    /// Student name as entered by the grader, or scraped from the notebook.
    pub student: String,
    pub assignment: String,
    /// Path of the graded notebook.
    pub notebook: PathBuf,
    pub analysis: AnalysisResult,
}

impl GradingRecord {
    pub fn new(
        student: impl Into<String>,
        assignment: impl Into<String>,
        notebook: impl Into<PathBuf>,
        analysis: AnalysisResult,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            student: student.into(),
            assignment: assignment.into(),
            notebook: notebook.into(),
            analysis,
        }
    }

    /// Save the record as pretty JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize record")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write record to {}", path.display()))?;
        Ok(())
    }

    /// Load a record from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read record from {}", path.display()))?;
        serde_json::from_str(&content).context("failed to parse record JSON")
    }
}

/// Feedback as it may be found in storage: a full record, a bare analysis,
/// or the older flat list of strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeedbackRecord {
    Record(Box<GradingRecord>),
    Structured(Box<AnalysisResult>),
    Legacy(Vec<String>),
}

impl FeedbackRecord {
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read feedback from {}", path.display()))?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(content).context("feedback is not valid JSON")?;
        // A record is recognised by its envelope; anything else object-shaped
        // is taken as a bare analysis.
        if value.get("analysis").is_some() && value.get("id").is_some() {
            let record: GradingRecord =
                serde_json::from_value(value).context("failed to parse grading record")?;
            return Ok(FeedbackRecord::Record(Box::new(record)));
        }
        match value {
            serde_json::Value::Array(_) => Ok(FeedbackRecord::Legacy(
                serde_json::from_value(value).context("legacy feedback must be a list of strings")?,
            )),
            serde_json::Value::Object(_) => Ok(FeedbackRecord::Structured(Box::new(
                serde_json::from_value(value).context("failed to parse analysis JSON")?,
            ))),
            _ => anyhow::bail!("feedback must be a JSON object or list"),
        }
    }
}

/// Render an analysis as the flat list-of-strings form.
pub fn feedback_lines(analysis: &AnalysisResult) -> Vec<String> {
    let mut lines = vec![
        "📋 **DETAILED HOMEWORK ANALYSIS**".to_string(),
        "=".repeat(50),
        String::new(),
        format!(
            "**Final Score: {:.1} / {} points**",
            analysis.total_score,
            crate::rubric::fmt_points(analysis.max_score)
        ),
        String::new(),
        "**DETAILED BREAKDOWN:**".to_string(),
    ];
    lines.extend(analysis.detailed_feedback.iter().cloned());
    lines.extend(analysis.notes.iter().cloned());
    lines.push(String::new());

    if !analysis.missing_elements.is_empty() {
        lines.push("**MISSING ELEMENTS:**".to_string());
        lines.extend(analysis.missing_elements.iter().map(|m| format!("• {m}")));
        lines.push(String::new());
    }

    if !analysis.code_issues.is_empty() {
        lines.push("**CODE ISSUES TO FIX:**".to_string());
        lines.extend(analysis.code_issues.iter().map(|i| format!("• {i}")));
        lines.push(String::new());
    }

    if !analysis.question_analysis.is_empty() {
        lines.push("**REFLECTION QUESTIONS ANALYSIS:**".to_string());
        for (key, q) in &analysis.question_analysis {
            lines.push(format!(
                "• {}: {} ({:.1}/{} points)",
                key.label(),
                q.quality,
                q.score,
                crate::rubric::fmt_points(q.max_score)
            ));
        }
        lines.push(String::new());
    }

    lines.push(analysis.overall_assessment.clone());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{analyze_notebook, ExecutionStatus};
    use crate::model::{Cell, Notebook, OutputRecord};

    fn sample_analysis() -> AnalysisResult {
        let nb = Notebook::new(vec![
            Cell::code("getwd()").with_output(OutputRecord::result("/home")),
            Cell::code("head(sales_df)")
                .with_output(OutputRecord::error("simpleError", "object 'sales_df' not found")),
        ]);
        analyze_notebook(&nb, ExecutionStatus::NotAttempted)
    }

    #[test]
    fn record_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records").join("r.json");
        let record = GradingRecord::new("Ada", "HW1", "hw1.ipynb", sample_analysis());
        record.save_json(&path).unwrap();

        let loaded = GradingRecord::load_json(&path).unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn feedback_record_variants() {
        let record = GradingRecord::new("Ada", "HW1", "hw1.ipynb", sample_analysis());
        let json = serde_json::to_string(&record).unwrap();
        assert!(matches!(
            FeedbackRecord::from_json_str(&json).unwrap(),
            FeedbackRecord::Record(_)
        ));

        let json = serde_json::to_string(&record.analysis).unwrap();
        assert!(matches!(
            FeedbackRecord::from_json_str(&json).unwrap(),
            FeedbackRecord::Structured(_)
        ));

        let legacy = FeedbackRecord::from_json_str(r#"["a", "b"]"#).unwrap();
        assert_eq!(legacy, FeedbackRecord::Legacy(vec!["a".into(), "b".into()]));

        assert!(FeedbackRecord::from_json_str("42").is_err());
        assert!(FeedbackRecord::from_json_str("[1, 2]").is_err());
    }

    #[test]
    fn flat_lines_layout() {
        let analysis = sample_analysis();
        let lines = feedback_lines(&analysis);
        assert_eq!(lines[0], "📋 **DETAILED HOMEWORK ANALYSIS**");
        assert!(lines.iter().any(|l| l.starts_with("**Final Score: 5.0 / 37.5 points**")));
        assert!(lines.iter().any(|l| l == "**MISSING ELEMENTS:**"));
        assert!(lines
            .iter()
            .any(|l| l == "• ERROR: simpleError: object 'sales_df' not found"));
        assert_eq!(lines.last(), Some(&analysis.overall_assessment));
    }
}
