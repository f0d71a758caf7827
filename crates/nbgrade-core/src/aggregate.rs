//! Aggregation of element results into the final [`AnalysisResult`].
//!
//! Totals, the narrative assessment, recommendations and code fixes are all
//! derived here from the analyzer output. Nothing in this module looks at
//! the notebook again.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analyzer::{analyze, RubricAnalysis, CONFLICTS_NOTE};
use crate::corrections::{fix_for_element, fix_for_issue, tidyverse_conflicts_note, CodeFix};
use crate::model::{Notebook, StudentInfo};
use crate::notebook::extract_student_info;
use crate::questions::QuestionKey;
use crate::rubric::{fmt_points, ElementKey, TOTAL_POINTS};
use crate::scoring::QuestionResponse;

/// Whether the notebook was re-executed before analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Execution was disabled; recorded outputs were analyzed.
    #[default]
    NotAttempted,
    /// Fresh outputs from a successful run were analyzed.
    Executed,
    /// Execution failed; recorded outputs were analyzed instead.
    FallbackUsed { reason: String },
}

/// Overall performance band, keyed by percentage of the maximum score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceBand {
    Excellent,
    Good,
    Satisfactory,
    NeedsImprovement,
    Unsatisfactory,
}

impl PerformanceBand {
    pub fn from_percentage(pct: f64) -> Self {
        if pct >= 90.0 {
            PerformanceBand::Excellent
        } else if pct >= 80.0 {
            PerformanceBand::Good
        } else if pct >= 70.0 {
            PerformanceBand::Satisfactory
        } else if pct >= 60.0 {
            PerformanceBand::NeedsImprovement
        } else {
            PerformanceBand::Unsatisfactory
        }
    }

    /// Template headline used in the written assessment.
    pub fn headline(&self) -> &'static str {
        match self {
            PerformanceBand::Excellent => "Excellent Work!",
            PerformanceBand::Good => "Good Job!",
            PerformanceBand::Satisfactory => "Nice Progress!",
            PerformanceBand::NeedsImprovement => "Keep Working!",
            PerformanceBand::Unsatisfactory => "Let's Regroup",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            PerformanceBand::Excellent => "🌟",
            PerformanceBand::Good => "✅",
            PerformanceBand::Satisfactory => "👍",
            PerformanceBand::NeedsImprovement => "📈",
            PerformanceBand::Unsatisfactory => "💪",
        }
    }
}

impl fmt::Display for PerformanceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PerformanceBand::Excellent => "Excellent",
            PerformanceBand::Good => "Good",
            PerformanceBand::Satisfactory => "Satisfactory",
            PerformanceBand::NeedsImprovement => "Needs Improvement",
            PerformanceBand::Unsatisfactory => "Unsatisfactory",
        };
        f.write_str(s)
    }
}

/// The complete grading outcome for one notebook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisResult {
    pub total_score: f64,
    pub max_score: f64,
    pub element_scores: BTreeMap<ElementKey, f64>,
    pub detailed_feedback: Vec<String>,
    pub missing_elements: Vec<String>,
    pub code_issues: Vec<String>,
    pub question_analysis: BTreeMap<QuestionKey, QuestionResponse>,
    pub recommendations: Vec<String>,
    pub code_fixes: Vec<CodeFix>,
    pub notes: Vec<String>,
    pub overall_assessment: String,
    pub student: StudentInfo,
    pub execution: ExecutionStatus,
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self {
            total_score: 0.0,
            max_score: TOTAL_POINTS,
            element_scores: BTreeMap::new(),
            detailed_feedback: Vec::new(),
            missing_elements: Vec::new(),
            code_issues: Vec::new(),
            question_analysis: BTreeMap::new(),
            recommendations: Vec::new(),
            code_fixes: Vec::new(),
            notes: Vec::new(),
            overall_assessment: String::new(),
            student: StudentInfo::default(),
            execution: ExecutionStatus::default(),
        }
    }
}

impl AnalysisResult {
    /// Result for a notebook that could not be read at all.
    pub fn load_failure(error: impl fmt::Display) -> Self {
        Self {
            detailed_feedback: vec![format!("❌ Error analyzing notebook: {error}")],
            missing_elements: vec!["All elements - notebook could not be analyzed".to_string()],
            code_issues: vec![format!("Notebook analysis failed: {error}")],
            overall_assessment: "Notebook could not be analyzed due to technical issues."
                .to_string(),
            ..Self::default()
        }
    }

    pub fn percentage(&self) -> f64 {
        if self.max_score > 0.0 {
            self.total_score / self.max_score * 100.0
        } else {
            0.0
        }
    }

    pub fn band(&self) -> PerformanceBand {
        PerformanceBand::from_percentage(self.percentage())
    }

    pub fn score_for(&self, key: ElementKey) -> f64 {
        self.element_scores.get(&key).copied().unwrap_or(0.0)
    }
}

const CODE_EXECUTION_REC: &str = "**Code Execution:** Fix any error messages before submitting. Red error text means something went wrong - don't ignore it.";
const STUDY_TIP_REC: &str = "**Study Tip:** Go back through the lecture notebook and run the examples yourself. Practice is how you learn R.";
const ALL_MASTERED: &str =
    "You've mastered all the key concepts for this assignment. Keep up this excellent work!";

/// Load student identity, run the analyzer and aggregate.
pub fn analyze_notebook(notebook: &Notebook, execution: ExecutionStatus) -> AnalysisResult {
    let student = extract_student_info(notebook);
    aggregate(analyze(notebook), student, execution)
}

/// Combine analyzer output into the final result.
pub fn aggregate(
    analysis: RubricAnalysis,
    student: StudentInfo,
    execution: ExecutionStatus,
) -> AnalysisResult {
    let mut result = AnalysisResult {
        student,
        execution,
        question_analysis: analysis.questions,
        ..AnalysisResult::default()
    };

    let mut issues = Vec::new();
    for el in &analysis.elements {
        result.element_scores.insert(el.key, el.score);
        result.detailed_feedback.push(el.feedback.clone());
        result.missing_elements.extend(el.missing.iter().cloned());
        issues.extend(el.issues.iter().cloned());
    }
    issues.extend(analysis.scan.issues.iter().cloned());
    for issue in issues {
        if !result.code_issues.contains(&issue) {
            result.code_issues.push(issue);
        }
    }
    result.total_score = analysis.elements.iter().map(|e| e.score).sum();

    if analysis.scan.conflicts_seen {
        result.notes.push(CONFLICTS_NOTE.to_string());
    }
    if let ExecutionStatus::FallbackUsed { reason } = &result.execution {
        result.notes.push(format!(
            "⚠️ The notebook could not be re-executed ({reason}); grading used the saved outputs, which may be stale."
        ));
    }

    result.recommendations = recommendations(&result);
    if !result.code_issues.is_empty() {
        result.code_fixes = code_fixes(&result, analysis.scan.conflicts_seen);
    }
    result.overall_assessment = assessment(&result);

    tracing::info!(
        total = result.total_score,
        max = result.max_score,
        issues = result.code_issues.len(),
        "analysis aggregated"
    );
    result
}

fn recommendations(result: &AnalysisResult) -> Vec<String> {
    let mut recs: Vec<String> = result
        .element_scores
        .iter()
        .filter_map(|(key, score)| key.element().recommendation_for(*score))
        .map(String::from)
        .collect();

    if !result.code_issues.is_empty() {
        recs.push(CODE_EXECUTION_REC.to_string());
    }
    if result.percentage() < 70.0 {
        recs.push(STUDY_TIP_REC.to_string());
    }
    recs
}

fn code_fixes(result: &AnalysisResult, conflicts_seen: bool) -> Vec<CodeFix> {
    let element_fixes = result
        .element_scores
        .iter()
        .filter(|(key, score)| **score < key.element().recommend_below)
        .filter_map(|(key, score)| fix_for_element(*key, *score));
    let conflicts = conflicts_seen.then(tidyverse_conflicts_note);
    let issue_fixes = result.code_issues.iter().filter_map(|i| fix_for_issue(i));

    let mut fixes: Vec<CodeFix> = Vec::new();
    for fix in element_fixes.chain(conflicts).chain(issue_fixes) {
        if !fixes.iter().any(|f| f.title == fix.title) {
            fixes.push(fix);
        }
    }
    fixes
}

fn opening(pct: f64) -> &'static str {
    if pct >= 85.0 {
        "Strong work! You're getting comfortable with R and starting to think analytically about data. Your technical execution is solid. "
    } else if pct >= 70.0 {
        "You're learning the fundamentals well. With some attention to the details below, you'll be ready for more advanced analysis. "
    } else if pct >= 50.0 {
        "Good effort on this assignment. You're building the foundation skills you need. Don't get discouraged - this stuff takes practice. "
    } else {
        "This is challenging material, so don't worry if it feels overwhelming. Focus on the basics and ask questions when you're stuck. "
    }
}

fn closing(pct: f64) -> &'static str {
    if pct >= 80.0 {
        "Keep this up. You're developing the analytical thinking that employers value."
    } else if pct >= 60.0 {
        "You're making progress. Each assignment builds on the previous one, so nail down these fundamentals."
    } else {
        "Come to office hours if you need help. We can work through any concepts that aren't clicking."
    }
}

fn assessment(result: &AnalysisResult) -> String {
    let pct = result.percentage();
    let band = result.band();
    let mut text = format!(
        "{} **{}** ({:.1}/{} points - {pct:.1}%)\n\n",
        band.emoji(),
        band.headline(),
        result.total_score,
        fmt_points(result.max_score),
    );
    text.push_str(opening(pct));

    if result.recommendations.is_empty() {
        text.push_str(ALL_MASTERED);
    } else {
        text.push_str("Here's what to focus on for next time:\n\n");
        text.push_str(&result.recommendations.join("\n"));
        for fix in &result.code_fixes {
            text.push_str("\n\n");
            text.push_str(&fix.to_markdown());
        }
    }

    text.push_str("\n\n");
    text.push_str(closing(pct));
    text
}
