//! End-to-end pipeline tests with a mock executor.
//!
//! These tests drive the whole grading pipeline (load → execute → analyze →
//! record → PDF) against a complete submission and a broken execution.

use std::path::PathBuf;
use std::sync::Arc;

use nbgrade_core::aggregate::{ExecutionStatus, PerformanceBand};
use nbgrade_core::engine::{Grader, GraderConfig};
use nbgrade_core::model::{Cell, Notebook, OutputRecord};
use nbgrade_core::questions::QuestionKey;
use nbgrade_core::report::{feedback_lines, FeedbackRecord, GradingRecord};
use nbgrade_core::rubric::{ElementKey, TOTAL_POINTS};
use nbgrade_core::scoring::QualityLabel;
use nbgrade_runner::mock::MockExecutor;

const HEADER: &str = "# Homework 1: Loading Data\n**Student Name:** Ada Lovelace\n**Student ID:** 12345";

const DATA_TYPES: &str = "## Question 1: Data Types\n\n\
Look at the Date and Amount columns in sales_df. Are these types appropriate for business analytics?\n\n\
Answer: The Date column was read as character text, so it should be converted to a proper date type \
before we can sort orders or group sales by month. The Amount column is numeric, which is appropriate \
because we can sum and average it. With those fixes the types support business analytics and reporting.";

const DATA_QUALITY: &str = "## Question 2: Data Quality\n\n\
Do you see gaps or unusual patterns in the datasets? Describe any quality issue you notice.\n\n\
Answer: Several rows in the Region column are missing, shown as NA in the summary output. I also noticed \
inconsistent spelling such as North versus NORTH and one duplicate order ID. These issues would affect \
grouped totals and could bias any averages we report, so the impact on later conclusions is real.";

const READINESS: &str = "## Question 3: Analysis Readiness\n\n\
Which dataset is most ready for analysis, and what preprocessing would the others need?\n\n\
Answer: Comparing the three tables, the sales dataset is the most ready because its columns are complete \
and consistently formatted. The comments data is different: the free text is messy, so we would first \
clean the spelling, then transform the ratings into numbers, and next prepare one tidy table for analysis.";

const CODE: &[&str] = &[
    "getwd()",
    "library(tidyverse)",
    "library(readxl)",
    "sales_df <- read_csv(\"data/sales_data.csv\")",
    "ratings_df <- read_excel(\"data/customer_feedback.xlsx\", sheet = \"ratings\")",
    "comments_df <- read_excel(\"data/customer_feedback.xlsx\", sheet = \"customer_feedback\")",
    "head(sales_df)\nhead(ratings_df)\nhead(comments_df)",
    "str(sales_df)",
    "summary(sales_df)",
];

fn markdown() -> Vec<&'static str> {
    vec![HEADER, DATA_TYPES, DATA_QUALITY, READINESS]
}

/// The submission as saved by the student: code never run.
fn write_submission(dir: &tempfile::TempDir) -> PathBuf {
    let mut cells: Vec<serde_json::Value> = Vec::new();
    let md = markdown();
    cells.push(markdown_json(md[0]));
    for src in CODE {
        cells.push(serde_json::json!({
            "cell_type": "code",
            "execution_count": null,
            "metadata": {},
            "source": src,
            "outputs": []
        }));
    }
    for text in &md[1..] {
        cells.push(markdown_json(text));
    }
    let nb = serde_json::json!({
        "cells": cells,
        "metadata": {"kernelspec": {"name": "ir", "language": "R"}},
        "nbformat": 4,
        "nbformat_minor": 5
    });

    let path = dir.path().join("homework1.ipynb");
    std::fs::write(&path, serde_json::to_string_pretty(&nb).unwrap()).unwrap();
    path
}

fn markdown_json(text: &str) -> serde_json::Value {
    serde_json::json!({"cell_type": "markdown", "metadata": {}, "source": text})
}

/// The same notebook after a clean kernel run.
fn executed_notebook() -> Notebook {
    let md = markdown();
    let mut cells = vec![Cell::markdown(md[0])];
    for (i, src) in CODE.iter().enumerate() {
        cells.push(
            Cell::code(*src)
                .with_output(OutputRecord::result("ok"))
                .with_execution_index(i as i64 + 1),
        );
    }
    cells.extend(md[1..].iter().map(|t| Cell::markdown(*t)));
    Notebook::new(cells)
}

fn grader(executor: Arc<MockExecutor>) -> Grader {
    Grader::new(GraderConfig::default()).with_executor(executor)
}

#[tokio::test]
async fn e2e_complete_submission_scores_full_marks() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_submission(&dir);
    let executor = Arc::new(MockExecutor::succeeding(executed_notebook()));

    let result = grader(executor.clone()).grade(&path).await;

    assert_eq!(executor.call_count(), 1);
    let request = executor.last_request().unwrap();
    assert_eq!(request.notebook_path, path);
    assert_eq!(request.code_cells, CODE.len());
    assert_eq!(request.kernel_name, "ir");

    assert_eq!(result.execution, ExecutionStatus::Executed);
    assert_eq!(result.student.name, "Ada Lovelace");
    assert_eq!(result.student.id, "12345");

    assert_eq!(result.max_score, TOTAL_POINTS);
    assert!(
        (result.total_score - TOTAL_POINTS).abs() < 1e-9,
        "expected full marks, got {} with {:?}",
        result.total_score,
        result.element_scores
    );
    assert_eq!(result.band(), PerformanceBand::Excellent);
    assert!(result.overall_assessment.contains("Excellent Work!"));
    assert!(result.recommendations.is_empty());
    assert!(result.code_issues.is_empty());
    assert!(result.code_fixes.is_empty());
    assert!(result.missing_elements.is_empty());

    assert_eq!(result.question_analysis.len(), 3);
    for key in [
        QuestionKey::DataTypes,
        QuestionKey::DataQuality,
        QuestionKey::AnalysisReadiness,
    ] {
        let response = &result.question_analysis[&key];
        assert_eq!(response.quality, QualityLabel::Excellent, "{key}");
        assert!((response.score - response.max_score).abs() < 1e-9, "{key}");
    }
}

#[tokio::test]
async fn e2e_failed_execution_grades_saved_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_submission(&dir);
    let executor = Arc::new(MockExecutor::failing("kernel died"));

    let result = grader(executor.clone()).grade(&path).await;

    assert_eq!(executor.call_count(), 1);
    assert!(matches!(
        &result.execution,
        ExecutionStatus::FallbackUsed { reason } if reason.contains("kernel died")
    ));
    assert!(result.notes.iter().any(|n| n.contains("saved outputs")));

    // Nothing was run in the saved copy, so code credit drops but the
    // reflection answers still count.
    assert!(result.total_score < TOTAL_POINTS);
    let reflection = result.score_for(ElementKey::ReflectionQuestions);
    assert!((reflection - ElementKey::ReflectionQuestions.element().max_points).abs() < 1e-9);
}

#[tokio::test]
async fn e2e_no_execute_skips_executor() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_submission(&dir);
    let executor = Arc::new(MockExecutor::succeeding(executed_notebook()));
    let config = GraderConfig {
        execute: false,
        ..GraderConfig::default()
    };

    let result = Grader::new(config)
        .with_executor(executor.clone())
        .grade(&path)
        .await;

    assert_eq!(executor.call_count(), 0);
    assert_eq!(result.execution, ExecutionStatus::NotAttempted);
}

#[tokio::test]
async fn e2e_record_and_report_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_submission(&dir);
    let executor = Arc::new(MockExecutor::succeeding(executed_notebook()));
    let result = grader(executor).grade(&path).await;

    let record =
        GradingRecord::new("Ada Lovelace", "Homework 1", path.clone(), result.clone());
    let record_path = dir.path().join("records").join("ada.json");
    record.save_json(&record_path).unwrap();

    let loaded = FeedbackRecord::load_json(&record_path).unwrap();
    let reports = dir.path().join("reports");
    let pdf =
        nbgrade_report::generate_from_feedback(loaded, "Ada Lovelace", "Homework 1", &reports)
            .unwrap();
    assert!(pdf.starts_with(reports.join("Homework_1")));
    assert!(std::fs::read(&pdf).unwrap().starts_with(b"%PDF"));

    // The flat feedback list carries the same element scores.
    let restored =
        nbgrade_report::normalize::resolve(FeedbackRecord::Legacy(feedback_lines(&result)));
    assert_eq!(restored.element_scores, result.element_scores);
}
