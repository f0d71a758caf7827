//! nbgrade-report: PDF grading reports.
//!
//! Stored feedback (a grading record, a bare analysis, or the older flat
//! list of strings) is normalized to an analysis, turned into a block
//! document and written as a paginated PDF.

pub mod document;
pub mod normalize;
pub mod pdf;
pub mod sanitize;

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{Local, NaiveDateTime};

use nbgrade_core::aggregate::AnalysisResult;
use nbgrade_core::report::FeedbackRecord;

/// Write a report for `analysis` under `reports_dir` and return its path.
pub fn generate_report(
    analysis: &AnalysisResult,
    student: &str,
    assignment: &str,
    reports_dir: &Path,
) -> Result<PathBuf> {
    generate_report_at(
        analysis,
        student,
        assignment,
        reports_dir,
        Local::now().naive_local(),
    )
}

/// Like [`generate_report`] with an explicit grading time.
pub fn generate_report_at(
    analysis: &AnalysisResult,
    student: &str,
    assignment: &str,
    reports_dir: &Path,
    at: NaiveDateTime,
) -> Result<PathBuf> {
    let path = pdf::report_path(reports_dir, student, assignment, at);
    write_report_to(analysis, student, assignment, at, &path)?;
    Ok(path)
}

/// Render to an explicit output path.
pub fn write_report_to(
    analysis: &AnalysisResult,
    student: &str,
    assignment: &str,
    at: NaiveDateTime,
    path: &Path,
) -> Result<()> {
    let doc = document::build_document(analysis, student, assignment, at);
    let title = format!("{student} - {assignment}");
    pdf::write_pdf(&doc, &title, path)?;
    tracing::info!(
        path = %path.display(),
        total = analysis.total_score,
        "report written"
    );
    Ok(())
}

/// Normalize stored feedback and write its report.
pub fn generate_from_feedback(
    record: FeedbackRecord,
    student: &str,
    assignment: &str,
    reports_dir: &Path,
) -> Result<PathBuf> {
    let analysis = normalize::resolve(record);
    generate_report(&analysis, student, assignment, reports_dir)
}
