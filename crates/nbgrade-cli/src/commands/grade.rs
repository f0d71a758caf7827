//! The `nbgrade grade` command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use nbgrade_core::aggregate::{AnalysisResult, ExecutionStatus};
use nbgrade_core::config::load_config_from;
use nbgrade_core::engine::Grader;
use nbgrade_core::report::{feedback_lines, GradingRecord};
use nbgrade_core::rubric::{fmt_points, RUBRIC};
use nbgrade_report::generate_report;
use nbgrade_report::sanitize::filename_token;
use nbgrade_runner::JupyterExecutor;

#[allow(clippy::too_many_arguments)]
pub async fn execute(
    notebook: PathBuf,
    assignment: Option<String>,
    student: Option<String>,
    no_execute: bool,
    format: String,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(
        notebook.exists(),
        "notebook not found: {}",
        notebook.display()
    );

    let mut config = load_config_from(config_path.as_deref())?;
    if no_execute {
        config.execute = false;
    }
    tracing::debug!(
        execute = config.execute,
        kernel = %config.kernel_name,
        jupyter = %config.jupyter_bin,
        "config loaded"
    );

    let mut grader = Grader::new(config.grader_config());
    if config.execute {
        grader = grader.with_executor(Arc::new(JupyterExecutor::from_config(&config)));
    }

    eprintln!("nbgrade v{}: grading {}", env!("CARGO_PKG_VERSION"), notebook.display());
    let analysis = grader.grade(&notebook).await;

    let student = student
        .or_else(|| analysis.student.known_name().map(str::to_string))
        .unwrap_or_else(|| "Unknown Student".to_string());
    let assignment = assignment.unwrap_or_else(|| assignment_from_path(&notebook));

    print_summary(&analysis, &student);

    let formats: Vec<&str> = if format == "all" {
        vec!["text", "json", "pdf"]
    } else {
        format.split(',').map(str::trim).collect()
    };

    for fmt in &formats {
        match *fmt {
            "text" => {
                for line in feedback_lines(&analysis) {
                    println!("{line}");
                }
            }
            "json" => {
                let dir = output.as_deref().unwrap_or(&config.records_dir);
                let record = GradingRecord::new(
                    &student,
                    &assignment,
                    notebook.clone(),
                    analysis.clone(),
                );
                let path = dir.join(format!(
                    "{}-{}.json",
                    filename_token(&student, "Unknown_Student"),
                    record.id
                ));
                record.save_json(&path)?;
                eprintln!("Record saved to: {}", path.display());
            }
            "pdf" => {
                let dir = output.as_deref().unwrap_or(&config.reports_dir);
                let path = generate_report(&analysis, &student, &assignment, dir)?;
                eprintln!("PDF report: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    Ok(())
}

fn assignment_from_path(notebook: &Path) -> String {
    notebook
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Unknown Assignment".to_string())
}

fn print_summary(analysis: &AnalysisResult, student: &str) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Element", "Checks", "Score", "Max"]);

    for element in RUBRIC {
        table.add_row(vec![
            Cell::new(element.title),
            Cell::new(element.description),
            Cell::new(fmt_points(analysis.score_for(element.key))),
            Cell::new(fmt_points(element.max_points)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total"),
        Cell::new(""),
        Cell::new(format!("{:.1}", analysis.total_score)),
        Cell::new(format!("{:.1}", analysis.max_score)),
    ]);

    eprintln!("\n{table}");
    eprintln!(
        "{student}: {:.1}/{:.1} ({:.1}%) {}",
        analysis.total_score,
        analysis.max_score,
        analysis.percentage(),
        analysis.band()
    );
    if let ExecutionStatus::FallbackUsed { reason } = &analysis.execution {
        eprintln!("Note: graded saved outputs, execution failed: {reason}");
    }
}
