//! The `nbgrade report` command.

use std::path::PathBuf;

use anyhow::Result;

use nbgrade_core::config::load_config_from;
use nbgrade_core::report::FeedbackRecord;

pub fn execute(
    feedback: PathBuf,
    student: String,
    assignment: String,
    output: Option<PathBuf>,
) -> Result<()> {
    let record = FeedbackRecord::load_json(&feedback)?;

    let reports_dir = match output {
        Some(dir) => dir,
        None => load_config_from(None)?.reports_dir,
    };

    let path =
        nbgrade_report::generate_from_feedback(record, &student, &assignment, &reports_dir)?;
    println!("PDF report generated: {}", path.display());
    Ok(())
}
