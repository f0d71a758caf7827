//! Grading engine.
//!
//! Loads a notebook, optionally re-executes it through a
//! [`NotebookExecutor`], and runs the analysis on whichever version is
//! available. Grading never fails: unreadable notebooks produce a zero-score
//! result and execution problems fall back to the recorded outputs.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::aggregate::{analyze_notebook, AnalysisResult, ExecutionStatus};
use crate::model::Notebook;
use crate::notebook::{extract_student_info, load_notebook};
use crate::traits::{ExecuteRequest, NotebookExecutor};

/// Configuration for the grader.
#[derive(Debug, Clone)]
pub struct GraderConfig {
    /// Re-execute notebooks before analysis.
    pub execute: bool,
    pub kernel_name: String,
    pub cell_timeout_secs: u64,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            execute: true,
            kernel_name: "ir".to_string(),
            cell_timeout_secs: 30,
        }
    }
}

/// What execution produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Executed(Notebook),
    FallbackUsed { reason: String },
}

pub struct Grader {
    executor: Option<Arc<dyn NotebookExecutor>>,
    config: GraderConfig,
}

impl Grader {
    pub fn new(config: GraderConfig) -> Self {
        Self {
            executor: None,
            config,
        }
    }

    pub fn with_executor(mut self, executor: Arc<dyn NotebookExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn config(&self) -> &GraderConfig {
        &self.config
    }

    /// Grade the notebook at `path`.
    pub async fn grade(&self, path: &Path) -> AnalysisResult {
        let start = Instant::now();
        let notebook = match load_notebook(path) {
            Ok(nb) => nb,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "notebook could not be loaded");
                return AnalysisResult::load_failure(e);
            }
        };
        tracing::info!(
            path = %path.display(),
            cells = notebook.cells.len(),
            "notebook loaded"
        );

        let executor = match (&self.executor, self.config.execute) {
            (Some(exec), true) => exec,
            _ => return analyze_notebook(&notebook, ExecutionStatus::NotAttempted),
        };

        let mut result = match self.execute_or_fallback(executor.as_ref(), path, &notebook).await {
            ExecutionOutcome::Executed(fresh) => {
                analyze_notebook(&fresh, ExecutionStatus::Executed)
            }
            ExecutionOutcome::FallbackUsed { reason } => {
                analyze_notebook(&notebook, ExecutionStatus::FallbackUsed { reason })
            }
        };
        // Identity comes from the submitted file, not the executed copy.
        result.student = extract_student_info(&notebook);

        tracing::info!(
            total = result.total_score,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "grading complete"
        );
        result
    }

    /// Run the executor; any failure becomes a fallback with a reason.
    pub async fn execute_or_fallback(
        &self,
        executor: &dyn NotebookExecutor,
        path: &Path,
        notebook: &Notebook,
    ) -> ExecutionOutcome {
        let request = ExecuteRequest {
            notebook_path: path.to_path_buf(),
            kernel_name: self.config.kernel_name.clone(),
            cell_timeout_secs: self.config.cell_timeout_secs,
            code_cells: notebook.code_cells().count(),
        };

        match executor.execute(&request).await {
            Ok(fresh) => {
                tracing::info!(executor = executor.name(), "notebook executed");
                ExecutionOutcome::Executed(fresh)
            }
            Err(e) => {
                if e.is_environmental() {
                    tracing::warn!(executor = executor.name(), error = %e, "execution unavailable, using recorded outputs");
                } else {
                    tracing::warn!(executor = executor.name(), error = %e, "execution failed, using recorded outputs");
                }
                ExecutionOutcome::FallbackUsed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
