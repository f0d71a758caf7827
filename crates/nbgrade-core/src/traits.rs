//! Core trait for notebook execution backends.
//!
//! Implemented by `nbgrade-runner` (a `jupyter nbconvert` subprocess and a
//! mock for tests).

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ExecutionError;
use crate::model::Notebook;

/// Re-runs a notebook end to end and returns it with fresh outputs.
#[async_trait]
pub trait NotebookExecutor: Send + Sync {
    /// Human-readable executor name (e.g. "jupyter").
    fn name(&self) -> &str;

    /// Execute the notebook at `request.notebook_path`. The input file must
    /// not be modified.
    async fn execute(&self, request: &ExecuteRequest) -> Result<Notebook, ExecutionError>;
}

/// Request to execute a notebook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub notebook_path: PathBuf,
    /// Kernel to run the notebook with (e.g. "ir").
    pub kernel_name: String,
    /// Per-cell timeout in seconds.
    pub cell_timeout_secs: u64,
    /// Number of code cells, used to bound the whole run.
    pub code_cells: usize,
}

impl ExecuteRequest {
    /// Upper bound for the whole run: one cell timeout per code cell plus one.
    pub fn process_timeout_secs(&self) -> u64 {
        self.cell_timeout_secs
            .saturating_mul(self.code_cells as u64 + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_timeout_scales_with_cells() {
        let req = ExecuteRequest {
            notebook_path: PathBuf::from("hw.ipynb"),
            kernel_name: "ir".into(),
            cell_timeout_secs: 30,
            code_cells: 9,
        };
        assert_eq!(req.process_timeout_secs(), 300);

        let empty = ExecuteRequest {
            code_cells: 0,
            ..req
        };
        assert_eq!(empty.process_timeout_secs(), 30);
    }
}
