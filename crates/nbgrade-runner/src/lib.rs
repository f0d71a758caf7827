//! nbgrade-runner: notebook execution.
//!
//! Re-runs a submitted notebook with `jupyter nbconvert` in a scratch
//! directory, after staging the assignment data files next to it, and
//! returns the executed copy for grading.

pub mod mock;
pub mod nbconvert;
pub mod sandbox;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use nbgrade_core::config::{NbgradeConfig, DEFAULT_DATA_FILES};
use nbgrade_core::error::ExecutionError;
use nbgrade_core::model::Notebook;
use nbgrade_core::traits::{ExecuteRequest, NotebookExecutor};

/// Executor that shells out to `jupyter nbconvert`.
pub struct JupyterExecutor {
    /// Path or name of the `jupyter` binary.
    jupyter_bin: String,
    /// Source of data files; discovered per notebook when unset.
    data_dir: Option<PathBuf>,
    /// Data file names to stage before execution.
    data_files: Vec<String>,
}

impl JupyterExecutor {
    pub fn new(jupyter_bin: impl Into<String>) -> Self {
        Self {
            jupyter_bin: jupyter_bin.into(),
            data_dir: None,
            data_files: DEFAULT_DATA_FILES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn from_config(config: &NbgradeConfig) -> Self {
        Self::new(config.jupyter_bin.clone())
            .with_data_dir(config.data_dir.clone())
            .with_data_files(config.data_files.clone())
    }

    pub fn with_data_dir(mut self, data_dir: Option<PathBuf>) -> Self {
        self.data_dir = data_dir;
        self
    }

    pub fn with_data_files(mut self, files: Vec<String>) -> Self {
        self.data_files = files;
        self
    }

    /// Stage data files; problems here never stop the run itself.
    fn stage(&self, request: &ExecuteRequest) {
        let source = self
            .data_dir
            .clone()
            .or_else(|| sandbox::find_data_dir(&request.notebook_path));
        let Some(source) = source else {
            tracing::warn!(
                notebook = %request.notebook_path.display(),
                "no data directory found, executing without staged data"
            );
            return;
        };
        if let Err(e) =
            sandbox::stage_data_files(&request.notebook_path, &source, &self.data_files)
        {
            tracing::warn!(error = %format!("{e:#}"), "failed to stage data files");
        }
    }
}

#[async_trait]
impl NotebookExecutor for JupyterExecutor {
    fn name(&self) -> &str {
        "jupyter"
    }

    async fn execute(&self, request: &ExecuteRequest) -> Result<Notebook, ExecutionError> {
        if !request.notebook_path.is_file() {
            return Err(ExecutionError::Failed {
                status: -1,
                stderr: format!("notebook not found: {}", request.notebook_path.display()),
            });
        }

        self.stage(request);

        let timeout = Duration::from_secs(request.process_timeout_secs());
        let sandbox = sandbox::Sandbox::new(timeout).map_err(|e| ExecutionError::Failed {
            status: -1,
            stderr: format!("{e:#}"),
        })?;

        tracing::info!(
            notebook = %request.notebook_path.display(),
            kernel = %request.kernel_name,
            timeout_secs = timeout.as_secs(),
            "executing notebook"
        );
        nbconvert::execute(&self.jupyter_bin, &sandbox, request).await
    }
}
