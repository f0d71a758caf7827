//! Error types for notebook loading and execution.
//!
//! `ExecutionError` lives in core so the grading engine can classify an
//! executor failure without string matching before it falls back to the
//! recorded outputs.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading a notebook document.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The notebook file could not be read.
    #[error("failed to read notebook {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON.
    #[error("notebook is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed but has no usable cell list.
    #[error("malformed notebook: {0}")]
    Malformed(String),
}

/// Errors raised by a notebook executor.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The external interpreter binary could not be started.
    #[error("interpreter unavailable: {0}")]
    InterpreterUnavailable(String),

    /// The requested kernel is not installed.
    #[error("kernel not installed: {0}")]
    KernelUnavailable(String),

    /// Execution exceeded its time budget.
    #[error("execution timed out after {0}s")]
    Timeout(u64),

    /// The interpreter exited with a failure status.
    #[error("execution failed (exit {status}): {stderr}")]
    Failed { status: i32, stderr: String },

    /// The interpreter finished but produced no executed notebook.
    #[error("executed notebook missing at {0}")]
    MissingOutput(PathBuf),
}

impl ExecutionError {
    /// Returns true if retrying on another notebook is pointless because the
    /// environment itself cannot execute notebooks.
    pub fn is_environmental(&self) -> bool {
        matches!(
            self,
            ExecutionError::InterpreterUnavailable(_) | ExecutionError::KernelUnavailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environmental_classification() {
        assert!(ExecutionError::InterpreterUnavailable("jupyter".into()).is_environmental());
        assert!(ExecutionError::KernelUnavailable("ir".into()).is_environmental());
        assert!(!ExecutionError::Timeout(30).is_environmental());
    }

    #[test]
    fn messages_are_readable() {
        let err = ExecutionError::Failed {
            status: 1,
            stderr: "CellTimeoutError".into(),
        };
        assert_eq!(
            err.to_string(),
            "execution failed (exit 1): CellTimeoutError"
        );
        assert_eq!(
            ExecutionError::Timeout(30).to_string(),
            "execution timed out after 30s"
        );
    }
}
