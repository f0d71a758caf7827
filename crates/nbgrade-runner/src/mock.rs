//! Mock executor for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use nbgrade_core::error::ExecutionError;
use nbgrade_core::model::Notebook;
use nbgrade_core::traits::{ExecuteRequest, NotebookExecutor};

/// An executor that returns a prepared notebook instead of running Jupyter.
pub struct MockExecutor {
    /// Notebook handed back on success; `None` makes every call fail.
    result: Option<Notebook>,
    /// Message used for the failure.
    failure: String,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last request received.
    last_request: Mutex<Option<ExecuteRequest>>,
}

impl MockExecutor {
    /// A mock whose executions always produce `notebook`.
    pub fn succeeding(notebook: Notebook) -> Self {
        Self {
            result: Some(notebook),
            failure: String::new(),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// A mock whose executions always fail with a non-zero exit.
    pub fn failing(message: &str) -> Self {
        Self {
            result: None,
            failure: message.to_string(),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<ExecuteRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotebookExecutor for MockExecutor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn execute(&self, request: &ExecuteRequest) -> Result<Notebook, ExecutionError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap() = Some(request.clone());

        match &self.result {
            Some(notebook) => Ok(notebook.clone()),
            None => Err(ExecutionError::Failed {
                status: 1,
                stderr: self.failure.clone(),
            }),
        }
    }
}
