//! `jupyter nbconvert` invocation.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use tokio::process::Command;

use nbgrade_core::error::ExecutionError;
use nbgrade_core::model::Notebook;
use nbgrade_core::notebook::parse_notebook_str;
use nbgrade_core::traits::ExecuteRequest;

use crate::sandbox::{Sandbox, EXECUTED_STEM};

/// Arguments for an in-place-safe execution of `notebook`.
///
/// `--allow-errors` keeps going after a failing cell so every error is
/// recorded in the executed copy.
pub fn nbconvert_args(request: &ExecuteRequest, output_dir: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "nbconvert",
        "--to",
        "notebook",
        "--execute",
        "--allow-errors",
    ]
    .iter()
    .map(OsString::from)
    .collect();
    args.push(format!("--ExecutePreprocessor.timeout={}", request.cell_timeout_secs).into());
    args.push(format!("--ExecutePreprocessor.kernel_name={}", request.kernel_name).into());
    args.push("--output-dir".into());
    args.push(output_dir.as_os_str().to_owned());
    args.push("--output".into());
    args.push(EXECUTED_STEM.into());
    args.push(request.notebook_path.as_os_str().to_owned());
    args
}

/// Run nbconvert inside `sandbox` and read back the executed notebook.
pub async fn execute(
    jupyter_bin: &str,
    sandbox: &Sandbox,
    request: &ExecuteRequest,
) -> Result<Notebook, ExecutionError> {
    let start = Instant::now();

    let mut cmd = Command::new(jupyter_bin);
    cmd.args(nbconvert_args(request, sandbox.output_dir()))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    for (key, val) in sandbox.build_env() {
        cmd.env(&key, &val);
    }

    let output = match tokio::time::timeout(sandbox.timeout(), cmd.output()).await {
        Err(_) => return Err(ExecutionError::Timeout(sandbox.timeout().as_secs())),
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ExecutionError::InterpreterUnavailable(format!(
                "{jupyter_bin} not found"
            )))
        }
        Ok(Err(e)) => {
            return Err(ExecutionError::InterpreterUnavailable(format!(
                "failed to start {jupyter_bin}: {e}"
            )))
        }
        Ok(Ok(output)) => output,
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() {
        tracing::debug!(duration_ms, stderr = %stderr, "nbconvert exited with failure");
        return Err(classify_failure(
            output.status.code().unwrap_or(-1),
            &stderr,
            &request.kernel_name,
        ));
    }

    tracing::debug!(duration_ms, "nbconvert finished");
    read_executed(&sandbox.executed_path())
}

/// Map a failed nbconvert run to an error.
pub fn classify_failure(status: i32, stderr: &str, kernel_name: &str) -> ExecutionError {
    if stderr.contains("No such kernel") || stderr.contains("NoSuchKernel") {
        return ExecutionError::KernelUnavailable(kernel_name.to_string());
    }
    if stderr.contains("No module named nbconvert")
        || stderr.contains("is not a Jupyter command")
    {
        return ExecutionError::InterpreterUnavailable("nbconvert is not installed".to_string());
    }
    ExecutionError::Failed {
        status,
        stderr: last_lines(stderr, 5),
    }
}

fn read_executed(path: &Path) -> Result<Notebook, ExecutionError> {
    let content = std::fs::read_to_string(path)
        .map_err(|_| ExecutionError::MissingOutput(path.to_path_buf()))?;
    parse_notebook_str(&content).map_err(|e| ExecutionError::Failed {
        status: 0,
        stderr: format!("unreadable executed notebook: {e}"),
    })
}

fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}
