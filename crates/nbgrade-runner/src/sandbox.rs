//! Scratch space and data staging for notebook execution.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tempfile::TempDir;

/// How many directory levels above the notebook are searched for `data/`.
const DATA_SEARCH_DEPTH: usize = 5;

/// File name (without extension) nbconvert writes the executed copy to.
pub const EXECUTED_STEM: &str = "executed";

/// Temporary output directory for one execution.
///
/// The executed notebook is written here, never next to the submission. On
/// drop, the directory is removed.
pub struct Sandbox {
    output_dir: TempDir,
    timeout: Duration,
}

impl Sandbox {
    pub fn new(timeout: Duration) -> Result<Self> {
        let output_dir = TempDir::new().context("failed to create temp directory")?;
        Ok(Self {
            output_dir,
            timeout,
        })
    }

    /// Directory passed to nbconvert as `--output-dir`.
    pub fn output_dir(&self) -> &Path {
        self.output_dir.path()
    }

    /// Where the executed notebook is expected once nbconvert finishes.
    pub fn executed_path(&self) -> PathBuf {
        self.output_dir
            .path()
            .join(format!("{EXECUTED_STEM}.ipynb"))
    }

    /// Upper bound for the whole nbconvert process.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Environment for the child process with credentials blanked out.
    ///
    /// Student code runs with the grader's privileges, so anything that
    /// would let it reach a remote account is cleared.
    pub fn build_env(&self) -> Vec<(String, String)> {
        [
            "SSH_AUTH_SOCK",
            "AWS_ACCESS_KEY_ID",
            "AWS_SECRET_ACCESS_KEY",
            "AWS_SESSION_TOKEN",
            "GITHUB_TOKEN",
            "GH_TOKEN",
            "CARGO_REGISTRY_TOKEN",
            "ANTHROPIC_API_KEY",
            "OPENAI_API_KEY",
            "DOCKER_HOST",
            "DOCKER_CONFIG",
            "KUBECONFIG",
            "DATABASE_URL",
            "NPM_TOKEN",
        ]
        .iter()
        .map(|var| (var.to_string(), String::new()))
        .collect()
    }
}

/// Find the first `data/` folder in the directories above `notebook`.
///
/// The notebook's own directory is skipped: its `data/` is the staging
/// target, not a source.
pub fn find_data_dir(notebook: &Path) -> Option<PathBuf> {
    let notebook_dir = notebook_dir(notebook);
    notebook_dir
        .ancestors()
        .skip(1)
        .take(DATA_SEARCH_DEPTH)
        .map(|dir| dir.join("data"))
        .find(|candidate| candidate.is_dir())
}

/// Copy the assignment data files next to the notebook.
///
/// Each file found in `source` is copied into `<notebook dir>/data/`, and
/// also into the notebook directory itself when no file of that name is
/// there yet (for students who `setwd()` into the data folder). Files that
/// do not exist in `source` are skipped. Returns the number of files staged.
pub fn stage_data_files(notebook: &Path, source: &Path, files: &[String]) -> Result<usize> {
    let notebook_dir = notebook_dir(notebook);
    let target_dir = notebook_dir.join("data");

    if same_dir(source, &target_dir) {
        tracing::debug!(dir = %source.display(), "data already in place");
        return Ok(0);
    }

    std::fs::create_dir_all(&target_dir)
        .with_context(|| format!("failed to create {}", target_dir.display()))?;

    let mut staged = 0;
    for name in files {
        let from = source.join(name);
        if !from.is_file() {
            tracing::debug!(file = %name, "data file not provided, skipping");
            continue;
        }

        let to = target_dir.join(name);
        std::fs::copy(&from, &to)
            .with_context(|| format!("failed to copy {} to {}", from.display(), to.display()))?;

        let root_copy = notebook_dir.join(name);
        if !root_copy.exists() {
            std::fs::copy(&from, &root_copy).with_context(|| {
                format!("failed to copy {} to {}", from.display(), root_copy.display())
            })?;
        }
        staged += 1;
    }

    tracing::info!(staged, source = %source.display(), "data files staged");
    Ok(staged)
}

fn notebook_dir(notebook: &Path) -> PathBuf {
    let absolute = std::path::absolute(notebook).unwrap_or_else(|_| notebook.to_path_buf());
    absolute
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
