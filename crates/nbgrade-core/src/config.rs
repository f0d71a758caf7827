//! nbgrade configuration.
//!
//! Loaded from `nbgrade.toml` in the working directory, then
//! `~/.config/nbgrade/config.toml`, falling back to defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::engine::GraderConfig;

/// Data files staged next to a notebook before it is executed.
pub const DEFAULT_DATA_FILES: &[&str] = &[
    "sales_data.csv",
    "customer_feedback.xlsx",
    "ratings_data.xlsx",
    "customer_ratings.csv",
    "customer_comments.csv",
];

/// Top-level nbgrade configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NbgradeConfig {
    /// Re-execute notebooks before grading.
    #[serde(default = "default_execute")]
    pub execute: bool,
    /// Path or name of the `jupyter` binary.
    #[serde(default = "default_jupyter_bin")]
    pub jupyter_bin: String,
    /// Kernel used for execution.
    #[serde(default = "default_kernel")]
    pub kernel_name: String,
    /// Per-cell execution timeout in seconds.
    #[serde(default = "default_cell_timeout")]
    pub cell_timeout_secs: u64,
    /// Directory holding assignment data files. When unset, the first
    /// `data/` folder above the notebook is used.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_data_files")]
    pub data_files: Vec<String>,
    /// Where grading records are written.
    #[serde(default = "default_records_dir")]
    pub records_dir: PathBuf,
    /// Where PDF reports are written.
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,
}

fn default_execute() -> bool {
    true
}
fn default_jupyter_bin() -> String {
    "jupyter".to_string()
}
fn default_kernel() -> String {
    "ir".to_string()
}
fn default_cell_timeout() -> u64 {
    30
}
fn default_data_files() -> Vec<String> {
    DEFAULT_DATA_FILES.iter().map(|s| s.to_string()).collect()
}
fn default_records_dir() -> PathBuf {
    PathBuf::from("./nbgrade-records")
}
fn default_reports_dir() -> PathBuf {
    PathBuf::from("./reports")
}

impl Default for NbgradeConfig {
    fn default() -> Self {
        Self {
            execute: default_execute(),
            jupyter_bin: default_jupyter_bin(),
            kernel_name: default_kernel(),
            cell_timeout_secs: default_cell_timeout(),
            data_dir: None,
            data_files: default_data_files(),
            records_dir: default_records_dir(),
            reports_dir: default_reports_dir(),
        }
    }
}

impl NbgradeConfig {
    pub fn grader_config(&self) -> GraderConfig {
        GraderConfig {
            execute: self.execute,
            kernel_name: self.kernel_name.clone(),
            cell_timeout_secs: self.cell_timeout_secs,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(len) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + len];
        let value = std::env::var(var_name).unwrap_or_default();
        result.replace_range(start..start + len + 1, &value);
    }
    result
}

fn resolve_path(p: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&p.to_string_lossy()))
}

/// Load config from an explicit path, or search the default locations.
///
/// Environment overrides: `NBGRADE_DATA_DIR`, `NBGRADE_KERNEL`.
pub fn load_config_from(path: Option<&Path>) -> Result<NbgradeConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("nbgrade.toml");
            if local.exists() {
                Some(local)
            } else {
                global_config_path().filter(|p| p.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<NbgradeConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => NbgradeConfig::default(),
    };

    if let Ok(dir) = std::env::var("NBGRADE_DATA_DIR") {
        config.data_dir = Some(PathBuf::from(dir));
    }
    if let Ok(kernel) = std::env::var("NBGRADE_KERNEL") {
        config.kernel_name = kernel;
    }

    config.jupyter_bin = resolve_env_vars(&config.jupyter_bin);
    config.kernel_name = resolve_env_vars(&config.kernel_name);
    config.data_dir = config.data_dir.as_deref().map(resolve_path);
    config.records_dir = resolve_path(&config.records_dir);
    config.reports_dir = resolve_path(&config.reports_dir);

    Ok(config)
}

fn global_config_path() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(|h| {
        PathBuf::from(h)
            .join(".config")
            .join("nbgrade")
            .join("config.toml")
    })
}

/// Starter config written by `nbgrade init`.
pub const CONFIG_TEMPLATE: &str = r#"# nbgrade configuration

# Re-run notebooks with Jupyter before grading. When execution fails the
# outputs saved in the notebook are graded instead.
execute = true
jupyter_bin = "jupyter"
kernel_name = "ir"
cell_timeout_secs = 30

# Folder with the assignment data files. Leave unset to use the first
# `data/` folder found above each notebook.
# data_dir = "${HOME}/course/data"

records_dir = "./nbgrade-records"
reports_dir = "./reports"
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_NBGRADE_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_NBGRADE_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_NBGRADE_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${unterminated"), "${unterminated");
        std::env::remove_var("_NBGRADE_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = NbgradeConfig::default();
        assert!(config.execute);
        assert_eq!(config.kernel_name, "ir");
        assert_eq!(config.cell_timeout_secs, 30);
        assert_eq!(config.data_files.len(), 5);
        assert_eq!(config.grader_config().cell_timeout_secs, 30);
    }

    #[test]
    fn template_parses_to_defaults() {
        let config: NbgradeConfig = toml::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config, NbgradeConfig::default());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nbgrade.toml");
        std::fs::write(&path, "execute = false\ncell_timeout_secs = 10\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert!(!config.execute);
        assert_eq!(config.cell_timeout_secs, 10);
        assert_eq!(config.jupyter_bin, "jupyter");
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = load_config_from(Some(Path::new("/no/such/nbgrade.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }
}
