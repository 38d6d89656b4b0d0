use crate::debugger::SearchMode;
use crate::error::{DebugError, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_RELEASE_NAME: &str = "debug-release";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Settings for one debugging session.
#[derive(Debug, Clone)]
pub struct DebugConfig {
    pub chart_path: PathBuf,
    /// Release name passed to `helm template`
    pub release_name: String,
    /// `-f` values files, resolved against the working directory
    pub values_files: Vec<PathBuf>,
    /// `--set key=value` overrides
    pub set_values: Vec<String>,
    /// Extra arguments appended to every render
    pub extra_args: Vec<String>,
    /// Explicit helm executable; discovered on PATH when absent
    pub helm_path: Option<PathBuf>,
    /// Per-render limit; exceeding it aborts the run
    pub timeout: Duration,
    pub mode: SearchMode,
    /// Only debug this template (file name or path below `templates/`)
    pub target_file: Option<String>,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            chart_path: PathBuf::from("."),
            release_name: DEFAULT_RELEASE_NAME.to_string(),
            values_files: Vec::new(),
            set_values: Vec::new(),
            extra_args: Vec::new(),
            helm_path: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            mode: SearchMode::Binary,
            target_file: None,
        }
    }
}

impl DebugConfig {
    pub fn new(chart_path: impl Into<PathBuf>) -> Self {
        Self {
            chart_path: chart_path.into(),
            ..Self::default()
        }
    }

    /// Split a shell-quoted argument string (`--helm-args "--kube-version 1.29"`).
    pub fn parse_extra_args(raw: &str) -> Result<Vec<String>> {
        shlex::split(raw)
            .ok_or_else(|| DebugError::invalid_args(format!("unbalanced quotes in: {}", raw)))
    }

    /// Make values file paths absolute so they survive rendering a temp copy.
    pub fn resolve_values_files(&mut self) -> Result<()> {
        let cwd = std::env::current_dir()?;
        for file in &mut self.values_files {
            if file.is_relative() {
                *file = cwd.join(&*file);
            }
        }
        Ok(())
    }
}
