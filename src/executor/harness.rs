use super::runner::{RenderOutcome, Renderer};
use crate::chart::is_helper_name;
use crate::error::{DebugError, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

/// A throwaway copy of a chart. The directory is removed when this value is
/// dropped, whatever path the render took.
pub struct TempChart {
    _dir: TempDir,
    root: PathBuf,
}

impl TempChart {
    pub fn create(original: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("helm_debug_").tempdir()?;
        let name = original
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_os_string()))
            .unwrap_or_else(|| "chart".into());
        let root = dir.path().join(name);

        for entry in WalkDir::new(original) {
            let entry = entry.map_err(|e| DebugError::Io(e.into()))?;
            let rel = match entry.path().strip_prefix(original) {
                Ok(rel) => rel,
                Err(_) => continue,
            };
            let dest = root.join(rel);
            if entry.file_type().is_dir() {
                fs::create_dir_all(&dest)?;
            } else {
                fs::copy(entry.path(), &dest)?;
            }
        }

        Ok(Self { _dir: dir, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn write_template(&self, rel_path: &Path, text: &str) -> Result<()> {
        fs::write(self.root.join(rel_path), text)?;
        Ok(())
    }
}

/// Renders candidates: the full chart with exactly one template replaced.
pub struct RenderHarness<'a, R: Renderer> {
    renderer: &'a R,
    chart_root: PathBuf,
}

impl<'a, R: Renderer> RenderHarness<'a, R> {
    pub fn new(renderer: &'a R, chart_root: impl Into<PathBuf>) -> Self {
        Self {
            renderer,
            chart_root: chart_root.into(),
        }
    }

    /// Render the untouched chart in place.
    pub fn render_original(&self) -> Result<RenderOutcome> {
        self.renderer.execute(&self.chart_root)
    }

    /// Render a temporary chart copy where `target` holds `candidate`.
    pub fn render_candidate(&self, target: &Path, candidate: &str) -> Result<RenderOutcome> {
        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if is_helper_name(&file_name) {
            return Err(DebugError::invalid_args(format!(
                "refusing to truncate helper file {}",
                target.display()
            )));
        }

        let temp = TempChart::create(&self.chart_root)?;
        temp.write_template(target, candidate)?;
        let outcome = self.renderer.execute(temp.root());
        debug!(
            "rendered candidate for {} ({} bytes): {}",
            target.display(),
            candidate.len(),
            match &outcome {
                Ok(o) if o.passed => "ok",
                Ok(_) => "fail",
                Err(_) => "tool error",
            }
        );
        outcome
    }
}
