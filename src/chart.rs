use crate::error::{DebugError, Result};
use crate::parser::{decompose, split_physical_lines, DecomposeMode, MismatchedBlockError};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const TEMPLATE_EXTENSIONS: [&str; 3] = ["yaml", "yml", "tpl"];

/// A template file read from the chart's `templates/` directory.
#[derive(Debug, Clone)]
pub struct ChartTemplate {
    /// Path relative to the chart root, e.g. `templates/deployment.yaml`.
    pub rel_path: PathBuf,
    pub content: String,
    /// Block count, or the structural problem found while decomposing.
    pub blocks: std::result::Result<usize, MismatchedBlockError>,
}

impl ChartTemplate {
    pub fn file_name(&self) -> String {
        self.rel_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Path below `templates/`, as helm cites it.
    pub fn template_name(&self) -> String {
        self.rel_path
            .strip_prefix("templates")
            .unwrap_or(&self.rel_path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    pub fn is_helper(&self) -> bool {
        is_helper_name(&self.file_name())
    }

    pub fn total_lines(&self) -> usize {
        split_physical_lines(&self.content).len()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.as_ref().copied().unwrap_or(0)
    }

}

/// Helper files (`_helpers.tpl` and friends) hold shared definitions and are
/// never truncated or targeted.
pub fn is_helper_name(file_name: &str) -> bool {
    file_name.starts_with('_')
}

/// All parsed templates of one chart.
#[derive(Debug, Clone)]
pub struct ChartTemplates {
    pub chart_path: PathBuf,
    pub templates: Vec<ChartTemplate>,
}

impl ChartTemplates {
    pub fn total_files(&self) -> usize {
        self.templates.len()
    }

    pub fn total_blocks(&self) -> usize {
        self.templates.iter().map(|t| t.block_count()).sum()
    }

    /// Resolve an engine citation like `sub/deployment.yaml`. The full path
    /// below `templates/` wins; a bare file name only resolves when exactly
    /// one template carries it.
    pub fn find(&self, cited: &str) -> Option<&ChartTemplate> {
        let cited = cited.trim_start_matches("templates/");
        if let Some(exact) = self.templates.iter().find(|t| t.template_name() == cited) {
            return Some(exact);
        }

        let mut by_name = self.templates.iter().filter(|t| t.file_name() == cited);
        match (by_name.next(), by_name.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }

    pub fn non_helpers(&self) -> impl Iterator<Item = &ChartTemplate> {
        self.templates.iter().filter(|t| !t.is_helper())
    }
}

/// Check that `chart` looks like a helm chart: a directory with a manifest
/// and a templates directory.
pub fn validate_chart_directory(chart: &Path) -> Result<()> {
    if !chart.exists() {
        return Err(DebugError::ChartNotFound(chart.to_path_buf()));
    }
    if !chart.is_dir() {
        return Err(DebugError::invalid_chart(format!(
            "Chart path is not a directory: {}",
            chart.display()
        )));
    }
    if !chart.join("Chart.yaml").exists() && !chart.join("Chart.yml").exists() {
        return Err(DebugError::invalid_chart(format!(
            "No Chart.yaml found in: {}",
            chart.display()
        )));
    }
    if !chart.join("templates").is_dir() {
        return Err(DebugError::invalid_chart(format!(
            "No templates directory found in: {}",
            chart.display()
        )));
    }
    Ok(())
}

/// Template files under `templates/`, sorted lexicographically by relative path.
pub fn template_files(chart: &Path) -> Result<Vec<PathBuf>> {
    let templates_dir = chart.join("templates");
    let mut files = Vec::new();

    for entry in WalkDir::new(&templates_dir) {
        let entry = entry.map_err(|e| DebugError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let ext = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        if !TEMPLATE_EXTENSIONS.contains(&ext) {
            continue;
        }
        if let Ok(rel) = entry.path().strip_prefix(chart) {
            files.push(rel.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Read template text; non UTF-8 bytes are replaced rather than rejected.
pub fn read_template(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            warn!("{} is not valid UTF-8; decoding lossily", path.display());
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };
    Ok(text.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(text))
}

/// Read and decompose every non-empty template of a chart.
pub fn parse_chart(chart: &Path) -> Result<ChartTemplates> {
    let mut templates = Vec::new();

    for rel_path in template_files(chart)? {
        let content = read_template(&chart.join(&rel_path))?;
        if content.trim().is_empty() {
            debug!("skipping empty template {}", rel_path.display());
            continue;
        }
        let blocks = decompose(&content, DecomposeMode::Block).map(|units| units.len());
        templates.push(ChartTemplate {
            rel_path,
            content,
            blocks,
        });
    }

    Ok(ChartTemplates {
        chart_path: chart.to_path_buf(),
        templates,
    })
}
