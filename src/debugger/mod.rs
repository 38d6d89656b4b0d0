mod search;
mod session;
mod stepping;

pub use search::{Convergence, Debugger, Progress, SessionOutcome, Silent};
pub use session::{Phase, SearchSession, SearchStep};
pub use stepping::SearchMode;

use crate::chart::{parse_chart, validate_chart_directory, ChartTemplates};
use crate::config::DebugConfig;
use crate::error::{DebugError, Result};
use crate::executor::{find_helm_executable, HelmCommand, Renderer};
use crate::report::{assemble, assemble_tool_error, SearchResult};
use log::info;

fn load_chart(config: &DebugConfig) -> Result<ChartTemplates> {
    validate_chart_directory(&config.chart_path)?;
    let chart = parse_chart(&config.chart_path)?;
    if chart.total_files() == 0 {
        return Err(DebugError::NoTemplates);
    }
    Ok(chart)
}

/// Debug a chart with the helm executable named by the config or found on PATH.
pub fn run(config: &DebugConfig, progress: &mut dyn Progress) -> SearchResult {
    let chart = match load_chart(config) {
        Ok(chart) => chart,
        Err(e) => return assemble_tool_error(config, None, None, &e),
    };
    progress.chart_parsed(&chart);

    let helm_path = match find_helm_executable(config.helm_path.as_deref()) {
        Some(path) => path,
        None => return assemble_tool_error(config, Some(&chart), None, &DebugError::HelmNotFound),
    };
    info!("Using Helm at: {}", helm_path.display());

    let helm = HelmCommand::new(helm_path, config);
    search_chart(config, &chart, &helm, progress)
}

/// Debug a chart with any renderer; the chart must already be loaded.
pub fn search_chart<R: Renderer>(
    config: &DebugConfig,
    chart: &ChartTemplates,
    renderer: &R,
    progress: &mut dyn Progress,
) -> SearchResult {
    let mut debugger = Debugger::new(config, renderer);
    match debugger.run(chart, progress) {
        Ok(outcome) => assemble(
            config,
            chart,
            debugger.decompose_mode(),
            debugger.session(),
            &outcome,
        ),
        Err(e) => assemble_tool_error(config, Some(chart), Some(debugger.session()), &e),
    }
}

/// Load a chart from disk and debug it with the given renderer.
pub fn run_with_renderer<R: Renderer>(
    config: &DebugConfig,
    renderer: &R,
    progress: &mut dyn Progress,
) -> SearchResult {
    match load_chart(config) {
        Ok(chart) => {
            progress.chart_parsed(&chart);
            search_chart(config, &chart, renderer, progress)
        }
        Err(e) => assemble_tool_error(config, None, None, &e),
    }
}
