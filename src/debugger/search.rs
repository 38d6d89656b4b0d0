use super::session::{Phase, SearchSession, SearchStep};
use super::stepping::SearchMode;
use crate::chart::{ChartTemplate, ChartTemplates};
use crate::classifier::{classify, Classification};
use crate::config::DebugConfig;
use crate::error::{DebugError, MismatchedBlockError, Result};
use crate::executor::{build, range_label, RenderHarness, RenderOutcome, Renderer};
use crate::parser::{decompose, DecomposeMode, TemplateUnit};
use log::{debug, info, warn};

/// Receives progress while a session runs.
pub trait Progress {
    fn chart_parsed(&mut self, _chart: &ChartTemplates) {}
    fn mode_selected(&mut self, _mode: SearchMode, _decompose: DecomposeMode) {}
    fn step(&mut self, _step: &SearchStep) {}
    fn info(&mut self, _message: &str) {}
    fn warning(&mut self, _message: &str) {}
}

/// Discards all progress.
pub struct Silent;

impl Progress for Silent {}

/// The converged boundary for one template.
#[derive(Debug, Clone)]
pub struct Convergence {
    pub template: ChartTemplate,
    pub units: Vec<TemplateUnit>,
    /// First unit whose inclusion makes the render fail
    pub failing_index: usize,
    /// Last unit of the longest prefix known to render
    pub last_good_index: Option<usize>,
    pub failure: RenderOutcome,
    pub last_success: Option<RenderOutcome>,
}

/// How a session ended when no tool error occurred.
#[derive(Debug, Clone)]
pub enum SessionOutcome {
    /// The untouched chart renders.
    Clean { baseline: RenderOutcome },
    /// A minimal failing unit was found.
    Located {
        baseline: RenderOutcome,
        classification: Classification,
        convergence: Box<Convergence>,
    },
    /// The template is structurally broken before any truncation.
    Malformed {
        baseline: RenderOutcome,
        classification: Classification,
        template: ChartTemplate,
        error: MismatchedBlockError,
    },
    /// The chart fails but no template reproduces it under truncation.
    Unlocalized {
        baseline: RenderOutcome,
        classification: Classification,
    },
}

/// Drives the search over one chart.
pub struct Debugger<'a, R: Renderer> {
    harness: RenderHarness<'a, R>,
    config: &'a DebugConfig,
    session: SearchSession,
    decompose_mode: DecomposeMode,
}

impl<'a, R: Renderer> Debugger<'a, R> {
    pub fn new(config: &'a DebugConfig, renderer: &'a R) -> Self {
        Self {
            harness: RenderHarness::new(renderer, config.chart_path.clone()),
            config,
            session: SearchSession::new(),
            decompose_mode: DecomposeMode::Block,
        }
    }

    pub fn session(&self) -> &SearchSession {
        &self.session
    }

    pub fn decompose_mode(&self) -> DecomposeMode {
        self.decompose_mode
    }

    pub fn run(
        &mut self,
        chart: &ChartTemplates,
        progress: &mut dyn Progress,
    ) -> Result<SessionOutcome> {
        match self.run_phases(chart, progress) {
            Ok(outcome) => {
                self.session.enter(Phase::Done);
                Ok(outcome)
            }
            Err(e) => {
                warn!("aborting search: {}", e);
                self.session.enter(Phase::ToolError);
                Err(e)
            }
        }
    }

    fn run_phases(
        &mut self,
        chart: &ChartTemplates,
        progress: &mut dyn Progress,
    ) -> Result<SessionOutcome> {
        self.session.enter(Phase::Init);
        let baseline = self.harness.render_original()?;
        if baseline.passed {
            info!("chart renders cleanly");
            return Ok(SessionOutcome::Clean { baseline });
        }

        self.session.enter(Phase::ClassifyInitialError);
        let classification = classify(&baseline.stderr, &baseline.stdout);
        debug!("initial error: {}", baseline.error_message());
        if let Some(file) = &classification.file {
            progress.info(&format!(
                "Helm reports error in: {}{}",
                file,
                classification
                    .line
                    .map(|l| format!(" (line {})", l))
                    .unwrap_or_default()
            ));
        }

        self.session.enter(Phase::SelectMode);
        self.decompose_mode = if classification.category.is_yaml() {
            progress.info("Detected YAML error - using line-based search");
            DecomposeMode::Line
        } else {
            DecomposeMode::Block
        };
        progress.mode_selected(self.config.mode, self.decompose_mode);

        let (targets, pinned) = self.select_targets(chart, &classification, progress)?;

        self.session.enter(Phase::Searching);
        for template in targets {
            progress.info(&format!("Debugging: {}", template.template_name()));

            let units = match decompose(&template.content, self.decompose_mode) {
                Ok(units) => units,
                Err(error) => {
                    warn!(
                        "{} is malformed before truncation: {}",
                        template.template_name(),
                        error
                    );
                    return Ok(SessionOutcome::Malformed {
                        baseline,
                        classification,
                        template: template.clone(),
                        error,
                    });
                }
            };

            if let Some(convergence) =
                self.search_template(template, units, &baseline, !pinned, progress)?
            {
                self.session.enter(Phase::Converged);
                return Ok(SessionOutcome::Located {
                    baseline,
                    classification,
                    convergence: Box::new(convergence),
                });
            }
        }

        Ok(SessionOutcome::Unlocalized {
            baseline,
            classification,
        })
    }

    /// Pick the templates to search and whether the first one is pinned by
    /// an explicit `--file` or an engine citation.
    fn select_targets<'c>(
        &self,
        chart: &'c ChartTemplates,
        classification: &Classification,
        progress: &mut dyn Progress,
    ) -> Result<(Vec<&'c ChartTemplate>, bool)> {
        if let Some(name) = &self.config.target_file {
            let template = chart
                .find(name)
                .ok_or_else(|| DebugError::TemplateNotFound(name.clone()))?;
            return Ok((vec![template], true));
        }

        if let Some(cited) = &classification.file {
            match chart.find(cited) {
                Some(template) if !template.is_helper() => {
                    progress.info(&format!("Auto-targeting file: {}", template.template_name()));
                    return Ok((vec![template], true));
                }
                Some(_) => progress.info(&format!(
                    "Error cited in helper {}; searching the templates that use it",
                    cited
                )),
                None => progress.warning(&format!("Could not find template: {}", cited)),
            }
        }

        progress.info("Skipping helper files (_*.tpl) from debugging");
        Ok((chart.non_helpers().collect(), false))
    }

    fn render_prefix(
        &mut self,
        template: &ChartTemplate,
        units: &[TemplateUnit],
        prefix: usize,
        progress: &mut dyn Progress,
    ) -> Result<RenderOutcome> {
        let candidate = build(units, prefix);
        let outcome = self.harness.render_candidate(&template.rel_path, &candidate)?;
        let step = self.session.record(
            units[0].kind,
            &template.template_name(),
            range_label(units, prefix),
            prefix,
            outcome.passed,
        );
        progress.step(step);
        Ok(outcome)
    }

    /// Search one template. Returns `None` when truncating it does not
    /// reproduce the failure.
    ///
    /// Prefix lengths run over `[0, n]`. `low` always renders (or is the
    /// unverified floor 0) and `high` always fails (or is the untruncated
    /// file, which failed at baseline).
    fn search_template(
        &mut self,
        template: &ChartTemplate,
        units: Vec<TemplateUnit>,
        baseline: &RenderOutcome,
        verify_floor: bool,
        progress: &mut dyn Progress,
    ) -> Result<Option<Convergence>> {
        let n = units.len();
        if units.iter().all(|u| u.text.trim().is_empty()) {
            return Ok(None);
        }

        self.session.reset_bounds(n);
        let mut last_success = None;
        let mut last_failure = None;

        if verify_floor {
            let outcome = self.render_prefix(template, &units, 0, progress)?;
            if !outcome.passed {
                debug!(
                    "{} still fails with no content; not the culprit",
                    template.template_name()
                );
                return Ok(None);
            }
            last_success = Some(outcome);
        }

        match self.config.mode {
            SearchMode::Binary => loop {
                let (low, high) = self.session.bounds();
                if high - low <= 1 {
                    break;
                }
                let mid = low + (high - low) / 2;
                let outcome = self.render_prefix(template, &units, mid, progress)?;
                self.session.narrow(mid, outcome.passed);
                if outcome.passed {
                    last_success = Some(outcome);
                } else {
                    last_failure = Some(outcome);
                }
            },
            SearchMode::Step => {
                let mut failed = false;
                for prefix in 1..=n {
                    let outcome = self.render_prefix(template, &units, prefix, progress)?;
                    if outcome.passed {
                        self.session.narrow(prefix, true);
                        last_success = Some(outcome);
                    } else {
                        self.session.narrow(prefix, false);
                        last_failure = Some(outcome);
                        failed = true;
                        break;
                    }
                }
                if !failed {
                    return Ok(None);
                }
            }
        }

        let (low, high) = self.session.bounds();
        if high == 0 {
            return Ok(None);
        }

        info!(
            "converged on {} unit {} (last good {:?})",
            template.template_name(),
            high - 1,
            low.checked_sub(1)
        );

        Ok(Some(Convergence {
            template: template.clone(),
            units,
            failing_index: high - 1,
            last_good_index: low.checked_sub(1),
            failure: last_failure.unwrap_or_else(|| baseline.clone()),
            last_success,
        }))
    }
}
