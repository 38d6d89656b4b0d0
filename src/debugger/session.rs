use crate::parser::UnitKind;
use log::debug;
use serde::Serialize;

/// Where the controller is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    ClassifyInitialError,
    SelectMode,
    Searching,
    Converged,
    Done,
    ToolError,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Done | Phase::ToolError)
    }
}

/// One render of the search, as it appears in the trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchStep {
    pub step_number: usize,
    pub unit_type: UnitKind,
    pub file: String,
    /// Units included, e.g. `0-7` (blocks) or `1-34` (lines)
    pub range_tested: String,
    /// Number of units rendered
    pub prefix: usize,
    pub passed: bool,
}

/// Mutable state of one debugging session: the phase, the current search
/// interval and the append-only step log.
#[derive(Debug)]
pub struct SearchSession {
    phase: Phase,
    steps: Vec<SearchStep>,
    low: usize,
    high: usize,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchSession {
    pub fn new() -> Self {
        Self {
            phase: Phase::Init,
            steps: Vec::new(),
            low: 0,
            high: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn enter(&mut self, phase: Phase) {
        if self.phase.is_terminal() {
            return;
        }
        debug!("session phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    pub fn steps(&self) -> &[SearchStep] {
        &self.steps
    }

    pub fn bounds(&self) -> (usize, usize) {
        (self.low, self.high)
    }

    /// Start searching a fresh sequence of `units` units.
    pub fn reset_bounds(&mut self, units: usize) {
        self.low = 0;
        self.high = units;
    }

    /// Narrow the interval after testing `prefix`. Passing moves the floor up,
    /// failing moves the ceiling down.
    pub fn narrow(&mut self, prefix: usize, passed: bool) {
        if passed {
            self.low = prefix;
        } else {
            self.high = prefix;
        }
    }

    pub fn record(
        &mut self,
        unit_type: UnitKind,
        file: &str,
        range_tested: String,
        prefix: usize,
        passed: bool,
    ) -> &SearchStep {
        let step = SearchStep {
            step_number: self.steps.len() + 1,
            unit_type,
            file: file.to_string(),
            range_tested,
            prefix,
            passed,
        };
        debug!(
            "step {} [{}] {} -> {}",
            step.step_number,
            step.file,
            step.range_tested,
            if passed { "ok" } else { "fail" }
        );
        self.steps.push(step);
        &self.steps[self.steps.len() - 1]
    }
}
