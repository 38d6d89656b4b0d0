use serde::Serialize;

/// How the search walks the unit sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Halve the candidate interval each render.
    Binary,
    /// Render every prefix in order until the first failure.
    Step,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Binary => "binary",
            SearchMode::Step => "step",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SearchMode::Binary => "Binary Search",
            SearchMode::Step => "Step-by-Step",
        }
    }
}
