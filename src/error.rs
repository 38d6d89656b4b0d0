use std::path::PathBuf;
use thiserror::Error;

/// Result type for debugger operations
pub type Result<T> = std::result::Result<T, DebugError>;

/// Environment and setup failures. Any of these aborts the run with exit code 2.
#[derive(Error, Debug)]
pub enum DebugError {
    #[error("Helm executable not found. Install Helm or use --helm-path.")]
    HelmNotFound,

    #[error("Chart path does not exist: {0}")]
    ChartNotFound(PathBuf),

    #[error("Invalid chart: {0}")]
    InvalidChart(String),

    #[error("Template file not found: {0}")]
    TemplateNotFound(String),

    #[error("No template files found in chart")]
    NoTemplates,

    #[error("helm did not finish within {seconds} seconds")]
    RenderTimeout { seconds: u64 },

    #[error("failed to run {program}: {source}")]
    RenderSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DebugError {
    pub fn invalid_chart(msg: impl Into<String>) -> Self {
        Self::InvalidChart(msg.into())
    }

    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArgs(msg.into())
    }
}

/// The original template is already structurally broken: a control block is
/// closed with nothing open, or left open at end of file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct MismatchedBlockError {
    pub line: usize,
    pub message: String,
}
