//! Localize the template fragment that breaks `helm template`.
//!
//! A failing chart is searched by rendering truncated copies of one template
//! at a time and narrowing to the first unit whose inclusion makes the render
//! fail. The result is classified and assembled into a stable JSON report.

pub mod chart;
pub mod classifier;
pub mod config;
pub mod debugger;
pub mod error;
pub mod executor;
pub mod parser;
pub mod report;

pub use config::DebugConfig;
pub use debugger::{run, run_with_renderer, Progress, SearchMode, Silent};
pub use error::{DebugError, Result};
pub use report::{SearchResult, Status};
