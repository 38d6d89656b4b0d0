use crate::classifier::{ErrorCategory, RiskLevel};
use serde::Serialize;

pub const REPORT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failure,
    Error,
}

impl Status {
    pub fn exit_code(&self) -> i32 {
        match self {
            Status::Success => 0,
            Status::Failure => 1,
            Status::Error => 2,
        }
    }
}

/// A numbered line of source or rendered output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumberedLine {
    pub line: usize,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub name: String,
    pub blocks: usize,
    pub lines: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub chart_path: String,
    pub template_files: usize,
    pub total_blocks: usize,
    pub files: Vec<FileSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchInfo {
    pub mode: String,
    pub total_steps: usize,
}

/// The located fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub file: Option<String>,
    pub line: Option<usize>,
    pub end_line: Option<usize>,
    pub block_type: Option<String>,
    pub block_index: Option<usize>,
    pub last_successful_block_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_successful_line: Option<usize>,
    pub category: ErrorCategory,
    pub risk: RiskLevel,
    pub helm_error: String,
    pub failing_lines: Vec<NumberedLine>,
    pub context_before: Vec<NumberedLine>,
    pub context_after: Vec<NumberedLine>,
    pub rendered_manifest_tail: Vec<NumberedLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReportError {
    Fault(Box<ErrorReport>),
    Tool { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub step: usize,
    #[serde(rename = "type")]
    pub unit_type: String,
    pub range: String,
    pub passed: bool,
}

/// Everything one debugging session produced, in report form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub version: String,
    pub status: Status,
    pub exit_code: i32,
    pub summary: Summary,
    pub search: SearchInfo,
    pub error: Option<ReportError>,
    pub suggestions: Vec<String>,
    pub steps: Vec<StepRecord>,
}

impl SearchResult {
    pub fn fault(&self) -> Option<&ErrorReport> {
        match &self.error {
            Some(ReportError::Fault(report)) => Some(report),
            _ => None,
        }
    }

    pub fn tool_error(&self) -> Option<&str> {
        match &self.error {
            Some(ReportError::Tool { message }) => Some(message),
            _ => None,
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
