mod assembler;
mod json;
mod text;

pub use assembler::{
    assemble, assemble_tool_error, extract_file_section, rendered_tail, step_records, suggestions_for,
    summarize,
};
pub use json::{
    ErrorReport, FileSummary, NumberedLine, ReportError, SearchInfo, SearchResult, Status,
    StepRecord, Summary, REPORT_VERSION,
};
pub use text::TextReporter;
