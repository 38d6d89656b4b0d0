use super::json::{
    ErrorReport, FileSummary, NumberedLine, ReportError, SearchInfo, SearchResult, Status,
    StepRecord, Summary, REPORT_VERSION,
};
use crate::chart::{ChartTemplate, ChartTemplates};
use crate::classifier::{classify_for_target, Classification, ErrorCategory, RiskLevel};
use crate::config::DebugConfig;
use crate::debugger::{Convergence, SearchSession, SessionOutcome};
use crate::error::{DebugError, MismatchedBlockError};
use crate::executor::RenderOutcome;
use crate::parser::{DecomposeMode, UnitKind};

const CONTEXT_LINES: usize = 3;
const MANIFEST_TAIL_LINES: usize = 5;

const SUGGESTIONS: &[(ErrorCategory, &[&str])] = &[
    (
        ErrorCategory::YamlStructure,
        &[
            "Check indentation - YAML requires consistent spacing",
            "Check YAML structure - possibly wrong indentation or missing item",
            "Check YAML key-value syntax (key: value)",
        ],
    ),
    (
        ErrorCategory::YamlSyntax,
        &[
            "Check indentation - YAML requires consistent spacing",
            "Check YAML key-value syntax (key: value)",
            "Use nindent/indent when including multi-line values",
        ],
    ),
    (
        ErrorCategory::TemplateSyntax,
        &[
            "Check for mismatched or missing braces {{ }}",
            "Make sure every if/range/with/define has a matching {{ end }}",
        ],
    ),
    (
        ErrorCategory::TemplateReference,
        &[
            "Verify the variable exists in values.yaml",
            "Check for typos in variable names",
            "The referenced template or helper may not exist",
        ],
    ),
    (
        ErrorCategory::NilReference,
        &[
            "Add a nil check: {{- if .Values.something }}",
            "Provide a default: {{ .Values.something | default \"value\" }}",
        ],
    ),
    (
        ErrorCategory::TypeError,
        &[
            "Ensure the value is a list or map before ranging",
            "Check the argument types passed to template functions",
        ],
    ),
    (
        ErrorCategory::Other,
        &["Inspect the helm error message above for details"],
    ),
];

pub fn suggestions_for(category: ErrorCategory) -> Vec<String> {
    SUGGESTIONS
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, list)| list.iter().map(|s| s.to_string()).collect())
        .unwrap_or_default()
}

pub fn summarize(chart: &ChartTemplates) -> Summary {
    Summary {
        chart_path: chart.chart_path.display().to_string(),
        template_files: chart.total_files(),
        total_blocks: chart.total_blocks(),
        files: chart
            .templates
            .iter()
            .map(|t| FileSummary {
                name: t.template_name(),
                blocks: t.block_count(),
                lines: t.total_lines(),
            })
            .collect(),
    }
}

pub fn step_records(session: &SearchSession) -> Vec<StepRecord> {
    session
        .steps()
        .iter()
        .map(|s| StepRecord {
            step: s.step_number,
            unit_type: match s.unit_type {
                UnitKind::Line => "line".to_string(),
                UnitKind::Block => "block".to_string(),
            },
            range: s.range_tested.clone(),
            passed: s.passed,
        })
        .collect()
}

fn search_info(config: &DebugConfig, session: Option<&SearchSession>) -> SearchInfo {
    SearchInfo {
        mode: config.mode.as_str().to_string(),
        total_steps: session.map_or(0, |s| s.steps().len()),
    }
}

/// Build the final report for a session that ran to completion.
pub fn assemble(
    config: &DebugConfig,
    chart: &ChartTemplates,
    decompose_mode: DecomposeMode,
    session: &SearchSession,
    outcome: &SessionOutcome,
) -> SearchResult {
    let (status, error, suggestions) = match outcome {
        SessionOutcome::Clean { .. } => (Status::Success, None, Vec::new()),
        SessionOutcome::Located { convergence, .. } => {
            let report = locate(convergence, decompose_mode);
            let suggestions = suggestions_for(report.category);
            (Status::Failure, Some(report), suggestions)
        }
        SessionOutcome::Malformed {
            baseline,
            template,
            error,
            ..
        } => {
            let report = malformed(template, error, baseline);
            let mut suggestions = vec![format!("Unbalanced control block: {}", error)];
            suggestions.extend(suggestions_for(report.category));
            (Status::Failure, Some(report), suggestions)
        }
        SessionOutcome::Unlocalized {
            baseline,
            classification,
        } => {
            let report = unlocalized(baseline, classification);
            let suggestions = suggestions_for(report.category);
            (Status::Failure, Some(report), suggestions)
        }
    };

    SearchResult {
        version: REPORT_VERSION.to_string(),
        status,
        exit_code: status.exit_code(),
        summary: summarize(chart),
        search: search_info(config, Some(session)),
        error: error.map(|r| ReportError::Fault(Box::new(r))),
        suggestions,
        steps: step_records(session),
    }
}

/// Build the report for a run aborted by an environment problem.
pub fn assemble_tool_error(
    config: &DebugConfig,
    chart: Option<&ChartTemplates>,
    session: Option<&SearchSession>,
    error: &DebugError,
) -> SearchResult {
    let summary = chart.map(summarize).unwrap_or_else(|| Summary {
        chart_path: config.chart_path.display().to_string(),
        ..Summary::default()
    });

    SearchResult {
        version: REPORT_VERSION.to_string(),
        status: Status::Error,
        exit_code: Status::Error.exit_code(),
        summary,
        search: search_info(config, session),
        error: Some(ReportError::Tool {
            message: error.to_string(),
        }),
        suggestions: Vec::new(),
        steps: session.map(step_records).unwrap_or_default(),
    }
}

fn source_lines(content: &str) -> Vec<&str> {
    content.lines().collect()
}

fn numbered(lines: &[&str], range: impl Iterator<Item = usize>) -> Vec<NumberedLine> {
    range
        .filter_map(|line| {
            lines.get(line.wrapping_sub(1)).map(|content| NumberedLine {
                line,
                content: content.to_string(),
            })
        })
        .collect()
}

fn context_before(lines: &[&str], start: usize) -> Vec<NumberedLine> {
    let from = start.saturating_sub(CONTEXT_LINES).max(1);
    numbered(lines, from..start)
}

fn context_after(lines: &[&str], end: usize) -> Vec<NumberedLine> {
    numbered(lines, end + 1..=end + CONTEXT_LINES)
}

fn locate(conv: &Convergence, decompose_mode: DecomposeMode) -> ErrorReport {
    let template_name = conv.template.template_name();
    let unit = &conv.units[conv.failing_index];
    let lines = source_lines(&conv.template.content);

    let is_content = |l: &usize| lines.get(l - 1).map_or(false, |s| !s.trim().is_empty());
    let start = (unit.start_line..=unit.end_line)
        .find(is_content)
        .unwrap_or(unit.start_line);
    let end = (start..=unit.end_line)
        .rev()
        .find(is_content)
        .unwrap_or(unit.end_line);

    let classification =
        classify_for_target(&conv.failure.stderr, &conv.failure.stdout, &template_name);

    let last_successful_line = match decompose_mode {
        DecomposeMode::Line => conv.last_good_index.map(|i| conv.units[i].end_line),
        DecomposeMode::Block => None,
    };

    ErrorReport {
        file: Some(template_name.clone()),
        line: Some(start),
        end_line: Some(end),
        block_type: Some(unit.block_type.as_str().to_string()),
        block_index: Some(conv.failing_index),
        last_successful_block_index: conv.last_good_index,
        last_successful_line,
        category: classification.category,
        risk: classification.risk,
        helm_error: conv.failure.error_message(),
        failing_lines: numbered(&lines, start..=end),
        context_before: context_before(&lines, start),
        context_after: context_after(&lines, end),
        rendered_manifest_tail: conv
            .last_success
            .as_ref()
            .map(|o| rendered_tail(&o.stdout, &template_name))
            .unwrap_or_default(),
    }
}

fn malformed(
    template: &ChartTemplate,
    error: &MismatchedBlockError,
    baseline: &RenderOutcome,
) -> ErrorReport {
    let lines = source_lines(&template.content);
    ErrorReport {
        file: Some(template.template_name()),
        line: Some(error.line),
        end_line: Some(error.line),
        block_type: None,
        block_index: None,
        last_successful_block_index: None,
        last_successful_line: None,
        category: ErrorCategory::TemplateSyntax,
        risk: RiskLevel::Low,
        helm_error: baseline.error_message(),
        failing_lines: numbered(&lines, error.line..=error.line),
        context_before: context_before(&lines, error.line),
        context_after: context_after(&lines, error.line),
        rendered_manifest_tail: Vec::new(),
    }
}

fn unlocalized(baseline: &RenderOutcome, classification: &Classification) -> ErrorReport {
    ErrorReport {
        file: classification.file.clone(),
        line: classification.line,
        end_line: classification.line,
        block_type: None,
        block_index: None,
        last_successful_block_index: None,
        last_successful_line: None,
        category: classification.category,
        risk: classification.risk,
        helm_error: baseline.error_message(),
        failing_lines: Vec::new(),
        context_before: Vec::new(),
        context_after: Vec::new(),
        rendered_manifest_tail: Vec::new(),
    }
}

/// Split `helm template` output into its `---` separated documents.
fn split_documents(rendered: &str) -> Vec<Vec<&str>> {
    let mut docs = vec![Vec::new()];
    for line in rendered.lines() {
        if line.trim_end() == "---" {
            docs.push(Vec::new());
        } else if let Some(doc) = docs.last_mut() {
            doc.push(line);
        }
    }
    docs
}

/// The rendered document that came from `template_name`, minus its
/// `# Source:` header.
pub fn extract_file_section(rendered: &str, template_name: &str) -> Option<String> {
    let needle = format!("/templates/{}", template_name);
    for doc in split_documents(rendered) {
        let header = doc.iter().position(|l| {
            let l = l.trim_start();
            l.starts_with('#') && l.contains("Source:")
        });
        if let Some(pos) = header {
            if doc[pos].trim_end().ends_with(&needle) {
                let body = &doc[pos + 1..];
                if body.is_empty() {
                    return Some(doc.join("\n").trim().to_string());
                }
                return Some(body.join("\n"));
            }
        }
    }
    None
}

/// Last few lines of what the template rendered to, numbered within its document.
pub fn rendered_tail(rendered: &str, template_name: &str) -> Vec<NumberedLine> {
    let section = extract_file_section(rendered, template_name)
        .unwrap_or_else(|| rendered.to_string());
    let lines: Vec<&str> = section.lines().collect();
    let start = lines.len().saturating_sub(MANIFEST_TAIL_LINES);
    lines[start..]
        .iter()
        .enumerate()
        .map(|(i, content)| NumberedLine {
            line: start + i + 1,
            content: content.to_string(),
        })
        .collect()
}
