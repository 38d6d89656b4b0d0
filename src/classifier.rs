//! Classification of helm error messages.
//!
//! Rules are an ordered table evaluated top to bottom; the first match wins.
//! Parse-phase failures (YAML, then template syntax) come before semantic
//! ones because the engine reports them first.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    YamlSyntax,
    YamlStructure,
    TemplateSyntax,
    TemplateReference,
    NilReference,
    TypeError,
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::YamlSyntax => "yaml_syntax",
            ErrorCategory::YamlStructure => "yaml_structure",
            ErrorCategory::TemplateSyntax => "template_syntax",
            ErrorCategory::TemplateReference => "template_reference",
            ErrorCategory::NilReference => "nil_reference",
            ErrorCategory::TypeError => "type_error",
            ErrorCategory::Other => "other",
        }
    }

    /// YAML failures are searched line by line; everything else by block.
    pub fn is_yaml(&self) -> bool {
        matches!(self, ErrorCategory::YamlSyntax | ErrorCategory::YamlStructure)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::None => "none",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

struct Rule {
    pattern: Regex,
    category: ErrorCategory,
    risk: RiskLevel,
}

const RULE_TABLE: &[(&str, ErrorCategory, RiskLevel)] = &[
    (
        r"(?i)did not find expected|could not find expected|mapping values are not allowed|block sequence entries are not allowed|found character that cannot start|found a tab character",
        ErrorCategory::YamlStructure,
        RiskLevel::High,
    ),
    (
        r"(?i)yaml parse error|(?:^|\s)yaml: |error converting yaml to json",
        ErrorCategory::YamlSyntax,
        RiskLevel::High,
    ),
    (
        r"(?i)parse error|unexpected|unclosed action|unterminated|bad character|missing value for",
        ErrorCategory::TemplateSyntax,
        RiskLevel::Low,
    ),
    (
        r"(?i)nil pointer evaluating|nil pointer dereference|map has no entry for key|can't evaluate field|nil data; no entry",
        ErrorCategory::NilReference,
        RiskLevel::Medium,
    ),
    (
        r#"(?i)no template "|not defined|undefined variable|undefined"#,
        ErrorCategory::TemplateReference,
        RiskLevel::Low,
    ),
    (
        r"(?i)cannot range over|wrong type for value|incompatible types|error calling|can't give argument|invalid type|cannot index|expected (integer|string|map|slice)",
        ErrorCategory::TypeError,
        RiskLevel::Medium,
    ),
];

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    RULE_TABLE
        .iter()
        .filter_map(|(pattern, category, risk)| {
            Regex::new(pattern).ok().map(|pattern| Rule {
                pattern,
                category: *category,
                risk: *risk,
            })
        })
        .collect()
});

static FILE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"YAML parse error on [^/\s]+/templates/([^:\s]+)",
        r"template: [^/\s]+/templates/([^:\s]+):",
        r"\([^/\s()]+/templates/([^:)\s]+):\d+\)",
        r"templates/([^\s:]+\.(?:yaml|yml|tpl))",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static LINE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\([^()\s]+\.(?:yaml|yml|tpl):(\d+)\)",
        r"yaml: line (\d+)",
        r"\.(?:yaml|yml|tpl):(\d+)",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// What the classifier made of one engine message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: ErrorCategory,
    pub risk: RiskLevel,
    /// Cited template, relative to `templates/`
    pub file: Option<String>,
    pub line: Option<usize>,
}

fn message_text<'a>(stderr: &'a str, stdout: &'a str) -> &'a str {
    if stderr.trim().is_empty() {
        stdout
    } else {
        stderr
    }
}

/// Classify an engine failure from its captured output.
pub fn classify(stderr: &str, stdout: &str) -> Classification {
    let text = message_text(stderr, stdout);

    let (category, risk) = RULES
        .iter()
        .find(|r| r.pattern.is_match(text))
        .map(|r| (r.category, r.risk))
        .unwrap_or((ErrorCategory::Other, RiskLevel::None));

    Classification {
        category,
        risk,
        file: cited_file(text),
        line: cited_line(text),
    }
}

/// Like [`classify`], escalating template errors that surface in a file
/// other than the one being searched. `target` is the path below `templates/`.
pub fn classify_for_target(stderr: &str, stdout: &str, target: &str) -> Classification {
    let mut c = classify(stderr, stdout);
    let cross_file = c.file.as_deref().map_or(false, |cited| {
        cited.trim_start_matches("templates/") != target.trim_start_matches("templates/")
    });
    if cross_file
        && matches!(
            c.category,
            ErrorCategory::TemplateSyntax | ErrorCategory::TemplateReference
        )
    {
        c.risk = RiskLevel::Medium;
    }
    c
}

pub fn cited_file(text: &str) -> Option<String> {
    FILE_PATTERNS
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn cited_line(text: &str) -> Option<usize> {
    LINE_PATTERNS
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
