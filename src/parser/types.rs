use crate::error::MismatchedBlockError;
use serde::Serialize;

/// How a template file is cut into bisectable units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DecomposeMode {
    /// One unit per physical line, no block awareness.
    Line,
    /// Content lines annotated with control-block events.
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Line,
    Block,
}

/// What a unit mostly consists of, reported as `block_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Plain,
    Expression,
    If,
    Else,
    ElseIf,
    End,
    Range,
    With,
    Define,
    Block,
    Template,
    Include,
    Comment,
    Line,
}

impl BlockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Plain => "plain",
            BlockType::Expression => "expression",
            BlockType::If => "if",
            BlockType::Else => "else",
            BlockType::ElseIf => "else_if",
            BlockType::End => "end",
            BlockType::Range => "range",
            BlockType::With => "with",
            BlockType::Define => "define",
            BlockType::Block => "block",
            BlockType::Template => "template",
            BlockType::Include => "include",
            BlockType::Comment => "comment",
            BlockType::Line => "line",
        }
    }

    pub fn is_control(&self) -> bool {
        matches!(
            self,
            BlockType::If
                | BlockType::Else
                | BlockType::ElseIf
                | BlockType::End
                | BlockType::Range
                | BlockType::With
                | BlockType::Define
                | BlockType::Block
        )
    }
}

/// Template constructs that open a nested scope and need a matching `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    If,
    Range,
    With,
    Define,
    Block,
}

impl ControlKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            ControlKind::If => "if",
            ControlKind::Range => "range",
            ControlKind::With => "with",
            ControlKind::Define => "define",
            ControlKind::Block => "block",
        }
    }
}

/// A stack operation recorded by the decomposer, replayed by the truncation builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    Open { kind: ControlKind, trim_left: bool },
    Branch,
    Close,
}

/// One bisectable piece of a template file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateUnit {
    pub index: usize,
    /// 1-based, inclusive
    pub start_line: usize,
    pub end_line: usize,
    pub kind: UnitKind,
    pub block_type: BlockType,
    pub open_depth: usize,
    pub close_depth: usize,
    pub events: Vec<ControlEvent>,
    pub text: String,
}

impl TemplateUnit {
    pub fn line_count(&self) -> usize {
        self.end_line + 1 - self.start_line
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenBlock {
    pub kind: ControlKind,
    pub line: usize,
    pub trim_left: bool,
}

/// Currently open control constructs, innermost last.
#[derive(Debug, Clone, Default)]
pub struct ControlBlockStack {
    entries: Vec<OpenBlock>,
}

impl ControlBlockStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn innermost(&self) -> Option<&OpenBlock> {
        self.entries.last()
    }

    /// Apply one event seen at `line`. Closing or branching with nothing open
    /// means the source itself is malformed.
    pub fn apply(&mut self, event: ControlEvent, line: usize) -> Result<(), MismatchedBlockError> {
        match event {
            ControlEvent::Open { kind, trim_left } => {
                self.entries.push(OpenBlock {
                    kind,
                    line,
                    trim_left,
                });
                Ok(())
            }
            ControlEvent::Branch => {
                if self.entries.is_empty() {
                    Err(MismatchedBlockError {
                        line,
                        message: "{{ else }} without an open if/range/with".to_string(),
                    })
                } else {
                    Ok(())
                }
            }
            ControlEvent::Close => match self.entries.pop() {
                Some(_) => Ok(()),
                None => Err(MismatchedBlockError {
                    line,
                    message: "{{ end }} without a matching open block".to_string(),
                }),
            },
        }
    }

    /// Replay a unit's events. Used on prefixes of an already-validated
    /// decomposition, so unbalanced events are ignored rather than reported.
    pub fn replay(&mut self, unit: &TemplateUnit) {
        for event in &unit.events {
            let _ = self.apply(*event, unit.start_line);
        }
    }

    /// Closing actions for every open entry, innermost first.
    pub fn closers(&self) -> Vec<String> {
        self.entries
            .iter()
            .rev()
            .map(|open| {
                if open.trim_left {
                    "{{- end }}".to_string()
                } else {
                    "{{ end }}".to_string()
                }
            })
            .collect()
    }
}
