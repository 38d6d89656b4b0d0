use super::types::{BlockType, ControlEvent, ControlKind};

/// A single `{{ ... }}` action found in template text.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub block_type: BlockType,
    pub event: Option<ControlEvent>,
    pub trim_left: bool,
}

/// Result of scanning a chunk of text for actions.
#[derive(Debug, Clone, Default)]
pub struct ActionScan {
    pub actions: Vec<Action>,
    /// An opening `{{` was seen without its closing `}}`.
    pub unterminated: bool,
}

impl ActionScan {
    pub fn events(&self) -> impl Iterator<Item = ControlEvent> + '_ {
        self.actions.iter().filter_map(|a| a.event)
    }
}

/// Find every action in `text`, honoring string literals, raw strings and comments.
pub fn scan_actions(text: &str) -> ActionScan {
    let bytes = text.as_bytes();
    let mut scan = ActionScan::default();
    let mut i = 0usize;

    while let Some(start) = find_action_start(bytes, i) {
        match find_action_end(bytes, start + 2) {
            Some(end) => {
                let body = &text[start + 2..end - 2];
                scan.actions.push(classify_action(body));
                i = end;
            }
            None => {
                scan.unterminated = true;
                break;
            }
        }
    }

    scan
}

fn find_action_start(bytes: &[u8], from: usize) -> Option<usize> {
    let mut i = from;
    while i + 1 < bytes.len() {
        if bytes[i] == b'{' && bytes[i + 1] == b'{' {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Index just past the `}}` closing the action whose body starts at `from`.
fn find_action_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut i = from;
    let mut in_raw = false;
    let mut in_string = false;
    let mut in_char = false;
    let mut in_comment = false;

    while i < bytes.len() {
        let current = bytes[i];
        let next = bytes.get(i + 1).copied();

        if in_comment {
            if current == b'*' && next == Some(b'/') {
                in_comment = false;
                i += 2;
            } else {
                i += 1;
            }
            continue;
        }

        if in_raw {
            if current == b'`' {
                in_raw = false;
            }
            i += 1;
            continue;
        }

        if in_string || in_char {
            let quote = if in_string { b'"' } else { b'\'' };
            if current == b'\\' {
                i += 2;
                continue;
            }
            if current == quote {
                in_string = false;
                in_char = false;
            }
            i += 1;
            continue;
        }

        match current {
            b'/' if next == Some(b'*') => {
                in_comment = true;
                i += 2;
            }
            b'`' => {
                in_raw = true;
                i += 1;
            }
            b'"' => {
                in_string = true;
                i += 1;
            }
            b'\'' => {
                in_char = true;
                i += 1;
            }
            b'}' if next == Some(b'}') => return Some(i + 2),
            _ => i += 1,
        }
    }

    None
}

/// Strip the `-` trim markers and surrounding whitespace from an action body.
pub fn trim_action_body(body: &str) -> (&str, bool) {
    let trim_left = body.starts_with('-')
        && body[1..]
            .chars()
            .next()
            .map_or(true, |c| c.is_whitespace());
    let mut inner = if trim_left { &body[1..] } else { body };

    let trimmed_end = inner.trim_end();
    if let Some(stripped) = trimmed_end.strip_suffix('-') {
        if stripped.ends_with(char::is_whitespace) || stripped.is_empty() {
            inner = stripped;
        }
    }

    (inner.trim(), trim_left)
}

fn first_word(inner: &str) -> &str {
    inner
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or("")
}

fn classify_action(body: &str) -> Action {
    let (inner, trim_left) = trim_action_body(body);

    if inner.starts_with("/*") {
        return Action {
            block_type: BlockType::Comment,
            event: None,
            trim_left,
        };
    }

    let open = |block_type, kind| Action {
        block_type,
        event: Some(ControlEvent::Open { kind, trim_left }),
        trim_left,
    };

    match first_word(inner) {
        "if" => open(BlockType::If, ControlKind::If),
        "range" => open(BlockType::Range, ControlKind::Range),
        "with" => open(BlockType::With, ControlKind::With),
        "define" => open(BlockType::Define, ControlKind::Define),
        "block" => open(BlockType::Block, ControlKind::Block),
        "else" => {
            let rest = inner["else".len()..].trim_start();
            let block_type = if first_word(rest).is_empty() {
                BlockType::Else
            } else {
                BlockType::ElseIf
            };
            Action {
                block_type,
                event: Some(ControlEvent::Branch),
                trim_left,
            }
        }
        "end" => Action {
            block_type: BlockType::End,
            event: Some(ControlEvent::Close),
            trim_left,
        },
        "template" => Action {
            block_type: BlockType::Template,
            event: None,
            trim_left,
        },
        "include" => Action {
            block_type: BlockType::Include,
            event: None,
            trim_left,
        },
        _ => Action {
            block_type: BlockType::Expression,
            event: None,
            trim_left,
        },
    }
}

/// Pick the type that best describes a unit: control actions first, then
/// template calls, then plain expressions.
pub fn dominant_block_type(actions: &[Action]) -> BlockType {
    if let Some(a) = actions.iter().find(|a| a.block_type.is_control()) {
        return a.block_type;
    }
    if let Some(a) = actions
        .iter()
        .find(|a| matches!(a.block_type, BlockType::Template | BlockType::Include))
    {
        return a.block_type;
    }
    if actions.iter().any(|a| a.block_type == BlockType::Expression) {
        return BlockType::Expression;
    }
    if actions.is_empty() {
        BlockType::Plain
    } else {
        BlockType::Comment
    }
}
