use crate::parser::{stack_after, TemplateUnit, UnitKind};

/// Rebuild a candidate file from the first `prefix` units.
///
/// In block mode every control block still open after the prefix is closed,
/// innermost first, so the engine sees a well-formed file. Line-mode
/// candidates are plain prefixes. With `prefix == units.len()` on a valid
/// decomposition the original text comes back unchanged.
pub fn build(units: &[TemplateUnit], prefix: usize) -> String {
    let prefix = prefix.min(units.len());
    let mut text: String = units[..prefix].iter().map(|u| u.text.as_str()).collect();

    let block_mode = units.first().map_or(false, |u| u.kind == UnitKind::Block);
    if !block_mode {
        return text;
    }

    let closers = stack_after(units, prefix).closers();
    if closers.is_empty() {
        return text;
    }

    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    for closer in closers {
        text.push_str(&closer);
        text.push('\n');
    }
    text
}

/// Human-readable label for the units included in a prefix, e.g. `0-7` or `1-34`.
pub fn range_label(units: &[TemplateUnit], prefix: usize) -> String {
    let kind = units.first().map(|u| u.kind).unwrap_or(UnitKind::Block);
    match (kind, prefix) {
        (_, 0) => "none".to_string(),
        (UnitKind::Line, n) => format!("1-{}", units[n - 1].end_line),
        (UnitKind::Block, n) => format!("0-{}", n - 1),
    }
}
