use super::actions::{dominant_block_type, scan_actions};
use super::types::{
    BlockType, ControlBlockStack, ControlEvent, DecomposeMode, TemplateUnit, UnitKind,
};
use crate::error::MismatchedBlockError;

/// Split source text into physical lines, each keeping its line terminator.
pub fn split_physical_lines(source: &str) -> Vec<&str> {
    source.split_inclusive('\n').collect()
}

/// Break a template into an ordered sequence of bisectable units.
///
/// Concatenating the `text` of every returned unit reproduces `source`
/// exactly. An empty source yields a single empty unit.
pub fn decompose(
    source: &str,
    mode: DecomposeMode,
) -> Result<Vec<TemplateUnit>, MismatchedBlockError> {
    let units = match mode {
        DecomposeMode::Line => decompose_lines(source),
        DecomposeMode::Block => decompose_blocks(source)?,
    };

    if units.is_empty() {
        return Ok(vec![TemplateUnit {
            index: 0,
            start_line: 1,
            end_line: 1,
            kind: match mode {
                DecomposeMode::Line => UnitKind::Line,
                DecomposeMode::Block => UnitKind::Block,
            },
            block_type: match mode {
                DecomposeMode::Line => BlockType::Line,
                DecomposeMode::Block => BlockType::Plain,
            },
            open_depth: 0,
            close_depth: 0,
            events: Vec::new(),
            text: source.to_string(),
        }]);
    }

    Ok(units)
}

fn decompose_lines(source: &str) -> Vec<TemplateUnit> {
    split_physical_lines(source)
        .into_iter()
        .enumerate()
        .map(|(i, line)| TemplateUnit {
            index: i,
            start_line: i + 1,
            end_line: i + 1,
            kind: UnitKind::Line,
            block_type: BlockType::Line,
            open_depth: 0,
            close_depth: 0,
            events: Vec::new(),
            text: line.to_string(),
        })
        .collect()
}

/// Join physical lines into content units. Blank lines ride along with the
/// next content line; an action spanning several lines stays in one unit.
fn decompose_blocks(source: &str) -> Result<Vec<TemplateUnit>, MismatchedBlockError> {
    let physical = split_physical_lines(source);
    let mut units: Vec<TemplateUnit> = Vec::new();
    let mut stack = ControlBlockStack::new();

    let mut buf = String::new();
    let mut start_line = 1usize;

    for (i, line) in physical.iter().enumerate() {
        let line_no = i + 1;
        if buf.is_empty() {
            start_line = line_no;
        }
        buf.push_str(line);

        if buf.trim().is_empty() {
            continue;
        }

        let scan = scan_actions(&buf);
        if scan.unterminated && line_no < physical.len() {
            continue;
        }

        let events: Vec<_> = scan.events().collect();
        for event in &events {
            stack.apply(*event, line_no)?;
        }

        let open_depth = events
            .iter()
            .filter(|e| matches!(e, ControlEvent::Open { .. }))
            .count();
        let close_depth = events
            .iter()
            .filter(|e| matches!(e, ControlEvent::Close))
            .count();

        units.push(TemplateUnit {
            index: units.len(),
            start_line,
            end_line: line_no,
            kind: UnitKind::Block,
            block_type: dominant_block_type(&scan.actions),
            open_depth,
            close_depth,
            events,
            text: std::mem::take(&mut buf),
        });
    }

    // Trailing blank lines belong to the last unit.
    if !buf.is_empty() {
        if let Some(last) = units.last_mut() {
            last.text.push_str(&buf);
            last.end_line = physical.len();
        }
    }

    if let Some(open) = stack.innermost() {
        return Err(MismatchedBlockError {
            line: open.line,
            message: format!(
                "{{{{ {} }}}} opened here is never closed ({} block(s) still open at end of file)",
                open.kind.keyword(),
                stack.depth()
            ),
        });
    }

    Ok(units)
}

/// Block stack state after the first `prefix` units.
pub fn stack_after(units: &[TemplateUnit], prefix: usize) -> ControlBlockStack {
    let mut stack = ControlBlockStack::new();
    for unit in units.iter().take(prefix) {
        stack.replay(unit);
    }
    stack
}
