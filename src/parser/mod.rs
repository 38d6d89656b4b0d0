mod actions;
mod preprocessor;
mod types;

pub use actions::{scan_actions, trim_action_body, Action, ActionScan};
pub use preprocessor::{decompose, split_physical_lines, stack_after};
pub use crate::error::MismatchedBlockError;
pub use types::{
    BlockType, ControlBlockStack, ControlEvent, ControlKind, DecomposeMode, OpenBlock,
    TemplateUnit, UnitKind,
};
