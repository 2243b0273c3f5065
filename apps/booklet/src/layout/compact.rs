//! Compact answer grid: short option lists are printed as a grid instead of one per line.

use crate::models::OptionRef;

/// Longest option text (trimmed, in characters) that still fits a grid cell.
pub const MAX_CHARS_FOR_GRID: usize = 35;

/// True when every option is short enough for the compact grid. Empty lists never are.
pub fn is_compact_grid_eligible(options: &[OptionRef]) -> bool {
    !options.is_empty()
        && options
            .iter()
            .all(|o| o.text.trim().chars().count() <= MAX_CHARS_FOR_GRID)
}
