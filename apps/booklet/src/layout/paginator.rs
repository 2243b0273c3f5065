//! Paginator: greedy first-fit packing of the Document Order into two-column sheets.
//!
//! # Algorithm
//! Single pass over the blocks in order. Each block is tried at the bottom of the current
//! column. On overflow it moves to the right column, or to the left column of a new
//! sheet, and is tried again. A block that overflows even an empty column is placed there
//! anyway: it is visibly too tall, but it is never lost.
//!
//! Committed blocks are never moved again. There is no look-ahead or rebalancing, so the
//! result depends only on the order and the measurements.

use serde::Serialize;
use tracing::{debug, warn};

use crate::layout::content::DocumentOrder;
use crate::layout::measure::ColumnMeter;
use crate::layout::sheet::{ColumnSide, MeasureFailurePolicy, Sheet, SheetBuilder};
use crate::models::BlockRef;

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

/// Where a block ended up: sheet, column side and row within the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub block: BlockRef,
    /// 1-based, matching the printed page number.
    pub sheet_index: u32,
    pub side: ColumnSide,
    pub position: usize,
}

/// Result of one pagination run. Recomputed from scratch every time.
#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub sheets: Vec<Sheet>,
}

impl Layout {
    /// Placements in reading order: sheet ascending, left before right, top to bottom.
    pub fn traversal(&self) -> impl Iterator<Item = Placement> + '_ {
        self.sheets.iter().flat_map(|sheet| {
            sheet.columns().into_iter().flat_map(move |column| {
                column
                    .blocks()
                    .iter()
                    .enumerate()
                    .map(move |(position, &block)| Placement {
                        block,
                        sheet_index: sheet.page_index,
                        side: column.side(),
                        position,
                    })
            })
        })
    }

    #[cfg(test)]
    pub fn placement_of(&self, block: BlockRef) -> Option<Placement> {
        self.traversal().find(|p| p.block == block)
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Core algorithm
// ────────────────────────────────────────────────────────────────────────────

/// Lays out `order` into sheets. Every block is placed exactly once.
///
/// An empty order still yields one sheet with two empty columns.
pub fn paginate(order: &DocumentOrder, meter: &impl ColumnMeter, builder: &SheetBuilder) -> Layout {
    let policy = builder.config().failure_policy;
    let mut finished: Vec<Sheet> = Vec::new();
    let mut current = builder.create_sheet(1);
    let mut side = ColumnSide::Left;

    for block in order.all() {
        let block_ref = block.block_ref();
        let height = match meter.measure(block) {
            Ok(h) => Some(h),
            Err(e) => {
                warn!(block = %block_ref, ?policy, "Measurement failed: {e}");
                None
            }
        };

        loop {
            let page = current.page_index;
            let column = current.column_mut(side);
            let fits = match height {
                Some(h) => !meter.would_overflow(column, h),
                None => policy == MeasureFailurePolicy::Fits,
            };

            if fits || column.is_empty() {
                if !fits {
                    warn!(
                        block = %block_ref,
                        sheet = page,
                        ?side,
                        "Block does not fit an empty column; placing it anyway"
                    );
                }
                column.place(block_ref, height.unwrap_or(0.0));
                if height.is_none() && policy == MeasureFailurePolicy::Spill {
                    column.seal();
                }
                break;
            }

            // Overflow: retract and retry the same block in the next column.
            match side {
                ColumnSide::Left => side = ColumnSide::Right,
                ColumnSide::Right => {
                    let next = builder.create_sheet(current.page_index + 1);
                    finished.push(std::mem::replace(&mut current, next));
                    side = ColumnSide::Left;
                }
            }
        }
    }

    finished.push(current);
    debug!(
        blocks = order.len(),
        sheets = finished.len(),
        "Pagination complete"
    );

    Layout { sheets: finished }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
