//! Measurement Adapter: decides whether a block still fits in a column.
//!
//! The real rendering surface owns the pixels; this side only sees the heights it reports.
//! A fixed safety margin is taken off every column's capacity so that a block landing
//! exactly on the bottom edge spills instead of being clipped. Some columns end up a
//! little under-filled as a result.

use thiserror::Error;

use crate::layout::sheet::Column;
use crate::models::{Block, BlockRef};

/// Default margin subtracted from column capacity, in layout units.
pub const SAFETY_MARGIN: f32 = 5.0;

#[derive(Debug, Error, PartialEq)]
pub enum MeasureError {
    #[error("{0} has not been measured")]
    Unmeasured(BlockRef),

    #[error("{block} reported an invalid height ({height})")]
    InvalidHeight { block: BlockRef, height: f32 },
}

/// Capability the paginator needs from a rendering surface.
///
/// Implementations must be free of side effects from the caller's point of view: measuring
/// a block never leaves it placed anywhere.
pub trait ColumnMeter {
    /// Height `block` occupies when rendered inside a column.
    fn measure(&self, block: &Block) -> Result<f32, MeasureError>;

    fn safety_margin(&self) -> f32 {
        SAFETY_MARGIN
    }

    /// True when adding `candidate_height` to `column` would cross its usable capacity.
    fn would_overflow(&self, column: &Column, candidate_height: f32) -> bool {
        column.extent() + candidate_height > column.capacity() - self.safety_margin()
    }
}

/// Meter backed by the heights the editor front-end attached to each block.
#[derive(Debug, Clone)]
pub struct ReportedHeights {
    safety_margin: f32,
}

impl ReportedHeights {
    pub fn new(safety_margin: f32) -> Self {
        Self { safety_margin }
    }
}

impl Default for ReportedHeights {
    fn default() -> Self {
        Self::new(SAFETY_MARGIN)
    }
}

impl ColumnMeter for ReportedHeights {
    fn measure(&self, block: &Block) -> Result<f32, MeasureError> {
        let height = block
            .height()
            .ok_or(MeasureError::Unmeasured(block.block_ref()))?;
        if !height.is_finite() || height < 0.0 {
            return Err(MeasureError::InvalidHeight {
                block: block.block_ref(),
                height,
            });
        }
        Ok(height)
    }

    fn safety_margin(&self) -> f32 {
        self.safety_margin
    }
}
