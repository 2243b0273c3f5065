//! Sheet Builder: allocates printed sheets, each with a header, two columns and a footer.
//!
//! Sheets are derived and ephemeral. The paginator builds a fresh set on every run, so
//! they never carry state of their own.

use serde::{Deserialize, Serialize};

use crate::layout::measure::SAFETY_MARGIN;
use crate::models::BlockRef;

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// What the paginator does when a block cannot be measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureFailurePolicy {
    /// Treat the block as overflowing; it ends up alone in a fresh column.
    Spill,
    /// Treat the block as fitting where it is. Risks clipping at the column bottom.
    Fits,
}

impl std::str::FromStr for MeasureFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spill" => Ok(Self::Spill),
            "fits" => Ok(Self::Fits),
            other => Err(format!("unknown measure failure policy '{other}'")),
        }
    }
}

/// Geometry shared by every sheet of a booklet.
///
/// Heights are in layout units reported by the rendering surface (CSS pixels in the
/// browser editor). Both columns of a sheet have the same capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    pub column_capacity: f32,
    /// Subtracted from capacity before every overflow check.
    pub safety_margin: f32,
    pub failure_policy: MeasureFailurePolicy,
}

/// A4 sheet, two columns of roughly 1000px each at print resolution.
pub fn default_sheet_config() -> SheetConfig {
    SheetConfig {
        column_capacity: 1000.0,
        safety_margin: SAFETY_MARGIN,
        failure_policy: MeasureFailurePolicy::Spill,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sheet types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSide {
    Left,
    Right,
}

/// One column of a sheet. Tracks the blocks placed in it and how much height they use.
#[derive(Debug, Clone, Serialize)]
pub struct Column {
    side: ColumnSide,
    capacity: f32,
    extent: f32,
    blocks: Vec<BlockRef>,
}

impl Column {
    pub fn new(side: ColumnSide, capacity: f32) -> Self {
        Self {
            side,
            capacity,
            extent: 0.0,
            blocks: Vec::new(),
        }
    }

    pub fn side(&self) -> ColumnSide {
        self.side
    }

    pub fn capacity(&self) -> f32 {
        self.capacity
    }

    /// Height currently occupied by placed blocks.
    pub fn extent(&self) -> f32 {
        self.extent
    }

    pub fn blocks(&self) -> &[BlockRef] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Commits a block at the bottom of the column.
    pub fn place(&mut self, block: BlockRef, height: f32) {
        self.blocks.push(block);
        self.extent += height;
    }

    /// Marks the column as full so nothing else is placed after its last block.
    pub fn seal(&mut self) {
        self.extent = self.extent.max(self.capacity);
    }
}

/// Running header printed at the top of every sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetHeader {
    #[serde(default)]
    pub left: String,
    #[serde(default)]
    pub center: String,
    #[serde(default)]
    pub right: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Sheet {
    /// 1-based page number, also printed in the footer.
    pub page_index: u32,
    pub header: SheetHeader,
    pub left: Column,
    pub right: Column,
    pub footer: String,
}

impl Sheet {
    pub fn column_mut(&mut self, side: ColumnSide) -> &mut Column {
        match side {
            ColumnSide::Left => &mut self.left,
            ColumnSide::Right => &mut self.right,
        }
    }

    /// Columns in reading order.
    pub fn columns(&self) -> [&Column; 2] {
        [&self.left, &self.right]
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Builder
// ────────────────────────────────────────────────────────────────────────────

/// Pure factory for empty sheets of one booklet.
#[derive(Debug, Clone)]
pub struct SheetBuilder {
    config: SheetConfig,
    header: SheetHeader,
}

impl SheetBuilder {
    pub fn new(config: SheetConfig, header: SheetHeader) -> Self {
        Self { config, header }
    }

    pub fn config(&self) -> &SheetConfig {
        &self.config
    }

    pub fn create_sheet(&self, page_index: u32) -> Sheet {
        Sheet {
            page_index,
            header: self.header.clone(),
            left: Column::new(ColumnSide::Left, self.config.column_capacity),
            right: Column::new(ColumnSide::Right, self.config.column_capacity),
            footer: page_index.to_string(),
        }
    }
}
