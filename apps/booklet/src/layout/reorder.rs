//! Reorder Engine: applies completed drag-and-drop moves to the Document Order.
//!
//! # Move kinds
//! - Plain item move: the block is taken out and reinserted at its new visual index.
//! - Group header move: after the header is reinserted, every question of its group is
//!   pulled out (keeping their mutual order) and spliced back directly after the header.
//!   A header dropped into the middle of another group lands after that group instead.
//!   Other groups keep their relative order and stay contiguous.
//! - Option move: reorders one question's option list only.
//!
//! The caller re-paginates, relabels and persists afterwards.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::layout::content::DocumentOrder;
use crate::models::{Block, BlockId, BlockRef, GroupId, OptionId};

#[derive(Debug, Error, PartialEq)]
pub enum ReorderError {
    #[error("{0} is not part of this booklet")]
    UnknownBlock(BlockRef),

    #[error("target index {index} is out of range for {len} blocks")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("question {0} is not part of this booklet")]
    UnknownQuestion(BlockId),

    #[error("option {option} does not belong to question {question}")]
    UnknownOption { question: BlockId, option: OptionId },
}

/// A completed move delivered by the drag-gesture collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct MoveEvent {
    pub block: BlockRef,
    /// Index in the flattened visual order (all columns of all sheets) after the drop.
    pub new_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct OptionMoveEvent {
    pub option_id: OptionId,
    pub new_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReorderOutcome {
    ItemMoved { from: usize, to: usize },
    GroupRegrouped { group_id: GroupId, members: usize },
}

// ────────────────────────────────────────────────────────────────────────────
// Drag session
// ────────────────────────────────────────────────────────────────────────────

/// State of one drag gesture, from pick-up to drop.
///
/// Lives only as long as the gesture; nothing is written to the Document Order before
/// `finish`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    block: BlockRef,
    origin: usize,
    target: usize,
}

impl DragSession {
    pub fn start(order: &DocumentOrder, block: BlockRef) -> Result<Self, ReorderError> {
        let origin = order
            .position(block)
            .ok_or(ReorderError::UnknownBlock(block))?;
        Ok(Self {
            block,
            origin,
            target: origin,
        })
    }

    /// Records the slot currently under the pointer.
    pub fn hover(&mut self, index: usize) {
        self.target = index;
    }

    #[cfg(test)]
    pub fn origin(&self) -> usize {
        self.origin
    }

    /// Drops the block at the last hovered slot and commits the new order.
    pub fn finish(self, order: &mut DocumentOrder) -> Result<ReorderOutcome, ReorderError> {
        apply_move(
            order,
            MoveEvent {
                block: self.block,
                new_index: self.target,
            },
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Block moves
// ────────────────────────────────────────────────────────────────────────────

/// Applies a block move and replaces the Document Order with the result.
pub fn apply_move(order: &mut DocumentOrder, event: MoveEvent) -> Result<ReorderOutcome, ReorderError> {
    let from = order
        .position(event.block)
        .ok_or(ReorderError::UnknownBlock(event.block))?;
    let len = order.len();
    if event.new_index >= len {
        return Err(ReorderError::IndexOutOfRange {
            index: event.new_index,
            len,
        });
    }

    // Flattened visual order as the drag left it.
    let mut visual = order.all().to_vec();
    let moved = visual.remove(from);
    visual.insert(event.new_index, moved);

    match event.block {
        BlockRef::Header(group_id) => {
            let members = visual.iter().filter(|b| b.is_member_of(group_id)).count();
            order.replace_order(regroup(visual, group_id));
            debug_assert!(order.group_is_contiguous(group_id));
            debug!(group = %group_id, members, from, to = event.new_index, "Group header moved");
            Ok(ReorderOutcome::GroupRegrouped { group_id, members })
        }
        BlockRef::Item(_) => {
            order.replace_order(visual);
            debug!(block = %event.block, from, to = event.new_index, "Item moved");
            Ok(ReorderOutcome::ItemMoved {
                from,
                to: event.new_index,
            })
        }
    }
}

/// Pulls every question of `group` out of `sequence` and splices them back directly after
/// the group's header, keeping their mutual order. Returns `sequence` unchanged when the
/// header is absent.
///
/// A header that lands inside another group's run is pushed past the end of that run, so
/// the other group stays contiguous too.
pub fn regroup(sequence: Vec<Block>, group: GroupId) -> Vec<Block> {
    let header = BlockRef::Header(group);
    if !sequence.iter().any(|b| b.block_ref() == header) {
        return sequence;
    }

    let (members, mut rest): (Vec<Block>, Vec<Block>) =
        sequence.into_iter().partition(|b| b.is_member_of(group));

    let Some(mut at) = rest.iter().position(|b| b.block_ref() == header) else {
        rest.extend(members);
        return rest;
    };

    if let Some(owner) = enclosing_group(&rest, at) {
        let moved = rest.remove(at);
        at += rest[at..]
            .iter()
            .take_while(|b| b.is_member_of(owner))
            .count();
        rest.insert(at, moved);
    }

    rest.splice(at + 1..at + 1, members);
    rest
}

/// Group whose run the slot at `at` interrupts, if any.
fn enclosing_group(sequence: &[Block], at: usize) -> Option<GroupId> {
    let previous = sequence.get(at.checked_sub(1)?)?;
    let next = sequence.get(at + 1)?;
    let owner = previous.group_id()?;
    next.is_member_of(owner).then_some(owner)
}

// ────────────────────────────────────────────────────────────────────────────
// Option moves
// ────────────────────────────────────────────────────────────────────────────

/// Moves one option inside its own question's list. Returns the new option id order.
pub fn move_option(
    order: &mut DocumentOrder,
    question_id: BlockId,
    event: OptionMoveEvent,
) -> Result<Vec<OptionId>, ReorderError> {
    let question = order
        .question_mut(question_id)
        .ok_or(ReorderError::UnknownQuestion(question_id))?;

    let from = question
        .options
        .iter()
        .position(|o| o.id == event.option_id)
        .ok_or(ReorderError::UnknownOption {
            question: question_id,
            option: event.option_id,
        })?;
    let len = question.options.len();
    if event.new_index >= len {
        return Err(ReorderError::IndexOutOfRange {
            index: event.new_index,
            len,
        });
    }

    let option = question.options.remove(from);
    question.options.insert(event.new_index, option);
    debug!(question = %question_id, option = %event.option_id, from, to = event.new_index, "Option moved");

    Ok(question.options.iter().map(|o| o.id).collect())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
