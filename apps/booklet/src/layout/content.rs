//! Content Model: the authoritative Document Order of a booklet.
//!
//! All layout is a projection of this order. Only the reorder engine (and initial load)
//! mutate it; the paginator reads it.
//!
//! # Group contiguity
//! Every question of group `G` must sit directly after the header of `G`, before the next
//! header. Keeping that true is the obligation of whoever calls `replace_order`; this type
//! only offers `group_is_contiguous` to check it.

use std::collections::HashSet;

use thiserror::Error;
use tracing::warn;

use crate::layout::numbering::MAX_OPTIONS;
use crate::models::{Block, BlockId, BlockRef, GroupId, Question};

#[derive(Debug, Error, PartialEq)]
pub enum ContentError {
    #[error("group {0} has more than one header")]
    DuplicateHeader(GroupId),

    #[error("question {0} appears more than once")]
    DuplicateQuestion(BlockId),

    #[error("question {question} has {count} options; at most {max} are supported")]
    TooManyOptions {
        question: BlockId,
        count: usize,
        max: usize,
    },
}

/// Ordered sequence of blocks.
#[derive(Debug, Clone, Default)]
pub struct DocumentOrder {
    blocks: Vec<Block>,
}

impl DocumentOrder {
    /// Validates a freshly loaded sequence.
    ///
    /// Rejects duplicate headers, duplicate question ids and option lists longer than the
    /// letter alphabet. Questions whose group has no header are repaired in place: they
    /// become ungrouped rather than being dropped.
    pub fn new(mut blocks: Vec<Block>) -> Result<Self, ContentError> {
        let mut headers = HashSet::new();
        let mut questions = HashSet::new();

        for block in &blocks {
            match block {
                Block::GroupHeader(h) => {
                    if !headers.insert(h.group_id) {
                        return Err(ContentError::DuplicateHeader(h.group_id));
                    }
                }
                Block::Item(q) => {
                    if !questions.insert(q.id) {
                        return Err(ContentError::DuplicateQuestion(q.id));
                    }
                    if q.options.len() > MAX_OPTIONS {
                        return Err(ContentError::TooManyOptions {
                            question: q.id,
                            count: q.options.len(),
                            max: MAX_OPTIONS,
                        });
                    }
                }
            }
        }

        for block in &mut blocks {
            if let Block::Item(q) = block {
                if let Some(group) = q.group_id.filter(|g| !headers.contains(g)) {
                    warn!(
                        question = q.id.0,
                        group = group.0,
                        "Question belongs to a group without a header; treating it as ungrouped"
                    );
                    q.group_id = None;
                }
            }
        }

        Ok(Self { blocks })
    }

    /// Snapshot of the current order.
    pub fn all(&self) -> &[Block] {
        &self.blocks
    }

    /// Atomically swaps the authoritative order.
    pub fn replace_order(&mut self, new_sequence: Vec<Block>) {
        self.blocks = new_sequence;
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn position(&self, block: BlockRef) -> Option<usize> {
        self.blocks.iter().position(|b| b.block_ref() == block)
    }

    pub fn get(&self, block: BlockRef) -> Option<&Block> {
        self.blocks.iter().find(|b| b.block_ref() == block)
    }

    pub fn question(&self, id: BlockId) -> Option<&Question> {
        self.get(BlockRef::Item(id)).and_then(Block::as_question)
    }

    pub fn question_mut(&mut self, id: BlockId) -> Option<&mut Question> {
        self.blocks.iter_mut().find_map(|b| match b {
            Block::Item(q) if q.id == id => Some(q),
            _ => None,
        })
    }

    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.blocks.iter().filter_map(Block::as_question)
    }

    /// Persisted question ids in document order (the payload of an order save).
    pub fn question_ids(&self) -> Vec<BlockId> {
        self.blocks.iter().filter_map(Block::id).collect()
    }

    /// Groups that have a header, in document order.
    #[cfg(test)]
    pub fn groups(&self) -> Vec<GroupId> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::GroupHeader(h) => Some(h.group_id),
                Block::Item(_) => None,
            })
            .collect()
    }

    /// True when all questions of `group` directly follow its header.
    pub fn group_is_contiguous(&self, group: GroupId) -> bool {
        let Some(header_at) = self.position(BlockRef::Header(group)) else {
            // No header: nothing can be out of place relative to it.
            return true;
        };
        let members: Vec<usize> = self
            .blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_member_of(group))
            .map(|(i, _)| i)
            .collect();

        members
            .iter()
            .enumerate()
            .all(|(offset, &index)| index == header_at + 1 + offset)
    }

    #[cfg(test)]
    pub fn all_groups_contiguous(&self) -> bool {
        self.groups().into_iter().all(|g| self.group_is_contiguous(g))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OptionId, OptionRef};

    fn make_option(id: i64) -> OptionRef {
        OptionRef {
            id: OptionId(id),
            is_correct: false,
            text: format!("option {id}"),
        }
    }

    fn make_question(id: i64, group: i64) -> Block {
        Block::question(BlockId(id), Some(GroupId(group)), "question", vec![], None)
    }

    #[test]
    fn test_orphaned_questions_become_ungrouped() {
        let order = DocumentOrder::new(vec![
            Block::header(GroupId(1), "Physics", None),
            make_question(10, 1),
            make_question(11, 2), // group 2 has no header
        ])
        .unwrap();

        assert_eq!(order.question(BlockId(10)).unwrap().group_id, Some(GroupId(1)));
        assert_eq!(order.question(BlockId(11)).unwrap().group_id, None);
        assert_eq!(order.len(), 3, "orphans are repaired, never dropped");
    }

    #[test]
    fn test_duplicate_header_rejected() {
        let err = DocumentOrder::new(vec![
            Block::header(GroupId(1), "Physics", None),
            Block::header(GroupId(1), "Physics again", None),
        ])
        .unwrap_err();
        assert_eq!(err, ContentError::DuplicateHeader(GroupId(1)));
    }

    #[test]
    fn test_duplicate_question_rejected() {
        let err = DocumentOrder::new(vec![make_question(5, 1), make_question(5, 1)]).unwrap_err();
        assert_eq!(err, ContentError::DuplicateQuestion(BlockId(5)));
    }

    #[test]
    fn test_seven_options_rejected() {
        let options = (1..=7).map(make_option).collect();
        let err = DocumentOrder::new(vec![Block::question(BlockId(1), None, "q", options, None)])
            .unwrap_err();
        assert!(matches!(err, ContentError::TooManyOptions { count: 7, max: 6, .. }));
    }

    #[test]
    fn test_six_options_accepted() {
        let options = (1..=6).map(make_option).collect();
        assert!(DocumentOrder::new(vec![Block::question(BlockId(1), None, "q", options, None)]).is_ok());
    }

    #[test]
    fn test_group_contiguity_detects_split_group() {
        let mut order = DocumentOrder::new(vec![
            Block::header(GroupId(1), "Physics", None),
            make_question(10, 1),
            Block::header(GroupId(2), "History", None),
            make_question(20, 2),
        ])
        .unwrap();
        assert!(order.all_groups_contiguous());

        let mut split = order.all().to_vec();
        split.swap(1, 3);
        order.replace_order(split);
        assert!(!order.group_is_contiguous(GroupId(1)));
        assert!(!order.group_is_contiguous(GroupId(2)));
    }

    #[test]
    fn test_question_ids_skip_headers() {
        let order = DocumentOrder::new(vec![
            Block::header(GroupId(1), "Physics", None),
            make_question(10, 1),
            make_question(11, 1),
        ])
        .unwrap();
        assert_eq!(order.question_ids(), vec![BlockId(10), BlockId(11)]);
    }
}
