use std::fmt;

use serde::{Deserialize, Serialize};

/// Persisted identifier of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub i64);

/// Identifier of a group (subject). Shared by a header and all of its questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub i64);

/// Persisted identifier of an answer option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionId(pub i64);

/// Session-stable identity of a block.
///
/// Questions carry a persisted id. Headers are never persisted, so they are keyed by the
/// group they introduce (headers are unique per group).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum BlockRef {
    Header(GroupId),
    Item(BlockId),
}

/// One answer option of a question. Its letter is never stored; it is derived from position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionRef {
    pub id: OptionId,
    #[serde(default)]
    pub is_correct: bool,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupHeader {
    pub group_id: GroupId,
    pub title: String,
    /// Rendered height reported by the rendering surface, if it has been measured.
    #[serde(default)]
    pub height: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: BlockId,
    /// `None` for questions that belong to no group (e.g. their header was removed).
    #[serde(default)]
    pub group_id: Option<GroupId>,
    pub text: String,
    #[serde(default)]
    pub options: Vec<OptionRef>,
    #[serde(default)]
    pub height: Option<f32>,
}

/// A content unit of the booklet: either a group header or a question item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    GroupHeader(GroupHeader),
    Item(Question),
}

impl Block {
    pub fn header(group_id: GroupId, title: &str, height: Option<f32>) -> Self {
        Block::GroupHeader(GroupHeader {
            group_id,
            title: title.to_string(),
            height,
        })
    }

    pub fn question(
        id: BlockId,
        group_id: Option<GroupId>,
        text: &str,
        options: Vec<OptionRef>,
        height: Option<f32>,
    ) -> Self {
        Block::Item(Question {
            id,
            group_id,
            text: text.to_string(),
            options,
            height,
        })
    }

    /// Persisted id; only questions have one.
    pub fn id(&self) -> Option<BlockId> {
        match self {
            Block::GroupHeader(_) => None,
            Block::Item(q) => Some(q.id),
        }
    }

    pub fn group_id(&self) -> Option<GroupId> {
        match self {
            Block::GroupHeader(h) => Some(h.group_id),
            Block::Item(q) => q.group_id,
        }
    }

    pub fn block_ref(&self) -> BlockRef {
        match self {
            Block::GroupHeader(h) => BlockRef::Header(h.group_id),
            Block::Item(q) => BlockRef::Item(q.id),
        }
    }

    pub fn height(&self) -> Option<f32> {
        match self {
            Block::GroupHeader(h) => h.height,
            Block::Item(q) => q.height,
        }
    }

    pub fn as_question(&self) -> Option<&Question> {
        match self {
            Block::Item(q) => Some(q),
            Block::GroupHeader(_) => None,
        }
    }

    /// True for questions belonging to `group`.
    pub fn is_member_of(&self, group: GroupId) -> bool {
        matches!(self, Block::Item(q) if q.group_id == Some(group))
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockRef::Header(g) => write!(f, "header of group {g}"),
            BlockRef::Item(id) => write!(f, "question {id}"),
        }
    }
}
