//! Builds the initial Document Order from persisted records.
//!
//! The backend stores one flat list of question ids per test. Subjects are ordered by the
//! earliest persisted position of any of their questions (ties by name), questions inside a
//! subject by their own persisted position. Questions missing from the list go last.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::layout::content::{ContentError, DocumentOrder};
use crate::models::{Block, BlockId, GroupId, OptionId, OptionRef};

#[derive(Debug, Clone, Deserialize)]
pub struct SubjectRecord {
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub header_height: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptionRecord {
    pub id: OptionId,
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
    /// Persisted position within the question's list.
    #[serde(default)]
    pub order: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionRecord {
    pub id: BlockId,
    #[serde(default)]
    pub subject_id: Option<GroupId>,
    pub text: String,
    #[serde(default)]
    pub options: Vec<OptionRecord>,
    #[serde(default)]
    pub height: Option<f32>,
}

const UNLISTED: usize = usize::MAX;

/// Assembles headers and questions into the order they were last saved in.
///
/// Questions pointing at an unknown subject keep their subject id here and are repaired to
/// ungrouped by `DocumentOrder::new`.
pub fn assemble_document(
    subjects: &[SubjectRecord],
    questions: Vec<QuestionRecord>,
    persisted_order: &[BlockId],
) -> Result<DocumentOrder, ContentError> {
    let rank: HashMap<BlockId, usize> = persisted_order
        .iter()
        .enumerate()
        .map(|(i, id)| (*id, i))
        .collect();
    let rank_of = |id: BlockId| rank.get(&id).copied().unwrap_or(UNLISTED);
    let subjects_by_id: HashMap<GroupId, &SubjectRecord> =
        subjects.iter().map(|s| (s.id, s)).collect();

    // Bucket by known subject; questions of unknown or missing subjects share one bucket.
    let mut buckets: BTreeMap<Option<GroupId>, Vec<QuestionRecord>> = BTreeMap::new();
    for question in questions {
        let key = question
            .subject_id
            .filter(|id| subjects_by_id.contains_key(id));
        buckets.entry(key).or_default().push(question);
    }

    let mut groups: Vec<(usize, &str, Option<GroupId>, Vec<QuestionRecord>)> = buckets
        .into_iter()
        .map(|(key, mut members)| {
            members.sort_by_key(|q| rank_of(q.id));
            let first = members.iter().map(|q| rank_of(q.id)).min().unwrap_or(UNLISTED);
            let name = key
                .and_then(|id| subjects_by_id.get(&id))
                .map(|s| s.name.as_str())
                .unwrap_or("");
            (first, name, key, members)
        })
        .collect();
    groups.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    let mut blocks = Vec::new();
    for (_, _, key, members) in groups {
        if let Some(subject) = key.and_then(|id| subjects_by_id.get(&id)) {
            blocks.push(Block::header(subject.id, &subject.name, subject.header_height));
        }
        blocks.extend(members.into_iter().map(into_block));
    }

    DocumentOrder::new(blocks)
}

fn into_block(record: QuestionRecord) -> Block {
    let mut options = record.options;
    options.sort_by_key(|o| (o.order, o.id));
    let options = options
        .into_iter()
        .map(|o| OptionRef {
            id: o.id,
            is_correct: o.is_correct,
            text: o.text,
        })
        .collect();
    Block::question(record.id, record.subject_id, &record.text, options, record.height)
}
