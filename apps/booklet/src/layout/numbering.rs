//! Renumbering and relettering: derived labels recomputed after every layout.
//!
//! Question numbers are global and continuous across the booklet (never reset per group)
//! and follow reading order of the final layout. Option letters are positional within each
//! question's own list. Neither is ever stored on the content model, so both passes are
//! idempotent.

use serde::Serialize;

use crate::layout::content::DocumentOrder;
use crate::layout::paginator::Layout;
use crate::models::{BlockId, BlockRef, OptionId, Question};

/// Letters available for answer options.
pub const OPTION_LETTERS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];
pub const MAX_OPTIONS: usize = OPTION_LETTERS.len();

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionLabel {
    pub question_id: BlockId,
    pub number: u32,
    /// Printed form, e.g. `"7."`.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionLabel {
    pub option_id: OptionId,
    /// Printed form, e.g. `"B)"`.
    pub letter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionListLabels {
    pub question_id: BlockId,
    pub options: Vec<OptionLabel>,
}

/// All derived labels of one layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Labels {
    pub questions: Vec<QuestionLabel>,
    pub options: Vec<OptionListLabels>,
}

impl Labels {
    #[cfg(test)]
    pub fn number_of(&self, question: BlockId) -> Option<u32> {
        self.questions
            .iter()
            .find(|l| l.question_id == question)
            .map(|l| l.number)
    }

    #[cfg(test)]
    pub fn letters_of(&self, question: BlockId) -> Option<&OptionListLabels> {
        self.options.iter().find(|l| l.question_id == question)
    }

    /// Swaps in freshly computed letters for one question's list.
    pub fn replace_options(&mut self, list: OptionListLabels) {
        match self
            .options
            .iter_mut()
            .find(|l| l.question_id == list.question_id)
        {
            Some(existing) => *existing = list,
            None => self.options.push(list),
        }
    }
}

/// Printed letter for the option at `index` (0-based), or `None` past the alphabet.
pub fn option_letter(index: usize) -> Option<String> {
    OPTION_LETTERS.get(index).map(|c| format!("{c})"))
}

/// Numbers every question in layout reading order, starting at 1.
pub fn renumber_questions(layout: &Layout) -> Vec<QuestionLabel> {
    layout
        .traversal()
        .filter_map(|p| match p.block {
            BlockRef::Item(id) => Some(id),
            BlockRef::Header(_) => None,
        })
        .zip(1u32..)
        .map(|(question_id, number)| QuestionLabel {
            question_id,
            number,
            label: format!("{number}."),
        })
        .collect()
}

/// Letters one question's options in their current list order.
pub fn reletter_options(question: &Question) -> OptionListLabels {
    OptionListLabels {
        question_id: question.id,
        options: question
            .options
            .iter()
            .enumerate()
            .filter_map(|(i, option)| {
                option_letter(i).map(|letter| OptionLabel {
                    option_id: option.id,
                    letter,
                })
            })
            .collect(),
    }
}

/// Runs both passes over a finished layout.
pub fn relabel(layout: &Layout, order: &DocumentOrder) -> Labels {
    Labels {
        questions: renumber_questions(layout),
        options: order.questions().map(reletter_options).collect(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Answer key
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerKeyEntry {
    pub number: u32,
    pub question_id: BlockId,
    pub correct: Vec<String>,
}

/// Correct letters per question, in numbering order.
pub fn answer_key(labels: &Labels, order: &DocumentOrder) -> Vec<AnswerKeyEntry> {
    labels
        .questions
        .iter()
        .filter_map(|label| {
            let question = order.question(label.question_id)?;
            let correct = question
                .options
                .iter()
                .enumerate()
                .filter(|(_, option)| option.is_correct)
                .filter_map(|(i, _)| option_letter(i))
                .collect();
            Some(AnswerKeyEntry {
                number: label.number,
                question_id: label.question_id,
                correct,
            })
        })
        .collect()
}
