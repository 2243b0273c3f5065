//! Booklet editing session: owns the Document Order of one open booklet and keeps its
//! layout and labels in step with it.
//!
//! Every structural change re-runs the paginator from scratch and then the labelling
//! passes; nothing is patched incrementally. Saves are started after the in-memory state
//! has already changed and never roll it back.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::warn;

use crate::layout::compact::is_compact_grid_eligible;
use crate::layout::reorder::{move_option, DragSession};
use crate::layout::sheet::Sheet;
use crate::layout::{
    answer_key, paginate, relabel, reletter_options, AnswerKeyEntry, DocumentOrder, Labels,
    Layout, MoveEvent, OptionMoveEvent, ReorderError, ReorderOutcome, ReportedHeights,
    SheetBuilder,
};
use crate::models::{Block, BlockId, OptionId};
use crate::persistence::{OrderStore, SaveStatus, SaveTracker};

pub struct BookletSession {
    test_id: i64,
    order: DocumentOrder,
    layout: Layout,
    labels: Labels,
    builder: SheetBuilder,
    meter: ReportedHeights,
    saves: SaveTracker,
    touched: Instant,
}

/// Everything the rendering collaborator needs to draw the booklet.
#[derive(Debug, Clone, Serialize)]
pub struct BookletView {
    pub test_id: i64,
    pub blocks: Vec<Block>,
    pub sheets: Vec<Sheet>,
    pub labels: Labels,
    pub answer_key: Vec<AnswerKeyEntry>,
    /// Questions whose options fit the compact answer grid.
    pub compact_grid: Vec<BlockId>,
    pub save_status: SaveStatus,
}

impl BookletSession {
    pub fn open(test_id: i64, order: DocumentOrder, builder: SheetBuilder) -> Self {
        if order.is_empty() {
            warn!(test_id, "Opening a booklet with no blocks");
        }
        let meter = ReportedHeights::new(builder.config().safety_margin);
        let layout = paginate(&order, &meter, &builder);
        let labels = relabel(&layout, &order);
        Self {
            test_id,
            order,
            layout,
            labels,
            builder,
            meter,
            saves: SaveTracker::new(),
            touched: Instant::now(),
        }
    }

    pub fn test_id(&self) -> i64 {
        self.test_id
    }

    #[cfg(test)]
    pub fn order(&self) -> &DocumentOrder {
        &self.order
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[cfg(test)]
    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn save_status(&self) -> SaveStatus {
        self.saves.status()
    }

    /// Marks the session as in use, resetting its idle clock.
    pub fn touch(&mut self) {
        self.touched = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.touched.elapsed()
    }

    fn relayout(&mut self) {
        self.layout = paginate(&self.order, &self.meter, &self.builder);
        self.labels = relabel(&self.layout, &self.order);
    }

    /// Replays a completed drag as one gesture, then re-paginates and relabels.
    ///
    /// On error the order, layout and labels are left exactly as they were.
    pub fn apply_move(&mut self, event: MoveEvent) -> Result<ReorderOutcome, ReorderError> {
        let mut drag = DragSession::start(&self.order, event.block)?;
        drag.hover(event.new_index);
        let outcome = drag.finish(&mut self.order)?;
        self.relayout();
        Ok(outcome)
    }

    /// Moves an option within its question and reletters that list only.
    pub fn apply_option_move(
        &mut self,
        question_id: BlockId,
        event: OptionMoveEvent,
    ) -> Result<Vec<OptionId>, ReorderError> {
        let ids = move_option(&mut self.order, question_id, event)?;
        if let Some(question) = self.order.question(question_id) {
            self.labels.replace_options(reletter_options(question));
        }
        Ok(ids)
    }

    /// Saves the current question order in the background.
    pub fn persist_question_order(&self, store: Arc<dyn OrderStore>) -> JoinHandle<()> {
        let test_id = self.test_id;
        let ids = self.order.question_ids();
        self.saves.spawn("question order", async move {
            store.save_question_order(test_id, &ids).await
        })
    }

    /// Saves one question's option order in the background.
    pub fn persist_option_order(
        &self,
        store: Arc<dyn OrderStore>,
        question_id: BlockId,
        ids: Vec<OptionId>,
    ) -> JoinHandle<()> {
        self.saves.spawn("option order", async move {
            store.save_option_order(question_id, &ids).await
        })
    }

    pub fn view(&self) -> BookletView {
        BookletView {
            test_id: self.test_id,
            blocks: self.order.all().to_vec(),
            sheets: self.layout.sheets.clone(),
            labels: self.labels.clone(),
            answer_key: answer_key(&self.labels, &self.order),
            compact_grid: self
                .order
                .questions()
                .filter(|q| is_compact_grid_eligible(&q.options))
                .map(|q| q.id)
                .collect(),
            save_status: self.saves.status(),
        }
    }
}
