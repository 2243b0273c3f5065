// Booklet layout engine.
// Implements: content model, measurement, sheet building, greedy two-column pagination,
// derived numbering/lettering, and drag-and-drop reordering with group regrouping.
// Everything here is synchronous and pure over the Document Order; persistence lives elsewhere.

pub mod assemble;
pub mod compact;
pub mod content;
pub mod measure;
pub mod numbering;
pub mod paginator;
pub mod reorder;
pub mod sheet;

// Re-export the public API consumed by the booklet session and handlers.
pub use assemble::{assemble_document, QuestionRecord, SubjectRecord};
pub use content::{ContentError, DocumentOrder};
pub use measure::ReportedHeights;
pub use numbering::{answer_key, relabel, reletter_options, AnswerKeyEntry, Labels};
pub use paginator::{paginate, Layout};
pub use reorder::{MoveEvent, OptionMoveEvent, ReorderError, ReorderOutcome};
pub use sheet::{default_sheet_config, MeasureFailurePolicy, SheetBuilder, SheetConfig, SheetHeader};
