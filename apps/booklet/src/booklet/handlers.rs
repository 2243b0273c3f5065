use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::booklet::{BookletSession, BookletView};
use crate::errors::AppError;
use crate::layout::{
    assemble_document, MoveEvent, OptionMoveEvent, QuestionRecord, ReorderOutcome,
    SheetBuilder, SheetHeader, SubjectRecord,
};
use crate::models::{BlockId, OptionId};
use crate::persistence::SaveStatus;
use crate::state::{AppState, SharedSession};

#[derive(Deserialize)]
pub struct LoadBookletRequest {
    pub test_id: i64,
    #[serde(default)]
    pub header: SheetHeader,
    #[serde(default)]
    pub subjects: Vec<SubjectRecord>,
    pub questions: Vec<QuestionRecord>,
    /// Question ids in the order they were last saved.
    #[serde(default)]
    pub question_order: Vec<BlockId>,
}

#[derive(Serialize)]
pub struct BookletResponse {
    pub session_id: Uuid,
    pub booklet: BookletView,
}

#[derive(Serialize)]
pub struct MoveResponse {
    #[serde(flatten)]
    pub outcome: ReorderOutcome,
    pub booklet: BookletView,
}

#[derive(Serialize)]
pub struct OptionMoveResponse {
    pub question_id: BlockId,
    pub order: Vec<OptionId>,
    pub booklet: BookletView,
}

/// POST /api/v1/booklets
pub async fn handle_load_booklet(
    State(state): State<AppState>,
    Json(req): Json<LoadBookletRequest>,
) -> Result<(StatusCode, Json<BookletResponse>), AppError> {
    let order = assemble_document(&req.subjects, req.questions, &req.question_order)?;
    let builder = SheetBuilder::new(state.sheet_config.clone(), req.header);
    let session = BookletSession::open(req.test_id, order, builder);
    let booklet = session.view();
    let (test_id, sheets) = (session.test_id(), session.layout().sheet_count());

    let session_id = state.insert_session(session).await;
    info!(%session_id, test_id, sheets, "Booklet opened");

    Ok((
        StatusCode::CREATED,
        Json(BookletResponse {
            session_id,
            booklet,
        }),
    ))
}

/// GET /api/v1/booklets/:id
pub async fn handle_get_booklet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookletResponse>, AppError> {
    let session = find_session(&state, id).await?;
    let mut session = session.lock().await;
    session.touch();
    Ok(Json(BookletResponse {
        session_id: id,
        booklet: session.view(),
    }))
}

/// POST /api/v1/booklets/:id/moves
///
/// Applies the move, re-paginates and starts saving the new question order. The response
/// does not wait for the save.
pub async fn handle_move_block(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(event): Json<MoveEvent>,
) -> Result<Json<MoveResponse>, AppError> {
    let session = find_session(&state, id).await?;
    let mut session = session.lock().await;
    session.touch();

    let outcome = session.apply_move(event)?;
    session.persist_question_order(state.store.clone());

    Ok(Json(MoveResponse {
        outcome,
        booklet: session.view(),
    }))
}

/// POST /api/v1/booklets/:id/questions/:qid/option-moves
pub async fn handle_move_option(
    State(state): State<AppState>,
    Path((id, question_id)): Path<(Uuid, i64)>,
    Json(event): Json<OptionMoveEvent>,
) -> Result<Json<OptionMoveResponse>, AppError> {
    let question_id = BlockId(question_id);
    let session = find_session(&state, id).await?;
    let mut session = session.lock().await;
    session.touch();

    let order = session.apply_option_move(question_id, event)?;
    session.persist_option_order(state.store.clone(), question_id, order.clone());

    Ok(Json(OptionMoveResponse {
        question_id,
        order,
        booklet: session.view(),
    }))
}

/// GET /api/v1/booklets/:id/save-status
pub async fn handle_save_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SaveStatus>, AppError> {
    let session = find_session(&state, id).await?;
    let status = session.lock().await.save_status();
    Ok(Json(status))
}

/// DELETE /api/v1/booklets/:id
///
/// Closes the booklet. Saves already in flight still complete.
pub async fn handle_close_booklet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.remove_session(id).await {
        return Err(session_not_found(id));
    }
    info!(session_id = %id, "Booklet closed");
    Ok(StatusCode::NO_CONTENT)
}

async fn find_session(state: &AppState, id: Uuid) -> Result<SharedSession, AppError> {
    state
        .session(id)
        .await
        .ok_or_else(|| session_not_found(id))
}

fn session_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Booklet session {id} not found"))
}
