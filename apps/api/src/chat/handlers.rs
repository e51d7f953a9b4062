//! Axum route handlers for the conversational API.
//!
//! The server keeps no sessions: the client sends its session with every turn
//! and receives the updated session back.

use axum::{extract::Multipart, extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::chat::{process_turn, ConversationSession, TurnInput, TurnOutcome};
use crate::errors::AppError;
use crate::routes::form::UploadForm;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub session: ConversationSession,
    pub outcome: TurnOutcome,
}

/// POST /api/v1/chat/sessions
pub async fn handle_new_session() -> (StatusCode, Json<ConversationSession>) {
    (StatusCode::CREATED, Json(ConversationSession::new()))
}

/// POST /api/v1/chat/reset
pub async fn handle_reset(Json(session): Json<ConversationSession>) -> Json<ConversationSession> {
    Json(session.reset())
}

/// POST /api/v1/chat/turn
///
/// Multipart fields: `session` (JSON), `message`, optional `template`, optional `resume` file.
pub async fn handle_turn(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<TurnResponse>, AppError> {
    let form = UploadForm::read(multipart).await?;

    let mut session: ConversationSession = form.json("session")?;
    let template = form.choice("template")?;
    let message = form.text("message");

    let input = TurnInput {
        message,
        resume: form.resume,
        template,
    };

    let outcome = process_turn(&state.pipeline, &mut session, input).await?;
    Ok(Json(TurnResponse { session, outcome }))
}
