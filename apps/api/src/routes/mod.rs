pub mod form;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::chat::handlers as chat;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        // Single-shot analysis
        .route("/api/v1/analyze", post(analysis::handle_analyze))
        // Conversation
        .route("/api/v1/chat/sessions", post(chat::handle_new_session))
        .route("/api/v1/chat/turn", post(chat::handle_turn))
        .route("/api/v1/chat/reset", post(chat::handle_reset))
        .layer(body_limit)
        .with_state(state)
}
