//! Conversation Orchestrator: repeats the analysis pipeline once per user turn.
//!
//! The session is an explicit value owned by the caller. It moves through
//! `Idle → Processing → Idle` per turn, or to `Ended` on the stop sentinel.
//! The transcript is append-only; insertion order is display order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::prompts::PromptTemplate;
use crate::analysis::Pipeline;
use crate::document::{ExtractionStrategy, ResumeDocument};
use crate::errors::AppError;
use crate::videos::VideoLookup;

pub mod handlers;

/// Case-insensitive input that ends the session.
pub const STOP_SENTINEL: &str = "stop";

pub const EXIT_MESSAGE: &str =
    "Session ended. Start a new session to analyze another resume.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Processing,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSession {
    pub id: Uuid,
    #[serde(default)]
    pub state: SessionState,
    #[serde(default)]
    pub turns: Vec<ConversationTurn>,
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Idle,
            turns: Vec::new(),
        }
    }

    /// Full reset: a fresh, empty session. The only way out of `Ended`.
    pub fn reset(&self) -> Self {
        Self::new()
    }

    fn push(&mut self, role: Role, text: String) {
        self.turns.push(ConversationTurn {
            role,
            text,
            at: Utc::now(),
        });
    }
}

/// One user turn: a message, optionally a resume, optionally a template override.
#[derive(Debug, Clone, Default)]
pub struct TurnInput {
    pub message: String,
    pub resume: Option<ResumeDocument>,
    pub template: Option<PromptTemplate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// The assistant reply was appended to the transcript.
    Replied { reply: String, videos: VideoLookup },
    /// The stop sentinel was received; the exit message was appended.
    Ended,
    /// The session had already ended; nothing was processed.
    Ignored,
}

pub fn is_stop(message: &str) -> bool {
    message.trim().eq_ignore_ascii_case(STOP_SENTINEL)
}

/// Processes one turn against `session`.
///
/// On failure the transcript is left unchanged and the session returns to `Idle`.
pub async fn process_turn(
    pipeline: &Pipeline,
    session: &mut ConversationSession,
    input: TurnInput,
) -> Result<TurnOutcome, AppError> {
    match session.state {
        SessionState::Ended => return Ok(TurnOutcome::Ignored),
        SessionState::Processing => {
            return Err(AppError::Validation(
                "A turn is already being processed for this session".to_string(),
            ))
        }
        SessionState::Idle => {}
    }

    if is_stop(&input.message) {
        session.push(Role::Assistant, EXIT_MESSAGE.to_string());
        session.state = SessionState::Ended;
        info!("Chat session {} ended by user", session.id);
        return Ok(TurnOutcome::Ended);
    }

    let template = input.template.unwrap_or(PromptTemplate::Chat);
    if template.requires_resume() {
        ResumeDocument::require(input.resume.clone())?;
    }
    if input.message.trim().is_empty() && input.resume.is_none() {
        return Err(AppError::Validation("Message cannot be empty".to_string()));
    }

    session.state = SessionState::Processing;
    let result = run_pipeline(pipeline, template, &input).await;
    session.state = SessionState::Idle;

    let (reply, videos) = match result {
        Ok(evaluation) => (evaluation.reply, evaluation.videos),
        Err(e) => {
            warn!("Chat turn failed for session {}: {e}", session.id);
            return Err(e);
        }
    };

    session.push(Role::User, input.message);
    session.push(Role::Assistant, format_reply(&reply, &videos));

    Ok(TurnOutcome::Replied { reply, videos })
}

async fn run_pipeline(
    pipeline: &Pipeline,
    template: PromptTemplate,
    input: &TurnInput,
) -> Result<crate::analysis::Evaluation, AppError> {
    let content = match &input.resume {
        Some(resume) => Some(pipeline.extract(resume, ExtractionStrategy::Text).await?),
        None => None,
    };
    pipeline
        .evaluate(template, &input.message, content.as_ref())
        .await
}

/// Model text followed by a markdown list of video links, if any.
pub fn format_reply(reply: &str, videos: &VideoLookup) -> String {
    let videos = videos.videos();
    if videos.is_empty() {
        return reply.to_string();
    }

    let links: Vec<String> = videos
        .iter()
        .map(|v| format!("- [{}]({})", v.title, v.watch_url))
        .collect();
    format!("{reply}\n\n**Recommended videos**\n{}", links.join("\n"))
}
