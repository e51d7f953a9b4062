//! Axum route handlers for the single-shot analysis API.

use axum::{extract::Multipart, extract::State, Json};

use crate::analysis::prompts::PromptTemplate;
use crate::analysis::{AnalysisReport, AnalysisRequest};
use crate::errors::AppError;
use crate::routes::form::UploadForm;
use crate::state::AppState;

/// POST /api/v1/analyze
///
/// Multipart fields: `job_description`, `template` (`general_review` or `percentage_match`),
/// `strategy`, and the `resume` file.
/// Fails with MISSING_INPUT before any outbound call when no resume is attached.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisReport>, AppError> {
    let form = UploadForm::read(multipart).await?;

    let template: PromptTemplate = form.choice("template")?.unwrap_or_default();
    if template == PromptTemplate::Chat {
        return Err(AppError::Validation(
            "template must be general_review or percentage_match".to_string(),
        ));
    }
    let strategy = form.choice("strategy")?.unwrap_or_default();
    let job_description = form.text("job_description");

    let request = AnalysisRequest {
        template,
        job_description,
        resume: form.resume,
        strategy,
    };

    let report = state.pipeline.analyze(request).await?;
    Ok(Json(report))
}
