use axum::extract::State;
use axum::Json;

use crate::models::{AskRequest, AskResponse};
use crate::qa::QaPipeline;
use crate::state::AppState;

/// POST /ask — answer a question about the repository.
///
/// Always replies with a well-formed object: an empty or missing prompt
/// short-circuits to "Invalid input." before any search or model call,
/// and a failed model call degrades to an explanatory reply with the
/// detail in `diagnostic` instead of a raw error.
pub async fn ask(State(state): State<AppState>, Json(req): Json<AskRequest>) -> Json<AskResponse> {
    let prompt = req.prompt.unwrap_or_default();
    let question = prompt.trim();
    if question.is_empty() {
        return Json(AskResponse {
            reply: "Invalid input.".to_string(),
            diagnostic: None,
        });
    }

    let pipeline = QaPipeline::new(
        state.config.repo_dir(),
        state.config.search.clone(),
        state.model.clone(),
    );

    match pipeline.answer(question).await {
        Ok(answer) => Json(AskResponse {
            reply: answer.text,
            diagnostic: answer.diagnostic,
        }),
        Err(e) => {
            tracing::error!("pipeline failed: {e}");
            Json(AskResponse {
                reply: "The answering service is currently unavailable. Please try again later."
                    .to_string(),
                diagnostic: Some(e.to_string()),
            })
        }
    }
}
