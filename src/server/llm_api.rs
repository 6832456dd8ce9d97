//! Handlers that go through the LLM, plus health and the glossary.

use axum::{
    Json,
    body::Body,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::teaching::{
    Language, TeachingError,
    chat::{ChatRequest, Delivery},
    glossary,
    insights::{self, InsightsRequest},
    lesson::{self, LessonPlanRequest},
    letter::{self, ParentLetterRequest},
};

use super::AppState;
use super::error::{ApiError, ApiJson, MISSING_KEY};

fn require_credentials(state: &AppState) -> Result<(), ApiError> {
    if state.llm.has_credentials() {
        Ok(())
    } else {
        warn!(provider = state.llm.name(), "llm request refused: no API key");
        Err(ApiError::internal(MISSING_KEY))
    }
}

/// GET /api/health
pub(super) async fn health(State(state): State<AppState>) -> Response {
    Json(json!({
        "status": "ok",
        "name": &*state.name,
        "llm": state.llm.name(),
        "llmConfigured": state.llm.has_credentials(),
    }))
    .into_response()
}

/// POST /api/chat — plain-text stream by default, `{text}` when a language
/// is set or `stream` is false.
pub(super) async fn chat(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ChatRequest>,
) -> Result<Response, ApiError> {
    let input = req.validate()?;
    require_credentials(&state)?;
    let system = input.system_prompt(&state.prompts);

    match input.delivery {
        Delivery::Json => {
            let text = state
                .llm
                .chat(&input.history, Some(&system))
                .await
                .map_err(TeachingError::from)?;
            Ok(Json(json!({ "text": text })).into_response())
        }
        Delivery::Stream => {
            let tokens = state
                .llm
                .chat_stream(&input.history, Some(&system))
                .await
                .map_err(TeachingError::from)?;
            let tokens = tokens.inspect(|item| {
                if let Err(e) = item {
                    warn!("chat stream aborted: {e}");
                }
            });
            debug!(turns = input.history.len(), "chat stream started");
            Ok((
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                Body::from_stream(tokens),
            )
                .into_response())
        }
    }
}

/// POST /api/lesson-plan
pub(super) async fn lesson_plan(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LessonPlanRequest>,
) -> Result<Response, ApiError> {
    let input = req.validate()?;
    require_credentials(&state)?;
    let plan = lesson::generate(&state.llm, &state.prompts, &input).await?;
    Ok(Json(plan).into_response())
}

/// POST /api/elternbrief
pub(super) async fn parent_letter(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ParentLetterRequest>,
) -> Result<Response, ApiError> {
    let input = req.validate()?;
    require_credentials(&state)?;
    let letter = letter::generate(&state.llm, &state.prompts, &input).await?;
    Ok(Json(letter).into_response())
}

/// POST /api/insights
pub(super) async fn insights(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<InsightsRequest>,
) -> Result<Response, ApiError> {
    let data = req.validate()?;
    require_credentials(&state)?;
    let result = insights::analyze(&state.llm, &state.prompts, &data).await?;
    Ok(Json(result).into_response())
}

#[derive(Deserialize)]
pub(super) struct GlossaryQuery {
    lang: Option<String>,
}

/// GET /api/glossary?lang=tr — every term, translations limited to `lang`
/// when given.
pub(super) async fn glossary(Query(q): Query<GlossaryQuery>) -> Result<Response, ApiError> {
    let lang = match q.lang.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(code) => Some(
            Language::from_code(code)
                .ok_or_else(|| ApiError::bad_request("lang must be one of en, ar, tr, uk"))?,
        ),
    };
    Ok(Json(json!({
        "languages": glossary::languages(),
        "terms": glossary::lookup(lang),
    }))
    .into_response())
}
