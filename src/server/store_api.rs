//! Handlers over the persisted stores: classes, notes, moods, chat history,
//! the current user, and share links.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::store::auth::Role;
use crate::store::chat::ChatSessionUpdate;
use crate::store::classes::{Mood, StudentLearning, TeacherClass, TopicStatus};
use crate::teaching::share::{self, SharedClassPayload};

use super::AppState;
use super::error::{ApiError, ApiJson};

type ApiResult = Result<Response, ApiError>;

/// Trimmed, non-empty text or a 400 naming the field.
fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("{field} is required")))
}

// ── Share links ───────────────────────────────────────────────────────────────

/// POST /api/share/encode
pub(super) async fn share_encode(ApiJson(payload): ApiJson<SharedClassPayload>) -> ApiResult {
    if payload.class_name.trim().is_empty() {
        return Err(ApiError::bad_request("className is required"));
    }
    let data = share::encode(&payload).map_err(|e| ApiError::internal(e.to_string()))?;
    let path = share::learn_path(&data);
    Ok(Json(json!({ "data": data, "path": path })).into_response())
}

#[derive(Deserialize)]
pub(super) struct ShareQuery {
    data: Option<String>,
}

/// GET /api/share/decode?data=
pub(super) async fn share_decode(Query(q): Query<ShareQuery>) -> ApiResult {
    let data = required(q.data, "data")?;
    let payload = share::decode(&data).ok_or_else(|| ApiError::bad_request("invalid share data"))?;
    Ok(Json(payload).into_response())
}

// ── Auth ──────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct LoginRequest {
    role: Role,
    #[serde(default)]
    name: String,
}

/// GET /api/auth
pub(super) async fn current_user(State(state): State<AppState>) -> Response {
    Json(json!({ "user": state.stores.auth.user().await })).into_response()
}

/// POST /api/auth/login
pub(super) async fn login(State(state): State<AppState>, ApiJson(req): ApiJson<LoginRequest>) -> ApiResult {
    match state.stores.auth.login(req.role, &req.name).await? {
        Some(user) => Ok(Json(json!({ "user": user })).into_response()),
        None => Err(ApiError::bad_request("name is required")),
    }
}

/// POST /api/auth/logout
pub(super) async fn logout(State(state): State<AppState>) -> ApiResult {
    state.stores.auth.logout().await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

// ── Classes ───────────────────────────────────────────────────────────────────

/// GET /api/classes
pub(super) async fn classes(State(state): State<AppState>) -> Response {
    Json(state.stores.classes.state().await).into_response()
}

/// PUT /api/classes/teacher
pub(super) async fn set_teacher_classes(
    State(state): State<AppState>,
    ApiJson(classes): ApiJson<Vec<TeacherClass>>,
) -> ApiResult {
    state.stores.classes.set_teacher_classes(classes).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// PUT /api/classes/learning — `null` clears it.
pub(super) async fn set_student_learning(
    State(state): State<AppState>,
    ApiJson(learning): ApiJson<Option<StudentLearning>>,
) -> ApiResult {
    state.stores.classes.set_student_learning(learning).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

#[derive(Deserialize)]
pub(super) struct TopicRequest {
    topic: Option<String>,
}

/// POST /api/classes/learning/topics
pub(super) async fn add_own_topic(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TopicRequest>,
) -> ApiResult {
    let topic = required(req.topic, "topic")?;
    let learning = state.stores.classes.add_own_topic(&topic).await?;
    Ok(Json(learning).into_response())
}

#[derive(Deserialize)]
pub(super) struct TopicStatusRequest {
    topic: String,
    status: TopicStatus,
}

/// PUT /api/classes/learning/status
pub(super) async fn set_topic_status(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TopicStatusRequest>,
) -> ApiResult {
    state
        .stores
        .classes
        .set_topic_status(&req.topic, req.status)
        .await?
        .map(|learning| Json(learning).into_response())
        .ok_or_else(|| ApiError::not_found("topic not found"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct StudentClassRequest {
    name: Option<String>,
    class_id: Option<String>,
}

/// PUT /api/classes/student
pub(super) async fn set_student_class(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<StudentClassRequest>,
) -> ApiResult {
    let name = required(req.name, "name")?;
    state.stores.classes.set_student_class(&name, req.class_id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// POST /api/classes/lessons/{id}/toggle
pub(super) async fn toggle_lesson(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let completed = state.stores.classes.toggle_lesson_completed(&id).await?;
    Ok(Json(json!({ "id": id, "completed": completed })).into_response())
}

// ── Notes ─────────────────────────────────────────────────────────────────────

/// POST /api/notes
pub(super) async fn add_note(State(state): State<AppState>, ApiJson(req): ApiJson<TopicRequest>) -> ApiResult {
    let topic = required(req.topic, "topic")?;
    let note = state.stores.classes.add_note(&topic).await?;
    Ok((StatusCode::CREATED, Json(note)).into_response())
}

#[derive(Deserialize)]
pub(super) struct NoteUpdate {
    #[serde(default)]
    content: String,
}

/// PUT /api/notes/{id}
pub(super) async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<NoteUpdate>,
) -> ApiResult {
    state
        .stores
        .classes
        .update_note(&id, &req.content)
        .await?
        .map(|note| Json(note).into_response())
        .ok_or_else(|| ApiError::not_found("note not found"))
}

/// DELETE /api/notes/{id}
pub(super) async fn delete_note(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    if state.stores.classes.delete_note(&id).await? {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Err(ApiError::not_found("note not found"))
    }
}

// ── Focus sessions & moods ────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct StudySessionRequest {
    topic: Option<String>,
    duration_minutes: Option<Value>,
}

/// POST /api/study-sessions
pub(super) async fn add_study_session(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<StudySessionRequest>,
) -> ApiResult {
    let topic = required(req.topic, "topic")?;
    let minutes = req
        .duration_minutes
        .as_ref()
        .and_then(Value::as_u64)
        .filter(|m| *m > 0)
        .and_then(|m| u32::try_from(m).ok())
        .ok_or_else(|| ApiError::bad_request("durationMinutes must be a positive whole number"))?;
    let session = state.stores.classes.add_study_session(&topic, minutes).await?;
    Ok((StatusCode::CREATED, Json(session)).into_response())
}

#[derive(Deserialize)]
pub(super) struct MoodRequest {
    mood: Option<Value>,
}

/// POST /api/moods
pub(super) async fn add_mood(State(state): State<AppState>, ApiJson(req): ApiJson<MoodRequest>) -> ApiResult {
    let mood = req
        .mood
        .as_ref()
        .and_then(Value::as_u64)
        .and_then(|m| u8::try_from(m).ok())
        .and_then(Mood::new)
        .ok_or_else(|| ApiError::bad_request("mood must be 1–5"))?;
    let entry = state.stores.classes.add_mood(mood).await?;
    Ok((StatusCode::CREATED, Json(entry)).into_response())
}

// ── Chat history ──────────────────────────────────────────────────────────────

/// GET /api/chat-sessions
pub(super) async fn chat_sessions(State(state): State<AppState>) -> Response {
    Json(json!({ "sessions": state.stores.chat.sessions().await })).into_response()
}

/// PUT /api/chat-sessions
pub(super) async fn upsert_chat_session(
    State(state): State<AppState>,
    ApiJson(session): ApiJson<ChatSessionUpdate>,
) -> ApiResult {
    if session.id.trim().is_empty() {
        return Err(ApiError::bad_request("id is required"));
    }
    let stored = state.stores.chat.upsert_session(session).await?;
    Ok(Json(stored).into_response())
}

/// DELETE /api/chat-sessions
pub(super) async fn clear_chat_sessions(State(state): State<AppState>) -> ApiResult {
    state.stores.chat.clear_sessions().await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// DELETE /api/chat-sessions/{id}
pub(super) async fn delete_chat_session(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    if state.stores.chat.delete_session(&id).await? {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Err(ApiError::not_found("chat session not found"))
    }
}
