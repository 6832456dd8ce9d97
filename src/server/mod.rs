//! Axum HTTP server: JSON API under `/api/`.
//!
//! ```text
//! GET    /api/health
//! POST   /api/chat                         text stream or {text}
//! POST   /api/lesson-plan
//! POST   /api/elternbrief
//! POST   /api/insights
//! GET    /api/glossary?lang=
//! POST   /api/share/encode
//! GET    /api/share/decode?data=
//! GET    /api/auth
//! POST   /api/auth/login
//! POST   /api/auth/logout
//! GET    /api/classes
//! PUT    /api/classes/teacher
//! PUT    /api/classes/learning
//! POST   /api/classes/learning/topics
//! PUT    /api/classes/learning/status
//! PUT    /api/classes/student
//! POST   /api/classes/lessons/{id}/toggle
//! POST   /api/notes
//! PUT    /api/notes/{id}
//! DELETE /api/notes/{id}
//! POST   /api/study-sessions
//! POST   /api/moods
//! GET    /api/chat-sessions
//! PUT    /api/chat-sessions
//! DELETE /api/chat-sessions
//! DELETE /api/chat-sessions/{id}
//! ```

mod error;
mod llm_api;
mod store_api;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::AppError;
use crate::llm::LlmProvider;
use crate::store::Stores;
use crate::teaching::Prompts;

pub use error::{ApiError, ApiJson};

/// Router state injected into every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub name: Arc<str>,
    pub llm: Arc<LlmProvider>,
    pub prompts: Arc<Prompts>,
    pub stores: Arc<Stores>,
}

impl AppState {
    pub fn new(name: &str, llm: LlmProvider, prompts: Prompts, stores: Stores) -> Self {
        Self {
            name: Arc::from(name),
            llm: Arc::new(llm),
            prompts: Arc::new(prompts),
            stores: Arc::new(stores),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health",                       get(llm_api::health))
        .route("/api/chat",                         post(llm_api::chat))
        .route("/api/lesson-plan",                  post(llm_api::lesson_plan))
        .route("/api/elternbrief",                  post(llm_api::parent_letter))
        .route("/api/insights",                     post(llm_api::insights))
        .route("/api/glossary",                     get(llm_api::glossary))
        .route("/api/share/encode",                 post(store_api::share_encode))
        .route("/api/share/decode",                 get(store_api::share_decode))
        .route("/api/auth",                         get(store_api::current_user))
        .route("/api/auth/login",                   post(store_api::login))
        .route("/api/auth/logout",                  post(store_api::logout))
        .route("/api/classes",                      get(store_api::classes))
        .route("/api/classes/teacher",              put(store_api::set_teacher_classes))
        .route("/api/classes/learning",             put(store_api::set_student_learning))
        .route("/api/classes/learning/topics",      post(store_api::add_own_topic))
        .route("/api/classes/learning/status",      put(store_api::set_topic_status))
        .route("/api/classes/student",              put(store_api::set_student_class))
        .route("/api/classes/lessons/{id}/toggle",  post(store_api::toggle_lesson))
        .route("/api/notes",                        post(store_api::add_note))
        .route("/api/notes/{id}",                   put(store_api::update_note).delete(store_api::delete_note))
        .route("/api/study-sessions",               post(store_api::add_study_session))
        .route("/api/moods",                        post(store_api::add_mood))
        .route(
            "/api/chat-sessions",
            get(store_api::chat_sessions)
                .put(store_api::upsert_chat_session)
                .delete(store_api::clear_chat_sessions),
        )
        .route("/api/chat-sessions/{id}",           delete(store_api::delete_chat_session))
        .with_state(state)
}

/// Serve until `shutdown` is cancelled.
pub async fn run(bind_addr: &str, state: AppState, shutdown: CancellationToken) -> Result<(), AppError> {
    let router = build_router(state);

    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| AppError::Server(format!("bind failed on {bind_addr}: {e}")))?;

    let local = listener.local_addr().map(|a| a.to_string()).unwrap_or_else(|_| bind_addr.to_string());
    info!(bind_addr = %local, "http server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Server(format!("server error: {e}")))?;

    info!("http server shut down");
    Ok(())
}
