//! Local HTTP surface for the popup.
//!
//! Each route corresponds to something the popup can do: a direct translate
//! request, the context-menu launch with pre-filled text, the history tab, the
//! language swap button and the review banner.

use crate::config::Config;
use crate::error::{StorageError, TranslateError};
use crate::history::HistoryEntryView;
use crate::session::{PopupState, Session, TranslationOutcome};
use crate::settings::LanguageSelection;
use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct LaunchParams {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub auto: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct TranslateRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslateStatus {
    Ok,
    Ignored,
    Error,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub status: TranslateStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,
    pub show_review_prompt: bool,
    pub state: PopupState,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub fn router(session: Arc<Session>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/state", get(state))
        .route("/launch", get(launch))
        .route("/translate", post(translate))
        .route("/languages/swap", post(swap_languages))
        .route("/history", get(history).delete(clear_history))
        .route("/review", post(review))
        .layer(TraceLayer::new_for_http())
        .with_state(session)
}

/// Bind to localhost on the configured port and serve until shutdown.
pub async fn serve(config: &Config, session: Arc<Session>) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Listening on http://{}", addr);
    axum::serve(listener, router(session))
        .await
        .context("HTTP server error")
}

async fn health() -> &'static str {
    "OK"
}

async fn state(State(session): State<Arc<Session>>) -> Json<PopupState> {
    Json(session.snapshot())
}

async fn launch(
    State(session): State<Arc<Session>>,
    Query(params): Query<LaunchParams>,
) -> Response {
    match session.launch(params.text.as_deref(), params.auto).await {
        Some(result) => translate_response(&session, result),
        None => Json(TranslateResponse {
            status: TranslateStatus::Ignored,
            message: None,
            translated_text: None,
            show_review_prompt: false,
            state: session.snapshot(),
        })
        .into_response(),
    }
}

async fn translate(
    State(session): State<Arc<Session>>,
    Json(request): Json<TranslateRequest>,
) -> Response {
    if request.source.is_some() || request.target.is_some() {
        let current = session.selection();
        session.select_languages(LanguageSelection::new(
            request.source.unwrap_or(current.source),
            request.target.unwrap_or(current.target),
        ));
    }
    if let Some(text) = request.text {
        session.set_source_text(text);
    }

    let result = session.translate_current().await;
    translate_response(&session, result)
}

fn translate_response(
    session: &Session,
    result: std::result::Result<TranslationOutcome, TranslateError>,
) -> Response {
    let (code, body) = match result {
        Ok(outcome) => (
            StatusCode::OK,
            TranslateResponse {
                status: TranslateStatus::Ok,
                message: None,
                translated_text: Some(outcome.translated_text),
                show_review_prompt: outcome.show_review_prompt,
                state: session.snapshot(),
            },
        ),
        Err(e) if e.is_silent() => (
            StatusCode::OK,
            TranslateResponse {
                status: TranslateStatus::Ignored,
                message: None,
                translated_text: None,
                show_review_prompt: false,
                state: session.snapshot(),
            },
        ),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            TranslateResponse {
                status: TranslateStatus::Error,
                message: e.user_message(),
                translated_text: None,
                show_review_prompt: false,
                state: session.snapshot(),
            },
        ),
    };
    (code, Json(body)).into_response()
}

async fn swap_languages(State(session): State<Arc<Session>>) -> Json<PopupState> {
    session.swap_languages();
    Json(session.snapshot())
}

async fn history(State(session): State<Arc<Session>>) -> Response {
    match session.history_view().await {
        Ok(entries) => Json::<Vec<HistoryEntryView>>(entries).into_response(),
        Err(e) => storage_error(e),
    }
}

async fn clear_history(State(session): State<Arc<Session>>) -> Response {
    match session.clear_history().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => storage_error(e),
    }
}

async fn review(State(session): State<Arc<Session>>) -> Response {
    match session.mark_reviewed().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => storage_error(e),
    }
}

fn storage_error(e: StorageError) -> Response {
    tracing::warn!("Storage error: {}", e);
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorBody {
            error: e.user_message().to_string(),
        }),
    )
        .into_response()
}
