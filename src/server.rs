//! Stateless validation endpoints and email triggers.
//!
//! Every route is a pure request/response pair over the shared
//! [`AppConfig`]; no session state lives on the server. Duplicate-guess
//! and attempt accounting stay with the client, which supplies its own
//! history in the request body.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::answers::{self, GuessError};
use crate::config::{AppConfig, ConfigError};
use crate::email::{self, Mailer, ResendMailer};
use crate::wordbank::WordBank;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub wordbank: Arc<WordBank>,
    /// Absent when no API key is configured; email routes then report a
    /// configuration error per request.
    pub mailer: Option<Arc<dyn Mailer>>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, wordbank: Arc<WordBank>) -> Self {
        let mailer = config
            .resend_api_key
            .clone()
            .map(|key| Arc::new(ResendMailer::new(key)) as Arc<dyn Mailer>);
        Self {
            config,
            wordbank,
            mailer,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/check-riddle", post(check_riddle))
        .route("/api/check-theme", post(check_theme))
        .route("/api/check-guess", post(check_guess))
        .route("/api/notify-solved", post(notify_solved))
        .route("/api/daily-email", get(daily_email))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Validation endpoints listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}

#[derive(Debug, Deserialize)]
struct AnswerBody {
    #[serde(default)]
    answer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GuessBody {
    #[serde(default)]
    guess: Option<String>,
    #[serde(default, rename = "previousGuesses")]
    previous_guesses: Vec<String>,
}

async fn check_riddle(
    State(state): State<AppState>,
    body: Result<Json<AnswerBody>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return invalid_answer_request();
    };
    let answer = body.answer.unwrap_or_default();
    match answers::check_riddle(&state.config, &answer) {
        Ok(correct) => Json(json!({ "correct": correct })).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "correct": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn check_theme(
    State(state): State<AppState>,
    body: Result<Json<AnswerBody>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return invalid_answer_request();
    };
    let answer = body.answer.unwrap_or_default();
    let correct = answers::check_theme(&state.config, &answer);
    Json(json!({ "correct": correct })).into_response()
}

async fn check_guess(
    State(state): State<AppState>,
    body: Result<Json<GuessBody>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid request" })),
        )
            .into_response();
    };
    let guess = body.guess.unwrap_or_default();
    match answers::check_guess(&state.config, &state.wordbank, &guess, &body.previous_guesses) {
        Ok(feedbacks) => Json(json!({ "feedbacks": feedbacks })).into_response(),
        Err(e) => guess_error_response(&e),
    }
}

async fn notify_solved(State(state): State<AppState>) -> Response {
    let Some(mailer) = state.mailer.as_ref() else {
        return notify_error(&ConfigError::EmailSettingMissing("RESEND_API_KEY").to_string());
    };
    if state.config.success_recipients.is_empty() {
        return notify_error(
            &ConfigError::EmailSettingMissing("SUCCESS_EMAIL_RECIPIENTS").to_string(),
        );
    }
    match email::send_solved_notification(&state.config, mailer.as_ref(), Utc::now()).await {
        Ok(sent) => {
            log::info!("Solved notification delivered to {sent} recipients");
            Json(json!({ "ok": true })).into_response()
        }
        Err(e) => {
            log::error!("Solved notification failed: {e}");
            notify_error(&e.to_string())
        }
    }
}

async fn daily_email(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(secret) = state.config.cron_secret.as_deref() else {
        return server_error(&ConfigError::CronSecretUnset.to_string());
    };
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if !bearer_matches(secret, auth) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized" })),
        )
            .into_response();
    }
    if state.config.daily_recipients.is_empty() {
        log::error!("No daily recipients configured (DAILY_EMAIL_RECIPIENTS empty or invalid)");
        return server_error("No recipients configured");
    }
    let Some(mailer) = state.mailer.as_ref() else {
        return server_error(&ConfigError::EmailSettingMissing("RESEND_API_KEY").to_string());
    };
    match email::send_daily_broadcast(&state.config, mailer.as_ref()).await {
        Ok(sent) => Json(json!({ "success": true, "sent": sent })).into_response(),
        Err(e) => {
            log::error!("Daily broadcast error: {e}");
            server_error("Failed to send daily emails")
        }
    }
}

fn bearer_matches(secret: &str, header_value: Option<&str>) -> bool {
    header_value.is_some_and(|h| h == format!("Bearer {secret}"))
}

fn guess_error_response(err: &GuessError) -> Response {
    let status = match err {
        GuessError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

fn invalid_answer_request() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "correct": false, "error": "Invalid request" })),
    )
        .into_response()
}

fn notify_error(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "ok": false, "error": message })),
    )
        .into_response()
}

fn server_error(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
        .into_response()
}
