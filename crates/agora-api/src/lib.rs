pub mod auth;
pub mod conversations;
pub mod convert;
pub mod investors;
pub mod jobs;
pub mod listings;
pub mod middleware;
pub mod notifications;
pub mod streams;

use axum::Json;
use axum::http::StatusCode;
use serde_json::json;
use tracing::{error, warn};

use agora_db::Database;
use agora_types::models::NotificationKind;

/// Error shape shared by the marketplace handlers: a status plus a small
/// JSON body carrying a human-readable message.
pub(crate) type ApiError = (StatusCode, Json<serde_json::Value>);

pub(crate) fn bad_request(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

pub(crate) fn not_found() -> ApiError {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
}

pub(crate) fn conflict(message: &str) -> ApiError {
    (StatusCode::CONFLICT, Json(json!({ "error": message })))
}

pub(crate) fn internal_error() -> ApiError {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "internal error" })))
}

pub(crate) fn join_error(e: tokio::task::JoinError) -> ApiError {
    error!("spawn_blocking join error: {}", e);
    internal_error()
}

/// Store failures surface as generic 500s; the cause only goes to the log.
pub(crate) fn store_error(e: anyhow::Error) -> ApiError {
    error!("Store operation failed: {:#}", e);
    internal_error()
}

/// Record a notification for a triggering action. A failure here must not
/// fail the action itself, so it is only logged.
pub(crate) fn notify(
    db: &Database,
    user_id: &str,
    kind: NotificationKind,
    title: &str,
    body: Option<&str>,
    link: Option<&str>,
) {
    if let Err(e) = db.create_notification(user_id, kind, title, body, link) {
        warn!("Failed to record notification for {}: {:#}", user_id, e);
    }
}
