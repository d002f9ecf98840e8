use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use agora_types::api::Claims;

use crate::auth::AppState;
use crate::{ApiError, convert, join_error, store_error};

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let caller = claims.sub.to_string();
    let limit = query.limit.min(200);

    let rows = tokio::task::spawn_blocking(move || db.db.list_notifications(&caller, limit))
        .await
        .map_err(join_error)?
        .map_err(store_error)?;

    let notifications: Vec<_> = rows.into_iter().map(convert::notification_from_row).collect();
    Ok(Json(notifications))
}

pub async fn unread_count(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let caller = claims.sub.to_string();

    let count = tokio::task::spawn_blocking(move || db.db.unread_notification_count(&caller))
        .await
        .map_err(join_error)?
        .map_err(store_error)?;

    Ok(Json(serde_json::json!({ "unreadCount": count })))
}

/// Mark one notification read. The response is the same whether the
/// notification existed, was already read, or belongs to someone else.
pub async fn mark_one_read(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let nid = notification_id.to_string();
    let caller = claims.sub.to_string();

    tokio::task::spawn_blocking(move || db.db.mark_notification_read(&nid, &caller))
        .await
        .map_err(join_error)?
        .map_err(store_error)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let caller = claims.sub.to_string();

    let updated = tokio::task::spawn_blocking(move || db.db.mark_all_notifications_read(&caller))
        .await
        .map_err(join_error)?
        .map_err(store_error)?;

    Ok(Json(serde_json::json!({ "updated": updated })))
}
