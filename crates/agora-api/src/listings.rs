use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use agora_types::api::{Claims, CreateListingRequest};
use agora_types::codes::parse_category_slug;
use agora_types::models::NotificationKind;

use crate::auth::AppState;
use crate::{ApiError, bad_request, convert, join_error, not_found, notify, store_error};

pub async fn create_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateListingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.trim().is_empty() {
        return Err(bad_request("listing title must not be empty"));
    }
    if let Err(e) = parse_category_slug(&req.category) {
        return Err(bad_request(&e.to_string()));
    }

    let db = state.clone();
    let owner = claims.sub.to_string();
    let row = tokio::task::spawn_blocking(move || {
        db.db.create_listing(&owner, req.kind, req.title.trim(), &req.category, req.country.as_str())
    })
    .await
    .map_err(join_error)?
    .map_err(store_error)?;

    Ok((StatusCode::CREATED, Json(convert::listing_from_row(row))))
}

/// Toggle a favorite on a listing. Adding one notifies the owner;
/// removing one is silent.
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let lid = listing_id.to_string();
    let caller = claims.sub.to_string();
    let username = claims.username.clone();

    let added = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<bool>> {
        let Some(listing) = db.db.get_listing(&lid)? else {
            return Ok(None);
        };

        let added = db.db.toggle_favorite(&caller, &lid)?;
        if added && listing.owner_id != caller {
            notify(
                &db.db,
                &listing.owner_id,
                NotificationKind::FavoriteAdded,
                &format!("{} favorited \"{}\"", username, listing.title),
                None,
                Some(&format!("/listings/{}", lid)),
            );
        }
        Ok(Some(added))
    })
    .await
    .map_err(join_error)?
    .map_err(store_error)?
    .ok_or_else(not_found)?;

    Ok(Json(serde_json::json!({ "favorited": added })))
}
