use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use agora_db::models::MessageRow;
use agora_db::queries::Contact;
use agora_types::api::{Claims, ContactResponse, ConversationSummary, SendMessageRequest};
use agora_types::models::NotificationKind;

use crate::auth::AppState;
use crate::{ApiError, bad_request, convert, join_error, not_found, notify, store_error};

/// Preview length for the notification body of an incoming message.
const PREVIEW_CHARS: usize = 120;

pub async fn contact_listing(
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let lid = listing_id.to_string();
    let buyer = claims.sub.to_string();
    let username = claims.username.clone();

    let outcome = tokio::task::spawn_blocking(move || -> anyhow::Result<Contact> {
        let outcome = db.db.start_or_get_listing_conversation(&lid, &buyer)?;
        if let Contact::Conversation(row, true) = &outcome {
            notify(
                &db.db,
                &row.seller_id,
                NotificationKind::ChatInvitation,
                &format!("{} wants to talk about your listing", username),
                None,
                Some(&format!("/conversations/{}", row.id)),
            );
        }
        Ok(outcome)
    })
    .await
    .map_err(join_error)?
    .map_err(store_error)?;

    match outcome {
        Contact::NotFound => Err(not_found()),
        Contact::SelfContact => Err(bad_request("you cannot contact your own listing")),
        Contact::Conversation(row, created) => Ok(Json(ContactResponse {
            conversation: convert::conversation_from_row(row),
            created,
        })),
    }
}

pub async fn contact_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let jid = job_id.to_string();
    let buyer = claims.sub.to_string();
    let username = claims.username.clone();

    let outcome = tokio::task::spawn_blocking(move || -> anyhow::Result<Contact> {
        let outcome = db.db.start_or_get_job_conversation(&jid, &buyer)?;
        if let Contact::Conversation(row, true) = &outcome {
            notify(
                &db.db,
                &row.seller_id,
                NotificationKind::ChatInvitation,
                &format!("{} wants to talk about your job posting", username),
                None,
                Some(&format!("/conversations/{}", row.id)),
            );
        }
        Ok(outcome)
    })
    .await
    .map_err(join_error)?
    .map_err(store_error)?;

    match outcome {
        Contact::NotFound => Err(not_found()),
        Contact::SelfContact => Err(bad_request("you cannot contact your own job posting")),
        Contact::Conversation(row, created) => Ok(Json(ContactResponse {
            conversation: convert::conversation_from_row(row),
            created,
        })),
    }
}

/// The caller's inbox: conversations they take part in, most recent
/// activity first, each with its latest message.
pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let caller = claims.sub.to_string();

    let rows = tokio::task::spawn_blocking(move || db.db.list_conversations_for_user(&caller))
        .await
        .map_err(join_error)?
        .map_err(store_error)?;

    let summaries: Vec<ConversationSummary> = rows
        .into_iter()
        .map(|(conversation, last_message)| ConversationSummary {
            conversation: convert::conversation_from_row(conversation),
            last_message: last_message.map(convert::message_from_row),
        })
        .collect();

    Ok(Json(summaries))
}

pub async fn get_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let cid = conversation_id.to_string();
    let caller = claims.sub.to_string();

    // A conversation that exists but does not involve the caller looks
    // exactly like one that does not exist.
    let rows = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<Vec<MessageRow>>> {
        let Some(convo) = db.db.get_conversation(&cid)? else {
            return Ok(None);
        };
        if caller != convo.buyer_id && caller != convo.seller_id {
            return Ok(None);
        }
        Ok(Some(db.db.list_messages(&cid)?))
    })
    .await
    .map_err(join_error)?
    .map_err(store_error)?
    .ok_or_else(not_found)?;

    let messages: Vec<_> = rows.into_iter().map(convert::message_from_row).collect();
    Ok(Json(messages))
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(bad_request("message content must not be empty"));
    }

    let db = state.clone();
    let cid = conversation_id.to_string();
    let sender = claims.sub.to_string();
    let username = claims.username.clone();

    let row = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<MessageRow>> {
        let Some(convo) = db.db.get_conversation(&cid)? else {
            return Ok(None);
        };
        if sender != convo.buyer_id && sender != convo.seller_id {
            return Ok(None);
        }

        let row = db.db.send_message(&cid, &sender, &content)?;

        let recipient = if sender == convo.buyer_id { &convo.seller_id } else { &convo.buyer_id };
        let preview: String = content.chars().take(PREVIEW_CHARS).collect();
        notify(
            &db.db,
            recipient,
            NotificationKind::NewMessage,
            &format!("New message from {}", username),
            Some(&preview),
            Some(&format!("/conversations/{}", cid)),
        );
        Ok(Some(row))
    })
    .await
    .map_err(join_error)?
    .map_err(store_error)?
    .ok_or_else(not_found)?;

    Ok((StatusCode::CREATED, Json(convert::message_from_row(row))))
}

/// Mark everything the caller received in this conversation as read.
/// Safe to call repeatedly.
pub async fn mark_read(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let cid = conversation_id.to_string();
    let caller = claims.sub.to_string();

    let updated = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<usize>> {
        let Some(convo) = db.db.get_conversation(&cid)? else {
            return Ok(None);
        };
        if caller != convo.buyer_id && caller != convo.seller_id {
            return Ok(None);
        }
        Ok(Some(db.db.mark_messages_read(&cid, &caller)?))
    })
    .await
    .map_err(join_error)?
    .map_err(store_error)?
    .ok_or_else(not_found)?;

    Ok(Json(serde_json::json!({ "updated": updated })))
}
