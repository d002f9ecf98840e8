use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codes::{CountryCode, Industry, Stage};
use crate::models::{Conversation, Job, Listing, ListingKind, Message};

// -- JWT Claims --

/// JWT claims shared between the REST middleware and the stream handlers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Listings & jobs --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateListingRequest {
    pub kind: ListingKind,
    pub title: String,
    /// Category slug; each `-`-separated token must be a known industry code.
    pub category: String,
    pub country: CountryCode,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateJobRequest {
    pub title: String,
    pub category: String,
    pub country: CountryCode,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplyToJobRequest {
    #[serde(default)]
    pub cover_note: Option<String>,
}

// -- Conversations & messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub content: String,
}

/// Result of a contact attempt against a listing or job.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub conversation: Conversation,
    /// True when this call created the conversation.
    pub created: bool,
}

/// One row of the conversation inbox: the conversation plus its most
/// recent message, ordered by recency.
#[derive(Debug, Serialize)]
pub struct ConversationSummary {
    pub conversation: Conversation,
    pub last_message: Option<Message>,
}

// -- Investor profiles & matching --

/// Full replacement of the caller's preference vectors. Codes are
/// validated during deserialization, so unknown values never reach the
/// store.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpsertProfileRequest {
    pub industries: Vec<Industry>,
    pub stages: Vec<Stage>,
    pub geo_focus: Vec<CountryCode>,
}

#[derive(Debug, Serialize)]
pub struct ListingMatch {
    pub listing: Listing,
    pub score: u32,
}

#[derive(Debug, Serialize)]
pub struct JobMatch {
    pub job: Job,
    pub score: u32,
}
