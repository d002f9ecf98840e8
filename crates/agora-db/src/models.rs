/// Database row types — these map directly to SQLite rows.
/// Distinct from agora-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct ListingRow {
    pub id: String,
    pub owner_id: String,
    pub kind: String,
    pub title: String,
    pub category: String,
    pub country: String,
    pub created_at: String,
}

pub struct JobRow {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub category: String,
    pub country: String,
    pub created_at: String,
}

pub struct ConversationRow {
    pub id: String,
    pub kind: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub listing_id: Option<String>,
    pub job_id: Option<String>,
    pub created_at: String,
    pub last_message_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    pub status: String,
    pub created_at: String,
    pub read_at: Option<String>,
}

pub struct NotificationRow {
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub title: String,
    pub body: Option<String>,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: String,
}

pub struct ProfileRow {
    pub user_id: String,
    pub industries: String,
    pub stages: String,
    pub geo_focus: String,
    pub updated_at: String,
}
