//! Conversions from raw store rows to the API model types. Stored values
//! are validated at write time, so a parse failure here means the store
//! was tampered with; rows degrade to defaults with a warning rather than
//! failing the request.

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use agora_db::models::{
    ConversationRow, JobRow, ListingRow, MessageRow, NotificationRow, ProfileRow,
};
use agora_types::codes::{CountryCode, parse_code_list};
use agora_types::models::{
    Conversation, ConversationKind, InvestorProfile, Job, Listing, ListingKind, Message,
    MessageStatus, Notification, NotificationKind,
};

fn parse_uuid(field: &'static str, raw: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", field, raw, e);
        Uuid::default()
    })
}

fn parse_timestamp(field: &'static str, raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", field, raw, e);
        DateTime::default()
    })
}

fn parse_country(field: &'static str, raw: &str) -> CountryCode {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {}: {}", field, e);
        "ZZ".parse().expect("placeholder country code")
    })
}

pub fn message_from_row(row: MessageRow) -> Message {
    Message {
        id: parse_uuid("message id", &row.id),
        conversation_id: parse_uuid("conversation_id", &row.conversation_id),
        sender_id: parse_uuid("sender_id", &row.sender_id),
        content: row.content,
        status: row.status.parse::<MessageStatus>().unwrap_or_else(|e| {
            warn!("Corrupt message status on '{}': {}", row.id, e);
            MessageStatus::Sent
        }),
        created_at: parse_timestamp("message created_at", &row.created_at),
        read_at: row.read_at.as_deref().map(|t| parse_timestamp("message read_at", t)),
    }
}

pub fn conversation_from_row(row: ConversationRow) -> Conversation {
    Conversation {
        id: parse_uuid("conversation id", &row.id),
        kind: row.kind.parse::<ConversationKind>().unwrap_or_else(|e| {
            warn!("Corrupt conversation kind on '{}': {}", row.id, e);
            ConversationKind::Listing
        }),
        buyer_id: parse_uuid("buyer_id", &row.buyer_id),
        seller_id: parse_uuid("seller_id", &row.seller_id),
        listing_id: row.listing_id.as_deref().map(|id| parse_uuid("listing_id", id)),
        job_id: row.job_id.as_deref().map(|id| parse_uuid("job_id", id)),
        created_at: parse_timestamp("conversation created_at", &row.created_at),
        last_message_at: parse_timestamp("last_message_at", &row.last_message_at),
    }
}

pub fn notification_from_row(row: NotificationRow) -> Notification {
    Notification {
        id: parse_uuid("notification id", &row.id),
        user_id: parse_uuid("notification user_id", &row.user_id),
        kind: row.kind.parse::<NotificationKind>().unwrap_or_else(|e| {
            warn!("Corrupt notification kind on '{}': {}", row.id, e);
            NotificationKind::NewMessage
        }),
        title: row.title,
        body: row.body,
        link: row.link,
        is_read: row.is_read,
        created_at: parse_timestamp("notification created_at", &row.created_at),
    }
}

pub fn listing_from_row(row: ListingRow) -> Listing {
    Listing {
        id: parse_uuid("listing id", &row.id),
        owner_id: parse_uuid("listing owner_id", &row.owner_id),
        kind: row.kind.parse::<ListingKind>().unwrap_or_else(|e| {
            warn!("Corrupt listing kind on '{}': {}", row.id, e);
            ListingKind::Business
        }),
        title: row.title,
        category: row.category,
        country: parse_country("listing country", &row.country),
        created_at: parse_timestamp("listing created_at", &row.created_at),
    }
}

pub fn job_from_row(row: JobRow) -> Job {
    Job {
        id: parse_uuid("job id", &row.id),
        owner_id: parse_uuid("job owner_id", &row.owner_id),
        title: row.title,
        category: row.category,
        country: parse_country("job country", &row.country),
        created_at: parse_timestamp("job created_at", &row.created_at),
    }
}

pub fn profile_from_row(row: ProfileRow) -> InvestorProfile {
    InvestorProfile {
        user_id: parse_uuid("profile user_id", &row.user_id),
        industries: parse_code_list(&row.industries).unwrap_or_else(|e| {
            warn!("Corrupt industries on profile '{}': {}", row.user_id, e);
            vec![]
        }),
        stages: parse_code_list(&row.stages).unwrap_or_else(|e| {
            warn!("Corrupt stages on profile '{}': {}", row.user_id, e);
            vec![]
        }),
        geo_focus: parse_code_list(&row.geo_focus).unwrap_or_else(|e| {
            warn!("Corrupt geo focus on profile '{}': {}", row.user_id, e);
            vec![]
        }),
        updated_at: parse_timestamp("profile updated_at", &row.updated_at),
    }
}
