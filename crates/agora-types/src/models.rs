use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codes::{CountryCode, Industry, Stage, UnknownCode};

/// What a conversation is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationKind {
    Listing,
    Investment,
    Job,
}

impl ConversationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationKind::Listing => "listing",
            ConversationKind::Investment => "investment",
            ConversationKind::Job => "job",
        }
    }
}

impl std::str::FromStr for ConversationKind {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "listing" => Ok(ConversationKind::Listing),
            "investment" => Ok(ConversationKind::Investment),
            "job" => Ok(ConversationKind::Job),
            _ => Err(UnknownCode { kind: "conversation kind", value: s.to_string() }),
        }
    }
}

/// Delivery state of a message. Transitions only ever move forward:
/// sent -> delivered -> read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Read,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Sent => "sent",
            MessageStatus::Delivered => "delivered",
            MessageStatus::Read => "read",
        }
    }
}

impl std::str::FromStr for MessageStatus {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(MessageStatus::Sent),
            "delivered" => Ok(MessageStatus::Delivered),
            "read" => Ok(MessageStatus::Read),
            _ => Err(UnknownCode { kind: "message status", value: s.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewMessage,
    JobApplication,
    FavoriteAdded,
    ChatInvitation,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::NewMessage => "new_message",
            NotificationKind::JobApplication => "job_application",
            NotificationKind::FavoriteAdded => "favorite_added",
            NotificationKind::ChatInvitation => "chat_invitation",
        }
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new_message" => Ok(NotificationKind::NewMessage),
            "job_application" => Ok(NotificationKind::JobApplication),
            "favorite_added" => Ok(NotificationKind::FavoriteAdded),
            "chat_invitation" => Ok(NotificationKind::ChatInvitation),
            _ => Err(UnknownCode { kind: "notification kind", value: s.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingKind {
    Business,
    Investment,
}

impl ListingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingKind::Business => "business",
            ListingKind::Investment => "investment",
        }
    }
}

impl std::str::FromStr for ListingKind {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "business" => Ok(ListingKind::Business),
            "investment" => Ok(ListingKind::Investment),
            _ => Err(UnknownCode { kind: "listing kind", value: s.to_string() }),
        }
    }
}

/// A persistent pairing between two users, scoped to a listing or job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub kind: ConversationKind,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub listing_id: Option<Uuid>,
    pub job_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub body: Option<String>,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub kind: ListingKind,
    pub title: String,
    pub category: String,
    pub country: CountryCode,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub category: String,
    pub country: CountryCode,
    pub created_at: DateTime<Utc>,
}

/// Preference vectors an investor registers for matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestorProfile {
    pub user_id: Uuid,
    pub industries: Vec<Industry>,
    pub stages: Vec<Stage>,
    pub geo_focus: Vec<CountryCode>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_status_only_moves_forward() {
        assert!(MessageStatus::Sent < MessageStatus::Delivered);
        assert!(MessageStatus::Delivered < MessageStatus::Read);
    }

    #[test]
    fn status_round_trips_through_storage_form() {
        for status in [MessageStatus::Sent, MessageStatus::Delivered, MessageStatus::Read] {
            assert_eq!(status.as_str().parse::<MessageStatus>().unwrap(), status);
        }
    }

    #[test]
    fn notification_kind_round_trips() {
        for kind in [
            NotificationKind::NewMessage,
            NotificationKind::JobApplication,
            NotificationKind::FavoriteAdded,
            NotificationKind::ChatInvitation,
        ] {
            assert_eq!(kind.as_str().parse::<NotificationKind>().unwrap(), kind);
        }
    }
}
