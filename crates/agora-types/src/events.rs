use serde::{Deserialize, Serialize};

use crate::models::{Message, Notification};

/// Events pushed over a per-conversation message stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationEvent {
    /// Emitted once, immediately after the stream is established.
    Connected,

    /// Rows that appeared since the previous poll tick.
    NewMessages { messages: Vec<Message> },
}

/// Events pushed over the per-user notification stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// Emitted once on connect with the current unread count.
    Init {
        #[serde(rename = "unreadCount")]
        unread_count: u64,
    },

    /// Emitted on every poll tick.
    Update {
        #[serde(rename = "unreadCount")]
        unread_count: u64,
        latest: Vec<Notification>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connected_event_is_a_bare_type_tag() {
        let json = serde_json::to_value(ConversationEvent::Connected).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "connected" }));
    }

    #[test]
    fn init_event_uses_wire_field_names() {
        let json = serde_json::to_value(NotificationEvent::Init { unread_count: 4 }).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "init", "unreadCount": 4 }));
    }

    #[test]
    fn update_event_carries_count_and_latest() {
        let json =
            serde_json::to_value(NotificationEvent::Update { unread_count: 0, latest: vec![] })
                .unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "update", "unreadCount": 0, "latest": [] })
        );
    }
}
