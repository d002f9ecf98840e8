//! Server-sent-event bridges. Each connection owns an independent poll
//! loop that re-queries the store on a fixed interval and pushes deltas
//! down a one-way stream. Dropping the stream (client disconnect) drops
//! the loop and its timer with it.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    Extension,
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::Stream;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};
use uuid::Uuid;

use agora_db::Database;
use agora_db::models::{MessageRow, NotificationRow};
use agora_types::api::Claims;
use agora_types::events::{ConversationEvent, NotificationEvent};

use crate::auth::AppState;
use crate::{ApiError, convert, join_error, not_found, store_error};

pub const MESSAGE_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const NOTIFICATION_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How many unread notifications an `update` event carries at most.
pub const NOTIFICATION_LATEST_LIMIT: u32 = 5;

/// Per-connection polling state for one conversation stream.
///
/// The checkpoint starts at connect time and advances to the newest
/// message timestamp observed, not to "now": a row committed while a poll
/// query was running keeps a timestamp above the checkpoint and is picked
/// up by the next tick instead of being skipped.
#[derive(Debug, Clone)]
pub struct MessagePoller {
    conversation_id: String,
    reader_id: String,
    checkpoint: String,
}

impl MessagePoller {
    pub fn new(conversation_id: Uuid, reader_id: Uuid) -> Self {
        Self {
            conversation_id: conversation_id.to_string(),
            reader_id: reader_id.to_string(),
            checkpoint: agora_db::now_rfc3339(),
        }
    }

    /// One poll tick: fetch rows newer than the checkpoint and advance it.
    /// Rows pushed to this reader are bulk-flipped to `delivered`. On
    /// error the checkpoint stays put, so the next tick retries the same
    /// window.
    pub fn poll(&mut self, db: &Database) -> anyhow::Result<Vec<MessageRow>> {
        let rows = db.list_messages_after(&self.conversation_id, &self.checkpoint)?;
        if let Some(newest) = rows.last() {
            self.checkpoint = newest.created_at.clone();
            db.mark_messages_delivered(&self.conversation_id, &self.reader_id)?;
        }
        Ok(rows)
    }
}

/// Per-connection polling state for the notification stream.
#[derive(Debug, Clone)]
pub struct NotificationPoller {
    user_id: String,
}

pub struct NotificationSnapshot {
    pub unread_count: u64,
    pub latest: Vec<NotificationRow>,
}

impl NotificationPoller {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id: user_id.to_string() }
    }

    pub fn poll(&self, db: &Database) -> anyhow::Result<NotificationSnapshot> {
        let unread_count = db.unread_notification_count(&self.user_id)?;
        let latest =
            db.latest_unread_notifications(&self.user_id, NOTIFICATION_LATEST_LIMIT)?;
        Ok(NotificationSnapshot { unread_count, latest })
    }
}

/// GET /conversations/{id}/stream
pub async fn conversation_stream(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    // Reject before the stream is established: the conversation must exist
    // and the caller must be a participant.
    let convo = {
        let db = state.clone();
        let cid = conversation_id.to_string();
        tokio::task::spawn_blocking(move || db.db.get_conversation(&cid))
            .await
            .map_err(join_error)?
            .map_err(store_error)?
            .ok_or_else(not_found)?
    };
    let caller = claims.sub.to_string();
    if caller != convo.buyer_id && caller != convo.seller_id {
        return Err(not_found());
    }

    let mut poller = MessagePoller::new(conversation_id, claims.sub);
    let stream = async_stream::stream! {
        yield Ok::<Event, Infallible>(sse_json(&ConversationEvent::Connected));

        let mut interval = tokio::time::interval(MESSAGE_POLL_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await; // first tick completes immediately

        loop {
            interval.tick().await;

            let task = {
                let state = state.clone();
                let mut p = poller.clone();
                tokio::task::spawn_blocking(move || {
                    let polled = p.poll(&state.db);
                    (p, polled)
                })
            };

            match task.await {
                Ok((advanced, Ok(rows))) => {
                    poller = advanced;
                    if !rows.is_empty() {
                        let messages =
                            rows.into_iter().map(convert::message_from_row).collect();
                        yield Ok(sse_json(&ConversationEvent::NewMessages { messages }));
                    }
                }
                // A failed tick is dropped; the next one retries naturally.
                Ok((_, Err(e))) => {
                    debug!("Poll tick failed for conversation {}: {:#}", conversation_id, e);
                }
                Err(e) => {
                    error!("spawn_blocking join error: {}", e);
                }
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// GET /notifications/stream
pub async fn notification_stream(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let poller = NotificationPoller::new(claims.sub);

    // The init event carries the unread count at connect time; a store
    // failure here rejects the stream instead of silently starting empty.
    let initial = {
        let db = state.clone();
        let p = poller.clone();
        tokio::task::spawn_blocking(move || p.poll(&db.db))
            .await
            .map_err(join_error)?
            .map_err(store_error)?
    };

    let user_id = claims.sub;
    let stream = async_stream::stream! {
        yield Ok::<Event, Infallible>(sse_json(&NotificationEvent::Init {
            unread_count: initial.unread_count,
        }));

        let mut interval = tokio::time::interval(NOTIFICATION_POLL_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await;

        loop {
            interval.tick().await;

            let task = {
                let state = state.clone();
                let p = poller.clone();
                tokio::task::spawn_blocking(move || p.poll(&state.db))
            };

            match task.await {
                Ok(Ok(snapshot)) => {
                    let latest = snapshot
                        .latest
                        .into_iter()
                        .map(convert::notification_from_row)
                        .collect();
                    yield Ok(sse_json(&NotificationEvent::Update {
                        unread_count: snapshot.unread_count,
                        latest,
                    }));
                }
                Ok(Err(e)) => {
                    debug!("Notification poll tick failed for {}: {:#}", user_id, e);
                }
                Err(e) => {
                    error!("spawn_blocking join error: {}", e);
                }
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn sse_json<T: serde::Serialize>(payload: &T) -> Event {
    match Event::default().json_data(payload) {
        Ok(event) => event,
        Err(e) => {
            error!("Failed to serialize stream event: {}", e);
            Event::default().data("{}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_db::queries::Contact;
    use agora_types::models::{ListingKind, NotificationKind};

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    /// Returns (conversation_id, buyer_id, seller_id).
    fn conversation(db: &Database) -> (String, String, String) {
        let seller = db.create_user("seller", "hash").unwrap().id;
        let buyer = db.create_user("buyer", "hash").unwrap().id;
        let listing = db
            .create_listing(&seller, ListingKind::Business, "Bakery", "retail", "FR")
            .unwrap();
        match db.start_or_get_listing_conversation(&listing.id, &buyer).unwrap() {
            Contact::Conversation(row, _) => (row.id, buyer, seller),
            _ => panic!("expected conversation"),
        }
    }

    fn poller_at(conversation_id: &str, reader_id: &str, checkpoint: &str) -> MessagePoller {
        MessagePoller {
            conversation_id: conversation_id.to_string(),
            reader_id: reader_id.to_string(),
            checkpoint: checkpoint.to_string(),
        }
    }

    fn pause() {
        // Keep stored microsecond timestamps strictly increasing.
        std::thread::sleep(Duration::from_millis(2));
    }

    #[test]
    fn poll_returns_only_rows_newer_than_the_checkpoint() {
        let db = test_db();
        let (convo, buyer, seller) = conversation(&db);

        let before = db.send_message(&convo, &buyer, "before").unwrap();
        let mut poller = poller_at(&convo, &seller, &before.created_at);
        pause();
        let after = db.send_message(&convo, &buyer, "after").unwrap();

        let rows = poller.poll(&db).unwrap();
        let contents: Vec<&str> = rows.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["after"]);
        assert_eq!(poller.checkpoint, after.created_at);
    }

    #[test]
    fn delivered_rows_are_not_redelivered() {
        let db = test_db();
        let (convo, buyer, seller) = conversation(&db);

        let first = db.send_message(&convo, &buyer, "one").unwrap();
        let mut poller = poller_at(&convo, &seller, "1970-01-01T00:00:00.000000Z");

        assert_eq!(poller.poll(&db).unwrap().len(), 1);
        assert_eq!(poller.checkpoint, first.created_at);
        assert!(poller.poll(&db).unwrap().is_empty());

        pause();
        db.send_message(&convo, &buyer, "two").unwrap();
        let rows = poller.poll(&db).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].content, "two");
    }

    #[test]
    fn empty_poll_leaves_the_checkpoint_alone() {
        let db = test_db();
        let (convo, _, seller) = conversation(&db);

        let mut poller = poller_at(&convo, &seller, "2099-01-01T00:00:00.000000Z");
        assert!(poller.poll(&db).unwrap().is_empty());
        assert_eq!(poller.checkpoint, "2099-01-01T00:00:00.000000Z");
    }

    #[test]
    fn poll_marks_received_messages_delivered() {
        let db = test_db();
        let (convo, buyer, seller) = conversation(&db);

        db.send_message(&convo, &buyer, "from buyer").unwrap();
        pause();
        db.send_message(&convo, &seller, "from seller").unwrap();

        // The seller's stream delivers both rows but only flips the ones
        // the seller received.
        let mut poller = poller_at(&convo, &seller, "1970-01-01T00:00:00.000000Z");
        assert_eq!(poller.poll(&db).unwrap().len(), 2);

        let messages = db.list_messages(&convo).unwrap();
        assert_eq!(messages[0].status, "delivered");
        assert_eq!(messages[1].status, "sent");
    }

    #[test]
    fn poll_never_regresses_read_messages() {
        let db = test_db();
        let (convo, buyer, seller) = conversation(&db);

        db.send_message(&convo, &buyer, "hello").unwrap();
        db.mark_messages_read(&convo, &seller).unwrap();

        let mut poller = poller_at(&convo, &seller, "1970-01-01T00:00:00.000000Z");
        poller.poll(&db).unwrap();

        assert_eq!(db.list_messages(&convo).unwrap()[0].status, "read");
    }

    #[test]
    fn notification_snapshot_counts_and_caps_latest() {
        let db = test_db();
        let user = db.create_user("recipient", "hash").unwrap();
        let user_uuid: Uuid = user.id.parse().unwrap();

        let poller = NotificationPoller::new(user_uuid);
        let empty = poller.poll(&db).unwrap();
        assert_eq!(empty.unread_count, 0);
        assert!(empty.latest.is_empty());

        for i in 0..7 {
            db.create_notification(
                &user.id,
                NotificationKind::NewMessage,
                &format!("n{}", i),
                None,
                None,
            )
            .unwrap();
            pause();
        }

        let snapshot = poller.poll(&db).unwrap();
        assert_eq!(snapshot.unread_count, 7);
        assert_eq!(snapshot.latest.len(), 5);
        assert_eq!(snapshot.latest[0].title, "n6");

        db.mark_all_notifications_read(&user.id).unwrap();
        let drained = poller.poll(&db).unwrap();
        assert_eq!(drained.unread_count, 0);
        assert!(drained.latest.is_empty());
    }
}
