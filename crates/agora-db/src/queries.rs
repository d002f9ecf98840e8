use crate::models::{
    ConversationRow, JobRow, ListingRow, MessageRow, NotificationRow, ProfileRow, UserRow,
};
use crate::{Database, now_rfc3339};
use agora_types::models::{ConversationKind, ListingKind, NotificationKind};
use anyhow::{Result, bail};
use rusqlite::{Connection, params};
use uuid::Uuid;

/// Outcome of a contact attempt against a listing or job.
pub enum Contact {
    /// The conversation, plus whether this call created it.
    Conversation(ConversationRow, bool),
    /// The contacted listing or job does not exist.
    NotFound,
    /// The caller owns the target. Contacting yourself writes nothing.
    SelfContact,
}

impl Database {
    // -- Users --

    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<UserRow> {
        self.with_conn_mut(|conn| {
            let row = UserRow {
                id: Uuid::new_v4().to_string(),
                username: username.to_string(),
                password: password_hash.to_string(),
                created_at: now_rfc3339(),
            };
            conn.execute(
                "INSERT INTO users (id, username, password, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![row.id, row.username, row.password, row.created_at],
            )?;
            Ok(row)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.prepare("SELECT id, username, password, created_at FROM users WHERE username = ?1")?
                .query_row([username], map_user)
                .optional()
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.prepare("SELECT id, username, password, created_at FROM users WHERE id = ?1")?
                .query_row([id], map_user)
                .optional()
        })
    }

    // -- Listings --

    pub fn create_listing(
        &self,
        owner_id: &str,
        kind: ListingKind,
        title: &str,
        category: &str,
        country: &str,
    ) -> Result<ListingRow> {
        self.with_conn_mut(|conn| {
            let row = ListingRow {
                id: Uuid::new_v4().to_string(),
                owner_id: owner_id.to_string(),
                kind: kind.as_str().to_string(),
                title: title.to_string(),
                category: category.to_string(),
                country: country.to_string(),
                created_at: now_rfc3339(),
            };
            conn.execute(
                "INSERT INTO listings (id, owner_id, kind, title, category, country, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![row.id, row.owner_id, row.kind, row.title, row.category, row.country, row.created_at],
            )?;
            Ok(row)
        })
    }

    pub fn get_listing(&self, id: &str) -> Result<Option<ListingRow>> {
        self.with_conn(|conn| query_listing(conn, id))
    }

    /// Recent listings in creation-time-descending order, the order the
    /// matching scorer expects its candidates in.
    pub fn list_recent_listings(&self, limit: u32) -> Result<Vec<ListingRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner_id, kind, title, category, country, created_at
                 FROM listings ORDER BY created_at DESC, rowid DESC LIMIT ?1",
            )?;
            let rows = stmt
                .query_map([limit], map_listing)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Jobs --

    pub fn create_job(
        &self,
        owner_id: &str,
        title: &str,
        category: &str,
        country: &str,
    ) -> Result<JobRow> {
        self.with_conn_mut(|conn| {
            let row = JobRow {
                id: Uuid::new_v4().to_string(),
                owner_id: owner_id.to_string(),
                title: title.to_string(),
                category: category.to_string(),
                country: country.to_string(),
                created_at: now_rfc3339(),
            };
            conn.execute(
                "INSERT INTO jobs (id, owner_id, title, category, country, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![row.id, row.owner_id, row.title, row.category, row.country, row.created_at],
            )?;
            Ok(row)
        })
    }

    pub fn get_job(&self, id: &str) -> Result<Option<JobRow>> {
        self.with_conn(|conn| query_job(conn, id))
    }

    pub fn list_recent_jobs(&self, limit: u32) -> Result<Vec<JobRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner_id, title, category, country, created_at
                 FROM jobs ORDER BY created_at DESC, rowid DESC LIMIT ?1",
            )?;
            let rows = stmt
                .query_map([limit], map_job)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Conversations --

    /// Find or create the conversation pairing `buyer_id` with the owner of
    /// a listing. Contacting your own listing is a no-op, not an error.
    pub fn start_or_get_listing_conversation(
        &self,
        listing_id: &str,
        buyer_id: &str,
    ) -> Result<Contact> {
        self.with_conn_mut(|conn| {
            let Some(listing) = query_listing(conn, listing_id)? else {
                return Ok(Contact::NotFound);
            };
            if listing.owner_id == buyer_id {
                return Ok(Contact::SelfContact);
            }

            let existing = conn
                .prepare(&format!(
                    "SELECT {CONVERSATION_COLUMNS} FROM conversations
                     WHERE listing_id = ?1 AND buyer_id = ?2"
                ))?
                .query_row(params![listing_id, buyer_id], map_conversation)
                .optional()?;
            if let Some(row) = existing {
                return Ok(Contact::Conversation(row, false));
            }

            let kind = match listing.kind.as_str() {
                "investment" => ConversationKind::Investment,
                _ => ConversationKind::Listing,
            };
            let row = insert_conversation(
                conn,
                kind,
                buyer_id,
                &listing.owner_id,
                Some(listing_id),
                None,
            )?;
            Ok(Contact::Conversation(row, true))
        })
    }

    /// Job counterpart of [`Database::start_or_get_listing_conversation`].
    pub fn start_or_get_job_conversation(&self, job_id: &str, buyer_id: &str) -> Result<Contact> {
        self.with_conn_mut(|conn| {
            let Some(job) = query_job(conn, job_id)? else {
                return Ok(Contact::NotFound);
            };
            if job.owner_id == buyer_id {
                return Ok(Contact::SelfContact);
            }

            let existing = conn
                .prepare(&format!(
                    "SELECT {CONVERSATION_COLUMNS} FROM conversations
                     WHERE job_id = ?1 AND buyer_id = ?2"
                ))?
                .query_row(params![job_id, buyer_id], map_conversation)
                .optional()?;
            if let Some(row) = existing {
                return Ok(Contact::Conversation(row, false));
            }

            let row = insert_conversation(
                conn,
                ConversationKind::Job,
                buyer_id,
                &job.owner_id,
                None,
                Some(job_id),
            )?;
            Ok(Contact::Conversation(row, true))
        })
    }

    pub fn get_conversation(&self, id: &str) -> Result<Option<ConversationRow>> {
        self.with_conn(|conn| {
            conn.prepare(&format!(
                "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ?1"
            ))?
            .query_row([id], map_conversation)
            .optional()
        })
    }

    /// Conversations the user takes part in, most recently active first,
    /// each paired with its latest message in a single query.
    pub fn list_conversations_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<(ConversationRow, Option<MessageRow>)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.kind, c.buyer_id, c.seller_id, c.listing_id, c.job_id,
                        c.created_at, c.last_message_at,
                        m.id, m.conversation_id, m.sender_id, m.content, m.status,
                        m.created_at, m.read_at
                 FROM conversations c
                 LEFT JOIN messages m ON m.id = (
                     SELECT id FROM messages WHERE conversation_id = c.id
                     ORDER BY created_at DESC, rowid DESC LIMIT 1)
                 WHERE c.buyer_id = ?1 OR c.seller_id = ?1
                 ORDER BY c.last_message_at DESC, c.rowid DESC",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    let conversation = map_conversation(row)?;
                    let last_message = match row.get::<_, Option<String>>(8)? {
                        Some(id) => Some(MessageRow {
                            id,
                            conversation_id: row.get(9)?,
                            sender_id: row.get(10)?,
                            content: row.get(11)?,
                            status: row.get(12)?,
                            created_at: row.get(13)?,
                            read_at: row.get(14)?,
                        }),
                        None => None,
                    };
                    Ok((conversation, last_message))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Messages --

    /// Insert a message with status `sent` and bump the parent
    /// conversation's recency. Empty content is rejected before any write.
    pub fn send_message(
        &self,
        conversation_id: &str,
        sender_id: &str,
        content: &str,
    ) -> Result<MessageRow> {
        let content = content.trim();
        if content.is_empty() {
            bail!("message content must not be empty");
        }

        self.with_conn_mut(|conn| {
            let Some(convo) = query_conversation(conn, conversation_id)? else {
                bail!("conversation not found: {}", conversation_id);
            };
            if sender_id != convo.buyer_id && sender_id != convo.seller_id {
                bail!("sender is not a participant of conversation {}", conversation_id);
            }

            let row = MessageRow {
                id: Uuid::new_v4().to_string(),
                conversation_id: conversation_id.to_string(),
                sender_id: sender_id.to_string(),
                content: content.to_string(),
                status: "sent".to_string(),
                created_at: now_rfc3339(),
                read_at: None,
            };
            conn.execute(
                "INSERT INTO messages (id, conversation_id, sender_id, content, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![row.id, row.conversation_id, row.sender_id, row.content, row.status, row.created_at],
            )?;
            conn.execute(
                "UPDATE conversations SET last_message_at = ?1 WHERE id = ?2",
                params![row.created_at, conversation_id],
            )?;
            Ok(row)
        })
    }

    /// All messages of a conversation in creation order; ties broken by
    /// insertion order.
    pub fn list_messages(&self, conversation_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE conversation_id = ?1
                 ORDER BY created_at ASC, rowid ASC"
            ))?;
            let rows = stmt
                .query_map([conversation_id], map_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Messages strictly newer than `checkpoint`, in creation order. Used
    /// by the stream pollers.
    pub fn list_messages_after(
        &self,
        conversation_id: &str,
        checkpoint: &str,
    ) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE conversation_id = ?1 AND created_at > ?2
                 ORDER BY created_at ASC, rowid ASC"
            ))?;
            let rows = stmt
                .query_map(params![conversation_id, checkpoint], map_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Flip every message the reader received to `read`. Re-invoking is a
    /// no-op; already-read rows are never touched again, so `read_at` is
    /// stable.
    pub fn mark_messages_read(&self, conversation_id: &str, reader_id: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let updated = conn.execute(
                "UPDATE messages SET status = 'read', read_at = ?1
                 WHERE conversation_id = ?2 AND sender_id <> ?3 AND status <> 'read'",
                params![now_rfc3339(), conversation_id, reader_id],
            )?;
            Ok(updated)
        })
    }

    /// Advance `sent` messages addressed to the recipient to `delivered`.
    /// Guarded on the current status, so it can never regress `read`.
    pub fn mark_messages_delivered(
        &self,
        conversation_id: &str,
        recipient_id: &str,
    ) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let updated = conn.execute(
                "UPDATE messages SET status = 'delivered'
                 WHERE conversation_id = ?1 AND sender_id <> ?2 AND status = 'sent'",
                params![conversation_id, recipient_id],
            )?;
            Ok(updated)
        })
    }

    // -- Notifications --

    pub fn create_notification(
        &self,
        user_id: &str,
        kind: NotificationKind,
        title: &str,
        body: Option<&str>,
        link: Option<&str>,
    ) -> Result<NotificationRow> {
        self.with_conn_mut(|conn| {
            let row = NotificationRow {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                kind: kind.as_str().to_string(),
                title: title.to_string(),
                body: body.map(str::to_string),
                link: link.map(str::to_string),
                is_read: false,
                created_at: now_rfc3339(),
            };
            conn.execute(
                "INSERT INTO notifications (id, user_id, kind, title, body, link, is_read, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
                params![row.id, row.user_id, row.kind, row.title, row.body, row.link, row.created_at],
            )?;
            Ok(row)
        })
    }

    pub fn unread_notification_count(&self, user_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
    }

    pub fn latest_unread_notifications(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM notifications
                 WHERE user_id = ?1 AND is_read = 0
                 ORDER BY created_at DESC, rowid DESC LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(params![user_id, limit], map_notification)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_notifications(&self, user_id: &str, limit: u32) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM notifications
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(params![user_id, limit], map_notification)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Mark one notification read. The update is scoped to the caller's
    /// own rows; marking someone else's notification silently does nothing,
    /// so the call never reveals whether the row exists.
    pub fn mark_notification_read(&self, notification_id: &str, caller_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2",
                params![notification_id, caller_id],
            )?;
            Ok(())
        })
    }

    pub fn mark_all_notifications_read(&self, caller_id: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let updated = conn.execute(
                "UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0",
                [caller_id],
            )?;
            Ok(updated)
        })
    }

    // -- Favorites --

    /// Toggle a favorite: removes if present, inserts if not.
    /// Returns true when the favorite was added.
    pub fn toggle_favorite(&self, user_id: &str, listing_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM favorites WHERE user_id = ?1 AND listing_id = ?2",
                    params![user_id, listing_id],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(existing_id) = existing {
                conn.execute("DELETE FROM favorites WHERE id = ?1", [&existing_id])?;
                Ok(false)
            } else {
                conn.execute(
                    "INSERT INTO favorites (id, user_id, listing_id, created_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![Uuid::new_v4().to_string(), user_id, listing_id, now_rfc3339()],
                )?;
                Ok(true)
            }
        })
    }

    // -- Job applications --

    pub fn has_applied(&self, job_id: &str, applicant_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM job_applications WHERE job_id = ?1 AND applicant_id = ?2",
                    params![job_id, applicant_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(existing.is_some())
        })
    }

    pub fn create_job_application(
        &self,
        job_id: &str,
        applicant_id: &str,
        cover_note: Option<&str>,
    ) -> Result<String> {
        self.with_conn_mut(|conn| {
            let id = Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO job_applications (id, job_id, applicant_id, cover_note, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, job_id, applicant_id, cover_note, now_rfc3339()],
            )?;
            Ok(id)
        })
    }

    // -- Investor profiles --

    pub fn upsert_investor_profile(
        &self,
        user_id: &str,
        industries: &str,
        stages: &str,
        geo_focus: &str,
    ) -> Result<ProfileRow> {
        self.with_conn_mut(|conn| {
            let row = ProfileRow {
                user_id: user_id.to_string(),
                industries: industries.to_string(),
                stages: stages.to_string(),
                geo_focus: geo_focus.to_string(),
                updated_at: now_rfc3339(),
            };
            conn.execute(
                "INSERT INTO investor_profiles (user_id, industries, stages, geo_focus, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(user_id) DO UPDATE SET
                     industries = excluded.industries,
                     stages = excluded.stages,
                     geo_focus = excluded.geo_focus,
                     updated_at = excluded.updated_at",
                params![row.user_id, row.industries, row.stages, row.geo_focus, row.updated_at],
            )?;
            Ok(row)
        })
    }

    pub fn get_investor_profile(&self, user_id: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| {
            conn.prepare(
                "SELECT user_id, industries, stages, geo_focus, updated_at
                 FROM investor_profiles WHERE user_id = ?1",
            )?
            .query_row([user_id], |row| {
                Ok(ProfileRow {
                    user_id: row.get(0)?,
                    industries: row.get(1)?,
                    stages: row.get(2)?,
                    geo_focus: row.get(3)?,
                    updated_at: row.get(4)?,
                })
            })
            .optional()
        })
    }
}

const CONVERSATION_COLUMNS: &str =
    "id, kind, buyer_id, seller_id, listing_id, job_id, created_at, last_message_at";
const MESSAGE_COLUMNS: &str =
    "id, conversation_id, sender_id, content, status, created_at, read_at";
const NOTIFICATION_COLUMNS: &str =
    "id, user_id, kind, title, body, link, is_read, created_at";

fn insert_conversation(
    conn: &Connection,
    kind: ConversationKind,
    buyer_id: &str,
    seller_id: &str,
    listing_id: Option<&str>,
    job_id: Option<&str>,
) -> Result<ConversationRow> {
    let now = now_rfc3339();
    let row = ConversationRow {
        id: Uuid::new_v4().to_string(),
        kind: kind.as_str().to_string(),
        buyer_id: buyer_id.to_string(),
        seller_id: seller_id.to_string(),
        listing_id: listing_id.map(str::to_string),
        job_id: job_id.map(str::to_string),
        created_at: now.clone(),
        last_message_at: now,
    };
    conn.execute(
        "INSERT INTO conversations (id, kind, buyer_id, seller_id, listing_id, job_id, created_at, last_message_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![row.id, row.kind, row.buyer_id, row.seller_id, row.listing_id, row.job_id, row.created_at, row.last_message_at],
    )?;
    Ok(row)
}

fn query_listing(conn: &Connection, id: &str) -> Result<Option<ListingRow>> {
    conn.prepare(
        "SELECT id, owner_id, kind, title, category, country, created_at
         FROM listings WHERE id = ?1",
    )?
    .query_row([id], map_listing)
    .optional()
}

fn query_job(conn: &Connection, id: &str) -> Result<Option<JobRow>> {
    conn.prepare(
        "SELECT id, owner_id, title, category, country, created_at FROM jobs WHERE id = ?1",
    )?
    .query_row([id], map_job)
    .optional()
}

fn query_conversation(conn: &Connection, id: &str) -> Result<Option<ConversationRow>> {
    conn.prepare(&format!(
        "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ?1"
    ))?
    .query_row([id], map_conversation)
    .optional()
}

fn map_user(row: &rusqlite::Row) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn map_listing(row: &rusqlite::Row) -> rusqlite::Result<ListingRow> {
    Ok(ListingRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        kind: row.get(2)?,
        title: row.get(3)?,
        category: row.get(4)?,
        country: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn map_job(row: &rusqlite::Row) -> rusqlite::Result<JobRow> {
    Ok(JobRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        category: row.get(3)?,
        country: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn map_conversation(row: &rusqlite::Row) -> rusqlite::Result<ConversationRow> {
    Ok(ConversationRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        buyer_id: row.get(2)?,
        seller_id: row.get(3)?,
        listing_id: row.get(4)?,
        job_id: row.get(5)?,
        created_at: row.get(6)?,
        last_message_at: row.get(7)?,
    })
}

fn map_message(row: &rusqlite::Row) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        sender_id: row.get(2)?,
        content: row.get(3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
        read_at: row.get(6)?,
    })
}

fn map_notification(row: &rusqlite::Row) -> rusqlite::Result<NotificationRow> {
    Ok(NotificationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: row.get(2)?,
        title: row.get(3)?,
        body: row.get(4)?,
        link: row.get(5)?,
        is_read: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn user(db: &Database, name: &str) -> String {
        db.create_user(name, "argon2-hash").unwrap().id
    }

    fn listing(db: &Database, owner: &str) -> String {
        db.create_listing(owner, ListingKind::Business, "Bakery for sale", "retail", "FR")
            .unwrap()
            .id
    }

    /// Two users, one listing, one conversation between them.
    /// Returns (conversation_id, buyer_id, seller_id).
    fn conversation(db: &Database) -> (String, String, String) {
        let seller = user(db, "seller");
        let buyer = user(db, "buyer");
        let listing_id = listing(db, &seller);
        match db.start_or_get_listing_conversation(&listing_id, &buyer).unwrap() {
            Contact::Conversation(row, true) => (row.id, buyer, seller),
            _ => panic!("expected a freshly created conversation"),
        }
    }

    fn pause() {
        // Keep stored microsecond timestamps strictly increasing.
        std::thread::sleep(Duration::from_millis(2));
    }

    #[test]
    fn send_inserts_single_sent_message() {
        let db = test_db();
        let (convo, buyer, _) = conversation(&db);

        db.send_message(&convo, &buyer, "Hello").unwrap();

        let messages = db.list_messages(&convo).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "Hello");
        assert_eq!(messages[0].status, "sent");
        assert_eq!(messages[0].sender_id, buyer);
        assert!(messages[0].read_at.is_none());
    }

    #[test]
    fn empty_content_is_rejected_before_any_write() {
        let db = test_db();
        let (convo, buyer, _) = conversation(&db);

        assert!(db.send_message(&convo, &buyer, "   ").is_err());
        assert!(db.send_message(&convo, &buyer, "").is_err());
        assert!(db.list_messages(&convo).unwrap().is_empty());
    }

    #[test]
    fn non_participant_cannot_send() {
        let db = test_db();
        let (convo, _, _) = conversation(&db);
        let outsider = user(&db, "outsider");

        assert!(db.send_message(&convo, &outsider, "hi").is_err());
        assert!(db.list_messages(&convo).unwrap().is_empty());
    }

    #[test]
    fn messages_come_back_in_creation_order() {
        let db = test_db();
        let (convo, buyer, seller) = conversation(&db);

        db.send_message(&convo, &buyer, "one").unwrap();
        pause();
        db.send_message(&convo, &seller, "two").unwrap();
        pause();
        db.send_message(&convo, &buyer, "three").unwrap();

        let messages = db.list_messages(&convo).unwrap();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
        for pair in messages.windows(2) {
            assert!(pair[0].created_at <= pair[1].created_at);
        }
    }

    #[test]
    fn status_never_regresses() {
        let db = test_db();
        let (convo, buyer, seller) = conversation(&db);
        db.send_message(&convo, &buyer, "ping").unwrap();

        db.mark_messages_delivered(&convo, &seller).unwrap();
        assert_eq!(db.list_messages(&convo).unwrap()[0].status, "delivered");

        db.mark_messages_read(&convo, &seller).unwrap();
        let read = &db.list_messages(&convo).unwrap()[0];
        assert_eq!(read.status, "read");
        assert!(read.read_at.is_some());

        // Neither bulk update may pull a read message backwards.
        db.mark_messages_delivered(&convo, &seller).unwrap();
        assert_eq!(db.list_messages(&convo).unwrap()[0].status, "read");
    }

    #[test]
    fn mark_read_is_idempotent() {
        let db = test_db();
        let (convo, buyer, seller) = conversation(&db);
        db.send_message(&convo, &buyer, "one").unwrap();
        db.send_message(&convo, &buyer, "two").unwrap();

        let first = db.mark_messages_read(&convo, &seller).unwrap();
        assert_eq!(first, 2);
        let state: Vec<(String, Option<String>)> = db
            .list_messages(&convo)
            .unwrap()
            .into_iter()
            .map(|m| (m.status, m.read_at))
            .collect();

        let second = db.mark_messages_read(&convo, &seller).unwrap();
        assert_eq!(second, 0);
        let state_again: Vec<(String, Option<String>)> = db
            .list_messages(&convo)
            .unwrap()
            .into_iter()
            .map(|m| (m.status, m.read_at))
            .collect();
        assert_eq!(state, state_again);
    }

    #[test]
    fn mark_read_skips_own_messages() {
        let db = test_db();
        let (convo, buyer, seller) = conversation(&db);
        db.send_message(&convo, &buyer, "from buyer").unwrap();
        db.send_message(&convo, &seller, "from seller").unwrap();

        db.mark_messages_read(&convo, &seller).unwrap();

        let messages = db.list_messages(&convo).unwrap();
        assert_eq!(messages[0].status, "read");
        assert_eq!(messages[1].status, "sent");
    }

    #[test]
    fn contacting_own_listing_writes_nothing() {
        let db = test_db();
        let owner = user(&db, "owner");
        let listing_id = listing(&db, &owner);

        match db.start_or_get_listing_conversation(&listing_id, &owner).unwrap() {
            Contact::SelfContact => {}
            _ => panic!("expected SelfContact"),
        }

        let count: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM conversations", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn second_contact_returns_the_existing_conversation() {
        let db = test_db();
        let (convo, buyer, _) = conversation(&db);
        let listing_id = db.get_conversation(&convo).unwrap().unwrap().listing_id.unwrap();

        match db.start_or_get_listing_conversation(&listing_id, &buyer).unwrap() {
            Contact::Conversation(row, created) => {
                assert_eq!(row.id, convo);
                assert!(!created);
            }
            _ => panic!("expected the existing conversation"),
        }
    }

    #[test]
    fn job_contact_creates_job_conversation() {
        let db = test_db();
        let owner = user(&db, "owner");
        let applicant = user(&db, "applicant");
        let job = db.create_job(&owner, "Engineer", "saas", "DE").unwrap();

        match db.start_or_get_job_conversation(&job.id, &applicant).unwrap() {
            Contact::Conversation(row, true) => {
                assert_eq!(row.kind, "job");
                assert_eq!(row.job_id.as_deref(), Some(job.id.as_str()));
                assert_eq!(row.seller_id, owner);
            }
            _ => panic!("expected a freshly created conversation"),
        }

        match db.start_or_get_job_conversation(&job.id, &owner).unwrap() {
            Contact::SelfContact => {}
            _ => panic!("expected SelfContact"),
        }
    }

    #[test]
    fn inbox_orders_by_recency_and_carries_last_message() {
        let db = test_db();
        let seller = user(&db, "seller");
        let buyer = user(&db, "buyer");
        let first = listing(&db, &seller);
        let second = db
            .create_listing(&seller, ListingKind::Business, "Cafe", "retail", "FR")
            .unwrap()
            .id;

        let Contact::Conversation(convo_a, _) =
            db.start_or_get_listing_conversation(&first, &buyer).unwrap()
        else {
            panic!("expected conversation");
        };
        pause();
        let Contact::Conversation(convo_b, _) =
            db.start_or_get_listing_conversation(&second, &buyer).unwrap()
        else {
            panic!("expected conversation");
        };

        pause();
        db.send_message(&convo_a.id, &buyer, "still interested").unwrap();

        let inbox = db.list_conversations_for_user(&seller).unwrap();
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].0.id, convo_a.id);
        assert_eq!(
            inbox[0].1.as_ref().map(|m| m.content.as_str()),
            Some("still interested")
        );
        assert_eq!(inbox[1].0.id, convo_b.id);
        assert!(inbox[1].1.is_none());
    }

    #[test]
    fn unread_count_drops_to_zero_after_mark_all() {
        let db = test_db();
        let recipient = user(&db, "recipient");
        for i in 0..3 {
            db.create_notification(
                &recipient,
                NotificationKind::FavoriteAdded,
                &format!("favorite {}", i),
                None,
                None,
            )
            .unwrap();
        }

        assert_eq!(db.unread_notification_count(&recipient).unwrap(), 3);
        db.mark_all_notifications_read(&recipient).unwrap();
        assert_eq!(db.unread_notification_count(&recipient).unwrap(), 0);
    }

    #[test]
    fn foreign_notification_mark_is_a_silent_noop() {
        let db = test_db();
        let owner = user(&db, "owner");
        let stranger = user(&db, "stranger");
        let notification = db
            .create_notification(&owner, NotificationKind::NewMessage, "hi", None, None)
            .unwrap();

        db.mark_notification_read(&notification.id, &stranger).unwrap();
        assert_eq!(db.unread_notification_count(&owner).unwrap(), 1);

        db.mark_notification_read(&notification.id, &owner).unwrap();
        assert_eq!(db.unread_notification_count(&owner).unwrap(), 0);
    }

    #[test]
    fn latest_unread_is_capped_and_newest_first() {
        let db = test_db();
        let recipient = user(&db, "recipient");
        for i in 0..7 {
            db.create_notification(
                &recipient,
                NotificationKind::NewMessage,
                &format!("n{}", i),
                None,
                None,
            )
            .unwrap();
            pause();
        }

        let latest = db.latest_unread_notifications(&recipient, 5).unwrap();
        assert_eq!(latest.len(), 5);
        assert_eq!(latest[0].title, "n6");
        assert_eq!(latest[4].title, "n2");
    }

    #[test]
    fn favorite_toggles_on_and_off() {
        let db = test_db();
        let owner = user(&db, "owner");
        let fan = user(&db, "fan");
        let listing_id = listing(&db, &owner);

        assert!(db.toggle_favorite(&fan, &listing_id).unwrap());
        assert!(!db.toggle_favorite(&fan, &listing_id).unwrap());
        assert!(db.toggle_favorite(&fan, &listing_id).unwrap());
    }

    #[test]
    fn job_application_is_recorded_once() {
        let db = test_db();
        let owner = user(&db, "owner");
        let applicant = user(&db, "applicant");
        let job = db.create_job(&owner, "Engineer", "saas", "DE").unwrap();

        assert!(!db.has_applied(&job.id, &applicant).unwrap());
        db.create_job_application(&job.id, &applicant, Some("please hire me")).unwrap();
        assert!(db.has_applied(&job.id, &applicant).unwrap());
        // UNIQUE(job_id, applicant_id)
        assert!(db.create_job_application(&job.id, &applicant, None).is_err());
    }

    #[test]
    fn profile_upsert_replaces_vectors() {
        let db = test_db();
        let investor = user(&db, "investor");

        db.upsert_investor_profile(&investor, "fintech saas", "seed", "FR DE").unwrap();
        db.upsert_investor_profile(&investor, "retail", "growth", "US").unwrap();

        let profile = db.get_investor_profile(&investor).unwrap().unwrap();
        assert_eq!(profile.industries, "retail");
        assert_eq!(profile.geo_focus, "US");
    }
}
