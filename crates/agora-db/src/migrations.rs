use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS listings (
            id          TEXT PRIMARY KEY,
            owner_id    TEXT NOT NULL REFERENCES users(id),
            kind        TEXT NOT NULL,
            title       TEXT NOT NULL,
            category    TEXT NOT NULL,
            country     TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS jobs (
            id          TEXT PRIMARY KEY,
            owner_id    TEXT NOT NULL REFERENCES users(id),
            title       TEXT NOT NULL,
            category    TEXT NOT NULL,
            country     TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS conversations (
            id              TEXT PRIMARY KEY,
            kind            TEXT NOT NULL,
            buyer_id        TEXT NOT NULL REFERENCES users(id),
            seller_id       TEXT NOT NULL REFERENCES users(id),
            listing_id      TEXT REFERENCES listings(id),
            job_id          TEXT REFERENCES jobs(id),
            created_at      TEXT NOT NULL,
            last_message_at TEXT NOT NULL,
            CHECK (buyer_id <> seller_id)
        );

        CREATE INDEX IF NOT EXISTS idx_conversations_buyer
            ON conversations(buyer_id, last_message_at);
        CREATE INDEX IF NOT EXISTS idx_conversations_seller
            ON conversations(seller_id, last_message_at);

        CREATE TABLE IF NOT EXISTS messages (
            id              TEXT PRIMARY KEY,
            conversation_id TEXT NOT NULL REFERENCES conversations(id),
            sender_id       TEXT NOT NULL REFERENCES users(id),
            content         TEXT NOT NULL,
            status          TEXT NOT NULL DEFAULT 'sent',
            created_at      TEXT NOT NULL,
            read_at         TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_messages_conversation
            ON messages(conversation_id, created_at);

        CREATE TABLE IF NOT EXISTS notifications (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id),
            kind        TEXT NOT NULL,
            title       TEXT NOT NULL,
            body        TEXT,
            link        TEXT,
            is_read     INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_notifications_user
            ON notifications(user_id, is_read, created_at);

        CREATE TABLE IF NOT EXISTS investor_profiles (
            user_id     TEXT PRIMARY KEY REFERENCES users(id),
            industries  TEXT NOT NULL,
            stages      TEXT NOT NULL,
            geo_focus   TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS favorites (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id),
            listing_id  TEXT NOT NULL REFERENCES listings(id),
            created_at  TEXT NOT NULL,
            UNIQUE(user_id, listing_id)
        );

        CREATE TABLE IF NOT EXISTS job_applications (
            id           TEXT PRIMARY KEY,
            job_id       TEXT NOT NULL REFERENCES jobs(id),
            applicant_id TEXT NOT NULL REFERENCES users(id),
            cover_note   TEXT,
            created_at   TEXT NOT NULL,
            UNIQUE(job_id, applicant_id)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
