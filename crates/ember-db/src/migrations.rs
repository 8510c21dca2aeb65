use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Timestamp expression used for every stored instant. Millisecond RFC 3339
/// in UTC, so text comparison matches chronological order.
pub const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id            TEXT PRIMARY KEY,
            username      TEXT NOT NULL UNIQUE,
            email         TEXT NOT NULL UNIQUE,
            password      TEXT NOT NULL,
            display_name  TEXT,
            bio           TEXT,
            created_at    TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            updated_at    TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        -- One row per direction. Pending: requester -> target only.
        -- Accepted: mirrored in both directions.
        CREATE TABLE IF NOT EXISTS friendships (
            user_id     TEXT NOT NULL REFERENCES users(id),
            friend_id   TEXT NOT NULL REFERENCES users(id),
            status      TEXT NOT NULL CHECK (status IN ('pending', 'accepted')),
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            PRIMARY KEY (user_id, friend_id),
            CHECK (user_id <> friend_id)
        );

        CREATE INDEX IF NOT EXISTS idx_friendships_friend
            ON friendships(friend_id, status);

        -- At most one pending request per unordered pair, whichever side sent it.
        CREATE UNIQUE INDEX IF NOT EXISTS idx_friendships_pending_pair
            ON friendships(min(user_id, friend_id), max(user_id, friend_id))
            WHERE status = 'pending';

        CREATE TABLE IF NOT EXISTS pins (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id),
            emotion     TEXT NOT NULL,
            message     TEXT,
            longitude   REAL NOT NULL CHECK (longitude BETWEEN -180.0 AND 180.0),
            latitude    REAL NOT NULL CHECK (latitude BETWEEN -90.0 AND 90.0),
            visibility  TEXT NOT NULL CHECK (visibility IN ('public', 'friends', 'private')),
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            expires_at  TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_pins_user
            ON pins(user_id, created_at);

        CREATE INDEX IF NOT EXISTS idx_pins_created
            ON pins(created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
