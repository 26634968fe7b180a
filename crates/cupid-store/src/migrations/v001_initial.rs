//! v001 -- Initial schema creation.
//!
//! Creates the five core tables: `users`, `swipes`, `matches`,
//! `conversations` and `messages`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users (owned by the profile subsystem; the core only reads them)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    name           TEXT NOT NULL,
    photo_url      TEXT,
    latitude       REAL,
    longitude      REAL,
    account_paused INTEGER NOT NULL DEFAULT 0,   -- boolean 0/1
    created_at     TEXT NOT NULL                 -- RFC-3339, UTC, micros
);

-- ----------------------------------------------------------------
-- Swipes: one directed edge per ordered pair, upserted
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS swipes (
    swiper_id  INTEGER NOT NULL,
    swipee_id  INTEGER NOT NULL,
    direction  TEXT NOT NULL CHECK (direction IN ('left', 'right')),
    swiped_at  TEXT NOT NULL,

    PRIMARY KEY (swiper_id, swipee_id),
    CHECK (swiper_id <> swipee_id),
    FOREIGN KEY (swiper_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (swipee_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_swipes_swipee ON swipes(swipee_id, swiper_id);

-- ----------------------------------------------------------------
-- Matches: canonical (lo, hi) pair, at most one row per pair
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS matches (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    user_lo    INTEGER NOT NULL,
    user_hi    INTEGER NOT NULL,
    matched_at TEXT NOT NULL,

    UNIQUE (user_lo, user_hi),
    CHECK (user_lo < user_hi),
    FOREIGN KEY (user_lo) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (user_hi) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_matches_user_hi ON matches(user_hi);

-- ----------------------------------------------------------------
-- Conversations: caller order in user1/user2, uniqueness on the
-- canonical pair
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS conversations (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    user1_id   INTEGER NOT NULL,
    user2_id   INTEGER NOT NULL,
    pair_lo    INTEGER NOT NULL,
    pair_hi    INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,

    UNIQUE (pair_lo, pair_hi),
    CHECK (pair_lo < pair_hi),
    FOREIGN KEY (user1_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (user2_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_conversations_user1 ON conversations(user1_id);
CREATE INDEX IF NOT EXISTS idx_conversations_user2 ON conversations(user2_id);

-- ----------------------------------------------------------------
-- Messages: append-only, read flag is the only mutable column
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    conversation_id INTEGER NOT NULL,
    sender_id       INTEGER NOT NULL,
    message_text    TEXT NOT NULL,
    is_read         INTEGER NOT NULL DEFAULT 0,  -- boolean 0/1
    created_at      TEXT NOT NULL,

    FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE,
    FOREIGN KEY (sender_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_messages_conversation_ts
    ON messages(conversation_id, created_at);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
