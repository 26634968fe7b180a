//! Versioned schema migrations.
//!
//! `PRAGMA user_version` records the last applied step. Opening a database
//! applies every step above it, in order, so each runs exactly once per file.

pub mod v001_initial;
pub mod v002_moderation;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

type Step = fn(&Connection) -> rusqlite::Result<()>;

/// Ordered migration steps. Append only.
const STEPS: &[(u32, &str, Step)] = &[
    (1, "v001_initial", v001_initial::up),
    (2, "v002_moderation", v002_moderation::up),
];

/// Schema version after all steps have run.
pub const CURRENT_VERSION: u32 = 2;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    tracing::info!(
        current_version = current,
        target_version = CURRENT_VERSION,
        "checking database migrations"
    );

    for &(version, name, up) in STEPS.iter().filter(|(v, _, _)| *v > current) {
        tracing::info!(migration = name, "applying migration");
        up(conn).map_err(|e| StoreError::Migration {
            version,
            reason: e.to_string(),
        })?;
        conn.pragma_update(None, "user_version", version)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_reach_current_version_and_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);
        assert_eq!(STEPS.last().map(|s| s.0), Some(CURRENT_VERSION));
    }

    #[test]
    fn schema_rejects_self_swipes_and_duplicate_pairs() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO users (name, created_at) VALUES ('a', 'x'), ('b', 'x');",
        )
        .unwrap();

        assert!(conn
            .execute(
                "INSERT INTO swipes VALUES (1, 1, 'right', 'x')",
                [],
            )
            .is_err());

        conn.execute("INSERT INTO matches (user_lo, user_hi, matched_at) VALUES (1, 2, 'x')", [])
            .unwrap();
        assert!(conn
            .execute("INSERT INTO matches (user_lo, user_hi, matched_at) VALUES (1, 2, 'y')", [])
            .is_err());
        assert!(conn
            .execute("INSERT INTO matches (user_lo, user_hi, matched_at) VALUES (2, 1, 'y')", [])
            .is_err());
    }
}
