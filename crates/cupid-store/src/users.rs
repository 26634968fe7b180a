//! CRUD operations for [`User`] records.
//!
//! Users belong to the profile subsystem; the match core only reads them,
//! apart from location and the paused flag.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use cupid_shared::models::{User, UserStats};
use cupid_shared::UserId;

use crate::database::{not_found, ts_from_sql, ts_to_sql, Database};
use crate::error::Result;

const USER_COLUMNS: &str =
    "id, name, photo_url, latitude, longitude, account_paused, created_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new user and return it with its assigned id.
    pub fn create_user(&self, name: &str, photo_url: Option<&str>) -> Result<User> {
        let now = Utc::now();
        self.conn().execute(
            "INSERT INTO users (name, photo_url, created_at) VALUES (?1, ?2, ?3)",
            params![name, photo_url, ts_to_sql(now)],
        )?;
        let id = UserId(self.conn().last_insert_rowid());
        self.get_user(id)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single user by id.
    pub fn get_user(&self, id: UserId) -> Result<User> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id.0],
                row_to_user,
            )
            .map_err(not_found)
    }

    pub fn find_user(&self, id: UserId) -> Result<Option<User>> {
        let user = self
            .conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id.0],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Active, located users other than `viewer` that `viewer` has not
    /// swiped on and that are not blocked in either direction.
    pub fn list_discoverable_users(&self, viewer: UserId) -> Result<Vec<User>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {USER_COLUMNS}
             FROM users u
             WHERE u.id <> ?1
               AND u.account_paused = 0
               AND u.latitude IS NOT NULL
               AND u.longitude IS NOT NULL
               AND NOT EXISTS (
                   SELECT 1 FROM blocked_users b
                   WHERE (b.blocker_id = ?1 AND b.blocked_id = u.id)
                      OR (b.blocker_id = u.id AND b.blocked_id = ?1))
               AND NOT EXISTS (
                   SELECT 1 FROM swipes s
                   WHERE s.swiper_id = ?1 AND s.swipee_id = u.id)"
        ))?;

        let rows = stmt.query_map(params![viewer.0], row_to_user)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }

    pub fn user_stats(&self, id: UserId) -> Result<UserStats> {
        let stats = self.conn().query_row(
            "SELECT
                (SELECT COUNT(*) FROM matches WHERE user_lo = ?1 OR user_hi = ?1),
                (SELECT COUNT(*) FROM conversations WHERE user1_id = ?1 OR user2_id = ?1),
                (SELECT COUNT(*) FROM messages WHERE sender_id = ?1)",
            params![id.0],
            |row| {
                Ok(UserStats {
                    matches: row.get(0)?,
                    conversations: row.get(1)?,
                    messages_sent: row.get(2)?,
                })
            },
        )?;
        Ok(stats)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Returns `false` if the user does not exist.
    pub fn update_location(&self, id: UserId, latitude: f64, longitude: f64) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE users SET latitude = ?1, longitude = ?2 WHERE id = ?3",
            params![latitude, longitude, id.0],
        )?;
        Ok(affected > 0)
    }

    /// Returns `false` if the user does not exist.
    pub fn set_account_paused(&self, id: UserId, paused: bool) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE users SET account_paused = ?1 WHERE id = ?2",
            params![paused, id.0],
        )?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` selected with `USER_COLUMNS` to a [`User`].
fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let created_str: String = row.get(6)?;

    Ok(User {
        id: UserId(row.get(0)?),
        name: row.get(1)?,
        photo_url: row.get(2)?,
        latitude: row.get(3)?,
        longitude: row.get(4)?,
        account_paused: row.get(5)?,
        created_at: ts_from_sql(6, &created_str)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_db;
    use crate::error::StoreError;
    use cupid_shared::SwipeDirection;

    #[test]
    fn create_and_fetch_user() {
        let (_dir, db) = test_db();
        let ada = db.create_user("Ada", Some("uploads/ada.png")).unwrap();

        let fetched = db.get_user(ada.id).unwrap();
        assert_eq!(fetched.name, "Ada");
        assert_eq!(fetched.photo_url.as_deref(), Some("uploads/ada.png"));
        assert!(!fetched.account_paused);
        assert!(fetched.coordinates().is_none());

        assert!(matches!(db.get_user(UserId(999)), Err(StoreError::NotFound)));
        assert!(db.find_user(UserId(999)).unwrap().is_none());
    }

    #[test]
    fn discoverable_users_excludes_paused_unlocated_and_swiped() {
        let (_dir, db) = test_db();
        let viewer = db.create_user("Viewer", None).unwrap();
        let located = db.create_user("Located", None).unwrap();
        let paused = db.create_user("Paused", None).unwrap();
        let swiped = db.create_user("Swiped", None).unwrap();
        let _nowhere = db.create_user("Nowhere", None).unwrap();

        for u in [viewer.id, located.id, paused.id, swiped.id] {
            assert!(db.update_location(u, 48.85, 2.35).unwrap());
        }
        db.set_account_paused(paused.id, true).unwrap();
        db.upsert_swipe(viewer.id, swiped.id, SwipeDirection::Left, Utc::now())
            .unwrap();

        let ids: Vec<UserId> = db
            .list_discoverable_users(viewer.id)
            .unwrap()
            .into_iter()
            .map(|u| u.id)
            .collect();
        assert_eq!(ids, vec![located.id]);
    }

    #[test]
    fn updates_on_missing_user_report_false() {
        let (_dir, db) = test_db();
        assert!(!db.update_location(UserId(42), 0.0, 0.0).unwrap());
        assert!(!db.set_account_paused(UserId(42), true).unwrap());
    }
}
