use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use cupid_shared::models::{Match, MatchSummary, UserSummary};
use cupid_shared::{MatchId, UserId, UserPair};

use crate::database::{ts_from_sql, ts_to_sql, Database};
use crate::error::Result;

impl Database {
    /// Insert the canonical match row. A conflicting row is left alone and
    /// reported as `false`.
    pub fn insert_match_if_absent(&self, pair: UserPair, at: DateTime<Utc>) -> Result<bool> {
        let affected = self.conn().execute(
            "INSERT INTO matches (user_lo, user_hi, matched_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (user_lo, user_hi) DO NOTHING",
            params![pair.lo().0, pair.hi().0, ts_to_sql(at)],
        )?;
        Ok(affected > 0)
    }

    pub fn find_match(&self, pair: UserPair) -> Result<Option<Match>> {
        let found = self
            .conn()
            .query_row(
                "SELECT id, user_lo, user_hi, matched_at
                 FROM matches WHERE user_lo = ?1 AND user_hi = ?2",
                params![pair.lo().0, pair.hi().0],
                |row| {
                    let at_str: String = row.get(3)?;
                    Ok(Match {
                        id: MatchId(row.get(0)?),
                        user_lo: UserId(row.get(1)?),
                        user_hi: UserId(row.get(2)?),
                        matched_at: ts_from_sql(3, &at_str)?,
                    })
                },
            )
            .optional()?;
        Ok(found)
    }

    /// Matches involving `user`, newest first, joined with the other
    /// participant's profile.
    pub fn list_matches_for_user(&self, user: UserId) -> Result<Vec<MatchSummary>> {
        let mut stmt = self.conn().prepare(
            "SELECT m.id, m.matched_at, o.id, o.name, o.photo_url
             FROM matches m
             JOIN users o
               ON o.id = CASE WHEN m.user_lo = ?1 THEN m.user_hi ELSE m.user_lo END
             WHERE m.user_lo = ?1 OR m.user_hi = ?1
             ORDER BY m.matched_at DESC, m.id DESC",
        )?;

        let rows = stmt.query_map(params![user.0], |row| {
            let at_str: String = row.get(1)?;
            Ok(MatchSummary {
                match_id: MatchId(row.get(0)?),
                matched_at: ts_from_sql(1, &at_str)?,
                other_user: UserSummary::new(UserId(row.get(2)?), row.get(3)?, row.get(4)?),
            })
        })?;

        let mut matches = Vec::new();
        for row in rows {
            matches.push(row?);
        }
        Ok(matches)
    }

    pub fn delete_match(&self, pair: UserPair) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM matches WHERE user_lo = ?1 AND user_hi = ?2",
            params![pair.lo().0, pair.hi().0],
        )?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_db;

    #[test]
    fn duplicate_insert_is_a_no_op() {
        let (_dir, db) = test_db();
        let a = db.create_user("A", None).unwrap().id;
        let b = db.create_user("B", None).unwrap().id;

        let pair = UserPair::new(b, a).unwrap();
        assert!(db.insert_match_if_absent(pair, Utc::now()).unwrap());
        assert!(!db
            .insert_match_if_absent(UserPair::new(a, b).unwrap(), Utc::now())
            .unwrap());

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM matches", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);

        let m = db.find_match(pair).unwrap().unwrap();
        assert_eq!((m.user_lo, m.user_hi), (a.min(b), a.max(b)));
    }

    #[test]
    fn list_shows_other_participant_from_both_sides() {
        let (_dir, db) = test_db();
        let a = db.create_user("Ada", None).unwrap().id;
        let b = db.create_user("Bo", Some("bo.jpg")).unwrap().id;
        db.insert_match_if_absent(UserPair::new(a, b).unwrap(), Utc::now())
            .unwrap();

        let for_a = db.list_matches_for_user(a).unwrap();
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_a[0].other_user.name, "Bo");
        assert_eq!(for_a[0].other_user.avatar, "bo.jpg");

        let for_b = db.list_matches_for_user(b).unwrap();
        assert_eq!(for_b[0].other_user.id, a);
    }
}
