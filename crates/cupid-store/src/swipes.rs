use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use cupid_shared::models::Swipe;
use cupid_shared::{SwipeDirection, UserId};

use crate::database::{conversion_error, ts_from_sql, ts_to_sql, Database};
use crate::error::Result;

impl Database {
    /// Insert the `(swiper, swipee)` edge or overwrite its direction, in a
    /// single statement.
    pub fn upsert_swipe(
        &self,
        swiper: UserId,
        swipee: UserId,
        direction: SwipeDirection,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.conn().execute(
            "INSERT INTO swipes (swiper_id, swipee_id, direction, swiped_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (swiper_id, swipee_id)
             DO UPDATE SET direction = excluded.direction, swiped_at = excluded.swiped_at",
            params![swiper.0, swipee.0, direction.as_str(), ts_to_sql(at)],
        )?;
        Ok(())
    }

    pub fn get_swipe(&self, swiper: UserId, swipee: UserId) -> Result<Option<Swipe>> {
        let swipe = self
            .conn()
            .query_row(
                "SELECT swiper_id, swipee_id, direction, swiped_at
                 FROM swipes WHERE swiper_id = ?1 AND swipee_id = ?2",
                params![swiper.0, swipee.0],
                row_to_swipe,
            )
            .optional()?;
        Ok(swipe)
    }

    /// Whether `swipee` has swiped right on `swiper`.
    pub fn find_reciprocal_swipe(&self, swiper: UserId, swipee: UserId) -> Result<bool> {
        let found = self
            .conn()
            .query_row(
                "SELECT 1 FROM swipes
                 WHERE swiper_id = ?1 AND swipee_id = ?2 AND direction = 'right'",
                params![swipee.0, swiper.0],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn list_swipes_by_user(&self, swiper: UserId) -> Result<Vec<Swipe>> {
        let mut stmt = self.conn().prepare(
            "SELECT swiper_id, swipee_id, direction, swiped_at
             FROM swipes
             WHERE swiper_id = ?1
             ORDER BY swiped_at DESC, swipee_id DESC",
        )?;

        let rows = stmt.query_map(params![swiper.0], row_to_swipe)?;

        let mut swipes = Vec::new();
        for row in rows {
            swipes.push(row?);
        }
        Ok(swipes)
    }
}

fn row_to_swipe(row: &rusqlite::Row<'_>) -> rusqlite::Result<Swipe> {
    let direction_str: String = row.get(2)?;
    let at_str: String = row.get(3)?;

    let direction = direction_str
        .parse::<SwipeDirection>()
        .map_err(|e| conversion_error(2, e))?;

    Ok(Swipe {
        swiper_id: UserId(row.get(0)?),
        swipee_id: UserId(row.get(1)?),
        direction,
        at: ts_from_sql(3, &at_str)?,
    })
}
