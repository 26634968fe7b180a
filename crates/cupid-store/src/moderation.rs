//! Blocks and reports.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use cupid_shared::models::{BlockedUser, Report, ReportReason, ReportStatus, UserSummary};
use cupid_shared::UserId;

use crate::database::{conversion_error, ts_from_sql, ts_to_sql, Database};
use crate::error::Result;

impl Database {
    // ------------------------------------------------------------------
    // Blocks
    // ------------------------------------------------------------------

    /// Returns `false` if the block already existed.
    pub fn insert_block(
        &self,
        blocker: UserId,
        blocked: UserId,
        reason: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let affected = self.conn().execute(
            "INSERT INTO blocked_users (blocker_id, blocked_id, reason, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (blocker_id, blocked_id) DO NOTHING",
            params![blocker.0, blocked.0, reason, ts_to_sql(at)],
        )?;
        Ok(affected > 0)
    }

    pub fn delete_block(&self, blocker: UserId, blocked: UserId) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM blocked_users WHERE blocker_id = ?1 AND blocked_id = ?2",
            params![blocker.0, blocked.0],
        )?;
        Ok(affected > 0)
    }

    /// Directed: whether `blocker` blocks `blocked`.
    pub fn is_blocked(&self, blocker: UserId, blocked: UserId) -> Result<bool> {
        let found = self
            .conn()
            .query_row(
                "SELECT 1 FROM blocked_users WHERE blocker_id = ?1 AND blocked_id = ?2",
                params![blocker.0, blocked.0],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn list_blocked(&self, blocker: UserId) -> Result<Vec<BlockedUser>> {
        let mut stmt = self.conn().prepare(
            "SELECT u.id, u.name, u.photo_url, b.reason, b.created_at
             FROM blocked_users b
             JOIN users u ON u.id = b.blocked_id
             WHERE b.blocker_id = ?1
             ORDER BY b.created_at DESC, b.id DESC",
        )?;

        let rows = stmt.query_map(params![blocker.0], |row| {
            let at_str: String = row.get(4)?;
            Ok(BlockedUser {
                user: UserSummary::new(UserId(row.get(0)?), row.get(1)?, row.get(2)?),
                reason: row.get(3)?,
                blocked_at: ts_from_sql(4, &at_str)?,
            })
        })?;

        let mut blocked = Vec::new();
        for row in rows {
            blocked.push(row?);
        }
        Ok(blocked)
    }

    // ------------------------------------------------------------------
    // Reports
    // ------------------------------------------------------------------

    /// Whether `reporter` already has a pending or reviewed report against
    /// `reported`.
    pub fn has_open_report(&self, reporter: UserId, reported: UserId) -> Result<bool> {
        let found = self
            .conn()
            .query_row(
                "SELECT 1 FROM user_reports
                 WHERE reporter_id = ?1 AND reported_id = ?2
                   AND status IN ('pending', 'reviewed')
                 LIMIT 1",
                params![reporter.0, reported.0],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn insert_report(
        &self,
        reporter: UserId,
        reported: UserId,
        reason: ReportReason,
        description: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<i64> {
        self.conn().execute(
            "INSERT INTO user_reports (reporter_id, reported_id, reason, description, status, created_at)
             VALUES (?1, ?2, ?3, ?4, 'pending', ?5)",
            params![reporter.0, reported.0, reason.as_str(), description, ts_to_sql(at)],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    /// Reports filed by `reporter`, newest first.
    pub fn list_reports(&self, reporter: UserId) -> Result<Vec<Report>> {
        let mut stmt = self.conn().prepare(
            "SELECT r.id, r.reported_id, u.name, r.reason, r.description, r.status, r.created_at
             FROM user_reports r
             JOIN users u ON u.id = r.reported_id
             WHERE r.reporter_id = ?1
             ORDER BY r.created_at DESC, r.id DESC",
        )?;

        let rows = stmt.query_map(params![reporter.0], row_to_report)?;

        let mut reports = Vec::new();
        for row in rows {
            reports.push(row?);
        }
        Ok(reports)
    }

    /// Move a report through review. Returns `false` if no such report.
    pub fn set_report_status(&self, id: i64, status: ReportStatus) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE user_reports SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        Ok(affected > 0)
    }
}

fn row_to_report(row: &rusqlite::Row<'_>) -> rusqlite::Result<Report> {
    let reason_str: String = row.get(3)?;
    let status_str: String = row.get(5)?;
    let created_str: String = row.get(6)?;

    Ok(Report {
        id: row.get(0)?,
        reported_id: UserId(row.get(1)?),
        reported_name: row.get(2)?,
        reason: reason_str
            .parse::<ReportReason>()
            .map_err(|e| conversion_error(3, e))?,
        description: row.get(4)?,
        status: status_str
            .parse::<ReportStatus>()
            .map_err(|e| conversion_error(5, e))?,
        created_at: ts_from_sql(6, &created_str)?,
    })
}
