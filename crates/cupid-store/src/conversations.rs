//! Conversation rows and the per-user inbox query.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use cupid_shared::models::{Conversation, ConversationSummary, UserSummary};
use cupid_shared::{ConversationId, UserId, UserPair};

use crate::database::{ts_from_sql, ts_to_sql, Database};
use crate::error::Result;

const CONVERSATION_COLUMNS: &str = "id, user1_id, user2_id, created_at, updated_at";

impl Database {
    pub fn find_conversation(&self, id: ConversationId) -> Result<Option<Conversation>> {
        let conversation = self
            .conn()
            .query_row(
                &format!("SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ?1"),
                params![id.0],
                row_to_conversation,
            )
            .optional()?;
        Ok(conversation)
    }

    pub fn find_conversation_by_pair(&self, pair: UserPair) -> Result<Option<Conversation>> {
        let conversation = self
            .conn()
            .query_row(
                &format!(
                    "SELECT {CONVERSATION_COLUMNS} FROM conversations
                     WHERE pair_lo = ?1 AND pair_hi = ?2"
                ),
                params![pair.lo().0, pair.hi().0],
                row_to_conversation,
            )
            .optional()?;
        Ok(conversation)
    }

    /// Insert a conversation keeping the caller's participant order.
    ///
    /// Returns `None` when the unordered pair already has a conversation;
    /// the caller re-reads it by pair.
    pub fn insert_conversation(
        &self,
        user1: UserId,
        user2: UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<ConversationId>> {
        let (lo, hi) = if user1 < user2 { (user1, user2) } else { (user2, user1) };
        let ts = ts_to_sql(at);

        let affected = self.conn().execute(
            "INSERT INTO conversations (user1_id, user2_id, pair_lo, pair_hi, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT (pair_lo, pair_hi) DO NOTHING",
            params![user1.0, user2.0, lo.0, hi.0, ts],
        )?;

        if affected == 0 {
            return Ok(None);
        }
        Ok(Some(ConversationId(self.conn().last_insert_rowid())))
    }

    /// Bump the last-activity timestamp. Never moves it backwards.
    pub fn touch_conversation(&self, id: ConversationId, at: DateTime<Utc>) -> Result<()> {
        self.conn().execute(
            "UPDATE conversations SET updated_at = MAX(updated_at, ?1) WHERE id = ?2",
            params![ts_to_sql(at), id.0],
        )?;
        Ok(())
    }

    /// Inbox view for `user`: the other participant, the latest message and
    /// the number of unread messages from the other side, most recently
    /// active first.
    pub fn list_conversations_for_user(&self, user: UserId) -> Result<Vec<ConversationSummary>> {
        let mut stmt = self.conn().prepare(
            "SELECT c.id, c.updated_at, o.id, o.name, o.photo_url,
                    (SELECT m.message_text FROM messages m
                      WHERE m.conversation_id = c.id
                      ORDER BY m.created_at DESC, m.id DESC LIMIT 1),
                    (SELECT m.created_at FROM messages m
                      WHERE m.conversation_id = c.id
                      ORDER BY m.created_at DESC, m.id DESC LIMIT 1),
                    (SELECT COUNT(*) FROM messages m
                      WHERE m.conversation_id = c.id
                        AND m.sender_id <> ?1
                        AND m.is_read = 0)
             FROM conversations c
             JOIN users o
               ON o.id = CASE WHEN c.user1_id = ?1 THEN c.user2_id ELSE c.user1_id END
             WHERE c.user1_id = ?1 OR c.user2_id = ?1
             ORDER BY c.updated_at DESC, c.id DESC",
        )?;

        let rows = stmt.query_map(params![user.0], |row| {
            let updated_str: String = row.get(1)?;
            let last_time_str: Option<String> = row.get(6)?;
            let last_message_time = match last_time_str {
                Some(raw) => Some(ts_from_sql(6, &raw)?),
                None => None,
            };

            Ok(ConversationSummary {
                conversation_id: ConversationId(row.get(0)?),
                updated_at: ts_from_sql(1, &updated_str)?,
                other_user: UserSummary::new(UserId(row.get(2)?), row.get(3)?, row.get(4)?),
                last_message: row.get(5)?,
                last_message_time,
                unread_count: row.get(7)?,
            })
        })?;

        let mut conversations = Vec::new();
        for row in rows {
            conversations.push(row?);
        }
        Ok(conversations)
    }
}

fn row_to_conversation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Conversation> {
    let created_str: String = row.get(3)?;
    let updated_str: String = row.get(4)?;

    Ok(Conversation {
        id: ConversationId(row.get(0)?),
        user1_id: UserId(row.get(1)?),
        user2_id: UserId(row.get(2)?),
        created_at: ts_from_sql(3, &created_str)?,
        updated_at: ts_from_sql(4, &updated_str)?,
    })
}
