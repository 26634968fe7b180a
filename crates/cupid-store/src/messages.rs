use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::params;

use cupid_shared::models::{Message, MessageView};
use cupid_shared::{ConversationId, MessageId, UserId};

use crate::database::{ts_from_sql, ts_to_sql, Database};
use crate::error::Result;

impl Database {
    /// Append an unread message and return the stored row. Timestamps are
    /// kept to microsecond precision.
    pub fn insert_message(
        &self,
        conversation: ConversationId,
        sender: UserId,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<Message> {
        self.conn().execute(
            "INSERT INTO messages (conversation_id, sender_id, message_text, is_read, created_at)
             VALUES (?1, ?2, ?3, 0, ?4)",
            params![conversation.0, sender.0, text, ts_to_sql(at)],
        )?;

        Ok(Message {
            id: MessageId(self.conn().last_insert_rowid()),
            conversation_id: conversation,
            sender_id: sender,
            text: text.to_owned(),
            created_at: at.trunc_subsecs(6),
            is_read: false,
        })
    }

    /// Messages of a conversation in creation order, with `is_me` set
    /// relative to `viewer`.
    pub fn list_messages_for_conversation(
        &self,
        conversation: ConversationId,
        viewer: UserId,
    ) -> Result<Vec<MessageView>> {
        let mut stmt = self.conn().prepare(
            "SELECT m.id, m.message_text, m.sender_id, u.name, m.created_at
             FROM messages m
             JOIN users u ON u.id = m.sender_id
             WHERE m.conversation_id = ?1
             ORDER BY m.created_at ASC, m.id ASC",
        )?;

        let rows = stmt.query_map(params![conversation.0], |row| {
            let sender_id = UserId(row.get(2)?);
            let created_str: String = row.get(4)?;
            Ok(MessageView {
                id: MessageId(row.get(0)?),
                text: row.get(1)?,
                sender_id,
                sender_name: row.get(3)?,
                created_at: ts_from_sql(4, &created_str)?,
                is_me: sender_id == viewer,
            })
        })?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    /// Flag every unread message not sent by `reader` as read.
    pub fn mark_messages_read(&self, conversation: ConversationId, reader: UserId) -> Result<usize> {
        let affected = self.conn().execute(
            "UPDATE messages SET is_read = 1
             WHERE conversation_id = ?1 AND sender_id <> ?2 AND is_read = 0",
            params![conversation.0, reader.0],
        )?;
        Ok(affected)
    }
}
