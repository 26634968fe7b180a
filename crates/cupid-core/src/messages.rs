//! Message Store & Read-State Tracker.

use chrono::Utc;
use tracing::{debug, info};

use cupid_shared::constants::MAX_MESSAGE_LEN;
use cupid_shared::models::{ConversationSummary, MessageView, SentMessage};
use cupid_shared::{ConversationId, CoreError, CoreResult, UserId};

use crate::conversations::ConversationManager;
use crate::gateway::Gateway;
use crate::matches::MatchRegistry;

pub struct MessageStore<'a, G: ?Sized> {
    gateway: &'a G,
    max_len: usize,
}

impl<'a, G: Gateway + ?Sized> MessageStore<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self {
            gateway,
            max_len: MAX_MESSAGE_LEN,
        }
    }

    /// Override the maximum message length (in characters, after trim).
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    /// Conversations of `user` with preview and unread count, most recent
    /// activity first.
    pub fn list_conversations(&self, user: UserId) -> CoreResult<Vec<ConversationSummary>> {
        self.gateway
            .list_conversations_for_user(user)
            .map_err(CoreError::internal)
    }

    /// All messages of a conversation, oldest first.
    ///
    /// Does not mark anything read: callers that want read-on-open call
    /// [`MessageStore::mark_read`] after taking this list, so the response
    /// still shows the pre-read state.
    pub fn list_messages(
        &self,
        conversation: ConversationId,
        user: UserId,
    ) -> CoreResult<Vec<MessageView>> {
        ConversationManager::new(self.gateway).participant_conversation(conversation, user)?;
        self.gateway
            .list_messages_for_conversation(conversation, user)
            .map_err(CoreError::internal)
    }

    /// Append a message from `sender`.
    ///
    /// Match state is checked at send time, not only when the conversation
    /// was opened, so an unmatch blocks further messages in an existing
    /// conversation.
    pub fn send_message(
        &self,
        conversation: ConversationId,
        sender: UserId,
        text: &str,
    ) -> CoreResult<SentMessage> {
        let text = validate_message_text(text, self.max_len)?;

        let conv = ConversationManager::new(self.gateway)
            .participant_conversation(conversation, sender)?;
        let receiver = conv.other_participant(sender).ok_or_else(|| {
            CoreError::Unauthorized(format!("user {sender} is not a participant"))
        })?;

        if !MatchRegistry::new(self.gateway).is_matched(sender, receiver)? {
            return Err(CoreError::NotMatched);
        }

        let now = Utc::now();
        let message = self
            .gateway
            .insert_message(conversation, sender, text, now)
            .map_err(CoreError::internal)?;
        self.gateway
            .touch_conversation(conversation, message.created_at)
            .map_err(CoreError::internal)?;

        let sender_name = self
            .gateway
            .find_user(sender)
            .map_err(CoreError::internal)?
            .map(|u| u.name)
            .unwrap_or_default();

        info!(
            conversation = %conversation,
            message = %message.id,
            sender = %sender,
            receiver = %receiver,
            "Message sent"
        );

        Ok(SentMessage {
            id: message.id,
            conversation_id: conversation,
            text: message.text,
            sender_id: sender,
            sender_name,
            receiver_id: receiver,
            created_at: message.created_at,
        })
    }

    /// Mark every message in `conversation` not sent by `reader` as read.
    /// Idempotent.
    pub fn mark_read(&self, conversation: ConversationId, reader: UserId) -> CoreResult<usize> {
        ConversationManager::new(self.gateway).participant_conversation(conversation, reader)?;
        let changed = self
            .gateway
            .mark_messages_read(conversation, reader)
            .map_err(CoreError::internal)?;
        debug!(conversation = %conversation, reader = %reader, changed, "Messages marked read");
        Ok(changed)
    }
}

/// Trim `text` and check it is non-empty and at most `max_len` characters.
pub fn validate_message_text(text: &str, max_len: usize) -> CoreResult<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidInput("message text is required".into()));
    }
    if trimmed.chars().count() > max_len {
        return Err(CoreError::InvalidInput(format!(
            "message exceeds {max_len} characters"
        )));
    }
    Ok(trimmed)
}
