use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::SentMessage;
use crate::types::{ConversationId, MessageId, UserId};

/// Frames a connected client may send over the realtime socket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    JoinConversation { conversation_id: ConversationId },

    #[serde(rename_all = "camelCase")]
    LeaveConversation { conversation_id: ConversationId },

    #[serde(rename_all = "camelCase")]
    SendMessage {
        conversation_id: ConversationId,
        message_text: String,
    },

    #[serde(rename_all = "camelCase")]
    Typing {
        conversation_id: ConversationId,
        is_typing: bool,
    },

    #[serde(rename_all = "camelCase")]
    MarkRead { conversation_id: ConversationId },
}

/// Frames pushed by the server to connected sessions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Published to everyone subscribed to the conversation.
    #[serde(rename_all = "camelCase")]
    NewMessage {
        id: MessageId,
        conversation_id: ConversationId,
        text: String,
        sender_id: UserId,
        sender_name: String,
        created_at: DateTime<Utc>,
    },

    /// Lightweight preview pushed to the receiver's personal channel.
    #[serde(rename_all = "camelCase")]
    ConversationUpdate {
        conversation_id: ConversationId,
        last_message: String,
        last_message_time: DateTime<Utc>,
        sender_name: String,
    },

    #[serde(rename_all = "camelCase")]
    UserTyping {
        conversation_id: ConversationId,
        user_id: UserId,
        user_name: String,
        is_typing: bool,
    },

    #[serde(rename_all = "camelCase")]
    MessagesRead {
        conversation_id: ConversationId,
        read_by: UserId,
    },

    #[serde(rename_all = "camelCase")]
    Joined { conversation_id: ConversationId },

    /// Failure of a request made on this session only.
    Error { code: String, message: String },
}

impl ServerEvent {
    pub fn new_message(msg: &SentMessage) -> Self {
        ServerEvent::NewMessage {
            id: msg.id,
            conversation_id: msg.conversation_id,
            text: msg.text.clone(),
            sender_id: msg.sender_id,
            sender_name: msg.sender_name.clone(),
            created_at: msg.created_at,
        }
    }

    pub fn conversation_update(msg: &SentMessage) -> Self {
        ServerEvent::ConversationUpdate {
            conversation_id: msg.conversation_id,
            last_message: msg.text.clone(),
            last_message_time: msg.created_at,
            sender_name: msg.sender_name.clone(),
        }
    }

    /// Error frame for the originating session. Internal details stay in
    /// the server log.
    pub fn error(err: &CoreError) -> Self {
        let message = match err {
            CoreError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        ServerEvent::Error {
            code: err.code().to_string(),
            message,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl ClientEvent {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
