//! Realtime notifier: the in-process registry of connected sessions and
//! the channels they listen on.
//!
//! Every session owns a bounded outbound queue. Publishing never waits on a
//! session: a full queue drops the event for that session only.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};

use cupid_shared::constants::SESSION_QUEUE_DEPTH;
use cupid_shared::models::{Conversation, SentMessage};
use cupid_shared::protocol::ServerEvent;
use cupid_shared::{ConversationId, CoreError, CoreResult, SessionId, UserId};

/// A broadcast destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Out-of-context notifications for one user.
    Personal(UserId),
    Conversation(ConversationId),
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Personal(user) => f.write_str(&user.to_channel()),
            Channel::Conversation(conv) => f.write_str(&conv.to_channel()),
        }
    }
}

struct Session {
    user: UserId,
    tx: mpsc::Sender<ServerEvent>,
}

#[derive(Default)]
struct Registry {
    sessions: HashMap<SessionId, Session>,
    /// Most recent session per user. Last connection wins.
    active_users: HashMap<UserId, SessionId>,
    channels: HashMap<Channel, HashSet<SessionId>>,
}

impl Registry {
    fn join(&mut self, channel: Channel, session: SessionId) {
        self.channels.entry(channel).or_default().insert(session);
    }

    fn leave(&mut self, channel: Channel, session: SessionId) {
        let now_empty = match self.channels.get_mut(&channel) {
            Some(members) => {
                members.remove(&session);
                members.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.channels.remove(&channel);
        }
    }

    /// Queue `event` for every member of `channel` except sessions owned by
    /// `exclude`. Returns how many sessions accepted it.
    fn publish(&self, channel: Channel, event: &ServerEvent, exclude: Option<UserId>) -> usize {
        let Some(members) = self.channels.get(&channel) else {
            return 0;
        };

        let mut delivered = 0;
        for session_id in members {
            let Some(session) = self.sessions.get(session_id) else {
                continue;
            };
            if Some(session.user) == exclude {
                continue;
            }
            if session.tx.try_send(event.clone()).is_err() {
                debug!(
                    channel = %channel,
                    session = %session_id,
                    "Dropping event for slow or closed session"
                );
                continue;
            }
            delivered += 1;
        }
        delivered
    }
}

#[derive(Clone, Default)]
pub struct Notifier {
    registry: Arc<RwLock<Registry>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an authenticated session and subscribe it to its user's
    /// personal channel. Returns the receiving end of its outbound queue.
    pub async fn connect(&self, user: UserId) -> (SessionId, mpsc::Receiver<ServerEvent>) {
        let session = SessionId::new();
        let (tx, rx) = mpsc::channel(SESSION_QUEUE_DEPTH);

        let mut reg = self.registry.write().await;
        reg.sessions.insert(session, Session { user, tx });
        if let Some(previous) = reg.active_users.insert(user, session) {
            debug!(user = %user, previous = %previous, "Newer session replaces active session");
        }
        reg.join(Channel::Personal(user), session);

        info!(user = %user, session = %session, sessions = reg.sessions.len(), "Session connected");
        (session, rx)
    }

    /// Drop a session and all its subscriptions. The user's active-session
    /// entry is only cleared if it still points at this session.
    pub async fn disconnect(&self, session: SessionId) {
        let mut reg = self.registry.write().await;
        let Some(removed) = reg.sessions.remove(&session) else {
            return;
        };

        let joined: Vec<Channel> = reg
            .channels
            .iter()
            .filter(|(_, members)| members.contains(&session))
            .map(|(channel, _)| *channel)
            .collect();
        for channel in joined {
            reg.leave(channel, session);
        }

        if reg.active_users.get(&removed.user) == Some(&session) {
            reg.active_users.remove(&removed.user);
        }

        info!(user = %removed.user, session = %session, "Session disconnected");
    }

    /// Subscribe `session` to a conversation it takes part in.
    pub async fn subscribe_conversation(
        &self,
        session: SessionId,
        conversation: &Conversation,
    ) -> CoreResult<()> {
        let mut reg = self.registry.write().await;
        let user = reg
            .sessions
            .get(&session)
            .map(|s| s.user)
            .ok_or(CoreError::Unauthenticated)?;

        if !conversation.has_participant(user) {
            return Err(CoreError::Unauthorized(format!(
                "user {user} is not a participant of conversation {}",
                conversation.id
            )));
        }

        reg.join(Channel::Conversation(conversation.id), session);
        debug!(user = %user, conversation = %conversation.id, "Joined conversation channel");
        Ok(())
    }

    pub async fn unsubscribe_conversation(&self, session: SessionId, conversation: ConversationId) {
        self.registry
            .write()
            .await
            .leave(Channel::Conversation(conversation), session);
        debug!(session = %session, conversation = %conversation, "Left conversation channel");
    }

    pub async fn is_subscribed(&self, session: SessionId, conversation: ConversationId) -> bool {
        self.registry
            .read()
            .await
            .channels
            .get(&Channel::Conversation(conversation))
            .is_some_and(|members| members.contains(&session))
    }

    pub async fn is_online(&self, user: UserId) -> bool {
        self.registry.read().await.active_users.contains_key(&user)
    }

    /// Push a stored message to the conversation's subscribers, and a
    /// preview to the receiver's personal channel if they are connected.
    pub async fn broadcast_new_message(&self, message: &SentMessage) {
        let reg = self.registry.read().await;

        let delivered = reg.publish(
            Channel::Conversation(message.conversation_id),
            &ServerEvent::new_message(message),
            None,
        );

        if reg.active_users.contains_key(&message.receiver_id) {
            reg.publish(
                Channel::Personal(message.receiver_id),
                &ServerEvent::conversation_update(message),
                None,
            );
        }

        debug!(
            conversation = %message.conversation_id,
            message = %message.id,
            delivered,
            "Broadcast new message"
        );
    }

    /// Typing indicator to the conversation, skipping the typist's sessions.
    pub async fn broadcast_typing(
        &self,
        sender: UserId,
        sender_name: &str,
        conversation: ConversationId,
        is_typing: bool,
    ) {
        let event = ServerEvent::UserTyping {
            conversation_id: conversation,
            user_id: sender,
            user_name: sender_name.to_string(),
            is_typing,
        };
        self.registry
            .read()
            .await
            .publish(Channel::Conversation(conversation), &event, Some(sender));
    }

    /// Read receipt to the conversation, skipping the reader's sessions.
    pub async fn broadcast_read(&self, conversation: ConversationId, reader: UserId) {
        let event = ServerEvent::MessagesRead {
            conversation_id: conversation,
            read_by: reader,
        };
        self.registry
            .read()
            .await
            .publish(Channel::Conversation(conversation), &event, Some(reader));
    }

    pub async fn session_count(&self) -> usize {
        self.registry.read().await.sessions.len()
    }
}
