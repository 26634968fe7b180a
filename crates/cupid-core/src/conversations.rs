//! Conversation Manager: one conversation per matched pair, created
//! lazily.

use chrono::Utc;
use tracing::{debug, info};

use cupid_shared::models::Conversation;
use cupid_shared::{ConversationId, CoreError, CoreResult, UserId, UserPair};

use crate::gateway::Gateway;
use crate::matches::MatchRegistry;

pub struct ConversationManager<'a, G: ?Sized> {
    gateway: &'a G,
}

impl<'a, G: Gateway + ?Sized> ConversationManager<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }

    /// Public entry point for starting a conversation with `other`.
    pub fn start_conversation(
        &self,
        requester: UserId,
        other: UserId,
    ) -> CoreResult<ConversationId> {
        if requester == other {
            return Err(CoreError::InvalidInput(
                "cannot start a conversation with yourself".into(),
            ));
        }
        if self
            .gateway
            .find_user(other)
            .map_err(CoreError::internal)?
            .is_none()
        {
            return Err(CoreError::NotFound(format!("user {other}")));
        }
        self.get_or_create_conversation(requester, other)
    }

    /// Return the conversation for the unordered pair, creating it with
    /// `(user1 = a, user2 = b)` if none exists.
    ///
    /// The match gate is enforced here as well as at the entry points, so
    /// no caller can open a conversation between unmatched users. When two
    /// callers race on the first creation, the loser's insert is ignored by
    /// the unique pair constraint and it returns the winner's row.
    pub fn get_or_create_conversation(&self, a: UserId, b: UserId) -> CoreResult<ConversationId> {
        let pair = UserPair::new(a, b)?;

        if !MatchRegistry::new(self.gateway).is_matched(a, b)? {
            return Err(CoreError::NotMatched);
        }

        if let Some(existing) = self.find_by_pair(pair)? {
            return Ok(existing.id);
        }

        let inserted = self
            .gateway
            .insert_conversation(a, b, Utc::now())
            .map_err(CoreError::internal)?;

        match inserted {
            Some(id) => {
                info!(conversation = %id, user1 = %a, user2 = %b, "Conversation created");
                Ok(id)
            }
            None => {
                debug!(user1 = %a, user2 = %b, "Lost conversation creation race, re-reading");
                self.find_by_pair(pair)?.map(|c| c.id).ok_or_else(|| {
                    CoreError::Internal("conversation insert ignored but no row found".into())
                })
            }
        }
    }

    pub fn find_conversation(&self, id: ConversationId) -> CoreResult<Conversation> {
        self.gateway
            .find_conversation(id)
            .map_err(CoreError::internal)?
            .ok_or_else(|| CoreError::NotFound(format!("conversation {id}")))
    }

    /// Load `id` and check that `user` takes part in it.
    pub fn participant_conversation(
        &self,
        id: ConversationId,
        user: UserId,
    ) -> CoreResult<Conversation> {
        let conversation = self.find_conversation(id)?;

        if !conversation.has_participant(user) {
            return Err(CoreError::Unauthorized(format!(
                "user {user} is not a participant of conversation {id}"
            )));
        }
        Ok(conversation)
    }

    fn find_by_pair(&self, pair: UserPair) -> CoreResult<Option<Conversation>> {
        self.gateway
            .find_conversation_by_pair(pair)
            .map_err(CoreError::internal)
    }
}
