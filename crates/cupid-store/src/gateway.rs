//! [`Gateway`] implementation backed by SQLite.

use chrono::{DateTime, Utc};

use cupid_core::Gateway;
use cupid_shared::models::{
    BlockedUser, Conversation, ConversationSummary, Match, MatchSummary, Message, MessageView,
    Report, ReportReason, ReportStatus, Swipe, User, UserStats,
};
use cupid_shared::{ConversationId, SwipeDirection, UserId, UserPair};

use crate::database::Database;
use crate::error::{Result, StoreError};

impl Gateway for Database {
    type Error = StoreError;

    fn find_user(&self, id: UserId) -> Result<Option<User>> {
        Database::find_user(self, id)
    }

    fn update_location(&self, id: UserId, latitude: f64, longitude: f64) -> Result<bool> {
        Database::update_location(self, id, latitude, longitude)
    }

    fn set_account_paused(&self, id: UserId, paused: bool) -> Result<bool> {
        Database::set_account_paused(self, id, paused)
    }

    fn list_discoverable_users(&self, viewer: UserId) -> Result<Vec<User>> {
        Database::list_discoverable_users(self, viewer)
    }

    fn user_stats(&self, id: UserId) -> Result<UserStats> {
        Database::user_stats(self, id)
    }

    fn upsert_swipe(
        &self,
        swiper: UserId,
        swipee: UserId,
        direction: SwipeDirection,
        at: DateTime<Utc>,
    ) -> Result<()> {
        Database::upsert_swipe(self, swiper, swipee, direction, at)
    }

    fn find_reciprocal_swipe(&self, swiper: UserId, swipee: UserId) -> Result<bool> {
        Database::find_reciprocal_swipe(self, swiper, swipee)
    }

    fn list_swipes_by_user(&self, swiper: UserId) -> Result<Vec<Swipe>> {
        Database::list_swipes_by_user(self, swiper)
    }

    fn insert_match_if_absent(&self, pair: UserPair, at: DateTime<Utc>) -> Result<bool> {
        Database::insert_match_if_absent(self, pair, at)
    }

    fn find_match(&self, pair: UserPair) -> Result<Option<Match>> {
        Database::find_match(self, pair)
    }

    fn list_matches_for_user(&self, user: UserId) -> Result<Vec<MatchSummary>> {
        Database::list_matches_for_user(self, user)
    }

    fn delete_match(&self, pair: UserPair) -> Result<bool> {
        Database::delete_match(self, pair)
    }

    fn find_conversation(&self, id: ConversationId) -> Result<Option<Conversation>> {
        Database::find_conversation(self, id)
    }

    fn find_conversation_by_pair(&self, pair: UserPair) -> Result<Option<Conversation>> {
        Database::find_conversation_by_pair(self, pair)
    }

    fn insert_conversation(
        &self,
        user1: UserId,
        user2: UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<ConversationId>> {
        Database::insert_conversation(self, user1, user2, at)
    }

    fn touch_conversation(&self, id: ConversationId, at: DateTime<Utc>) -> Result<()> {
        Database::touch_conversation(self, id, at)
    }

    fn list_conversations_for_user(&self, user: UserId) -> Result<Vec<ConversationSummary>> {
        Database::list_conversations_for_user(self, user)
    }

    fn insert_message(
        &self,
        conversation: ConversationId,
        sender: UserId,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<Message> {
        Database::insert_message(self, conversation, sender, text, at)
    }

    fn list_messages_for_conversation(
        &self,
        conversation: ConversationId,
        viewer: UserId,
    ) -> Result<Vec<MessageView>> {
        Database::list_messages_for_conversation(self, conversation, viewer)
    }

    fn mark_messages_read(&self, conversation: ConversationId, reader: UserId) -> Result<usize> {
        Database::mark_messages_read(self, conversation, reader)
    }

    fn insert_block(
        &self,
        blocker: UserId,
        blocked: UserId,
        reason: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        Database::insert_block(self, blocker, blocked, reason, at)
    }

    fn delete_block(&self, blocker: UserId, blocked: UserId) -> Result<bool> {
        Database::delete_block(self, blocker, blocked)
    }

    fn is_blocked(&self, blocker: UserId, blocked: UserId) -> Result<bool> {
        Database::is_blocked(self, blocker, blocked)
    }

    fn list_blocked(&self, blocker: UserId) -> Result<Vec<BlockedUser>> {
        Database::list_blocked(self, blocker)
    }

    fn has_open_report(&self, reporter: UserId, reported: UserId) -> Result<bool> {
        Database::has_open_report(self, reporter, reported)
    }

    fn insert_report(
        &self,
        reporter: UserId,
        reported: UserId,
        reason: ReportReason,
        description: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<i64> {
        Database::insert_report(self, reporter, reported, reason, description, at)
    }

    fn list_reports(&self, reporter: UserId) -> Result<Vec<Report>> {
        Database::list_reports(self, reporter)
    }

    fn set_report_status(&self, id: i64, status: ReportStatus) -> Result<bool> {
        Database::set_report_status(self, id, status)
    }
}
