//! Persistence port consumed by the engines.
//!
//! Each method is a single atomic read or write. Implementations must
//! enforce the uniqueness constraints the engines rely on:
//!
//! - one swipe per ordered `(swiper, swipee)` pair (upsert),
//! - one match per unordered pair (insert-or-ignore),
//! - one conversation per unordered pair (insert-or-ignore, then re-read).

use chrono::{DateTime, Utc};

use cupid_shared::models::{
    BlockedUser, Conversation, ConversationSummary, Match, MatchSummary, Message, MessageView,
    Report, ReportReason, ReportStatus, Swipe, User, UserStats,
};
use cupid_shared::{ConversationId, SwipeDirection, UserId, UserPair};

pub trait Gateway {
    type Error: std::fmt::Display;

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    fn find_user(&self, id: UserId) -> Result<Option<User>, Self::Error>;

    /// Returns `false` when no such user exists.
    fn update_location(&self, id: UserId, latitude: f64, longitude: f64)
        -> Result<bool, Self::Error>;

    /// Returns `false` when no such user exists.
    fn set_account_paused(&self, id: UserId, paused: bool) -> Result<bool, Self::Error>;

    /// Users `viewer` may be shown in discovery: active, located, not
    /// blocked either way and not already swiped on by `viewer`.
    fn list_discoverable_users(&self, viewer: UserId) -> Result<Vec<User>, Self::Error>;

    fn user_stats(&self, id: UserId) -> Result<UserStats, Self::Error>;

    // ------------------------------------------------------------------
    // Swipes
    // ------------------------------------------------------------------

    /// Insert or overwrite the direction of the `(swiper, swipee)` edge.
    fn upsert_swipe(
        &self,
        swiper: UserId,
        swipee: UserId,
        direction: SwipeDirection,
        at: DateTime<Utc>,
    ) -> Result<(), Self::Error>;

    /// Whether `swipee` has swiped right on `swiper`.
    fn find_reciprocal_swipe(&self, swiper: UserId, swipee: UserId) -> Result<bool, Self::Error>;

    /// Swipes made by `swiper`, newest first.
    fn list_swipes_by_user(&self, swiper: UserId) -> Result<Vec<Swipe>, Self::Error>;

    // ------------------------------------------------------------------
    // Matches
    // ------------------------------------------------------------------

    /// Returns `true` if a row was created, `false` if one already existed.
    fn insert_match_if_absent(&self, pair: UserPair, at: DateTime<Utc>)
        -> Result<bool, Self::Error>;

    fn find_match(&self, pair: UserPair) -> Result<Option<Match>, Self::Error>;

    /// Matches involving `user`, newest first.
    fn list_matches_for_user(&self, user: UserId) -> Result<Vec<MatchSummary>, Self::Error>;

    fn delete_match(&self, pair: UserPair) -> Result<bool, Self::Error>;

    // ------------------------------------------------------------------
    // Conversations
    // ------------------------------------------------------------------

    fn find_conversation(&self, id: ConversationId) -> Result<Option<Conversation>, Self::Error>;

    /// Looks the pair up in either participant order.
    fn find_conversation_by_pair(&self, pair: UserPair)
        -> Result<Option<Conversation>, Self::Error>;

    /// Insert with the given participant order. Returns `None` when a
    /// conversation for the unordered pair already exists.
    fn insert_conversation(
        &self,
        user1: UserId,
        user2: UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<ConversationId>, Self::Error>;

    fn touch_conversation(&self, id: ConversationId, at: DateTime<Utc>)
        -> Result<(), Self::Error>;

    /// Per-conversation preview and unread count, by last activity
    /// descending.
    fn list_conversations_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<ConversationSummary>, Self::Error>;

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    /// Append an unread message.
    fn insert_message(
        &self,
        conversation: ConversationId,
        sender: UserId,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<Message, Self::Error>;

    /// Messages in creation order, flagged relative to `viewer`.
    fn list_messages_for_conversation(
        &self,
        conversation: ConversationId,
        viewer: UserId,
    ) -> Result<Vec<MessageView>, Self::Error>;

    /// Mark every message not sent by `reader` as read. Returns the number
    /// of rows that changed.
    fn mark_messages_read(
        &self,
        conversation: ConversationId,
        reader: UserId,
    ) -> Result<usize, Self::Error>;

    // ------------------------------------------------------------------
    // Moderation
    // ------------------------------------------------------------------

    /// Returns `false` if `blocker` already blocks `blocked`.
    fn insert_block(
        &self,
        blocker: UserId,
        blocked: UserId,
        reason: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<bool, Self::Error>;

    fn delete_block(&self, blocker: UserId, blocked: UserId) -> Result<bool, Self::Error>;

    fn is_blocked(&self, blocker: UserId, blocked: UserId) -> Result<bool, Self::Error>;

    fn list_blocked(&self, blocker: UserId) -> Result<Vec<BlockedUser>, Self::Error>;

    /// Whether `reporter` has a pending or reviewed report on `reported`.
    fn has_open_report(&self, reporter: UserId, reported: UserId) -> Result<bool, Self::Error>;

    fn insert_report(
        &self,
        reporter: UserId,
        reported: UserId,
        reason: ReportReason,
        description: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<i64, Self::Error>;

    fn list_reports(&self, reporter: UserId) -> Result<Vec<Report>, Self::Error>;

    /// Returns `false` when no such report exists.
    fn set_report_status(&self, id: i64, status: ReportStatus) -> Result<bool, Self::Error>;
}
