//! Typed entity records exchanged between the engines, the persistence
//! gateway and the transport layer.
//!
//! Records that leave the process serialise in camelCase, matching the
//! JSON shapes of the HTTP and realtime APIs.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_AVATAR;
use crate::error::CoreError;
use crate::types::{ConversationId, MatchId, MessageId, SwipeDirection, UserId};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A user as seen by the core. Owned by the profile subsystem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Relative path or URL of the profile photo.
    pub photo_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Paused accounts are hidden from discovery.
    pub account_paused: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary::new(self.id, self.name.clone(), self.photo_url.clone())
    }
}

/// The "other participant" shape embedded in match and conversation lists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub avatar: String,
}

impl UserSummary {
    pub fn new(id: UserId, name: String, photo_url: Option<String>) -> Self {
        Self {
            id,
            name,
            avatar: photo_url.unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Swipe
// ---------------------------------------------------------------------------

/// A directed preference edge. Unique per `(swiper_id, swipee_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Swipe {
    pub swiper_id: UserId,
    pub swipee_id: UserId,
    pub direction: SwipeDirection,
    /// Time of the most recent swipe for this ordered pair.
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SwipeOutcome {
    pub matched: bool,
}

// ---------------------------------------------------------------------------
// Match
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,
    pub user_lo: UserId,
    pub user_hi: UserId,
    pub matched_at: DateTime<Utc>,
}

/// One entry of a user's match list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub match_id: MatchId,
    pub other_user: UserSummary,
    pub matched_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// A thread between exactly one unordered pair of users.
///
/// `user1_id`/`user2_id` keep the order of the call that created the row;
/// lookups never depend on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    pub user1_id: UserId,
    pub user2_id: UserId,
    pub created_at: DateTime<Utc>,
    /// Last activity, bumped on every new message.
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn has_participant(&self, user: UserId) -> bool {
        self.user1_id == user || self.user2_id == user
    }

    pub fn other_participant(&self, user: UserId) -> Option<UserId> {
        if user == self.user1_id {
            Some(self.user2_id)
        } else if user == self.user2_id {
            Some(self.user1_id)
        } else {
            None
        }
    }
}

/// One entry of a user's conversation list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub conversation_id: ConversationId,
    pub other_user: UserSummary,
    pub last_message: Option<String>,
    pub last_message_time: Option<DateTime<Utc>>,
    /// Messages sent by the other participant and not yet read.
    pub unread_count: u32,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A stored message. Append-only apart from the read flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

/// A message as listed to one of the participants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: MessageId,
    pub text: String,
    pub sender_id: UserId,
    pub sender_name: String,
    pub created_at: DateTime<Utc>,
    pub is_me: bool,
}

/// Result of a successful send, carrying what the notifier needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SentMessage {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub text: String,
    pub sender_id: UserId,
    pub sender_name: String,
    pub receiver_id: UserId,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Moderation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlockedUser {
    pub user: UserSummary,
    pub reason: Option<String>,
    pub blocked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReportReason {
    InappropriateBehavior,
    FakeProfile,
    Harassment,
    Spam,
    InappropriatePhotos,
    Other,
}

impl ReportReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportReason::InappropriateBehavior => "inappropriate_behavior",
            ReportReason::FakeProfile => "fake_profile",
            ReportReason::Harassment => "harassment",
            ReportReason::Spam => "spam",
            ReportReason::InappropriatePhotos => "inappropriate_photos",
            ReportReason::Other => "other",
        }
    }
}

impl fmt::Display for ReportReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportReason {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inappropriate_behavior" => Ok(ReportReason::InappropriateBehavior),
            "fake_profile" => Ok(ReportReason::FakeProfile),
            "harassment" => Ok(ReportReason::Harassment),
            "spam" => Ok(ReportReason::Spam),
            "inappropriate_photos" => Ok(ReportReason::InappropriatePhotos),
            "other" => Ok(ReportReason::Other),
            other => Err(CoreError::InvalidInput(format!(
                "invalid report reason: {other}"
            ))),
        }
    }
}

/// Review state of a report. Pending and reviewed reports are "open".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Reviewed,
    Resolved,
    Dismissed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Reviewed => "reviewed",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Dismissed => "dismissed",
        }
    }
}

impl FromStr for ReportStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReportStatus::Pending),
            "reviewed" => Ok(ReportStatus::Reviewed),
            "resolved" => Ok(ReportStatus::Resolved),
            "dismissed" => Ok(ReportStatus::Dismissed),
            other => Err(CoreError::Internal(format!("unknown report status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: i64,
    pub reported_id: UserId,
    pub reported_name: String,
    pub reason: ReportReason,
    pub description: Option<String>,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Discovery & account
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NearbyUser {
    #[serde(flatten)]
    pub user: UserSummary,
    pub distance_km: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub matches: u32,
    pub conversations: u32,
    pub messages_sent: u32,
}
