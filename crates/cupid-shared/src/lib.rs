//! Types shared by every Cupid crate: identifiers, entity records, the
//! error taxonomy of the match/conversation core and the realtime wire
//! protocol.

pub mod constants;
pub mod error;
pub mod models;
pub mod protocol;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use types::{ConversationId, MatchId, MessageId, SessionId, SwipeDirection, UserId, UserPair};
