//! # cupid-core
//!
//! The swipe/match/conversation engine. Turns directed swipes into
//! symmetric matches, gates conversations and messages on match state and
//! tracks read state per message.
//!
//! Engines hold a borrowed [`Gateway`] and are cheap to construct per
//! request. None of them keep in-process locks: correctness under
//! concurrent requests rests on the gateway's atomic upsert and
//! unique-constraint semantics.

pub mod accounts;
pub mod conversations;
pub mod discovery;
pub mod gateway;
pub mod matches;
pub mod messages;
pub mod moderation;
pub mod swipes;

pub use accounts::Accounts;
pub use conversations::ConversationManager;
pub use discovery::Discovery;
pub use gateway::Gateway;
pub use matches::MatchRegistry;
pub use messages::MessageStore;
pub use moderation::Moderation;
pub use swipes::SwipeEngine;
