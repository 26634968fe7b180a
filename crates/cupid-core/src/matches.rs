//! Match Registry: canonical storage of symmetric match relationships.

use chrono::Utc;
use tracing::{debug, info};

use cupid_shared::models::MatchSummary;
use cupid_shared::{CoreError, CoreResult, UserId, UserPair};

use crate::gateway::Gateway;

pub struct MatchRegistry<'a, G: ?Sized> {
    gateway: &'a G,
}

impl<'a, G: Gateway + ?Sized> MatchRegistry<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }

    /// Create the match for `pair` unless it already exists.
    ///
    /// A duplicate is a successful no-op. Returns whether this call created
    /// the row.
    pub fn create_match_if_absent(&self, pair: UserPair) -> CoreResult<bool> {
        let created = self
            .gateway
            .insert_match_if_absent(pair, Utc::now())
            .map_err(CoreError::internal)?;

        if created {
            info!(user_lo = %pair.lo(), user_hi = %pair.hi(), "Match created");
        } else {
            debug!(user_lo = %pair.lo(), user_hi = %pair.hi(), "Match already present");
        }
        Ok(created)
    }

    pub fn is_matched(&self, a: UserId, b: UserId) -> CoreResult<bool> {
        let pair = UserPair::new(a, b)?;
        let found = self.gateway.find_match(pair).map_err(CoreError::internal)?;
        Ok(found.is_some())
    }

    /// Matches of `user`, newest first, with the other participant's name
    /// and photo.
    pub fn list_matches(&self, user: UserId) -> CoreResult<Vec<MatchSummary>> {
        self.gateway
            .list_matches_for_user(user)
            .map_err(CoreError::internal)
    }

    /// Remove the match for `pair`. Only moderation calls this; swipes never
    /// unmatch.
    pub fn remove_match(&self, pair: UserPair) -> CoreResult<bool> {
        let removed = self.gateway.delete_match(pair).map_err(CoreError::internal)?;
        if removed {
            info!(user_lo = %pair.lo(), user_hi = %pair.hi(), "Match removed");
        }
        Ok(removed)
    }
}
