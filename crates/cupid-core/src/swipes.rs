//! Swipe Engine: records directed swipes and detects mutual right-swipes.

use chrono::Utc;
use tracing::{debug, info};

use cupid_shared::models::{Swipe, SwipeOutcome};
use cupid_shared::{CoreError, CoreResult, SwipeDirection, UserId, UserPair};

use crate::gateway::Gateway;
use crate::matches::MatchRegistry;

pub struct SwipeEngine<'a, G: ?Sized> {
    gateway: &'a G,
}

impl<'a, G: Gateway + ?Sized> SwipeEngine<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }

    /// Record `swiper`'s swipe on `swipee`, overwriting any earlier
    /// direction for that ordered pair.
    ///
    /// A right swipe answered by an existing right swipe the other way
    /// creates the match synchronously and reports `matched: true`. Left
    /// swipes never match and never remove an existing match.
    pub fn record_swipe(
        &self,
        swiper: UserId,
        swipee: UserId,
        direction: SwipeDirection,
    ) -> CoreResult<SwipeOutcome> {
        let pair = UserPair::new(swiper, swipee)?;

        if self
            .gateway
            .find_user(swipee)
            .map_err(CoreError::internal)?
            .is_none()
        {
            return Err(CoreError::NotFound(format!("user {swipee}")));
        }

        self.gateway
            .upsert_swipe(swiper, swipee, direction, Utc::now())
            .map_err(CoreError::internal)?;

        debug!(swiper = %swiper, swipee = %swipee, %direction, "Swipe recorded");

        if direction == SwipeDirection::Left {
            return Ok(SwipeOutcome { matched: false });
        }

        let reciprocal = self
            .gateway
            .find_reciprocal_swipe(swiper, swipee)
            .map_err(CoreError::internal)?;
        if !reciprocal {
            return Ok(SwipeOutcome { matched: false });
        }

        if self.blocked_either_way(swiper, swipee)? {
            info!(swiper = %swiper, swipee = %swipee, "Mutual swipe suppressed by block");
            return Ok(SwipeOutcome { matched: false });
        }

        MatchRegistry::new(self.gateway).create_match_if_absent(pair)?;
        Ok(SwipeOutcome { matched: true })
    }

    /// Swipes made by `user`, newest first.
    pub fn swipe_history(&self, user: UserId) -> CoreResult<Vec<Swipe>> {
        self.gateway
            .list_swipes_by_user(user)
            .map_err(CoreError::internal)
    }

    fn blocked_either_way(&self, a: UserId, b: UserId) -> CoreResult<bool> {
        Ok(self.gateway.is_blocked(a, b).map_err(CoreError::internal)?
            || self.gateway.is_blocked(b, a).map_err(CoreError::internal)?)
    }
}
