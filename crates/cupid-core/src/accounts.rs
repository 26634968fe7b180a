use tracing::info;

use cupid_shared::models::UserStats;
use cupid_shared::{CoreError, CoreResult, UserId};

use crate::gateway::Gateway;

/// Account-level switches the core cares about.
pub struct Accounts<'a, G: ?Sized> {
    gateway: &'a G,
}

impl<'a, G: Gateway + ?Sized> Accounts<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }

    /// Hide `user` from discovery. Existing matches and conversations are
    /// untouched.
    pub fn pause(&self, user: UserId) -> CoreResult<()> {
        self.set_paused(user, true)?;
        info!(user = %user, "Account paused");
        Ok(())
    }

    pub fn reactivate(&self, user: UserId) -> CoreResult<()> {
        self.set_paused(user, false)?;
        info!(user = %user, "Account reactivated");
        Ok(())
    }

    pub fn stats(&self, user: UserId) -> CoreResult<UserStats> {
        self.gateway.user_stats(user).map_err(CoreError::internal)
    }

    fn set_paused(&self, user: UserId, paused: bool) -> CoreResult<()> {
        let updated = self
            .gateway
            .set_account_paused(user, paused)
            .map_err(CoreError::internal)?;
        if !updated {
            return Err(CoreError::NotFound(format!("user {user}")));
        }
        Ok(())
    }
}
