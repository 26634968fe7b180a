//! Blocking and reporting.
//!
//! A block removes the pair's match. The conversation and its history are
//! kept, but sends fail with `NotMatched` from then on, and a later mutual
//! right-swipe does not re-create the match while the block stands.

use chrono::Utc;
use tracing::info;

use cupid_shared::constants::MAX_REASON_LEN;
use cupid_shared::models::{BlockedUser, Report, ReportReason, ReportStatus};
use cupid_shared::{CoreError, CoreResult, UserId, UserPair};

use crate::gateway::Gateway;
use crate::matches::MatchRegistry;

pub struct Moderation<'a, G: ?Sized> {
    gateway: &'a G,
}

impl<'a, G: Gateway + ?Sized> Moderation<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }

    pub fn block_user(
        &self,
        blocker: UserId,
        blocked: UserId,
        reason: Option<&str>,
    ) -> CoreResult<()> {
        let pair = UserPair::new(blocker, blocked)
            .map_err(|_| CoreError::InvalidInput("you cannot block yourself".into()))?;
        let reason = normalise_optional_text(reason)?;
        self.require_user(blocked)?;

        let inserted = self
            .gateway
            .insert_block(blocker, blocked, reason, Utc::now())
            .map_err(CoreError::internal)?;
        if !inserted {
            return Err(CoreError::InvalidInput("user is already blocked".into()));
        }

        MatchRegistry::new(self.gateway).remove_match(pair)?;
        info!(blocker = %blocker, blocked = %blocked, "User blocked");
        Ok(())
    }

    pub fn unblock_user(&self, blocker: UserId, blocked: UserId) -> CoreResult<()> {
        let removed = self
            .gateway
            .delete_block(blocker, blocked)
            .map_err(CoreError::internal)?;
        if !removed {
            return Err(CoreError::NotFound("block record".into()));
        }
        info!(blocker = %blocker, blocked = %blocked, "User unblocked");
        Ok(())
    }

    pub fn list_blocked(&self, blocker: UserId) -> CoreResult<Vec<BlockedUser>> {
        self.gateway.list_blocked(blocker).map_err(CoreError::internal)
    }

    pub fn is_blocked(&self, blocker: UserId, other: UserId) -> CoreResult<bool> {
        self.gateway
            .is_blocked(blocker, other)
            .map_err(CoreError::internal)
    }

    /// File a report. Only one open (pending or reviewed) report per
    /// reporter and target.
    pub fn report_user(
        &self,
        reporter: UserId,
        reported: UserId,
        reason: ReportReason,
        description: Option<&str>,
    ) -> CoreResult<i64> {
        if reporter == reported {
            return Err(CoreError::InvalidInput("you cannot report yourself".into()));
        }
        let description = normalise_optional_text(description)?;
        self.require_user(reported)?;

        if self
            .gateway
            .has_open_report(reporter, reported)
            .map_err(CoreError::internal)?
        {
            return Err(CoreError::InvalidInput(
                "you have already reported this user".into(),
            ));
        }

        let id = self
            .gateway
            .insert_report(reporter, reported, reason, description, Utc::now())
            .map_err(CoreError::internal)?;
        info!(report = id, reporter = %reporter, reported = %reported, %reason, "User reported");
        Ok(id)
    }

    pub fn list_reports(&self, reporter: UserId) -> CoreResult<Vec<Report>> {
        self.gateway.list_reports(reporter).map_err(CoreError::internal)
    }

    /// Move a report to a new review state.
    pub fn review_report(&self, id: i64, status: ReportStatus) -> CoreResult<()> {
        let updated = self
            .gateway
            .set_report_status(id, status)
            .map_err(CoreError::internal)?;
        if !updated {
            return Err(CoreError::NotFound(format!("report {id}")));
        }
        info!(report = id, status = status.as_str(), "Report reviewed");
        Ok(())
    }

    fn require_user(&self, id: UserId) -> CoreResult<()> {
        match self.gateway.find_user(id).map_err(CoreError::internal)? {
            Some(_) => Ok(()),
            None => Err(CoreError::NotFound(format!("user {id}"))),
        }
    }
}

fn normalise_optional_text(text: Option<&str>) -> CoreResult<Option<&str>> {
    let text = text.map(str::trim).filter(|t| !t.is_empty());
    if let Some(t) = text {
        if t.chars().count() > MAX_REASON_LEN {
            return Err(CoreError::InvalidInput(format!(
                "text exceeds {MAX_REASON_LEN} characters"
            )));
        }
    }
    Ok(text)
}
