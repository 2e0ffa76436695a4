//! Daily check-in
//!
//! A check-in is refused locally once the status says today is done. The
//! status is refetched after every attempt, successful or not.

use super::{acquire, report, AppContext};
use crate::error::{ClientError, Result};
use crate::models::{CheckinRequest, CheckinStatus, Mood};
use crate::state::BusyFlag;
use parking_lot::Mutex;
use tracing::{info, warn};

const DEFAULT_QUOTE: &str = "Healthy every day!";

/// What a check-in attempt ended with
#[derive(Debug, Clone, PartialEq)]
pub enum CheckinOutcome {
    CheckedIn { message: String, quote: String },
    /// Backend says today was already done
    AlreadyDone { message: String },
}

pub struct CheckinController {
    ctx: AppContext,
    busy: BusyFlag,
    status: Mutex<Option<CheckinStatus>>,
}

impl CheckinController {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            busy: BusyFlag::new(),
            status: Mutex::new(None),
        }
    }

    pub fn status(&self) -> Option<CheckinStatus> {
        self.status.lock().clone()
    }

    pub fn can_check_in(&self) -> bool {
        !self.status.lock().as_ref().is_some_and(|s| s.checked_in_today) && !self.busy.is_busy()
    }

    pub async fn refresh(&self) -> Result<CheckinStatus> {
        let notifier = self.ctx.notifier.as_ref();
        let user_id = self
            .ctx
            .user_id()
            .map_err(|e| report(notifier, e, "Please log in first"))?;
        let status = self
            .ctx
            .api
            .checkin_status(&user_id)
            .await
            .map_err(|e| report(notifier, e, "Failed to load check-in status"))?;
        *self.status.lock() = Some(status.clone());
        Ok(status)
    }

    pub async fn check_in(&self, mood: Option<Mood>) -> Result<CheckinOutcome> {
        let notifier = self.ctx.notifier.as_ref();
        if self.status.lock().as_ref().is_some_and(|s| s.checked_in_today) {
            notifier.info("Already checked in today");
            return Err(ClientError::AlreadyCheckedIn);
        }
        let user_id = self
            .ctx
            .user_id()
            .map_err(|e| report(notifier, e, "Please log in first"))?;
        let _busy = acquire(&self.busy)?;

        let attempt = self
            .ctx
            .api
            .checkin(&CheckinRequest {
                user_id: user_id.clone(),
                mood,
            })
            .await;

        // refetched whatever the attempt returned; a failure here is not shown
        match self.ctx.api.checkin_status(&user_id).await {
            Ok(status) => *self.status.lock() = Some(status),
            Err(e) => warn!("check-in status refresh failed: {}", e),
        }

        let resp = attempt.map_err(|e| report(notifier, e, "Check-in failed"))?;
        let message = resp.message.unwrap_or_default();
        if resp.checked_in == Some(false) {
            let message = non_empty(message, "Already checked in today");
            notifier.info(&message);
            return Ok(CheckinOutcome::AlreadyDone { message });
        }

        let message = non_empty(message, "Check-in successful");
        info!("checked in with mood {:?}", mood.map(Mood::key));
        notifier.success(&message);
        Ok(CheckinOutcome::CheckedIn {
            message,
            quote: resp
                .quote
                .filter(|q| !q.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_QUOTE.to_string()),
        })
    }
}

fn non_empty(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::testing::offline_context;
    use crate::notify::NoticeLevel;

    #[tokio::test]
    async fn test_already_checked_in_makes_no_request() {
        let (ctx, notifier) = offline_context();
        ctx.session.set_session("ok", "alice").unwrap();
        let controller = ctx.checkin();
        *controller.status.lock() = Some(CheckinStatus {
            checked_in_today: true,
            total: 4,
            ..Default::default()
        });

        assert!(!controller.can_check_in());
        let err = controller.check_in(Some(Mood::Calm)).await.unwrap_err();
        assert!(matches!(err, ClientError::AlreadyCheckedIn));
        assert!(notifier.messages(NoticeLevel::Error).is_empty());
        assert_eq!(controller.status().unwrap().total, 4);
    }

    #[tokio::test]
    async fn test_check_in_requires_login() {
        let (ctx, _) = offline_context();
        let err = ctx.checkin().check_in(None).await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
    }
}
