/**
 * VIEW CONTROLLERS - Logic behind every page of the client
 *
 * Each controller owns its transient state and a busy flag. A submission:
 * 1. validates locally (no request on failure)
 * 2. raises the busy flag, or bails out with `ClientError::Busy`
 * 3. issues its API calls, the independent ones joined
 * 4. stores the result and reports the outcome once through the notifier
 *
 * The only state shared between controllers is the session store.
 */

pub mod assessment;
pub mod auth;
pub mod chat;
pub mod checkin;
pub mod dashboard;
pub mod guardian;
pub mod history;

pub use assessment::{AssessmentController, AssessmentForm, AssessmentResult, BmiCategory, Gender};
pub use auth::{AuthController, LoginForm, RegisterForm};
pub use chat::ChatController;
pub use checkin::{CheckinController, CheckinOutcome};
pub use dashboard::{Dashboard, DashboardEntry};
pub use guardian::{GuardianController, GuardianForm, GuardianView};
pub use history::HistoryController;

use crate::api::ApiGateway;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::monitor::LiveMonitor;
use crate::notify::Notifier;
use crate::routes::Router;
use crate::session::SessionStore;
use crate::state::{BusyFlag, BusyGuard};
use std::sync::Arc;
use tracing::debug;

/// Dependencies handed to every controller
#[derive(Clone)]
pub struct AppContext {
    pub api: Arc<ApiGateway>,
    pub session: SessionStore,
    pub router: Router,
    pub notifier: Arc<dyn Notifier>,
    pub config: ClientConfig,
}

impl AppContext {
    pub fn new(
        config: ClientConfig,
        session: SessionStore,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let api = Arc::new(ApiGateway::new(&config.backend)?);
        Ok(Self {
            api,
            router: Router::new(session.clone()),
            session,
            notifier,
            config,
        })
    }

    /// Session store and gateway built from the config file settings
    pub fn from_config(config: ClientConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let session = SessionStore::from_config(&config)?;
        Self::new(config, session, notifier)
    }

    /// Username of the logged-in user; a token is required too.
    pub fn user_id(&self) -> Result<String> {
        let session = self.session.get();
        if !session.is_authenticated() {
            return Err(ClientError::NotAuthenticated);
        }
        session
            .username
            .filter(|u| !u.is_empty())
            .ok_or(ClientError::NotAuthenticated)
    }

    pub fn auth(&self) -> AuthController {
        AuthController::new(self.clone())
    }

    pub fn assessment(&self) -> AssessmentController {
        AssessmentController::new(self.clone())
    }

    pub fn history(&self) -> HistoryController {
        HistoryController::new(self.clone())
    }

    pub fn checkin(&self) -> CheckinController {
        CheckinController::new(self.clone())
    }

    pub fn guardian(&self) -> GuardianController {
        GuardianController::new(self.clone())
    }

    pub fn chat(&self) -> ChatController {
        ChatController::new(self.clone())
    }

    pub fn dashboard(&self) -> Dashboard {
        Dashboard::new(self.clone())
    }

    pub fn monitor(&self) -> LiveMonitor<ApiGateway> {
        LiveMonitor::new(self.api.clone(), &self.config.monitor)
    }
}

pub(crate) fn acquire(busy: &BusyFlag) -> Result<BusyGuard> {
    busy.try_acquire().ok_or_else(|| {
        debug!("submission rejected, controller busy");
        ClientError::Busy
    })
}

/// Surfaces a failed submission once and hands the error back.
pub(crate) fn report(notifier: &dyn Notifier, err: ClientError, fallback: &str) -> ClientError {
    match &err {
        ClientError::Busy => {}
        ClientError::Validation { .. } => notifier.warning(&err.user_message(fallback)),
        _ => notifier.error(&err.user_message(fallback)),
    }
    err
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::config::BackendConfig;
    use crate::notify::RecordingNotifier;

    /// Context pointing at a closed port: any request that slips through
    /// fails as a transport error.
    pub fn offline_context() -> (AppContext, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let mut config = ClientConfig::default();
        config.backend = BackendConfig::with_origin("http://127.0.0.1:9");
        config.backend.timeout_secs = 1;
        let ctx = AppContext::new(config, SessionStore::in_memory(), notifier.clone()).unwrap();
        (ctx, notifier)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::offline_context;
    use super::*;

    #[test]
    fn test_user_id_needs_token_and_username() {
        let (ctx, _) = offline_context();
        assert!(matches!(ctx.user_id(), Err(ClientError::NotAuthenticated)));

        ctx.session.set_session("ok", "alice").unwrap();
        assert_eq!(ctx.user_id().unwrap(), "alice");
    }

    #[test]
    fn test_busy_rejection_is_not_notified() {
        let (ctx, notifier) = offline_context();
        let err = report(ctx.notifier.as_ref(), ClientError::Busy, "x");
        assert!(matches!(err, ClientError::Busy));
        assert!(notifier.notices().is_empty());
    }
}
