//! Guardian alert settings and alert log

use super::{acquire, report, AppContext};
use crate::error::{ClientError, Result};
use crate::models::{GuardianConfig, GuardianLog, GuardianSaveRequest, TriggerRequest};
use crate::state::BusyFlag;
use parking_lot::Mutex;
use tracing::info;

pub const TEST_ALERT_TYPE: &str = "manual test";
pub const TEST_ALERT_VALUE: &str = "Test OK";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuardianView {
    pub config: GuardianConfig,
    pub logs: Vec<GuardianLog>,
}

/// Editable settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuardianForm {
    pub enabled: bool,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub threshold_hr_high: Option<u32>,
    pub threshold_bp_sys: Option<u32>,
}

impl From<&GuardianConfig> for GuardianForm {
    fn from(config: &GuardianConfig) -> Self {
        Self {
            enabled: config.enabled,
            contact_name: config.contact_name.clone().unwrap_or_default(),
            contact_email: config.contact_email.clone().unwrap_or_default(),
            contact_phone: config.contact_phone.clone().unwrap_or_default(),
            threshold_hr_high: config.threshold_hr_high,
            threshold_bp_sys: config.threshold_bp_sys,
        }
    }
}

impl GuardianForm {
    pub fn validate(&self) -> Result<GuardianConfig> {
        let name = self.contact_name.trim();
        if name.is_empty() {
            return Err(ClientError::validation("contact_name", "required"));
        }
        let email = self.contact_email.trim();
        if !is_valid_email(email) {
            return Err(ClientError::validation("contact_email", "not a valid email address"));
        }
        if self.threshold_hr_high == Some(0) {
            return Err(ClientError::validation("threshold_hr_high", "must be positive"));
        }
        if self.threshold_bp_sys == Some(0) {
            return Err(ClientError::validation("threshold_bp_sys", "must be positive"));
        }

        let phone = self.contact_phone.trim();
        Ok(GuardianConfig {
            enabled: self.enabled,
            contact_name: Some(name.to_string()),
            contact_email: Some(email.to_string()),
            contact_phone: (!phone.is_empty()).then(|| phone.to_string()),
            threshold_hr_high: self.threshold_hr_high,
            threshold_bp_sys: self.threshold_bp_sys,
        })
    }
}

/// `local@domain.tld`, no whitespace
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}

pub struct GuardianController {
    ctx: AppContext,
    busy: BusyFlag,
    view: Mutex<GuardianView>,
}

impl GuardianController {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            busy: BusyFlag::new(),
            view: Mutex::new(GuardianView::default()),
        }
    }

    pub fn view(&self) -> GuardianView {
        self.view.lock().clone()
    }

    /// Config and logs, fetched together
    pub async fn load(&self) -> Result<GuardianView> {
        let notifier = self.ctx.notifier.as_ref();
        let user_id = self
            .ctx
            .user_id()
            .map_err(|e| report(notifier, e, "Please log in first"))?;
        let api = &self.ctx.api;
        let (config, logs) = futures::try_join!(api.guardian_config(&user_id), api.guardian_logs(&user_id))
            .map_err(|e| report(notifier, e, "Failed to load guardian settings"))?;

        let view = GuardianView { config, logs };
        *self.view.lock() = view.clone();
        Ok(view)
    }

    /// Saves the settings and returns what the backend holds afterwards.
    pub async fn save(&self, form: &GuardianForm) -> Result<GuardianView> {
        let notifier = self.ctx.notifier.as_ref();
        let config = form
            .validate()
            .map_err(|e| report(notifier, e, "Save failed, please check your input"))?;
        let user_id = self
            .ctx
            .user_id()
            .map_err(|e| report(notifier, e, "Please log in first"))?;

        {
            let _busy = acquire(&self.busy)?;
            self.ctx
                .api
                .save_guardian_config(&GuardianSaveRequest { user_id, config })
                .await
                .map_err(|e| report(notifier, e, "Save failed, please check your input"))?;
        }
        info!("guardian settings saved");
        notifier.success("Guardian settings saved");
        self.load().await
    }

    pub async fn send_test_alert(&self) -> Result<GuardianView> {
        let notifier = self.ctx.notifier.as_ref();
        let user_id = self
            .ctx
            .user_id()
            .map_err(|e| report(notifier, e, "Please log in first"))?;

        {
            let _busy = acquire(&self.busy)?;
            self.ctx
                .api
                .trigger_guardian_alert(&TriggerRequest {
                    user_id,
                    alert_type: TEST_ALERT_TYPE.to_string(),
                    value: TEST_ALERT_VALUE.to_string(),
                })
                .await
                .map_err(|e| report(notifier, e, "Sending failed"))?;
        }
        notifier.success("Test alert sent, check the log");
        self.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::testing::offline_context;
    use crate::notify::NoticeLevel;

    fn form() -> GuardianForm {
        GuardianForm {
            enabled: true,
            contact_name: "Bob".into(),
            contact_email: "bob@example.com".into(),
            contact_phone: String::new(),
            threshold_hr_high: Some(120),
            threshold_bp_sys: Some(160),
        }
    }

    #[test]
    fn test_email_syntax() {
        assert!(is_valid_email("bob@example.com"));
        assert!(is_valid_email("a.b+c@mail.example.org"));
        assert!(!is_valid_email("bob"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("bob@example"));
        assert!(!is_valid_email("bob@@example.com"));
        assert!(!is_valid_email("bob @example.com"));
        assert!(!is_valid_email("bob@example."));
    }

    #[test]
    fn test_form_validation() {
        let config = form().validate().unwrap();
        assert_eq!(config.contact_phone, None);
        assert_eq!(config.threshold_hr_high, Some(120));

        let mut f = form();
        f.contact_name = "  ".into();
        assert!(matches!(f.validate(), Err(ClientError::Validation { field: "contact_name", .. })));

        let mut f = form();
        f.threshold_bp_sys = Some(0);
        assert!(matches!(f.validate(), Err(ClientError::Validation { field: "threshold_bp_sys", .. })));
    }

    #[test]
    fn test_form_from_config_round_trip() {
        let config = form().validate().unwrap();
        assert_eq!(GuardianForm::from(&config), form());
    }

    #[tokio::test]
    async fn test_invalid_email_makes_no_request() {
        let (ctx, notifier) = offline_context();
        ctx.session.set_session("ok", "alice").unwrap();
        let mut f = form();
        f.contact_email = "not-an-email".into();

        let err = ctx.guardian().save(&f).await.unwrap_err();
        assert!(err.is_validation());
        assert!(notifier.messages(NoticeLevel::Error).is_empty());
    }
}
