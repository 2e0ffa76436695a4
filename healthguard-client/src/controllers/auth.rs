//! Login, registration and logout

use super::{acquire, report, AppContext};
use crate::error::{ClientError, Result};
use crate::models::Credentials;
use crate::routes::{Navigation, Route};
use crate::state::BusyFlag;
use tracing::info;

/// Token stored on login; the backend hands out no real token.
pub const SESSION_TOKEN: &str = "ok";

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub confirm: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<Credentials> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(ClientError::validation("username", "please enter your username"));
        }
        if self.password.is_empty() {
            return Err(ClientError::validation("password", "please enter your password"));
        }
        Ok(Credentials {
            username: username.to_string(),
            password: self.password.clone(),
        })
    }
}

impl RegisterForm {
    pub fn validate(&self) -> Result<Credentials> {
        let username = self.username.trim();
        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(ClientError::validation(
                "username",
                format!("must be at least {} characters", MIN_USERNAME_LEN),
            ));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ClientError::validation(
                "password",
                format!("must be at least {} characters", MIN_PASSWORD_LEN),
            ));
        }
        if self.confirm != self.password {
            return Err(ClientError::validation("confirm", "passwords do not match"));
        }
        Ok(Credentials {
            username: username.to_string(),
            password: self.password.clone(),
        })
    }
}

pub struct AuthController {
    ctx: AppContext,
    busy: BusyFlag,
}

impl AuthController {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            busy: BusyFlag::new(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// On success the session is stored and the user lands on the
    /// assessment view.
    pub async fn login(&self, form: &LoginForm) -> Result<Navigation> {
        let notifier = self.ctx.notifier.as_ref();
        let credentials = form
            .validate()
            .map_err(|e| report(notifier, e, "Invalid input"))?;
        let _busy = acquire(&self.busy)?;

        match self.ctx.api.login(&credentials).await {
            Ok(_) => {
                self.ctx
                    .session
                    .set_session(SESSION_TOKEN, credentials.username.as_str())
                    .map_err(|e| report(notifier, e.into(), "Could not store the session"))?;
                info!("user {} logged in", credentials.username);
                notifier.success("Login successful");
                Ok(self.ctx.router.open(Route::Assessment))
            }
            Err(e) => Err(report(notifier, e, "Invalid username or password")),
        }
    }

    pub async fn register(&self, form: &RegisterForm) -> Result<Navigation> {
        let notifier = self.ctx.notifier.as_ref();
        let credentials = form
            .validate()
            .map_err(|e| report(notifier, e, "Invalid input"))?;
        let _busy = acquire(&self.busy)?;

        match self.ctx.api.register(&credentials).await {
            Ok(_) => {
                info!("user {} registered", credentials.username);
                notifier.success("Registration successful, please log in");
                Ok(self.ctx.router.open(Route::Login))
            }
            Err(e) => Err(report(notifier, e, "Registration failed")),
        }
    }

    pub fn logout(&self) -> Result<Navigation> {
        let notifier = self.ctx.notifier.as_ref();
        self.ctx
            .session
            .clear()
            .map_err(|e| report(notifier, e.into(), "Logout failed"))?;
        notifier.info("Logged out");
        Ok(self.ctx.router.open(Route::Login))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::testing::offline_context;
    use crate::notify::NoticeLevel;

    #[tokio::test]
    async fn test_missing_password_makes_no_request() {
        let (ctx, notifier) = offline_context();
        let form = LoginForm {
            username: "alice".into(),
            password: String::new(),
        };
        let err = ctx.auth().login(&form).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation { field: "password", .. }));
        // a request to the offline backend would have been a transport error
        assert!(notifier.messages(NoticeLevel::Error).is_empty());
        assert!(!ctx.session.get().is_authenticated());
    }

    #[test]
    fn test_register_rules() {
        let form = |u: &str, p: &str, c: &str| RegisterForm {
            username: u.into(),
            password: p.into(),
            confirm: c.into(),
        };
        assert!(form("al", "secret123", "secret123").validate().is_err());
        assert!(form("alice", "short", "short").validate().is_err());
        assert!(matches!(
            form("alice", "secret123", "secret124").validate(),
            Err(ClientError::Validation { field: "confirm", .. })
        ));
        assert_eq!(
            form(" alice ", "secret123", "secret123").validate().unwrap().username,
            "alice"
        );
    }

    #[tokio::test]
    async fn test_login_transport_failure_uses_generic_notice() {
        let (ctx, notifier) = offline_context();
        let form = LoginForm {
            username: "alice".into(),
            password: "secret123".into(),
        };
        assert!(ctx.auth().login(&form).await.is_err());
        assert_eq!(
            notifier.messages(NoticeLevel::Error),
            vec![crate::error::CONNECTION_FAILED.to_string()]
        );
    }

    #[test]
    fn test_logout_clears_session() {
        let (ctx, _) = offline_context();
        ctx.session.set_session("ok", "alice").unwrap();
        let nav = ctx.auth().logout().unwrap();
        assert!(matches!(nav, Navigation::Render { route: Route::Login, .. }));
        assert!(!ctx.session.get().is_authenticated());
    }
}
