//! Sub-command handlers
//!
//! Each handler opens its view through the route guard first, then drives
//! the matching controller. Controller failures are already shown to the
//! user by the notifier, so they travel up wrapped in [`Reported`] and main
//! only sets the exit code.

pub mod account;
pub mod assess;
pub mod chat;
pub mod checkin;
pub mod config;
pub mod guardian;
pub mod history;
pub mod monitor;

use crate::display;
use colored::*;
use healthguard_client::{AppContext, ClientError, Navigation, Route};
use std::fmt;

#[derive(Debug)]
pub struct Reported(pub ClientError);

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for Reported {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

pub trait Shown<T> {
    /// Marks a controller error as already displayed
    fn shown(self) -> anyhow::Result<T>;
}

impl<T> Shown<T> for healthguard_client::Result<T> {
    fn shown(self) -> anyhow::Result<T> {
        self.map_err(|e| Reported(e).into())
    }
}

/// Route guard check before a view runs. Prints the nav bar of the view's
/// layout; `false` when the guard redirected.
pub fn enter(ctx: &AppContext, route: Route) -> bool {
    follow(ctx.router.open(route))
}

pub fn follow(nav: Navigation) -> bool {
    match nav {
        Navigation::Render { route, layout } => {
            if layout.shows_nav() {
                println!();
                println!("{}", layout.wrap(route, String::new()).bright_black());
            }
            true
        }
        Navigation::Redirect(Route::Login) => {
            display::warning("Please log in first: healthguard login");
            false
        }
        Navigation::Redirect(route) => {
            display::info(&format!("Redirected to {}", route.path()));
            false
        }
    }
}

/// Where a finished login/register/logout sends the user next
pub fn next_step(nav: Navigation) {
    let route = match nav {
        Navigation::Render { route, .. } | Navigation::Redirect(route) => route,
    };
    let hint = match route {
        Route::Login => "healthguard login",
        Route::Register => "healthguard register",
        Route::Dashboard => "healthguard dashboard",
        Route::Assessment => "healthguard assess",
        Route::History => "healthguard history list",
        Route::Monitor => "healthguard monitor",
        Route::Checkin => "healthguard checkin status",
        Route::Guardian => "healthguard guardian show",
    };
    display::info(&format!("Next: {} ({})", route.title(), hint.bright_cyan()));
}

#[cfg(test)]
pub(crate) mod testing {
    use healthguard_client::config::BackendConfig;
    use healthguard_client::{AppContext, ClientConfig, RecordingNotifier, SessionStore};
    use healthguard_devkit::TestHarness;
    use std::sync::Arc;

    /// Context pointed at a fresh mock backend, logged in as alice
    pub async fn logged_in() -> (TestHarness, AppContext, Arc<RecordingNotifier>) {
        let harness = TestHarness::start().await.unwrap();
        let mut config = ClientConfig::default();
        config.backend = BackendConfig::with_origin(harness.origin());
        config.backend.timeout_secs = 5;
        let notifier = Arc::new(RecordingNotifier::new());
        let ctx = AppContext::new(config, SessionStore::in_memory(), notifier.clone()).unwrap();
        ctx.session.set_session("ok", "alice").unwrap();
        (harness, ctx, notifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use healthguard_client::Layout;

    #[test]
    fn test_follow() {
        assert!(follow(Navigation::Render {
            route: Route::Monitor,
            layout: Layout::WithNav,
        }));
        assert!(!follow(Navigation::Redirect(Route::Login)));
    }

    #[test]
    fn test_shown_wraps_client_errors() {
        let result: healthguard_client::Result<()> = Err(ClientError::Busy);
        let err = result.shown().unwrap_err();
        assert!(err.is::<Reported>());
        assert_eq!(err.to_string(), "a request is already in progress");
    }
}
