//! Route table and session guard
//!
//! Every navigation goes through [`RouteGuard`]: login and register always
//! render, every other view needs a session token, and unknown paths fall
//! back to the login page. The check is synchronous and never asks the
//! backend whether the token is still fresh.

use crate::session::{Session, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    Assessment,
    History,
    Monitor,
    Checkin,
    Guardian,
}

/// Page chrome around a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Bare,
    WithNav,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render { route: Route, layout: Layout },
    Redirect(Route),
}

impl Route {
    pub const ALL: [Route; 8] = [
        Route::Login,
        Route::Register,
        Route::Dashboard,
        Route::Assessment,
        Route::History,
        Route::Monitor,
        Route::Checkin,
        Route::Guardian,
    ];

    /// Entries of the navigation bar and the dashboard menu
    pub const MENU: [Route; 5] = [
        Route::Assessment,
        Route::Monitor,
        Route::History,
        Route::Checkin,
        Route::Guardian,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Dashboard => "/",
            Route::Assessment => "/form",
            Route::History => "/history",
            Route::Monitor => "/monitor",
            Route::Checkin => "/checkin",
            Route::Guardian => "/guardian",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Route::Login => "Login",
            Route::Register => "Register",
            Route::Dashboard => "Dashboard",
            Route::Assessment => "Health Assessment",
            Route::History => "Health History",
            Route::Monitor => "Real-time Monitor",
            Route::Checkin => "Daily Check-in",
            Route::Guardian => "Guardian",
        }
    }

    /// Query string, fragment and trailing slash are ignored.
    pub fn from_path(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default().trim();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        Route::ALL.into_iter().find(|r| r.path() == path)
    }

    pub fn requires_auth(self) -> bool {
        !matches!(self, Route::Login | Route::Register)
    }

    pub fn layout(self) -> Layout {
        match self {
            Route::Login | Route::Register | Route::Dashboard => Layout::Bare,
            _ => Layout::WithNav,
        }
    }
}

impl Layout {
    pub fn shows_nav(self) -> bool {
        matches!(self, Layout::WithNav)
    }

    /// Wraps a rendered view body with the chrome of this layout.
    pub fn wrap(self, current: Route, body: String) -> String {
        if !self.shows_nav() {
            return body;
        }
        let nav = Route::MENU
            .iter()
            .map(|r| {
                if *r == current {
                    format!("[{}]", r.title())
                } else {
                    r.title().to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" | ");
        format!("{}\n{}\n{}", nav, "-".repeat(nav.chars().count()), body)
    }
}

pub struct RouteGuard;

impl RouteGuard {
    pub fn check(route: Route, session: &Session) -> Navigation {
        if route.requires_auth() && !session.is_authenticated() {
            return Navigation::Redirect(Route::Login);
        }
        Navigation::Render {
            route,
            layout: route.layout(),
        }
    }

    pub fn resolve(path: &str, session: &Session) -> Navigation {
        match Route::from_path(path) {
            Some(route) => Self::check(route, session),
            None => Navigation::Redirect(Route::Login),
        }
    }
}

/// Navigation bound to a session store; re-reads the session on every call.
#[derive(Debug, Clone)]
pub struct Router {
    session: SessionStore,
}

impl Router {
    pub fn new(session: SessionStore) -> Self {
        Self { session }
    }

    pub fn navigate(&self, path: &str) -> Navigation {
        let nav = RouteGuard::resolve(path, &self.session.get());
        tracing::debug!("navigate {} -> {:?}", path, nav);
        nav
    }

    pub fn open(&self, route: Route) -> Navigation {
        RouteGuard::check(route, &self.session.get())
    }
}
