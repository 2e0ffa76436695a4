//! Landing page: greeting and feature menu

use super::AppContext;
use crate::routes::{Navigation, Route};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardEntry {
    pub route: Route,
    pub title: &'static str,
    pub description: &'static str,
}

pub struct Dashboard {
    ctx: AppContext,
}

impl Dashboard {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    pub fn greeting(&self) -> String {
        match self.ctx.session.username() {
            Some(name) if !name.is_empty() => format!("Welcome back, {}", name),
            _ => "Welcome back".to_string(),
        }
    }

    pub fn entries(&self) -> Vec<DashboardEntry> {
        Route::MENU
            .into_iter()
            .map(|route| DashboardEntry {
                route,
                title: route.title(),
                description: describe(route),
            })
            .collect()
    }

    /// Goes through the route guard like any other navigation.
    pub fn open(&self, route: Route) -> Navigation {
        self.ctx.router.open(route)
    }
}

fn describe(route: Route) -> &'static str {
    match route {
        Route::Assessment => "Diabetes and heart risk with AI advice",
        Route::Monitor => "Live vital signs from the connected device",
        Route::History => "Past assessments",
        Route::Checkin => "Daily check-in and streak",
        Route::Guardian => "Emergency contact and alert thresholds",
        Route::Login | Route::Register | Route::Dashboard => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::testing::offline_context;

    #[test]
    fn test_menu_and_greeting() {
        let (ctx, _) = offline_context();
        ctx.session.set_session("ok", "alice").unwrap();
        let dashboard = ctx.dashboard();

        assert_eq!(dashboard.greeting(), "Welcome back, alice");
        let routes: Vec<Route> = dashboard.entries().iter().map(|e| e.route).collect();
        assert_eq!(
            routes,
            vec![Route::Assessment, Route::Monitor, Route::History, Route::Checkin, Route::Guardian]
        );
        assert!(dashboard.entries().iter().all(|e| !e.description.is_empty()));
    }

    #[test]
    fn test_entries_still_guarded() {
        let (ctx, _) = offline_context();
        assert_eq!(ctx.dashboard().open(Route::Monitor), Navigation::Redirect(Route::Login));
    }
}
