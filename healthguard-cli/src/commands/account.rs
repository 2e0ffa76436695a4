//! Login, registration and navigation

use super::{enter, follow, next_step, Shown};
use crate::{display, wizard};
use anyhow::Result;
use healthguard_client::{AppContext, Route};

pub async fn login(ctx: &AppContext, username: Option<String>, password: Option<String>) -> Result<()> {
    if !follow(ctx.router.open(Route::Login)) {
        return Ok(());
    }
    let form = wizard::login_form(username, password)?;
    let nav = ctx.auth().login(&form).await.shown()?;
    next_step(nav);
    Ok(())
}

pub async fn register(ctx: &AppContext, username: Option<String>, password: Option<String>) -> Result<()> {
    if !follow(ctx.router.open(Route::Register)) {
        return Ok(());
    }
    let form = wizard::register_form(username, password)?;
    let nav = ctx.auth().register(&form).await.shown()?;
    next_step(nav);
    Ok(())
}

pub fn logout(ctx: &AppContext) -> Result<()> {
    let nav = ctx.auth().logout().shown()?;
    next_step(nav);
    Ok(())
}

pub fn whoami(ctx: &AppContext) {
    let session = ctx.session.get();
    match session.username.as_deref() {
        Some(name) if session.is_authenticated() => display::labeled("Logged in as", name),
        _ => display::info("Not logged in"),
    }
    display::labeled("Backend", ctx.api.base_url());
}

/// Resolve a path through the route guard and show where it lands
pub fn open(ctx: &AppContext, path: &str) {
    let nav = ctx.router.navigate(path);
    if follow(nav) {
        if let healthguard_client::Navigation::Render { route, .. } = nav {
            display::labeled("Open", &format!("{} ({})", route.title(), route.path()));
        }
    }
}

pub fn dashboard(ctx: &AppContext) {
    if !enter(ctx, Route::Dashboard) {
        return;
    }
    let dashboard = ctx.dashboard();
    display::dashboard(&dashboard.greeting(), &dashboard.entries());
}
