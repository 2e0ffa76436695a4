//! Daily mood check-in

use super::{enter, Shown};
use crate::display;
use anyhow::Result;
use healthguard_client::models::Mood;
use healthguard_client::{AppContext, ClientError, Route};

pub async fn status(ctx: &AppContext) -> Result<()> {
    if !enter(ctx, Route::Checkin) {
        return Ok(());
    }
    let status = ctx.checkin().refresh().await.shown()?;
    display::checkin_status(&status);
    Ok(())
}

pub async fn check_in(ctx: &AppContext, mood: Option<Mood>) -> Result<()> {
    if !enter(ctx, Route::Checkin) {
        return Ok(());
    }
    let controller = ctx.checkin();
    // Local status first so a repeat check-in never reaches the backend
    controller.refresh().await.shown()?;

    match controller.check_in(mood).await {
        Ok(outcome) => display::checkin_outcome(&outcome),
        Err(ClientError::AlreadyCheckedIn) => {}
        Err(e) => return Err(super::Reported(e).into()),
    }
    if let Some(status) = controller.status() {
        display::checkin_status(&status);
    }
    Ok(())
}
