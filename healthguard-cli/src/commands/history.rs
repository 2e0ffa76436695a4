use super::{enter, Shown};
use crate::display;
use anyhow::Result;
use healthguard_client::{AppContext, Route};

pub async fn list(ctx: &AppContext) -> Result<()> {
    if !enter(ctx, Route::History) {
        return Ok(());
    }
    let records = ctx.history().load().await.shown()?;
    display::history(&records);
    Ok(())
}

pub async fn show(ctx: &AppContext, id: i64) -> Result<()> {
    if !enter(ctx, Route::History) {
        return Ok(());
    }
    let detail = ctx.history().view(id).await.shown()?;
    display::record(&detail);
    Ok(())
}

pub async fn delete(ctx: &AppContext, id: i64) -> Result<()> {
    if !enter(ctx, Route::History) {
        return Ok(());
    }
    let records = ctx.history().delete(id).await.shown()?;
    display::history(&records);
    Ok(())
}
