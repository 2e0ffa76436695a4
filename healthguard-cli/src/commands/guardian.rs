//! Emergency-contact settings and alert log

use super::{enter, Shown};
use crate::{display, wizard};
use anyhow::Result;
use healthguard_client::controllers::GuardianForm;
use healthguard_client::{AppContext, Route};

pub async fn show(ctx: &AppContext) -> Result<()> {
    if !enter(ctx, Route::Guardian) {
        return Ok(());
    }
    let view = ctx.guardian().load().await.shown()?;
    display::guardian(&view);
    Ok(())
}

/// Prompts for every setting, pre-filled from the saved ones
pub async fn save(ctx: &AppContext) -> Result<()> {
    if !enter(ctx, Route::Guardian) {
        return Ok(());
    }
    let controller = ctx.guardian();
    let current = controller.load().await.shown()?;
    let form = wizard::guardian_form(&GuardianForm::from(&current.config))?;

    let view = controller.save(&form).await.shown()?;
    display::guardian(&view);
    Ok(())
}

pub async fn test_alert(ctx: &AppContext) -> Result<()> {
    if !enter(ctx, Route::Guardian) {
        return Ok(());
    }
    let view = ctx.guardian().send_test_alert().await.shown()?;
    display::guardian(&view);
    Ok(())
}
