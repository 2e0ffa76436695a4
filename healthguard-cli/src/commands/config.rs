//! `config show` / `config init`

use crate::{display, wizard};
use anyhow::{Context, Result};
use healthguard_client::ClientConfig;
use std::path::Path;

pub fn show(config: &ClientConfig, path: &Path) -> Result<()> {
    display::section("Configuration");
    let exists = path.exists();
    display::labeled(
        "File",
        &format!("{}{}", path.display(), if exists { "" } else { " (not created, defaults)" }),
    );
    display::labeled("Base URL", &config.backend.base_url());
    display::labeled("Session storage", wizard::storage_key(config.session.storage));
    println!();

    let rendered = toml::to_string_pretty(config).context("failed to render config")?;
    for line in rendered.lines() {
        println!("  {}", line);
    }
    Ok(())
}

pub async fn init(current: &ClientConfig, path: &Path) -> Result<()> {
    let Some(config) = wizard::SetupWizard::run(current, path)? else {
        return Ok(());
    };
    config
        .save_to(path)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    println!();
    println!("✅ Configuration saved successfully!");
    println!("🚀 Next: healthguard login");
    println!();
    Ok(())
}
