//! Health assistant chat

use super::Shown;
use crate::{display, wizard};
use anyhow::Result;
use healthguard_client::AppContext;

/// One turn when `message` is given, otherwise a prompt loop until `exit`
pub async fn run(ctx: &AppContext, message: Option<String>) -> Result<()> {
    let chat = ctx.chat();
    if !chat.is_available() {
        display::warning("The assistant is available after login: healthguard login");
        return Ok(());
    }

    if let Some(message) = message {
        if let Some(reply) = chat.send(&message).await.shown()? {
            display::chat_message(&reply);
        }
        return Ok(());
    }

    for greeting in chat.messages() {
        display::chat_message(&greeting);
    }
    loop {
        let input = wizard::prompt("you")?;
        if matches!(input.as_str(), "exit" | "quit") {
            break;
        }
        if let Some(reply) = chat.send(&input).await.shown()? {
            display::chat_message(&reply);
        }
    }
    Ok(())
}
