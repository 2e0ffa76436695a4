//! Health assistant chat
//!
//! The whole conversation is posted on every turn. A failed turn never
//! surfaces as an error notice: an apology from the assistant side is
//! appended instead.

use super::{acquire, AppContext};
use crate::error::Result;
use crate::models::{ChatMessage, ChatRequest};
use crate::state::BusyFlag;
use parking_lot::Mutex;
use tracing::warn;

pub const GREETING: &str =
    "Hi! I'm your personal health assistant. I can read your check-up data, what would you like to know?";
pub const APOLOGY: &str = "The network hiccuped, please try again.";

pub struct ChatController {
    ctx: AppContext,
    busy: BusyFlag,
    messages: Mutex<Vec<ChatMessage>>,
}

impl ChatController {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            busy: BusyFlag::new(),
            messages: Mutex::new(vec![ChatMessage::assistant(GREETING)]),
        }
    }

    /// Hidden unless both token and username are present
    pub fn is_available(&self) -> bool {
        self.ctx.user_id().is_ok()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages.lock().clone()
    }

    /// Sends one user turn. Returns the assistant message appended for it,
    /// or `None` when the input was blank.
    pub async fn send(&self, input: &str) -> Result<Option<ChatMessage>> {
        if input.trim().is_empty() {
            return Ok(None);
        }
        let user_id = self.ctx.user_id()?;
        let _busy = acquire(&self.busy)?;

        let history = {
            let mut messages = self.messages.lock();
            messages.push(ChatMessage::user(input));
            messages.clone()
        };

        let reply = match self
            .ctx
            .api
            .chat(&ChatRequest {
                user_id,
                messages: history,
            })
            .await
        {
            Ok(reply) => ChatMessage::assistant(reply),
            Err(e) => {
                warn!("chat completion failed: {}", e);
                ChatMessage::assistant(APOLOGY)
            }
        };

        self.messages.lock().push(reply.clone());
        Ok(Some(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::testing::offline_context;
    use crate::error::ClientError;
    use crate::models::ChatRole;

    #[test]
    fn test_conversation_starts_with_greeting() {
        let (ctx, _) = offline_context();
        let chat = ctx.chat();
        assert_eq!(chat.messages(), vec![ChatMessage::assistant(GREETING)]);
        assert!(!chat.is_available());
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let (ctx, _) = offline_context();
        ctx.session.set_session("ok", "alice").unwrap();
        let chat = ctx.chat();
        assert_eq!(chat.send("   ").await.unwrap(), None);
        assert_eq!(chat.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_appends_apology() {
        let (ctx, notifier) = offline_context();
        ctx.session.set_session("ok", "alice").unwrap();
        let chat = ctx.chat();

        let reply = chat.send("How is my blood pressure?").await.unwrap().unwrap();
        assert_eq!(reply.content, APOLOGY);

        let messages = chat.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, ChatRole::User);
        assert_eq!(messages[2].role, ChatRole::Assistant);
        assert!(notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn test_send_requires_session() {
        let (ctx, _) = offline_context();
        let err = ctx.chat().send("hello").await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
    }
}
