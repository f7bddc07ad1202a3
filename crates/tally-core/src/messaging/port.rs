use async_trait::async_trait;

use crate::{domain::ChatId, Result};

/// Outbound messaging port.
///
/// Text is Telegram-flavoured Markdown (`*bold*`, `` `code` ``). Adapters report
/// delivery failure as `Err`; callers decide whether it matters.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_markdown(&self, chat_id: ChatId, text: &str) -> Result<()>;
}
