//! Telegram adapter (teloxide) and the inbound webhook server (axum).
//!
//! `TelegramMessenger` implements the `tally-core` MessagingPort over the Bot API.

use async_trait::async_trait;

use teloxide::{prelude::*, types::ParseMode};

use tokio::time::sleep;

pub mod router;

use tally_core::{
    config::Config, domain::ChatId, errors::Error, messaging::port::MessagingPort, Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Bot with the configured token, per-call timeout and optional API base.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let client = teloxide::net::default_reqwest_settings()
            .timeout(cfg.http_timeout)
            .build()
            .map_err(|e| Error::Config(format!("telegram client build failed: {e}")))?;

        let mut bot = Bot::with_client(cfg.telegram_token.clone(), client);
        if let Some(api_url) = &cfg.telegram_api_url {
            let url = reqwest::Url::parse(api_url)
                .map_err(|e| Error::Config(format!("TELEGRAM_API_URL is not a URL: {e}")))?;
            bot = bot.set_api_url(url);
        }
        Ok(Self::new(bot))
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::Messaging(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(secs) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(secs).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_markdown(&self, chat_id: ChatId, text: &str) -> Result<()> {
        // Legacy Markdown: broadcast payloads are relayed verbatim and
        // MarkdownV2 would reject most unescaped punctuation.
        #[allow(deprecated)]
        let mode = ParseMode::Markdown;

        self.with_retry(|| {
            self.bot
                .send_message(Self::tg_chat(chat_id), text.to_string())
                .parse_mode(mode)
        })
        .await?;
        Ok(())
    }
}
