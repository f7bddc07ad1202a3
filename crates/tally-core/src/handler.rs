//! Webhook update handling: register the sender, then run at most one command.
//!
//! Nothing here fails outward. Store and messaging errors are logged and either
//! defaulted (empty registry) or counted (broadcast), so the HTTP layer can
//! always acknowledge.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    commands::{
        broadcast_report_text, parse_command, status_text, Command, BROADCAST_USAGE_TEXT,
        WELCOME_TEXT,
    },
    config::Config,
    domain::{ChatId, UserId},
    messaging::port::MessagingPort,
    registry::Registry,
    store::RegistryStore,
    update::{Inbound, Update},
};

/// What a single webhook invocation ended up doing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// Unparseable body, no message, or no sender.
    Ignored,
    Handled {
        registered: bool,
        command: CommandOutcome,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    None,
    Welcomed,
    Status { users: usize },
    BroadcastUsage,
    Broadcast(BroadcastReport),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BroadcastReport {
    pub sent: usize,
    pub total: usize,
}

pub struct WebhookHandler {
    cfg: Arc<Config>,
    store: Arc<dyn RegistryStore>,
    messenger: Arc<dyn MessagingPort>,
    // Serializes registration read-modify-write within this process.
    registration: Mutex<()>,
}

impl WebhookHandler {
    pub fn new(
        cfg: Arc<Config>,
        store: Arc<dyn RegistryStore>,
        messenger: Arc<dyn MessagingPort>,
    ) -> Self {
        Self {
            cfg,
            store,
            messenger,
            registration: Mutex::new(()),
        }
    }

    /// Entry point for a raw webhook body.
    pub async fn handle_payload(&self, body: &[u8]) -> HandlerOutcome {
        match Update::from_slice(body) {
            Ok(update) => self.handle_update(update).await,
            Err(e) => {
                warn!("ignoring unparseable webhook body: {e}");
                HandlerOutcome::Ignored
            }
        }
    }

    pub async fn handle_update(&self, update: Update) -> HandlerOutcome {
        let Some(inbound) = update.into_inbound() else {
            debug!("update carries no message from a user; nothing to do");
            return HandlerOutcome::Ignored;
        };
        self.handle_inbound(inbound).await
    }

    async fn handle_inbound(&self, inbound: Inbound) -> HandlerOutcome {
        let Inbound {
            user_id,
            chat_id,
            text,
        } = inbound;

        let registered = self.register(user_id).await;

        let is_admin = self.cfg.is_admin(user_id);
        let command = match parse_command(&text, is_admin) {
            Command::Start => {
                self.reply(chat_id, WELCOME_TEXT).await;
                CommandOutcome::Welcomed
            }
            Command::Status => {
                let users = self.load_registry().await.len();
                self.reply(chat_id, &status_text(users)).await;
                CommandOutcome::Status { users }
            }
            Command::Broadcast { payload: None } => {
                self.reply(chat_id, BROADCAST_USAGE_TEXT).await;
                CommandOutcome::BroadcastUsage
            }
            Command::Broadcast {
                payload: Some(payload),
            } => {
                let report = self.broadcast(&payload).await;
                info!(
                    sent = report.sent,
                    total = report.total,
                    "broadcast finished"
                );
                self.reply(chat_id, &broadcast_report_text(report.sent, report.total))
                    .await;
                CommandOutcome::Broadcast(report)
            }
            Command::None => CommandOutcome::None,
        };

        HandlerOutcome::Handled {
            registered,
            command,
        }
    }

    /// Add `user_id` to the registry if it is new. Returns `true` when a
    /// registration write succeeded.
    ///
    /// A failed read skips the write: writing back a defaulted empty registry
    /// would replace every stored user with this one.
    async fn register(&self, user_id: UserId) -> bool {
        let _guard = self.registration.lock().await;

        let mut registry = match self.store.load().await {
            Ok(registry) => registry,
            Err(e) => {
                warn!(user_id = user_id.0, "failed to read registry, skipping registration: {e}");
                return false;
            }
        };

        if !registry.insert(user_id) {
            return false;
        }

        match self.store.save(&registry).await {
            Ok(()) => {
                info!(user_id = user_id.0, total = registry.len(), "registered new user");
                true
            }
            Err(e) => {
                warn!(user_id = user_id.0, "failed to add user: {e}");
                false
            }
        }
    }

    async fn load_registry(&self) -> Registry {
        match self.store.load().await {
            Ok(registry) => registry,
            Err(e) => {
                warn!("failed to read registry, treating as empty: {e}");
                Registry::new()
            }
        }
    }

    async fn broadcast(&self, payload: &str) -> BroadcastReport {
        let registry = self.load_registry().await;
        let total = registry.len();
        let mut sent = 0usize;

        for &user in registry.users() {
            match self.messenger.send_markdown(ChatId::from(user), payload).await {
                Ok(()) => sent += 1,
                Err(e) => debug!(user_id = user.0, "broadcast delivery failed: {e}"),
            }
        }

        BroadcastReport { sent, total }
    }

    async fn reply(&self, chat_id: ChatId, text: &str) {
        if let Err(e) = self.messenger.send_markdown(chat_id, text).await {
            warn!(chat_id = chat_id.0, "failed to send reply: {e}");
        }
    }
}
