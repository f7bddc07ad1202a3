//! Inbound webhook payload.
//!
//! Only the handful of fields the bot acts on are modelled; everything else in
//! a Telegram `Update` is ignored rather than validated.

use serde::Deserialize;

use crate::{
    domain::{ChatId, UserId},
    Result,
};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub from: Option<Sender>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Sender {
    pub id: UserId,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

/// The per-invocation view the handler works with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inbound {
    pub user_id: UserId,
    pub chat_id: ChatId,
    pub text: String,
}

impl Update {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    /// `None` when there is no message or no sender to attribute it to.
    pub fn into_inbound(self) -> Option<Inbound> {
        let message = self.message?;
        let sender = message.from?;
        Some(Inbound {
            user_id: sender.id,
            chat_id: message.chat.id,
            text: message.text.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(v: serde_json::Value) -> Update {
        Update::from_slice(v.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn extracts_sender_chat_and_text() {
        let update = parse(json!({
            "update_id": 10,
            "message": {
                "message_id": 1,
                "from": { "id": 7, "is_bot": false, "first_name": "A" },
                "chat": { "id": -100, "type": "group" },
                "text": "/start"
            }
        }));
        assert_eq!(
            update.into_inbound(),
            Some(Inbound {
                user_id: UserId(7),
                chat_id: ChatId(-100),
                text: "/start".to_string(),
            })
        );
    }

    #[test]
    fn missing_text_defaults_to_empty() {
        let update = parse(json!({
            "message": { "from": { "id": 7 }, "chat": { "id": 7 }, "sticker": {} }
        }));
        assert_eq!(update.into_inbound().map(|i| i.text), Some(String::new()));
    }

    #[test]
    fn no_message_or_no_sender_is_nothing_to_do() {
        assert!(parse(json!({ "update_id": 1 })).into_inbound().is_none());
        assert!(parse(json!({ "message": null })).into_inbound().is_none());
        assert!(parse(json!({ "message": { "chat": { "id": 3 }, "text": "hi" } }))
            .into_inbound()
            .is_none());
    }

    #[test]
    fn garbage_body_is_an_error() {
        assert!(Update::from_slice(b"not json").is_err());
        assert!(Update::from_slice(b"{\"message\": {\"from\": {\"id\": 1}}}").is_err());
    }
}
