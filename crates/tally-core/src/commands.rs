//! Command recognition and reply texts.
//!
//! Matching is exact (`/start`, `/status`) or by prefix (`/broadcast`), with
//! the admin-only commands invisible to everyone else.

pub const WELCOME_TEXT: &str = "Hello! I am a test bot. Send /status to see user count.";
pub const BROADCAST_USAGE_TEXT: &str = "Usage: `/broadcast <message>`";

const START: &str = "/start";
const STATUS: &str = "/status";
const BROADCAST: &str = "/broadcast";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Status,
    /// `payload` is `None` when nothing but whitespace follows the first space.
    Broadcast { payload: Option<String> },
    None,
}

pub fn parse_command(text: &str, is_admin: bool) -> Command {
    if text == START {
        return Command::Start;
    }
    if !is_admin {
        return Command::None;
    }
    if text == STATUS {
        return Command::Status;
    }
    if text.starts_with(BROADCAST) {
        let payload = text
            .split_once(' ')
            .map(|(_, rest)| rest)
            .filter(|rest| !rest.trim().is_empty())
            .map(str::to_string);
        return Command::Broadcast { payload };
    }
    Command::None
}

pub fn status_text(user_count: usize) -> String {
    format!("📊 Total Users: *{user_count}*")
}

pub fn broadcast_report_text(sent: usize, total: usize) -> String {
    format!("✅ Broadcast sent to *{sent}* of *{total}* users.")
}
