//! Inbound message parsing
//!
//! Turns raw chat text into either an immediate reply (`/start`, `/stats`) or
//! an event for the chat's conversation.

use crate::runtime::Reply;
use crate::state_machine::{Event, Sender};

pub const START_REPLY: &str = "Hi!👋 To create an activity send me /create";
pub const STATS_REPLY: &str = "🛠";

/// Bot commands the gateway knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stats,
    Create,
    Cancel,
    Preview,
    AddMe,
    Confirm,
}

impl Command {
    /// Parse `/name`, `/name@bot_name` or `/name args`, case-insensitively.
    ///
    /// The `/` must be the first character. Unknown commands are `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.strip_prefix('/')?.split(char::is_whitespace).next()?;
        let name = word
            .split_once('@')
            .map_or(word, |(name, _bot)| name)
            .to_lowercase();
        match name.as_str() {
            "start" => Some(Command::Start),
            "stats" => Some(Command::Stats),
            "create" => Some(Command::Create),
            "cancel" => Some(Command::Cancel),
            "preview" => Some(Command::Preview),
            "add_me" => Some(Command::AddMe),
            "confirm" => Some(Command::Confirm),
            _ => None,
        }
    }
}

/// Where an inbound message goes
#[derive(Debug)]
pub enum Route {
    /// Answered without touching the conversation
    Immediate(Reply),
    Conversation(Event),
}

pub fn route(text: String, sender: Sender) -> Route {
    match Command::parse(&text) {
        Some(Command::Start) => Route::Immediate(Reply::text(START_REPLY)),
        Some(Command::Stats) => Route::Immediate(Reply::text(STATS_REPLY)),
        Some(Command::Create) => Route::Conversation(Event::Create),
        Some(Command::Cancel) => Route::Conversation(Event::Cancel),
        Some(Command::Preview) => Route::Conversation(Event::Preview),
        Some(Command::Confirm) => Route::Conversation(Event::Confirm),
        Some(Command::AddMe) => Route::Conversation(Event::AddMe { sender }),
        // Unknown commands stay text; the conversation decides what they mean
        None => Route::Conversation(Event::Text { text, sender }),
    }
}
