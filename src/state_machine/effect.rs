//! Effects produced by state transitions

use super::state::{ActivityDraft, ADD_ME_MESSAGE, RANDOM_NAME_MESSAGE};
use serde::Serialize;

/// Effects to be executed after state transition
#[derive(Debug, Clone)]
pub enum Effect {
    /// Send a message back to the chat
    Reply {
        text: String,
        quick_reply: Option<QuickReply>,
    },

    /// Ask the name generator for a candidate (answers `NameGenerated`)
    GenerateName,

    /// Check a candidate name against the store (answers `NameValidated`)
    ValidateName { name: String },

    /// Commit the draft atomically (answers `ActivityPersisted` or `PersistFailed`)
    PersistActivity { draft: ActivityDraft },
}

/// One-tap answers offered alongside a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickReply {
    AddMe,
    RandomName,
}

impl QuickReply {
    pub fn label(self) -> &'static str {
        match self {
            QuickReply::AddMe => ADD_ME_MESSAGE,
            QuickReply::RandomName => RANDOM_NAME_MESSAGE,
        }
    }
}

impl Effect {
    pub fn reply(text: impl Into<String>) -> Self {
        Effect::Reply {
            text: text.into(),
            quick_reply: None,
        }
    }

    pub fn reply_with(text: impl Into<String>, quick_reply: QuickReply) -> Self {
        Effect::Reply {
            text: text.into(),
            quick_reply: Some(quick_reply),
        }
    }
}
