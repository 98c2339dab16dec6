//! Events that can occur in a conversation

use crate::validation::Verdict;
use serde::{Deserialize, Serialize};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    /// `/create`
    Create,
    /// `/cancel`
    Cancel,
    /// Any message that is not one of the conversation commands
    Text { text: String, sender: Sender },
    /// `/add_me`
    AddMe { sender: Sender },
    /// `/preview`
    Preview,
    /// `/confirm`
    Confirm,

    // Effect results
    NameGenerated { name: String },
    NameValidated { name: String, verdict: Verdict },
    ActivityPersisted,
    PersistFailed,
}

impl Event {
    /// Stable tag for logs and error messages
    pub fn name(&self) -> &'static str {
        match self {
            Event::Create => "create",
            Event::Cancel => "cancel",
            Event::Text { .. } => "text",
            Event::AddMe { .. } => "add_me",
            Event::Preview => "preview",
            Event::Confirm => "confirm",
            Event::NameGenerated { .. } => "name_generated",
            Event::NameValidated { .. } => "name_validated",
            Event::ActivityPersisted => "activity_persisted",
            Event::PersistFailed => "persist_failed",
        }
    }
}

/// The chat member a user event came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub user_id: i64,
    pub display_name: String,
}

impl Sender {
    pub fn new(user_id: i64, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
        }
    }
}
