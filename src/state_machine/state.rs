//! Conversation state types

use crate::db::Participant;
use serde::{Deserialize, Serialize};

/// Name a draft carries until the chat picks a real one
pub const PLACEHOLDER_NAME: &str = "__undefined__";

/// Quick-reply text that adds the sender as a participant
pub const ADD_ME_MESSAGE: &str = "🙋Add me";

/// Quick-reply text that asks for a generated name
pub const RANDOM_NAME_MESSAGE: &str = "🎲 Random 🎲";

// ============================================================================
// Activity Draft
// ============================================================================

/// An activity being assembled by a chat, not yet persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityDraft {
    pub chat_id: i64,
    pub name: String,
    pub participants: Vec<Participant>,
}

impl ActivityDraft {
    pub fn new(chat_id: i64) -> Self {
        Self {
            chat_id,
            name: PLACEHOLDER_NAME.to_string(),
            participants: Vec::new(),
        }
    }

    /// Whether an equivalent participant (see [`Participant::same_as`]) is already in
    pub fn contains(&self, participant: &Participant) -> bool {
        self.participants.iter().any(|p| p.same_as(participant))
    }
}

// ============================================================================
// Conversation State
// ============================================================================

/// Where a chat is in the activity creation flow.
///
/// Every non-terminal state owns the chat's draft, so dropping back to `End`
/// discards it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConvState {
    /// Waiting for the activity name
    ChoosingName { draft: ActivityDraft },

    /// Name accepted, collecting participants
    AddingParticipant { draft: ActivityDraft },

    /// Preview shown, waiting for /confirm
    Confirming { draft: ActivityDraft },

    /// No conversation in progress (terminal)
    #[default]
    End,
}

impl ConvState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConvState::End)
    }

    /// The draft held by a non-terminal state
    pub fn draft(&self) -> Option<&ActivityDraft> {
        match self {
            ConvState::ChoosingName { draft }
            | ConvState::AddingParticipant { draft }
            | ConvState::Confirming { draft } => Some(draft),
            ConvState::End => None,
        }
    }

    /// Stable tag for logs and error messages
    pub fn name(&self) -> &'static str {
        match self {
            ConvState::ChoosingName { .. } => "choosing_name",
            ConvState::AddingParticipant { .. } => "adding_participant",
            ConvState::Confirming { .. } => "confirming",
            ConvState::End => "end",
        }
    }
}

/// Context for a conversation (immutable configuration)
#[derive(Debug, Clone)]
pub struct ConvContext {
    pub chat_id: i64,
}

impl ConvContext {
    pub fn new(chat_id: i64) -> Self {
        Self { chat_id }
    }
}
