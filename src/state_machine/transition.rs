//! Pure state transition function
//!
//! Storage lookups, name generation and the final commit are requested as
//! effects; their outcomes come back in as events.

use super::effect::QuickReply;
use super::preview::render_preview;
use super::state::{ActivityDraft, ADD_ME_MESSAGE, RANDOM_NAME_MESSAGE};
use super::{ConvContext, ConvState, Effect, Event};
use crate::db::Participant;
use crate::validation::{check_name_format, NameRejection};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Event {event} is not handled in state {state}")]
    Unhandled {
        state: &'static str,
        event: &'static str,
    },
}

/// User-correctable failures. They are answered with a reply and the
/// conversation carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    /// Covers both `InvalidNameFormat` and `DuplicateName`
    #[error("❌ Choose another name:\n{0}")]
    InvalidName(#[from] NameRejection),
    #[error("{}", already_added_message(.name, *.self_add))]
    DuplicateParticipant { name: String, self_add: bool },
    #[error("❌ Could not save the activity. Send /confirm to try again or /cancel to discard it.")]
    PersistenceFailure,
}

fn already_added_message(name: &str, self_add: bool) -> String {
    if self_add {
        format!("{name}, you are already added!")
    } else {
        format!("{name} is already added!")
    }
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs, with no I/O.
pub fn transition(
    state: &ConvState,
    context: &ConvContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Entry (any state, discards an unfinished draft)
        // ============================================================
        (_, Event::Create) => Ok(TransitionResult::new(ConvState::ChoosingName {
            draft: ActivityDraft::new(context.chat_id),
        })
        .with_effect(Effect::reply_with(
            "Let's create an activity.\nFirst, choose a name:",
            QuickReply::RandomName,
        ))),

        // ============================================================
        // Cancellation (any non-terminal state)
        // ============================================================
        (
            ConvState::ChoosingName { .. }
            | ConvState::AddingParticipant { .. }
            | ConvState::Confirming { .. },
            Event::Cancel,
        ) => Ok(TransitionResult::new(ConvState::End).with_effect(Effect::reply("Canceled."))),

        // ============================================================
        // Choosing a name
        // ============================================================
        (ConvState::ChoosingName { draft }, Event::Text { text, .. })
            if text == RANDOM_NAME_MESSAGE =>
        {
            Ok(stay_choosing(draft).with_effect(Effect::GenerateName))
        }

        (
            ConvState::ChoosingName { draft },
            Event::Text { text: name, .. } | Event::NameGenerated { name },
        ) => Ok(match check_name_format(&name) {
            Ok(()) => stay_choosing(draft).with_effect(Effect::ValidateName { name }),
            Err(rejection) => reject_name(draft, rejection),
        }),

        // Conversation commands are just command-like text at this point
        (
            ConvState::ChoosingName { draft },
            Event::AddMe { .. } | Event::Preview | Event::Confirm,
        ) => Ok(reject_name(draft, NameRejection::InvalidNameFormat)),

        (ConvState::ChoosingName { draft }, Event::NameValidated { name, verdict }) => {
            Ok(match verdict {
                Ok(()) => {
                    let reply = format!("Great! Who will be responsible for {name}?");
                    let mut draft = draft.clone();
                    draft.name = name;
                    TransitionResult::new(ConvState::AddingParticipant { draft })
                        .with_effect(Effect::reply_with(reply, QuickReply::AddMe))
                }
                Err(rejection) => reject_name(draft, rejection),
            })
        }

        // ============================================================
        // Adding participants
        // ============================================================
        (ConvState::AddingParticipant { draft }, Event::Text { text, sender })
            if text == ADD_ME_MESSAGE =>
        {
            let participant = Participant::with_telegram_id(sender.display_name, sender.user_id);
            Ok(add_participant(draft, participant, true))
        }

        (ConvState::AddingParticipant { draft }, Event::AddMe { sender }) => {
            let participant = Participant::with_telegram_id(sender.display_name, sender.user_id);
            Ok(add_participant(draft, participant, true))
        }

        (ConvState::AddingParticipant { draft }, Event::Text { text, .. })
            if !text.starts_with('/') =>
        {
            Ok(add_participant(draft, Participant::named(text), false))
        }

        (ConvState::AddingParticipant { draft }, Event::Preview) => {
            let preview = render_preview(draft);
            Ok(TransitionResult::new(ConvState::Confirming {
                draft: draft.clone(),
            })
            .with_effect(Effect::reply(format!(
                "{preview}\n\nType /confirm to save an activity"
            ))))
        }

        // ============================================================
        // Confirming
        // ============================================================
        (ConvState::Confirming { draft }, Event::Confirm) => Ok(TransitionResult::new(
            ConvState::Confirming {
                draft: draft.clone(),
            },
        )
        .with_effect(Effect::PersistActivity {
            draft: draft.clone(),
        })),

        (ConvState::Confirming { .. }, Event::ActivityPersisted) => Ok(
            TransitionResult::new(ConvState::End).with_effect(Effect::reply("✅ Activity saved.")),
        ),

        // Keep the draft so the chat can retry or cancel
        (ConvState::Confirming { draft }, Event::PersistFailed) => {
            Ok(TransitionResult::new(ConvState::Confirming {
                draft: draft.clone(),
            })
            .with_effect(Effect::reply(
                ConversationError::PersistenceFailure.to_string(),
            )))
        }

        // ============================================================
        // Everything else is ignored
        // ============================================================
        (state, event) => Err(TransitionError::Unhandled {
            state: state.name(),
            event: event.name(),
        }),
    }
}

fn stay_choosing(draft: &ActivityDraft) -> TransitionResult {
    TransitionResult::new(ConvState::ChoosingName {
        draft: draft.clone(),
    })
}

fn reject_name(draft: &ActivityDraft, rejection: NameRejection) -> TransitionResult {
    stay_choosing(draft).with_effect(Effect::reply(
        ConversationError::InvalidName(rejection).to_string(),
    ))
}

fn add_participant(
    draft: &ActivityDraft,
    participant: Participant,
    self_add: bool,
) -> TransitionResult {
    if draft.contains(&participant) {
        let error = ConversationError::DuplicateParticipant {
            name: participant.name,
            self_add,
        };
        return TransitionResult::new(ConvState::AddingParticipant {
            draft: draft.clone(),
        })
        .with_effect(Effect::reply(error.to_string()));
    }

    let reply = format!("{}, okay. Anyone else?", participant.name);
    let mut draft = draft.clone();
    draft.participants.push(participant);
    TransitionResult::new(ConvState::AddingParticipant { draft }).with_effect(Effect::reply(reply))
}
