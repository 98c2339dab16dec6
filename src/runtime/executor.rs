//! Conversation runtime executor

use super::traits::Storage;
use super::{Reply, Turn};
use crate::name_generator::NameGenerator;
use crate::state_machine::{transition, ConvContext, ConvState, Effect, Event};
use crate::validation::validate_name;
use tokio::sync::{mpsc, watch};

/// Shown when an effect fails for reasons the chat cannot fix
pub const GENERIC_FAILURE_REPLY: &str = "⚠️ Something went wrong, please try again.";

/// Runs one chat's conversation. Turns are handled strictly one after another.
pub struct ConversationRuntime<S, G>
where
    S: Storage + 'static,
    G: NameGenerator + 'static,
{
    context: ConvContext,
    state: ConvState,
    storage: S,
    names: G,
    turn_rx: mpsc::Receiver<Turn>,
    /// Latest state, for observers outside the runtime task
    state_tx: watch::Sender<ConvState>,
}

impl<S, G> ConversationRuntime<S, G>
where
    S: Storage + 'static,
    G: NameGenerator + 'static,
{
    pub fn new(
        context: ConvContext,
        storage: S,
        names: G,
        turn_rx: mpsc::Receiver<Turn>,
        state_tx: watch::Sender<ConvState>,
    ) -> Self {
        Self {
            context,
            state: ConvState::End,
            storage,
            names,
            turn_rx,
            state_tx,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(chat_id = self.context.chat_id, "Starting conversation runtime");

        while let Some(turn) = self.turn_rx.recv().await {
            let replies = self.handle_event(turn.event).await;
            self.state_tx.send_replace(self.state.clone());
            // The caller may have given up waiting
            let _ = turn.respond_to.send(replies);
        }

        tracing::info!(chat_id = self.context.chat_id, "Conversation runtime stopped");
    }

    /// Process one inbound event to completion and collect the replies
    pub async fn handle_event(&mut self, event: Event) -> Vec<Reply> {
        let mut replies = Vec::new();
        if let Err(e) = self.process_event(event, &mut replies).await {
            tracing::error!(
                chat_id = self.context.chat_id,
                state = self.state.name(),
                error = %e,
                "Error handling event"
            );
            replies.push(Reply::text(GENERIC_FAILURE_REPLY));
        }
        replies
    }

    async fn process_event(&mut self, event: Event, replies: &mut Vec<Reply>) -> Result<(), String> {
        // Effects may answer with events, which are fed straight back in
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let event_name = current_event.name();

            // Pure state transition
            let result = match transition(&self.state, &self.context, current_event) {
                Ok(r) => r,
                Err(e) => {
                    tracing::debug!(chat_id = self.context.chat_id, error = %e, "Ignoring event");
                    return Ok(());
                }
            };

            let old_state = std::mem::replace(&mut self.state, result.new_state);
            if old_state.name() != self.state.name() {
                tracing::info!(
                    chat_id = self.context.chat_id,
                    from = old_state.name(),
                    to = self.state.name(),
                    event = event_name,
                    "State changed"
                );
            }

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect, replies).await? {
                    events_to_process.push(generated_event);
                }
            }
        }

        Ok(())
    }

    /// Execute an effect and optionally return a generated event
    async fn execute_effect(
        &mut self,
        effect: Effect,
        replies: &mut Vec<Reply>,
    ) -> Result<Option<Event>, String> {
        match effect {
            Effect::Reply { text, quick_reply } => {
                replies.push(Reply {
                    text,
                    quick_replies: quick_reply
                        .map(|q| vec![q.label().to_string()])
                        .unwrap_or_default(),
                });
                Ok(None)
            }

            Effect::GenerateName => {
                let name = self.names.generate();
                tracing::debug!(chat_id = self.context.chat_id, name = %name, "Generated name");
                Ok(Some(Event::NameGenerated { name }))
            }

            Effect::ValidateName { name } => {
                let verdict = validate_name(&self.storage, self.context.chat_id, &name).await?;
                Ok(Some(Event::NameValidated { name, verdict }))
            }

            Effect::PersistActivity { draft } => {
                match self.storage.persist_activity(&draft).await {
                    Ok(activity) => {
                        tracing::info!(
                            chat_id = activity.chat_id,
                            activity_id = activity.id,
                            participants = activity.participants.len(),
                            "Activity saved"
                        );
                        Ok(Some(Event::ActivityPersisted))
                    }
                    Err(message) => {
                        tracing::error!(
                            chat_id = self.context.chat_id,
                            error = %message,
                            "Failed to save activity"
                        );
                        Ok(Some(Event::PersistFailed))
                    }
                }
            }
        }
    }

    pub fn state(&self) -> &ConvState {
        &self.state
    }
}
