//! Runtime for executing conversations
//!
//! Each chat gets its own task, so turns within a chat are serialised while
//! different chats run independently.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{ConversationRuntime, GENERIC_FAILURE_REPLY};
pub use traits::*;

use crate::commands::{route, Route};
use crate::db::Database;
use crate::name_generator::NameGenerator;
use crate::state_machine::{ConvContext, ConvState, Event, Sender};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch, RwLock};

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime = ConversationRuntime<DatabaseStorage, Arc<dyn NameGenerator>>;

/// A message for the chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub text: String,
    /// One-tap answers the client may offer
    pub quick_replies: Vec<String>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quick_replies: vec![],
        }
    }
}

/// One inbound event plus the channel its replies go back on
#[derive(Debug)]
pub struct Turn {
    pub event: Event,
    pub respond_to: oneshot::Sender<Vec<Reply>>,
}

/// Handle to interact with a running conversation
#[derive(Clone)]
pub struct ChatHandle {
    pub turn_tx: mpsc::Sender<Turn>,
    pub state_rx: watch::Receiver<ConvState>,
}

impl ChatHandle {
    /// Queue an event and wait for the runtime to answer
    pub async fn send(&self, event: Event) -> Result<Vec<Reply>, String> {
        let (respond_to, reply_rx) = oneshot::channel();
        self.turn_tx
            .send(Turn { event, respond_to })
            .await
            .map_err(|e| format!("Failed to send event: {e}"))?;
        reply_rx
            .await
            .map_err(|e| format!("Conversation runtime dropped the turn: {e}"))
    }
}

/// Manager for all chat runtimes
///
/// A chat only has a runtime while a conversation is open: `/create` starts
/// one and it is released as soon as the chat is back in `End`.
pub struct RuntimeManager {
    db: Database,
    names: Arc<dyn NameGenerator>,
    runtimes: RwLock<HashMap<i64, ChatHandle>>,
}

impl RuntimeManager {
    pub fn new(db: Database, names: Arc<dyn NameGenerator>) -> Self {
        Self {
            db,
            names,
            runtimes: RwLock::new(HashMap::new()),
        }
    }

    fn spawn_runtime(&self, chat_id: i64) -> ChatHandle {
        let (turn_tx, turn_rx) = mpsc::channel(32);
        let (state_tx, state_rx) = watch::channel(ConvState::End);

        let runtime: ProductionRuntime = ConversationRuntime::new(
            ConvContext::new(chat_id),
            DatabaseStorage::new(self.db.clone()),
            self.names.clone(),
            turn_rx,
            state_tx,
        );

        tokio::spawn(async move {
            runtime.run().await;
            tracing::info!(chat_id = chat_id, "Conversation runtime finished");
        });

        ChatHandle { turn_tx, state_rx }
    }

    /// Handle one inbound chat message and return what the bot says back
    pub async fn dispatch(
        &self,
        chat_id: i64,
        sender: Sender,
        text: String,
    ) -> Result<Vec<Reply>, String> {
        DatabaseStorage::new(self.db.clone())
            .ensure_user(sender.user_id)
            .await?;

        let event = match route(text, sender) {
            Route::Immediate(reply) => return Ok(vec![reply]),
            Route::Conversation(event) => event,
        };

        tracing::debug!(chat_id = chat_id, event = event.name(), "Dispatching event");
        let replies = self.deliver(chat_id, event).await?;
        self.release_if_finished(chat_id).await;
        Ok(replies)
    }

    /// Run one turn on the chat's runtime, starting it for `Create`.
    ///
    /// The map stays locked (shared) until the turn is answered, so a runtime
    /// is never released with a turn in flight.
    async fn deliver(&self, chat_id: i64, event: Event) -> Result<Vec<Reply>, String> {
        if !matches!(event, Event::Create) {
            let runtimes = self.runtimes.read().await;
            return match runtimes.get(&chat_id) {
                Some(handle) => handle.send(event).await,
                None => {
                    tracing::debug!(
                        chat_id = chat_id,
                        event = event.name(),
                        "No conversation in progress"
                    );
                    Ok(vec![])
                }
            };
        }

        let mut runtimes = self.runtimes.write().await;
        let handle = runtimes
            .entry(chat_id)
            .or_insert_with(|| self.spawn_runtime(chat_id))
            .clone();
        let _runtimes = runtimes.downgrade();
        handle.send(event).await
    }

    /// Drop the chat's runtime once its conversation has ended
    async fn release_if_finished(&self, chat_id: i64) {
        let finished = |runtimes: &HashMap<i64, ChatHandle>| {
            runtimes
                .get(&chat_id)
                .is_some_and(|handle| handle.state_rx.borrow().is_terminal())
        };

        if !finished(&*self.runtimes.read().await) {
            return;
        }

        let mut runtimes = self.runtimes.write().await;
        // A new /create may have landed while we waited for the write lock
        if finished(&runtimes) {
            runtimes.remove(&chat_id);
            tracing::debug!(chat_id = chat_id, "Conversation runtime released");
        }
    }

    /// Current conversation state of a chat (`End` if none is open)
    pub async fn conversation_state(&self, chat_id: i64) -> ConvState {
        self.runtimes
            .read()
            .await
            .get(&chat_id)
            .map(|handle| handle.state_rx.borrow().clone())
            .unwrap_or_default()
    }

    /// Number of chats with a conversation in progress
    #[allow(dead_code)] // Used in tests
    pub async fn open_conversations(&self) -> usize {
        self.runtimes.read().await.len()
    }

    /// Get the database handle
    pub fn db(&self) -> &Database {
        &self.db
    }
}
