//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::*;
use super::{ConversationRuntime, Reply};
use crate::db::{Activity, Participant, User};
use crate::name_generator::NameGenerator;
use crate::state_machine::{ActivityDraft, ConvContext, ConvState};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::{mpsc, watch};

// ============================================================================
// In-Memory Storage
// ============================================================================

/// Storage that keeps everything in vectors and can be told to fail
pub struct InMemoryStorage {
    users: Mutex<Vec<User>>,
    activities: Mutex<Vec<Activity>>,
    next_id: Mutex<i64>,
    fail_lookups: AtomicBool,
    fail_persist: AtomicBool,
}

#[allow(dead_code)]
impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            activities: Mutex::new(Vec::new()),
            next_id: Mutex::new(1),
            fail_lookups: AtomicBool::new(false),
            fail_persist: AtomicBool::new(false),
        }
    }

    /// Make activity lookups return a storage error
    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    /// Make commits return a storage error
    pub fn fail_persist(&self, fail: bool) {
        self.fail_persist.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of all stored activities
    pub fn all_activities(&self) -> Vec<Activity> {
        self.activities.lock().unwrap().clone()
    }

    fn next_id(&self) -> i64 {
        let mut guard = self.next_id.lock().unwrap();
        let id = *guard;
        *guard += 1;
        id
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for InMemoryStorage {
    async fn find_user_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>, String> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.telegram_id == telegram_id)
            .cloned())
    }

    async fn create_user(&self, telegram_id: i64) -> Result<User, String> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.telegram_id == telegram_id) {
            return Err(format!("User already exists: {telegram_id}"));
        }
        let user = User {
            id: self.next_id(),
            telegram_id,
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl ActivityStore for InMemoryStorage {
    async fn find_activity_by_chat_and_name(
        &self,
        chat_id: i64,
        name: &str,
    ) -> Result<Option<Activity>, String> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err("lookup failed".to_string());
        }
        Ok(self
            .activities
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.chat_id == chat_id && a.name == name)
            .cloned())
    }

    async fn persist_activity(&self, draft: &ActivityDraft) -> Result<Activity, String> {
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err("UNIQUE constraint failed: activities.chat_id, activities.name".to_string());
        }
        let mut activities = self.activities.lock().unwrap();
        if activities
            .iter()
            .any(|a| a.chat_id == draft.chat_id && a.name == draft.name)
        {
            return Err(format!("Activity already exists in chat: {}", draft.name));
        }

        let activity_id = self.next_id();
        let participants = draft
            .participants
            .iter()
            .map(|p| Participant {
                id: Some(self.next_id()),
                activity_id: Some(activity_id),
                ..p.clone()
            })
            .collect();
        let activity = Activity {
            id: activity_id,
            name: draft.name.clone(),
            chat_id: draft.chat_id,
            created_at: Utc::now(),
            participants,
        };
        activities.push(activity.clone());
        Ok(activity)
    }
}

// ============================================================================
// Mock Name Generator
// ============================================================================

/// Hands out queued names, then a fixed fallback
pub struct FixedNameGenerator {
    names: Mutex<VecDeque<String>>,
    fallback: String,
}

#[allow(dead_code)]
impl FixedNameGenerator {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            names: Mutex::new(VecDeque::new()),
            fallback: fallback.into(),
        }
    }

    pub fn queue(&self, name: impl Into<String>) {
        self.names.lock().unwrap().push_back(name.into());
    }
}

impl NameGenerator for FixedNameGenerator {
    fn generate(&self) -> String {
        self.names
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

/// Build a runtime with no channel plumbing; drive it with `handle_event`
pub fn test_runtime<S, G>(chat_id: i64, storage: S, names: G) -> ConversationRuntime<S, G>
where
    S: Storage + 'static,
    G: NameGenerator + 'static,
{
    let (_turn_tx, turn_rx) = mpsc::channel(1);
    let (state_tx, _state_rx) = watch::channel(ConvState::End);
    ConversationRuntime::new(ConvContext::new(chat_id), storage, names, turn_rx, state_tx)
}

pub fn texts(replies: &[Reply]) -> Vec<&str> {
    replies.iter().map(|r| r.text.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::runtime::{RuntimeManager, GENERIC_FAILURE_REPLY};
    use crate::state_machine::state::{ADD_ME_MESSAGE, RANDOM_NAME_MESSAGE};
    use crate::state_machine::{Event, Sender};
    use std::sync::Arc;

    const CHAT: i64 = -1001;

    fn alice() -> Sender {
        Sender::new(7, "Alice")
    }

    fn bob() -> Sender {
        Sender::new(42, "Bob")
    }

    fn text(text: &str) -> Event {
        Event::Text {
            text: text.to_string(),
            sender: alice(),
        }
    }

    #[tokio::test]
    async fn test_in_memory_storage() {
        let storage = InMemoryStorage::new();
        let user = storage.ensure_user(42).await.unwrap();
        assert_eq!(storage.ensure_user(42).await.unwrap().id, user.id);

        let mut draft = ActivityDraft::new(CHAT);
        draft.name = "Hike".to_string();
        storage.persist_activity(&draft).await.unwrap();
        assert!(storage.persist_activity(&draft).await.is_err());
        assert_eq!(storage.all_activities().len(), 1);
        assert!(storage
            .find_activity_by_chat_and_name(CHAT, "Nope")
            .await
            .unwrap()
            .is_none());
    }

    /// The full happy path: create, name, two participants, preview, confirm
    #[tokio::test]
    async fn test_picnic_scenario() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut runtime = test_runtime(CHAT, storage.clone(), FixedNameGenerator::new("Unused"));

        let replies = runtime.handle_event(Event::Create).await;
        assert_eq!(replies[0].quick_replies, vec![RANDOM_NAME_MESSAGE.to_string()]);
        assert!(matches!(runtime.state(), ConvState::ChoosingName { .. }));

        let replies = runtime.handle_event(text("Picnic")).await;
        assert_eq!(texts(&replies), vec!["Great! Who will be responsible for Picnic?"]);
        assert_eq!(replies[0].quick_replies, vec![ADD_ME_MESSAGE.to_string()]);
        assert!(matches!(runtime.state(), ConvState::AddingParticipant { .. }));

        let replies = runtime.handle_event(text("Alice")).await;
        assert_eq!(texts(&replies), vec!["Alice, okay. Anyone else?"]);
        assert!(matches!(runtime.state(), ConvState::AddingParticipant { .. }));

        let replies = runtime.handle_event(Event::AddMe { sender: bob() }).await;
        assert_eq!(texts(&replies), vec!["Bob, okay. Anyone else?"]);

        let replies = runtime.handle_event(Event::Preview).await;
        assert_eq!(
            texts(&replies),
            vec![
                "Activity: \"Picnic\"\n\nParticipants:\n - Alice\n - Bob\n\nType /confirm to save an activity"
            ]
        );
        assert!(matches!(runtime.state(), ConvState::Confirming { .. }));

        let replies = runtime.handle_event(Event::Confirm).await;
        assert_eq!(texts(&replies), vec!["✅ Activity saved."]);
        assert!(runtime.state().is_terminal());

        let saved = storage.all_activities();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].name, "Picnic");
        assert_eq!(saved[0].participants.len(), 2);
        assert_eq!(saved[0].participants[1].telegram_id, Some(42));

        // A second "Picnic" in the same chat is refused at the name step
        runtime.handle_event(Event::Create).await;
        let replies = runtime.handle_event(text("Picnic")).await;
        assert_eq!(
            texts(&replies),
            vec!["❌ Choose another name:\nactivity with name \"Picnic\" already exists in the chat"]
        );
        assert!(matches!(runtime.state(), ConvState::ChoosingName { .. }));
    }

    #[tokio::test]
    async fn test_add_me_twice_keeps_one_entry() {
        let mut runtime = test_runtime(CHAT, InMemoryStorage::new(), FixedNameGenerator::new("x"));
        runtime.handle_event(Event::Create).await;
        runtime.handle_event(text("Chess")).await;

        runtime.handle_event(Event::AddMe { sender: bob() }).await;
        let replies = runtime
            .handle_event(Event::Text {
                text: ADD_ME_MESSAGE.to_string(),
                sender: bob(),
            })
            .await;

        assert_eq!(texts(&replies), vec!["Bob, you are already added!"]);
        assert_eq!(runtime.state().draft().unwrap().participants.len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_then_create_starts_empty() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut runtime = test_runtime(CHAT, storage.clone(), FixedNameGenerator::new("x"));

        // Cancel at every stage
        runtime.handle_event(Event::Create).await;
        assert_eq!(texts(&runtime.handle_event(Event::Cancel).await), vec!["Canceled."]);
        assert!(runtime.state().is_terminal());

        runtime.handle_event(Event::Create).await;
        runtime.handle_event(text("Hike")).await;
        runtime.handle_event(text("Alice")).await;
        runtime.handle_event(Event::Cancel).await;
        assert!(runtime.state().is_terminal());

        runtime.handle_event(Event::Create).await;
        runtime.handle_event(text("Hike")).await;
        runtime.handle_event(text("Alice")).await;
        runtime.handle_event(Event::Preview).await;
        runtime.handle_event(Event::Cancel).await;
        assert!(runtime.state().is_terminal());

        // Nothing was committed and the next draft has no leftovers
        assert!(storage.all_activities().is_empty());
        runtime.handle_event(Event::Create).await;
        let draft = runtime.state().draft().unwrap();
        assert!(draft.participants.is_empty());
    }

    #[tokio::test]
    async fn test_random_name_is_validated() {
        let storage = Arc::new(InMemoryStorage::new());
        let names = FixedNameGenerator::new("Lazy Brunch");
        names.queue("Sunny Hike");
        let mut runtime = test_runtime(CHAT, storage.clone(), names);

        let mut taken = ActivityDraft::new(CHAT);
        taken.name = "Sunny Hike".to_string();
        storage.persist_activity(&taken).await.unwrap();

        runtime.handle_event(Event::Create).await;

        // First suggestion collides, second one is free
        let replies = runtime.handle_event(text(RANDOM_NAME_MESSAGE)).await;
        assert!(texts(&replies)[0].starts_with("❌ Choose another name:"));
        let replies = runtime.handle_event(text(RANDOM_NAME_MESSAGE)).await;
        assert_eq!(
            texts(&replies),
            vec!["Great! Who will be responsible for Lazy Brunch?"]
        );
    }

    #[tokio::test]
    async fn test_commit_failure_stays_confirming() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut runtime = test_runtime(CHAT, storage.clone(), FixedNameGenerator::new("x"));
        runtime.handle_event(Event::Create).await;
        runtime.handle_event(text("Picnic")).await;
        runtime.handle_event(text("Alice")).await;
        runtime.handle_event(Event::Preview).await;

        storage.fail_persist(true);
        let replies = runtime.handle_event(Event::Confirm).await;
        assert_eq!(replies.len(), 1);
        assert!(!replies[0].text.contains("UNIQUE"));
        assert!(matches!(runtime.state(), ConvState::Confirming { .. }));

        // Retry succeeds once the store recovers
        storage.fail_persist(false);
        let replies = runtime.handle_event(Event::Confirm).await;
        assert_eq!(texts(&replies), vec!["✅ Activity saved."]);
        assert_eq!(storage.all_activities().len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_fault_reports_generic_failure() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut runtime = test_runtime(CHAT, storage.clone(), FixedNameGenerator::new("x"));
        runtime.handle_event(Event::Create).await;

        storage.fail_lookups(true);
        let replies = runtime.handle_event(text("Picnic")).await;
        assert_eq!(texts(&replies), vec![GENERIC_FAILURE_REPLY]);
        assert!(matches!(runtime.state(), ConvState::ChoosingName { .. }));
    }

    #[tokio::test]
    async fn test_ignored_events_produce_no_reply() {
        let mut runtime = test_runtime(CHAT, InMemoryStorage::new(), FixedNameGenerator::new("x"));

        assert!(runtime.handle_event(text("hello")).await.is_empty());
        assert!(runtime.handle_event(Event::Confirm).await.is_empty());
        assert!(runtime.state().is_terminal());
    }

    // ========================================================================
    // Runtime Manager
    // ========================================================================

    fn manager() -> RuntimeManager {
        RuntimeManager::new(
            Database::open_in_memory().unwrap(),
            Arc::new(FixedNameGenerator::new("Lazy Brunch")),
        )
    }

    #[tokio::test]
    async fn test_manager_runs_conversation_per_chat() {
        let manager = manager();

        manager
            .dispatch(1, alice(), "/create".to_string())
            .await
            .unwrap();
        manager
            .dispatch(1, bob(), "Picnic".to_string())
            .await
            .unwrap();

        // Chat 2 is independent
        let replies = manager
            .dispatch(2, bob(), "Picnic".to_string())
            .await
            .unwrap();
        assert!(replies.is_empty());
        assert!(manager.conversation_state(2).await.is_terminal());

        // Any member of chat 1 may continue the conversation
        let replies = manager
            .dispatch(1, bob(), "/add_me@activity_bot".to_string())
            .await
            .unwrap();
        assert_eq!(texts(&replies), vec!["Bob, okay. Anyone else?"]);
        assert!(matches!(
            manager.conversation_state(1).await,
            ConvState::AddingParticipant { .. }
        ));

        manager.dispatch(1, alice(), "/preview".to_string()).await.unwrap();
        let replies = manager
            .dispatch(1, alice(), "/confirm".to_string())
            .await
            .unwrap();
        assert_eq!(texts(&replies), vec!["✅ Activity saved."]);

        let activity = manager.db().get_activity(1, "Picnic").unwrap();
        assert_eq!(activity.participants.len(), 1);
        assert!(manager.db().list_activities(2).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_manager_creates_users_lazily() {
        let manager = manager();
        assert!(manager.db().find_user_by_telegram_id(42).unwrap().is_none());

        let replies = manager.dispatch(5, bob(), "/start".to_string()).await.unwrap();
        assert_eq!(texts(&replies), vec![crate::commands::START_REPLY]);
        assert!(manager.db().find_user_by_telegram_id(42).unwrap().is_some());

        // Plain chatter also registers the sender, once
        manager.dispatch(5, alice(), "hi".to_string()).await.unwrap();
        manager.dispatch(6, alice(), "hi".to_string()).await.unwrap();
        assert!(manager.db().find_user_by_telegram_id(7).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_manager_keeps_runtimes_only_for_open_conversations() {
        let manager = manager();

        // Chatter in idle chats never starts a runtime
        for chat_id in 0..50 {
            let replies = manager
                .dispatch(chat_id, alice(), "hello".to_string())
                .await
                .unwrap();
            assert!(replies.is_empty());
        }
        let replies = manager
            .dispatch(7, alice(), "/preview".to_string())
            .await
            .unwrap();
        assert!(replies.is_empty());
        assert_eq!(manager.open_conversations().await, 0);

        // Cancel releases the runtime
        manager.dispatch(1, alice(), "/create".to_string()).await.unwrap();
        assert_eq!(manager.open_conversations().await, 1);
        manager.dispatch(1, alice(), "/cancel".to_string()).await.unwrap();
        assert_eq!(manager.open_conversations().await, 0);

        // So does a successful commit
        for text in ["/create", "Picnic", "Alice", "/preview", "/confirm"] {
            manager.dispatch(2, alice(), text.to_string()).await.unwrap();
        }
        assert_eq!(manager.open_conversations().await, 0);
        assert!(manager.conversation_state(2).await.is_terminal());

        // An unfinished draft keeps its runtime
        for text in ["/create", "Hike", "Bob", "/preview"] {
            manager.dispatch(3, alice(), text.to_string()).await.unwrap();
        }
        assert_eq!(manager.open_conversations().await, 1);

        // A chat can start over once its runtime is gone
        let replies = manager
            .dispatch(2, bob(), "/create".to_string())
            .await
            .unwrap();
        assert_eq!(replies.len(), 1);
        assert!(matches!(
            manager.conversation_state(2).await,
            ConvState::ChoosingName { .. }
        ));
        assert_eq!(manager.open_conversations().await, 2);
    }

    #[tokio::test]
    async fn test_manager_serialises_turns_within_chat() {
        let manager = Arc::new(manager());
        manager
            .dispatch(3, alice(), "/create".to_string())
            .await
            .unwrap();
        manager
            .dispatch(3, alice(), "Relay".to_string())
            .await
            .unwrap();

        let mut tasks = Vec::new();
        for i in 0..20 {
            let manager = manager.clone();
            tasks.push(tokio::spawn(async move {
                manager
                    .dispatch(3, Sender::new(100 + i, format!("Runner {i}")), "/add_me".to_string())
                    .await
                    .unwrap()
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let state = manager.conversation_state(3).await;
        assert_eq!(state.draft().unwrap().participants.len(), 20);
    }
}
