//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::db::{Activity, Database, User};
use crate::state_machine::ActivityDraft;
use async_trait::async_trait;
use std::sync::Arc;

/// Storage for chat users
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>, String>;

    async fn create_user(&self, telegram_id: i64) -> Result<User, String>;

    /// Find the user, creating it on first contact
    async fn ensure_user(&self, telegram_id: i64) -> Result<User, String> {
        if let Some(user) = self.find_user_by_telegram_id(telegram_id).await? {
            return Ok(user);
        }
        match self.create_user(telegram_id).await {
            Ok(user) => Ok(user),
            // Another chat created the same user in between
            Err(e) => self.find_user_by_telegram_id(telegram_id).await?.ok_or(e),
        }
    }
}

/// Storage for activities
#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn find_activity_by_chat_and_name(
        &self,
        chat_id: i64,
        name: &str,
    ) -> Result<Option<Activity>, String>;

    /// Commit a draft and its participants atomically
    async fn persist_activity(&self, draft: &ActivityDraft) -> Result<Activity, String>;
}

/// Combined storage trait for convenience
pub trait Storage: UserStore + ActivityStore {}
impl<T: UserStore + ActivityStore> Storage for T {}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: UserStore + ?Sized> UserStore for Arc<T> {
    async fn find_user_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>, String> {
        (**self).find_user_by_telegram_id(telegram_id).await
    }

    async fn create_user(&self, telegram_id: i64) -> Result<User, String> {
        (**self).create_user(telegram_id).await
    }
}

#[async_trait]
impl<T: ActivityStore + ?Sized> ActivityStore for Arc<T> {
    async fn find_activity_by_chat_and_name(
        &self,
        chat_id: i64,
        name: &str,
    ) -> Result<Option<Activity>, String> {
        (**self).find_activity_by_chat_and_name(chat_id, name).await
    }

    async fn persist_activity(&self, draft: &ActivityDraft) -> Result<Activity, String> {
        (**self).persist_activity(draft).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use Database as Storage
#[derive(Clone)]
pub struct DatabaseStorage {
    db: Database,
}

impl DatabaseStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for DatabaseStorage {
    async fn find_user_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>, String> {
        self.db
            .find_user_by_telegram_id(telegram_id)
            .map_err(|e| e.to_string())
    }

    async fn create_user(&self, telegram_id: i64) -> Result<User, String> {
        self.db.create_user(telegram_id).map_err(|e| e.to_string())
    }
}

#[async_trait]
impl ActivityStore for DatabaseStorage {
    async fn find_activity_by_chat_and_name(
        &self,
        chat_id: i64,
        name: &str,
    ) -> Result<Option<Activity>, String> {
        self.db
            .find_activity_by_chat_and_name(chat_id, name)
            .map_err(|e| e.to_string())
    }

    async fn persist_activity(&self, draft: &ActivityDraft) -> Result<Activity, String> {
        self.db
            .persist_activity(draft.chat_id, &draft.name, &draft.participants)
            .map_err(|e| e.to_string())
    }
}
