//! Database schema and types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    telegram_id INTEGER NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS activities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL DEFAULT '',
    chat_id INTEGER NOT NULL,
    created_at TEXT NOT NULL,

    CONSTRAINT unique_name_in_chat UNIQUE (chat_id, name)
);

CREATE INDEX IF NOT EXISTS idx_activities_chat ON activities(chat_id);

CREATE TABLE IF NOT EXISTS participants (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    telegram_id INTEGER,
    name TEXT NOT NULL,
    counter INTEGER NOT NULL DEFAULT 0 CHECK (counter >= 0),
    activity_id INTEGER NOT NULL,

    FOREIGN KEY (activity_id) REFERENCES activities(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_participants_activity ON participants(activity_id);
";

/// A chat platform user, created on first contact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub telegram_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A persisted activity together with its participants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub name: String,
    pub chat_id: i64,
    pub created_at: DateTime<Utc>,
    pub participants: Vec<Participant>,
}

/// Someone attached to an activity.
///
/// Deliberately not `PartialEq`: identity is decided by [`Participant::same_as`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Row id, `None` until the owning activity is committed
    pub id: Option<i64>,
    /// Chat platform user id, only known for self-added participants
    pub telegram_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub counter: u32,
    pub activity_id: Option<i64>,
}

impl Participant {
    /// Participant typed in by name, with no platform identity
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            telegram_id: None,
            name: name.into(),
            counter: 0,
            activity_id: None,
        }
    }

    /// Participant backed by a chat platform user
    pub fn with_telegram_id(name: impl Into<String>, telegram_id: i64) -> Self {
        Self {
            telegram_id: Some(telegram_id),
            ..Self::named(name)
        }
    }

    /// Identity check used for duplicate detection.
    ///
    /// Persisted ids win when both sides have one, then platform ids, and only
    /// then the exact (case-sensitive) name.
    pub fn same_as(&self, other: &Participant) -> bool {
        if let (Some(a), Some(b)) = (self.id, other.id) {
            return a == b;
        }
        if let (Some(a), Some(b)) = (self.telegram_id, other.telegram_id) {
            return a == b;
        }
        self.name == other.name
    }
}
