//! Database module for the activity bot
//!
//! Persists users, activities and their participants.

mod schema;

pub use schema::*;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Database lock poisoned")]
    LockPoisoned,
    #[error("Activity not found: {0}")]
    ActivityNotFound(String),
    #[error("Activity already exists in chat: {0}")]
    DuplicateActivity(String),
    #[error("User already exists: {0}")]
    UserExists(i64),
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    // ==================== User Operations ====================

    pub fn find_user_by_telegram_id(&self, telegram_id: i64) -> DbResult<Option<User>> {
        let conn = self.lock()?;
        let user = conn
            .query_row(
                "SELECT id, telegram_id, created_at FROM users WHERE telegram_id = ?1",
                params![telegram_id],
                parse_user_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn create_user(&self, telegram_id: i64) -> DbResult<User> {
        let conn = self.lock()?;
        let now = Utc::now();

        conn.execute(
            "INSERT INTO users (telegram_id, created_at) VALUES (?1, ?2)",
            params![telegram_id, now.to_rfc3339()],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                DbError::UserExists(telegram_id)
            } else {
                DbError::Sqlite(e)
            }
        })?;

        Ok(User {
            id: conn.last_insert_rowid(),
            telegram_id,
            created_at: now,
        })
    }

    // ==================== Activity Operations ====================

    /// Look up an activity by its unique (chat, name) pair
    pub fn find_activity_by_chat_and_name(
        &self,
        chat_id: i64,
        name: &str,
    ) -> DbResult<Option<Activity>> {
        let conn = self.lock()?;
        let activity = conn
            .query_row(
                "SELECT id, name, chat_id, created_at FROM activities
                 WHERE chat_id = ?1 AND name = ?2",
                params![chat_id, name],
                parse_activity_row,
            )
            .optional()?;

        match activity {
            Some(mut activity) => {
                activity.participants = load_participants(&conn, activity.id)?;
                Ok(Some(activity))
            }
            None => Ok(None),
        }
    }

    /// Like [`Self::find_activity_by_chat_and_name`] but a miss is an error
    pub fn get_activity(&self, chat_id: i64, name: &str) -> DbResult<Activity> {
        self.find_activity_by_chat_and_name(chat_id, name)?
            .ok_or_else(|| DbError::ActivityNotFound(name.to_string()))
    }

    /// All activities of a chat, oldest first
    pub fn list_activities(&self, chat_id: i64) -> DbResult<Vec<Activity>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, chat_id, created_at FROM activities
             WHERE chat_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![chat_id], parse_activity_row)?;
        let mut activities = rows.collect::<rusqlite::Result<Vec<_>>>()?;

        for activity in &mut activities {
            activity.participants = load_participants(&conn, activity.id)?;
        }
        Ok(activities)
    }

    /// Insert an activity and all of its participants in one transaction.
    ///
    /// A clash on `unique_name_in_chat` rolls everything back and is reported
    /// as [`DbError::DuplicateActivity`].
    pub fn persist_activity(
        &self,
        chat_id: i64,
        name: &str,
        participants: &[Participant],
    ) -> DbResult<Activity> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = Utc::now();

        tx.execute(
            "INSERT INTO activities (name, chat_id, created_at) VALUES (?1, ?2, ?3)",
            params![name, chat_id, now.to_rfc3339()],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                DbError::DuplicateActivity(name.to_string())
            } else {
                DbError::Sqlite(e)
            }
        })?;
        let activity_id = tx.last_insert_rowid();

        let mut stored = Vec::with_capacity(participants.len());
        for participant in participants {
            tx.execute(
                "INSERT INTO participants (telegram_id, name, counter, activity_id)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    participant.telegram_id,
                    participant.name,
                    participant.counter,
                    activity_id
                ],
            )?;
            stored.push(Participant {
                id: Some(tx.last_insert_rowid()),
                activity_id: Some(activity_id),
                ..participant.clone()
            });
        }

        tx.commit()?;

        Ok(Activity {
            id: activity_id,
            name: name.to_string(),
            chat_id,
            created_at: now,
            participants: stored,
        })
    }
}

fn load_participants(conn: &Connection, activity_id: i64) -> DbResult<Vec<Participant>> {
    let mut stmt = conn.prepare(
        "SELECT id, telegram_id, name, counter, activity_id FROM participants
         WHERE activity_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![activity_id], |row| {
        Ok(Participant {
            id: row.get(0)?,
            telegram_id: row.get(1)?,
            name: row.get(2)?,
            counter: row.get(3)?,
            activity_id: row.get(4)?,
        })
    })?;
    let participants = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(participants)
}

fn parse_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        telegram_id: row.get(1)?,
        created_at: parse_datetime(&row.get::<_, String>(2)?),
    })
}

fn parse_activity_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: row.get(0)?,
        name: row.get(1)?,
        chat_id: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
        participants: vec![],
    })
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
