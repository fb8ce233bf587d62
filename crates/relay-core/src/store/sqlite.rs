//! SQLite-backed store for integration records and the conversation log
//!
//! Opened once at startup when a database path is configured. The
//! connection is wrapped in a mutex so the store can be shared across
//! request handlers.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use tracing::{debug, info};

use crate::store::{ConversationEntry, IntegrationRecord, Sender};
use crate::Result;

/// Store for integration records and conversation history
pub struct RelayStore {
    conn: Mutex<Connection>,
}

impl RelayStore {
    /// Create a new store at the given database path
    pub fn new(db_path: &str) -> Result<Self> {
        debug!("Opening relay database at: {}", db_path);
        let conn = Connection::open(db_path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_tables()?;
        info!("RelayStore initialized");
        Ok(store)
    }

    /// Create an in-memory store (useful for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_tables()?;
        Ok(store)
    }

    /// Initialize database tables
    fn init_tables(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "CREATE TABLE IF NOT EXISTS integrations (
                user_id TEXT PRIMARY KEY,
                access_token TEXT NOT NULL,
                waba_id TEXT NOT NULL,
                phone_number TEXT NOT NULL,
                linked_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS conversation_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                sender TEXT NOT NULL,
                message TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_conversation_user
             ON conversation_log (user_id)",
            [],
        )?;

        Ok(())
    }

    /// Insert or update an integration record.
    ///
    /// Merge semantics: re-authorization overwrites the token and
    /// identifiers and bumps `updated_at`, but the original `linked_at` is
    /// preserved.
    pub fn upsert_integration(&self, record: &IntegrationRecord) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO integrations
                (user_id, access_token, waba_id, phone_number, linked_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(user_id) DO UPDATE SET
                access_token = excluded.access_token,
                waba_id = excluded.waba_id,
                phone_number = excluded.phone_number,
                updated_at = excluded.updated_at",
            params![
                record.user_id,
                record.access_token,
                record.waba_id,
                record.phone_number,
                record.linked_at.to_rfc3339(),
                record.updated_at.to_rfc3339(),
            ],
        )?;

        debug!("Upserted integration record for user: {}", record.user_id);
        Ok(())
    }

    /// Load an integration record by user id
    pub fn get_integration(&self, user_id: &str) -> Result<Option<IntegrationRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT user_id, access_token, waba_id, phone_number, linked_at, updated_at
             FROM integrations WHERE user_id = ?1",
        )?;

        let result = stmt.query_row(params![user_id], |row| {
            Ok(IntegrationRecord {
                user_id: row.get(0)?,
                access_token: row.get(1)?,
                waba_id: row.get(2)?,
                phone_number: row.get(3)?,
                linked_at: parse_timestamp(&row.get::<_, String>(4)?),
                updated_at: parse_timestamp(&row.get::<_, String>(5)?),
            })
        });

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Append a conversation log entry
    pub fn append_message(&self, entry: &ConversationEntry) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO conversation_log (user_id, sender, message, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.user_id,
                entry.sender.as_str(),
                entry.message,
                entry.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Most recent conversation entries for a user, newest first
    pub fn recent_messages(&self, user_id: &str, limit: usize) -> Result<Vec<ConversationEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT user_id, sender, message, timestamp FROM conversation_log
             WHERE user_id = ?1
             ORDER BY id DESC
             LIMIT ?2",
        )?;

        let entries = stmt
            .query_map(params![user_id, limit as i64], |row| {
                Ok(ConversationEntry {
                    user_id: row.get(0)?,
                    sender: Sender::parse(&row.get::<_, String>(1)?),
                    message: row.get(2)?,
                    timestamp: parse_timestamp(&row.get::<_, String>(3)?),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Count log entries for a user
    pub fn count_messages(&self, user_id: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM conversation_log WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
