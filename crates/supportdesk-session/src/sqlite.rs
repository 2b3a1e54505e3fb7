//! `SQLite`-backed session storage.
//!
//! Database path: `{data_dir}/support.db`
//!
//! Each statement runs in its own autocommit transaction, so a write is on
//! disk by the time the call returns.

use crate::store::SessionStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use supportdesk_core::{DeskError, DeskResult, Message, Role, SessionRecord};
use tracing::info;

const SCHEMA: &str = "
    PRAGMA foreign_keys = ON;
    CREATE TABLE IF NOT EXISTS sessions (
        id          TEXT PRIMARY KEY,
        created_at  INTEGER NOT NULL,
        updated_at  INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS messages (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id  TEXT NOT NULL,
        role        TEXT NOT NULL,
        content     TEXT NOT NULL,
        created_at  INTEGER NOT NULL,
        FOREIGN KEY (session_id) REFERENCES sessions(id)
    );
    CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id, id);
    CREATE INDEX IF NOT EXISTS idx_sessions_updated ON sessions(updated_at);
";

/// Durable session store on a single `SQLite` file.
pub struct SqliteSessionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSessionStore {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open(path: &Path) -> DeskResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(store_err)?;
        info!(path = %path.display(), "Opened session database");
        Self::from_connection(conn)
    }

    /// A private in-memory database, mostly for tests.
    pub fn open_in_memory() -> DeskResult<Self> {
        let conn = Connection::open_in_memory().map_err(store_err)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> DeskResult<Self> {
        conn.execute_batch(SCHEMA).map_err(store_err)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking database operation off the async runtime.
    async fn with_conn<T, F>(&self, op: F) -> DeskResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> DeskResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            op(&guard)
        })
        .await
        .map_err(|e| DeskError::Session(format!("Store task failed: {e}")))?
    }
}

fn store_err(e: rusqlite::Error) -> DeskError {
    DeskError::Session(e.to_string())
}

fn from_millis(ms: i64) -> DeskResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| DeskError::Session(format!("Invalid stored timestamp: {ms}")))
}

type MessageRow = (i64, String, String, String, i64);

fn query_messages(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> DeskResult<Vec<Message>> {
    let mut stmt = conn.prepare(sql).map_err(store_err)?;
    let rows = stmt
        .query_map(params, |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
            ))
        })
        .map_err(store_err)?
        .collect::<Result<Vec<MessageRow>, _>>()
        .map_err(store_err)?;

    rows.into_iter()
        .map(|(id, session_id, role, content, created_at)| {
            Ok(Message {
                id,
                session_id,
                role: Role::parse(&role)?,
                content,
                created_at: from_millis(created_at)?,
            })
        })
        .collect()
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn create_session_if_absent(&self, id: &str) -> DeskResult<bool> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let now = Utc::now().timestamp_millis();
            let inserted = conn
                .execute(
                    "INSERT OR IGNORE INTO sessions (id, created_at, updated_at)
                     VALUES (?1, ?2, ?2)",
                    params![id, now],
                )
                .map_err(store_err)?;
            Ok(inserted > 0)
        })
        .await
    }

    async fn touch_session(&self, id: &str) -> DeskResult<()> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let now = Utc::now().timestamp_millis();
            let updated = conn
                .execute(
                    "UPDATE sessions SET updated_at = ?2 WHERE id = ?1",
                    params![id, now],
                )
                .map_err(store_err)?;
            if updated == 0 {
                return Err(DeskError::Session(format!("Session not found: {id}")));
            }
            Ok(())
        })
        .await
    }

    async fn insert_message(
        &self,
        session_id: &str,
        role: Role,
        content: &str,
    ) -> DeskResult<Message> {
        let session_id = session_id.to_string();
        let content = content.to_string();
        self.with_conn(move |conn| {
            // Stamped under the connection lock so id order and time order agree.
            let mut message = Message::new(session_id, role, content);
            message.created_at = from_millis(message.created_at.timestamp_millis())?;
            conn.execute(
                "INSERT INTO messages (session_id, role, content, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    message.session_id,
                    message.role.as_str(),
                    message.content,
                    message.created_at.timestamp_millis()
                ],
            )
            .map_err(store_err)?;
            message.id = conn.last_insert_rowid();
            Ok(message)
        })
        .await
    }

    async fn list_recent_messages(
        &self,
        session_id: &str,
        limit: usize,
    ) -> DeskResult<Vec<Message>> {
        let session_id = session_id.to_string();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            query_messages(
                conn,
                "SELECT id, session_id, role, content, created_at
                 FROM messages
                 WHERE session_id = ?1
                 ORDER BY id DESC
                 LIMIT ?2",
                params![session_id, limit],
            )
        })
        .await
    }

    async fn list_all_messages(&self, session_id: &str) -> DeskResult<Vec<Message>> {
        let session_id = session_id.to_string();
        self.with_conn(move |conn| {
            query_messages(
                conn,
                "SELECT id, session_id, role, content, created_at
                 FROM messages
                 WHERE session_id = ?1
                 ORDER BY id ASC",
                params![session_id],
            )
        })
        .await
    }

    async fn list_sessions(&self) -> DeskResult<Vec<SessionRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, created_at, updated_at
                     FROM sessions
                     ORDER BY updated_at DESC, id ASC",
                )
                .map_err(store_err)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                })
                .map_err(store_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(store_err)?;

            rows.into_iter()
                .map(|(id, created_at, updated_at)| {
                    Ok(SessionRecord {
                        id,
                        created_at: from_millis(created_at)?,
                        updated_at: from_millis(updated_at)?,
                    })
                })
                .collect()
        })
        .await
    }

    async fn get_session(&self, id: &str) -> DeskResult<Option<SessionRecord>> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let row = conn
                .query_row(
                    "SELECT id, created_at, updated_at FROM sessions WHERE id = ?1",
                    params![id],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, i64>(2)?,
                        ))
                    },
                )
                .optional()
                .map_err(store_err)?;

            row.map(|(id, created_at, updated_at)| {
                Ok(SessionRecord {
                    id,
                    created_at: from_millis(created_at)?,
                    updated_at: from_millis(updated_at)?,
                })
            })
            .transpose()
        })
        .await
    }
}
