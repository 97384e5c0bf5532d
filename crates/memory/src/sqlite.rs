//! SQLite conversation store.
//!
//! Uses a single SQLite database file with two tables:
//! - `conversations`: one row per conversation (id, optional title, creation time)
//! - `messages`: one row per turn, ordered by insertion within a conversation
//!
//! Conversation ids are the integer primary key, so they are stable across
//! restarts and increase monotonically.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use taskweave_core::conversation::ConversationStore;
use taskweave_core::error::ConversationError;
use taskweave_core::message::{ConversationId, ConversationTurn, Role};
use tracing::{debug, info};

/// A SQLite-backed conversation store.
pub struct SqliteConversationStore {
    pool: SqlitePool,
}

impl SqliteConversationStore {
    /// Open (or create) the database at `path`.
    ///
    /// Pass `"sqlite::memory:"` for an in-process ephemeral database; the pool
    /// is then limited to a single connection so every query sees the same data.
    pub async fn new(path: &str) -> Result<Self, ConversationError> {
        let ephemeral = path.contains(":memory:");

        let mut options = SqliteConnectOptions::from_str(path)
            .map_err(|e| ConversationError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");
        if !ephemeral {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(if ephemeral { 1 } else { 4 })
            .connect_with(options)
            .await
            .map_err(|e| ConversationError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite conversation store initialized at {path}");
        Ok(store)
    }

    /// Open a database file, creating parent directories as needed.
    pub async fn open(path: &std::path::Path) -> Result<Self, ConversationError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConversationError::Storage(format!("Failed to create database directory: {e}"))
            })?;
        }
        Self::new(&format!("sqlite://{}", path.display())).await
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, ConversationError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), ConversationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                title       TEXT,
                created_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ConversationError::MigrationFailed(format!("conversations table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id  INTEGER NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
                role             TEXT NOT NULL,
                content          TEXT NOT NULL,
                created_at       TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ConversationError::MigrationFailed(format!("messages table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_conversation ON messages(conversation_id, id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ConversationError::MigrationFailed(format!("messages index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Parse a [`ConversationTurn`] from a `messages` row.
    fn row_to_turn(
        id: ConversationId,
        row: &sqlx::sqlite::SqliteRow,
    ) -> Result<ConversationTurn, ConversationError> {
        let role: String = row
            .try_get("role")
            .map_err(|e| ConversationError::QueryFailed(format!("role column: {e}")))?;
        let content: String = row
            .try_get("content")
            .map_err(|e| ConversationError::QueryFailed(format!("content column: {e}")))?;
        let created_at: String = row
            .try_get("created_at")
            .map_err(|e| ConversationError::QueryFailed(format!("created_at column: {e}")))?;

        let role = Role::from_str(&role).map_err(ConversationError::QueryFailed)?;
        let timestamp = chrono::DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                ConversationError::QueryFailed(format!("created_at '{created_at}': {e}"))
            })?;

        Ok(ConversationTurn {
            conversation_id: id,
            role,
            content,
            timestamp,
        })
    }

    /// Title of a conversation, if it exists and has one.
    pub async fn title(&self, id: ConversationId) -> Result<Option<String>, ConversationError> {
        let row = sqlx::query("SELECT title FROM conversations WHERE id = ?1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ConversationError::QueryFailed(format!("title: {e}")))?;

        match row {
            Some(row) => row
                .try_get::<Option<String>, _>("title")
                .map_err(|e| ConversationError::QueryFailed(format!("title column: {e}"))),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ConversationStore for SqliteConversationStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn create(&self, title: Option<&str>) -> Result<ConversationId, ConversationError> {
        let result = sqlx::query("INSERT INTO conversations (title, created_at) VALUES (?1, ?2)")
            .bind(title)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| ConversationError::Storage(format!("Insert conversation: {e}")))?;

        let id = ConversationId(result.last_insert_rowid());
        debug!(conversation_id = %id, "Created conversation");
        Ok(id)
    }

    async fn exists(&self, id: ConversationId) -> Result<bool, ConversationError> {
        let row = sqlx::query("SELECT 1 FROM conversations WHERE id = ?1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ConversationError::QueryFailed(format!("exists: {e}")))?;
        Ok(row.is_some())
    }

    async fn append(&self, id: ConversationId, role: Role, content: &str) -> Result<(), ConversationError> {
        if !self.exists(id).await? {
            return Err(ConversationError::NotFound(id.0));
        }

        sqlx::query(
            "INSERT INTO messages (conversation_id, role, content, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(id.0)
        .bind(role.as_str())
        .bind(content)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| ConversationError::Storage(format!("Insert message: {e}")))?;

        Ok(())
    }

    async fn append_exchange(
        &self,
        id: ConversationId,
        user: &str,
        assistant: &str,
    ) -> Result<(), ConversationError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ConversationError::Storage(format!("Begin transaction: {e}")))?;

        let found = sqlx::query("SELECT 1 FROM conversations WHERE id = ?1")
            .bind(id.0)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| ConversationError::QueryFailed(format!("exists: {e}")))?;
        if found.is_none() {
            return Err(ConversationError::NotFound(id.0));
        }

        let now = Utc::now().to_rfc3339();
        for (role, content) in [(Role::User, user), (Role::Assistant, assistant)] {
            sqlx::query(
                "INSERT INTO messages (conversation_id, role, content, created_at) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(id.0)
            .bind(role.as_str())
            .bind(content)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(|e| ConversationError::Storage(format!("Insert message: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| ConversationError::Storage(format!("Commit exchange: {e}")))?;
        Ok(())
    }

    async fn history(&self, id: ConversationId) -> Result<Vec<ConversationTurn>, ConversationError> {
        let rows = sqlx::query(
            "SELECT role, content, created_at FROM messages WHERE conversation_id = ?1 ORDER BY id ASC",
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ConversationError::QueryFailed(format!("history: {e}")))?;

        rows.iter().map(|row| Self::row_to_turn(id, row)).collect()
    }
}
