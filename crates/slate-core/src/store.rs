//! SessionStore — SQLite persistence for director sessions and transcripts.
//!
//! Tables: `sessions`, `messages`. The per-turn mutation (merge slots +
//! advance stage + append messages) runs as one transaction so a crash
//! mid-turn never leaves slots updated without the matching stage and
//! transcript entries.

use crate::error::{Error, Result};
use crate::session::{MessageRole, Session, StoredMessage, ACTIVE_WINDOW_HOURS};
use crate::slots::Slots;
use crate::stage::Stage;
use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};
use uuid::Uuid;

/// SQLite-backed session store.
#[derive(Clone)]
pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    /// Open (or create) a session store at the given path.
    pub async fn from_path(db_path: &std::path::Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Internal(format!("mkdir: {e}")))?;
        }
        let url = format!("sqlite:{}?mode=rwc", db_path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        // Enable WAL for read/write concurrency
        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&pool)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("Session store initialized at {}", db_path.display());
        Ok(store)
    }

    /// In-memory store (for tests).
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.run_migrations().await?;
        debug!("In-memory session store initialized");
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS sessions (
                id         TEXT PRIMARY KEY,
                user_id    TEXT NOT NULL,
                stage      TEXT NOT NULL,
                slots      TEXT NOT NULL,
                project_id TEXT,
                archived   INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_sessions_user
             ON sessions(user_id, archived, updated_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS messages (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL REFERENCES sessions(id),
                role       TEXT NOT NULL,
                content    TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_session
             ON messages(session_id, id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ── Sessions ────────────────────────────────────────────────

    /// Create a session. Idempotent: creating an id that already exists
    /// returns the existing session unchanged.
    pub async fn create_session(&self, user_id: &str, id: Option<Uuid>) -> Result<Session> {
        let id = id.unwrap_or_else(Uuid::new_v4);
        let now = Utc::now();
        sqlx::query(
            "INSERT OR IGNORE INTO sessions
             (id, user_id, stage, slots, project_id, archived, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, NULL, 0, ?5, ?5)",
        )
        .bind(id.to_string())
        .bind(user_id)
        .bind(Stage::default().as_str())
        .bind(serde_json::to_string(&Slots::default())?)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;
        debug!(session_id = %id, user_id, "session created or reused");
        self.get(id).await
    }

    /// Fetch a session, failing with NotFound when absent.
    pub async fn get(&self, id: Uuid) -> Result<Session> {
        self.try_get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("session {id}")))
    }

    /// Fetch a session if it exists.
    pub async fn try_get(&self, id: Uuid) -> Result<Option<Session>> {
        let row = sqlx::query(
            "SELECT id, user_id, stage, slots, project_id, archived, created_at, updated_at
             FROM sessions WHERE id = ?1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_session).transpose()
    }

    /// The active session for implicit reuse: the most recently updated
    /// unarchived session for the user within the recency window, if any.
    pub async fn active_session(&self, user_id: &str) -> Result<Option<Session>> {
        let cutoff = Utc::now() - Duration::hours(ACTIVE_WINDOW_HOURS);
        let row = sqlx::query(
            "SELECT id, user_id, stage, slots, project_id, archived, created_at, updated_at
             FROM sessions
             WHERE user_id = ?1 AND archived = 0 AND updated_at >= ?2
             ORDER BY updated_at DESC
             LIMIT 1",
        )
        .bind(user_id)
        .bind(cutoff.to_rfc3339())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_session).transpose()
    }

    /// Load or create the session for a turn.
    ///
    /// Without an explicit id: reuse the active session or create a fresh
    /// one. With an explicit id: fetch it, creating it when absent
    /// (idempotent creation, so duplicate client retries converge).
    pub async fn get_or_create_active(
        &self,
        user_id: &str,
        explicit: Option<Uuid>,
    ) -> Result<Session> {
        match explicit {
            Some(id) => self.create_session(user_id, Some(id)).await,
            None => match self.active_session(user_id).await? {
                Some(session) => Ok(session),
                None => self.create_session(user_id, None).await,
            },
        }
    }

    /// Merge a slot delta into a session (last-write-wins per key).
    /// Fails with NotFound for a missing session; nothing is absorbed
    /// silently.
    pub async fn merge_slots(&self, id: Uuid, delta: &Slots) -> Result<Slots> {
        let mut tx = self.pool.begin().await?;
        let session = Self::fetch_for_update(&mut tx, id).await?;
        let mut slots = session.slots;
        slots.merge(delta.clone());
        sqlx::query("UPDATE sessions SET slots = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(serde_json::to_string(&slots)?)
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(slots)
    }

    /// Set the session's stage.
    pub async fn advance_stage(&self, id: Uuid, stage: Stage) -> Result<()> {
        let result = sqlx::query("UPDATE sessions SET stage = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(stage.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("session {id}")));
        }
        Ok(())
    }

    /// Archive a session. Archived sessions are kept, never deleted, and
    /// never reused by `get_or_create_active`.
    pub async fn archive(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("UPDATE sessions SET archived = 1, updated_at = ?1 WHERE id = ?2")
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("session {id}")));
        }
        Ok(())
    }

    /// Record the project linkage created by a brief commit.
    pub async fn link_project(&self, id: Uuid, project_id: Uuid) -> Result<()> {
        let result =
            sqlx::query("UPDATE sessions SET project_id = ?1, updated_at = ?2 WHERE id = ?3")
                .bind(project_id.to_string())
                .bind(Utc::now().to_rfc3339())
                .bind(id.to_string())
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("session {id}")));
        }
        Ok(())
    }

    // ── Transcript ──────────────────────────────────────────────

    /// Append one transcript entry.
    pub async fn append_message(&self, id: Uuid, role: MessageRole, content: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO messages (session_id, role, content, created_at)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(id.to_string())
        .bind(role.to_string())
        .bind(content)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// The last `limit` transcript entries, in insertion order.
    pub async fn recent_messages(&self, id: Uuid, limit: u32) -> Result<Vec<StoredMessage>> {
        let rows = sqlx::query(
            "SELECT role, content, created_at FROM messages
             WHERE session_id = ?1 ORDER BY id DESC LIMIT ?2",
        )
        .bind(id.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        let mut messages: Vec<StoredMessage> = rows
            .iter()
            .map(Self::row_to_message)
            .collect::<Result<_>>()?;
        messages.reverse();
        Ok(messages)
    }

    // ── Atomic turn unit ────────────────────────────────────────

    /// Persist one conversational turn as a single transaction: merge the
    /// slot delta, set the new stage, append the user utterance (when
    /// given) and the assistant reply. Either all of it lands or none.
    pub async fn apply_turn(
        &self,
        id: Uuid,
        delta: &Slots,
        stage: Stage,
        user_text: Option<&str>,
        assistant_text: &str,
    ) -> Result<Slots> {
        let mut tx = self.pool.begin().await?;
        let session = Self::fetch_for_update(&mut tx, id).await?;
        let mut slots = session.slots;
        slots.merge(delta.clone());
        let now = Utc::now();

        sqlx::query("UPDATE sessions SET slots = ?1, stage = ?2, updated_at = ?3 WHERE id = ?4")
            .bind(serde_json::to_string(&slots)?)
            .bind(stage.as_str())
            .bind(now.to_rfc3339())
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        if let Some(text) = user_text {
            Self::insert_message(&mut tx, id, MessageRole::User, text, now).await?;
        }
        Self::insert_message(&mut tx, id, MessageRole::Assistant, assistant_text, now).await?;

        tx.commit().await?;
        debug!(session_id = %id, stage = %stage, "turn persisted");
        Ok(slots)
    }

    /// Persist a successful brief-commit handoff as a single transaction:
    /// project linkage, stage transition, and the assistant message.
    pub async fn finish_handoff(
        &self,
        id: Uuid,
        project_id: Uuid,
        stage: Stage,
        assistant_text: &str,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE sessions SET project_id = ?1, stage = ?2, updated_at = ?3 WHERE id = ?4",
        )
        .bind(project_id.to_string())
        .bind(stage.as_str())
        .bind(now.to_rfc3339())
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("session {id}")));
        }
        Self::insert_message(&mut tx, id, MessageRole::Assistant, assistant_text, now).await?;
        tx.commit().await?;
        Ok(())
    }

    // ── Row mapping ─────────────────────────────────────────────

    async fn fetch_for_update(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        id: Uuid,
    ) -> Result<Session> {
        let row = sqlx::query(
            "SELECT id, user_id, stage, slots, project_id, archived, created_at, updated_at
             FROM sessions WHERE id = ?1",
        )
        .bind(id.to_string())
        .fetch_optional(&mut **tx)
        .await?;
        match row {
            Some(row) => Self::row_to_session(&row),
            None => Err(Error::NotFound(format!("session {id}"))),
        }
    }

    async fn insert_message(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        id: Uuid,
        role: MessageRole,
        content: &str,
        at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO messages (session_id, role, content, created_at)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(id.to_string())
        .bind(role.to_string())
        .bind(content)
        .bind(at.to_rfc3339())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    fn parse_time(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn row_to_session(row: &SqliteRow) -> Result<Session> {
        let id_str: String = row.try_get("id")?;
        let stage_str: String = row.try_get("stage")?;
        let slots_str: String = row.try_get("slots")?;
        let project_str: Option<String> = row.try_get("project_id")?;
        let created_str: String = row.try_get("created_at")?;
        let updated_str: String = row.try_get("updated_at")?;
        Ok(Session {
            id: Uuid::parse_str(&id_str)
                .map_err(|e| Error::Internal(format!("bad session id {id_str}: {e}")))?,
            user_id: row.try_get("user_id")?,
            stage: Stage::from_str_lossy(&stage_str),
            slots: serde_json::from_str(&slots_str)?,
            project_id: project_str.and_then(|p| Uuid::parse_str(&p).ok()),
            archived: row.try_get::<i64, _>("archived")? != 0,
            created_at: Self::parse_time(&created_str),
            updated_at: Self::parse_time(&updated_str),
        })
    }

    fn row_to_message(row: &SqliteRow) -> Result<StoredMessage> {
        let role_str: String = row.try_get("role")?;
        let created_str: String = row.try_get("created_at")?;
        Ok(StoredMessage {
            role: MessageRole::from_str_lossy(&role_str),
            content: row.try_get("content")?,
            created_at: Self::parse_time(&created_str),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SessionStore {
        SessionStore::in_memory().await.unwrap()
    }

    fn delta(cta: &str) -> Slots {
        Slots {
            cta: Some(cta.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_session_is_idempotent() {
        let store = store().await;
        let id = Uuid::new_v4();
        let first = store.create_session("alice", Some(id)).await.unwrap();
        store
            .merge_slots(id, &delta("Shop now"))
            .await
            .unwrap();
        let second = store.create_session("alice", Some(id)).await.unwrap();
        assert_eq!(first.id, second.id);
        // Re-creating did not wipe accumulated slots.
        assert_eq!(second.slots.cta.as_deref(), Some("Shop now"));
    }

    #[tokio::test]
    async fn test_get_or_create_reuses_recent_session() {
        let store = store().await;
        let created = store.get_or_create_active("alice", None).await.unwrap();
        let reused = store.get_or_create_active("alice", None).await.unwrap();
        assert_eq!(created.id, reused.id);

        // A different user gets their own session.
        let other = store.get_or_create_active("bob", None).await.unwrap();
        assert_ne!(created.id, other.id);
    }

    #[tokio::test]
    async fn test_archived_session_is_not_reused() {
        let store = store().await;
        let created = store.get_or_create_active("alice", None).await.unwrap();
        store.archive(created.id).await.unwrap();
        let fresh = store.get_or_create_active("alice", None).await.unwrap();
        assert_ne!(created.id, fresh.id);
        // The archived session still exists.
        let archived = store.get(created.id).await.unwrap();
        assert!(archived.archived);
    }

    #[tokio::test]
    async fn test_merge_slots_missing_session_is_not_found() {
        let store = store().await;
        let err = store
            .merge_slots(Uuid::new_v4(), &delta("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_advance_stage_missing_session_is_not_found() {
        let store = store().await;
        let err = store
            .advance_stage(Uuid::new_v4(), Stage::ReviewBrief)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_merge_is_per_key_last_write_wins() {
        let store = store().await;
        let session = store.create_session("alice", None).await.unwrap();
        store
            .merge_slots(
                session.id,
                &Slots {
                    goal: Some("Brand awareness".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let merged = store.merge_slots(session.id, &delta("Shop now")).await.unwrap();
        assert_eq!(merged.goal.as_deref(), Some("Brand awareness"));
        assert_eq!(merged.cta.as_deref(), Some("Shop now"));
    }

    #[tokio::test]
    async fn test_transcript_is_append_only_and_ordered() {
        let store = store().await;
        let session = store.create_session("alice", None).await.unwrap();
        store
            .append_message(session.id, MessageRole::User, "hi")
            .await
            .unwrap();
        store
            .append_message(session.id, MessageRole::Assistant, "hello")
            .await
            .unwrap();
        store
            .append_message(session.id, MessageRole::User, "tiktok 30s")
            .await
            .unwrap();

        let messages = store.recent_messages(session.id, 10).await.unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, "hi");
        assert_eq!(messages[2].content, "tiktok 30s");
        assert_eq!(messages[1].role, MessageRole::Assistant);

        // Limit keeps the most recent entries, still chronological.
        let tail = store.recent_messages(session.id, 2).await.unwrap();
        assert_eq!(tail[0].content, "hello");
        assert_eq!(tail[1].content, "tiktok 30s");
    }

    #[tokio::test]
    async fn test_apply_turn_is_atomic_unit() {
        let store = store().await;
        let session = store.create_session("alice", None).await.unwrap();
        let slots = store
            .apply_turn(
                session.id,
                &delta("Shop now"),
                Stage::AskToneStyle,
                Some("cta: Shop now"),
                "Any preferred tone or style?",
            )
            .await
            .unwrap();
        assert_eq!(slots.cta.as_deref(), Some("Shop now"));

        let reloaded = store.get(session.id).await.unwrap();
        assert_eq!(reloaded.stage, Stage::AskToneStyle);
        let messages = store.recent_messages(session.id, 10).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[1].role, MessageRole::Assistant);
    }

    #[tokio::test]
    async fn test_apply_turn_missing_session_mutates_nothing() {
        let store = store().await;
        let err = store
            .apply_turn(Uuid::new_v4(), &delta("x"), Stage::AskGoal, None, "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_finish_handoff_links_project_and_stage() {
        let store = store().await;
        let session = store.create_session("alice", None).await.unwrap();
        let project = Uuid::new_v4();
        store
            .finish_handoff(session.id, project, Stage::CreativeGeneration, "Generating…")
            .await
            .unwrap();
        let reloaded = store.get(session.id).await.unwrap();
        assert_eq!(reloaded.project_id, Some(project));
        assert_eq!(reloaded.stage, Stage::CreativeGeneration);
    }

    #[tokio::test]
    async fn test_concurrent_disjoint_merges_commute() {
        let store = store().await;
        let session = store.create_session("alice", None).await.unwrap();
        let a = Slots {
            goal: Some("Brand awareness".into()),
            ..Default::default()
        };
        let b = Slots {
            duration_sec: Some(30),
            ..Default::default()
        };
        // Apply in both orders against two sessions; final values agree.
        let other = store.create_session("bob", None).await.unwrap();
        store.merge_slots(session.id, &a).await.unwrap();
        let ab = store.merge_slots(session.id, &b).await.unwrap();
        store.merge_slots(other.id, &b).await.unwrap();
        let ba = store.merge_slots(other.id, &a).await.unwrap();
        assert_eq!(ab.goal, ba.goal);
        assert_eq!(ab.duration_sec, ba.duration_sec);
    }
}
