//! Session identity and persisted conversation state.

use crate::slots::Slots;
use crate::stage::Stage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How long an unarchived session stays "active" for implicit reuse.
pub const ACTIVE_WINDOW_HOURS: i64 = 24;

/// Canonicalize an arbitrary client-supplied session token to a stable id.
///
/// A valid UUID passes through unchanged; any other non-empty string maps
/// deterministically to the same UUIDv5; an empty string yields a fresh
/// random id. Idempotent: canonicalizing an already-canonical id is a
/// no-op.
pub fn canonicalize_session_id(raw: &str) -> Uuid {
    let raw = raw.trim();
    if raw.is_empty() {
        return Uuid::new_v4();
    }
    match Uuid::parse_str(raw) {
        Ok(id) => id,
        Err(_) => Uuid::new_v5(&Uuid::NAMESPACE_URL, raw.as_bytes()),
    }
}

/// One ongoing brief-collection conversation.
///
/// Mutated exclusively through the orchestrator; downstream collaborators
/// only read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Stable session id
    pub id: Uuid,
    /// Owning user
    pub user_id: String,
    /// Current stage in the guided progression
    pub stage: Stage,
    /// Accumulated slots, monotonically merged
    pub slots: Slots,
    /// Linked project, absent until the brief is committed
    pub project_id: Option<Uuid>,
    /// Archived sessions are kept but never reused
    pub archived: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Speaker of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User message
    User,
    /// Assistant response
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

impl MessageRole {
    /// Parse from a stored label.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "assistant" => Self::Assistant,
            _ => Self::User,
        }
    }
}

/// One transcript entry: append-only, never mutated after insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Who spoke
    pub role: MessageRole,
    /// Message text
    pub content: String,
    /// When it was recorded
    pub created_at: DateTime<Utc>,
}
