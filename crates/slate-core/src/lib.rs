//! Slate Core — Director Orchestration
//!
//! The conversational brief-collection engine behind Slate's video
//! pipeline. A guided slot-filling conversation accumulates a campaign
//! brief (goal, audience, platform, duration, key message, CTA plus
//! optional tone, style, assets, constraints), renders it for review, and
//! hands the confirmed brief to the creative-generation collaborator.
//!
//! # Architecture
//!
//! - [`slots`] — the canonical brief schema, normalization, readiness
//! - [`extractor`] — deterministic rule-based slot extraction from text
//! - [`stage`] — the ordered stage sequence of the conversation
//! - [`policy`] — which question to ask next, with quick replies
//! - [`store`] — SQLite-backed sessions and append-only transcripts
//! - [`orchestrator`] — the per-turn driver tying it all together
//! - [`blueprint`] — the shot-blueprint builder (fast path)
//! - [`library`] — immutable reference data (goals, platforms, rules)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod blueprint;
pub mod error;
pub mod extractor;
pub mod library;
pub mod orchestrator;
pub mod policy;
pub mod session;
pub mod slots;
pub mod stage;
pub mod store;

pub use blueprint::{build_blueprint, BlueprintBeat, BlueprintMeta, ShotBlueprint};
pub use error::{Error, Result};
pub use library::Library;
pub use orchestrator::{DirectorOrchestrator, ReadyFlags, TurnResponse};
pub use session::{canonicalize_session_id, MessageRole, Session, StoredMessage};
pub use slots::Slots;
pub use stage::Stage;
pub use store::SessionStore;
