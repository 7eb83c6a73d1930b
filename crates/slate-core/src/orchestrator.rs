//! The director orchestrator: drives the guided brief conversation one
//! turn at a time.
//!
//! Each turn: load or create the session, extract a slot delta from the
//! user's text, merge it, then either short-circuit (review-stage
//! confirmation hands off to creative generation; a blueprint intent
//! builds a shot blueprint directly) or compute the next prompt and
//! auto-advance the stage. The merged slots, new stage, and both
//! transcript entries persist as one transaction.

use crate::blueprint::{build_blueprint, ShotBlueprint};
use crate::error::{Error, Result};
use crate::extractor::extract;
use crate::library::Library;
use crate::policy::{next_prompt, review_prompt, stage_guidance};
use crate::session::{canonicalize_session_id, MessageRole, Session};
use crate::slots::Slots;
use crate::stage::Stage;
use crate::store::SessionStore;
use regex::Regex;
use serde::{Deserialize, Serialize};
use slate_gen::{CreativeGenerator, CreativeOption, Storyboard};
use std::sync::{Arc, LazyLock};
use tracing::{info, instrument, warn};
use uuid::Uuid;

static RE_AFFIRM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(looks good|ok|okay|confirm|proceed|go ahead)\b").unwrap()
});

fn is_blueprint_intent(lowered: &str) -> bool {
    lowered == "blueprint" || lowered == "generate blueprint" || lowered.contains("generate the blueprint")
}

/// Front-end switches that unlock downstream actions.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ReadyFlags {
    /// All required slots are filled
    pub can_generate_creatives: bool,
    /// A project has been created from the brief
    pub can_storyboard: bool,
    /// A storyboard exists for the project
    pub can_build_veo3_prompt: bool,
    /// The package can be exported
    pub can_export: bool,
}

impl ReadyFlags {
    fn compute(slots: &Slots, project_id: Option<Uuid>, stage: Stage) -> ReadyFlags {
        ReadyFlags {
            can_generate_creatives: slots.is_ready(),
            can_storyboard: project_id.is_some(),
            can_build_veo3_prompt: stage >= Stage::StoryboardReady,
            can_export: stage >= Stage::StoryboardReady,
        }
    }
}

/// Everything a client needs to render one assistant turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResponse {
    /// Session the turn belongs to
    pub session_id: Uuid,
    /// Assistant message text
    pub message: String,
    /// Director recommendation hint
    pub recommendation: String,
    /// Quick-reply suggestions
    pub quick_replies: Vec<String>,
    /// Stage after the turn
    pub stage: Stage,
    /// Slots after the turn
    pub slots: Slots,
    /// Downstream action switches
    pub ready_flags: ReadyFlags,
    /// Present when the turn produced a shot blueprint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blueprint: Option<ShotBlueprint>,
    /// Present when the turn handed off into creative generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creative_options: Option<Vec<CreativeOption>>,
}

/// The conversation driver. Cheap to clone; state lives in the store.
#[derive(Clone)]
pub struct DirectorOrchestrator {
    store: SessionStore,
    generator: Arc<dyn CreativeGenerator>,
    library: Arc<Library>,
}

impl DirectorOrchestrator {
    /// Assemble the orchestrator from its collaborators.
    pub fn new(
        store: SessionStore,
        generator: Arc<dyn CreativeGenerator>,
        library: Arc<Library>,
    ) -> Self {
        Self {
            store,
            generator,
            library,
        }
    }

    /// Handle one conversational turn.
    ///
    /// `session_token` may be a UUID, any stable client token, or absent
    /// (reuse the user's active session or start fresh).
    #[instrument(skip(self, text))]
    pub async fn chat(
        &self,
        user_id: &str,
        session_token: Option<&str>,
        text: &str,
    ) -> Result<TurnResponse> {
        let explicit = session_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(canonicalize_session_id);
        let session = self.store.get_or_create_active(user_id, explicit).await?;

        let text = text.trim();
        let lowered = text.to_lowercase();
        let delta = extract(text, &session.slots);
        let mut merged = session.slots.clone();
        merged.merge(delta.clone());

        // Review-stage confirmation hands off into creative generation.
        if session.stage == Stage::ReviewBrief && RE_AFFIRM.is_match(text) && merged.is_ready() {
            return self.handoff(&session, &delta, &merged, Some(text)).await;
        }

        // Blueprint fast path: build directly from current slots, no
        // readiness required.
        if is_blueprint_intent(&lowered) {
            return self.blueprint_turn(&session, &delta, &merged, text).await;
        }

        // Normal progression.
        let mut stage = session.stage;
        while stage.auto_skippable() && stage.slots_satisfied(&merged) {
            stage = stage.next();
        }
        if merged.is_ready() && stage < Stage::ReviewBrief {
            stage = Stage::ReviewBrief;
        }

        let prompt = if stage == Stage::ReviewBrief {
            review_prompt(&merged)
        } else if let Some(guidance) = stage_guidance(stage) {
            guidance
        } else {
            next_prompt(&merged, &self.library)
        };
        let message = prefix_confirmations(&delta, &prompt.message);

        let slots = self
            .store
            .apply_turn(session.id, &delta, stage, non_empty(text), &message)
            .await?;

        Ok(TurnResponse {
            session_id: session.id,
            message,
            recommendation: prompt.recommendation,
            quick_replies: prompt.quick_replies,
            stage,
            slots: slots.clone(),
            ready_flags: ReadyFlags::compute(&slots, session.project_id, stage),
            blueprint: None,
            creative_options: None,
        })
    }

    /// Commit a ready brief: create the project and propose creatives.
    ///
    /// `slots_override` is merged first. A brief that is still missing
    /// required keys fails with the literal missing-key list and mutates
    /// nothing beyond the override merge.
    pub async fn commit_brief(
        &self,
        user_id: &str,
        session_token: &str,
        slots_override: Option<Slots>,
    ) -> Result<TurnResponse> {
        let token = session_token.trim();
        if token.is_empty() {
            return Err(Error::InvalidInput("session_id is required".to_string()));
        }
        let id = canonicalize_session_id(token);
        let session = self.store.get_or_create_active(user_id, Some(id)).await?;

        let delta = slots_override.unwrap_or_default().normalize();
        let mut merged = session.slots.clone();
        merged.merge(delta.clone());

        if !merged.is_ready() {
            return Err(Error::NotReady {
                missing: merged.missing_required(),
            });
        }
        self.handoff(&session, &delta, &merged, None).await
    }

    /// Shared tail of the two commit paths. Slots and the user utterance
    /// persist before the generator call; the project linkage and handoff
    /// message only land when generation succeeds.
    async fn handoff(
        &self,
        session: &Session,
        delta: &Slots,
        merged: &Slots,
        user_text: Option<&str>,
    ) -> Result<TurnResponse> {
        let brief = merged
            .to_brief()
            .ok_or_else(|| Error::NotReady {
                missing: merged.missing_required(),
            })?;

        self.store.merge_slots(session.id, delta).await?;
        if let Some(text) = user_text {
            self.store
                .append_message(session.id, MessageRole::User, text)
                .await?;
        }

        let set = match self
            .generator
            .generate_creatives(&session.user_id, &brief)
            .await
        {
            Ok(set) => set,
            Err(e) => {
                warn!(session_id = %session.id, error = %e, "creative generation failed");
                return Err(e.into());
            }
        };

        let mut lines = vec![
            "Brief confirmed. Here are three creative directions:".to_string(),
            String::new(),
        ];
        for (i, option) in set.options.iter().enumerate() {
            lines.push(format!("{}. {} — {}", i + 1, option.title, option.logline));
        }
        lines.push(String::new());
        lines.push("Pick one to build the storyboard.".to_string());
        let message = lines.join("\n");

        self.store
            .finish_handoff(session.id, set.project_id, Stage::CreativeGeneration, &message)
            .await?;
        info!(session_id = %session.id, project_id = %set.project_id, "brief committed");

        Ok(TurnResponse {
            session_id: session.id,
            message,
            recommendation: "Pick one creative option to continue.".to_string(),
            quick_replies: vec!["Pick 1".to_string(), "Pick 2".to_string(), "Pick 3".to_string()],
            stage: Stage::CreativeGeneration,
            slots: merged.clone(),
            ready_flags: ReadyFlags::compute(merged, Some(set.project_id), Stage::CreativeGeneration),
            blueprint: None,
            creative_options: Some(set.options),
        })
    }

    /// The blueprint fast path inside a chat turn.
    async fn blueprint_turn(
        &self,
        session: &Session,
        delta: &Slots,
        merged: &Slots,
        text: &str,
    ) -> Result<TurnResponse> {
        let blueprint = build_blueprint(merged, &self.library);
        // Stage only moves when a project already exists; a blueprint
        // generated mid-conversation leaves the progression where it was.
        let stage = if session.project_id.is_some() && session.stage < Stage::BlueprintReady {
            Stage::BlueprintReady
        } else {
            session.stage
        };
        let message = "Blueprint generated from your current brief.".to_string();
        let slots = self
            .store
            .apply_turn(session.id, delta, stage, non_empty(text), &message)
            .await?;

        Ok(TurnResponse {
            session_id: session.id,
            message,
            recommendation: "Copy the generated prompt JSON.".to_string(),
            quick_replies: vec!["Copy prompt".to_string()],
            stage,
            slots: slots.clone(),
            ready_flags: ReadyFlags::compute(&slots, session.project_id, stage),
            blueprint: Some(blueprint),
            creative_options: None,
        })
    }

    /// Build a blueprint for a session outside the chat flow.
    pub async fn blueprint(&self, session_id: Uuid) -> Result<ShotBlueprint> {
        let session = self.store.get(session_id).await?;
        Ok(build_blueprint(&session.slots, &self.library))
    }

    /// Build a storyboard for a chosen creative option and advance the
    /// session, when one is given, to StoryboardReady.
    pub async fn select_creative(
        &self,
        session_id: Option<Uuid>,
        project_id: Uuid,
        option_index: usize,
    ) -> Result<Storyboard> {
        let storyboard = self
            .generator
            .generate_storyboard(project_id, option_index)
            .await?;
        if let Some(id) = session_id {
            self.store.advance_stage(id, Stage::StoryboardReady).await?;
            self.store
                .append_message(
                    id,
                    MessageRole::Assistant,
                    "Storyboard is ready. Want to refine anything?",
                )
                .await?;
        }
        Ok(storyboard)
    }

    /// Mark a session's package exported. Requires a linked project.
    pub async fn mark_exported(&self, session_id: Uuid) -> Result<Session> {
        let session = self.store.get(session_id).await?;
        if session.project_id.is_none() {
            return Err(Error::InvalidInput(
                "session has no committed project to export".to_string(),
            ));
        }
        self.store.advance_stage(session_id, Stage::ExportReady).await?;
        self.store.get(session_id).await
    }

    /// Archive the current session, when given, and start a fresh one.
    pub async fn reset(&self, user_id: &str, current: Option<Uuid>) -> Result<Session> {
        if let Some(id) = current {
            match self.store.archive(id).await {
                Ok(()) => info!(session_id = %id, "session archived"),
                Err(Error::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        self.store.create_session(user_id, None).await
    }

    /// Read-only view of a session.
    pub async fn session(&self, session_id: Uuid) -> Result<Session> {
        self.store.get(session_id).await
    }

    /// Recent transcript entries, in insertion order.
    pub async fn transcript(
        &self,
        session_id: Uuid,
        limit: u32,
    ) -> Result<Vec<crate::session::StoredMessage>> {
        self.store.recent_messages(session_id, limit).await
    }
}

fn non_empty(text: &str) -> Option<&str> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// "Noted." confirmation line for the fields this turn updated, prefixed
/// to the prompt.
fn prefix_confirmations(delta: &Slots, message: &str) -> String {
    let keys = delta.updated_keys();
    if keys.is_empty() {
        return message.to_string();
    }
    let parts: Vec<String> = keys
        .iter()
        .filter_map(|key| {
            let value = match *key {
                "goal" => delta.goal.clone(),
                "audience" => delta.audience.clone(),
                "platform" => delta.platform.clone(),
                "duration_sec" => delta.duration_sec.map(|d| d.to_string()),
                "key_message" => delta.key_message.clone(),
                "cta" => delta.cta.clone(),
                "tone" => delta.tone.clone(),
                "style" => delta.style.clone(),
                _ => None,
            }?;
            Some(format!("{} = {}", title_case(key), value))
        })
        .collect();
    if parts.is_empty() {
        return message.to_string();
    }
    format!("Noted. {}\n\n{}", parts.join("; "), message)
}

/// `duration_sec` → `Duration Sec`.
fn title_case(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use slate_gen::{CreativeSet, Error as GenError, TemplateGenerator};

    struct FailingGenerator;

    #[async_trait::async_trait]
    impl CreativeGenerator for FailingGenerator {
        async fn generate_creatives(
            &self,
            _user_id: &str,
            _brief: &slate_gen::Brief,
        ) -> slate_gen::Result<CreativeSet> {
            Err(GenError::Backend("backend unavailable".to_string()))
        }

        async fn generate_storyboard(
            &self,
            _project_id: Uuid,
            _option_index: usize,
        ) -> slate_gen::Result<Storyboard> {
            Err(GenError::Backend("backend unavailable".to_string()))
        }
    }

    async fn orchestrator() -> DirectorOrchestrator {
        DirectorOrchestrator::new(
            SessionStore::in_memory().await.unwrap(),
            Arc::new(TemplateGenerator),
            Arc::new(Library::default()),
        )
    }

    async fn failing_orchestrator() -> DirectorOrchestrator {
        DirectorOrchestrator::new(
            SessionStore::in_memory().await.unwrap(),
            Arc::new(FailingGenerator),
            Arc::new(Library::default()),
        )
    }

    async fn fill_brief(orch: &DirectorOrchestrator, user: &str) -> TurnResponse {
        let first = orch
            .chat(user, None, "I want TikTok 30s video to drive conversions")
            .await
            .unwrap();
        let token = first.session_id.to_string();
        orch.chat(user, Some(&token), "audience: Gen-Z in KL")
            .await
            .unwrap();
        orch.chat(user, Some(&token), "key message: premium ingredients")
            .await
            .unwrap();
        orch.chat(user, Some(&token), "CTA: Shop now").await.unwrap()
    }

    #[tokio::test]
    async fn test_first_turn_asks_for_missing_goal() {
        let orch = orchestrator().await;
        let resp = orch.chat("alice", None, "hello").await.unwrap();
        assert_eq!(resp.stage, Stage::AskGoal);
        assert!(resp.message.contains("goal"));
        assert!(!resp.ready_flags.can_generate_creatives);
    }

    #[tokio::test]
    async fn test_multi_slot_turn_skips_answered_stages() {
        let orch = orchestrator().await;
        let resp = orch
            .chat("alice", None, "I want TikTok 30s video to drive conversions")
            .await
            .unwrap();
        // Goal, platform, and duration all landed; audience is next.
        assert_eq!(resp.stage, Stage::AskAudience);
        assert!(resp.message.starts_with("Noted."));
        assert!(resp.message.contains("Platform = TikTok"));
        assert!(resp.message.contains("audience"));
        assert_eq!(resp.slots.duration_sec, Some(30));
    }

    #[tokio::test]
    async fn test_early_ready_jumps_to_review() {
        let orch = orchestrator().await;
        let resp = fill_brief(&orch, "alice").await;
        assert_eq!(resp.stage, Stage::ReviewBrief);
        assert!(resp.message.contains("Here is your brief:"));
        assert!(resp.ready_flags.can_generate_creatives);
        assert!(!resp.ready_flags.can_storyboard);
    }

    #[tokio::test]
    async fn test_mid_review_edit_stays_at_review() {
        let orch = orchestrator().await;
        let review = fill_brief(&orch, "alice").await;
        let token = review.session_id.to_string();
        let resp = orch
            .chat("alice", Some(&token), "CTA: Visit our Bukit Bintang store")
            .await
            .unwrap();
        assert_eq!(resp.stage, Stage::ReviewBrief);
        assert_eq!(resp.slots.cta.as_deref(), Some("Visit our Bukit Bintang store"));
        assert!(resp.message.contains("Visit our Bukit Bintang store"));
    }

    #[tokio::test]
    async fn test_affirmative_at_review_hands_off() {
        let orch = orchestrator().await;
        let review = fill_brief(&orch, "alice").await;
        let token = review.session_id.to_string();
        let resp = orch.chat("alice", Some(&token), "looks good").await.unwrap();
        assert_eq!(resp.stage, Stage::CreativeGeneration);
        let options = resp.creative_options.unwrap();
        assert_eq!(options.len(), 3);
        assert!(resp.ready_flags.can_storyboard);

        let session = orch.session(review.session_id).await.unwrap();
        assert!(session.project_id.is_some());
    }

    #[tokio::test]
    async fn test_affirmative_before_review_is_ordinary_text() {
        let orch = orchestrator().await;
        let resp = orch.chat("alice", None, "ok").await.unwrap();
        assert_eq!(resp.stage, Stage::AskGoal);
        assert!(resp.creative_options.is_none());
    }

    #[tokio::test]
    async fn test_commit_brief_not_ready_lists_missing() {
        let orch = orchestrator().await;
        let resp = orch.chat("alice", None, "tiktok 30s").await.unwrap();
        let err = orch
            .commit_brief("alice", &resp.session_id.to_string(), None)
            .await
            .unwrap_err();
        match err {
            Error::NotReady { missing } => {
                assert!(missing.contains(&"goal"));
                assert!(missing.contains(&"cta"));
                assert!(!missing.contains(&"platform"));
            }
            other => panic!("expected NotReady, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_commit_brief_empty_session_id_is_invalid_input() {
        let orch = orchestrator().await;
        let err = orch.commit_brief("alice", "  ", None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_commit_brief_with_override_succeeds() {
        let orch = orchestrator().await;
        let resp = orch
            .chat("alice", None, "TikTok 30s for conversions, audience: Gen-Z")
            .await
            .unwrap();
        let overridden = Slots {
            key_message: Some("Premium ingredients".into()),
            cta: Some("Shop now".into()),
            ..Default::default()
        };
        let committed = orch
            .commit_brief("alice", &resp.session_id.to_string(), Some(overridden))
            .await
            .unwrap();
        assert_eq!(committed.stage, Stage::CreativeGeneration);
        assert!(committed.creative_options.is_some());
    }

    #[tokio::test]
    async fn test_generator_failure_leaves_session_intact() {
        let orch = failing_orchestrator().await;
        let review = fill_brief(&orch, "alice").await;
        let token = review.session_id.to_string();
        let err = orch.chat("alice", Some(&token), "looks good").await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));

        // Slots survived, no project was linked, stage stayed at review.
        let session = orch.session(review.session_id).await.unwrap();
        assert_eq!(session.stage, Stage::ReviewBrief);
        assert!(session.project_id.is_none());
        assert!(session.slots.is_ready());
    }

    #[tokio::test]
    async fn test_blueprint_intent_works_without_ready_brief() {
        let orch = orchestrator().await;
        let resp = orch.chat("alice", None, "generate blueprint").await.unwrap();
        let bp = resp.blueprint.unwrap();
        assert_eq!(bp.meta.platform, "TikTok");
        assert_eq!(bp.meta.duration_sec, 30);
        // No project yet, so the stage does not move.
        assert_eq!(resp.stage, Stage::AskGoal);
    }

    #[tokio::test]
    async fn test_blueprint_uses_accumulated_slots() {
        let orch = orchestrator().await;
        let first = orch.chat("alice", None, "instagram 60s, epic cinematic").await.unwrap();
        let token = first.session_id.to_string();
        let resp = orch
            .chat("alice", Some(&token), "generate blueprint")
            .await
            .unwrap();
        let bp = resp.blueprint.unwrap();
        assert_eq!(bp.meta.platform, "Instagram Reels");
        assert_eq!(bp.meta.duration_sec, 60);
        assert_eq!(bp.meta.tone, "epic");
        assert_eq!(bp.meta.style, "cinematic");
    }

    #[tokio::test]
    async fn test_select_creative_advances_to_storyboard() {
        let orch = orchestrator().await;
        let review = fill_brief(&orch, "alice").await;
        let token = review.session_id.to_string();
        let committed = orch.chat("alice", Some(&token), "looks good").await.unwrap();
        let session = orch.session(committed.session_id).await.unwrap();
        let project = session.project_id.unwrap();

        let storyboard = orch
            .select_creative(Some(committed.session_id), project, 0)
            .await
            .unwrap();
        assert!(!storyboard.scenes.is_empty());

        let session = orch.session(committed.session_id).await.unwrap();
        assert_eq!(session.stage, Stage::StoryboardReady);

        // Blueprint intent now marks BlueprintReady.
        let resp = orch
            .chat("alice", Some(&token), "generate blueprint")
            .await
            .unwrap();
        assert_eq!(resp.stage, Stage::BlueprintReady);
        assert!(resp.ready_flags.can_export);
    }

    #[tokio::test]
    async fn test_reset_archives_and_returns_fresh_session() {
        let orch = orchestrator().await;
        let review = fill_brief(&orch, "alice").await;
        let fresh = orch.reset("alice", Some(review.session_id)).await.unwrap();
        assert_ne!(fresh.id, review.session_id);
        assert!(fresh.slots.is_empty());

        let old = orch.session(review.session_id).await.unwrap();
        assert!(old.archived);
    }

    #[tokio::test]
    async fn test_mark_exported_requires_project() {
        let orch = orchestrator().await;
        let resp = orch.chat("alice", None, "hi").await.unwrap();
        let err = orch.mark_exported(resp.session_id).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_turn_appends_both_transcript_entries() {
        let orch = orchestrator().await;
        let resp = orch.chat("alice", None, "tiktok 30s").await.unwrap();
        let transcript = orch.transcript(resp.session_id, 10).await.unwrap();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, MessageRole::User);
        assert_eq!(transcript[0].content, "tiktok 30s");
        assert_eq!(transcript[1].role, MessageRole::Assistant);
    }

    #[tokio::test]
    async fn test_non_uuid_session_token_is_stable() {
        let orch = orchestrator().await;
        let a = orch
            .chat("alice", Some("my campaign"), "tiktok 30s")
            .await
            .unwrap();
        let b = orch.chat("alice", Some("my campaign"), "audience: Gen-Z").await.unwrap();
        assert_eq!(a.session_id, b.session_id);
        assert_eq!(b.slots.platform.as_deref(), Some("TikTok"));
    }

    #[tokio::test]
    async fn test_order_independent_progress_to_review() {
        // The same four facts in two different orders both end at review.
        let orch = orchestrator().await;
        let messages = [
            "CTA: Shop now",
            "key message: premium ingredients",
            "audience: Gen-Z in KL",
            "tiktok 30s for brand awareness",
        ];
        let mut token = None;
        let mut last = None;
        for msg in messages {
            let resp = orch
                .chat("bob", token.as_deref(), msg)
                .await
                .unwrap();
            token = Some(resp.session_id.to_string());
            last = Some(resp);
        }
        assert_eq!(last.unwrap().stage, Stage::ReviewBrief);
    }

    #[test]
    fn test_affirmative_pattern_is_word_bounded() {
        assert!(RE_AFFIRM.is_match("Looks good!"));
        assert!(RE_AFFIRM.is_match("ok"));
        assert!(RE_AFFIRM.is_match("please proceed"));
        assert!(!RE_AFFIRM.is_match("broken"));
        assert!(!RE_AFFIRM.is_match("tokyo"));
    }
}
