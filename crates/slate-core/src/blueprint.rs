//! Shot blueprint builder: turns accumulated slots into a structured,
//! beat-timed shooting plan for the video model.
//!
//! This is the "generate blueprint" fast path: it never requires a ready
//! brief. Missing fields fall back to fixed defaults so the output is
//! always complete and deterministic for a given slot state.

use crate::library::Library;
use crate::slots::Slots;
use serde::{Deserialize, Serialize};

/// Blueprint header: format and rendering rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlueprintMeta {
    /// Target platform
    pub platform: String,
    /// Total duration in seconds
    pub duration_sec: u32,
    /// Tone
    pub tone: String,
    /// Style
    pub style: String,
    /// Whether on-screen text is forbidden
    pub text_free: bool,
}

/// One timed beat with shooting direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlueprintBeat {
    /// Beat name
    pub name: String,
    /// Beat length in seconds
    pub secs: u32,
    /// Shooting direction
    pub direction: String,
}

/// A complete shot blueprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotBlueprint {
    /// Format and rules header
    pub meta: BlueprintMeta,
    /// One-line creative overview
    pub overview: String,
    /// Timed beats in narrative order
    pub beats: Vec<BlueprintBeat>,
    /// Negative-prompt lines for the video model
    pub negative_prompt: Vec<String>,
}

/// Build a blueprint from the current slots and library rules.
///
/// Beat timing: total is the requested duration floored at 15s; hook and
/// payoff each get 20% of the total (at least 3s); the build beat takes
/// the remainder (at least 6s). With the 15s floor the three minimums
/// always fit.
pub fn build_blueprint(slots: &Slots, library: &Library) -> ShotBlueprint {
    let goal = slots.goal.as_deref().unwrap_or("Brand awareness");
    let platform = slots.platform.as_deref().unwrap_or("TikTok");
    let duration = slots.duration_sec.unwrap_or(30);
    let tone = slots.tone.as_deref().unwrap_or("playful");
    let style = slots.style.as_deref().unwrap_or("ugc");
    let key_msg = slots
        .key_message
        .as_deref()
        .unwrap_or("Strong hook in first 2s");
    let cta = slots.cta.as_deref().unwrap_or("DM us");

    let rules = &library.blueprint_rules;
    let beat_names = library.default_beats();

    let total = duration.max(15);
    let hook_sec = (total / 5).max(3);
    let payoff_sec = (total / 5).max(3);
    let build_sec = total.saturating_sub(hook_sec + payoff_sec).max(6);

    ShotBlueprint {
        meta: BlueprintMeta {
            platform: platform.to_string(),
            duration_sec: total,
            tone: tone.to_string(),
            style: style.to_string(),
            text_free: rules.text_free,
        },
        overview: format!(
            "Goal: {goal}. Key message: {key_msg}. CTA: {cta}. Text-free policy enforced."
        ),
        beats: vec![
            BlueprintBeat {
                name: beat_names[0].to_string(),
                secs: hook_sec,
                direction: "Grab attention visually in 2s; no on-screen text.".to_string(),
            },
            BlueprintBeat {
                name: beat_names[1].to_string(),
                secs: build_sec,
                direction: "Escalate the premise; include product claim or gag.".to_string(),
            },
            BlueprintBeat {
                name: beat_names[2].to_string(),
                secs: payoff_sec,
                direction: format!("Punchline + CTA ('{cta}')."),
            },
        ],
        negative_prompt: rules.negative_prompt.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lib() -> Library {
        Library::default()
    }

    #[test]
    fn test_empty_slots_use_defaults() {
        let bp = build_blueprint(&Slots::default(), &lib());
        assert_eq!(bp.meta.platform, "TikTok");
        assert_eq!(bp.meta.duration_sec, 30);
        assert_eq!(bp.meta.tone, "playful");
        assert_eq!(bp.meta.style, "ugc");
        assert!(bp.meta.text_free);
        assert!(bp.overview.contains("Brand awareness"));
        assert!(bp.overview.contains("DM us"));
        assert_eq!(bp.negative_prompt, vec!["no on-screen text"]);
    }

    #[test]
    fn test_beat_timing_splits_duration() {
        let slots = Slots {
            duration_sec: Some(30),
            ..Default::default()
        };
        let bp = build_blueprint(&slots, &lib());
        assert_eq!(bp.beats.len(), 3);
        assert_eq!(bp.beats[0].secs, 6);
        assert_eq!(bp.beats[1].secs, 18);
        assert_eq!(bp.beats[2].secs, 6);
        let sum: u32 = bp.beats.iter().map(|b| b.secs).sum();
        assert_eq!(sum, 30);
    }

    #[test]
    fn test_short_duration_floors_at_fifteen() {
        let slots = Slots {
            duration_sec: Some(10),
            ..Default::default()
        };
        let bp = build_blueprint(&slots, &lib());
        assert_eq!(bp.meta.duration_sec, 15);
        // 15s: hook 3, payoff 3, build 9.
        assert_eq!(bp.beats[0].secs, 3);
        assert_eq!(bp.beats[1].secs, 9);
        assert_eq!(bp.beats[2].secs, 3);
    }

    #[test]
    fn test_slots_flow_into_output() {
        let slots = Slots {
            goal: Some("Drive conversions".into()),
            platform: Some("Instagram Reels".into()),
            duration_sec: Some(60),
            tone: Some("epic".into()),
            style: Some("cinematic".into()),
            key_message: Some("Premium ingredients".into()),
            cta: Some("Shop now".into()),
            ..Default::default()
        };
        let bp = build_blueprint(&slots, &lib());
        assert_eq!(bp.meta.platform, "Instagram Reels");
        assert_eq!(bp.meta.duration_sec, 60);
        assert!(bp.overview.contains("Premium ingredients"));
        assert!(bp.beats[2].direction.contains("Shop now"));
    }

    #[test]
    fn test_beat_names_follow_library_template() {
        let bp = build_blueprint(&Slots::default(), &lib());
        let names: Vec<&str> = bp.beats.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Hook", "Build", "Payoff"]);
    }
}
