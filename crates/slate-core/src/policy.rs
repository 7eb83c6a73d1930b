//! Step policy: which question to surface next, with the director's
//! recommendation and quick-reply suggestions.
//!
//! Fields are evaluated in a fixed priority order: goal → audience →
//! platform+duration → key message → CTA → tone+style → assets →
//! constraints → brief summary. Platform+duration and tone+style are each
//! one step because they are one decision for the user ("TikTok, 30s").

use crate::library::Library;
use crate::slots::Slots;
use crate::stage::Stage;

/// One assistant prompt: the question, a director recommendation, and
/// quick-reply suggestions.
#[derive(Debug, Clone)]
pub struct Prompt {
    /// Assistant message text
    pub message: String,
    /// Director recommendation hint
    pub recommendation: String,
    /// Quick-reply suggestion strings
    pub quick_replies: Vec<String>,
}

impl Prompt {
    fn new(message: impl Into<String>, rec: impl Into<String>, quick: Vec<String>) -> Prompt {
        Prompt {
            message: message.into(),
            recommendation: rec.into(),
            quick_replies: quick,
        }
    }
}

fn strs(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Compute the next prompt for the given slots.
pub fn next_prompt(slots: &Slots, library: &Library) -> Prompt {
    if slots.goal.is_none() {
        return Prompt::new(
            "What is your goal for this video?",
            "Keep it simple: brand awareness, conversions, event promo, app installs.",
            library.goals.iter().map(|g| g.label.clone()).collect(),
        );
    }
    if slots.audience.is_none() {
        return Prompt::new(
            "Who is the target audience?",
            "Think demographic + intent, e.g., Gen-Z students in KL or young parents seeking healthy snacks.",
            strs(&["Gen-Z in KL", "Young parents", "Office workers", "Budget shoppers"]),
        );
    }
    if slots.platform.is_none() || slots.duration_sec.is_none() {
        let mut options: Vec<String> = Vec::new();
        for platform in &library.platforms {
            for d in &platform.durations_sec {
                options.push(format!("{} {}s", platform.label, d));
            }
        }
        options.truncate(12);
        return Prompt::new(
            "Which platform and duration do you want?",
            "Examples: TikTok 15s, Instagram Reels 30s, YouTube Shorts 60s.",
            options,
        );
    }
    if slots.key_message.is_none() {
        return Prompt::new(
            "What's the key message or single most important takeaway?",
            "One sentence; focus on the benefit or value proposition.",
            strs(&["Key message: premium ingredients", "Key message: save RM50 today"]),
        );
    }
    if slots.cta.is_none() {
        return Prompt::new(
            "What is the call to action (CTA)?",
            "Examples: Order now, Visit the store, Use code PF30, Click to learn more.",
            strs(&["CTA: Shop now", "CTA: Visit our store", "CTA: DM us"]),
        );
    }
    if slots.tone.is_none() || slots.style.is_none() {
        let mut options: Vec<String> = library
            .tones
            .iter()
            .map(|t| format!("Tone: {t}"))
            .collect();
        options.extend(library.styles.iter().map(|s| format!("Style: {s}")));
        return Prompt::new(
            "Any preferred tone or style?",
            "Tone: playful/epic/heartwarming; Style: cinematic/UGC/ASMR/documentary.",
            options,
        );
    }
    if slots.assets.is_empty() {
        return Prompt::new(
            "Any assets or references to include? (links, brand rules)",
            "You can paste URLs or say 'none'.",
            Vec::new(),
        );
    }
    if slots.constraints.is_none() {
        return Prompt::new(
            "Any constraints or must-avoid items? (budget, legal, safety)",
            "Example: No text overlays; follow halal/brand safety rules.",
            strs(&["No on-screen text", "No competitor logos", "Budget under RM500"]),
        );
    }
    review_prompt(slots)
}

/// The brief-review prompt: the full summary plus confirm-or-edit guidance.
pub fn review_prompt(slots: &Slots) -> Prompt {
    Prompt::new(
        brief_summary(slots),
        "Say 'looks good' to continue; or update a field (e.g., 'CTA: Visit our Bukit Bintang store').",
        strs(&["Looks good", "Change tone", "Change platform", "Make it 15s"]),
    )
}

/// Deterministic human-readable rendering of the collected brief.
///
/// Fixed order: Goal, Audience, Platform+Duration, Key message, CTA,
/// Tone+Style, then Assets and Constraints only when present.
pub fn brief_summary(slots: &Slots) -> String {
    let dash = "—";
    let duration = slots
        .duration_sec
        .map(|d| format!("{d}s"))
        .unwrap_or_else(|| dash.to_string());
    let mut lines = vec![
        "Here is your brief:".to_string(),
        String::new(),
        format!("Goal: {}", slots.goal.as_deref().unwrap_or(dash)),
        format!("Audience: {}", slots.audience.as_deref().unwrap_or(dash)),
        format!(
            "Platform: {} | Duration: {}",
            slots.platform.as_deref().unwrap_or(dash),
            duration
        ),
        format!("Key message: {}", slots.key_message.as_deref().unwrap_or(dash)),
        format!("CTA: {}", slots.cta.as_deref().unwrap_or(dash)),
        format!(
            "Tone: {} | Style: {}",
            slots.tone.as_deref().unwrap_or(dash),
            slots.style.as_deref().unwrap_or(dash)
        ),
    ];
    if !slots.assets.is_empty() {
        lines.push(format!("Assets: {}", slots.assets.join(", ")));
    }
    if let Some(constraints) = &slots.constraints {
        lines.push(format!("Constraints: {constraints}"));
    }
    lines.push(String::new());
    lines.push("Type 'looks good' to proceed or edit any field by name.".to_string());
    lines.join("\n")
}

/// Guidance for stages past brief review, where the conversation is driven
/// by downstream collaborators rather than slot questions.
pub fn stage_guidance(stage: Stage) -> Option<Prompt> {
    match stage {
        Stage::CreativeGeneration => Some(Prompt::new(
            "Generating creative options for your brief…",
            "You can pick one to move forward to storyboard.",
            Vec::new(),
        )),
        Stage::CreativeSelection => Some(Prompt::new(
            "Which option do you want to proceed with?",
            "Pick one creative option to continue.",
            strs(&["Pick 1", "Pick 2", "Pick 3"]),
        )),
        Stage::StoryboardReady => Some(Prompt::new(
            "Storyboard is ready. Want to refine anything?",
            "Review the storyboard and ask for refinements if needed.",
            strs(&["Tighten pacing", "More product shots"]),
        )),
        Stage::BlueprintReady => Some(Prompt::new(
            "Your shot blueprint is ready.",
            "Copy the generated prompt JSON.",
            strs(&["Copy prompt"]),
        )),
        Stage::ExportReady => Some(Prompt::new(
            "You can export your package now.",
            "Export your package when ready.",
            strs(&["Export"]),
        )),
        _ => None,
    }
}
