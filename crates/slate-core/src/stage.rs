//! The ordered stage sequence of the guided brief conversation.
//!
//! Stages are monotonic forward. Everything before [`Stage::ReviewBrief`]
//! can be auto-skipped when its slots are already filled; review onward
//! only advances through explicit user action.

use crate::slots::Slots;
use serde::{Deserialize, Serialize};

/// A named point in the guided conversation's fixed progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Ask for the campaign goal
    AskGoal,
    /// Ask for the target audience
    AskAudience,
    /// Ask for platform and duration (one decision for the user)
    AskFormat,
    /// Ask for key message and CTA
    AskMessage,
    /// Ask for tone and style (one decision for the user)
    AskToneStyle,
    /// Ask for reference assets
    AskAssets,
    /// Ask for constraints
    AskConstraints,
    /// Render the brief and wait for confirmation or edits
    ReviewBrief,
    /// Brief committed, creative options being generated
    CreativeGeneration,
    /// User picks one creative option
    CreativeSelection,
    /// Storyboard produced for the selected creative
    StoryboardReady,
    /// Shot blueprint produced
    BlueprintReady,
    /// Package can be exported (terminal)
    ExportReady,
}

impl Stage {
    /// The following stage; saturates at the terminal stage.
    pub fn next(self) -> Stage {
        use Stage::*;
        match self {
            AskGoal => AskAudience,
            AskAudience => AskFormat,
            AskFormat => AskMessage,
            AskMessage => AskToneStyle,
            AskToneStyle => AskAssets,
            AskAssets => AskConstraints,
            AskConstraints => ReviewBrief,
            ReviewBrief => CreativeGeneration,
            CreativeGeneration => CreativeSelection,
            CreativeSelection => StoryboardReady,
            StoryboardReady => BlueprintReady,
            BlueprintReady => ExportReady,
            ExportReady => ExportReady,
        }
    }

    /// Whether this stage may be skipped without asking when its slots are
    /// already filled. Review onward is never auto-skipped.
    pub fn auto_skippable(self) -> bool {
        self < Stage::ReviewBrief
    }

    /// Whether the slots this stage asks for are already filled.
    /// Stages from review onward don't ask for slots and always report true.
    pub fn slots_satisfied(self, slots: &Slots) -> bool {
        use Stage::*;
        match self {
            AskGoal => slots.goal.is_some(),
            AskAudience => slots.audience.is_some(),
            AskFormat => slots.platform.is_some() && slots.duration_sec.is_some(),
            AskMessage => slots.key_message.is_some() && slots.cta.is_some(),
            AskToneStyle => slots.tone.is_some() && slots.style.is_some(),
            AskAssets => !slots.assets.is_empty(),
            AskConstraints => slots.constraints.is_some(),
            _ => true,
        }
    }

    /// Terminal check.
    pub fn is_terminal(self) -> bool {
        self == Stage::ExportReady
    }

    /// Stable wire label.
    pub fn as_str(self) -> &'static str {
        use Stage::*;
        match self {
            AskGoal => "ask_goal",
            AskAudience => "ask_audience",
            AskFormat => "ask_format",
            AskMessage => "ask_message",
            AskToneStyle => "ask_tone_style",
            AskAssets => "ask_assets",
            AskConstraints => "ask_constraints",
            ReviewBrief => "review_brief",
            CreativeGeneration => "creative_generation",
            CreativeSelection => "creative_selection",
            StoryboardReady => "storyboard_ready",
            BlueprintReady => "blueprint_ready",
            ExportReady => "export_ready",
        }
    }

    /// Parse from a stored label; unknown labels fall back to the initial
    /// stage rather than failing the turn.
    pub fn from_str_lossy(s: &str) -> Stage {
        use Stage::*;
        match s {
            "ask_audience" => AskAudience,
            "ask_format" => AskFormat,
            "ask_message" => AskMessage,
            "ask_tone_style" => AskToneStyle,
            "ask_assets" => AskAssets,
            "ask_constraints" => AskConstraints,
            "review_brief" => ReviewBrief,
            "creative_generation" => CreativeGeneration,
            "creative_selection" => CreativeSelection,
            "storyboard_ready" => StoryboardReady,
            "blueprint_ready" => BlueprintReady,
            "export_ready" => ExportReady,
            _ => AskGoal,
        }
    }
}

impl Default for Stage {
    fn default() -> Self {
        Stage::AskGoal
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
