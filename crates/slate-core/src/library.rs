//! Immutable reference library: goals, tones, styles, platforms, narrative
//! templates, and blueprint rules.
//!
//! Loaded once at startup (from `library.json` when present, built-in
//! defaults otherwise), then injected wherever needed and held for the
//! process lifetime. There is no runtime invalidation and no global cache.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// A selectable campaign goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalEntry {
    /// Stable identifier
    pub id: String,
    /// Display label (also the stored goal value)
    pub label: String,
}

/// A supported platform with its preferred durations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEntry {
    /// Stable identifier
    pub id: String,
    /// Canonical display label
    pub label: String,
    /// Durations this platform favors, seconds
    pub durations_sec: Vec<u32>,
    /// Aspect ratio hint
    pub aspect_ratio: String,
}

/// One beat of a narrative template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Beat {
    /// Beat name (e.g. "Hook")
    pub name: String,
}

/// A named narrative arc.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeTemplate {
    /// Stable identifier
    pub id: String,
    /// Display label
    pub label: String,
    /// Ordered beats
    pub beats: Vec<Beat>,
}

/// Rules applied when building a shot blueprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlueprintRules {
    /// Whether on-screen text is forbidden
    pub text_free: bool,
    /// Spoken language
    pub language: String,
    /// Negative-prompt lines passed to the video model
    pub negative_prompt: Vec<String>,
}

/// The full reference library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Library {
    /// Campaign goals
    pub goals: Vec<GoalEntry>,
    /// Tone words
    pub tones: Vec<String>,
    /// Style words
    pub styles: Vec<String>,
    /// Platforms
    pub platforms: Vec<PlatformEntry>,
    /// Narrative templates; the first is the default arc
    pub narrative_templates: Vec<NarrativeTemplate>,
    /// Blueprint rules
    pub blueprint_rules: BlueprintRules,
}

impl Default for Library {
    fn default() -> Self {
        let goal = |id: &str, label: &str| GoalEntry {
            id: id.to_string(),
            label: label.to_string(),
        };
        let platform = |id: &str, label: &str| PlatformEntry {
            id: id.to_string(),
            label: label.to_string(),
            durations_sec: vec![15, 30, 60],
            aspect_ratio: "9:16".to_string(),
        };
        Library {
            goals: vec![
                goal("awareness", "Brand awareness"),
                goal("conversions", "Drive conversions"),
                goal("installs", "App installs"),
                goal("event", "Promote event"),
            ],
            tones: vec![
                "playful".to_string(),
                "energetic".to_string(),
                "heartwarming".to_string(),
                "epic".to_string(),
            ],
            styles: vec![
                "cinematic".to_string(),
                "ugc".to_string(),
                "asmr".to_string(),
                "documentary".to_string(),
            ],
            platforms: vec![
                platform("tiktok", "TikTok"),
                platform("reels", "Instagram Reels"),
                platform("shorts", "YouTube Shorts"),
            ],
            narrative_templates: vec![NarrativeTemplate {
                id: "hook-build-payoff".to_string(),
                label: "Hook → Build → Payoff".to_string(),
                beats: vec![
                    Beat {
                        name: "Hook".to_string(),
                    },
                    Beat {
                        name: "Build".to_string(),
                    },
                    Beat {
                        name: "Payoff".to_string(),
                    },
                ],
            }],
            blueprint_rules: BlueprintRules {
                text_free: true,
                language: "English".to_string(),
                negative_prompt: vec!["no on-screen text".to_string()],
            },
        }
    }
}

impl Library {
    /// Load from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Library> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Internal(format!("read {}: {e}", path.display())))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Load from the given path when it exists, built-in defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Library> {
        match path {
            Some(p) if p.exists() => {
                let lib = Self::from_json_file(p)?;
                info!("Reference library loaded from {}", p.display());
                Ok(lib)
            }
            _ => Ok(Library::default()),
        }
    }

    /// Beats of the default narrative arc.
    pub fn default_beats(&self) -> Vec<&str> {
        let beats: Vec<&str> = self
            .narrative_templates
            .first()
            .map(|t| t.beats.iter().map(|b| b.name.as_str()).collect())
            .unwrap_or_default();
        if beats.len() == 3 {
            beats
        } else {
            vec!["Hook", "Build", "Payoff"]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_library_is_complete() {
        let lib = Library::default();
        assert!(!lib.goals.is_empty());
        assert!(!lib.platforms.is_empty());
        assert_eq!(lib.default_beats(), vec!["Hook", "Build", "Payoff"]);
        assert!(lib.blueprint_rules.text_free);
    }

    #[test]
    fn test_library_round_trips_through_json() {
        let lib = Library::default();
        let json = serde_json::to_string(&lib).unwrap();
        let parsed: Library = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.goals.len(), lib.goals.len());
        assert_eq!(parsed.blueprint_rules.negative_prompt, lib.blueprint_rules.negative_prompt);
    }

    #[test]
    fn test_missing_path_falls_back_to_defaults() {
        let lib = Library::load_or_default(Some(Path::new("/nonexistent/library.json"))).unwrap();
        assert_eq!(lib.goals[0].id, "awareness");
    }
}
