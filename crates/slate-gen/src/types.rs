//! Validated payload types for creative-generation output.
//!
//! The generation backend is a black box that returns JSON. Everything it
//! returns passes through `validate_*` before the rest of the system sees
//! it, so a malformed payload surfaces as [`Error::Validation`] instead of
//! leaking half-empty structs downstream.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// One creative concept offered to the user after brief commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreativeOption {
    /// Short concept title
    pub title: String,
    /// One-line pitch
    pub logline: String,
    /// Rationale shown alongside the pitch
    pub why_it_works: String,
}

/// The full result of a brief commit: a new project plus its options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreativeSet {
    /// Project the options belong to
    pub project_id: uuid::Uuid,
    /// At least one creative option
    pub options: Vec<CreativeOption>,
}

fn default_scene_secs() -> u32 {
    5
}

/// A single storyboard scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryboardScene {
    /// 1-based scene number
    pub number: u32,
    /// Scene title
    pub title: String,
    /// What happens in the scene
    pub description: String,
    /// Visual direction
    #[serde(default)]
    pub visuals: String,
    /// Voiceover / narration line
    #[serde(default)]
    pub voiceover: String,
    /// Scene length in seconds
    #[serde(default = "default_scene_secs")]
    pub duration_sec: u32,
}

/// A validated storyboard for a selected creative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Storyboard {
    /// Ordered scenes, never empty
    pub scenes: Vec<StoryboardScene>,
}

/// Parse and validate a creative-options payload.
///
/// Rules: at least one option; title, logline, and rationale all non-empty.
pub fn validate_creative_options(json: &str) -> Result<Vec<CreativeOption>> {
    #[derive(Deserialize)]
    struct Payload {
        options: Vec<CreativeOption>,
    }
    let payload: Payload = serde_json::from_str(json)?;
    if payload.options.is_empty() {
        return Err(Error::Validation("no creative options generated".into()));
    }
    for (i, opt) in payload.options.iter().enumerate() {
        if opt.title.trim().is_empty()
            || opt.logline.trim().is_empty()
            || opt.why_it_works.trim().is_empty()
        {
            return Err(Error::Validation(format!(
                "creative option {} has empty fields",
                i
            )));
        }
    }
    Ok(payload.options)
}

/// Parse and validate a storyboard payload.
///
/// Rules: at least one scene; scene numbers and durations ≥ 1; title and
/// description non-empty.
pub fn validate_storyboard(json: &str) -> Result<Storyboard> {
    let board: Storyboard = serde_json::from_str(json)?;
    if board.scenes.is_empty() {
        return Err(Error::Validation("storyboard has no scenes".into()));
    }
    for scene in &board.scenes {
        if scene.number < 1 {
            return Err(Error::Validation(format!(
                "scene number must be >= 1, got {}",
                scene.number
            )));
        }
        if scene.duration_sec < 1 {
            return Err(Error::Validation(format!(
                "scene {} has non-positive duration",
                scene.number
            )));
        }
        if scene.title.trim().is_empty() || scene.description.trim().is_empty() {
            return Err(Error::Validation(format!(
                "scene {} is missing title or description",
                scene.number
            )));
        }
    }
    Ok(board)
}
