//! Rule-based slot extraction from free-form utterances — no LLM calls.
//!
//! Patterns are evaluated in a fixed priority order so identical input
//! always yields identical output. Extraction never fails: text with no
//! recognizable pattern produces an empty delta, never an error and never
//! spurious keys. The AI service is reserved for content generation, not
//! slot parsing.

use crate::slots::{Slots, PLATFORM_ALIASES};
use regex::Regex;
use std::sync::LazyLock;

// ── Compiled patterns ───────────────────────────────────────────

static RE_SECONDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+)\s*(?:seconds|second|secs|sec|s)\b").unwrap());

static RE_MINUTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+)\s*(?:minutes|minute|mins|min|m)\b").unwrap());

static RE_BARE_DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(15|20|30|45|60)\b").unwrap());

static RE_CTA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:cta|call to action)\s*[:\-]\s*([^\n]+)").unwrap());

static RE_GOAL_CUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:goal|objective)\s*:\s*([^\n]+)").unwrap());

static RE_AUDIENCE_CUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:audience|target)\s*:\s*([^\n]+)").unwrap());

static RE_KEY_MESSAGE_CUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bkey\s*message\s*:\s*([^\n]+)").unwrap());

static RE_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://\S+").unwrap());

/// Bare durations tested when no explicit unit pattern matched, in table
/// order (first hit wins).
const BARE_DURATIONS: [u32; 5] = [15, 20, 30, 45, 60];

/// Tone vocabulary. Matches are unioned, not first-match-wins.
const TONE_VOCAB: [&str; 9] = [
    "playful",
    "fun",
    "energetic",
    "heartwarming",
    "dramatic",
    "epic",
    "serious",
    "inspirational",
    "whimsical",
];

/// Style vocabulary. Matches are unioned, not first-match-wins.
const STYLE_VOCAB: [&str; 9] = [
    "cinematic",
    "ugc",
    "asmr",
    "documentary",
    "vlog",
    "retro",
    "surreal",
    "minimal",
    "luxury",
];

/// Whole-word containment (ASCII word boundaries), for vocabulary and alias
/// matching on already-lowercased text.
fn has_word(text: &str, word: &str) -> bool {
    let bytes = text.as_bytes();
    let mut start = 0;
    while let Some(pos) = text[start..].find(word) {
        let begin = start + pos;
        let end = begin + word.len();
        let ok_before = begin == 0 || !bytes[begin - 1].is_ascii_alphanumeric();
        let ok_after = end == text.len() || !bytes[end].is_ascii_alphanumeric();
        if ok_before && ok_after {
            return true;
        }
        start = begin + 1;
    }
    false
}

fn detect_duration(lowered: &str) -> Option<u32> {
    if let Some(caps) = RE_SECONDS.captures(lowered) {
        return caps[1].parse().ok();
    }
    if let Some(caps) = RE_MINUTES.captures(lowered) {
        return caps[1].parse::<u32>().ok().map(|m| m * 60);
    }
    let hits: Vec<u32> = RE_BARE_DURATION
        .find_iter(lowered)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();
    BARE_DURATIONS.into_iter().find(|d| hits.contains(d))
}

fn detect_platform(lowered: &str) -> Option<&'static str> {
    PLATFORM_ALIASES
        .iter()
        .find(|(alias, _)| has_word(lowered, alias))
        .map(|(_, canon)| *canon)
}

/// Union of vocabulary matches, sorted and de-duplicated, comma-joined.
fn detect_vocab(lowered: &str, vocab: &[&str]) -> Option<String> {
    let mut found: Vec<&str> = vocab
        .iter()
        .filter(|word| has_word(lowered, word))
        .copied()
        .collect();
    if found.is_empty() {
        return None;
    }
    found.sort_unstable();
    found.dedup();
    Some(found.join(", "))
}

fn capture_line(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extract a partial slot update from a user utterance.
///
/// `current` carries the slots accumulated so far: tone, style, and the
/// goal shortcuts only fill fields that are not already confirmed, while
/// platform, duration, CTA, key message, and the explicit `field:` cues
/// overwrite unconditionally — users correct themselves.
pub fn extract(text: &str, current: &Slots) -> Slots {
    let text = text.trim();
    if text.is_empty() {
        return Slots::default();
    }
    let lowered = text.to_lowercase();
    let mut delta = Slots::default();

    // 1. Duration — at most one of the three attempts may set it.
    delta.duration_sec = detect_duration(&lowered);

    // 2. Platform — first alias hit in table order.
    delta.platform = detect_platform(&lowered).map(str::to_string);

    // 3. Tone / style — union match, only when not already confirmed.
    if current.tone.is_none() {
        delta.tone = detect_vocab(&lowered, &TONE_VOCAB);
    }
    if current.style.is_none() {
        delta.style = detect_vocab(&lowered, &STYLE_VOCAB);
    }

    // 4. CTA after an explicit cue.
    delta.cta = capture_line(&RE_CTA, text);

    // 5. Explicit field cues (also how mid-review edits are expressed).
    delta.goal = capture_line(&RE_GOAL_CUE, text);
    delta.audience = capture_line(&RE_AUDIENCE_CUE, text);
    delta.key_message = capture_line(&RE_KEY_MESSAGE_CUE, text);

    // 6. Goal shortcut words, only when goal is still unset.
    if delta.goal.is_none() && current.goal.is_none() {
        if has_word(&lowered, "awareness") {
            delta.goal = Some("Brand awareness".to_string());
        } else if has_word(&lowered, "conversion") || has_word(&lowered, "conversions") {
            delta.goal = Some("Drive conversions".to_string());
        }
    }

    // 7. Reference URLs.
    delta.assets = RE_URL
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect();

    delta.normalize()
}
