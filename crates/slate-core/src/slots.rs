//! The canonical brief schema: slot accumulator, normalization, readiness.
//!
//! Normalization is deliberately lenient — partial or garbage input degrades
//! to "field not yet set" rather than failing the turn. Nothing in this
//! module returns an error.

use serde::{Deserialize, Serialize};

/// Required slot keys, in policy priority order.
pub const REQUIRED_SLOTS: [&str; 6] = [
    "goal",
    "audience",
    "platform",
    "duration_sec",
    "key_message",
    "cta",
];

/// Upper bound on video duration.
pub const MAX_DURATION_SEC: u32 = 600;

/// Platform alias table. A slice, not a map: iteration order is part of the
/// contract (first alias hit wins).
pub const PLATFORM_ALIASES: &[(&str, &str)] = &[
    ("tiktok", "TikTok"),
    ("douyin", "TikTok"),
    ("reels", "Instagram Reels"),
    ("instagram", "Instagram Reels"),
    ("youtube", "YouTube Shorts"),
    ("shorts", "YouTube Shorts"),
    ("facebook", "Facebook"),
    ("fb", "Facebook"),
];

/// Resolve a raw platform identifier to its canonical display label.
///
/// Lower-cases the input, then looks it up against both the alias table and
/// the canonical labels themselves. Unknown platforms stay lower-cased.
pub fn canonical_platform(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    for (alias, canon) in PLATFORM_ALIASES {
        if lowered == *alias || lowered == canon.to_lowercase() {
            return (*canon).to_string();
        }
    }
    lowered
}

/// Accumulated brief slots. Also used as a partial update (delta): `None`
/// means "no update for this field", never "clear this field".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slots {
    /// Campaign goal (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    /// Target audience (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    /// Canonical platform label (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Video length in seconds, positive and bounded (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<u32>,
    /// Single most important takeaway (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_message: Option<String>,
    /// Call to action (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta: Option<String>,
    /// Comma-joined tone words
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    /// Comma-joined style words
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Reference URLs, ordered, de-duplicated
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assets: Vec<String>,
    /// Constraints / must-avoid items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<String>,
}

fn clean(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl Slots {
    /// Normalize a raw partial update.
    ///
    /// Trims string fields (empty becomes unset), resolves the platform to
    /// its canonical label, drops durations outside `1..=600`, de-duplicates
    /// assets preserving first-seen order. Pure; invalid values are silently
    /// dropped.
    pub fn normalize(self) -> Slots {
        let mut assets: Vec<String> = Vec::new();
        for asset in self.assets {
            let trimmed = asset.trim().to_string();
            if !trimmed.is_empty() && !assets.contains(&trimmed) {
                assets.push(trimmed);
            }
        }
        Slots {
            goal: clean(self.goal),
            audience: clean(self.audience),
            platform: clean(self.platform).map(|p| canonical_platform(&p)),
            duration_sec: self
                .duration_sec
                .filter(|&d| d >= 1 && d <= MAX_DURATION_SEC),
            key_message: clean(self.key_message),
            cta: clean(self.cta),
            tone: clean(self.tone),
            style: clean(self.style),
            assets,
            constraints: clean(self.constraints),
        }
    }

    /// Shallow-merge a delta into these slots.
    ///
    /// Last-write-wins per key; assets are unioned preserving first-seen
    /// order. Merging deltas with disjoint keys is commutative; for
    /// overlapping keys the last applied delta wins (expected, if not
    /// always desirable, under concurrent duplicate turns).
    pub fn merge(&mut self, delta: Slots) {
        macro_rules! take {
            ($field:ident) => {
                if delta.$field.is_some() {
                    self.$field = delta.$field;
                }
            };
        }
        take!(goal);
        take!(audience);
        take!(platform);
        take!(duration_sec);
        take!(key_message);
        take!(cta);
        take!(tone);
        take!(style);
        take!(constraints);
        for asset in delta.assets {
            if !self.assets.contains(&asset) {
                self.assets.push(asset);
            }
        }
    }

    /// A brief is READY iff every required key is present and non-empty and
    /// the duration is positive.
    pub fn is_ready(&self) -> bool {
        self.missing_required().is_empty()
    }

    /// The literal set of still-missing required keys, in priority order.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.goal.is_none() {
            missing.push("goal");
        }
        if self.audience.is_none() {
            missing.push("audience");
        }
        if self.platform.is_none() {
            missing.push("platform");
        }
        if !matches!(self.duration_sec, Some(d) if d > 0) {
            missing.push("duration_sec");
        }
        if self.key_message.is_none() {
            missing.push("key_message");
        }
        if self.cta.is_none() {
            missing.push("cta");
        }
        missing
    }

    /// True when the delta carries no update at all.
    pub fn is_empty(&self) -> bool {
        *self == Slots::default()
    }

    /// Convert to a finalized [`slate_gen::Brief`]. Returns `None` unless
    /// the brief is ready.
    pub fn to_brief(&self) -> Option<slate_gen::Brief> {
        if !self.is_ready() {
            return None;
        }
        Some(slate_gen::Brief {
            goal: self.goal.clone()?,
            audience: self.audience.clone()?,
            platform: self.platform.clone()?,
            duration_sec: self.duration_sec?,
            key_message: self.key_message.clone()?,
            cta: self.cta.clone()?,
            tone: self.tone.clone(),
            style: self.style.clone(),
            assets: self.assets.clone(),
            constraints: self.constraints.clone(),
        })
    }

    /// Field names carried by this delta, in schema order. Used for the
    /// "Noted." confirmation line.
    pub fn updated_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.goal.is_some() {
            keys.push("goal");
        }
        if self.audience.is_some() {
            keys.push("audience");
        }
        if self.platform.is_some() {
            keys.push("platform");
        }
        if self.duration_sec.is_some() {
            keys.push("duration_sec");
        }
        if self.key_message.is_some() {
            keys.push("key_message");
        }
        if self.cta.is_some() {
            keys.push("cta");
        }
        if self.tone.is_some() {
            keys.push("tone");
        }
        if self.style.is_some() {
            keys.push("style");
        }
        if !self.assets.is_empty() {
            keys.push("assets");
        }
        if self.constraints.is_some() {
            keys.push("constraints");
        }
        keys
    }
}
