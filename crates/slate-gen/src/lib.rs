//! Slate Gen — Creative-Generation Contract
//!
//! The seam between the director orchestrator and whatever AI backend turns
//! a finalized brief into creative options and storyboards. The backend is
//! treated as a black box with a validated-JSON contract: payloads are
//! checked here before anything downstream sees them.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod generator;
pub mod types;

pub use error::{Error, Result};
pub use generator::{Brief, CreativeGenerator, TemplateGenerator};
pub use types::{
    validate_creative_options, validate_storyboard, CreativeOption, CreativeSet, Storyboard,
    StoryboardScene,
};
