//! Core domain types, error taxonomy, and text normalization
//! for PDF narration.

pub mod error;
pub mod normalize;
pub mod types;

pub use error::{Error, Result};
pub use normalize::TextNormalizer;
pub use types::{
    AudioSettings, PlaybackStatus, SessionState, VoiceKind, DEFAULT_RATE, DEFAULT_VOLUME,
    MAX_RATE, MIN_RATE,
};
