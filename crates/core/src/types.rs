//! Domain types for the narration session.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Narration voice, mapped by each backend onto whatever it offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VoiceKind {
    /// A male voice (backend voice index 0).
    #[default]
    Male,
    /// A female voice (backend voice index 1).
    Female,
}

impl VoiceKind {
    /// The backend voice-list index this kind selects.
    pub fn voice_index(self) -> usize {
        match self {
            Self::Male => 0,
            Self::Female => 1,
        }
    }
}

/// Slowest accepted speech rate, in words per minute.
pub const MIN_RATE: u16 = 100;
/// Fastest accepted speech rate, in words per minute.
pub const MAX_RATE: u16 = 200;
/// Default speech rate, in words per minute.
pub const DEFAULT_RATE: u16 = 150;
/// Default playback volume.
pub const DEFAULT_VOLUME: f32 = 0.8;

/// User-adjustable speech parameters.
///
/// Snapshotted by the playback worker when an operation starts; changing
/// settings mid-utterance affects the next utterance, not the current one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Which voice to narrate with.
    pub voice: VoiceKind,

    /// Speech rate in words per minute, within [`MIN_RATE`]..=[`MAX_RATE`].
    pub rate: u16,

    /// Playback volume in 0.0..=1.0.
    pub volume: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            voice: VoiceKind::Male,
            rate: DEFAULT_RATE,
            volume: DEFAULT_VOLUME,
        }
    }
}

impl AudioSettings {
    /// Check that rate and volume are within their accepted ranges.
    ///
    /// Interactive controls clamp before they get here; this is the guard
    /// for programmatic callers.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_RATE..=MAX_RATE).contains(&self.rate) {
            return Err(Error::configuration(format!(
                "rate {} outside {}..={} words per minute",
                self.rate, MIN_RATE, MAX_RATE
            )));
        }
        if !(0.0..=1.0).contains(&self.volume) || self.volume.is_nan() {
            return Err(Error::configuration(format!(
                "volume {} outside 0.0..=1.0",
                self.volume
            )));
        }
        Ok(())
    }
}

/// User-visible playback status.
///
/// The `Display` strings are the fixed vocabulary shells present; anything
/// richer (error causes, progress) travels next to the status, not in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStatus {
    /// A document is selected and nothing is running.
    Ready,
    /// Extraction is in progress.
    Loading,
    /// Speech is being narrated.
    Playing,
    /// Narration was paused by the user.
    Paused,
    /// Playback was stopped and progress reset.
    Stopped,
    /// Audio export is in progress.
    Exporting,
    /// The last operation failed.
    Error,
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Ready => "Ready",
            Self::Loading => "Loading",
            Self::Playing => "Playing",
            Self::Paused => "Paused",
            Self::Stopped => "Stopped",
            Self::Exporting => "Exporting",
            Self::Error => "Error",
        };
        f.write_str(label)
    }
}

/// Mutable state of one narration session.
///
/// Created once at startup and living for the whole process. Only the
/// foreground side of the playback controller writes to it; background
/// workers receive value snapshots.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Currently selected document, if any.
    pub path: Option<PathBuf>,

    /// Full extracted text of `path`, once a whole-document extraction
    /// has completed. Never holds preview text.
    pub cached_text: Option<String>,

    /// Whether narration is currently audible.
    pub is_playing: bool,

    /// Current speech parameters.
    pub settings: AudioSettings,
}

impl SessionState {
    /// Create a fresh session with default settings and nothing selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a document, dropping any text cached for the previous one.
    pub fn select_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
        self.cached_text = None;
    }

    /// Store the full extracted text for the currently selected document.
    pub fn cache_text(&mut self, text: impl Into<String>) {
        self.cached_text = Some(text.into());
    }

    /// Whether `path` is the currently selected document.
    pub fn is_current(&self, path: &Path) -> bool {
        self.path.as_deref() == Some(path)
    }
}
